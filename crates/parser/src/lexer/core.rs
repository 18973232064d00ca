//! Main lexer implementation for Cypress source code.

use super::token::{LogosToken, Token, TokenKind};
use crate::error::{error, Error, ErrorKind};
use logos::Logos;
use text_size::{TextRange, TextSize};

/// Lexer that tokenizes source code with indentation tracking.
///
/// Each source line is scanned with logos; the lexer itself keeps a
/// stack of open indentation columns and synthesizes `Indent` and
/// `Dedent` tokens when a line starts at a new column.
///
/// Implicit line joining: while inside (), [] or {}, newlines are ignored
/// and INDENT/DEDENT tokens are not generated, so multiline calls and
/// literals parse naturally. The `bracket_depth` field tracks nesting to
/// implement this behavior.
pub struct Lexer {
    input: String,
    /// Open indentation columns, innermost last. Column 0 is always
    /// present and never popped.
    indents: Vec<usize>,
    bracket_depth: usize,
}

impl Lexer {
    /// Create a new lexer for the given source.
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.to_string(),
            indents: vec![0],
            bracket_depth: 0,
        }
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.input
    }

    /// Tokenize the whole source.
    ///
    /// Returns the token stream (always terminated by `Eof`) plus any
    /// lexical errors. Errors do not stop tokenization; an `Error` token
    /// is emitted in place and scanning continues on the next line.
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Error>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut offset = 0usize;

        let input = std::mem::take(&mut self.input);
        for line in input.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            let content = line.strip_suffix('\n').unwrap_or(line);
            let trimmed = content.trim_start();

            // Blank and comment-only lines produce no tokens at all
            let is_blank = trimmed.is_empty() || trimmed.starts_with('#');

            if self.bracket_depth == 0 && !is_blank {
                let column = content.len() - trimmed.len();
                let pos = TextSize::new(line_start as u32);
                self.sync_indent(column, pos, &mut tokens, &mut errors);
            }

            let mut emitted_any = false;
            let mut lexer = LogosToken::lexer(content);
            while let Some(result) = lexer.next() {
                let span = lexer.span();
                let range = TextRange::new(
                    TextSize::new((line_start + span.start) as u32),
                    TextSize::new((line_start + span.end) as u32),
                );
                match result {
                    Ok(raw) => {
                        let kind = raw.kind();
                        match kind {
                            TokenKind::LeftParen
                            | TokenKind::LeftBracket
                            | TokenKind::LeftBrace => self.bracket_depth += 1,
                            TokenKind::RightParen
                            | TokenKind::RightBracket
                            | TokenKind::RightBrace => {
                                self.bracket_depth = self.bracket_depth.saturating_sub(1)
                            }
                            _ => {}
                        }
                        tokens.push(Token::new(kind, range));
                        emitted_any = true;
                    }
                    Err(_) => {
                        errors.push(*error(ErrorKind::InvalidCharacter, range));
                        tokens.push(Token::new(TokenKind::Error, range));
                        emitted_any = true;
                    }
                }
            }

            if emitted_any && self.bracket_depth == 0 {
                let end = TextSize::new((line_start + content.len()) as u32);
                tokens.push(Token::new(TokenKind::Newline, TextRange::new(end, end)));
            }
        }
        self.input = input;

        // Close every block still open at end of file.
        let eof_pos = TextSize::new(self.input.len() as u32);
        let eof_at = TextRange::new(eof_pos, eof_pos);
        while self.indents.len() > 1 {
            self.indents.pop();
            tokens.push(Token::new(TokenKind::Dedent, eof_at));
        }
        tokens.push(Token::new(TokenKind::Eof, eof_at));

        (tokens, errors)
    }

    /// Reconcile the indent stack with the column a line starts at. A
    /// deeper column opens one block; a shallower one closes every
    /// block past it and must land exactly on an open column.
    fn sync_indent(
        &mut self,
        column: usize,
        pos: TextSize,
        tokens: &mut Vec<Token>,
        errors: &mut Vec<Error>,
    ) {
        let at = TextRange::new(pos, pos);
        let current = *self.indents.last().unwrap();
        if column > current {
            self.indents.push(column);
            tokens.push(Token::new(TokenKind::Indent, at));
            return;
        }
        while column < *self.indents.last().unwrap() {
            self.indents.pop();
            tokens.push(Token::new(TokenKind::Dedent, at));
        }
        if *self.indents.last().unwrap() != column {
            errors.push(*error(ErrorKind::UnindentMismatch, at));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let (tokens, errors) = lexer.tokenize();
        assert!(errors.is_empty(), "unexpected lexical errors: {:?}", errors);
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(
            kinds("x = 1"),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_indentation_tokens() {
        let k = kinds("if x:\n    y = 1\nz = 2\n");
        assert!(k.contains(&TokenKind::Indent));
        assert!(k.contains(&TokenKind::Dedent));
    }

    #[test]
    fn test_nested_blocks_close_one_per_level() {
        let k = kinds("if x:\n    if y:\n        z = 1\nw = 2\n");
        let dedents = k.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
    }

    #[test]
    fn test_unindent_must_match_an_open_column() {
        let mut lexer = Lexer::new("if x:\n        y = 1\n   z = 2\n");
        let (_, errors) = lexer.tokenize();
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::UnindentMismatch)));
    }

    #[test]
    fn test_brackets_suppress_newline() {
        let k = kinds("f(1,\n  2)\n");
        let newlines = k.iter().filter(|k| **k == TokenKind::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!k.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_dedent_flushed_at_eof() {
        let k = kinds("if x:\n    y = 1");
        assert!(k.contains(&TokenKind::Dedent));
        assert_eq!(*k.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_comment_only_line_ignored() {
        let k = kinds("x = 1\n# comment\ny = 2\n");
        let newlines = k.iter().filter(|k| **k == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
    }
}
