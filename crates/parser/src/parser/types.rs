//! Parser state and token-cursor helpers.

use crate::arena::Arena;
use crate::ast::*;
use crate::error::{error, Error, ErrorKind, ParseResult, RecoveryManager};
use crate::lexer::{Lexer, Token, TokenKind};
use text_size::TextRange;

/// Context tracking for statement validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ParserContext {
    /// Are we inside a loop (for/while)?
    pub(super) in_loop: bool,
    /// Are we inside a function?
    pub(super) in_function: bool,
}

impl ParserContext {
    fn new() -> Self {
        ParserContext {
            in_loop: false,
            in_function: false,
        }
    }

    pub(super) fn enter_loop(mut self) -> Self {
        self.in_loop = true;
        self
    }

    pub(super) fn enter_function(mut self) -> Self {
        self.in_function = true;
        self.in_loop = false;
        self
    }
}

/// Recursive-descent parser over a fully materialized token stream.
///
/// Each production function consumes the tokens of exactly one grammar
/// rule and leaves the cursor at the first unconsumed token. Statement
/// level errors are recoverable: the module driver records them and
/// synchronizes to the next statement boundary.
pub struct Parser<'a> {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) arena: &'a Arena,
    pub(super) source: &'a str,
    pub(super) context: ParserContext,
    /// Errors collected during parsing (for error recovery)
    pub(super) errors: Vec<Error>,
    pub(super) recovery_manager: RecoveryManager,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer, arena: &'a Arena) -> Self {
        let source = arena.alloc_str(lexer.source());
        let (tokens, lexical_errors) = lexer.tokenize();

        Parser {
            tokens,
            current: 0,
            arena,
            source,
            context: ParserContext::new(),
            errors: lexical_errors,
            recovery_manager: RecoveryManager::new(),
        }
    }

    /// Parse a whole module, recovering at statement boundaries.
    pub fn parse_module(&mut self) -> ParseResult<&'a Module<'a>> {
        let mut body = Vec::new();

        while !self.is_at_end() && self.peek().kind != TokenKind::Eof {
            if self.peek().kind == TokenKind::Newline {
                self.advance();
                continue;
            }

            match self.parse_stmt() {
                Ok(stmts) => body.extend(stmts),
                Err(error) => {
                    self.record_error(*error);
                    self.synchronize();
                    if self.recovery_manager.limit_reached() || self.is_at_end() {
                        break;
                    }
                }
            }
        }

        // No statements and at least one error: surface the first error
        if body.is_empty() && !self.errors.is_empty() {
            return Err(Box::new(self.errors[0].clone()));
        }

        let span = if body.is_empty() {
            TextRange::default()
        } else {
            TextRange::new(body[0].span().start(), body[body.len() - 1].span().end())
        };

        let body_slice = self.arena.alloc_slice_vec(body);
        Ok(self.arena.alloc(Module {
            body: body_slice,
            span,
        }))
    }

    /// Errors collected during parsing.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    // ===== cursor helpers =====

    pub(super) fn peek(&self) -> Token {
        self.tokens
            .get(self.current)
            .copied()
            .unwrap_or_else(|| self.eof_token())
    }

    pub(super) fn peek_next(&self) -> Token {
        self.tokens
            .get(self.current + 1)
            .copied()
            .unwrap_or_else(|| self.eof_token())
    }

    fn eof_token(&self) -> Token {
        let end = text_size::TextSize::new(self.source.len() as u32);
        Token::new(TokenKind::Eof, TextRange::new(end, end))
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    /// Consume the next token if it matches, returning whether it did.
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with an expected-token
    /// description.
    pub(super) fn consume(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(error(
                ErrorKind::ExpectedToken {
                    expected: format!("{:?}", kind),
                    found: self.describe(found),
                },
                found.span,
            ))
        }
    }

    /// Consume an identifier, returning its source text.
    pub(super) fn consume_ident(&mut self) -> ParseResult<&'a str> {
        let token = self.consume(TokenKind::Ident)?;
        Ok(self.text(token))
    }

    /// Source text covered by a token.
    pub(super) fn text(&self, token: Token) -> &'a str {
        &self.source[usize::from(token.span.start())..usize::from(token.span.end())]
    }

    pub(super) fn describe(&self, token: Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            _ => format!("'{}'", self.text(token)),
        }
    }

    pub(super) fn record_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Skip to the next statement boundary: past the current logical line
    /// and any block it opened.
    pub(super) fn synchronize(&mut self) {
        self.recovery_manager.record_attempt();

        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Newline if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Indent => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
