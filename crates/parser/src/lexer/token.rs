//! Token definition and types.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// A positioned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Token { kind, span }
    }

    pub fn start(&self) -> TextSize {
        self.span.start()
    }

    pub fn end(&self) -> TextSize {
        self.span.end()
    }
}

/// Lexical token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TokenKind {
    None,
    True,
    False,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Def,
    Class,
    Return,
    Pass,
    Break,
    Continue,
    As,
    With,
    Try,
    Except,
    Finally,
    Raise,
    Lambda,
    Global,
    Nonlocal,
    And,
    Or,
    Not,
    Is,
    Ident,
    Number,
    String,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LeftShift,
    RightShift,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    DoubleSlashEqual,
    PercentEqual,
    DoubleStarEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    LeftShiftEqual,
    RightShiftEqual,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    At,
    Newline,
    Indent,
    Dedent,
    Error,
    Eof,
}

/// Logos-based lexer token enum for one logical line.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"#[^\n]*")]
pub enum LogosToken {
    #[token("None")]
    None,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("return")]
    Return,
    #[token("pass")]
    Pass,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("as")]
    As,
    #[token("with")]
    With,
    #[token("try")]
    Try,
    #[token("except")]
    Except,
    #[token("finally")]
    Finally,
    #[token("raise")]
    Raise,
    #[token("lambda")]
    Lambda,
    #[token("global")]
    Global,
    #[token("nonlocal")]
    Nonlocal,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("is")]
    Is,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("**")]
    DoubleStar,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LeftShift,
    #[token(">>")]
    RightShift,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("//=")]
    DoubleSlashEqual,
    #[token("%=")]
    PercentEqual,
    #[token("**=")]
    DoubleStarEqual,
    #[token("&=")]
    AmpersandEqual,
    #[token("|=")]
    PipeEqual,
    #[token("^=")]
    CaretEqual,
    #[token("<<=")]
    LeftShiftEqual,
    #[token(">>=")]
    RightShiftEqual,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("@")]
    At,
}

impl LogosToken {
    /// Map a raw logos token onto the positioned token kind.
    pub fn kind(self) -> TokenKind {
        match self {
            LogosToken::None => TokenKind::None,
            LogosToken::True => TokenKind::True,
            LogosToken::False => TokenKind::False,
            LogosToken::If => TokenKind::If,
            LogosToken::Elif => TokenKind::Elif,
            LogosToken::Else => TokenKind::Else,
            LogosToken::While => TokenKind::While,
            LogosToken::For => TokenKind::For,
            LogosToken::In => TokenKind::In,
            LogosToken::Def => TokenKind::Def,
            LogosToken::Class => TokenKind::Class,
            LogosToken::Return => TokenKind::Return,
            LogosToken::Pass => TokenKind::Pass,
            LogosToken::Break => TokenKind::Break,
            LogosToken::Continue => TokenKind::Continue,
            LogosToken::As => TokenKind::As,
            LogosToken::With => TokenKind::With,
            LogosToken::Try => TokenKind::Try,
            LogosToken::Except => TokenKind::Except,
            LogosToken::Finally => TokenKind::Finally,
            LogosToken::Raise => TokenKind::Raise,
            LogosToken::Lambda => TokenKind::Lambda,
            LogosToken::Global => TokenKind::Global,
            LogosToken::Nonlocal => TokenKind::Nonlocal,
            LogosToken::And => TokenKind::And,
            LogosToken::Or => TokenKind::Or,
            LogosToken::Not => TokenKind::Not,
            LogosToken::Is => TokenKind::Is,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Number => TokenKind::Number,
            LogosToken::String => TokenKind::String,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Star => TokenKind::Star,
            LogosToken::Slash => TokenKind::Slash,
            LogosToken::DoubleSlash => TokenKind::DoubleSlash,
            LogosToken::Percent => TokenKind::Percent,
            LogosToken::DoubleStar => TokenKind::DoubleStar,
            LogosToken::Equal => TokenKind::Equal,
            LogosToken::EqualEqual => TokenKind::EqualEqual,
            LogosToken::NotEqual => TokenKind::NotEqual,
            LogosToken::Less => TokenKind::Less,
            LogosToken::LessEqual => TokenKind::LessEqual,
            LogosToken::Greater => TokenKind::Greater,
            LogosToken::GreaterEqual => TokenKind::GreaterEqual,
            LogosToken::Ampersand => TokenKind::Ampersand,
            LogosToken::Pipe => TokenKind::Pipe,
            LogosToken::Caret => TokenKind::Caret,
            LogosToken::Tilde => TokenKind::Tilde,
            LogosToken::LeftShift => TokenKind::LeftShift,
            LogosToken::RightShift => TokenKind::RightShift,
            LogosToken::PlusEqual => TokenKind::PlusEqual,
            LogosToken::MinusEqual => TokenKind::MinusEqual,
            LogosToken::StarEqual => TokenKind::StarEqual,
            LogosToken::SlashEqual => TokenKind::SlashEqual,
            LogosToken::DoubleSlashEqual => TokenKind::DoubleSlashEqual,
            LogosToken::PercentEqual => TokenKind::PercentEqual,
            LogosToken::DoubleStarEqual => TokenKind::DoubleStarEqual,
            LogosToken::AmpersandEqual => TokenKind::AmpersandEqual,
            LogosToken::PipeEqual => TokenKind::PipeEqual,
            LogosToken::CaretEqual => TokenKind::CaretEqual,
            LogosToken::LeftShiftEqual => TokenKind::LeftShiftEqual,
            LogosToken::RightShiftEqual => TokenKind::RightShiftEqual,
            LogosToken::LeftParen => TokenKind::LeftParen,
            LogosToken::RightParen => TokenKind::RightParen,
            LogosToken::LeftBracket => TokenKind::LeftBracket,
            LogosToken::RightBracket => TokenKind::RightBracket,
            LogosToken::LeftBrace => TokenKind::LeftBrace,
            LogosToken::RightBrace => TokenKind::RightBrace,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::Arrow => TokenKind::Arrow,
            LogosToken::At => TokenKind::At,
        }
    }
}
