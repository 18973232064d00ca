mod core;
mod token;

pub use self::core::Lexer;
pub use token::{LogosToken, Token, TokenKind};
