//! Error kind definitions for all Cypress compiler errors.

use super::codes::{ErrorCode, Severity};

/// Error kind enum covering lexical, syntax and semantic errors.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Invalid character in source code
    InvalidCharacter,

    /// Unindent does not match any outer indentation level
    UnindentMismatch,

    /// Unexpected token encountered during parsing
    UnexpectedToken {
        expected: Option<String>,
        found: String,
    },

    /// Expected a specific token but found something else
    ExpectedToken { expected: String, found: String },

    /// File ended unexpectedly while parsing
    UnexpectedEof,

    /// Invalid syntax structure
    InvalidSyntax { message: String },

    /// Invalid assignment target
    InvalidAssignmentTarget,

    /// 'break' can only be used inside loops
    BreakOutsideLoop,

    /// 'continue' can only be used inside loops
    ContinueOutsideLoop,

    /// 'return' can only be used inside functions
    ReturnOutsideFunction,

    /// Expected an expression
    ExpectedExpression,

    /// Expected an indented block
    ExpectedBlock,

    /// Name is not defined in any enclosing scope
    UndefinedName { name: String },

    /// Name redeclared with an incompatible kind in the same scope
    IncompatibleRedeclaration { name: String },

    /// Name used before its declaration in a block scope
    UseBeforeDeclaration { name: String },

    /// Combined declare+initialize is not allowed in this context
    InitializerNotAllowed { context: String },

    /// 'nonlocal' has no binding in an enclosing function scope
    NonlocalWithoutBinding { name: String },

    /// Static types do not agree
    TypeMismatch { expected: String, found: String },

    /// Value of this type cannot be called
    NotCallable { found: String },
}

impl ErrorKind {
    /// The error code for this kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::InvalidCharacter => ErrorCode::E1001,
            ErrorKind::UnindentMismatch => ErrorCode::E1002,
            ErrorKind::UnexpectedToken { .. } => ErrorCode::E2001,
            ErrorKind::ExpectedToken { .. } => ErrorCode::E2002,
            ErrorKind::UnexpectedEof => ErrorCode::E2003,
            ErrorKind::InvalidSyntax { .. } => ErrorCode::E2004,
            ErrorKind::InvalidAssignmentTarget => ErrorCode::E2005,
            ErrorKind::BreakOutsideLoop => ErrorCode::E2006,
            ErrorKind::ContinueOutsideLoop => ErrorCode::E2007,
            ErrorKind::ReturnOutsideFunction => ErrorCode::E2008,
            ErrorKind::ExpectedExpression => ErrorCode::E2009,
            ErrorKind::ExpectedBlock => ErrorCode::E2010,
            ErrorKind::UndefinedName { .. } => ErrorCode::E3001,
            ErrorKind::IncompatibleRedeclaration { .. } => ErrorCode::E3002,
            ErrorKind::UseBeforeDeclaration { .. } => ErrorCode::E3003,
            ErrorKind::InitializerNotAllowed { .. } => ErrorCode::E3004,
            ErrorKind::NonlocalWithoutBinding { .. } => ErrorCode::E3005,
            ErrorKind::TypeMismatch { .. } => ErrorCode::E4001,
            ErrorKind::NotCallable { .. } => ErrorCode::E4002,
        }
    }

    /// Default severity of this error kind.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorKind::IncompatibleRedeclaration { .. }
            | ErrorKind::UseBeforeDeclaration { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Format the human-readable message for this error.
    pub fn format_message(&self) -> String {
        match self {
            ErrorKind::InvalidCharacter => "invalid character in source".to_string(),
            ErrorKind::UnindentMismatch => {
                "unindent does not match any outer indentation level".to_string()
            }
            ErrorKind::UnexpectedToken { expected, found } => match expected {
                Some(expected) => format!("unexpected {}, expected {}", found, expected),
                None => format!("unexpected {}", found),
            },
            ErrorKind::ExpectedToken { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ErrorKind::UnexpectedEof => "unexpected end of file".to_string(),
            ErrorKind::InvalidSyntax { message } => message.clone(),
            ErrorKind::InvalidAssignmentTarget => "invalid assignment target".to_string(),
            ErrorKind::BreakOutsideLoop => "'break' outside of a loop".to_string(),
            ErrorKind::ContinueOutsideLoop => "'continue' outside of a loop".to_string(),
            ErrorKind::ReturnOutsideFunction => "'return' outside of a function".to_string(),
            ErrorKind::ExpectedExpression => "expected an expression".to_string(),
            ErrorKind::ExpectedBlock => "expected an indented block".to_string(),
            ErrorKind::UndefinedName { name } => format!("name '{}' is not defined", name),
            ErrorKind::IncompatibleRedeclaration { name } => {
                format!("'{}' redeclared with an incompatible kind", name)
            }
            ErrorKind::UseBeforeDeclaration { name } => {
                format!("'{}' used before its declaration", name)
            }
            ErrorKind::InitializerNotAllowed { context } => {
                format!("initializer is not allowed in {}", context)
            }
            ErrorKind::NonlocalWithoutBinding { name } => {
                format!("no binding for nonlocal '{}' found", name)
            }
            ErrorKind::TypeMismatch { expected, found } => {
                format!("type mismatch: expected {}, found {}", expected, found)
            }
            ErrorKind::NotCallable { found } => format!("{} is not callable", found),
        }
    }
}
