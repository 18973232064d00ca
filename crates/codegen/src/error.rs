//! Codegen error types.
//!
//! These cover conditions a caller can act on. Violations of emitter
//! invariants (double-released temporaries, jumps to undeclared labels)
//! panic instead; they are compiler bugs, not input problems.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// A construct the backend cannot express reached emission,
    /// usually because the lowering pipeline was not run first.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// The tree and symbol table disagree.
    #[error("internal codegen error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodegenResult<T> = Result<T, CodegenError>;
