//! Centralized error handling for the Cypress compiler.
//!
//! All error kinds from lexical analysis through semantic analysis live
//! here, with consistent codes and severities. Recoverable conditions are
//! accumulated as [`Diagnostic`]s; internal invariant violations in the
//! code writer and allocators panic instead (they indicate a compiler
//! bug, not a user-input problem).

pub mod codes;
pub mod diagnostic;
pub mod kinds;
pub mod recovery;
pub mod types;

pub use codes::{ErrorCode, Severity};
pub use diagnostic::{Diagnostic, DiagnosticCollector};
pub use kinds::ErrorKind;
pub use recovery::RecoveryManager;
pub use types::{error, Error, RelatedInformation};

/// Result type used throughout parsing.
pub type ParseResult<T> = Result<T, Box<Error>>;
