//! Unified error type for all Cypress compiler errors.

use super::codes::{ErrorCode, Severity};
use super::diagnostic::Diagnostic;
use super::kinds::ErrorKind;
use text_size::TextRange;
use thin_vec::ThinVec;

/// Additional information related to the main error.
#[derive(Debug, Clone)]
pub struct RelatedInformation {
    pub span: TextRange,
    pub message: String,
}

/// Unified error type carrying a kind, a span, and optional context.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: TextRange,
    pub related_info: ThinVec<RelatedInformation>,
    pub notes: ThinVec<String>,
}

impl Error {
    /// Create a new error with the given kind and span.
    pub fn new(kind: ErrorKind, span: TextRange) -> Self {
        Self {
            kind,
            span,
            related_info: ThinVec::new(),
            notes: ThinVec::new(),
        }
    }

    /// Add related information with a span and message.
    pub fn with_related(mut self, span: TextRange, message: String) -> Self {
        self.related_info.push(RelatedInformation { span, message });
        self
    }

    /// Add a note to the error.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// Get the severity for this error.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Convert this error to a diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic =
            Diagnostic::new(self.severity(), self.kind.format_message(), self.span)
                .with_code(self.code());
        for note in &self.notes {
            diagnostic = diagnostic.with_note(note.clone());
        }
        diagnostic
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.kind.format_message())
    }
}

impl std::error::Error for Error {}

/// Construct a boxed error (kept boxed to keep `Result` payloads small).
pub fn error(kind: ErrorKind, span: TextRange) -> Box<Error> {
    Box::new(Error::new(kind, span))
}
