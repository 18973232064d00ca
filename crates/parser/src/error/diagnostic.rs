//! Diagnostic reporting for compiler errors.

use super::codes::{ErrorCode, Severity};
use text_size::TextRange;

/// A diagnostic record: position, severity, message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity of the report
    pub severity: Severity,
    /// Error code, if one applies
    pub code: Option<ErrorCode>,
    /// Primary message
    pub message: String,
    /// Source span the report points at
    pub span: TextRange,
    /// Additional notes
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(severity: Severity, message: String, span: TextRange) -> Self {
        Diagnostic {
            severity,
            code: None,
            message,
            span,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: String, span: TextRange) -> Self {
        Self::new(Severity::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: String, span: TextRange) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Append a note.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// Render a one-line summary: `E3001 [error] at 12..15: message`.
    pub fn render(&self) -> String {
        let code = self
            .code
            .map(|c| format!("{} ", c))
            .unwrap_or_default();
        format!(
            "{}[{}] at {}..{}: {}",
            code,
            match self.severity {
                Severity::Info => "info",
                Severity::Warning => "warning",
                Severity::Error => "error",
                Severity::Fatal => "fatal",
            },
            u32::from(self.span.start()),
            u32::from(self.span.end()),
            self.message
        )
    }
}

/// Diagnostic collector shared across all pipeline passes.
///
/// Every pass appends into one collector; the driver surfaces everything
/// once, in position order, at the end of the run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticCollector {
    /// Create a new diagnostic collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error | Severity::Fatal => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any errors (fatal included).
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of errors reported.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Number of warnings reported.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// All diagnostics in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the collector, returning diagnostics sorted by position.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.span.start(), d.span.end()));
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    fn span(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::new(start), TextSize::new(end))
    }

    #[test]
    fn test_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.report(Diagnostic::error("bad".to_string(), span(0, 1)));
        collector.report(Diagnostic::warning("meh".to_string(), span(2, 3)));
        assert!(collector.has_errors());
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.warning_count(), 1);
    }

    #[test]
    fn test_sorted_by_position() {
        let mut collector = DiagnosticCollector::new();
        collector.report(Diagnostic::error("second".to_string(), span(10, 11)));
        collector.report(Diagnostic::error("first".to_string(), span(2, 3)));
        let sorted = collector.into_sorted();
        assert_eq!(sorted[0].message, "first");
        assert_eq!(sorted[1].message, "second");
    }
}
