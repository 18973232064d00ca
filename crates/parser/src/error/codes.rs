//! Error codes and severities for Cypress diagnostics.

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning that doesn't prevent compilation
    Warning,
    /// Error that prevents usable output
    Error,
    /// Fatal error that stops compilation immediately
    Fatal,
}

/// Error code categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ===== Lexical errors (E1xxx) =====
    E1001, // Invalid character
    E1002, // Unindent does not match any outer level

    // ===== Syntax errors (E2xxx) =====
    E2001, // Unexpected token
    E2002, // Expected token not found
    E2003, // Unexpected EOF
    E2004, // Invalid syntax
    E2005, // Invalid assignment target
    E2006, // Break outside loop
    E2007, // Continue outside loop
    E2008, // Return outside function
    E2009, // Expected expression
    E2010, // Expected indented block

    // ===== Declaration errors (E3xxx) =====
    E3001, // Undefined name
    E3002, // Incompatible redeclaration
    E3003, // Use before declaration
    E3004, // Initializer not allowed in this context
    E3005, // Nonlocal without enclosing binding

    // ===== Type errors (E4xxx) =====
    E4001, // Type mismatch
    E4002, // Not callable

    // ===== Internal errors (E9xxx) =====
    E9001, // Internal compiler error
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
