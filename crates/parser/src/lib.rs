//! Cypress: front end of a compiler for an indentation-structured
//! scripting language, targeting readable C output.
//!
//! This crate covers everything up to code generation:
//! - A hand-written lexer over [`logos`] tokens, tracking indentation
//!   and nesting so `Newline`/`Indent`/`Dedent` appear only where they
//!   are structurally meaningful
//! - A recursive descent parser with error recovery that allocates the
//!   tree into a [`bumpalo`] arena
//! - A symbol table with lexical scope chains, closure capture analysis
//!   and C-name mangling
//! - A six-pass pipeline that normalizes, desugars, resolves, infers
//!   types and lowers the tree into a form a C emitter can walk
//!   directly
//!
//! # Error handling
//!
//! Syntax errors abort the statement they occur in and the parser
//! resynchronizes at the next statement boundary; everything else
//! (undefined names, redeclarations, type conflicts) accumulates and is
//! surfaced in source-position order. Internal invariant violations
//! panic instead of producing diagnostics.
//!
//! # Usage
//!
//! ```no_run
//! use cypress_parser::analyze;
//!
//! let source = "def double(x):\n    return x * 2\ny = double(21)\n";
//! match analyze(source) {
//!     Ok(output) => {
//!         for diagnostic in output.errors() {
//!             eprintln!("{}", diagnostic.render());
//!         }
//!     }
//!     Err(error) => eprintln!("{}", error),
//! }
//! ```

pub mod arena;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use arena::Arena;
pub use ast::{Expr, Module, Stmt};
pub use error::{Diagnostic, DiagnosticCollector, Error, ParseResult, Severity};
pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use semantic::{PassManager, SymbolTable, Type};

/// Result type for whole-pipeline operations.
pub type CypressResult<T> = Result<T, CypressError>;

/// Error for operations that can fail before producing a module.
#[derive(Debug)]
pub enum CypressError {
    /// The source was too malformed to produce any tree.
    Syntax(Box<Error>),
}

impl std::fmt::Display for CypressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CypressError::Syntax(e) => write!(f, "{}", e.to_diagnostic().render()),
        }
    }
}

impl std::error::Error for CypressError {}

impl From<Box<Error>> for CypressError {
    fn from(error: Box<Error>) -> Self {
        CypressError::Syntax(error)
    }
}

/// Result of parsing alone, without semantic analysis.
#[derive(Debug)]
pub struct ParseOutput<'a> {
    /// The parsed module
    pub module: &'a Module<'a>,
    /// Diagnostics recovered during parsing
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of parsing plus the full pass pipeline.
pub struct AnalyzeOutput<'a> {
    /// The lowered module, ready for code generation
    pub module: &'a Module<'a>,
    /// Symbol table with resolved, mangled, capture-annotated entries
    pub symbols: SymbolTable,
    /// Diagnostics from parsing and every pass, in report order
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> AnalyzeOutput<'a> {
    /// Whether any diagnostic prevents usable output.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    /// Error-severity diagnostics only.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .collect()
    }

    /// Warning-severity diagnostics only.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }
}

/// Parse `source` into a module without running semantic analysis.
///
/// The arena backing the tree is leaked so the result can be passed
/// around freely; callers compiling many modules in one process should
/// drive [`Parser`] against their own [`Arena`] instead.
pub fn parse(source: &str) -> CypressResult<ParseOutput<'static>> {
    let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer, arena);
    let module = parser.parse_module()?;
    let diagnostics = parser.errors().iter().map(|e| e.to_diagnostic()).collect();
    Ok(ParseOutput {
        module,
        diagnostics,
    })
}

/// Parse `source` and run the full pass pipeline over it.
///
/// Returns `Err` only when the source is too malformed to produce a
/// tree at all; recoverable syntax errors and all semantic diagnostics
/// accumulate in the output.
pub fn analyze(source: &str) -> CypressResult<AnalyzeOutput<'static>> {
    let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer, arena);
    let module = parser.parse_module()?;

    let mut diagnostics: Vec<Diagnostic> =
        parser.errors().iter().map(|e| e.to_diagnostic()).collect();

    let analysis = PassManager::new(arena).run(module);
    diagnostics.extend(analysis.errors.iter().map(|e| e.to_diagnostic()));

    Ok(AnalyzeOutput {
        module: analysis.module,
        symbols: analysis.symbols,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_clean_source() {
        let output = analyze("x = 1\ny = x + 1\n").unwrap();
        assert!(!output.has_errors());
        assert_eq!(output.module.body.len(), 2);
    }

    #[test]
    fn analyze_collects_semantic_errors() {
        let output = analyze("print(missing)\n").unwrap();
        assert!(output.has_errors());
    }

    #[test]
    fn parse_surfaces_recovered_errors() {
        let output = parse("x = = 1\ny = 2\n").unwrap();
        assert!(!output.diagnostics.is_empty());
    }
}
