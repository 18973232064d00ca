//! Semantic analysis: symbol tables, type inference, and the pass
//! pipeline that rewrites the tree into its lowered form.

pub mod passes;
pub mod symbol;
pub mod types;

pub use passes::{Analysis, PassManager};
pub use symbol::{Entry, EntryId, Scope, ScopeId, ScopeKind, SymbolTable, Visibility};
pub use types::Type;
