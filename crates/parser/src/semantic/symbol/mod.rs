mod scope;
mod table;

pub use scope::{Entry, EntryFlags, EntryId, Scope, ScopeId, ScopeKind, Visibility};
pub use table::{DeclKind, Lookup, SymbolTable};
