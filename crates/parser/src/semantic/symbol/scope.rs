//! Scope and symbol-entry records.
//!
//! Scopes and entries live in flat arenas inside the symbol table and
//! reference each other by integer id, so the parent/child and
//! defining/inner-view back-references never form ownership cycles.

use crate::semantic::types::Type;
use std::collections::HashMap;
use text_size::TextRange;

pub type ScopeId = usize;
pub type EntryId = usize;

/// What kind of lexical namespace a scope is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
}

/// How an entry may be referenced from generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
    Extern,
}

/// Storage and usage role flags for one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFlags {
    pub is_param: bool,
    pub is_local: bool,
    pub is_global: bool,
    pub is_constant: bool,
    pub is_function: bool,
    pub is_type: bool,
    /// Set when a nested function references this entry.
    pub is_captured: bool,
    /// Physical storage relocated onto the enclosing closure carrier.
    pub in_carrier: bool,
}

/// One declared name.
///
/// A closure-captured symbol has exactly one defining entry plus any
/// number of inner-view entries in the capturing scopes; inner views
/// carry `defining: Some(id)` and share the defining entry's mutable
/// state (type, capture flags) through the symbol table.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    /// Mangled physical name used in generated code.
    pub cname: String,
    pub ty: Type,
    pub visibility: Visibility,
    pub flags: EntryFlags,
    pub scope: ScopeId,
    /// For inner closure views, the defining entry in the outer scope.
    pub defining: Option<EntryId>,
    pub span: TextRange,
}

impl Entry {
    pub fn is_inner_view(&self) -> bool {
        self.defining.is_some()
    }
}

/// One lexical namespace.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Name to entry mapping; iteration order is never relied on.
    pub entries: HashMap<String, EntryId>,
    /// Role-partitioned views used by bulk codegen queries.
    pub params: Vec<EntryId>,
    pub locals: Vec<EntryId>,
    pub nested_functions: Vec<ScopeId>,
    /// Entries of this scope captured by nested functions.
    pub captured: Vec<EntryId>,
    /// Set by closure materialization when captured is non-empty.
    pub needs_closure: bool,
    /// C struct name of the synthesized carrier, when one exists.
    pub carrier_name: Option<String>,
    /// Nearest enclosing scope that owns a carrier, linked into nested
    /// functions so captured access can route through it.
    pub carrier_link: Option<ScopeId>,
    /// Once declaration analysis finishes, the scope accepts no new
    /// user-level declarations (compiler temporaries are exempt).
    pub closed: bool,
    /// For class scopes: the base class scope, if any.
    pub base: Option<ScopeId>,
}

impl Scope {
    pub fn new(id: ScopeId, name: &str, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            id,
            name: name.to_string(),
            kind,
            parent,
            entries: HashMap::new(),
            params: Vec::new(),
            locals: Vec::new(),
            nested_functions: Vec::new(),
            captured: Vec::new(),
            needs_closure: false,
            carrier_name: None,
            carrier_link: None,
            closed: false,
            base: None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == ScopeKind::Function
    }

    pub fn is_class(&self) -> bool {
        self.kind == ScopeKind::Class
    }
}
