//! Scope-chain symbol table with closure capture tracking.

use super::scope::{Entry, EntryFlags, EntryId, Scope, ScopeId, ScopeKind, Visibility};
use crate::error::{Error, ErrorKind};
use crate::semantic::types::Type;
use std::collections::HashMap;
use text_size::TextRange;

/// Declaration kind, used for redeclaration compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Param,
    Func,
    Class,
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Found in the current scope or reachable without capture.
    Found(EntryId),
    /// Found in an enclosing function scope; the id is the inner view
    /// created in the capturing scope.
    Captured(EntryId),
    NotFound,
}

/// All scopes and entries for one compilation unit.
///
/// Scopes and entries are arena-allocated and addressed by id; the
/// `scope_stack` mirrors the traversal position of the pass currently
/// walking the tree.
pub struct SymbolTable {
    scopes: Vec<Scope>,
    entries: Vec<Entry>,
    scope_stack: Vec<ScopeId>,
    /// Name-reference span to resolved entry, filled by name resolution.
    resolutions: HashMap<TextRange, EntryId>,
    fresh_counter: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        let module = Scope::new(0, "module", ScopeKind::Module, None);
        SymbolTable {
            scopes: vec![module],
            entries: Vec::new(),
            scope_stack: vec![0],
            resolutions: HashMap::new(),
            fresh_counter: 0,
        }
    }

    // ===== scope navigation =====

    pub fn module_scope(&self) -> ScopeId {
        0
    }

    pub fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().unwrap()
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Push a new function scope under the current scope.
    pub fn enter_function(&mut self, name: &str) -> ScopeId {
        let parent = self.current_scope();
        let id = self.scopes.len();
        self.scopes
            .push(Scope::new(id, name, ScopeKind::Function, Some(parent)));
        self.scopes[parent].nested_functions.push(id);
        self.scope_stack.push(id);
        id
    }

    pub fn enter_class(&mut self, name: &str, base: Option<ScopeId>) -> ScopeId {
        let parent = self.current_scope();
        let id = self.scopes.len();
        let mut scope = Scope::new(id, name, ScopeKind::Class, Some(parent));
        scope.base = base;
        self.scopes.push(scope);
        self.scope_stack.push(id);
        if let Some(base) = base {
            self.inherit_base(id, base);
        }
        id
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.scope_stack.len() > 1, "cannot exit the module scope");
        self.scope_stack.pop();
    }

    /// Re-enter an existing scope (used by passes after declaration
    /// analysis has built the scope tree).
    pub fn push_scope(&mut self, id: ScopeId) {
        self.scope_stack.push(id);
    }

    /// Find the scope a later pass should re-enter for a nested
    /// function of the current scope with the given name.
    pub fn find_nested_function(&self, name: &str) -> Option<ScopeId> {
        let current = self.current_scope();
        self.scopes[current]
            .nested_functions
            .iter()
            .copied()
            .find(|&id| self.scopes[id].name == name)
    }

    /// Find a class scope declared directly under the current scope.
    pub fn find_class_scope(&self, name: &str) -> Option<ScopeId> {
        let current = self.current_scope();
        self.scopes
            .iter()
            .find(|s| {
                s.kind == ScopeKind::Class && s.parent == Some(current) && s.name == name
            })
            .map(|s| s.id)
    }

    // ===== declaration =====

    /// Declare `name` in the current scope.
    ///
    /// Redeclaration with a compatible kind completes the earlier entry
    /// and returns it; an incompatible redeclaration keeps the first
    /// entry and reports a non-fatal warning.
    pub fn declare(
        &mut self,
        name: &str,
        kind: DeclKind,
        ty: Type,
        span: TextRange,
    ) -> Result<EntryId, Box<Error>> {
        let scope_id = self.current_scope();
        debug_assert!(
            !self.scopes[scope_id].closed,
            "declaration into a closed scope"
        );

        if let Some(&existing) = self.scopes[scope_id].entries.get(name) {
            if self.compatible(existing, kind) {
                let entry = &mut self.entries[existing];
                if ty.is_known() {
                    entry.ty = ty;
                }
                return Ok(existing);
            }
            return Err(Box::new(Error::new(
                ErrorKind::IncompatibleRedeclaration {
                    name: name.to_string(),
                },
                span,
            )));
        }

        let cname = self.mangle(scope_id, name, kind);
        let id = self.push_entry(Entry {
            id: 0,
            name: name.to_string(),
            cname,
            ty,
            visibility: Visibility::Private,
            flags: EntryFlags {
                is_param: kind == DeclKind::Param,
                is_local: kind == DeclKind::Var && scope_id != 0,
                is_global: scope_id == 0,
                is_function: kind == DeclKind::Func,
                is_type: kind == DeclKind::Class,
                ..EntryFlags::default()
            },
            scope: scope_id,
            defining: None,
            span,
        });

        let scope = &mut self.scopes[scope_id];
        scope.entries.insert(name.to_string(), id);
        match kind {
            DeclKind::Param => scope.params.push(id),
            DeclKind::Var => scope.locals.push(id),
            _ => {}
        }
        Ok(id)
    }

    /// Declare a compiler-synthesized temporary. Exempt from the
    /// closed-scope invariant: lowering runs after declaration analysis.
    pub fn declare_temp(&mut self, name: &str, ty: Type, span: TextRange) -> EntryId {
        let scope_id = self.current_scope();
        let id = self.push_entry(Entry {
            id: 0,
            name: name.to_string(),
            cname: name.to_string(),
            ty,
            visibility: Visibility::Private,
            flags: EntryFlags {
                is_local: true,
                ..EntryFlags::default()
            },
            scope: scope_id,
            defining: None,
            span,
        });
        let scope = &mut self.scopes[scope_id];
        scope.entries.insert(name.to_string(), id);
        scope.locals.push(id);
        id
    }

    /// Pre-seed a builtin function in the module scope.
    pub fn declare_builtin(&mut self, name: &str) -> EntryId {
        let id = self.push_entry(Entry {
            id: 0,
            name: name.to_string(),
            cname: format!("cyB_{name}"),
            ty: Type::Function,
            visibility: Visibility::Extern,
            flags: EntryFlags {
                is_function: true,
                is_global: true,
                ..EntryFlags::default()
            },
            scope: 0,
            defining: None,
            span: TextRange::default(),
        });
        self.scopes[0].entries.insert(name.to_string(), id);
        id
    }

    /// Bind `name` in the current scope to the module-level entry,
    /// creating the module entry on demand.
    pub fn declare_global(&mut self, name: &str, span: TextRange) -> EntryId {
        let module_entry = match self.scopes[0].entries.get(name) {
            Some(&id) => id,
            None => {
                let cname = self.mangle(0, name, DeclKind::Var);
                let id = self.push_entry(Entry {
                    id: 0,
                    name: name.to_string(),
                    cname,
                    ty: Type::Unknown,
                    visibility: Visibility::Private,
                    flags: EntryFlags {
                        is_global: true,
                        ..EntryFlags::default()
                    },
                    scope: 0,
                    defining: None,
                    span,
                });
                self.scopes[0].entries.insert(name.to_string(), id);
                id
            }
        };

        let scope_id = self.current_scope();
        if scope_id == 0 {
            return module_entry;
        }
        let view = self.push_view(module_entry, scope_id, span, true);
        self.scopes[scope_id].entries.insert(name.to_string(), view);
        view
    }

    /// Bind `name` to an existing entry in the nearest enclosing
    /// function scope, per `nonlocal` semantics.
    pub fn declare_nonlocal(&mut self, name: &str, span: TextRange) -> Result<EntryId, Box<Error>> {
        let scope_id = self.current_scope();
        let mut cursor = self.scopes[scope_id].parent;
        while let Some(id) = cursor {
            let scope = &self.scopes[id];
            if scope.kind == ScopeKind::Function {
                if let Some(&entry) = scope.entries.get(name) {
                    let defining = self.resolve_defining(entry);
                    self.mark_captured(defining);
                    let view = self.push_view(defining, scope_id, span, false);
                    self.scopes[scope_id].entries.insert(name.to_string(), view);
                    return Ok(view);
                }
            }
            if scope.kind == ScopeKind::Module {
                break;
            }
            cursor = scope.parent;
        }
        Err(Box::new(Error::new(
            ErrorKind::NonlocalWithoutBinding {
                name: name.to_string(),
            },
            span,
        )))
    }

    // ===== lookup =====

    /// Look up `name` in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<EntryId> {
        self.scopes[self.current_scope()].entries.get(name).copied()
    }

    /// Look up `name` through the scope chain.
    ///
    /// A hit in an enclosing function scope marks the defining entry
    /// closure-captured and installs an inner view in the current
    /// function scope. Class scopes chain through for reads but are
    /// skipped when the reference originates in a method body.
    pub fn lookup(&mut self, name: &str) -> Lookup {
        let origin = self.current_scope();
        let mut cursor = Some(origin);
        let mut crossed_function = false;

        while let Some(scope_id) = cursor {
            let scope = &self.scopes[scope_id];
            // Class namespaces are invisible to code nested inside them.
            let skip = scope.is_class() && scope_id != origin;
            if !skip {
                if let Some(&entry) = scope.entries.get(name).or_else(|| {
                    scope
                        .base
                        .filter(|_| scope.is_class())
                        .and_then(|base| self.scopes[base].entries.get(name))
                }) {
                    if scope_id == origin {
                        return Lookup::Found(entry);
                    }
                    if scope.is_function() && crossed_function {
                        let defining = self.resolve_defining(entry);
                        // Functions and classes are globally addressable
                        // in the output; referencing one is not a capture.
                        let flags = self.entries[defining].flags;
                        if flags.is_function || flags.is_type {
                            return Lookup::Found(entry);
                        }
                        self.mark_captured(defining);
                        let span = self.entries[defining].span;
                        let view = self.push_view(defining, origin, span, false);
                        self.scopes[origin].entries.insert(name.to_string(), view);
                        return Lookup::Captured(view);
                    }
                    return Lookup::Found(entry);
                }
            }
            if scope.is_function() && scope_id != origin {
                crossed_function = true;
            }
            if self.scopes[origin].is_function() && scope_id == origin {
                crossed_function = true;
            }
            cursor = self.scopes[scope_id].parent;
        }
        Lookup::NotFound
    }

    // ===== entry access =====

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id]
    }

    /// Follow inner-view links to the defining entry.
    pub fn resolve_defining(&self, id: EntryId) -> EntryId {
        let mut current = id;
        while let Some(next) = self.entries[current].defining {
            current = next;
        }
        current
    }

    /// Type of the logical symbol behind `id` (shared across views).
    pub fn entry_type(&self, id: EntryId) -> &Type {
        &self.entries[self.resolve_defining(id)].ty
    }

    pub fn set_entry_type(&mut self, id: EntryId, ty: Type) {
        let defining = self.resolve_defining(id);
        self.entries[defining].ty = ty;
    }

    pub fn entry_is_captured(&self, id: EntryId) -> bool {
        self.entries[self.resolve_defining(id)].flags.is_captured
    }

    // ===== resolution map =====

    pub fn record_resolution(&mut self, span: TextRange, id: EntryId) {
        self.resolutions.insert(span, id);
    }

    pub fn resolution(&self, span: TextRange) -> Option<EntryId> {
        self.resolutions.get(&span).copied()
    }

    // ===== closure materialization =====

    /// Synthesize closure carriers, bottom-up.
    ///
    /// Capture sets were collected by declaration analysis; this pass
    /// promotes every scope with a non-empty capture set to own a
    /// carrier record, relocates captured entries onto it, and links
    /// each nested function to the nearest enclosing carrier. Inner
    /// scopes are processed first so an outer carrier can link to ones
    /// already synthesized below it.
    pub fn materialize_closures(&mut self) {
        for id in (0..self.scopes.len()).rev() {
            if self.scopes[id].captured.is_empty() {
                continue;
            }
            let carrier = format!("__cyclosure_{}", self.scopes[id].name);
            self.scopes[id].needs_closure = true;
            self.scopes[id].carrier_name = Some(carrier);

            let captured = self.scopes[id].captured.clone();
            for entry in captured {
                self.entries[entry].flags.in_carrier = true;
            }
        }

        // Link every function scope to the nearest enclosing carrier.
        for id in 0..self.scopes.len() {
            if !self.scopes[id].is_function() {
                continue;
            }
            let mut cursor = self.scopes[id].parent;
            while let Some(parent) = cursor {
                if self.scopes[parent].needs_closure {
                    self.scopes[id].carrier_link = Some(parent);
                    break;
                }
                cursor = self.scopes[parent].parent;
            }
        }
    }

    /// Close every scope to new user-level declarations.
    pub fn close_all_scopes(&mut self) {
        for scope in &mut self.scopes {
            scope.closed = true;
        }
    }

    // ===== helpers =====

    /// Fresh compiler-internal name with the given tag.
    pub fn fresh_name(&mut self, tag: &str) -> String {
        let n = self.fresh_counter;
        self.fresh_counter += 1;
        format!("__cy{tag}{n}")
    }

    fn push_entry(&mut self, mut entry: Entry) -> EntryId {
        let id = self.entries.len();
        entry.id = id;
        self.entries.push(entry);
        id
    }

    /// Create an inner view of `defining` inside `scope`.
    fn push_view(
        &mut self,
        defining: EntryId,
        scope: ScopeId,
        span: TextRange,
        is_global: bool,
    ) -> EntryId {
        let name = self.entries[defining].name.clone();
        let cname = self.entries[defining].cname.clone();
        self.push_entry(Entry {
            id: 0,
            name,
            cname,
            ty: Type::Unknown,
            visibility: self.entries[defining].visibility,
            flags: EntryFlags {
                is_global,
                ..EntryFlags::default()
            },
            scope,
            defining: Some(defining),
            span,
        })
    }

    fn mark_captured(&mut self, defining: EntryId) {
        if self.entries[defining].flags.is_captured {
            return;
        }
        self.entries[defining].flags.is_captured = true;
        let owner = self.entries[defining].scope;
        self.scopes[owner].captured.push(defining);
    }

    fn compatible(&self, existing: EntryId, kind: DeclKind) -> bool {
        let flags = self.entries[existing].flags;
        match kind {
            DeclKind::Func => flags.is_function,
            DeclKind::Class => flags.is_type,
            // Rebinding a function name to a value is ordinary (the
            // decorator expansion relies on it); rebinding a class
            // name would orphan its scope.
            DeclKind::Var | DeclKind::Param => !flags.is_type,
        }
    }

    /// Physical (mangled) name for a declaration.
    ///
    /// Functions and classes carry their scope path so the flat C
    /// namespace stays collision-free; plain variables are local to the
    /// generated function body and only need the user-name prefix.
    fn mangle(&self, scope_id: ScopeId, name: &str, kind: DeclKind) -> String {
        // Synthesized names are already unique, C-safe identifiers.
        if name.starts_with("__cy") {
            return name.to_string();
        }
        match kind {
            DeclKind::Func | DeclKind::Class => {
                let mut parts = Vec::new();
                let mut cursor = Some(scope_id);
                while let Some(id) = cursor {
                    if id != 0 {
                        parts.push(self.scopes[id].name.clone());
                    }
                    cursor = self.scopes[id].parent;
                }
                parts.reverse();
                if parts.is_empty() {
                    format!("cy_{name}")
                } else {
                    format!("cy_{}_{name}", parts.join("_"))
                }
            }
            _ => format!("cy_{name}"),
        }
    }

    /// Copy the base class's non-overridden entries into a subtype
    /// scope before its own declarations are added.
    fn inherit_base(&mut self, class_scope: ScopeId, base: ScopeId) {
        let inherited: Vec<(String, EntryId)> = self.scopes[base]
            .entries
            .iter()
            .map(|(name, &id)| (name.clone(), id))
            .collect();
        for (name, base_entry) in inherited {
            if self.scopes[class_scope].entries.contains_key(&name) {
                continue;
            }
            let adapted = Entry {
                id: 0,
                scope: class_scope,
                ..self.entries[base_entry].clone()
            };
            let id = self.push_entry(adapted);
            self.scopes[class_scope].entries.insert(name, id);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> TextRange {
        TextRange::default()
    }

    #[test]
    fn lookup_walks_the_scope_chain() {
        let mut table = SymbolTable::new();
        let x = table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        table.enter_function("f");
        match table.lookup("x") {
            Lookup::Found(id) => assert_eq!(id, x),
            other => panic!("expected module hit, got {other:?}"),
        }
    }

    #[test]
    fn nested_function_reference_is_captured() {
        let mut table = SymbolTable::new();
        table.enter_function("f");
        let x = table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        table.enter_function("g");
        match table.lookup("x") {
            Lookup::Captured(view) => {
                assert_eq!(table.resolve_defining(view), x);
                assert!(table.entry_is_captured(view));
            }
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn module_access_is_not_capture() {
        let mut table = SymbolTable::new();
        table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        table.enter_function("f");
        table.enter_function("g");
        assert!(matches!(table.lookup("x"), Lookup::Found(_)));
    }

    #[test]
    fn inner_view_shares_type_with_defining_entry() {
        let mut table = SymbolTable::new();
        table.enter_function("f");
        let x = table.declare("x", DeclKind::Var, Type::Unknown, span()).unwrap();
        table.enter_function("g");
        let view = match table.lookup("x") {
            Lookup::Captured(view) => view,
            other => panic!("expected capture, got {other:?}"),
        };
        table.set_entry_type(view, Type::Int);
        assert_eq!(*table.entry_type(x), Type::Int);
    }

    #[test]
    fn incompatible_redeclaration_keeps_first_entry() {
        let mut table = SymbolTable::new();
        let f = table.declare("f", DeclKind::Func, Type::Function, span()).unwrap();
        let err = table.declare("f", DeclKind::Class, Type::Unknown, span());
        assert!(err.is_err());
        assert_eq!(*table.entry_type(f), Type::Function);
        assert!(table.entry(f).flags.is_function);
    }

    #[test]
    fn compatible_redeclaration_completes_existing_entry() {
        let mut table = SymbolTable::new();
        let x = table.declare("x", DeclKind::Var, Type::Unknown, span()).unwrap();
        let again = table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        assert_eq!(x, again);
        assert_eq!(*table.entry_type(x), Type::Int);
    }

    #[test]
    fn materialization_promotes_capturing_scope() {
        let mut table = SymbolTable::new();
        let f = table.enter_function("f");
        table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        table.enter_function("g");
        let _ = table.lookup("x");
        table.exit_scope();
        table.exit_scope();

        table.materialize_closures();
        assert!(table.scope(f).needs_closure);
        assert!(table.scope(f).carrier_name.is_some());
        let captured = table.scope(f).captured[0];
        assert!(table.entry(captured).flags.in_carrier);
    }

    #[test]
    fn nested_function_links_to_nearest_carrier() {
        let mut table = SymbolTable::new();
        let f = table.enter_function("f");
        table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        let g = table.enter_function("g");
        let _ = table.lookup("x");
        table.exit_scope();
        table.exit_scope();

        table.materialize_closures();
        assert_eq!(table.scope(g).carrier_link, Some(f));
    }

    #[test]
    fn class_scope_inherits_base_entries() {
        let mut table = SymbolTable::new();
        let base = table.enter_class("Base", None);
        table.declare("method", DeclKind::Func, Type::Function, span()).unwrap();
        table.exit_scope();

        table.enter_class("Derived", Some(base));
        assert!(table.lookup_local("method").is_some());
    }

    #[test]
    fn nonlocal_without_binding_is_an_error() {
        let mut table = SymbolTable::new();
        table.enter_function("f");
        table.enter_function("g");
        assert!(table.declare_nonlocal("missing", span()).is_err());
    }

    #[test]
    fn global_binds_to_module_entry() {
        let mut table = SymbolTable::new();
        let x = table.declare("x", DeclKind::Var, Type::Int, span()).unwrap();
        table.enter_function("f");
        let view = table.declare_global("x", span());
        assert_eq!(table.resolve_defining(view), x);
    }
}
