//! The C emitter.
//!
//! Walks the lowered tree with the resolved symbol table and produces
//! two streams: a header with the runtime interface and closure carrier
//! structs, and an implementation file with one C function per Cypress
//! function plus a `main` that executes the module body.
//!
//! All values are `CyValue`, the reference type of the runtime library;
//! scalars the inference pass proved are still emitted boxed, the types
//! feed diagnostics only. Functions are compiled to C functions and
//! wrapped in callable objects at their definition point, so decorator
//! rebinding and functions-as-values need no special cases.

mod expr;
mod module;
mod stmt;

use crate::error::CodegenResult;
use crate::labels::Labels;
use crate::temp::{Temp, TempAllocator};
use crate::writer::CodeWriter;
use cypress_parser::semantic::symbol::{EntryId, ScopeId, ScopeKind};
use cypress_parser::semantic::SymbolTable;
use cypress_parser::Module;

/// The generated compilation unit.
#[derive(Debug, Clone)]
pub struct COutput {
    pub header: String,
    pub source: String,
}

/// Emit C for a lowered module. `name` becomes the header guard and the
/// base of generated file-local identifiers.
pub fn emit(module: &Module<'_>, symbols: &SymbolTable, name: &str) -> CodegenResult<COutput> {
    let mut emitter = Emitter::new(symbols, name);
    emitter.emit_module(module)?;
    Ok(COutput {
        header: emitter.header.finish(),
        source: emitter.source.finish(),
    })
}

pub(crate) struct Emitter<'s> {
    symbols: &'s SymbolTable,
    module_name: String,
    header: CodeWriter,
    /// Slot in the header for closure carrier structs.
    structs: CodeWriter,
    source: CodeWriter,
    /// Slot at the top of the source for function prototypes.
    protos: CodeWriter,
    /// Slot for file-scope object variables.
    statics: CodeWriter,
    /// Slot where function definitions accumulate; nested functions in
    /// the source language land here at C file scope.
    funcs: CodeWriter,
}

/// Per-function emission state.
pub(crate) struct FuncCtx<'a> {
    scope: ScopeId,
    body: CodeWriter,
    decls: CodeWriter,
    temps: TempAllocator,
    labels: Labels,
    /// Expression-level temporaries, released when the statement that
    /// allocated them finishes.
    stmt_temps: Vec<Temp>,
    /// Enclosing `finally` bodies, innermost last; `return` replays
    /// them before leaving the function.
    finally_stack: Vec<&'a [cypress_parser::Stmt<'a>]>,
}

impl<'a> FuncCtx<'a> {
    fn new(scope: ScopeId, body: CodeWriter, decls: CodeWriter) -> Self {
        FuncCtx {
            scope,
            body,
            decls,
            temps: TempAllocator::new(),
            labels: Labels::new(),
            stmt_temps: Vec::new(),
            finally_stack: Vec::new(),
        }
    }
}

impl<'s> Emitter<'s> {
    fn new(symbols: &'s SymbolTable, name: &str) -> Self {
        let guard: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        let header = CodeWriter::new();
        header.line(&format!("#ifndef CY_{}_H", guard));
        header.line(&format!("#define CY_{}_H", guard));
        header.newline();
        header.write(module::RUNTIME_PRELUDE);
        header.newline();
        let structs = header.insertion_point();
        header.newline();
        header.line("#endif");

        let source = CodeWriter::new();
        source.line(&format!("#include \"{}.h\"", name));
        source.newline();
        let protos = source.insertion_point();
        source.newline();
        let statics = source.insertion_point();
        source.newline();
        let funcs = source.insertion_point();
        source.newline();

        Emitter {
            symbols,
            module_name: name.to_string(),
            structs,
            header,
            protos,
            statics,
            funcs,
            source,
        }
    }

    /// Scope of the function or class named `name` declared in `parent`.
    fn child_scope(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        for id in 0..self.symbols.scope_count() {
            let scope = self.symbols.scope(id);
            if scope.parent == Some(parent) && scope.name == name {
                return Some(id);
            }
        }
        None
    }

    /// Whether `scope` holds an inner view of carrier-resident storage;
    /// views of globals do not count, they alias a file-scope variable.
    fn has_views(&self, scope: ScopeId) -> bool {
        self.symbols.scope(scope).entries.values().any(|&id| {
            self.symbols
                .entry(id)
                .defining
                .map(|def| self.symbols.entry(def).flags.in_carrier)
                .unwrap_or(false)
        })
    }

    /// Whether the compiled function needs the environment pointer: it
    /// reads captured state itself, owns a carrier that must chain to
    /// an enclosing one, or forwards the pointer to a nested function
    /// that does.
    fn needs_env(&self, scope_id: ScopeId) -> bool {
        let scope = self.symbols.scope(scope_id);
        if scope.carrier_link.is_none() {
            return false;
        }
        if scope.needs_closure {
            return true;
        }
        if self.has_views(scope_id) {
            return true;
        }
        scope
            .nested_functions
            .iter()
            .any(|&n| self.needs_env(n) && self.symbols.scope(n).carrier_link != Some(scope_id))
    }

    /// How code in `ctx` spells the environment pointer for a nested
    /// function whose carrier lives in `owner`.
    fn env_argument(&self, ctx: &FuncCtx<'_>, owner: ScopeId) -> &'static str {
        if ctx.scope == owner {
            "&__cyclosure"
        } else {
            "__cyenv"
        }
    }

    /// The C l/r-value for a resolved entry as seen from `ctx`.
    fn entry_ref(&self, ctx: &FuncCtx<'_>, eid: EntryId) -> String {
        let entry = self.symbols.entry(eid);
        if let Some(def) = entry.defining {
            let owner = self.symbols.entry(def);
            // Captured storage lives on the carrier; global and
            // nonlocal-to-uncaptured views alias the owner directly.
            if owner.flags.in_carrier {
                return format!("{}->{}", self.env_path(ctx, owner.scope), owner.cname);
            }
            return owner.cname.clone();
        }
        if entry.flags.in_carrier {
            return format!("__cyclosure.{}", entry.cname);
        }
        entry.cname.clone()
    }

    /// Spell the pointer to the carrier of `target` as seen from `ctx`:
    /// `__cyenv` reaches the nearest enclosing carrier, and each hop
    /// past it goes through the embedded `__cyouter` link.
    fn env_path(&self, ctx: &FuncCtx<'_>, target: ScopeId) -> String {
        let mut path = String::from("__cyenv");
        let mut cursor = self.symbols.scope(ctx.scope).carrier_link;
        while let Some(scope) = cursor {
            if scope == target {
                break;
            }
            path.push_str("->__cyouter");
            cursor = self.symbols.scope(scope).carrier_link;
        }
        path
    }

    /// True when the entry is a plain class attribute: reads and writes
    /// go through the class object rather than a C variable.
    fn is_class_attribute(&self, eid: EntryId) -> bool {
        let entry = self.symbols.entry(eid);
        !entry.flags.is_function
            && !entry.flags.is_type
            && entry.defining.is_none()
            && self.symbols.scope(entry.scope).kind == ScopeKind::Class
    }

    /// C expression for the class object owning `scope`.
    fn class_object(&self, scope_id: ScopeId) -> String {
        let scope = self.symbols.scope(scope_id);
        if let Some(parent) = scope.parent {
            if let Some(&eid) = self.symbols.scope(parent).entries.get(&scope.name) {
                return self.symbols.entry(eid).cname.clone();
            }
        }
        format!("cy_{}", scope.name)
    }
}

/// Escape a source string literal for a C string literal.
pub(crate) fn c_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_control_characters() {
        assert_eq!(c_escape("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(c_escape("\u{1}"), "\\x01");
    }
}
