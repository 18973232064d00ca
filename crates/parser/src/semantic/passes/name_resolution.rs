//! Pass 3: declaration analysis and name resolution.
//!
//! Walks the tree binding every declaration to a symbol-table entry
//! and resolving every name reference through the scope chain. Capture
//! marking happens as a side effect of enclosing-function lookups; the
//! closure pass consumes the capture sets afterwards.

use crate::ast::*;
use crate::error::{Error, ErrorKind};
use crate::semantic::symbol::{DeclKind, EntryId, Lookup, ScopeId, SymbolTable};
use crate::semantic::types::Type;
use std::collections::{HashMap, HashSet};
use text_size::TextRange;

/// Names resolvable in every module without declaration.
const BUILTINS: &[&str] = &[
    "print", "len", "range", "abs", "min", "max", "sum", "str", "int", "float", "bool", "list",
    "tuple", "set", "dict", "object", "Exception",
];

pub struct NameResolution<'s, 'e> {
    symbols: &'s mut SymbolTable,
    errors: &'e mut Vec<Error>,
    /// Defining entry of each class to its scope, for base resolution.
    class_scopes: HashMap<EntryId, ScopeId>,
    /// Names bound by global/nonlocal in the function being analyzed.
    redirected: HashSet<String>,
}

/// Collect names redirected by `global`/`nonlocal` anywhere in a
/// function body, without descending into nested definitions.
fn collect_redirected(body: &[Stmt<'_>], out: &mut HashSet<String>) {
    for stmt in body {
        match stmt {
            Stmt::Global(s) => {
                for name in s.names {
                    out.insert(name.to_string());
                }
            }
            Stmt::Nonlocal(s) => {
                for name in s.names {
                    out.insert(name.to_string());
                }
            }
            Stmt::If(s) => {
                collect_redirected(s.body, out);
                collect_redirected(s.orelse, out);
            }
            Stmt::While(s) => {
                collect_redirected(s.body, out);
                collect_redirected(s.orelse, out);
            }
            Stmt::For(s) => {
                collect_redirected(s.body, out);
                collect_redirected(s.orelse, out);
            }
            Stmt::Try(s) => {
                collect_redirected(s.body, out);
                for handler in s.handlers {
                    collect_redirected(handler.body, out);
                }
                collect_redirected(s.orelse, out);
                collect_redirected(s.finalbody, out);
            }
            Stmt::With(s) => collect_redirected(s.body, out),
            _ => {}
        }
    }
}

impl<'s, 'e> NameResolution<'s, 'e> {
    pub fn new(symbols: &'s mut SymbolTable, errors: &'e mut Vec<Error>) -> Self {
        NameResolution {
            symbols,
            errors,
            class_scopes: HashMap::new(),
            redirected: HashSet::new(),
        }
    }

    pub fn run(&mut self, module: &Module<'_>) {
        for name in BUILTINS {
            self.symbols.declare_builtin(name);
        }
        // Functions and classes are visible to earlier statements in
        // the same suite, so forward calls resolve.
        self.predeclare_definitions(module.body);
        for stmt in module.body {
            self.visit_stmt(stmt);
        }
    }

    /// Declare function and class names of one suite ahead of the walk.
    fn predeclare_definitions(&mut self, body: &[Stmt<'_>]) {
        for stmt in body {
            match stmt {
                Stmt::FuncDef(s) => {
                    self.declare(s.name, DeclKind::Func, Type::Function, s.span);
                }
                Stmt::ClassDef(s) => {
                    self.declare(
                        s.name,
                        DeclKind::Class,
                        Type::Class(s.name.to_string()),
                        s.span,
                    );
                }
                _ => {}
            }
        }
    }

    fn declare(&mut self, name: &str, kind: DeclKind, ty: Type, span: TextRange) -> Option<EntryId> {
        match self.symbols.declare(name, kind, ty, span) {
            Ok(id) => Some(id),
            Err(err) => {
                self.errors.push(*err);
                None
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(s) => self.visit_expr(&s.value),
            Stmt::Assign(s) => {
                // Right-hand side resolves before any target binds.
                self.visit_expr(&s.value);
                for target in s.targets {
                    self.visit_target(target);
                }
            }
            Stmt::AnnAssign(s) => {
                let ty = annotation_type(&s.annotation);
                if let Some(value) = &s.value {
                    self.visit_expr(value);
                }
                if let Expr::Name(name) = &s.target {
                    if let Some(id) = self.declare(name.id, DeclKind::Var, ty, name.span) {
                        self.symbols.record_resolution(name.span, id);
                    }
                } else {
                    self.visit_expr(&s.target);
                }
            }
            Stmt::AugAssign(s) => {
                self.visit_expr(&s.value);
                // Compound assignment reads the target before storing.
                self.visit_expr(&s.target);
            }
            Stmt::Return(s) => {
                if let Some(value) = &s.value {
                    self.visit_expr(value);
                }
            }
            Stmt::Raise(s) => {
                if let Some(exc) = &s.exc {
                    self.visit_expr(exc);
                }
            }
            Stmt::If(s) => {
                self.visit_expr(&s.test);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::While(s) => {
                self.visit_expr(&s.test);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::For(s) => {
                self.visit_expr(&s.iter);
                self.visit_target(&s.target);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::FuncDef(s) => self.visit_func_def(s),
            Stmt::ClassDef(s) => self.visit_class_def(s),
            Stmt::Try(s) => {
                self.visit_body(s.body);
                for handler in s.handlers {
                    if let Some(ty) = &handler.ty {
                        self.visit_expr(ty);
                    }
                    if let Some(name) = handler.name {
                        self.declare(name, DeclKind::Var, Type::Object, handler.span);
                    }
                    self.visit_body(handler.body);
                }
                self.visit_body(s.orelse);
                self.visit_body(s.finalbody);
            }
            Stmt::With(s) => {
                for item in s.items {
                    self.visit_expr(&item.context);
                    if let Some(target) = &item.target {
                        self.visit_target(target);
                    }
                }
                self.visit_body(s.body);
            }
            Stmt::Global(s) => {
                for name in s.names {
                    let id = self.symbols.declare_global(name, s.span);
                    self.symbols.record_resolution(s.span, id);
                }
            }
            Stmt::Nonlocal(s) => {
                for name in s.names {
                    if let Err(err) = self.symbols.declare_nonlocal(name, s.span) {
                        self.errors.push(*err);
                    }
                }
            }
            Stmt::Pass(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    fn visit_body(&mut self, body: &[Stmt<'_>]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_func_def(&mut self, s: &FuncDefStmt<'_>) {
        // Defaults evaluate in the defining scope, at definition time.
        for param in s.params {
            if let Some(default) = param.default {
                self.visit_expr(default);
            }
        }
        // Pre-declaration of the surrounding suite usually created the
        // entry already; only declare on the class-body path.
        if self.symbols.lookup_local(s.name).is_none() {
            self.declare(s.name, DeclKind::Func, Type::Function, s.span);
        }

        self.symbols.enter_function(s.name);
        for param in s.params {
            let ty = param
                .annotation
                .map(annotation_type)
                .unwrap_or(Type::Unknown);
            if let Some(id) = self.declare(param.name, DeclKind::Param, ty, param.span) {
                self.symbols.record_resolution(param.span, id);
            }
        }
        // The local set of a function is static: collect every name
        // bound anywhere in the body before resolving reads, so a read
        // above its binding line resolves locally and can be flagged.
        // Names redirected by global/nonlocal are not locals.
        let mut redirected = HashSet::new();
        collect_redirected(s.body, &mut redirected);
        self.redirected = redirected;
        self.predeclare_definitions(s.body);
        self.predeclare_locals(s.body);
        self.visit_body(s.body);
        self.symbols.exit_scope();
    }

    fn predeclare_locals(&mut self, body: &[Stmt<'_>]) {
        for stmt in body {
            match stmt {
                Stmt::Assign(s) => {
                    for target in s.targets {
                        self.predeclare_target(target);
                    }
                }
                Stmt::AnnAssign(s) => self.predeclare_target(&s.target),
                Stmt::For(s) => {
                    self.predeclare_target(&s.target);
                    self.predeclare_locals(s.body);
                    self.predeclare_locals(s.orelse);
                }
                Stmt::If(s) => {
                    self.predeclare_locals(s.body);
                    self.predeclare_locals(s.orelse);
                }
                Stmt::While(s) => {
                    self.predeclare_locals(s.body);
                    self.predeclare_locals(s.orelse);
                }
                Stmt::Try(s) => {
                    self.predeclare_locals(s.body);
                    for handler in s.handlers {
                        self.predeclare_locals(handler.body);
                    }
                    self.predeclare_locals(s.orelse);
                    self.predeclare_locals(s.finalbody);
                }
                Stmt::With(s) => {
                    for item in s.items {
                        if let Some(target) = &item.target {
                            self.predeclare_target(target);
                        }
                    }
                    self.predeclare_locals(s.body);
                }
                _ => {}
            }
        }
    }

    fn predeclare_target(&mut self, target: &Expr<'_>) {
        match target {
            Expr::Name(name) => {
                if !self.redirected.contains(name.id)
                    && self.symbols.lookup_local(name.id).is_none()
                {
                    self.declare(name.id, DeclKind::Var, Type::Unknown, name.span);
                }
            }
            Expr::Tuple(t) => {
                for elt in t.elts {
                    self.predeclare_target(elt);
                }
            }
            Expr::List(l) => {
                for elt in l.elts {
                    self.predeclare_target(elt);
                }
            }
            _ => {}
        }
    }

    fn visit_class_def(&mut self, s: &ClassDefStmt<'_>) {
        let base_scope = s.bases.first().and_then(|base| {
            self.visit_expr(base);
            let entry = self.symbols.resolution(base.span())?;
            let defining = self.symbols.resolve_defining(entry);
            self.class_scopes.get(&defining).copied()
        });

        let entry = match self.symbols.lookup_local(s.name) {
            Some(id) => Some(id),
            None => self.declare(s.name, DeclKind::Class, Type::Class(s.name.to_string()), s.span),
        };
        let scope = self.symbols.enter_class(s.name, base_scope);
        if let Some(entry) = entry {
            self.class_scopes.insert(entry, scope);
        }
        self.predeclare_definitions(s.body);
        self.visit_body(s.body);
        self.symbols.exit_scope();
    }

    /// Resolve an assignment target. A plain name binds in the current
    /// scope (shadowing any outer binding) unless a `global`/`nonlocal`
    /// view already redirects it.
    fn visit_target(&mut self, target: &Expr<'_>) {
        match target {
            Expr::Name(name) => {
                // declare() resolves to an existing compatible entry,
                // creates a fresh one, or reports an incompatible
                // redeclaration while keeping the first entry.
                if let Some(id) = self.declare(name.id, DeclKind::Var, Type::Unknown, name.span) {
                    self.symbols.record_resolution(name.span, id);
                }
            }
            Expr::Tuple(t) => {
                for elt in t.elts {
                    self.visit_target(elt);
                }
            }
            Expr::List(l) => {
                for elt in l.elts {
                    self.visit_target(elt);
                }
            }
            other => self.visit_expr(other),
        }
    }

    fn visit_expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Constant(_) => {}
            Expr::Name(name) => match self.symbols.lookup(name.id) {
                Lookup::Found(id) | Lookup::Captured(id) => {
                    self.symbols.record_resolution(name.span, id);
                    self.check_use_before_declaration(name, id);
                }
                Lookup::NotFound => {
                    self.errors.push(Error::new(
                        ErrorKind::UndefinedName {
                            name: name.id.to_string(),
                        },
                        name.span,
                    ));
                }
            },
            Expr::BinOp(e) => {
                self.visit_expr(e.left);
                self.visit_expr(e.right);
            }
            Expr::UnaryOp(e) => self.visit_expr(e.operand),
            Expr::BoolOp(e) => {
                for value in e.values {
                    self.visit_expr(value);
                }
            }
            Expr::Compare(e) => {
                self.visit_expr(e.left);
                for comparator in e.comparators {
                    self.visit_expr(comparator);
                }
            }
            Expr::Call(e) => {
                self.visit_expr(e.func);
                for arg in e.args {
                    self.visit_expr(arg);
                }
                for keyword in e.keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            Expr::Attribute(e) => self.visit_expr(e.value),
            Expr::Subscript(e) => {
                self.visit_expr(e.value);
                self.visit_expr(e.slice);
            }
            Expr::Slice(e) => {
                if let Some(lower) = e.lower {
                    self.visit_expr(lower);
                }
                if let Some(upper) = e.upper {
                    self.visit_expr(upper);
                }
                if let Some(step) = e.step {
                    self.visit_expr(step);
                }
            }
            Expr::List(e) => {
                for elt in e.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Tuple(e) => {
                for elt in e.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Set(e) => {
                for elt in e.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Dict(e) => {
                for key in e.keys {
                    self.visit_expr(key);
                }
                for value in e.values {
                    self.visit_expr(value);
                }
            }
            Expr::IfExp(e) => {
                self.visit_expr(e.test);
                self.visit_expr(e.body);
                self.visit_expr(e.orelse);
            }
            // Lambdas and comprehensions were desugared by pass 2;
            // recurse defensively if one slips through.
            Expr::Lambda(e) => self.visit_expr(e.body),
            Expr::ListComp(e) | Expr::SetComp(e) | Expr::GeneratorExp(e) => {
                self.visit_expr(e.elt);
            }
            Expr::DictComp(e) => {
                self.visit_expr(e.key);
                self.visit_expr(e.value);
            }
        }
    }

    /// A read of a block-scoped variable before its declaration line is
    /// suspicious but not fatal.
    fn check_use_before_declaration(&mut self, name: &NameExpr<'_>, id: EntryId) {
        // Hoisted lambda and comprehension bodies keep their original
        // source spans, so textual position says nothing about
        // statement order inside them.
        let scope = self.symbols.scope(self.symbols.current_scope());
        if scope.name.starts_with("__cy") {
            return;
        }
        let entry = self.symbols.entry(id);
        if entry.is_inner_view() || !entry.flags.is_local {
            return;
        }
        if entry.scope == self.symbols.current_scope()
            && name.span.start() < entry.span.start()
        {
            self.errors.push(
                Error::new(
                    ErrorKind::UseBeforeDeclaration {
                        name: name.id.to_string(),
                    },
                    name.span,
                )
                .with_related(entry.span, format!("'{}' is declared here", name.id)),
            );
        }
    }
}

fn annotation_type(annotation: &Expr<'_>) -> Type {
    match annotation {
        Expr::Name(name) => Type::from_annotation(name.id),
        Expr::Constant(c) if c.kind == crate::ast::ConstantKind::None => Type::None,
        _ => Type::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::semantic::passes::declarations::Declarations;

    fn resolve(source: &str) -> (SymbolTable, Vec<Error>) {
        let arena = Arena::new();
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, &arena);
        let module = parser.parse_module().expect("parse failed");
        let mut errors = Vec::new();
        let module = Declarations::new(&arena, &mut errors).run(module);
        let mut symbols = SymbolTable::new();
        NameResolution::new(&mut symbols, &mut errors).run(module);
        (symbols, errors)
    }

    #[test]
    fn undefined_name_is_reported() {
        let (_, errors) = resolve("x = missing + 1\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::UndefinedName { .. })));
    }

    #[test]
    fn undefined_name_message_names_the_identifier() {
        let (_, errors) = resolve("x = missing + 1\n");
        let err = errors
            .iter()
            .find(|e| matches!(e.kind, ErrorKind::UndefinedName { .. }))
            .expect("undefined name error");
        assert!(err.kind.format_message().contains("'missing'"));
    }

    #[test]
    fn comprehension_element_order_does_not_warn() {
        // The hoisted body keeps source spans, where the element
        // expression precedes the loop target.
        let (_, errors) = resolve("xs = [1, 2]\nsquares = [i * i for i in xs]\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn builtins_resolve_without_declaration() {
        let (_, errors) = resolve("print(len(range(3)))\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn assignment_declares_then_read_resolves() {
        let (_, errors) = resolve("x = 1\ny = x + 1\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn nested_read_marks_capture() {
        let (symbols, errors) = resolve("def f():\n    x = 1\n    def g():\n        return x\n");
        assert!(errors.is_empty(), "{errors:?}");
        let captured = (0..symbols.scope_count())
            .any(|id| !symbols.scope(id).captured.is_empty());
        assert!(captured);
    }

    #[test]
    fn use_before_declaration_warns() {
        let (_, errors) = resolve("def f():\n    y = x\n    x = 1\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::UseBeforeDeclaration { .. })));
    }

    #[test]
    fn incompatible_redeclaration_warns_once() {
        let (_, errors) = resolve("class C:\n    pass\nC = 3\n");
        let count = errors
            .iter()
            .filter(|e| matches!(e.kind, ErrorKind::IncompatibleRedeclaration { .. }))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn decorator_reassignment_is_compatible() {
        let (_, errors) = resolve("def trace(f):\n    return f\n@trace\ndef g():\n    pass\n");
        assert!(errors.is_empty(), "{errors:?}");
    }
}
