//! Pass 5: expression and type analysis.
//!
//! Infers static types bottom-up, seeding from annotations collected
//! during declaration analysis. The whole module is re-visited until
//! no entry type changes, so forward references between functions
//! settle to a fixed point.

use crate::ast::*;
use crate::error::{Error, ErrorKind};
use crate::semantic::symbol::{EntryId, ScopeId, SymbolTable};
use crate::semantic::types::Type;
use std::collections::{HashMap, HashSet};
use text_size::TextRange;

const MAX_ITERATIONS: usize = 10;

pub struct TypeInference<'s, 'e> {
    symbols: &'s mut SymbolTable,
    errors: &'e mut Vec<Error>,
    /// Return type per function scope.
    returns: HashMap<ScopeId, Type>,
    /// Defining function entry to its scope.
    func_scopes: HashMap<EntryId, ScopeId>,
    function_stack: Vec<ScopeId>,
    changed: bool,
    /// Spans already diagnosed, so iteration does not duplicate reports.
    reported: HashSet<TextRange>,
}

impl<'s, 'e> TypeInference<'s, 'e> {
    pub fn new(symbols: &'s mut SymbolTable, errors: &'e mut Vec<Error>) -> Self {
        TypeInference {
            symbols,
            errors,
            returns: HashMap::new(),
            func_scopes: HashMap::new(),
            function_stack: Vec::new(),
            changed: false,
            reported: HashSet::new(),
        }
    }

    pub fn run(&mut self, module: &Module<'_>) {
        for _ in 0..MAX_ITERATIONS {
            self.changed = false;
            self.visit_body(module.body);
            if !self.changed {
                break;
            }
        }
    }

    fn report(&mut self, kind: ErrorKind, span: TextRange) {
        if self.reported.insert(span) {
            self.errors.push(Error::new(kind, span));
        }
    }

    fn visit_body(&mut self, body: &[Stmt<'_>]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expr(s) => {
                self.infer_expr(&s.value);
            }
            Stmt::Assign(s) => {
                let value_type = self.infer_expr(&s.value);
                for target in s.targets {
                    self.assign_type(target, &value_type);
                }
            }
            Stmt::AnnAssign(_) => {}
            Stmt::AugAssign(s) => {
                let value_type = self.infer_expr(&s.value);
                let target_type = self.infer_expr(&s.target);
                let result = self.binop_type(s.op, &target_type, &value_type, s.span);
                self.assign_type(&s.target, &result);
            }
            Stmt::Return(s) => {
                let ty = s
                    .value
                    .as_ref()
                    .map(|v| self.infer_expr(v))
                    .unwrap_or(Type::None);
                if let Some(&scope) = self.function_stack.last() {
                    let current = self.returns.get(&scope).cloned().unwrap_or(Type::Unknown);
                    let unified = current.unify(&ty);
                    if unified != current {
                        self.changed = true;
                        self.returns.insert(scope, unified);
                    }
                }
            }
            Stmt::If(s) => {
                self.infer_expr(&s.test);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::While(s) => {
                self.infer_expr(&s.test);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::For(s) => {
                let iter_type = self.infer_expr(&s.iter);
                let element = element_type(&iter_type, &s.iter);
                self.assign_type(&s.target, &element);
                self.visit_body(s.body);
                self.visit_body(s.orelse);
            }
            Stmt::FuncDef(s) => self.visit_func_def(s),
            Stmt::ClassDef(s) => {
                if let Some(scope) = self.symbols.find_class_scope(s.name) {
                    self.symbols.push_scope(scope);
                    self.visit_body(s.body);
                    self.symbols.exit_scope();
                }
            }
            Stmt::Raise(s) => {
                if let Some(exc) = &s.exc {
                    self.infer_expr(exc);
                }
            }
            Stmt::Try(s) => {
                self.visit_body(s.body);
                for handler in s.handlers {
                    self.visit_body(handler.body);
                }
                self.visit_body(s.orelse);
                self.visit_body(s.finalbody);
            }
            Stmt::With(s) => {
                for item in s.items {
                    self.infer_expr(&item.context);
                }
                self.visit_body(s.body);
            }
            Stmt::Pass(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Global(_)
            | Stmt::Nonlocal(_) => {}
        }
    }

    fn visit_func_def(&mut self, s: &FuncDefStmt<'_>) {
        let entry = self.symbols.lookup_local(s.name);
        let scope = match self.symbols.find_nested_function(s.name) {
            Some(scope) => scope,
            None => return,
        };
        if let Some(entry) = entry {
            let defining = self.symbols.resolve_defining(entry);
            self.func_scopes.insert(defining, scope);
        }
        // Declared return annotation seeds the return type.
        if let Some(annotation) = s.returns {
            if let Expr::Name(name) = annotation {
                self.returns
                    .entry(scope)
                    .or_insert_with(|| Type::from_annotation(name.id));
            }
        }

        self.symbols.push_scope(scope);
        self.function_stack.push(scope);
        self.visit_body(s.body);
        self.function_stack.pop();
        self.symbols.exit_scope();
    }

    /// Propagate a value type into an assignment target.
    fn assign_type(&mut self, target: &Expr<'_>, value_type: &Type) {
        match target {
            Expr::Name(name) => {
                // Synthesized names share the span of the construct
                // they were desugared from, so the span-keyed
                // resolution map is not reliable for them.
                if name.id.starts_with("__cy") {
                    return;
                }
                let Some(id) = self.symbols.resolution(name.span) else {
                    return;
                };
                let current = self.symbols.entry_type(id).clone();
                let unified = current.unify(value_type);
                if current.is_known() && value_type.is_known() && unified == Type::Object
                    && current != Type::Object
                {
                    self.report(
                        ErrorKind::TypeMismatch {
                            expected: current.to_string(),
                            found: value_type.to_string(),
                        },
                        name.span,
                    );
                    return;
                }
                if unified != current {
                    self.changed = true;
                    self.symbols.set_entry_type(id, unified);
                }
            }
            Expr::Tuple(t) => {
                for elt in t.elts {
                    self.assign_type(elt, &Type::Unknown);
                }
            }
            Expr::List(l) => {
                for elt in l.elts {
                    self.assign_type(elt, &Type::Unknown);
                }
            }
            _ => {}
        }
    }

    fn infer_expr(&mut self, expr: &Expr<'_>) -> Type {
        match expr {
            Expr::Constant(c) => match c.kind {
                ConstantKind::Int => Type::Int,
                ConstantKind::Float => Type::Float,
                ConstantKind::Str => Type::Str,
                ConstantKind::Bool => Type::Bool,
                ConstantKind::None => Type::None,
            },
            Expr::Name(name) => {
                if name.id.starts_with("__cy") {
                    return Type::Unknown;
                }
                self.symbols
                    .resolution(name.span)
                    .map(|id| self.symbols.entry_type(id).clone())
                    .unwrap_or(Type::Unknown)
            }
            Expr::BinOp(e) => {
                let left = self.infer_expr(e.left);
                let right = self.infer_expr(e.right);
                self.binop_type(e.op, &left, &right, e.span)
            }
            Expr::UnaryOp(e) => {
                let operand = self.infer_expr(e.operand);
                match e.op {
                    "not" => Type::Bool,
                    "~" => Type::Int,
                    _ => {
                        if operand.is_numeric() {
                            operand
                        } else {
                            Type::Unknown
                        }
                    }
                }
            }
            Expr::BoolOp(e) => {
                let mut ty = Type::Unknown;
                for value in e.values {
                    let vt = self.infer_expr(value);
                    ty = ty.unify(&vt);
                }
                ty
            }
            Expr::Compare(e) => {
                self.infer_expr(e.left);
                for comparator in e.comparators {
                    self.infer_expr(comparator);
                }
                Type::Bool
            }
            Expr::Call(e) => self.infer_call(e),
            Expr::Attribute(e) => {
                self.infer_expr(e.value);
                Type::Unknown
            }
            Expr::Subscript(e) => {
                let value = self.infer_expr(e.value);
                self.infer_expr(e.slice);
                match value {
                    Type::Str => Type::Str,
                    _ => Type::Unknown,
                }
            }
            Expr::Slice(e) => {
                if let Some(lower) = e.lower {
                    self.infer_expr(lower);
                }
                if let Some(upper) = e.upper {
                    self.infer_expr(upper);
                }
                if let Some(step) = e.step {
                    self.infer_expr(step);
                }
                Type::Unknown
            }
            Expr::List(e) => {
                for elt in e.elts {
                    self.infer_expr(elt);
                }
                Type::List
            }
            Expr::Tuple(e) => {
                for elt in e.elts {
                    self.infer_expr(elt);
                }
                Type::Tuple
            }
            Expr::Set(e) => {
                for elt in e.elts {
                    self.infer_expr(elt);
                }
                Type::Set
            }
            Expr::Dict(e) => {
                for key in e.keys {
                    self.infer_expr(key);
                }
                for value in e.values {
                    self.infer_expr(value);
                }
                Type::Dict
            }
            Expr::IfExp(e) => {
                self.infer_expr(e.test);
                let body = self.infer_expr(e.body);
                let orelse = self.infer_expr(e.orelse);
                body.unify(&orelse)
            }
            Expr::Lambda(_)
            | Expr::ListComp(_)
            | Expr::SetComp(_)
            | Expr::GeneratorExp(_)
            | Expr::DictComp(_) => Type::Unknown,
        }
    }

    fn infer_call(&mut self, call: &CallExpr<'_>) -> Type {
        for arg in call.args {
            self.infer_expr(arg);
        }
        for keyword in call.keywords {
            self.infer_expr(&keyword.value);
        }

        let Expr::Name(name) = call.func else {
            self.infer_expr(call.func);
            return Type::Unknown;
        };
        if name.id.starts_with("__cy") {
            return Type::Unknown;
        }
        let Some(id) = self.symbols.resolution(name.span) else {
            return Type::Unknown;
        };
        let defining = self.symbols.resolve_defining(id);
        let entry = self.symbols.entry(defining);

        if entry.flags.is_type {
            return Type::Instance(entry.name.clone());
        }
        if entry.flags.is_function {
            if let Some(ty) = builtin_return_type(&entry.name, &entry.cname) {
                return ty;
            }
            return self
                .func_scopes
                .get(&defining)
                .and_then(|scope| self.returns.get(scope))
                .cloned()
                .unwrap_or(Type::Unknown);
        }

        let ty = self.symbols.entry_type(defining).clone();
        if ty.is_known() && !matches!(ty, Type::Function | Type::Class(_) | Type::Object) {
            self.report(ErrorKind::NotCallable { found: ty.to_string() }, call.span);
        }
        Type::Unknown
    }

    fn binop_type(&mut self, op: &str, left: &Type, right: &Type, span: TextRange) -> Type {
        if !left.is_known() || !right.is_known() {
            return Type::Unknown;
        }
        match op {
            "/" if left.is_numeric() && right.is_numeric() => Type::Float,
            "//" | "%" | "<<" | ">>" | "&" | "|" | "^"
                if left.is_numeric() && right.is_numeric() =>
            {
                Type::Int
            }
            "**" if left.is_numeric() && right.is_numeric() => {
                if *left == Type::Float || *right == Type::Float {
                    Type::Float
                } else {
                    Type::Int
                }
            }
            "+" if *left == Type::Str && *right == Type::Str => Type::Str,
            "+" if *left == Type::List && *right == Type::List => Type::List,
            "*" if *left == Type::Str && *right == Type::Int => Type::Str,
            "*" if *left == Type::List && *right == Type::Int => Type::List,
            "+" | "-" | "*" if left.is_numeric() && right.is_numeric() => left.unify(right),
            _ => {
                if left.is_numeric() && right.is_numeric() {
                    left.unify(right)
                } else if *left == Type::Object || *right == Type::Object {
                    Type::Object
                } else {
                    self.report(
                        ErrorKind::TypeMismatch {
                            expected: left.to_string(),
                            found: right.to_string(),
                        },
                        span,
                    );
                    Type::Object
                }
            }
        }
    }
}

/// Element type seen by a `for` target.
fn element_type(iter_type: &Type, iter: &Expr<'_>) -> Type {
    if let Expr::Call(call) = iter {
        if let Expr::Name(name) = call.func {
            if name.id == "range" {
                return Type::Int;
            }
        }
    }
    match iter_type {
        Type::Str => Type::Str,
        _ => Type::Unknown,
    }
}

/// Fixed return types of the seeded builtins.
fn builtin_return_type(name: &str, cname: &str) -> Option<Type> {
    if !cname.starts_with("cyB_") {
        return None;
    }
    Some(match name {
        "len" | "int" | "abs" => Type::Int,
        "float" => Type::Float,
        "bool" => Type::Bool,
        "str" => Type::Str,
        "range" | "list" => Type::List,
        "tuple" => Type::Tuple,
        "set" => Type::Set,
        "dict" => Type::Dict,
        "print" => Type::None,
        _ => Type::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::semantic::passes::declarations::Declarations;
    use crate::semantic::passes::name_resolution::NameResolution;

    fn infer(source: &str) -> (SymbolTable, Vec<Error>) {
        let arena = Arena::new();
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, &arena);
        let module = parser.parse_module().expect("parse failed");
        let mut errors = Vec::new();
        let module = Declarations::new(&arena, &mut errors).run(module);
        let mut symbols = SymbolTable::new();
        NameResolution::new(&mut symbols, &mut errors).run(module);
        symbols.close_all_scopes();
        TypeInference::new(&mut symbols, &mut errors).run(module);
        (symbols, errors)
    }

    fn type_of(symbols: &SymbolTable, name: &str) -> Type {
        for id in 0..symbols.scope_count() {
            if let Some(&entry) = symbols.scope(id).entries.get(name) {
                return symbols.entry_type(entry).clone();
            }
        }
        panic!("no entry named {name}");
    }

    #[test]
    fn literals_drive_inference() {
        let (symbols, errors) = infer("x = 1\ny = 1.5\nz = 'hi'\nw = x + y\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "x"), Type::Int);
        assert_eq!(type_of(&symbols, "y"), Type::Float);
        assert_eq!(type_of(&symbols, "z"), Type::Str);
        assert_eq!(type_of(&symbols, "w"), Type::Float);
    }

    #[test]
    fn true_division_yields_float() {
        let (symbols, errors) = infer("q = 6 / 3\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "q"), Type::Float);
    }

    #[test]
    fn annotation_conflict_is_reported_once() {
        let (_, errors) = infer("x: int = 1\nx = 'no'\nx = 'again'\n");
        let count = errors
            .iter()
            .filter(|e| matches!(e.kind, ErrorKind::TypeMismatch { .. }))
            .count();
        assert!(count >= 1);
    }

    #[test]
    fn function_return_type_propagates_to_call_site() {
        let (symbols, errors) = infer("def one() -> int:\n    return 1\nn = one()\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "n"), Type::Int);
    }

    #[test]
    fn inferred_return_type_reaches_forward_callers() {
        let (symbols, errors) = infer("def caller():\n    return callee()\ndef callee():\n    return 1\nm = callee()\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "m"), Type::Int);
    }

    #[test]
    fn range_loop_variable_is_int() {
        let (symbols, errors) = infer("total = 0\nfor i in range(10):\n    total = total + i\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "i"), Type::Int);
        assert_eq!(type_of(&symbols, "total"), Type::Int);
    }

    #[test]
    fn comprehension_desugaring_is_not_a_type_error() {
        let (_, errors) = infer("xs = [1, 2, 3]\nsquares = [i * i for i in xs]\n");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn calling_a_plain_value_is_reported() {
        let (_, errors) = infer("x = 1\ny = x()\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::NotCallable { .. })));
    }

    #[test]
    fn class_call_yields_instance() {
        let (symbols, errors) = infer("class Point:\n    pass\np = Point()\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&symbols, "p"), Type::Instance("Point".to_string()));
    }
}
