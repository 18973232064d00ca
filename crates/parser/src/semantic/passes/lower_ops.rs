//! Pass 6: lowering to primitive operations.
//!
//! Parallel and chained assignments flatten into single assignments
//! evaluated right-hand-side first, with single-evaluation temporaries
//! standing in for every materialized value. Compound assignment with
//! side-effecting sub-targets becomes an explicit read/compute/store
//! sequence, and `with` statements become acquire/try/release-in-
//! finally constructs.

use super::rewrite::{walk_expr, walk_stmt, Rewriter, StmtList};
use crate::arena::Arena;
use crate::ast::*;
use crate::semantic::symbol::SymbolTable;
use crate::semantic::types::Type;
use text_size::TextRange;

pub struct LowerOps<'a, 's> {
    arena: &'a Arena,
    symbols: &'s mut SymbolTable,
}

impl<'a, 's> LowerOps<'a, 's> {
    pub fn new(arena: &'a Arena, symbols: &'s mut SymbolTable) -> Self {
        LowerOps { arena, symbols }
    }

    pub fn run(&mut self, module: &Module<'a>) -> &'a Module<'a> {
        let body = self.rewrite_body(module.body);
        self.arena.alloc(Module {
            body,
            span: module.span,
        })
    }

    /// Synthesize a temporary in the current scope and bind `value` to
    /// it; returns the reference expression.
    fn bind_temp(&mut self, value: Expr<'a>, out: &mut StmtList<'a>) -> Expr<'a> {
        let span = value.span();
        let name = self.symbols.fresh_name("tmp");
        let name = self.arena.alloc_str(&name);
        self.symbols.declare_temp(name, Type::Unknown, span);

        let reference = Expr::Name(NameExpr { id: name, span });
        out.push(Stmt::Assign(AssignStmt {
            targets: self.arena.alloc_slice_vec(vec![reference.clone()]),
            value,
            span,
        }));
        reference
    }

    /// Materialize `value` unless re-evaluating it is observably free.
    fn single_eval(&mut self, value: Expr<'a>, out: &mut StmtList<'a>) -> Expr<'a> {
        if matches!(value, Expr::Constant(_)) {
            value
        } else {
            self.bind_temp(value, out)
        }
    }

    fn lower_assign(&mut self, s: &AssignStmt<'a>) -> StmtList<'a> {
        let mut out = StmtList::new();
        let value = self.rewrite_expr(&s.value);
        let targets: Vec<Expr<'a>> = s.targets.iter().map(|t| self.rewrite_expr(t)).collect();

        if targets.len() == 1 {
            let target = targets.into_iter().next().unwrap();
            self.emit_store(target, value, s.span, &mut out);
            return out;
        }

        // Chained assignment: evaluate the right-hand side once.
        let shared = self.single_eval(value, &mut out);
        for target in targets {
            self.emit_store(target, shared.clone(), s.span, &mut out);
        }
        out
    }

    /// Emit the store(s) for one target; tuple and list targets unpack
    /// right-hand-side first.
    fn emit_store(
        &mut self,
        target: Expr<'a>,
        value: Expr<'a>,
        span: TextRange,
        out: &mut StmtList<'a>,
    ) {
        let elts: &[Expr<'a>] = match &target {
            Expr::Tuple(t) => t.elts,
            Expr::List(l) => l.elts,
            _ => {
                out.push(Stmt::Assign(AssignStmt {
                    targets: self.arena.alloc_slice_vec(vec![target]),
                    value,
                    span,
                }));
                return;
            }
        };

        match value {
            // Parallel form with matching arity: every right-hand value
            // is computed before the first store, each exactly once.
            Expr::Tuple(v) if v.elts.len() == elts.len() => {
                let temps: Vec<Expr<'a>> = v
                    .elts
                    .iter()
                    .map(|elt| self.single_eval(elt.clone(), out))
                    .collect();
                for (target, temp) in elts.iter().zip(temps) {
                    self.emit_store(target.clone(), temp, span, out);
                }
            }
            // Otherwise unpack a single sequence value by index.
            other => {
                let seq = self.single_eval(other, out);
                for (index, target) in elts.iter().enumerate() {
                    let index_text = self.arena.alloc_str(&index.to_string());
                    let slot = Expr::Subscript(SubscriptExpr {
                        value: self.arena.alloc(seq.clone()),
                        slice: self.arena.alloc(Expr::Constant(ConstantExpr {
                            value: index_text,
                            kind: ConstantKind::Int,
                            span,
                        })),
                        span,
                    });
                    self.emit_store(target.clone(), slot, span, out);
                }
            }
        }
    }

    /// `x op= v` becomes read/compute/store with any side-effecting
    /// sub-target evaluated exactly once.
    fn lower_aug_assign(&mut self, s: &AugAssignStmt<'a>) -> StmtList<'a> {
        let mut out = StmtList::new();
        let value = self.rewrite_expr(&s.value);
        let target = self.rewrite_expr(&s.target);

        let stable_target = match target {
            Expr::Subscript(sub) => {
                let base = self.stabilize(sub.value.clone(), &mut out);
                let index = self.stabilize(sub.slice.clone(), &mut out);
                Expr::Subscript(SubscriptExpr {
                    value: self.arena.alloc(base),
                    slice: self.arena.alloc(index),
                    span: sub.span,
                })
            }
            Expr::Attribute(attr) => {
                let base = self.stabilize(attr.value.clone(), &mut out);
                Expr::Attribute(AttributeExpr {
                    value: self.arena.alloc(base),
                    attr: attr.attr,
                    span: attr.span,
                })
            }
            other => other,
        };

        let computed = Expr::BinOp(BinOpExpr {
            left: self.arena.alloc(stable_target.clone()),
            op: s.op,
            right: self.arena.alloc(value),
            span: s.span,
        });
        out.push(Stmt::Assign(AssignStmt {
            targets: self.arena.alloc_slice_vec(vec![stable_target]),
            value: computed,
            span: s.span,
        }));
        out
    }

    /// Bind a sub-expression to a temporary when re-evaluating it could
    /// repeat an effect.
    fn stabilize(&mut self, expr: Expr<'a>, out: &mut StmtList<'a>) -> Expr<'a> {
        if has_effects(&expr) {
            self.bind_temp(expr, out)
        } else {
            expr
        }
    }

    /// `with ctx as v: body` becomes
    /// acquire / bind / try body finally release; items nest inward.
    fn lower_with(&mut self, s: &WithStmt<'a>) -> StmtList<'a> {
        let mut inner: Vec<Stmt<'a>> = self.rewrite_body(s.body).to_vec();

        for item in s.items.iter().rev() {
            let mut prefix = StmtList::new();
            let context = self.rewrite_expr(&item.context);
            let span = context.span();
            let manager = self.bind_temp(context, &mut prefix);

            let enter_call = Expr::Call(CallExpr {
                func: self.arena.alloc(Expr::Attribute(AttributeExpr {
                    value: self.arena.alloc(manager.clone()),
                    attr: "__enter__",
                    span,
                })),
                args: &[],
                keywords: &[],
                span,
            });
            prefix.push(match &item.target {
                Some(target) => Stmt::Assign(AssignStmt {
                    targets: self.arena.alloc_slice_vec(vec![self.rewrite_expr(target)]),
                    value: enter_call,
                    span,
                }),
                None => Stmt::Expr(ExprStmt {
                    value: enter_call,
                    span,
                }),
            });

            let exit_call = Expr::Call(CallExpr {
                func: self.arena.alloc(Expr::Attribute(AttributeExpr {
                    value: self.arena.alloc(manager),
                    attr: "__exit__",
                    span,
                })),
                args: &[],
                keywords: &[],
                span,
            });
            prefix.push(Stmt::Try(TryStmt {
                body: self.arena.alloc_slice_vec(inner),
                handlers: &[],
                orelse: &[],
                finalbody: self.arena.alloc_slice_vec(vec![Stmt::Expr(ExprStmt {
                    value: exit_call,
                    span,
                })]),
                span: s.span,
            }));
            inner = prefix.into_vec();
        }

        StmtList::from_vec(inner)
    }
}

/// Whether evaluating `expr` twice could repeat an observable effect.
fn has_effects(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Constant(_) | Expr::Name(_) => false,
        Expr::Call(_) => true,
        Expr::BinOp(e) => has_effects(e.left) || has_effects(e.right),
        Expr::UnaryOp(e) => has_effects(e.operand),
        Expr::BoolOp(e) => e.values.iter().any(has_effects),
        Expr::Compare(e) => has_effects(e.left) || e.comparators.iter().any(has_effects),
        Expr::Attribute(e) => has_effects(e.value),
        Expr::Subscript(e) => has_effects(e.value) || has_effects(e.slice),
        Expr::Slice(e) => {
            e.lower.map(has_effects).unwrap_or(false)
                || e.upper.map(has_effects).unwrap_or(false)
                || e.step.map(has_effects).unwrap_or(false)
        }
        Expr::List(e) => e.elts.iter().any(has_effects),
        Expr::Tuple(e) => e.elts.iter().any(has_effects),
        Expr::Set(e) => e.elts.iter().any(has_effects),
        Expr::Dict(e) => e.keys.iter().any(has_effects) || e.values.iter().any(has_effects),
        Expr::IfExp(e) => has_effects(e.test) || has_effects(e.body) || has_effects(e.orelse),
        Expr::Lambda(_)
        | Expr::ListComp(_)
        | Expr::SetComp(_)
        | Expr::GeneratorExp(_)
        | Expr::DictComp(_) => true,
    }
}

impl<'a, 's> Rewriter<'a> for LowerOps<'a, 's> {
    fn arena(&self) -> &'a Arena {
        self.arena
    }

    fn rewrite_stmt(&mut self, stmt: &Stmt<'a>) -> StmtList<'a> {
        match stmt {
            Stmt::Assign(s) => self.lower_assign(s),
            Stmt::AugAssign(s) => self.lower_aug_assign(s),
            Stmt::With(s) => self.lower_with(s),
            Stmt::FuncDef(s) => {
                let scope = self.symbols.find_nested_function(s.name);
                if let Some(scope) = scope {
                    self.symbols.push_scope(scope);
                }
                let result = walk_stmt(self, stmt);
                if scope.is_some() {
                    self.symbols.exit_scope();
                }
                result
            }
            Stmt::ClassDef(s) => {
                let scope = self.symbols.find_class_scope(s.name);
                if let Some(scope) = scope {
                    self.symbols.push_scope(scope);
                }
                let result = walk_stmt(self, stmt);
                if scope.is_some() {
                    self.symbols.exit_scope();
                }
                result
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn rewrite_expr(&mut self, expr: &Expr<'a>) -> Expr<'a> {
        walk_expr(self, expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::module_to_source;
    use crate::error::Error;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::semantic::passes::declarations::Declarations;
    use crate::semantic::passes::name_resolution::NameResolution;

    fn lowered(source: &str) -> String {
        let arena = Arena::new();
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, &arena);
        let module = parser.parse_module().expect("parse failed");
        let mut errors: Vec<Error> = Vec::new();
        let module = Declarations::new(&arena, &mut errors).run(module);
        let mut symbols = SymbolTable::new();
        NameResolution::new(&mut symbols, &mut errors).run(module);
        symbols.close_all_scopes();
        let module = LowerOps::new(&arena, &mut symbols).run(module);
        module_to_source(module)
    }

    #[test]
    fn swap_evaluates_right_side_first() {
        let rendered = lowered("a = 1\nb = 2\na, b = b, a\n");
        let lines: Vec<&str> = rendered.lines().collect();
        // Two materializations, then two stores reading the temps.
        assert_eq!(lines[2], "__cytmp0 = b");
        assert_eq!(lines[3], "__cytmp1 = a");
        assert_eq!(lines[4], "a = __cytmp0");
        assert_eq!(lines[5], "b = __cytmp1");
    }

    #[test]
    fn constant_values_skip_temporaries() {
        let rendered = lowered("a = [0]\nb = [0]\na[0], b[0] = 1, 2\n");
        assert!(rendered.contains("a[0] = 1"));
        assert!(rendered.contains("b[0] = 2"));
        assert!(!rendered.contains("__cytmp"));
    }

    #[test]
    fn chained_assignment_shares_one_evaluation() {
        let rendered = lowered("def f():\n    return 1\na = b = f()\n");
        assert!(rendered.contains("__cytmp0 = f()"));
        assert!(rendered.contains("a = __cytmp0"));
        assert!(rendered.contains("b = __cytmp0"));
        // f() appears exactly once in the lowered output.
        assert_eq!(rendered.matches("f()").count(), 1);
    }

    #[test]
    fn non_tuple_unpack_indexes_a_shared_temp() {
        let rendered = lowered("def pair():\n    return (1, 2)\na, b = pair()\n");
        assert!(rendered.contains("__cytmp0 = pair()"));
        assert!(rendered.contains("a = __cytmp0[0]"));
        assert!(rendered.contains("b = __cytmp0[1]"));
    }

    #[test]
    fn aug_assign_with_effectful_index_calls_once() {
        let rendered = lowered("def f():\n    return 0\na = [0]\na[f()] += 1\n");
        assert_eq!(rendered.matches("f()").count(), 1);
        assert!(rendered.contains("__cytmp0 = f()"));
        assert!(rendered.contains("a[__cytmp0] = (a[__cytmp0] + 1)"));
    }

    #[test]
    fn plain_aug_assign_becomes_read_compute_store() {
        let rendered = lowered("x = 1\nx += 2\n");
        assert!(rendered.contains("x = (x + 2)"));
    }

    #[test]
    fn with_statement_releases_in_finally() {
        let rendered = lowered("def open_file():\n    return 0\nwith open_file() as f:\n    x = 1\n");
        assert!(rendered.contains("__cytmp0 = open_file()"));
        assert!(rendered.contains("f = __cytmp0.__enter__()"));
        assert!(rendered.contains("finally:"));
        assert!(rendered.contains("__cytmp0.__exit__()"));
    }
}
