//! Pass 2: declaration interpretation.
//!
//! Splits combined declare+initialize statements into a pure
//! declaration plus a plain assignment, expands decorator syntax into
//! explicit call-and-reassign statements, and desugars lambdas and
//! comprehensions into synthesized named functions hoisted before the
//! statement that used them.

use super::rewrite::{rewrite_params, walk_expr, walk_stmt, Rewriter, StmtList};
use crate::arena::Arena;
use crate::ast::*;
use crate::error::{Error, ErrorKind};
use smallvec::smallvec;
use text_size::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Module,
    Function,
    Class,
}

pub struct Declarations<'a, 'e> {
    arena: &'a Arena,
    errors: &'e mut Vec<Error>,
    counter: usize,
    /// Synthesized functions waiting to be spliced in before the
    /// statement currently being rewritten.
    hoisted: Vec<Stmt<'a>>,
    ctx: Vec<Ctx>,
}

impl<'a, 'e> Declarations<'a, 'e> {
    pub fn new(arena: &'a Arena, errors: &'e mut Vec<Error>) -> Self {
        Declarations {
            arena,
            errors,
            counter: 0,
            hoisted: Vec::new(),
            ctx: vec![Ctx::Module],
        }
    }

    pub fn run(&mut self, module: &Module<'a>) -> &'a Module<'a> {
        let body = self.rewrite_body(module.body);
        self.arena.alloc(Module {
            body,
            span: module.span,
        })
    }

    fn fresh(&mut self, tag: &str) -> &'a str {
        let n = self.counter;
        self.counter += 1;
        self.arena.alloc_str(&format!("__cy{tag}{n}"))
    }

    fn in_class_under_function(&self) -> bool {
        *self.ctx.last().unwrap() == Ctx::Class && self.ctx.contains(&Ctx::Function)
    }

    fn name(&self, id: &'a str, span: TextRange) -> Expr<'a> {
        Expr::Name(NameExpr { id, span })
    }

    /// `f = dec(f)` reassignments, innermost decorator applied first.
    fn expand_decorators(
        &mut self,
        name: &'a str,
        decorators: &'a [Expr<'a>],
        span: TextRange,
        out: &mut StmtList<'a>,
    ) {
        for decorator in decorators.iter().rev() {
            let call = Expr::Call(CallExpr {
                func: self.arena.alloc(decorator.clone()),
                args: self.arena.alloc_slice_vec(vec![self.name(name, span)]),
                keywords: &[],
                span,
            });
            out.push(Stmt::Assign(AssignStmt {
                targets: self.arena.alloc_slice_vec(vec![self.name(name, span)]),
                value: call,
                span,
            }));
        }
    }

    /// Desugar a lambda into a hoisted named function; the expression
    /// becomes a reference to the synthesized name.
    fn desugar_lambda(&mut self, lambda: &LambdaExpr<'a>) -> Expr<'a> {
        let body = self.rewrite_expr(lambda.body);
        let params = rewrite_params(self, lambda.params);
        let fname = self.fresh("lam");
        self.hoisted.push(Stmt::FuncDef(FuncDefStmt {
            name: fname,
            params,
            returns: None,
            body: self.arena.alloc_slice_vec(vec![Stmt::Return(ReturnStmt {
                value: Some(body),
                span: lambda.span,
            })]),
            decorators: &[],
            is_synthesized: true,
            span: lambda.span,
        }));
        self.name(fname, lambda.span)
    }

    /// Desugar a comprehension into a hoisted function that loops and
    /// accumulates, called with the outermost iterable. The iterator
    /// variables live only inside the synthesized function's scope.
    fn desugar_comprehension(
        &mut self,
        accumulate: AccumulateKind<'a>,
        generators: &[Comprehension<'a>],
        span: TextRange,
    ) -> Expr<'a> {
        let fname = self.fresh("comp");
        let arg = self.fresh("iter");
        let result = self.fresh("res");

        let init_value = match &accumulate {
            AccumulateKind::Method("add", _) => Expr::Set(SetExpr { elts: &[], span }),
            AccumulateKind::Method(..) => Expr::List(ListExpr { elts: &[], span }),
            AccumulateKind::KeyValue(..) => Expr::Dict(DictExpr {
                keys: &[],
                values: &[],
                span,
            }),
        };

        // Innermost statement: feed one element into the accumulator.
        let result_name = self.name(result, span);
        let mut inner: Stmt<'a> = match accumulate {
            AccumulateKind::Method(method, elt) => {
                let target = Expr::Attribute(AttributeExpr {
                    value: self.arena.alloc(result_name),
                    attr: method,
                    span,
                });
                Stmt::Expr(ExprStmt {
                    value: Expr::Call(CallExpr {
                        func: self.arena.alloc(target),
                        args: self.arena.alloc_slice_vec(vec![elt]),
                        keywords: &[],
                        span,
                    }),
                    span,
                })
            }
            AccumulateKind::KeyValue(key, value) => {
                let slot = Expr::Subscript(SubscriptExpr {
                    value: self.arena.alloc(result_name),
                    slice: self.arena.alloc(key),
                    span,
                });
                Stmt::Assign(AssignStmt {
                    targets: self.arena.alloc_slice_vec(vec![slot]),
                    value,
                    span,
                })
            }
        };

        // Wrap in condition and loop nests, innermost generator first.
        for (index, generator) in generators.iter().enumerate().rev() {
            for cond in generator.ifs.iter().rev() {
                inner = Stmt::If(IfStmt {
                    test: self.rewrite_expr(cond),
                    body: self.arena.alloc_slice_vec(vec![inner]),
                    orelse: &[],
                    span,
                });
            }
            let iter = if index == 0 {
                self.name(arg, span)
            } else {
                self.rewrite_expr(&generator.iter)
            };
            inner = Stmt::For(ForStmt {
                target: self.rewrite_expr(&generator.target),
                iter,
                body: self.arena.alloc_slice_vec(vec![inner]),
                orelse: &[],
                span,
            });
        }

        let body = vec![
            Stmt::Assign(AssignStmt {
                targets: self.arena.alloc_slice_vec(vec![self.name(result, span)]),
                value: init_value,
                span,
            }),
            inner,
            Stmt::Return(ReturnStmt {
                value: Some(self.name(result, span)),
                span,
            }),
        ];

        self.hoisted.push(Stmt::FuncDef(FuncDefStmt {
            name: fname,
            params: self.arena.alloc_slice_vec(vec![Param {
                name: arg,
                annotation: None,
                default: None,
                span,
            }]),
            returns: None,
            body: self.arena.alloc_slice_vec(body),
            decorators: &[],
            is_synthesized: true,
            span,
        }));

        let outer_iter = self.rewrite_expr(&generators[0].iter);
        Expr::Call(CallExpr {
            func: self.arena.alloc(self.name(fname, span)),
            args: self.arena.alloc_slice_vec(vec![outer_iter]),
            keywords: &[],
            span,
        })
    }
}

/// How a desugared comprehension accumulates elements.
enum AccumulateKind<'a> {
    /// `result.<method>(elt)`
    Method(&'static str, Expr<'a>),
    /// `result[key] = value`
    KeyValue(Expr<'a>, Expr<'a>),
}

impl<'a, 'e> Rewriter<'a> for Declarations<'a, 'e> {
    fn arena(&self) -> &'a Arena {
        self.arena
    }

    fn rewrite_stmt(&mut self, stmt: &Stmt<'a>) -> StmtList<'a> {
        match stmt {
            // `x: T = e` becomes a pure declaration plus an assignment.
            Stmt::AnnAssign(s) if s.value.is_some() => {
                if self.in_class_under_function() {
                    self.errors.push(Error::new(
                        ErrorKind::InitializerNotAllowed {
                            context: "a class body nested inside a function".to_string(),
                        },
                        s.span,
                    ));
                    // Keep the pure declaration; the initializer is dropped.
                    return smallvec![Stmt::AnnAssign(AnnAssignStmt {
                        target: self.rewrite_expr(&s.target),
                        annotation: self.rewrite_expr(&s.annotation),
                        value: None,
                        span: s.span,
                    })];
                }
                let target = self.rewrite_expr(&s.target);
                let annotation = self.rewrite_expr(&s.annotation);
                let value = self.rewrite_expr(s.value.as_ref().unwrap());
                smallvec![
                    Stmt::AnnAssign(AnnAssignStmt {
                        target: target.clone(),
                        annotation,
                        value: None,
                        span: s.span,
                    }),
                    Stmt::Assign(AssignStmt {
                        targets: self.arena.alloc_slice_vec(vec![target]),
                        value,
                        span: s.span,
                    }),
                ]
            }
            Stmt::FuncDef(s) => {
                self.ctx.push(Ctx::Function);
                let params = rewrite_params(self, s.params);
                let returns = s.returns.map(|ret| &*self.arena.alloc(self.rewrite_expr(ret)));
                let body = self.rewrite_body(s.body);
                self.ctx.pop();

                let mut out: StmtList<'a> = smallvec![Stmt::FuncDef(FuncDefStmt {
                    name: s.name,
                    params,
                    returns,
                    body,
                    decorators: &[],
                    is_synthesized: s.is_synthesized,
                    span: s.span,
                })];
                let decorators = self.rewrite_decorator_list(s.decorators);
                self.expand_decorators(s.name, decorators, s.span, &mut out);
                out
            }
            Stmt::ClassDef(s) => {
                self.ctx.push(Ctx::Class);
                let bases: Vec<Expr<'a>> =
                    s.bases.iter().map(|b| self.rewrite_expr(b)).collect();
                let body = self.rewrite_body(s.body);
                self.ctx.pop();

                let mut out: StmtList<'a> = smallvec![Stmt::ClassDef(ClassDefStmt {
                    name: s.name,
                    bases: self.arena.alloc_slice_vec(bases),
                    body,
                    decorators: &[],
                    span: s.span,
                })];
                let decorators = self.rewrite_decorator_list(s.decorators);
                self.expand_decorators(s.name, decorators, s.span, &mut out);
                out
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn rewrite_expr(&mut self, expr: &Expr<'a>) -> Expr<'a> {
        match expr {
            Expr::Lambda(lambda) => self.desugar_lambda(lambda),
            Expr::ListComp(comp) | Expr::GeneratorExp(comp) => {
                let elt = self.rewrite_expr(comp.elt);
                self.desugar_comprehension(
                    AccumulateKind::Method("append", elt),
                    comp.generators,
                    comp.span,
                )
            }
            Expr::SetComp(comp) => {
                let elt = self.rewrite_expr(comp.elt);
                self.desugar_comprehension(
                    AccumulateKind::Method("add", elt),
                    comp.generators,
                    comp.span,
                )
            }
            Expr::DictComp(comp) => {
                let key = self.rewrite_expr(comp.key);
                let value = self.rewrite_expr(comp.value);
                self.desugar_comprehension(
                    AccumulateKind::KeyValue(key, value),
                    comp.generators,
                    comp.span,
                )
            }
            _ => walk_expr(self, expr),
        }
    }

    /// Splice hoisted synthesized functions in front of the statement
    /// that produced them.
    fn rewrite_body(&mut self, body: &[Stmt<'a>]) -> &'a [Stmt<'a>] {
        let mut out: Vec<Stmt<'a>> = Vec::with_capacity(body.len());
        for stmt in body {
            let saved = std::mem::take(&mut self.hoisted);
            let stmts = self.rewrite_stmt(stmt);
            let hoisted = std::mem::replace(&mut self.hoisted, saved);
            out.extend(hoisted);
            out.extend(stmts);
        }
        self.arena.alloc_slice_vec(out)
    }
}

impl<'a, 'e> Declarations<'a, 'e> {
    fn rewrite_decorator_list(&mut self, decorators: &[Expr<'a>]) -> &'a [Expr<'a>] {
        let rebuilt: Vec<Expr<'a>> = decorators.iter().map(|d| self.rewrite_expr(d)).collect();
        self.arena.alloc_slice_vec(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn lowered<'a>(arena: &'a Arena, source: &str) -> (&'a Module<'a>, Vec<Error>) {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, arena);
        let module = parser.parse_module().expect("parse failed");
        let mut errors = Vec::new();
        let module = Declarations::new(arena, &mut errors).run(module);
        (module, errors)
    }

    fn func<'m, 'a>(stmt: &'m Stmt<'a>) -> &'m FuncDefStmt<'a> {
        match stmt {
            Stmt::FuncDef(f) => f,
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn annotated_initializer_splits_in_two() {
        let arena = Arena::new();
        let (module, errors) = lowered(&arena, "x: int = 1\n");
        assert!(errors.is_empty());
        assert_eq!(module.body.len(), 2);
        assert!(matches!(&module.body[0], Stmt::AnnAssign(s) if s.value.is_none()));
        assert!(matches!(&module.body[1], Stmt::Assign(_)));
    }

    #[test]
    fn decorator_becomes_call_and_reassign() {
        let arena = Arena::new();
        let (module, _) = lowered(&arena, "@trace\ndef f():\n    pass\n");
        assert_eq!(module.body.len(), 2);
        assert!(func(&module.body[0]).decorators.is_empty());
        match &module.body[1] {
            Stmt::Assign(assign) => match &assign.value {
                Expr::Call(call) => {
                    assert!(matches!(&*call.func, Expr::Name(n) if n.id == "trace"));
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected reassignment, got {other:?}"),
        }
    }

    #[test]
    fn lambda_hoists_to_named_function() {
        let arena = Arena::new();
        let (module, _) = lowered(&arena, "f = lambda x: x + 1\n");
        assert_eq!(module.body.len(), 2);
        let synthesized = func(&module.body[0]);
        assert!(synthesized.is_synthesized);
        assert!(matches!(synthesized.body[0], Stmt::Return(_)));
        match &module.body[1] {
            Stmt::Assign(assign) => {
                assert!(matches!(&assign.value, Expr::Name(n) if n.id == synthesized.name));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn list_comprehension_becomes_loop_function() {
        let arena = Arena::new();
        let (module, _) = lowered(&arena, "ys = [x * x for x in xs if x > 0]\n");
        assert_eq!(module.body.len(), 2);
        let synthesized = func(&module.body[0]);
        assert!(synthesized.is_synthesized);
        assert_eq!(synthesized.params.len(), 1);
        // init, loop, return
        assert_eq!(synthesized.body.len(), 3);
        match &synthesized.body[1] {
            Stmt::For(loop_stmt) => {
                assert!(matches!(loop_stmt.body[0], Stmt::If(_)));
            }
            other => panic!("expected loop, got {other:?}"),
        }
        // Call site passes the outer iterable.
        match &module.body[1] {
            Stmt::Assign(assign) => match &assign.value {
                Expr::Call(call) => {
                    assert!(matches!(&call.args[0], Expr::Name(n) if n.id == "xs"));
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn dict_comprehension_accumulates_by_key() {
        let arena = Arena::new();
        let (module, _) = lowered(&arena, "m = {k: v for k, v in pairs}\n");
        let synthesized = func(&module.body[0]);
        match &synthesized.body[1] {
            Stmt::For(loop_stmt) => {
                assert!(
                    matches!(&loop_stmt.body[0], Stmt::Assign(a) if matches!(a.targets[0], Expr::Subscript(_)))
                );
            }
            other => panic!("expected loop, got {other:?}"),
        }
    }

    #[test]
    fn nested_class_initializer_is_reported() {
        let arena = Arena::new();
        let (_, errors) = lowered(&arena, "def f():\n    class C:\n        x: int = 1\n");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            ErrorKind::InitializerNotAllowed { .. }
        ));
    }
}
