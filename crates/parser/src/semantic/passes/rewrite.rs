//! Structural tree rewriting shared by the transform passes.
//!
//! A pass implements [`Rewriter`] and overrides the hooks it cares
//! about; the default for every node kind is to rebuild it with
//! rewritten children. Statement hooks return a list so one statement
//! can expand to several (or be dropped by returning an empty list).

use crate::arena::Arena;
use crate::ast::*;
use smallvec::{smallvec, SmallVec};

pub type StmtList<'a> = SmallVec<[Stmt<'a>; 1]>;

pub trait Rewriter<'a> {
    fn arena(&self) -> &'a Arena;

    fn rewrite_stmt(&mut self, stmt: &Stmt<'a>) -> StmtList<'a> {
        walk_stmt(self, stmt)
    }

    fn rewrite_expr(&mut self, expr: &Expr<'a>) -> Expr<'a> {
        walk_expr(self, expr)
    }

    fn rewrite_body(&mut self, body: &[Stmt<'a>]) -> &'a [Stmt<'a>] {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            out.extend(self.rewrite_stmt(stmt));
        }
        self.arena().alloc_slice_vec(out)
    }
}

pub fn walk_stmt<'a, R: Rewriter<'a> + ?Sized>(r: &mut R, stmt: &Stmt<'a>) -> StmtList<'a> {
    let rebuilt = match stmt {
        Stmt::Expr(s) => Stmt::Expr(ExprStmt {
            value: r.rewrite_expr(&s.value),
            span: s.span,
        }),
        Stmt::Assign(s) => {
            let targets: Vec<Expr<'a>> = s.targets.iter().map(|t| r.rewrite_expr(t)).collect();
            Stmt::Assign(AssignStmt {
                targets: r.arena().alloc_slice_vec(targets),
                value: r.rewrite_expr(&s.value),
                span: s.span,
            })
        }
        Stmt::AnnAssign(s) => Stmt::AnnAssign(AnnAssignStmt {
            target: r.rewrite_expr(&s.target),
            annotation: r.rewrite_expr(&s.annotation),
            value: s.value.as_ref().map(|v| r.rewrite_expr(v)),
            span: s.span,
        }),
        Stmt::AugAssign(s) => Stmt::AugAssign(AugAssignStmt {
            target: r.rewrite_expr(&s.target),
            op: s.op,
            value: r.rewrite_expr(&s.value),
            span: s.span,
        }),
        Stmt::Return(s) => Stmt::Return(ReturnStmt {
            value: s.value.as_ref().map(|v| r.rewrite_expr(v)),
            span: s.span,
        }),
        Stmt::If(s) => Stmt::If(IfStmt {
            test: r.rewrite_expr(&s.test),
            body: r.rewrite_body(s.body),
            orelse: r.rewrite_body(s.orelse),
            span: s.span,
        }),
        Stmt::While(s) => Stmt::While(WhileStmt {
            test: r.rewrite_expr(&s.test),
            body: r.rewrite_body(s.body),
            orelse: r.rewrite_body(s.orelse),
            span: s.span,
        }),
        Stmt::For(s) => Stmt::For(ForStmt {
            target: r.rewrite_expr(&s.target),
            iter: r.rewrite_expr(&s.iter),
            body: r.rewrite_body(s.body),
            orelse: r.rewrite_body(s.orelse),
            span: s.span,
        }),
        Stmt::FuncDef(s) => {
            let decorators: Vec<Expr<'a>> =
                s.decorators.iter().map(|d| r.rewrite_expr(d)).collect();
            Stmt::FuncDef(FuncDefStmt {
                name: s.name,
                params: rewrite_params(r, s.params),
                returns: s.returns.map(|ret| &*r.arena().alloc(r.rewrite_expr(ret))),
                body: r.rewrite_body(s.body),
                decorators: r.arena().alloc_slice_vec(decorators),
                is_synthesized: s.is_synthesized,
                span: s.span,
            })
        }
        Stmt::ClassDef(s) => {
            let bases: Vec<Expr<'a>> = s.bases.iter().map(|b| r.rewrite_expr(b)).collect();
            let decorators: Vec<Expr<'a>> =
                s.decorators.iter().map(|d| r.rewrite_expr(d)).collect();
            Stmt::ClassDef(ClassDefStmt {
                name: s.name,
                bases: r.arena().alloc_slice_vec(bases),
                body: r.rewrite_body(s.body),
                decorators: r.arena().alloc_slice_vec(decorators),
                span: s.span,
            })
        }
        Stmt::Pass(span) => Stmt::Pass(*span),
        Stmt::Break(span) => Stmt::Break(*span),
        Stmt::Continue(span) => Stmt::Continue(*span),
        Stmt::Raise(s) => Stmt::Raise(RaiseStmt {
            exc: s.exc.as_ref().map(|e| r.rewrite_expr(e)),
            span: s.span,
        }),
        Stmt::Try(s) => {
            let handlers: Vec<ExceptHandler<'a>> = s
                .handlers
                .iter()
                .map(|h| ExceptHandler {
                    ty: h.ty.as_ref().map(|t| r.rewrite_expr(t)),
                    name: h.name,
                    body: r.rewrite_body(h.body),
                    span: h.span,
                })
                .collect();
            Stmt::Try(TryStmt {
                body: r.rewrite_body(s.body),
                handlers: r.arena().alloc_slice_vec(handlers),
                orelse: r.rewrite_body(s.orelse),
                finalbody: r.rewrite_body(s.finalbody),
                span: s.span,
            })
        }
        Stmt::With(s) => {
            let items: Vec<WithItem<'a>> = s
                .items
                .iter()
                .map(|item| WithItem {
                    context: r.rewrite_expr(&item.context),
                    target: item.target.as_ref().map(|t| r.rewrite_expr(t)),
                })
                .collect();
            Stmt::With(WithStmt {
                items: r.arena().alloc_slice_vec(items),
                body: r.rewrite_body(s.body),
                span: s.span,
            })
        }
        Stmt::Global(s) => Stmt::Global(s.clone()),
        Stmt::Nonlocal(s) => Stmt::Nonlocal(s.clone()),
    };
    smallvec![rebuilt]
}

pub fn rewrite_params<'a, R: Rewriter<'a> + ?Sized>(
    r: &mut R,
    params: &[Param<'a>],
) -> &'a [Param<'a>] {
    let rebuilt: Vec<Param<'a>> = params
        .iter()
        .map(|p| Param {
            name: p.name,
            annotation: p.annotation.map(|a| &*r.arena().alloc(r.rewrite_expr(a))),
            default: p.default.map(|d| &*r.arena().alloc(r.rewrite_expr(d))),
            span: p.span,
        })
        .collect();
    r.arena().alloc_slice_vec(rebuilt)
}

pub fn walk_expr<'a, R: Rewriter<'a> + ?Sized>(r: &mut R, expr: &Expr<'a>) -> Expr<'a> {
    match expr {
        Expr::Constant(e) => Expr::Constant(e.clone()),
        Expr::Name(e) => Expr::Name(e.clone()),
        Expr::BinOp(e) => {
            let left = r.rewrite_expr(e.left);
            let right = r.rewrite_expr(e.right);
            Expr::BinOp(BinOpExpr {
                left: r.arena().alloc(left),
                op: e.op,
                right: r.arena().alloc(right),
                span: e.span,
            })
        }
        Expr::UnaryOp(e) => {
            let operand = r.rewrite_expr(e.operand);
            Expr::UnaryOp(UnaryOpExpr {
                op: e.op,
                operand: r.arena().alloc(operand),
                span: e.span,
            })
        }
        Expr::BoolOp(e) => {
            let values: Vec<Expr<'a>> = e.values.iter().map(|v| r.rewrite_expr(v)).collect();
            Expr::BoolOp(BoolOpExpr {
                op: e.op,
                values: r.arena().alloc_slice_vec(values),
                span: e.span,
            })
        }
        Expr::Compare(e) => {
            let left = r.rewrite_expr(e.left);
            let comparators: Vec<Expr<'a>> =
                e.comparators.iter().map(|c| r.rewrite_expr(c)).collect();
            Expr::Compare(CompareExpr {
                left: r.arena().alloc(left),
                ops: e.ops,
                comparators: r.arena().alloc_slice_vec(comparators),
                span: e.span,
            })
        }
        Expr::Call(e) => {
            let func = r.rewrite_expr(e.func);
            let args: Vec<Expr<'a>> = e.args.iter().map(|a| r.rewrite_expr(a)).collect();
            let keywords: Vec<Keyword<'a>> = e
                .keywords
                .iter()
                .map(|k| Keyword {
                    arg: k.arg,
                    value: r.rewrite_expr(&k.value),
                })
                .collect();
            Expr::Call(CallExpr {
                func: r.arena().alloc(func),
                args: r.arena().alloc_slice_vec(args),
                keywords: r.arena().alloc_slice_vec(keywords),
                span: e.span,
            })
        }
        Expr::Attribute(e) => {
            let value = r.rewrite_expr(e.value);
            Expr::Attribute(AttributeExpr {
                value: r.arena().alloc(value),
                attr: e.attr,
                span: e.span,
            })
        }
        Expr::Subscript(e) => {
            let value = r.rewrite_expr(e.value);
            let slice = r.rewrite_expr(e.slice);
            Expr::Subscript(SubscriptExpr {
                value: r.arena().alloc(value),
                slice: r.arena().alloc(slice),
                span: e.span,
            })
        }
        Expr::Slice(e) => Expr::Slice(SliceExpr {
            lower: e.lower.map(|l| &*r.arena().alloc(r.rewrite_expr(l))),
            upper: e.upper.map(|u| &*r.arena().alloc(r.rewrite_expr(u))),
            step: e.step.map(|s| &*r.arena().alloc(r.rewrite_expr(s))),
            span: e.span,
        }),
        Expr::List(e) => {
            let elts: Vec<Expr<'a>> = e.elts.iter().map(|x| r.rewrite_expr(x)).collect();
            Expr::List(ListExpr {
                elts: r.arena().alloc_slice_vec(elts),
                span: e.span,
            })
        }
        Expr::Tuple(e) => {
            let elts: Vec<Expr<'a>> = e.elts.iter().map(|x| r.rewrite_expr(x)).collect();
            Expr::Tuple(TupleExpr {
                elts: r.arena().alloc_slice_vec(elts),
                span: e.span,
            })
        }
        Expr::Set(e) => {
            let elts: Vec<Expr<'a>> = e.elts.iter().map(|x| r.rewrite_expr(x)).collect();
            Expr::Set(SetExpr {
                elts: r.arena().alloc_slice_vec(elts),
                span: e.span,
            })
        }
        Expr::Dict(e) => {
            let keys: Vec<Expr<'a>> = e.keys.iter().map(|k| r.rewrite_expr(k)).collect();
            let values: Vec<Expr<'a>> = e.values.iter().map(|v| r.rewrite_expr(v)).collect();
            Expr::Dict(DictExpr {
                keys: r.arena().alloc_slice_vec(keys),
                values: r.arena().alloc_slice_vec(values),
                span: e.span,
            })
        }
        Expr::IfExp(e) => {
            let test = r.rewrite_expr(e.test);
            let body = r.rewrite_expr(e.body);
            let orelse = r.rewrite_expr(e.orelse);
            Expr::IfExp(IfExpExpr {
                test: r.arena().alloc(test),
                body: r.arena().alloc(body),
                orelse: r.arena().alloc(orelse),
                span: e.span,
            })
        }
        Expr::Lambda(e) => {
            let body = r.rewrite_expr(e.body);
            Expr::Lambda(LambdaExpr {
                params: rewrite_params(r, e.params),
                body: r.arena().alloc(body),
                span: e.span,
            })
        }
        Expr::ListComp(e) => Expr::ListComp(rewrite_comp(r, e)),
        Expr::SetComp(e) => Expr::SetComp(rewrite_comp(r, e)),
        Expr::GeneratorExp(e) => Expr::GeneratorExp(rewrite_comp(r, e)),
        Expr::DictComp(e) => {
            let key = r.rewrite_expr(e.key);
            let value = r.rewrite_expr(e.value);
            Expr::DictComp(DictCompExpr {
                key: r.arena().alloc(key),
                value: r.arena().alloc(value),
                generators: rewrite_generators(r, e.generators),
                span: e.span,
            })
        }
    }
}

fn rewrite_comp<'a, R: Rewriter<'a> + ?Sized>(r: &mut R, comp: &CompExpr<'a>) -> CompExpr<'a> {
    let elt = r.rewrite_expr(comp.elt);
    CompExpr {
        elt: r.arena().alloc(elt),
        generators: rewrite_generators(r, comp.generators),
        span: comp.span,
    }
}

fn rewrite_generators<'a, R: Rewriter<'a> + ?Sized>(
    r: &mut R,
    generators: &[Comprehension<'a>],
) -> &'a [Comprehension<'a>] {
    let rebuilt: Vec<Comprehension<'a>> = generators
        .iter()
        .map(|g| {
            let ifs: Vec<Expr<'a>> = g.ifs.iter().map(|c| r.rewrite_expr(c)).collect();
            Comprehension {
                target: r.rewrite_expr(&g.target),
                iter: r.rewrite_expr(&g.iter),
                ifs: r.arena().alloc_slice_vec(ifs),
            }
        })
        .collect();
    r.arena().alloc_slice_vec(rebuilt)
}
