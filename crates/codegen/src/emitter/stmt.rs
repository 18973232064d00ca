//! Statement emission into a function body.

use super::{Emitter, FuncCtx};
use crate::error::{CodegenError, CodegenResult};
use crate::temp::Cleanup;
use cypress_parser::ast::*;

impl<'s> Emitter<'s> {
    pub(crate) fn emit_stmts<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        stmts: &'a [Stmt<'a>],
    ) -> CodegenResult<()> {
        for stmt in stmts {
            self.emit_stmt(ctx, stmt)?;
        }
        Ok(())
    }

    pub(crate) fn emit_stmt<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        stmt: &'a Stmt<'a>,
    ) -> CodegenResult<()> {
        // Expression temporaries live for one statement.
        let live_before = ctx.stmt_temps.len();
        let result = self.emit_stmt_inner(ctx, stmt);
        for temp in ctx.stmt_temps.split_off(live_before) {
            ctx.temps.release(&temp);
        }
        result
    }

    fn emit_stmt_inner<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        stmt: &'a Stmt<'a>,
    ) -> CodegenResult<()> {
        match stmt {
            Stmt::Expr(s) => {
                let value = self.emit_expr(ctx, &s.value)?;
                ctx.body.line(&format!("{};", value));
                Ok(())
            }
            Stmt::Assign(s) => {
                let value = self.emit_expr(ctx, &s.value)?;
                for target in s.targets {
                    self.emit_store(ctx, target, &value)?;
                }
                Ok(())
            }
            // Pure declarations; storage is handled by the declaration
            // blocks, initialization was split off earlier.
            Stmt::AnnAssign(_) | Stmt::Global(_) | Stmt::Nonlocal(_) => Ok(()),
            Stmt::AugAssign(_) => Err(CodegenError::Unsupported(
                "compound assignment that should have been lowered".to_string(),
            )),
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(value) => self.emit_expr(ctx, value)?,
                    None => "cyv_none()".to_string(),
                };
                // Pending finally blocks run before the function exits.
                let pending: Vec<_> = ctx.finally_stack.clone();
                for finalbody in pending.into_iter().rev() {
                    self.emit_stmts(ctx, finalbody)?;
                }
                ctx.body.line(&format!("return {};", value));
                Ok(())
            }
            Stmt::Pass(_) => Ok(()),
            Stmt::Break(_) => {
                ctx.body.line("break;");
                Ok(())
            }
            Stmt::Continue(_) => {
                ctx.body.line("continue;");
                Ok(())
            }
            Stmt::If(s) => {
                let test = self.emit_expr(ctx, &s.test)?;
                ctx.body.line(&format!("if (cyv_truthy({})) {{", test));
                self.emit_stmts(ctx, s.body)?;
                if !s.orelse.is_empty() {
                    ctx.body.line("} else {");
                    self.emit_stmts(ctx, s.orelse)?;
                }
                ctx.body.line("}");
                Ok(())
            }
            Stmt::While(s) => {
                // The loop condition re-evaluates each iteration, so it
                // is emitted as `while (1)` with an explicit test; the
                // condition may allocate temporaries of its own.
                ctx.body.line("while (1) {");
                let test = self.emit_expr(ctx, &s.test)?;
                ctx.body.line(&format!("if (!cyv_truthy({})) break;", test));
                self.emit_stmts(ctx, s.body)?;
                ctx.body.line("}");
                Ok(())
            }
            Stmt::For(s) => self.emit_for(ctx, s),
            Stmt::FuncDef(s) => self.emit_function(ctx, s),
            Stmt::ClassDef(s) => self.emit_class(ctx, s),
            Stmt::Raise(s) => {
                match &s.exc {
                    Some(exc) => {
                        let exc = self.emit_expr(ctx, exc)?;
                        ctx.body.line(&format!("cyB_raise({});", exc));
                    }
                    None => ctx.body.line("cyB_reraise();"),
                }
                Ok(())
            }
            Stmt::Try(s) => self.emit_try(ctx, s),
            Stmt::With(_) => Err(CodegenError::Unsupported(
                "with statement that should have been lowered".to_string(),
            )),
        }
    }

    /// Emit a store of the already-rendered `value` into `target`.
    pub(crate) fn emit_store<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        target: &'a Expr<'a>,
        value: &str,
    ) -> CodegenResult<()> {
        match target {
            Expr::Name(n) => {
                if !n.id.starts_with("__cy") {
                    if let Some(eid) = self.symbols.resolution(n.span) {
                        if self.is_class_attribute(eid) {
                            let entry = self.symbols.entry(eid);
                            ctx.body.line(&format!(
                                "cyv_setattr({}, \"{}\", {});",
                                self.class_object(entry.scope),
                                entry.name,
                                value
                            ));
                            return Ok(());
                        }
                        ctx.body
                            .line(&format!("{} = {};", self.entry_ref(ctx, eid), value));
                        return Ok(());
                    }
                }
                ctx.body.line(&format!("{} = {};", lvalue_name(n), value));
                Ok(())
            }
            Expr::Attribute(a) => {
                let receiver = self.emit_expr(ctx, a.value)?;
                ctx.body.line(&format!(
                    "cyv_setattr({}, \"{}\", {});",
                    receiver, a.attr, value
                ));
                Ok(())
            }
            Expr::Subscript(s) => {
                let receiver = self.emit_expr(ctx, s.value)?;
                let index = self.emit_expr(ctx, s.slice)?;
                ctx.body.line(&format!(
                    "cyv_index_set({}, {}, {});",
                    receiver, index, value
                ));
                Ok(())
            }
            // Tuple targets only survive in `for` loops; `value` is a
            // pure expression there, so re-indexing it is safe.
            Expr::Tuple(t) => {
                for (index, target) in t.elts.iter().enumerate() {
                    let slot = format!("cyv_index({}, cyv_int({}L))", value, index);
                    self.emit_store(ctx, target, &slot)?;
                }
                Ok(())
            }
            Expr::List(l) => {
                for (index, target) in l.elts.iter().enumerate() {
                    let slot = format!("cyv_index({}, cyv_int({}L))", value, index);
                    self.emit_store(ctx, target, &slot)?;
                }
                Ok(())
            }
            other => Err(CodegenError::Unsupported(format!(
                "assignment target {}",
                expr_to_string(other)
            ))),
        }
    }

    fn emit_for<'a>(&mut self, ctx: &mut FuncCtx<'a>, s: &'a ForStmt<'a>) -> CodegenResult<()> {
        let iterable = self.emit_expr(ctx, &s.iter)?;
        let iter = ctx.temps.allocate("CyIter", Cleanup::None);
        let item = ctx.temps.allocate("CyValue", Cleanup::None);
        ctx.body
            .line(&format!("{} = cyv_iter({});", iter.name, iterable));
        ctx.body.line(&format!(
            "while (cyv_iter_next(&{}, &{})) {{",
            iter.name, item.name
        ));
        let item_name = item.name.clone();
        self.emit_store(ctx, &s.target, &item_name)?;
        self.emit_stmts(ctx, s.body)?;
        ctx.body.line("}");
        ctx.temps.release(&item);
        ctx.temps.release(&iter);
        Ok(())
    }

    fn emit_try<'a>(&mut self, ctx: &mut FuncCtx<'a>, s: &'a TryStmt<'a>) -> CodegenResult<()> {
        let frame = ctx.temps.allocate("CyTryFrame", Cleanup::None);
        let fin = ctx.labels.fresh("fin");

        if !s.finalbody.is_empty() {
            ctx.finally_stack.push(s.finalbody);
        }

        if s.handlers.is_empty() {
            // Finally-only form: route the exception path straight to
            // the finally block and re-raise after it runs.
            ctx.body.line(&format!(
                "if (!cyB_try_enter(&{})) goto {};",
                frame.name,
                ctx.labels.jump(fin)
            ));
            self.emit_stmts(ctx, s.body)?;
            ctx.body.line(&format!("cyB_try_exit(&{});", frame.name));
            self.emit_stmts(ctx, s.orelse)?;
        } else {
            ctx.body
                .line(&format!("if (cyB_try_enter(&{})) {{", frame.name));
            self.emit_stmts(ctx, s.body)?;
            ctx.body.line(&format!("cyB_try_exit(&{});", frame.name));
            self.emit_stmts(ctx, s.orelse)?;
            ctx.body.line("} else {");
            self.emit_handlers(ctx, s.handlers)?;
            ctx.body.line("}");
        }

        if !s.finalbody.is_empty() {
            ctx.finally_stack.pop();
        }

        ctx.labels.declare(fin, &ctx.body);
        self.emit_stmts(ctx, s.finalbody)?;
        if s.handlers.is_empty() {
            ctx.body.line("if (cyB_exc_pending()) cyB_reraise();");
        }
        ctx.temps.release(&frame);
        Ok(())
    }

    fn emit_handlers<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        handlers: &'a [ExceptHandler<'a>],
    ) -> CodegenResult<()> {
        let mut caught_all = false;
        for (i, handler) in handlers.iter().enumerate() {
            match &handler.ty {
                Some(ty) => {
                    let class = self.emit_expr(ctx, ty)?;
                    let keyword = if i == 0 { "if" } else { "} else if" };
                    ctx.body
                        .line(&format!("{} (cyB_exc_matches({})) {{", keyword, class));
                }
                None => {
                    if i == 0 {
                        ctx.body.line("{");
                    } else {
                        ctx.body.line("} else {");
                    }
                    caught_all = true;
                }
            }
            if let Some(name) = handler.name {
                let target = match self.symbols.scope(ctx.scope).entries.get(name) {
                    Some(&id) => self.entry_ref(ctx, id),
                    None => format!("cy_{}", name),
                };
                ctx.body.line(&format!("{} = cyB_exc_value();", target));
            }
            self.emit_stmts(ctx, handler.body)?;
        }
        if caught_all {
            ctx.body.line("}");
        } else {
            ctx.body.line("} else {");
            ctx.body.line("cyB_reraise();");
            ctx.body.line("}");
        }
        Ok(())
    }
}

fn lvalue_name(n: &NameExpr<'_>) -> String {
    if n.id.starts_with("__cy") {
        n.id.to_string()
    } else {
        format!("cy_{}", n.id)
    }
}
