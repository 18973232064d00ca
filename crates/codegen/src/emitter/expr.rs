//! Expression emission. Every expression becomes a C expression of
//! type `CyValue`; short-circuit operators and cascaded comparisons use
//! comma expressions with statement-scoped temporaries so each operand
//! is evaluated at most once.

use super::{c_escape, Emitter, FuncCtx};
use crate::error::{CodegenError, CodegenResult};
use crate::temp::Cleanup;
use cypress_parser::ast::*;
use cypress_parser::semantic::Visibility;

impl<'s> Emitter<'s> {
    pub(crate) fn emit_expr(&self, ctx: &mut FuncCtx<'_>, expr: &Expr<'_>) -> CodegenResult<String> {
        match expr {
            Expr::Constant(c) => Ok(self.emit_constant(c)),
            Expr::Name(n) => Ok(self.emit_name(ctx, n)),
            Expr::BinOp(b) => {
                let left = self.emit_expr(ctx, b.left)?;
                let right = self.emit_expr(ctx, b.right)?;
                Ok(format!("{}({}, {})", binop_fn(b.op)?, left, right))
            }
            Expr::UnaryOp(u) => {
                let operand = self.emit_expr(ctx, u.operand)?;
                match u.op {
                    OP_NOT => Ok(format!("cyv_not({})", operand)),
                    OP_USUB => Ok(format!("cyv_neg({})", operand)),
                    OP_INVERT => Ok(format!("cyv_invert({})", operand)),
                    OP_UADD => Ok(operand),
                    other => Err(CodegenError::Unsupported(format!(
                        "unary operator {other}"
                    ))),
                }
            }
            Expr::BoolOp(b) => self.emit_bool_op(ctx, b),
            Expr::Compare(c) => self.emit_compare(ctx, c),
            Expr::Call(c) => self.emit_call(ctx, c),
            Expr::Attribute(a) => {
                let value = self.emit_expr(ctx, a.value)?;
                Ok(format!("cyv_getattr({}, \"{}\")", value, a.attr))
            }
            Expr::Subscript(s) => {
                let value = self.emit_expr(ctx, s.value)?;
                match s.slice {
                    Expr::Slice(slice) => {
                        let lower = self.emit_opt(ctx, slice.lower)?;
                        let upper = self.emit_opt(ctx, slice.upper)?;
                        let step = self.emit_opt(ctx, slice.step)?;
                        Ok(format!("cyv_slice({}, {}, {}, {})", value, lower, upper, step))
                    }
                    index => {
                        let index = self.emit_expr(ctx, index)?;
                        Ok(format!("cyv_index({}, {})", value, index))
                    }
                }
            }
            Expr::List(l) => self.emit_sequence(ctx, "cyv_list", l.elts),
            Expr::Tuple(t) => self.emit_sequence(ctx, "cyv_tuple", t.elts),
            Expr::Set(s) => self.emit_sequence(ctx, "cyv_set", s.elts),
            Expr::Dict(d) => {
                let mut parts = Vec::with_capacity(d.keys.len() * 2);
                for (key, value) in d.keys.iter().zip(d.values.iter()) {
                    parts.push(self.emit_expr(ctx, key)?);
                    parts.push(self.emit_expr(ctx, value)?);
                }
                Ok(format!(
                    "cyv_dict({}{}{})",
                    d.keys.len(),
                    if parts.is_empty() { "" } else { ", " },
                    parts.join(", ")
                ))
            }
            Expr::IfExp(e) => {
                let test = self.emit_expr(ctx, e.test)?;
                let body = self.emit_expr(ctx, e.body)?;
                let orelse = self.emit_expr(ctx, e.orelse)?;
                Ok(format!("(cyv_truthy({}) ? {} : {})", test, body, orelse))
            }
            // Lambdas and comprehensions are desugared to named
            // functions before emission; reaching one here means the
            // pipeline was not run.
            Expr::Lambda(_)
            | Expr::ListComp(_)
            | Expr::SetComp(_)
            | Expr::GeneratorExp(_)
            | Expr::DictComp(_) => Err(CodegenError::Unsupported(
                "expression form that should have been desugared".to_string(),
            )),
            Expr::Slice(_) => Err(CodegenError::Unsupported(
                "slice outside a subscript".to_string(),
            )),
        }
    }

    fn emit_constant(&self, c: &ConstantExpr<'_>) -> String {
        match c.kind {
            ConstantKind::Int => {
                let digits: String = c.value.chars().filter(|&ch| ch != '_').collect();
                format!("cyv_int({}L)", digits)
            }
            ConstantKind::Float => {
                let digits: String = c.value.chars().filter(|&ch| ch != '_').collect();
                format!("cyv_float({})", digits)
            }
            ConstantKind::Str => {
                let body = if c.value.len() >= 2 {
                    &c.value[1..c.value.len() - 1]
                } else {
                    c.value
                };
                format!("cyv_str(\"{}\")", c_escape(body))
            }
            ConstantKind::Bool => {
                format!("cyv_bool({})", if c.value == CONST_TRUE { 1 } else { 0 })
            }
            ConstantKind::None => "cyv_none()".to_string(),
        }
    }

    fn emit_name(&self, ctx: &FuncCtx<'_>, n: &NameExpr<'_>) -> String {
        // Compiler-synthesized locals are already unique C identifiers.
        if n.id.starts_with("__cy") {
            return n.id.to_string();
        }
        match self.symbols.resolution(n.span) {
            Some(eid) => {
                let entry = self.symbols.entry(eid);
                if entry.visibility == Visibility::Extern {
                    format!("cyv_builtin(\"{}\")", entry.name)
                } else if self.is_class_attribute(eid) {
                    format!(
                        "cyv_getattr({}, \"{}\")",
                        self.class_object(entry.scope),
                        entry.name
                    )
                } else {
                    self.entry_ref(ctx, eid)
                }
            }
            None => format!("cy_{}", n.id),
        }
    }

    /// `a and b and c` with each operand evaluated at most once, left
    /// to right, stopping at the first decisive value.
    fn emit_bool_op(&self, ctx: &mut FuncCtx<'_>, b: &BoolOpExpr<'_>) -> CodegenResult<String> {
        let decisive = if b.op == OP_AND { "!" } else { "" };
        let mut out = self.emit_expr(ctx, &b.values[b.values.len() - 1])?;
        for value in b.values[..b.values.len() - 1].iter().rev() {
            let value = self.emit_expr(ctx, value)?;
            let temp = ctx.temps.allocate("CyValue", Cleanup::None);
            out = format!(
                "({t} = {value}, {dec}cyv_truthy({t}) ? {t} : ({out}))",
                t = temp.name,
                dec = decisive,
            );
            ctx.stmt_temps.push(temp);
        }
        Ok(out)
    }

    /// Cascaded comparison: each middle comparand is bound to a
    /// temporary so it is evaluated once even though it feeds two
    /// comparisons.
    fn emit_compare(&self, ctx: &mut FuncCtx<'_>, c: &CompareExpr<'_>) -> CodegenResult<String> {
        let mut left = self.emit_expr(ctx, c.left)?;
        if c.ops.len() == 1 {
            let right = self.emit_expr(ctx, &c.comparators[0])?;
            return Ok(format!("{}({}, {})", compare_fn(c.ops[0])?, left, right));
        }
        let mut clauses = Vec::with_capacity(c.ops.len() * 2);
        for (i, (&op, comparator)) in c.ops.iter().zip(c.comparators.iter()).enumerate() {
            let right = self.emit_expr(ctx, comparator)?;
            // Middle comparands feed two comparisons; bind them so the
            // second use reads the temporary, not a re-evaluation.
            let right = if i + 1 < c.ops.len() {
                let temp = ctx.temps.allocate("CyValue", Cleanup::None);
                clauses.push(format!("({} = {}, 1)", temp.name, right));
                let name = temp.name.clone();
                ctx.stmt_temps.push(temp);
                name
            } else {
                right
            };
            clauses.push(format!(
                "cyv_truthy({}({}, {}))",
                compare_fn(op)?,
                left,
                right
            ));
            left = right;
        }
        Ok(format!("cyv_bool({})", clauses.join(" && ")))
    }

    fn emit_call(&self, ctx: &mut FuncCtx<'_>, c: &CallExpr<'_>) -> CodegenResult<String> {
        let mut args = Vec::with_capacity(c.args.len() + c.keywords.len());
        for arg in c.args {
            args.push(self.emit_expr(ctx, arg)?);
        }
        // Keyword arguments are passed positionally after resolution;
        // the runtime call protocol has no named slots.
        for kw in c.keywords {
            args.push(self.emit_expr(ctx, &kw.value)?);
        }
        let argc = args.len();
        let arg_list = if args.is_empty() {
            String::new()
        } else {
            format!(", {}", args.join(", "))
        };

        // Method call sugar.
        if let Expr::Attribute(a) = c.func {
            let receiver = self.emit_expr(ctx, a.value)?;
            return Ok(format!(
                "cyv_invoke({}, \"{}\", {}{})",
                receiver, a.attr, argc, arg_list
            ));
        }

        // Builtins compile to direct calls into the runtime.
        if let Expr::Name(n) = c.func {
            if let Some(eid) = self.symbols.resolution(n.span) {
                let entry = self.symbols.entry(eid);
                if entry.visibility == Visibility::Extern {
                    return Ok(format!("{}({}{})", entry.cname, argc, arg_list));
                }
            }
        }

        let callee = self.emit_expr(ctx, c.func)?;
        Ok(format!("cyv_call({}, {}{})", callee, argc, arg_list))
    }

    fn emit_sequence(
        &self,
        ctx: &mut FuncCtx<'_>,
        ctor: &str,
        elts: &[Expr<'_>],
    ) -> CodegenResult<String> {
        let mut parts = Vec::with_capacity(elts.len());
        for elt in elts {
            parts.push(self.emit_expr(ctx, elt)?);
        }
        Ok(format!(
            "{}({}{}{})",
            ctor,
            elts.len(),
            if parts.is_empty() { "" } else { ", " },
            parts.join(", ")
        ))
    }

    fn emit_opt(
        &self,
        ctx: &mut FuncCtx<'_>,
        expr: Option<&Expr<'_>>,
    ) -> CodegenResult<String> {
        match expr {
            Some(expr) => self.emit_expr(ctx, expr),
            None => Ok("cyv_none()".to_string()),
        }
    }
}

fn binop_fn(op: &str) -> CodegenResult<&'static str> {
    Ok(match op {
        OP_ADD => "cyv_add",
        OP_SUB => "cyv_sub",
        OP_MULT => "cyv_mul",
        OP_DIV => "cyv_div",
        OP_FLOORDIV => "cyv_floordiv",
        OP_MOD => "cyv_mod",
        OP_POW => "cyv_pow",
        OP_BITOR => "cyv_bitor",
        OP_BITXOR => "cyv_bitxor",
        OP_BITAND => "cyv_bitand",
        OP_LSHIFT => "cyv_lshift",
        OP_RSHIFT => "cyv_rshift",
        other => {
            return Err(CodegenError::Unsupported(format!(
                "binary operator {other}"
            )))
        }
    })
}

fn compare_fn(op: &str) -> CodegenResult<&'static str> {
    Ok(match op {
        OP_EQ => "cyv_eq",
        OP_NE => "cyv_ne",
        OP_LT => "cyv_lt",
        OP_LE => "cyv_le",
        OP_GT => "cyv_gt",
        OP_GE => "cyv_ge",
        OP_IS => "cyv_is",
        OP_ISNOT => "cyv_is_not",
        OP_IN => "cyv_in",
        OP_NOTIN => "cyv_not_in",
        other => {
            return Err(CodegenError::Unsupported(format!(
                "comparison operator {other}"
            )))
        }
    })
}
