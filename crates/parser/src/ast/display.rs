//! AST pretty-printer.
//!
//! `expr_to_string` gives concise one-line renderings for diagnostics.
//! `module_to_source` re-serializes a parsed module to valid source text,
//! which is what the grammar round-trip tests rely on: parsing the output
//! again must yield a structurally equal tree.

use super::expr::*;
use super::nodes::*;

/// Convert an expression to re-parseable source text.
pub fn expr_to_string(expr: &Expr) -> String {
    match expr {
        Expr::Constant(c) => c.value.to_string(),
        Expr::Name(n) => n.id.to_string(),
        Expr::BinOp(b) => format!(
            "({} {} {})",
            expr_to_string(b.left),
            b.op,
            expr_to_string(b.right)
        ),
        Expr::UnaryOp(u) => {
            if u.op == "not" {
                format!("(not {})", expr_to_string(u.operand))
            } else {
                format!("({}{})", u.op, expr_to_string(u.operand))
            }
        }
        Expr::BoolOp(b) => {
            let joined = b
                .values
                .iter()
                .map(expr_to_string)
                .collect::<Vec<_>>()
                .join(&format!(" {} ", b.op));
            format!("({})", joined)
        }
        Expr::Compare(c) => {
            let mut out = format!("({}", expr_to_string(c.left));
            for (op, comparator) in c.ops.iter().zip(c.comparators.iter()) {
                out.push_str(&format!(" {} {}", op, expr_to_string(comparator)));
            }
            out.push(')');
            out
        }
        Expr::Call(c) => {
            let mut parts: Vec<String> = c.args.iter().map(expr_to_string).collect();
            for kw in c.keywords {
                parts.push(format!("{}={}", kw.arg, expr_to_string(&kw.value)));
            }
            format!("{}({})", expr_to_string(c.func), parts.join(", "))
        }
        Expr::Attribute(a) => format!("{}.{}", expr_to_string(a.value), a.attr),
        Expr::Subscript(s) => {
            format!("{}[{}]", expr_to_string(s.value), expr_to_string(s.slice))
        }
        Expr::Slice(s) => {
            let lower = s.lower.map(expr_to_string).unwrap_or_default();
            let upper = s.upper.map(expr_to_string).unwrap_or_default();
            match s.step {
                Some(step) => format!("{}:{}:{}", lower, upper, expr_to_string(step)),
                None => format!("{}:{}", lower, upper),
            }
        }
        Expr::List(l) => format!("[{}]", join_exprs(l.elts)),
        Expr::Tuple(t) => {
            if t.elts.len() == 1 {
                format!("({},)", expr_to_string(&t.elts[0]))
            } else {
                format!("({})", join_exprs(t.elts))
            }
        }
        Expr::Set(s) => format!("{{{}}}", join_exprs(s.elts)),
        Expr::Dict(d) => {
            let pairs: Vec<String> = d
                .keys
                .iter()
                .zip(d.values.iter())
                .map(|(k, v)| format!("{}: {}", expr_to_string(k), expr_to_string(v)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        Expr::IfExp(e) => format!(
            "({} if {} else {})",
            expr_to_string(e.body),
            expr_to_string(e.test),
            expr_to_string(e.orelse)
        ),
        Expr::Lambda(l) => {
            let params: Vec<String> = l.params.iter().map(param_to_string).collect();
            format!("(lambda {}: {})", params.join(", "), expr_to_string(l.body))
        }
        Expr::ListComp(c) => format!("[{}{}]", expr_to_string(c.elt), generators(c.generators)),
        Expr::SetComp(c) => format!("{{{}{}}}", expr_to_string(c.elt), generators(c.generators)),
        Expr::GeneratorExp(c) => {
            format!("({}{})", expr_to_string(c.elt), generators(c.generators))
        }
        Expr::DictComp(c) => format!(
            "{{{}: {}{}}}",
            expr_to_string(c.key),
            expr_to_string(c.value),
            generators(c.generators)
        ),
    }
}

fn join_exprs(elts: &[Expr]) -> String {
    elts.iter().map(expr_to_string).collect::<Vec<_>>().join(", ")
}

fn generators(gens: &[Comprehension]) -> String {
    let mut out = String::new();
    for g in gens {
        out.push_str(&format!(
            " for {} in {}",
            expr_to_string(&g.target),
            expr_to_string(&g.iter)
        ));
        for cond in g.ifs {
            out.push_str(&format!(" if {}", expr_to_string(cond)));
        }
    }
    out
}

fn param_to_string(param: &Param) -> String {
    let mut out = param.name.to_string();
    if let Some(ann) = param.annotation {
        out.push_str(&format!(": {}", expr_to_string(ann)));
    }
    if let Some(default) = param.default {
        out.push_str(&format!(" = {}", expr_to_string(default)));
    }
    out
}

/// Re-serialize a module to source text.
pub fn module_to_source(module: &Module) -> String {
    let mut out = String::new();
    for stmt in module.body {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

fn write_block(out: &mut String, body: &[Stmt], indent: usize) {
    if body.is_empty() {
        out.push_str(&format!("{}pass\n", "    ".repeat(indent)));
        return;
    }
    for stmt in body {
        write_stmt(out, stmt, indent);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, indent: usize) {
    let pad = "    ".repeat(indent);
    match stmt {
        Stmt::Expr(s) => out.push_str(&format!("{}{}\n", pad, expr_to_string(&s.value))),
        Stmt::Assign(s) => {
            let targets: Vec<String> = s.targets.iter().map(assign_target).collect();
            out.push_str(&format!(
                "{}{} = {}\n",
                pad,
                targets.join(" = "),
                expr_to_string(&s.value)
            ));
        }
        Stmt::AnnAssign(s) => {
            let value = s
                .value
                .as_ref()
                .map(|v| format!(" = {}", expr_to_string(v)))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}{}: {}{}\n",
                pad,
                expr_to_string(&s.target),
                expr_to_string(&s.annotation),
                value
            ));
        }
        Stmt::AugAssign(s) => out.push_str(&format!(
            "{}{} {}= {}\n",
            pad,
            expr_to_string(&s.target),
            s.op,
            expr_to_string(&s.value)
        )),
        Stmt::Return(s) => match &s.value {
            Some(v) => out.push_str(&format!("{}return {}\n", pad, expr_to_string(v))),
            None => out.push_str(&format!("{}return\n", pad)),
        },
        Stmt::If(s) => {
            out.push_str(&format!("{}if {}:\n", pad, expr_to_string(&s.test)));
            write_block(out, s.body, indent + 1);
            if !s.orelse.is_empty() {
                out.push_str(&format!("{}else:\n", pad));
                write_block(out, s.orelse, indent + 1);
            }
        }
        Stmt::While(s) => {
            out.push_str(&format!("{}while {}:\n", pad, expr_to_string(&s.test)));
            write_block(out, s.body, indent + 1);
            if !s.orelse.is_empty() {
                out.push_str(&format!("{}else:\n", pad));
                write_block(out, s.orelse, indent + 1);
            }
        }
        Stmt::For(s) => {
            out.push_str(&format!(
                "{}for {} in {}:\n",
                pad,
                assign_target(&s.target),
                expr_to_string(&s.iter)
            ));
            write_block(out, s.body, indent + 1);
            if !s.orelse.is_empty() {
                out.push_str(&format!("{}else:\n", pad));
                write_block(out, s.orelse, indent + 1);
            }
        }
        Stmt::FuncDef(s) => {
            for deco in s.decorators {
                out.push_str(&format!("{}@{}\n", pad, expr_to_string(deco)));
            }
            let params: Vec<String> = s.params.iter().map(param_to_string).collect();
            let returns = s
                .returns
                .map(|r| format!(" -> {}", expr_to_string(r)))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}def {}({}){}:\n",
                pad,
                s.name,
                params.join(", "),
                returns
            ));
            write_block(out, s.body, indent + 1);
        }
        Stmt::ClassDef(s) => {
            for deco in s.decorators {
                out.push_str(&format!("{}@{}\n", pad, expr_to_string(deco)));
            }
            let bases = if s.bases.is_empty() {
                String::new()
            } else {
                format!("({})", join_exprs(s.bases))
            };
            out.push_str(&format!("{}class {}{}:\n", pad, s.name, bases));
            write_block(out, s.body, indent + 1);
        }
        Stmt::Pass(_) => out.push_str(&format!("{}pass\n", pad)),
        Stmt::Break(_) => out.push_str(&format!("{}break\n", pad)),
        Stmt::Continue(_) => out.push_str(&format!("{}continue\n", pad)),
        Stmt::Raise(s) => match &s.exc {
            Some(e) => out.push_str(&format!("{}raise {}\n", pad, expr_to_string(e))),
            None => out.push_str(&format!("{}raise\n", pad)),
        },
        Stmt::Try(s) => {
            out.push_str(&format!("{}try:\n", pad));
            write_block(out, s.body, indent + 1);
            for handler in s.handlers {
                let ty = handler
                    .ty
                    .as_ref()
                    .map(|t| format!(" {}", expr_to_string(t)))
                    .unwrap_or_default();
                let name = handler
                    .name
                    .map(|n| format!(" as {}", n))
                    .unwrap_or_default();
                out.push_str(&format!("{}except{}{}:\n", pad, ty, name));
                write_block(out, handler.body, indent + 1);
            }
            if !s.orelse.is_empty() {
                out.push_str(&format!("{}else:\n", pad));
                write_block(out, s.orelse, indent + 1);
            }
            if !s.finalbody.is_empty() {
                out.push_str(&format!("{}finally:\n", pad));
                write_block(out, s.finalbody, indent + 1);
            }
        }
        Stmt::With(s) => {
            let items: Vec<String> = s
                .items
                .iter()
                .map(|item| {
                    let target = item
                        .target
                        .as_ref()
                        .map(|t| format!(" as {}", expr_to_string(t)))
                        .unwrap_or_default();
                    format!("{}{}", expr_to_string(&item.context), target)
                })
                .collect();
            out.push_str(&format!("{}with {}:\n", pad, items.join(", ")));
            write_block(out, s.body, indent + 1);
        }
        Stmt::Global(s) => out.push_str(&format!("{}global {}\n", pad, s.names.join(", "))),
        Stmt::Nonlocal(s) => out.push_str(&format!("{}nonlocal {}\n", pad, s.names.join(", "))),
    }
}

/// Assignment targets print without the parenthesization expressions get,
/// so `a, b = ...` round-trips as a tuple target.
fn assign_target(expr: &Expr) -> String {
    match expr {
        Expr::Tuple(t) => t
            .elts
            .iter()
            .map(assign_target)
            .collect::<Vec<_>>()
            .join(", "),
        other => expr_to_string(other),
    }
}
