//! Module, function and class emission.
//!
//! Source-language functions become file-scope C functions regardless
//! of nesting depth; each also gets a callable object variable bound at
//! the definition's execution point, which is what calls, decorator
//! rebinding and closures all go through. The module body itself runs
//! in `main`.

use super::{Emitter, FuncCtx};
use crate::error::{CodegenError, CodegenResult};
use cypress_parser::ast::*;
use cypress_parser::semantic::symbol::ScopeKind;
use cypress_parser::semantic::Visibility;
use std::collections::HashSet;

/// Declarations for the runtime ABI the generated code links against.
pub(crate) const RUNTIME_PRELUDE: &str = "\
typedef struct CyObject *CyValue;
typedef struct CyIter { CyValue seq; long index; } CyIter;
typedef struct CyTryFrame { void *state[32]; } CyTryFrame;
typedef CyValue (*CyFn)(void);

void cyB_init(void);

CyValue cyv_int(long v);
CyValue cyv_float(double v);
CyValue cyv_str(const char *v);
CyValue cyv_bool(int v);
CyValue cyv_none(void);

CyValue cyv_add(CyValue a, CyValue b);
CyValue cyv_sub(CyValue a, CyValue b);
CyValue cyv_mul(CyValue a, CyValue b);
CyValue cyv_div(CyValue a, CyValue b);
CyValue cyv_floordiv(CyValue a, CyValue b);
CyValue cyv_mod(CyValue a, CyValue b);
CyValue cyv_pow(CyValue a, CyValue b);
CyValue cyv_bitor(CyValue a, CyValue b);
CyValue cyv_bitxor(CyValue a, CyValue b);
CyValue cyv_bitand(CyValue a, CyValue b);
CyValue cyv_lshift(CyValue a, CyValue b);
CyValue cyv_rshift(CyValue a, CyValue b);
CyValue cyv_neg(CyValue a);
CyValue cyv_not(CyValue a);
CyValue cyv_invert(CyValue a);
int cyv_truthy(CyValue a);

CyValue cyv_eq(CyValue a, CyValue b);
CyValue cyv_ne(CyValue a, CyValue b);
CyValue cyv_lt(CyValue a, CyValue b);
CyValue cyv_le(CyValue a, CyValue b);
CyValue cyv_gt(CyValue a, CyValue b);
CyValue cyv_ge(CyValue a, CyValue b);
CyValue cyv_is(CyValue a, CyValue b);
CyValue cyv_is_not(CyValue a, CyValue b);
CyValue cyv_in(CyValue a, CyValue b);
CyValue cyv_not_in(CyValue a, CyValue b);

CyValue cyv_index(CyValue seq, CyValue key);
void cyv_index_set(CyValue seq, CyValue key, CyValue value);
CyValue cyv_slice(CyValue seq, CyValue lower, CyValue upper, CyValue step);
CyValue cyv_getattr(CyValue obj, const char *name);
void cyv_setattr(CyValue obj, const char *name, CyValue value);

CyValue cyv_list(int n, ...);
CyValue cyv_tuple(int n, ...);
CyValue cyv_set(int n, ...);
CyValue cyv_dict(int n, ...);

CyValue cyv_call(CyValue callee, int argc, ...);
CyValue cyv_invoke(CyValue receiver, const char *name, int argc, ...);
CyValue cyv_func(CyFn fn, int arity);
CyValue cyv_func_env(CyFn fn, int arity, void *env);
CyValue cyv_builtin(const char *name);
CyValue cyv_class_new(const char *name, CyValue base);

CyIter cyv_iter(CyValue seq);
int cyv_iter_next(CyIter *iter, CyValue *out);

void cyB_raise(CyValue exc);
void cyB_reraise(void);
int cyB_try_enter(CyTryFrame *frame);
void cyB_try_exit(CyTryFrame *frame);
int cyB_exc_matches(CyValue cls);
CyValue cyB_exc_value(void);
int cyB_exc_pending(void);

CyValue cyB_print(int argc, ...);
CyValue cyB_len(int argc, ...);
CyValue cyB_range(int argc, ...);
CyValue cyB_abs(int argc, ...);
CyValue cyB_min(int argc, ...);
CyValue cyB_max(int argc, ...);
CyValue cyB_sum(int argc, ...);
CyValue cyB_str(int argc, ...);
CyValue cyB_int(int argc, ...);
CyValue cyB_float(int argc, ...);
CyValue cyB_bool(int argc, ...);
CyValue cyB_list(int argc, ...);
CyValue cyB_tuple(int argc, ...);
CyValue cyB_set(int argc, ...);
CyValue cyB_dict(int argc, ...);
CyValue cyB_object(int argc, ...);
CyValue cyB_Exception(int argc, ...);
";

impl<'s> Emitter<'s> {
    pub(crate) fn emit_module<'a>(&mut self, module: &'a Module<'a>) -> CodegenResult<()> {
        self.emit_static_declarations();

        self.source.line("int main(void) {");
        let decls = self.source.insertion_point();
        let body = self.source.insertion_point();
        self.source.line("return 0;");
        self.source.line("}");

        let mut ctx = FuncCtx::new(self.symbols.module_scope(), body, decls);
        ctx.body.line("cyB_init();");
        self.emit_stmts(&mut ctx, module.body)?;
        self.finish_ctx(ctx);
        Ok(())
    }

    /// File-scope object variables: module-level names, class methods
    /// and class objects. All zero-initialized `CyValue`s.
    fn emit_static_declarations(&mut self) {
        let symbols = self.symbols;
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for id in 0..symbols.scope_count() {
            let scope = symbols.scope(id);
            let at_module = id == symbols.module_scope();
            let in_class = scope.kind == ScopeKind::Class;
            if !at_module && !in_class {
                continue;
            }
            for &eid in scope.entries.values() {
                let entry = symbols.entry(eid);
                if entry.visibility == Visibility::Extern
                    || entry.defining.is_some()
                    || entry.flags.in_carrier
                {
                    continue;
                }
                // Plain class attributes live on the class object.
                if in_class && !entry.flags.is_function && !entry.flags.is_type {
                    continue;
                }
                if seen.insert(entry.cname.clone()) {
                    names.push(entry.cname.clone());
                }
            }
        }
        names.sort();
        for name in names {
            self.statics.line(&format!("static CyValue {};", name));
        }
    }

    fn finish_ctx(&mut self, ctx: FuncCtx<'_>) {
        for temp in ctx.temps.declarations() {
            ctx.decls.line(&format!("{} {};", temp.c_type, temp.name));
        }
        ctx.labels.finalize();
    }

    pub(crate) fn emit_function<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        s: &'a FuncDefStmt<'a>,
    ) -> CodegenResult<()> {
        let symbols = self.symbols;
        let scope_id = self
            .child_scope(ctx.scope, s.name)
            .ok_or_else(|| CodegenError::Internal(format!("no scope for function {}", s.name)))?;
        let &object_entry = symbols
            .scope(ctx.scope)
            .entries
            .get(s.name)
            .ok_or_else(|| CodegenError::Internal(format!("no entry for function {}", s.name)))?;
        let object = symbols.entry(object_entry).cname.clone();
        let fn_name = format!("{}_fn", object);

        let scope = symbols.scope(scope_id);
        let needs_env = self.needs_env(scope_id);

        let mut params: Vec<String> = Vec::new();
        if needs_env {
            let owner = scope.carrier_link.ok_or_else(|| {
                CodegenError::Internal(format!("function {} has no carrier link", s.name))
            })?;
            let carrier = self.carrier_name(owner)?;
            params.push(format!("struct {} *__cyenv", carrier));
        }
        for &pid in &scope.params {
            params.push(format!("CyValue {}", symbols.entry(pid).cname));
        }
        let signature = format!(
            "static CyValue {}({})",
            fn_name,
            if params.is_empty() {
                "void".to_string()
            } else {
                params.join(", ")
            }
        );
        self.protos.line(&format!("{};", signature));

        let writer = self.funcs.clone();
        writer.line(&format!("{} {{", signature));
        let decls = writer.insertion_point();
        let body = writer.insertion_point();
        writer.line("return cyv_none();");
        writer.line("}");
        writer.newline();

        let mut inner = FuncCtx::new(scope_id, body, decls);

        if scope.needs_closure {
            let carrier = self.carrier_name(scope_id)?;
            self.structs.line(&format!("struct {} {{", carrier));
            // A carrier nested under another carrier embeds a link to
            // it, so captures that skip this scope stay reachable.
            if let Some(outer) = scope.carrier_link {
                self.structs
                    .line(&format!("struct {} *__cyouter;", self.carrier_name(outer)?));
            }
            for &cid in &scope.captured {
                self.structs
                    .line(&format!("CyValue {};", symbols.entry(cid).cname));
            }
            self.structs.line("};");
            self.structs.newline();

            inner
                .decls
                .line(&format!("struct {} __cyclosure;", carrier));
            if scope.carrier_link.is_some() {
                inner.body.line("__cyclosure.__cyouter = __cyenv;");
            }
            // Captured parameters relocate onto the carrier on entry.
            for &cid in &scope.captured {
                let captured = symbols.entry(cid);
                if captured.flags.is_param {
                    inner.body.line(&format!(
                        "__cyclosure.{} = {};",
                        captured.cname, captured.cname
                    ));
                }
            }
        }

        // Locals that are neither parameters nor carrier-resident.
        let mut locals: Vec<String> = Vec::new();
        for &eid in scope.entries.values() {
            let entry = symbols.entry(eid);
            if entry.flags.is_param
                || entry.defining.is_some()
                || entry.flags.in_carrier
                || entry.visibility == Visibility::Extern
            {
                continue;
            }
            locals.push(entry.cname.clone());
        }
        locals.sort();
        for local in locals {
            inner.decls.line(&format!("CyValue {};", local));
        }

        self.emit_stmts(&mut inner, s.body)?;
        self.finish_ctx(inner);

        // Bind the callable object where the definition executes.
        let arity = scope.params.len();
        if needs_env {
            let owner = scope.carrier_link.ok_or_else(|| {
                CodegenError::Internal(format!("function {} has no carrier link", s.name))
            })?;
            let env = self.env_argument(ctx, owner);
            ctx.body.line(&format!(
                "{} = cyv_func_env((CyFn){}, {}, {});",
                object, fn_name, arity, env
            ));
        } else {
            ctx.body.line(&format!(
                "{} = cyv_func((CyFn){}, {});",
                object, fn_name, arity
            ));
        }

        // Methods are also installed on their class object.
        if symbols.scope(ctx.scope).kind == ScopeKind::Class {
            let class = self.class_object(ctx.scope);
            ctx.body
                .line(&format!("cyv_setattr({}, \"{}\", {});", class, s.name, object));
        }
        Ok(())
    }

    pub(crate) fn emit_class<'a>(
        &mut self,
        ctx: &mut FuncCtx<'a>,
        s: &'a ClassDefStmt<'a>,
    ) -> CodegenResult<()> {
        let symbols = self.symbols;
        let scope_id = self
            .child_scope(ctx.scope, s.name)
            .ok_or_else(|| CodegenError::Internal(format!("no scope for class {}", s.name)))?;
        let &class_entry = symbols
            .scope(ctx.scope)
            .entries
            .get(s.name)
            .ok_or_else(|| CodegenError::Internal(format!("no entry for class {}", s.name)))?;
        let class = symbols.entry(class_entry).cname.clone();

        let base = match s.bases.first() {
            Some(base) => self.emit_expr(ctx, base)?,
            None => "cyv_none()".to_string(),
        };
        ctx.body.line(&format!(
            "{} = cyv_class_new(\"{}\", {});",
            class, s.name, base
        ));

        // The class body executes inline in the current function, but
        // names resolve and bind in the class scope.
        let saved = ctx.scope;
        ctx.scope = scope_id;
        let result = self.emit_stmts(ctx, s.body);
        ctx.scope = saved;
        result
    }

    fn carrier_name(&self, scope_id: cypress_parser::semantic::symbol::ScopeId) -> CodegenResult<String> {
        self.symbols
            .scope(scope_id)
            .carrier_name
            .clone()
            .ok_or_else(|| {
                CodegenError::Internal(format!(
                    "scope {} has no closure carrier",
                    self.symbols.scope(scope_id).name
                ))
            })
    }
}
