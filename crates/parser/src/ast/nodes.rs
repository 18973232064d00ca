//! Core AST node definitions (Module and statements).

use super::expr::Expr;
use text_size::TextRange;

/// A module (root AST node).
#[derive(Debug, Clone)]
pub struct Module<'a> {
    pub body: &'a [Stmt<'a>],
    pub span: TextRange,
}

/// Statement types.
#[derive(Debug, Clone)]
pub enum Stmt<'a> {
    Expr(ExprStmt<'a>),
    Assign(AssignStmt<'a>),
    AnnAssign(AnnAssignStmt<'a>),
    AugAssign(AugAssignStmt<'a>),
    Return(ReturnStmt<'a>),
    If(IfStmt<'a>),
    While(WhileStmt<'a>),
    For(ForStmt<'a>),
    FuncDef(FuncDefStmt<'a>),
    ClassDef(ClassDefStmt<'a>),
    Pass(TextRange),
    Break(TextRange),
    Continue(TextRange),
    Raise(RaiseStmt<'a>),
    Try(TryStmt<'a>),
    With(WithStmt<'a>),
    Global(GlobalStmt<'a>),
    Nonlocal(NonlocalStmt<'a>),
}

impl<'a> Stmt<'a> {
    pub fn span(&self) -> TextRange {
        match self {
            Stmt::Expr(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::AnnAssign(s) => s.span,
            Stmt::AugAssign(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::FuncDef(s) => s.span,
            Stmt::ClassDef(s) => s.span,
            Stmt::Pass(s) | Stmt::Break(s) | Stmt::Continue(s) => *s,
            Stmt::Raise(s) => s.span,
            Stmt::Try(s) => s.span,
            Stmt::With(s) => s.span,
            Stmt::Global(s) => s.span,
            Stmt::Nonlocal(s) => s.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExprStmt<'a> {
    pub value: Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct AssignStmt<'a> {
    /// Multiple targets encode chained assignment (`a = b = e`); a tuple
    /// target encodes parallel assignment, flattened by the lowering pass.
    pub targets: &'a [Expr<'a>],
    pub value: Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct AnnAssignStmt<'a> {
    pub target: Expr<'a>,
    pub annotation: Expr<'a>,
    pub value: Option<Expr<'a>>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct AugAssignStmt<'a> {
    pub target: Expr<'a>,
    /// The base operator (`+` for `+=`).
    pub op: &'a str,
    pub value: Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt<'a> {
    pub value: Option<Expr<'a>>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct IfStmt<'a> {
    pub test: Expr<'a>,
    pub body: &'a [Stmt<'a>],
    pub orelse: &'a [Stmt<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct WhileStmt<'a> {
    pub test: Expr<'a>,
    pub body: &'a [Stmt<'a>],
    pub orelse: &'a [Stmt<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct ForStmt<'a> {
    pub target: Expr<'a>,
    pub iter: Expr<'a>,
    pub body: &'a [Stmt<'a>],
    pub orelse: &'a [Stmt<'a>],
    pub span: TextRange,
}

/// One formal parameter (name, optional annotation, optional default).
#[derive(Debug, Clone)]
pub struct Param<'a> {
    pub name: &'a str,
    pub annotation: Option<&'a Expr<'a>>,
    pub default: Option<&'a Expr<'a>>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct FuncDefStmt<'a> {
    pub name: &'a str,
    pub params: &'a [Param<'a>],
    pub returns: Option<&'a Expr<'a>>,
    pub body: &'a [Stmt<'a>],
    pub decorators: &'a [Expr<'a>],
    /// Set for functions synthesized by desugaring (lambdas,
    /// comprehensions); these never re-enter decorator expansion.
    pub is_synthesized: bool,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct ClassDefStmt<'a> {
    pub name: &'a str,
    /// At most one base (single inheritance).
    pub bases: &'a [Expr<'a>],
    pub body: &'a [Stmt<'a>],
    pub decorators: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct RaiseStmt<'a> {
    pub exc: Option<Expr<'a>>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct ExceptHandler<'a> {
    pub ty: Option<Expr<'a>>,
    pub name: Option<&'a str>,
    pub body: &'a [Stmt<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct TryStmt<'a> {
    pub body: &'a [Stmt<'a>],
    pub handlers: &'a [ExceptHandler<'a>],
    pub orelse: &'a [Stmt<'a>],
    pub finalbody: &'a [Stmt<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct WithItem<'a> {
    pub context: Expr<'a>,
    pub target: Option<Expr<'a>>,
}

#[derive(Debug, Clone)]
pub struct WithStmt<'a> {
    pub items: &'a [WithItem<'a>],
    pub body: &'a [Stmt<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct GlobalStmt<'a> {
    pub names: &'a [&'a str],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct NonlocalStmt<'a> {
    pub names: &'a [&'a str],
    pub span: TextRange,
}
