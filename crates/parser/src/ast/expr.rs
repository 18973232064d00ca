//! Expression AST nodes.

use super::nodes::Param;
use text_size::TextRange;

/// What a constant literal denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Int,
    Float,
    Str,
    Bool,
    None,
}

/// Expression types.
#[derive(Debug, Clone)]
pub enum Expr<'a> {
    Constant(ConstantExpr<'a>),
    Name(NameExpr<'a>),
    BinOp(BinOpExpr<'a>),
    UnaryOp(UnaryOpExpr<'a>),
    BoolOp(BoolOpExpr<'a>),
    Compare(CompareExpr<'a>),
    Call(CallExpr<'a>),
    Attribute(AttributeExpr<'a>),
    Subscript(SubscriptExpr<'a>),
    Slice(SliceExpr<'a>),
    List(ListExpr<'a>),
    Tuple(TupleExpr<'a>),
    Set(SetExpr<'a>),
    Dict(DictExpr<'a>),
    IfExp(IfExpExpr<'a>),
    Lambda(LambdaExpr<'a>),
    ListComp(CompExpr<'a>),
    SetComp(CompExpr<'a>),
    GeneratorExp(CompExpr<'a>),
    DictComp(DictCompExpr<'a>),
}

impl<'a> Expr<'a> {
    pub fn span(&self) -> TextRange {
        match self {
            Expr::Constant(e) => e.span,
            Expr::Name(e) => e.span,
            Expr::BinOp(e) => e.span,
            Expr::UnaryOp(e) => e.span,
            Expr::BoolOp(e) => e.span,
            Expr::Compare(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Attribute(e) => e.span,
            Expr::Subscript(e) => e.span,
            Expr::Slice(e) => e.span,
            Expr::List(e) => e.span,
            Expr::Tuple(e) => e.span,
            Expr::Set(e) => e.span,
            Expr::Dict(e) => e.span,
            Expr::IfExp(e) => e.span,
            Expr::Lambda(e) => e.span,
            Expr::ListComp(e) | Expr::SetComp(e) | Expr::GeneratorExp(e) => e.span,
            Expr::DictComp(e) => e.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantExpr<'a> {
    /// Literal text as written (strings keep their quotes).
    pub value: &'a str,
    pub kind: ConstantKind,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct NameExpr<'a> {
    pub id: &'a str,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct BinOpExpr<'a> {
    pub left: &'a Expr<'a>,
    pub op: &'a str,
    pub right: &'a Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct UnaryOpExpr<'a> {
    pub op: &'a str,
    pub operand: &'a Expr<'a>,
    pub span: TextRange,
}

/// Flat n-ary `and`/`or` chain; short-circuit evaluation is preserved by
/// keeping the chain flat instead of nesting binary nodes.
#[derive(Debug, Clone)]
pub struct BoolOpExpr<'a> {
    pub op: &'a str,
    pub values: &'a [Expr<'a>],
    pub span: TextRange,
}

/// Cascaded comparison (`a < b < c`): one left operand threaded through a
/// list of (op, comparator) pairs, each comparator evaluated once.
#[derive(Debug, Clone)]
pub struct CompareExpr<'a> {
    pub left: &'a Expr<'a>,
    pub ops: &'a [&'a str],
    pub comparators: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct CallExpr<'a> {
    pub func: &'a Expr<'a>,
    pub args: &'a [Expr<'a>],
    pub keywords: &'a [Keyword<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct Keyword<'a> {
    pub arg: &'a str,
    pub value: Expr<'a>,
}

#[derive(Debug, Clone)]
pub struct AttributeExpr<'a> {
    pub value: &'a Expr<'a>,
    pub attr: &'a str,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct SubscriptExpr<'a> {
    pub value: &'a Expr<'a>,
    pub slice: &'a Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct SliceExpr<'a> {
    pub lower: Option<&'a Expr<'a>>,
    pub upper: Option<&'a Expr<'a>>,
    pub step: Option<&'a Expr<'a>>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct ListExpr<'a> {
    pub elts: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct TupleExpr<'a> {
    pub elts: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct SetExpr<'a> {
    pub elts: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct DictExpr<'a> {
    pub keys: &'a [Expr<'a>],
    pub values: &'a [Expr<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct IfExpExpr<'a> {
    pub test: &'a Expr<'a>,
    pub body: &'a Expr<'a>,
    pub orelse: &'a Expr<'a>,
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct LambdaExpr<'a> {
    pub params: &'a [Param<'a>],
    pub body: &'a Expr<'a>,
    pub span: TextRange,
}

/// One `for target in iter [if cond]*` clause of a comprehension.
#[derive(Debug, Clone)]
pub struct Comprehension<'a> {
    pub target: Expr<'a>,
    pub iter: Expr<'a>,
    pub ifs: &'a [Expr<'a>],
}

/// List/set/generator comprehension body.
#[derive(Debug, Clone)]
pub struct CompExpr<'a> {
    pub elt: &'a Expr<'a>,
    pub generators: &'a [Comprehension<'a>],
    pub span: TextRange,
}

#[derive(Debug, Clone)]
pub struct DictCompExpr<'a> {
    pub key: &'a Expr<'a>,
    pub value: &'a Expr<'a>,
    pub generators: &'a [Comprehension<'a>],
    pub span: TextRange,
}
