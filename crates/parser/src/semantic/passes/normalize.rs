//! Pass 1: body normalization.
//!
//! Rebuilds the tree so every block body is a uniform statement list
//! with no redundant `pass` filler; later passes never special-case
//! single-statement suites or placeholder statements.

use super::rewrite::{walk_stmt, Rewriter, StmtList};
use crate::arena::Arena;
use crate::ast::{Module, Stmt};
use smallvec::SmallVec;

pub struct Normalize<'a> {
    arena: &'a Arena,
}

impl<'a> Normalize<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Normalize { arena }
    }

    pub fn run(&mut self, module: &Module<'a>) -> &'a Module<'a> {
        let body = self.rewrite_body(module.body);
        self.arena.alloc(Module {
            body,
            span: module.span,
        })
    }
}

impl<'a> Rewriter<'a> for Normalize<'a> {
    fn arena(&self) -> &'a Arena {
        self.arena
    }

    fn rewrite_stmt(&mut self, stmt: &Stmt<'a>) -> StmtList<'a> {
        walk_stmt(self, stmt)
    }

    fn rewrite_body(&mut self, body: &[Stmt<'a>]) -> &'a [Stmt<'a>] {
        let mut out: Vec<Stmt<'a>> = Vec::with_capacity(body.len());
        for stmt in body {
            let stmts: SmallVec<[Stmt<'a>; 1]> = self.rewrite_stmt(stmt);
            out.extend(stmts);
        }

        // `pass` is only meaningful as the sole statement of a suite.
        if out.len() > 1 {
            out.retain(|s| !matches!(s, Stmt::Pass(_)));
        }
        self.arena.alloc_slice_vec(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::ast::Stmt;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn normalized<'a>(arena: &'a Arena, source: &str) -> &'a Module<'a> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, arena);
        let module = parser.parse_module().expect("parse failed");
        Normalize::new(arena).run(module)
    }

    #[test]
    fn redundant_pass_is_dropped() {
        let arena = Arena::new();
        let module = normalized(&arena, "if x:\n    pass\n    y = 1\n");
        match &module.body[0] {
            Stmt::If(s) => {
                assert_eq!(s.body.len(), 1);
                assert!(matches!(s.body[0], Stmt::Assign(_)));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn lone_pass_survives() {
        let arena = Arena::new();
        let module = normalized(&arena, "if x:\n    pass\n");
        match &module.body[0] {
            Stmt::If(s) => assert!(matches!(s.body[0], Stmt::Pass(_))),
            other => panic!("expected if, got {other:?}"),
        }
    }
}
