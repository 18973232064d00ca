//! Recursive-descent parser over the indentation-aware token stream.
//!
//! Statement productions live in [`stmt`], the expression precedence
//! ladder in [`expr`], and the parser state plus cursor helpers in
//! [`types`].

mod expr;
mod stmt;
mod types;

pub use types::Parser;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::ast::{expr_to_string, Expr, Stmt};
    use crate::lexer::Lexer;

    fn parse_source<'a>(arena: &'a Arena, source: &str) -> &'a crate::ast::Module<'a> {
        let lexer = Lexer::new(arena.alloc_str(source));
        let mut parser = Parser::new(lexer, arena);
        let module = parser.parse_module().expect("parse failed");
        assert!(parser.errors().is_empty(), "errors: {:?}", parser.errors());
        module
    }

    fn first_expr<'a>(module: &'a crate::ast::Module<'a>) -> &'a Expr<'a> {
        match &module.body[0] {
            Stmt::Expr(e) => &e.value,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let arena = Arena::new();
        let module = parse_source(&arena, "1 + 2 * 3\n");
        assert_eq!(expr_to_string(first_expr(module)), "(1 + (2 * 3))");
    }

    #[test]
    fn power_is_right_associative() {
        let arena = Arena::new();
        let module = parse_source(&arena, "2 ** 3 ** 2\n");
        assert_eq!(expr_to_string(first_expr(module)), "(2 ** (3 ** 2))");
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let arena = Arena::new();
        let module = parse_source(&arena, "-2 ** 2\n");
        assert_eq!(expr_to_string(first_expr(module)), "(-(2 ** 2))");
    }

    #[test]
    fn cascaded_comparison_stays_flat() {
        let arena = Arena::new();
        let module = parse_source(&arena, "a < b <= c\n");
        match first_expr(module) {
            Expr::Compare(cmp) => {
                assert_eq!(cmp.ops, ["<", "<="]);
                assert_eq!(cmp.comparators.len(), 2);
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn bool_chain_collapses_to_one_node() {
        let arena = Arena::new();
        let module = parse_source(&arena, "a and b and c\n");
        match first_expr(module) {
            Expr::BoolOp(b) => {
                assert_eq!(b.op, "and");
                assert_eq!(b.values.len(), 3);
            }
            other => panic!("expected bool op, got {other:?}"),
        }
    }

    #[test]
    fn two_word_comparison_operators() {
        let arena = Arena::new();
        let module = parse_source(&arena, "a is not b\nx not in xs\n");
        match first_expr(module) {
            Expr::Compare(cmp) => assert_eq!(cmp.ops, ["is not"]),
            other => panic!("expected comparison, got {other:?}"),
        }
        match &module.body[1] {
            Stmt::Expr(e) => match &e.value {
                Expr::Compare(cmp) => assert_eq!(cmp.ops, ["not in"]),
                other => panic!("expected comparison, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn list_comprehension_disambiguates_on_for() {
        let arena = Arena::new();
        let module = parse_source(&arena, "[x * x for x in xs if x > 0]\n");
        match first_expr(module) {
            Expr::ListComp(comp) => {
                assert_eq!(comp.generators.len(), 1);
                assert_eq!(comp.generators[0].ifs.len(), 1);
            }
            other => panic!("expected list comprehension, got {other:?}"),
        }
    }

    #[test]
    fn brace_display_splits_dict_from_set() {
        let arena = Arena::new();
        let module = parse_source(&arena, "{1: 2}\n{1, 2}\n{}\n");
        assert!(matches!(first_expr(module), Expr::Dict(_)));
        assert!(matches!(
            &module.body[1],
            Stmt::Expr(e) if matches!(&e.value, Expr::Set(_))
        ));
        assert!(matches!(
            &module.body[2],
            Stmt::Expr(e) if matches!(&e.value, Expr::Dict(d) if d.keys.is_empty())
        ));
    }

    #[test]
    fn parenthesized_tuple_and_grouping() {
        let arena = Arena::new();
        let module = parse_source(&arena, "(1 + 2)\n(1, 2)\n()\n");
        assert!(matches!(first_expr(module), Expr::BinOp(_)));
        assert!(matches!(
            &module.body[1],
            Stmt::Expr(e) if matches!(&e.value, Expr::Tuple(t) if t.elts.len() == 2)
        ));
        assert!(matches!(
            &module.body[2],
            Stmt::Expr(e) if matches!(&e.value, Expr::Tuple(t) if t.elts.is_empty())
        ));
    }

    #[test]
    fn chained_assignment_collects_targets() {
        let arena = Arena::new();
        let module = parse_source(&arena, "a = b = 1\n");
        match &module.body[0] {
            Stmt::Assign(assign) => assert_eq!(assign.targets.len(), 2),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parallel_assignment_targets_are_tuples() {
        let arena = Arena::new();
        let module = parse_source(&arena, "a, b = b, a\n");
        match &module.body[0] {
            Stmt::Assign(assign) => {
                assert!(matches!(assign.targets[0], Expr::Tuple(_)));
                assert!(matches!(assign.value, Expr::Tuple(_)));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn elif_chain_nests_in_orelse() {
        let arena = Arena::new();
        let module = parse_source(
            &arena,
            "if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n",
        );
        match &module.body[0] {
            Stmt::If(outer) => match &outer.orelse[0] {
                Stmt::If(inner) => assert_eq!(inner.orelse.len(), 1),
                other => panic!("expected nested if, got {other:?}"),
            },
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let arena = Arena::new();
        let lexer = Lexer::new(arena.alloc_str("break\n"));
        let mut parser = Parser::new(lexer, &arena);
        let _ = parser.parse_module();
        assert!(!parser.errors().is_empty());
    }

    #[test]
    fn invalid_assignment_target_is_rejected() {
        let arena = Arena::new();
        let lexer = Lexer::new(arena.alloc_str("f() = 1\n"));
        let mut parser = Parser::new(lexer, &arena);
        let _ = parser.parse_module();
        assert!(!parser.errors().is_empty());
    }

    #[test]
    fn recovery_continues_after_bad_statement() {
        let arena = Arena::new();
        let lexer = Lexer::new(arena.alloc_str("x = = 1\ny = 2\n"));
        let mut parser = Parser::new(lexer, &arena);
        let module = parser.parse_module().expect("parse failed");
        assert!(!parser.errors().is_empty());
        assert!(module
            .body
            .iter()
            .any(|s| matches!(s, Stmt::Assign(a) if matches!(a.targets[0], Expr::Name(ref n) if n.id == "y"))));
    }

    #[test]
    fn function_with_defaults_and_annotations() {
        let arena = Arena::new();
        let module = parse_source(&arena, "def f(a: int, b: int = 0) -> int:\n    return a + b\n");
        match &module.body[0] {
            Stmt::FuncDef(f) => {
                assert_eq!(f.name, "f");
                assert_eq!(f.params.len(), 2);
                assert!(f.params[0].annotation.is_some());
                assert!(f.params[1].default.is_some());
                assert!(f.returns.is_some());
            }
            other => panic!("expected function, got {other:?}"),
        }
    }
}
