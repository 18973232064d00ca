//! Parser-level tests over the public API: operator shapes, statement
//! structure and error recovery.

use cypress_parser::ast::{expr_to_string, Expr, Stmt};
use cypress_parser::parse;

fn first_value(source: &str) -> String {
    let output = parse(source).expect("parse failed");
    assert!(output.diagnostics.is_empty(), "unexpected diagnostics");
    match &output.module.body[0] {
        Stmt::Assign(s) => expr_to_string(&s.value),
        Stmt::Expr(s) => expr_to_string(&s.value),
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(first_value("r = 1 + 2 * 3\n"), "(1 + (2 * 3))");
}

#[test]
fn power_is_right_associative_and_beats_unary_minus() {
    assert_eq!(first_value("r = 2 ** 3 ** 2\n"), "(2 ** (3 ** 2))");
    assert_eq!(first_value("r = -2 ** 2\n"), "(-(2 ** 2))");
}

#[test]
fn comparison_cascades_stay_flat() {
    let output = parse("r = a < b <= c\n").expect("parse failed");
    let Stmt::Assign(s) = &output.module.body[0] else {
        panic!("expected assignment");
    };
    let Expr::Compare(cmp) = &s.value else {
        panic!("expected comparison");
    };
    assert_eq!(cmp.ops, ["<", "<="]);
    assert_eq!(cmp.comparators.len(), 2);
}

#[test]
fn boolean_chains_stay_flat() {
    let output = parse("r = a and b and c\n").expect("parse failed");
    let Stmt::Assign(s) = &output.module.body[0] else {
        panic!("expected assignment");
    };
    let Expr::BoolOp(b) = &s.value else {
        panic!("expected boolean chain");
    };
    assert_eq!(b.values.len(), 3);
}

#[test]
fn trailing_if_belongs_to_the_comprehension() {
    let output = parse("r = [x for x in xs if x]\n").expect("parse failed");
    let Stmt::Assign(s) = &output.module.body[0] else {
        panic!("expected assignment");
    };
    let Expr::ListComp(c) = &s.value else {
        panic!("expected list comprehension");
    };
    assert_eq!(c.generators.len(), 1);
    assert_eq!(c.generators[0].ifs.len(), 1);
}

#[test]
fn ternary_condition_takes_the_comprehension_slot_only_after_for() {
    // No `for` ahead: this is a one-element list of a ternary.
    let output = parse("r = [x if x else y]\n").expect("parse failed");
    let Stmt::Assign(s) = &output.module.body[0] else {
        panic!("expected assignment");
    };
    let Expr::List(l) = &s.value else {
        panic!("expected list display");
    };
    assert!(matches!(l.elts[0], Expr::IfExp(_)));
}

#[test]
fn chained_assignment_keeps_all_targets() {
    let output = parse("a = b = c = 1\n").expect("parse failed");
    let Stmt::Assign(s) = &output.module.body[0] else {
        panic!("expected assignment");
    };
    assert_eq!(s.targets.len(), 3);
}

#[test]
fn recovery_resumes_at_the_next_statement() {
    let output = parse("x = = 1\ny = 2\n").expect("parse failed");
    assert!(!output.diagnostics.is_empty());
    assert!(output
        .module
        .body
        .iter()
        .any(|s| matches!(s, Stmt::Assign(a) if expr_to_string(&a.value) == "2")));
}

#[test]
fn errors_carry_positions_for_ordering() {
    let output = parse("x = = 1\nz = = 3\n").expect("parse failed");
    assert!(output.diagnostics.len() >= 2);
    let spans: Vec<u32> = output
        .diagnostics
        .iter()
        .map(|d| d.span.start().into())
        .collect();
    let mut sorted = spans.clone();
    sorted.sort_unstable();
    assert_eq!(spans, sorted);
}

#[test]
fn multiple_inheritance_is_rejected() {
    let output = parse("class C(A, B):\n    pass\n");
    match output {
        Ok(out) => assert!(!out.diagnostics.is_empty()),
        Err(_) => {}
    }
}
