//! End-to-end pipeline behavior: diagnostics accumulation and the
//! shape of the lowered tree.

use cypress_parser::ast::module_to_source;
use cypress_parser::error::codes::ErrorCode;
use cypress_parser::{analyze, Severity};

#[test]
fn incompatible_redeclaration_reports_one_diagnostic() {
    let source = "def f():\n    pass\nclass f:\n    pass\n";
    let output = analyze(source).expect("analysis failed");
    let redeclarations = output
        .diagnostics
        .iter()
        .filter(|d| d.code == Some(ErrorCode::E3002))
        .count();
    assert_eq!(redeclarations, 1);
}

#[test]
fn use_before_declaration_is_a_warning_with_context() {
    let source = "def f():\n    y = x\n    x = 1\n    return y\n";
    let output = analyze(source).expect("analysis failed");
    let hits: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.code == Some(ErrorCode::E3003))
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Warning);
}

#[test]
fn errors_from_different_passes_all_surface() {
    // An undefined name and a type conflict come from different passes.
    let source = "x: int = \"text\"\nprint(missing)\n";
    let output = analyze(source).expect("analysis failed");
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == Some(ErrorCode::E3001)));
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == Some(ErrorCode::E4001)));
}

#[test]
fn parallel_swap_lowers_to_right_side_first_temporaries() {
    let output = analyze("a = 1\nb = 2\na, b = b, a\n").expect("analysis failed");
    assert!(!output.has_errors());
    let rendered = module_to_source(output.module);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(
        &lines[2..6],
        &["__cytmp0 = b", "__cytmp1 = a", "a = __cytmp0", "b = __cytmp1"]
    );
}

#[test]
fn decorators_expand_to_call_and_reassign() {
    let source = "def trace(f):\n    return f\n@trace\ndef greet():\n    return 1\n";
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());
    let rendered = module_to_source(output.module);
    assert!(rendered.contains("greet = trace(greet)"));
}

#[test]
fn lambdas_hoist_into_named_functions() {
    let output = analyze("double = lambda x: x * 2\ny = double(4)\n").expect("analysis failed");
    assert!(!output.has_errors());
    let rendered = module_to_source(output.module);
    assert!(rendered.contains("def __cylam0(x)"));
    assert!(rendered.contains("double = __cylam0"));
}

#[test]
fn comprehensions_analyze_without_diagnostics() {
    let source = "xs = [1, 2, 3]\nsquares = [i * i for i in xs]\nprint(squares)\n";
    let output = analyze(source).expect("analysis failed");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let rendered = module_to_source(output.module);
    assert!(rendered.contains("def __cycomp0"));
}

#[test]
fn return_outside_function_is_rejected() {
    let output = analyze("return 1\n");
    match output {
        Ok(out) => assert!(out.has_errors()),
        Err(_) => {}
    }
}

#[test]
fn recovery_collects_several_syntax_errors() {
    let source = "x = = 1\ny = 2\nz = = 3\nw = 4\n";
    let output = analyze(source).expect("analysis failed");
    let syntax_errors = output
        .diagnostics
        .iter()
        .filter(|d| d.severity >= Severity::Error)
        .count();
    assert!(syntax_errors >= 2);
}
