//! Tests for closure capture analysis through the public pipeline.

use cypress_parser::analyze;
use cypress_parser::semantic::symbol::{Scope, ScopeKind, SymbolTable};

fn scope_named<'a>(symbols: &'a SymbolTable, name: &str) -> &'a Scope {
    (0..symbols.scope_count())
        .map(|id| symbols.scope(id))
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no scope named {name}"))
}

#[test]
fn simple_capture_promotes_the_owner_to_a_carrier() {
    let source = r#"
def outer():
    x = 10
    def inner():
        return x
    return inner
"#;
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());

    let outer = scope_named(&output.symbols, "outer");
    assert!(outer.needs_closure);
    assert_eq!(outer.carrier_name.as_deref(), Some("__cyclosure_outer"));

    let &x = outer.entries.get("x").expect("x in outer");
    let x = output.symbols.entry(x);
    assert!(x.flags.is_captured);
    assert!(x.flags.in_carrier);

    // inner holds a view entry sharing the defining entry's state.
    let inner = scope_named(&output.symbols, "inner");
    let &view = inner.entries.get("x").expect("view of x in inner");
    let view = output.symbols.entry(view);
    assert!(view.is_inner_view());
    assert!(output.symbols.entry_is_captured(view.id));
}

#[test]
fn nested_capture_links_to_the_nearest_carrier() {
    let source = r#"
def outer():
    a = 1
    def middle():
        b = 2
        def inner():
            return a + b
        return inner
    return middle
"#;
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());

    let outer = scope_named(&output.symbols, "outer");
    let middle = scope_named(&output.symbols, "middle");
    let inner = scope_named(&output.symbols, "inner");

    assert!(outer.needs_closure);
    assert!(middle.needs_closure);
    assert!(!inner.needs_closure);
    assert_eq!(inner.carrier_link, Some(middle.id));
}

#[test]
fn calling_a_sibling_function_is_not_a_capture() {
    let source = r#"
def outer():
    def helper():
        return 1
    def caller():
        return helper()
    return caller()
"#;
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());

    let outer = scope_named(&output.symbols, "outer");
    assert!(!outer.needs_closure);
    let &helper = outer.entries.get("helper").expect("helper entry");
    assert!(!output.symbols.entry(helper).flags.is_captured);
}

#[test]
fn nonlocal_write_captures_like_a_read() {
    let source = r#"
def counter():
    count = 0
    def bump():
        nonlocal count
        count = count + 1
        return count
    return bump
"#;
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());

    let counter = scope_named(&output.symbols, "counter");
    assert!(counter.needs_closure);
    let &count = counter.entries.get("count").expect("count entry");
    assert!(output.symbols.entry(count).flags.in_carrier);
}

#[test]
fn class_scopes_never_become_carriers() {
    let source = r#"
class Box:
    size = 3
    def grow(self):
        return self
"#;
    let output = analyze(source).expect("analysis failed");
    assert!(!output.has_errors());

    let class_scope = scope_named(&output.symbols, "Box");
    assert_eq!(class_scope.kind, ScopeKind::Class);
    assert!(!class_scope.needs_closure);
}
