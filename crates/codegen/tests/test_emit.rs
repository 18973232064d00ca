//! End-to-end emission tests: source text through the full pipeline to
//! generated C, asserting on the shape of the output.

use cypress_codegen::{emit, COutput};
use cypress_parser::analyze;

fn compile(source: &str) -> COutput {
    let output = analyze(source).expect("analysis failed");
    let rendered: Vec<String> = output.diagnostics.iter().map(|d| d.render()).collect();
    assert!(!output.has_errors(), "diagnostics: {:?}", rendered);
    emit(output.module, &output.symbols, "program").expect("emission failed")
}

#[test]
fn module_body_runs_in_main() {
    let out = compile("x = 1\n");
    assert!(out.source.contains("int main(void) {"));
    assert!(out.source.contains("cyB_init();"));
    assert!(out.source.contains("static CyValue cy_x;"));
    assert!(out.source.contains("cy_x = cyv_int(1L);"));
    assert!(out.header.contains("#ifndef CY_PROGRAM_H"));
}

#[test]
fn swap_goes_through_temporaries_right_side_first() {
    let out = compile("a = 1\nb = 2\na, b = b, a\n");
    let t0_store = out.source.find("__cytmp0 = cy_b;").expect("first temp");
    let t1_store = out.source.find("__cytmp1 = cy_a;").expect("second temp");
    let a_store = out.source.find("cy_a = __cytmp0;").expect("store to a");
    let b_store = out.source.find("cy_b = __cytmp1;").expect("store to b");
    assert!(t0_store < t1_store);
    assert!(t1_store < a_store);
    assert!(a_store < b_store);
}

#[test]
fn functions_compile_to_c_functions_with_callable_objects() {
    let out = compile("def add(a, b):\n    return a + b\nr = add(1, 2)\n");
    assert!(out
        .source
        .contains("static CyValue cy_add_fn(CyValue cy_a, CyValue cy_b);"));
    assert!(out.source.contains("return cyv_add(cy_a, cy_b);"));
    assert!(out.source.contains("cy_add = cyv_func((CyFn)cy_add_fn, 2);"));
    assert!(out
        .source
        .contains("cy_r = cyv_call(cy_add, 2, cyv_int(1L), cyv_int(2L));"));
}

#[test]
fn builtins_are_called_directly() {
    let out = compile("print(1)\n");
    assert!(out.source.contains("cyB_print(1, cyv_int(1L));"));
}

#[test]
fn captured_state_routes_through_the_carrier() {
    let source = "def counter():\n    count = 0\n    def bump():\n        nonlocal count\n        count = count + 1\n        return count\n    return bump\n";
    let out = compile(source);
    assert!(out.header.contains("struct __cyclosure_counter {"));
    assert!(out.header.contains("CyValue cy_count;"));
    // Owner writes the carrier field, the inner function goes through
    // the environment pointer.
    assert!(out.source.contains("__cyclosure.cy_count = cyv_int(0L);"));
    assert!(out
        .source
        .contains("__cyenv->cy_count = cyv_add(__cyenv->cy_count, cyv_int(1L));"));
    assert!(out
        .source
        .contains("static CyValue cy_counter_bump_fn(struct __cyclosure_counter *__cyenv)"));
    assert!(out.source.contains(
        "cy_counter_bump = cyv_func_env((CyFn)cy_counter_bump_fn, 0, &__cyclosure);"
    ));
}

#[test]
fn captures_spanning_two_carriers_chain_through_the_outer_link() {
    let source = "def f():\n    x = 1\n    def g():\n        y = 2\n        def h():\n            return x + y\n        return h\n    return g\n";
    let out = compile(source);
    // The inner carrier embeds a pointer to the outer one, seeded by
    // its owner on entry.
    assert!(out.header.contains("struct __cyclosure_f *__cyouter;"));
    assert!(out
        .source
        .contains("static CyValue cy_f_g_fn(struct __cyclosure_f *__cyenv)"));
    assert!(out.source.contains("__cyclosure.__cyouter = __cyenv;"));
    // The deepest function reaches its grandparent's capture through
    // the chain and its parent's directly.
    assert!(out
        .source
        .contains("return cyv_add(__cyenv->__cyouter->cy_x, __cyenv->cy_y);"));
}

#[test]
fn capture_free_functions_take_no_environment() {
    let out = compile("def f():\n    def g():\n        return 1\n    return g()\n");
    assert!(out.source.contains("static CyValue cy_f_g_fn(void)"));
    assert!(!out.source.contains("__cyenv"));
    assert!(!out.header.contains("__cyclosure"));
}

#[test]
fn sibling_loops_reuse_iterator_temporaries() {
    let source = "xs = [1, 2]\nfor i in xs:\n    print(i)\nfor j in xs:\n    print(j)\n";
    let out = compile(source);
    assert_eq!(out.source.matches("CyIter __t").count(), 1);
    assert_eq!(out.source.matches("__t0 = cyv_iter(cy_xs);").count(), 2);
}

#[test]
fn try_with_handlers_emits_no_finally_label() {
    let out = compile("x = 0\ntry:\n    x = 1\nexcept:\n    x = 2\n");
    assert!(out.source.contains("cyB_try_enter"));
    assert!(!out.source.contains("__cyfin"));
}

#[test]
fn with_statement_jumps_to_an_emitted_finally_label() {
    let source = "def res():\n    return 0\nwith res() as f:\n    x = 1\n";
    let out = compile(source);
    assert!(out.source.contains("goto __cyfin0;"));
    assert_eq!(out.source.matches("__cyfin0: ;").count(), 1);
    assert!(out.source.contains("cyv_invoke(__cytmp0, \"__enter__\", 0)"));
    assert!(out.source.contains("cyv_invoke(__cytmp0, \"__exit__\", 0);"));
    assert!(out.source.contains("if (cyB_exc_pending()) cyB_reraise();"));
}

#[test]
fn cascaded_comparison_evaluates_middle_operand_once() {
    let out = compile("def f():\n    return 2\nok = 1 < f() <= 3\n");
    assert_eq!(out.source.matches("cyv_call(cy_f, 0)").count(), 1);
    assert!(out.source.contains("cyv_le(__t0, cyv_int(3L))"));
}

#[test]
fn classes_build_objects_and_install_methods() {
    let source = "class Point:\n    def __init__(self, x):\n        self.x = x\np = Point(3)\n";
    let out = compile(source);
    assert!(out
        .source
        .contains("cy_Point = cyv_class_new(\"Point\", cyv_none());"));
    assert!(out
        .source
        .contains("cyv_setattr(cy_Point, \"__init__\", cy_Point___init__);"));
    assert!(out.source.contains("cyv_setattr(cy_self, \"x\", cy_x);"));
    assert!(out.source.contains("cy_p = cyv_call(cy_Point, 1, cyv_int(3L));"));
}

#[test]
fn comprehensions_lower_to_synthesized_functions() {
    let source = "xs = [1, 2, 3]\nsquares = [i * i for i in xs]\n";
    let out = compile(source);
    assert!(out.source.contains("static CyValue __cycomp0_fn(CyValue __cyiter0)"));
    assert!(out.source.contains("cy_squares = cyv_call(__cycomp0, 1, cy_xs);"));
    assert!(out
        .source
        .contains("cyv_invoke(__cyres0, \"append\", 1, cyv_mul(cy_i, cy_i));"));
}

#[test]
fn short_circuit_or_keeps_the_first_truthy_value() {
    let out = compile("a = 0\nb = 1\nc = a or b\n");
    assert!(out
        .source
        .contains("cy_c = (__t0 = cy_a, cyv_truthy(__t0) ? __t0 : (cy_b));"));
}
