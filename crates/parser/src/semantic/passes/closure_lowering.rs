//! Pass 4: closure-carrier materialization.
//!
//! Declaration analysis already collected every scope's capture set;
//! this pass synthesizes carrier records bottom-up and relocates
//! captured entries onto them. The tree itself is untouched: captured
//! access is a storage-path property of the entry, and the emitter
//! routes reads and writes through the carrier when `in_carrier` is
//! set.

use crate::semantic::symbol::SymbolTable;

pub struct ClosureLowering<'s> {
    symbols: &'s mut SymbolTable,
}

impl<'s> ClosureLowering<'s> {
    pub fn new(symbols: &'s mut SymbolTable) -> Self {
        ClosureLowering { symbols }
    }

    pub fn run(&mut self) {
        self.symbols.materialize_closures();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::semantic::passes::declarations::Declarations;
    use crate::semantic::passes::name_resolution::NameResolution;

    fn analyzed(source: &str) -> SymbolTable {
        let arena = Arena::new();
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, &arena);
        let module = parser.parse_module().expect("parse failed");
        let mut errors = Vec::new();
        let module = Declarations::new(&arena, &mut errors).run(module);
        let mut symbols = SymbolTable::new();
        NameResolution::new(&mut symbols, &mut errors).run(module);
        assert!(errors.is_empty(), "{errors:?}");
        symbols.close_all_scopes();
        ClosureLowering::new(&mut symbols).run();
        symbols
    }

    fn scope_named(symbols: &SymbolTable, name: &str) -> usize {
        (0..symbols.scope_count())
            .find(|&id| symbols.scope(id).name == name)
            .unwrap_or_else(|| panic!("no scope named {name}"))
    }

    #[test]
    fn read_write_capture_promotes_outer_scope() {
        let symbols = analyzed(
            "def f():\n    x = 1\n    def g():\n        nonlocal x\n        x = x + 1\n    return g\n",
        );
        let f = scope_named(&symbols, "f");
        assert!(symbols.scope(f).needs_closure);
        let captured = symbols.scope(f).captured[0];
        assert!(symbols.entry(captured).flags.is_captured);
        assert!(symbols.entry(captured).flags.in_carrier);
    }

    #[test]
    fn inner_function_links_to_nearest_carrier() {
        let symbols = analyzed(
            "def f():\n    x = 1\n    def g():\n        def h():\n            return x\n        return h\n    return g\n",
        );
        let f = scope_named(&symbols, "f");
        let h = scope_named(&symbols, "h");
        assert_eq!(symbols.scope(h).carrier_link, Some(f));
    }

    #[test]
    fn capture_free_function_needs_no_carrier() {
        let symbols = analyzed("def f():\n    x = 1\n    return x\n");
        let f = scope_named(&symbols, "f");
        assert!(!symbols.scope(f).needs_closure);
        assert!(symbols.scope(f).carrier_name.is_none());
    }

    #[test]
    fn recursion_on_nested_function_is_not_capture() {
        let symbols = analyzed(
            "def f():\n    def g(n):\n        if n > 0:\n            return g(n - 1)\n        return 0\n    return g\n",
        );
        let f = scope_named(&symbols, "f");
        assert!(!symbols.scope(f).needs_closure);
    }
}
