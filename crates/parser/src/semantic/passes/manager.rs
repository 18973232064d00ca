//! Drives the semantic passes over a parsed module in their fixed
//! order. Each pass either rewrites the tree in the arena or annotates
//! the symbol table; diagnostics from all passes accumulate into one
//! list so a single bad name does not hide later problems.

use super::closure_lowering::ClosureLowering;
use super::declarations::Declarations;
use super::lower_ops::LowerOps;
use super::name_resolution::NameResolution;
use super::normalize::Normalize;
use super::type_inference::TypeInference;
use crate::arena::Arena;
use crate::ast::Module;
use crate::error::Error;
use crate::semantic::symbol::SymbolTable;

/// Result of running the full pass pipeline.
pub struct Analysis<'a> {
    pub module: &'a Module<'a>,
    pub symbols: SymbolTable,
    pub errors: Vec<Error>,
}

pub struct PassManager<'a> {
    arena: &'a Arena,
}

impl<'a> PassManager<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        PassManager { arena }
    }

    pub fn run(&mut self, module: &Module<'a>) -> Analysis<'a> {
        let mut errors: Vec<Error> = Vec::new();
        let mut symbols = SymbolTable::new();

        let module = Normalize::new(self.arena).run(module);
        let module = Declarations::new(self.arena, &mut errors).run(module);
        NameResolution::new(&mut symbols, &mut errors).run(module);
        symbols.close_all_scopes();
        ClosureLowering::new(&mut symbols).run();
        TypeInference::new(&mut symbols, &mut errors).run(module);
        let module = LowerOps::new(self.arena, &mut symbols).run(module);

        Analysis {
            module,
            symbols,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn analyze(source: &str) -> Analysis<'_> {
        // Leak the arena so the returned module can outlive this frame.
        let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer, arena);
        let module = parser.parse_module().expect("parse failed");
        PassManager::new(arena).run(module)
    }

    #[test]
    fn clean_program_produces_no_diagnostics() {
        let analysis = analyze("def double(x):\n    return x * 2\ny = double(21)\n");
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn diagnostics_from_several_passes_accumulate() {
        // One undefined name and one type conflict, from different passes.
        let analysis = analyze("x: int = \"text\"\nprint(missing)\n");
        assert!(analysis.errors.len() >= 2);
    }

    #[test]
    fn pipeline_desugars_and_lowers_together() {
        let source = "items = [1, 2, 3]\nsquares = [i * i for i in items]\na, b = 1, 2\na, b = b, a\n";
        let analysis = analyze(source);
        assert!(analysis.errors.is_empty());
        let rendered = crate::ast::module_to_source(analysis.module);
        assert!(rendered.contains("def __cycomp0"));
        assert!(rendered.contains("__cytmp0 = b"));
    }
}
