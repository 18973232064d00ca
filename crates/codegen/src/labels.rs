//! Goto label management for emitted C bodies.
//!
//! Labels move through three states: allocated but unused, declared at
//! a position in the output, and used by at least one jump. Declaration
//! reserves an insertion point; at finalization only labels that were
//! actually jumped to are written into their slots, so fallthrough-only
//! paths never produce an unused-label warning from the C compiler.

use crate::writer::CodeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    Unused,
    Declared,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

struct Record {
    name: String,
    state: LabelState,
    slot: Option<CodeWriter>,
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

/// Per-function label table.
#[derive(Default)]
pub struct Labels {
    records: Vec<Record>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh label in the unused state.
    pub fn fresh(&mut self, hint: &str) -> LabelId {
        let id = LabelId(self.records.len());
        self.records.push(Record {
            name: format!("__cy{}{}", hint, id.0),
            state: LabelState::Unused,
            slot: None,
        });
        id
    }

    /// Reserve the label's position in the output. The label text is
    /// only written there if a jump targets it.
    pub fn declare(&mut self, id: LabelId, writer: &CodeWriter) {
        let record = &mut self.records[id.0];
        record.slot = Some(writer.insertion_point());
        if record.state == LabelState::Unused {
            record.state = LabelState::Declared;
        }
    }

    /// Record a jump to the label and return its name for the `goto`.
    pub fn jump(&mut self, id: LabelId) -> &str {
        let record = &mut self.records[id.0];
        record.state = LabelState::Used;
        &record.name
    }

    pub fn state(&self, id: LabelId) -> LabelState {
        self.records[id.0].state
    }

    /// Write every used label into its reserved slot.
    ///
    /// # Panics
    ///
    /// Panics on a label that was jumped to but never declared; the
    /// emitted C would not compile, so this is an emitter bug.
    pub fn finalize(self) {
        for record in self.records {
            if record.state != LabelState::Used {
                continue;
            }
            match record.slot {
                Some(slot) => slot.line(&format!("{}: ;", record.name)),
                None => panic!("label {} used but never declared", record.name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_label_is_not_emitted() {
        let w = CodeWriter::new();
        let mut labels = Labels::new();
        let end = labels.fresh("end");
        w.line("body();");
        labels.declare(end, &w);
        labels.finalize();
        assert_eq!(w.finish(), "body();\n");
    }

    #[test]
    fn used_label_is_emitted_exactly_once() {
        let w = CodeWriter::new();
        let mut labels = Labels::new();
        let end = labels.fresh("end");
        w.line(&format!("goto {};", labels.jump(end)));
        labels.declare(end, &w);
        w.line("after();");
        labels.finalize();
        let out = w.finish();
        assert_eq!(out.matches("__cyend0: ;").count(), 1);
        assert!(out.contains("goto __cyend0;"));
    }

    #[test]
    fn jump_after_declaration_still_emits() {
        let w = CodeWriter::new();
        let mut labels = Labels::new();
        let top = labels.fresh("top");
        labels.declare(top, &w);
        w.line("step();");
        w.line(&format!("goto {};", labels.jump(top)));
        labels.finalize();
        assert!(w.finish().starts_with("__cytop0: ;\n"));
    }

    #[test]
    #[should_panic(expected = "never declared")]
    fn used_but_undeclared_label_panics() {
        let mut labels = Labels::new();
        let id = labels.fresh("end");
        labels.jump(id);
        labels.finalize();
    }

    #[test]
    fn states_progress_monotonically() {
        let w = CodeWriter::new();
        let mut labels = Labels::new();
        let id = labels.fresh("x");
        assert_eq!(labels.state(id), LabelState::Unused);
        labels.declare(id, &w);
        assert_eq!(labels.state(id), LabelState::Declared);
        labels.jump(id);
        assert_eq!(labels.state(id), LabelState::Used);
    }
}
