//! Buffered code writer with automatic indentation and insertion
//! points.
//!
//! Output is a tree of text segments. `insertion_point` reserves a slot
//! at the current position and hands back a writer for it; anything
//! written through that writer later is spliced into the reserved slot
//! when the tree is rendered. This lets the emitter write a function
//! body before it knows the declarations that must precede it.
//!
//! Indentation follows the C brace structure of what is written: a `{`
//! deepens the level for following lines, a `}` at the start of a line
//! shallows it first. Misuse of the writer is a compiler bug and
//! panics rather than producing a diagnostic.

use std::cell::RefCell;
use std::rc::Rc;

const INDENT: &str = "    ";

enum Segment {
    Text(String),
    Splice(Rc<RefCell<State>>),
}

struct State {
    segments: Vec<Segment>,
    indent: usize,
    at_line_start: bool,
}

impl State {
    fn new(indent: usize) -> Self {
        State {
            segments: Vec::new(),
            indent,
            at_line_start: true,
        }
    }

    fn text(&mut self) -> &mut String {
        if !matches!(self.segments.last(), Some(Segment::Text(_))) {
            self.segments.push(Segment::Text(String::new()));
        }
        match self.segments.last_mut() {
            Some(Segment::Text(s)) => s,
            _ => unreachable!(),
        }
    }

    fn write(&mut self, piece: &str) {
        for ch in piece.chars() {
            match ch {
                '\n' => {
                    self.text().push('\n');
                    self.at_line_start = true;
                }
                '}' => {
                    self.indent = self.indent.saturating_sub(1);
                    self.flush_indent();
                    self.text().push('}');
                }
                '{' => {
                    self.flush_indent();
                    self.text().push('{');
                    self.indent += 1;
                }
                _ => {
                    self.flush_indent();
                    self.text().push(ch);
                }
            }
        }
    }

    fn flush_indent(&mut self) {
        if self.at_line_start {
            self.at_line_start = false;
            let indent = self.indent;
            let text = self.text();
            for _ in 0..indent {
                text.push_str(INDENT);
            }
        }
    }

    fn render(&self, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Text(s) => out.push_str(s),
                Segment::Splice(inner) => inner.borrow().render(out),
            }
        }
    }
}

/// A writer for one output stream or one spliced slot within a stream.
#[derive(Clone)]
pub struct CodeWriter {
    state: Rc<RefCell<State>>,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter {
            state: Rc::new(RefCell::new(State::new(0))),
        }
    }

    /// Write a piece of text at the current position, indenting line
    /// starts and tracking brace depth.
    pub fn write(&self, piece: &str) {
        self.state.borrow_mut().write(piece);
    }

    /// Write a full line.
    pub fn line(&self, piece: &str) {
        let mut state = self.state.borrow_mut();
        state.write(piece);
        state.write("\n");
    }

    /// Terminate the current line.
    pub fn newline(&self) {
        self.state.borrow_mut().write("\n");
    }

    /// Reserve a slot at the current position. Returns a writer whose
    /// output lands in the slot, however late it is written.
    pub fn insertion_point(&self) -> CodeWriter {
        let mut state = self.state.borrow_mut();
        let child = Rc::new(RefCell::new(State::new(state.indent)));
        state.segments.push(Segment::Splice(Rc::clone(&child)));
        CodeWriter { state: child }
    }

    /// Render the full tree, splices included, into one string.
    pub fn finish(&self) -> String {
        let mut out = String::new();
        self.state.borrow().render(&mut out);
        out
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_drive_indentation() {
        let w = CodeWriter::new();
        w.line("int main(void) {");
        w.line("return 0;");
        w.line("}");
        assert_eq!(w.finish(), "int main(void) {\n    return 0;\n}\n");
    }

    #[test]
    fn nested_blocks_indent_cumulatively() {
        let w = CodeWriter::new();
        w.line("while (1) {");
        w.line("if (x) {");
        w.line("break;");
        w.line("}");
        w.line("}");
        let out = w.finish();
        assert!(out.contains("\n        break;\n"));
        assert!(out.contains("\n    }\n}"));
    }

    #[test]
    fn insertion_point_fills_later() {
        let w = CodeWriter::new();
        w.line("void f(void) {");
        let decls = w.insertion_point();
        w.line("x = 1;");
        w.line("}");
        decls.line("long x;");
        assert_eq!(w.finish(), "void f(void) {\n    long x;\n    x = 1;\n}\n");
    }

    #[test]
    fn insertion_point_captures_indent_at_creation() {
        let w = CodeWriter::new();
        w.line("{");
        let p = w.insertion_point();
        w.line("}");
        p.line("a;");
        assert_eq!(w.finish(), "{\n    a;\n}\n");
    }

    #[test]
    fn empty_insertion_point_renders_nothing() {
        let w = CodeWriter::new();
        w.line("a;");
        let _p = w.insertion_point();
        w.line("b;");
        assert_eq!(w.finish(), "a;\nb;\n");
    }
}
