//! # Cypress Code Generation
//!
//! This crate turns the analyzed, lowered tree from `cypress_parser`
//! into a C compilation unit: a header with the runtime interface and
//! closure carrier structs, and a source file with one C function per
//! Cypress function plus a `main` running the module body.
//!
//! The machinery underneath is reusable on its own:
//! - [`writer::CodeWriter`]: brace-aware indentation and insertion
//!   points for out-of-order emission
//! - [`temp::TempAllocator`]: free-listed temporaries keyed on type and
//!   cleanup class
//! - [`labels::Labels`]: goto labels that are only emitted when a jump
//!   actually targets them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cypress_codegen::emit;
//! use cypress_parser::analyze;
//!
//! let output = analyze(source)?;
//! let c = emit(output.module, &output.symbols, "program")?;
//! std::fs::write("program.h", &c.header)?;
//! std::fs::write("program.c", &c.source)?;
//! ```

pub mod emitter;
pub mod error;
pub mod labels;
pub mod temp;
pub mod writer;

pub use emitter::{emit, COutput};
pub use error::{CodegenError, CodegenResult};
pub use labels::{LabelId, LabelState, Labels};
pub use temp::{Cleanup, Temp, TempAllocator};
pub use writer::CodeWriter;
