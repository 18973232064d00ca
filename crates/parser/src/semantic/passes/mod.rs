//! The analysis and lowering pipeline. Passes run in a fixed order:
//! normalization, declaration interpretation, name resolution, closure
//! materialization, type inference, and operation lowering.

pub mod closure_lowering;
pub mod declarations;
pub mod lower_ops;
pub mod manager;
pub mod name_resolution;
pub mod normalize;
mod rewrite;
pub mod type_inference;

pub use manager::{Analysis, PassManager};
pub use rewrite::{Rewriter, StmtList};
