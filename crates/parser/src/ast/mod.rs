//! AST node definitions for the Cypress language.
//!
//! Nodes are immutable and arena-allocated: child links are `&'a`
//! references into one [`crate::Arena`] per compilation unit. Transform
//! passes allocate replacement nodes instead of mutating in place.

pub mod display;
pub mod expr;
pub mod nodes;
pub mod ops;

pub use display::{expr_to_string, module_to_source};
pub use expr::*;
pub use nodes::*;
pub use ops::*;
