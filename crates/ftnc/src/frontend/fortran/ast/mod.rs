//! Fortran parse tree
//!
//! Produced by the parser and consumed by semantic analysis. Nodes are plain
//! owned trees carrying source spans.

mod expr;
mod stmt;
mod types;

pub use expr::*;
pub use stmt::*;
pub use types::*;
