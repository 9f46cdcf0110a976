//! Semantic analysis for Fortran
//!
//! Binds names to declarations, applies the implicit typing rules, types
//! every expression against the canonical type registry and inserts the
//! conversions assignments need. The result is a [`SemaProgram`] whose
//! statements only reference canonical [`TypeId`](crate::types::TypeId)s.

mod analyzer;
mod decl;
mod expr;
mod lhs;
pub mod print;
mod scope;
mod stmt;
mod typeval;

pub use analyzer::SemanticAnalyzer;
pub use expr::{SemaExpr, SemaExprKind};
pub use lhs::{SemaLhs, SemaLhsKind};
pub use scope::{Decl, DeclKind, ImplicitRules, Scope};
pub use stmt::{SemaAssignment, SemaProgram, SemaStmt, SemaStmtKind, StatementFunction};
pub use typeval::TypeVal;
