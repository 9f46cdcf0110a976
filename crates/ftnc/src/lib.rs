//! FTNC - semantic core of a Fortran compiler front end
//!
//! This library turns free-form Fortran source into a typed, checked
//! program in which every type is a canonical instance owned by a type
//! registry.
//!
//! ## Architecture
//!
//! The front end is organized into:
//! - **Frontend** (`frontend/`): Fortran lexer, parser and semantic analysis
//! - **Types** (`types/`): Canonical type registry and type algebra
//! - **Common** (`common/`): Shared infrastructure (errors, spans)

pub mod common;
pub mod types;
pub mod frontend;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span, Warning};
pub use frontend::{CompileContext, CompiledProgram, FortranFrontend, FrontendConfig, LangOpts};
pub use types::{TypeId, TypeRegistry};
