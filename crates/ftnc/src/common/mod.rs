//! Common infrastructure shared across the front end

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, Warning};
pub use span::Span;
