//! Front end configuration and the Fortran front end
//!
//! The front end is responsible for:
//! 1. Lexing source code into tokens
//! 2. Parsing tokens into a parse tree
//! 3. Performing semantic analysis against the type registry

pub mod fortran;

use crate::common::DiagnosticReporter;

pub use fortran::{CompiledProgram, FortranFrontend};

/// Language options that change how source is typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LangOpts {
    /// Kind used when a primitive type is requested with kind 0
    pub default_kind: u32,
    /// Start every program unit as if it began with `IMPLICIT NONE`
    pub implicit_none: bool,
    /// Byte width of POINTER types
    pub pointer_size: u32,
}

impl Default for LangOpts {
    fn default() -> Self {
        Self {
            default_kind: 4,
            implicit_none: false,
            pointer_size: size_of::<usize>() as u32,
        }
    }
}

/// Configuration options passed to the front end
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_sema: bool,
    pub verbose: bool,
    pub lang: LangOpts,
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}
