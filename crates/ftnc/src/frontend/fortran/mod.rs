//! Fortran front end
//!
//! This front end handles:
//! - Lexing free-form Fortran into tokens
//! - Parsing tokens into a parse tree
//! - Semantic analysis (declarations, implicit typing, type checking)

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use tracing::{debug, info};

use crate::common::{CompileError, CompileResult, Span, Warning};
use crate::frontend::{CompileContext, FrontendConfig};
use crate::types::TypeRegistry;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use sema::{SemaProgram, SemanticAnalyzer};

/// Result of a successful compilation. The program's type ids refer into
/// `types`.
#[derive(Debug)]
pub struct CompiledProgram {
    pub program: SemaProgram,
    pub types: TypeRegistry,
    pub warnings: Vec<Warning>,
}

/// Fortran language front end
pub struct FortranFrontend;

impl FortranFrontend {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "fortran"
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        &[".f90", ".f95", ".f", ".for"]
    }

    /// Run the whole pipeline: lex -> parse -> analyze.
    ///
    /// Every diagnostic is reported through `ctx.reporter` before an error is
    /// returned; the returned error only summarizes.
    pub fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<CompiledProgram> {
        // Phase 1: Lexing (optional token dump)
        if config.dump_tokens {
            match self.dump_tokens(source) {
                Ok(dump) => {
                    eprintln!("=== Fortran Tokens ===");
                    eprint!("{}", dump);
                    eprintln!("=== End Tokens ===\n");
                }
                Err(e) => {
                    ctx.reporter.report_error(ctx.file_id, &e);
                    return Err(e);
                }
            }
        }

        // Phase 2: Parsing
        info!(file = %ctx.filename, "parsing");
        let mut parser = match Parser::new(source) {
            Ok(p) => p,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(e);
            }
        };

        let ast = match parser.parse() {
            Ok(ast) => ast,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(CompileError::parser("syntax error", Span::default()));
            }
        };
        debug!(statements = ast.body.len(), "parsed program");

        if config.dump_ast {
            eprintln!("=== Fortran AST ===");
            eprintln!("{:#?}", ast);
            eprintln!("=== End AST ===\n");
        }

        // Phase 3: Semantic Analysis
        info!(file = %ctx.filename, "analyzing");
        let mut analyzer = SemanticAnalyzer::new(&config.lang);
        let result = analyzer.analyze(&ast);

        for warning in analyzer.warnings() {
            ctx.reporter.report_warning(ctx.file_id, warning);
        }

        let program = match result {
            Ok(program) => program,
            Err(errors) => {
                for e in &errors {
                    ctx.reporter.report_error(ctx.file_id, e);
                }
                return Err(CompileError::semantic(
                    format!("analysis failed with {} error(s)", errors.len()),
                    Span::default(),
                ));
            }
        };
        let warnings = analyzer.warnings().to_vec();
        let types = analyzer.into_types();
        debug!(types = types.len(), "analysis complete");

        if config.dump_sema {
            eprintln!("=== Fortran Sema ===");
            eprint!("{}", sema::print::print_program(&program, &types));
            eprintln!("=== End Sema ===\n");
        }

        Ok(CompiledProgram {
            program,
            types,
            warnings,
        })
    }

    pub fn dump_tokens(&self, source: &str) -> CompileResult<String> {
        let lexer = Lexer::new(source);
        let tokens = lexer.tokenize_all()?;
        let mut output = String::new();
        for token in &tokens {
            output.push_str(&format!("{:?}\n", token));
        }
        Ok(output)
    }

    pub fn dump_ast(&self, source: &str) -> CompileResult<String> {
        let mut parser = Parser::new(source)?;
        let ast = parser.parse()?;
        Ok(format!("{:#?}", ast))
    }
}

impl Default for FortranFrontend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DiagnosticReporter;
    use crate::frontend::LangOpts;

    fn compile(source: &str, config: &FrontendConfig) -> CompileResult<CompiledProgram> {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("test.f90", source);
        let ctx = CompileContext::new("test.f90".to_string(), file_id, &reporter);
        FortranFrontend::new().compile(source, &ctx, config)
    }

    #[test]
    fn test_compile_program() {
        let compiled = compile("PROGRAM P\nINTEGER I\nI = 1\nEND PROGRAM P\n", &FrontendConfig::default()).unwrap();
        assert_eq!(compiled.program.name.as_deref(), Some("P"));
        assert_eq!(compiled.program.body.len(), 1);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_compile_reports_semantic_errors() {
        let err = compile("CHARACTER*2 C\nC = 1\nEND\n", &FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
        assert!(err.message().contains("1 error"));
    }

    #[test]
    fn test_lang_opts_reach_the_analyzer() {
        let config = FrontendConfig {
            lang: LangOpts {
                default_kind: 8,
                ..LangOpts::default()
            },
            ..FrontendConfig::default()
        };
        let compiled = compile("I = 1\nEND\n", &config).unwrap();
        let i = &compiled.program.decls[0];
        assert_eq!(compiled.types.display(i.ty), "INTEGER*8");

        let config = FrontendConfig {
            lang: LangOpts {
                implicit_none: true,
                ..LangOpts::default()
            },
            ..FrontendConfig::default()
        };
        assert!(compile("I = 1\nEND\n", &config).is_err());
    }

    #[test]
    fn test_syntax_error_is_summarized() {
        let err = compile("X = (1 +\nEND\n", &FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Parser { .. }));
    }
}
