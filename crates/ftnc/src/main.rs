//! FTNC - Fortran semantic checker
//!
//! Usage: ftnc [OPTIONS] <input>

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser as ClapParser;
use ftn_compiler::common::DiagnosticReporter;
use ftn_compiler::frontend::{CompileContext, FortranFrontend, FrontendConfig, LangOpts};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(ClapParser, Debug)]
#[command(name = "ftnc")]
#[command(author = "FTNC Team")]
#[command(version = "0.1.0")]
#[command(about = "Type checker for free-form Fortran programs", long_about = None)]
struct Args {
    /// Input source file (.f90, .f)
    #[arg(required = true)]
    input: PathBuf,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump the analyzed program with implicit conversions spelled out
    #[arg(long)]
    dump_sema: bool,

    /// Kind used for INTEGER, REAL, LOGICAL and COMPLEX without a selector
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..))]
    default_kind: u32,

    /// Treat every program unit as if it began with IMPLICIT NONE
    #[arg(long)]
    implicit_none: bool,

    /// Byte width of POINTER types (defaults to the host pointer width)
    #[arg(long)]
    pointer_size: Option<u32>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn check_extension(path: &Path, frontend: &FortranFrontend) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()));
    let known = ext
        .as_deref()
        .is_some_and(|ext| frontend.extensions().contains(&ext));
    if !known {
        warn!(file = %path.display(), "unrecognized extension, reading as free-form Fortran");
    }
}

/// Compile the input file. `Ok(false)` means diagnostics were reported.
fn run(args: &Args) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    let frontend = FortranFrontend::new();
    check_extension(&args.input, &frontend);

    let defaults = LangOpts::default();
    let config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_sema: args.dump_sema,
        verbose: args.verbose > 0,
        lang: LangOpts {
            default_kind: args.default_kind,
            implicit_none: args.implicit_none,
            pointer_size: args.pointer_size.unwrap_or(defaults.pointer_size),
        },
    };
    info!(file = %filename, frontend = frontend.name(), "compiling");

    let ctx = CompileContext::new(filename.clone(), file_id, &reporter);
    match frontend.compile(&source, &ctx, &config) {
        Ok(compiled) => {
            if config.verbose {
                eprintln!(
                    "{}: {} statement(s), {} canonical type(s), {} warning(s)",
                    filename,
                    compiled.program.body.len(),
                    compiled.types.len(),
                    compiled.warnings.len()
                );
            }
            Ok(true)
        }
        // Diagnostics are already on stderr
        Err(_) => Ok(false),
    }
}
