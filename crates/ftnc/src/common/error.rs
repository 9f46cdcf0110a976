//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream, WriteColor};
use thiserror::Error;
use super::Span;

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Semantic error at {span:?}: {message}")]
    Semantic { message: String, span: Span },

    #[error("Type error at {span:?}: {message}")]
    Type { message: String, span: Span },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    /// Assignment source and destination types that no cast can reconcile
    pub fn type_mismatch(expr_type: impl AsRef<str>, dest_type: impl AsRef<str>, span: Span) -> Self {
        Self::type_error(
            format!(
                "expression type {} doesn't match lhs type {}",
                expr_type.as_ref(),
                dest_type.as_ref()
            ),
            span,
        )
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. }
            | Self::Parser { span, .. }
            | Self::Semantic { span, .. }
            | Self::Type { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Lexer { message, .. }
            | Self::Parser { message, .. }
            | Self::Semantic { message, .. }
            | Self::Type { message, .. } => message.clone(),
            Self::Io(err) => err.to_string(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Non-fatal diagnostic produced during analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub span: Span,
}

impl Warning {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    fn error_diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        let title = match error {
            CompileError::Lexer { .. } => "Lexer error",
            CompileError::Parser { .. } => "Syntax error",
            CompileError::Semantic { .. } => "Semantic error",
            CompileError::Type { .. } => "Type error",
            CompileError::Io(err) => {
                return Diagnostic::error().with_message(format!("IO error: {}", err));
            }
        };

        let mut diagnostic = Diagnostic::error().with_message(title);
        if let Some(span) = error.span() {
            diagnostic = diagnostic.with_labels(vec![
                Label::primary(file_id, span.range()).with_message(error.message()),
            ]);
        }
        diagnostic
    }

    fn warning_diagnostic(file_id: usize, warning: &Warning) -> Diagnostic<usize> {
        Diagnostic::warning()
            .with_message("Warning")
            .with_labels(vec![
                Label::primary(file_id, warning.span.range()).with_message(&warning.message),
            ])
    }

    fn emit(&self, writer: &mut dyn WriteColor, diagnostic: &Diagnostic<usize>) {
        let _ = term::emit(writer, &self.config, &self.files, diagnostic);
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = Self::error_diagnostic(file_id, error);
        self.emit(&mut self.writer.lock(), &diagnostic);
    }

    pub fn report_warning(&self, file_id: usize, warning: &Warning) {
        let diagnostic = Self::warning_diagnostic(file_id, warning);
        self.emit(&mut self.writer.lock(), &diagnostic);
    }

    /// Render an error without colors, as it would appear on the terminal
    pub fn render_error(&self, file_id: usize, error: &CompileError) -> String {
        let mut buffer = Buffer::no_color();
        self.emit(&mut buffer, &Self::error_diagnostic(file_id, error));
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message_names_both_types() {
        let err = CompileError::type_mismatch("INTEGER*4", "CHARACTER*1", Span::new(0, 5));
        assert_eq!(
            err.message(),
            "expression type INTEGER*4 doesn't match lhs type CHARACTER*1"
        );
        assert!(matches!(err, CompileError::Type { .. }));
    }

    #[test]
    fn test_render_error_includes_label() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("t.f90", "X = 'A'\n");
        let err = CompileError::type_mismatch("CHARACTER*1", "REAL*4", Span::new(0, 7));
        let rendered = reporter.render_error(file_id, &err);
        assert!(rendered.contains("Type error"));
        assert!(rendered.contains("doesn't match lhs type REAL*4"));
    }
}
