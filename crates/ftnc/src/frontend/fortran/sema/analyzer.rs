//! Semantic analyzer - declaration binding, type checking and validation

use std::collections::HashMap;

use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::{debug, trace};

use super::scope::{Decl, DeclKind, ImplicitRules, Scope};
use super::stmt::{SemaProgram, SemaStmt, SemaStmtKind, StatementFunction};
use crate::common::{CompileError, CompileResult, Span, Warning};
use crate::frontend::LangOpts;
use crate::frontend::fortran::ast::{Label, Program, Stmt};
use crate::types::TypeRegistry;

/// Semantic analyzer for one program unit.
///
/// Owns the type registry for the compilation session, so every type it
/// hands out is only meaningful together with [`SemanticAnalyzer::types`].
pub struct SemanticAnalyzer {
    pub(super) types: TypeRegistry,
    pub(super) names: DefaultStringInterner,
    pub(super) scope: Scope,
    pub(super) functions: Vec<StatementFunction>,
    warnings: Vec<Warning>,
}

impl SemanticAnalyzer {
    pub fn new(opts: &LangOpts) -> Self {
        Self {
            types: TypeRegistry::new(opts.default_kind, opts.pointer_size),
            names: DefaultStringInterner::default(),
            scope: Scope::new(ImplicitRules::new(opts.implicit_none)),
            functions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Analyze a program unit.
    ///
    /// A rejected statement does not stop analysis; every error found is
    /// returned together.
    pub fn analyze(&mut self, program: &Program) -> Result<SemaProgram, Vec<CompileError>> {
        let mut errors = Vec::new();
        let labels = collect_labels(&program.body, &mut errors);

        let mut body = Vec::new();
        for stmt in &program.body {
            match self.analyze_stmt(stmt) {
                Ok(Some(sema)) => body.push(sema),
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e.message(), "statement rejected");
                    errors.push(e);
                }
            }
        }

        for stmt in &body {
            check_label_refs(stmt, &labels, &mut errors);
        }
        self.warn_unused();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SemaProgram {
            name: program.name.clone(),
            decls: self.scope.decls().cloned().collect(),
            functions: std::mem::take(&mut self.functions),
            body,
        })
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn into_types(self) -> TypeRegistry {
        self.types
    }

    /// Look up a declaration through the whole scope chain
    pub fn find_decl(&self, name: &str) -> Option<&Decl> {
        let sym = self.names.get(name)?;
        self.scope.find(sym, true)
    }

    // =========================================================================
    // Declaration table helpers
    // =========================================================================

    pub(super) fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.warnings.push(Warning::new(message, span));
    }

    /// The declaration of `name`, created from the implicit rules on first
    /// reference when there is none
    pub(super) fn declared(&mut self, name: &str, span: Span) -> CompileResult<(DefaultSymbol, Decl)> {
        let sym = self.names.get_or_intern(name);
        if let Some(decl) = self.scope.find(sym, true) {
            return Ok((sym, decl.clone()));
        }

        let Some(ty) = self.scope.implicit().type_for(name, &mut self.types) else {
            return Err(CompileError::semantic(
                format!("'{}' has no IMPLICIT type", name),
                span,
            ));
        };
        trace!(name, ty = %self.types.display(ty), "implicit declaration");

        let mut decl = Decl::variable(name, ty, span);
        decl.is_implicit = true;
        self.scope
            .define_global(sym, decl.clone())
            .map_err(|e| CompileError::semantic(e, span))?;
        Ok((sym, decl))
    }

    /// Record a read or write of `name`. The declaration stays marked even if
    /// the statement using it is later rejected.
    pub(super) fn mark_used(&mut self, name: &str, write: bool, span: Span) -> CompileResult<()> {
        let sym = self.names.get_or_intern(name);
        if write {
            match self.scope.find(sym, true).map(|decl| &decl.kind) {
                Some(DeclKind::Constant(_)) => {
                    return Err(CompileError::semantic(
                        format!("cannot assign to named constant '{}'", name),
                        span,
                    ));
                }
                Some(DeclKind::Intrinsic | DeclKind::StatementFunction { .. }) => {
                    return Err(CompileError::semantic(
                        format!("cannot assign to '{}'", name),
                        span,
                    ));
                }
                _ => {}
            }
        }

        if !self.scope.mark_used(sym, write) {
            return Err(CompileError::semantic(format!("'{}' is not declared", name), span));
        }
        Ok(())
    }

    fn warn_unused(&mut self) {
        let unused: Vec<Warning> = self
            .scope
            .decls()
            .filter(|decl| matches!(decl.kind, DeclKind::Variable) && !decl.used && !decl.written)
            .map(|decl| Warning::new(format!("unused variable '{}'", decl.name), decl.span))
            .collect();
        self.warnings.extend(unused);
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new(&LangOpts::default())
    }
}

// =============================================================================
// Labels
// =============================================================================

fn collect_labels(body: &[Stmt], errors: &mut Vec<CompileError>) -> HashMap<Label, Span> {
    let mut labels = HashMap::new();
    for stmt in body {
        let Some(label) = stmt.label else { continue };
        if labels.insert(label, stmt.span).is_some() {
            errors.push(CompileError::semantic(
                format!("label {} defined more than once", label),
                stmt.span,
            ));
        }
    }
    labels
}

fn check_label_refs(stmt: &SemaStmt, labels: &HashMap<Label, Span>, errors: &mut Vec<CompileError>) {
    let mut check = |label: &Label| {
        if !labels.contains_key(label) {
            errors.push(CompileError::semantic(
                format!("reference to undefined label {}", label),
                stmt.span,
            ));
        }
    };

    match &stmt.kind {
        SemaStmtKind::Goto(label) => check(label),
        SemaStmtKind::IfComputed { labels: targets, .. } => targets.iter().for_each(check),
        SemaStmtKind::If { stmt: nested, .. } => check_label_refs(nested, labels, errors),
        SemaStmtKind::Assignment(_) | SemaStmtKind::Continue => {}
    }
}
