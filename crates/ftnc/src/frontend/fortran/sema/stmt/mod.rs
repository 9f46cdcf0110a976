//! Statement semantics

mod assignment;
mod if_stmt;

pub use assignment::{SemaAssignment, StatementFunction};

use super::{Decl, SemaExpr, SemanticAnalyzer};
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{Label, Stmt, StmtKind};

/// An analyzed program unit
#[derive(Debug, Clone, PartialEq)]
pub struct SemaProgram {
    pub name: Option<String>,
    /// Declarations of the program scope in definition order
    pub decls: Vec<Decl>,
    pub functions: Vec<StatementFunction>,
    /// Executable statements
    pub body: Vec<SemaStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemaStmt {
    pub label: Option<Label>,
    pub kind: SemaStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemaStmtKind {
    Assignment(SemaAssignment),
    /// Logical IF
    If { cond: SemaExpr, stmt: Box<SemaStmt> },
    /// Arithmetic IF: branch on negative, zero, positive
    IfComputed { cond: SemaExpr, labels: Vec<Label> },
    Goto(Label),
    Continue,
}

impl SemanticAnalyzer {
    /// Analyze one statement. Specification statements and statement
    /// function definitions only update the declaration table and yield
    /// `None`.
    pub fn analyze_stmt(&mut self, stmt: &Stmt) -> CompileResult<Option<SemaStmt>> {
        match &stmt.kind {
            StmtKind::ImplicitNone => {
                self.scope.implicit_mut().set_none();
                Ok(None)
            }
            StmtKind::Declaration(decl) => self.analyze_declaration(decl).map(|()| None),
            StmtKind::DerivedType(def) => self.analyze_derived_type(def).map(|()| None),
            StmtKind::Parameter(constants) => self.analyze_parameter(constants, stmt.span).map(|()| None),
            StmtKind::Intrinsic(names) => self.analyze_intrinsic(names, stmt.span).map(|()| None),
            StmtKind::Assignment(assignment) if self.is_stmt_func(assignment) => {
                self.define_stmt_func(assignment, stmt.span).map(|()| None)
            }
            _ => self.analyze_executable(stmt).map(Some),
        }
    }

    /// Analyze an executable statement. Assignments here are always
    /// assignments, never statement function definitions.
    pub(super) fn analyze_executable(&mut self, stmt: &Stmt) -> CompileResult<SemaStmt> {
        let kind = match &stmt.kind {
            StmtKind::Assignment(assignment) => {
                SemaStmtKind::Assignment(self.analyze_assignment(assignment, stmt.span)?)
            }
            StmtKind::IfStatement { cond, stmt: nested } => self.analyze_if(cond, nested)?,
            StmtKind::IfComputed { cond, labels } => {
                self.analyze_if_computed(cond, labels, stmt.span)?
            }
            StmtKind::Goto(label) => SemaStmtKind::Goto(*label),
            StmtKind::Continue => SemaStmtKind::Continue,
            StmtKind::ImplicitNone
            | StmtKind::Declaration(_)
            | StmtKind::DerivedType(_)
            | StmtKind::Parameter(_)
            | StmtKind::Intrinsic(_) => {
                return Err(CompileError::semantic(
                    "specification statement is not allowed here",
                    stmt.span,
                ));
            }
        };

        Ok(SemaStmt {
            label: stmt.label,
            kind,
            span: stmt.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::fortran::parser::Parser;

    fn analyze(source: &str) -> (SemanticAnalyzer, Result<SemaProgram, Vec<CompileError>>) {
        let program = Parser::new(source).unwrap().parse().unwrap();
        let mut analyzer = SemanticAnalyzer::default();
        let result = analyzer.analyze(&program);
        (analyzer, result)
    }

    #[test]
    fn test_specification_statements_emit_nothing() {
        let (_, result) = analyze("INTEGER I\nPARAMETER (N = 3)\nI = N\nEND\n");
        let program = result.unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.decls.len(), 2);
    }

    #[test]
    fn test_errors_are_aggregated() {
        let (_, result) = analyze("CHARACTER*4 S\nS = 1\nS = 2\nX = 1.0\nEND\n");
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_labels_are_checked() {
        let (_, result) = analyze("10 CONTINUE\nGOTO 20\n10 CONTINUE\nEND\n");
        let messages: Vec<String> = result.unwrap_err().iter().map(CompileError::message).collect();
        assert!(messages.iter().any(|m| m.contains("label 10 defined more than once")));
        assert!(messages.iter().any(|m| m.contains("undefined label 20")));
    }

    #[test]
    fn test_label_references_inside_if() {
        let (_, result) = analyze("LOGICAL L\nL = .TRUE.\nIF (L) GOTO 30\nEND\n");
        assert!(result.unwrap_err()[0].message().contains("undefined label 30"));

        let (_, result) = analyze("LOGICAL L\nL = .TRUE.\nIF (L) GOTO 30\n30 CONTINUE\nEND\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_unused_variable_warning() {
        let (analyzer, result) = analyze("INTEGER USED, IDLE\nUSED = 1\nEND\n");
        assert!(result.is_ok());
        let warnings = analyzer.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("IDLE"));
    }
}
