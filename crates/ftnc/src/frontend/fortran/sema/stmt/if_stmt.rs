//! Logical and arithmetic IF

use super::SemaStmtKind;
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{Expr, Label, Stmt};
use crate::frontend::fortran::sema::SemanticAnalyzer;

impl SemanticAnalyzer {
    pub(super) fn analyze_if(&mut self, cond: &Expr, stmt: &Stmt) -> CompileResult<SemaStmtKind> {
        let cond = self.resolve_expr(cond)?;
        if !self.types.is_logical_like(cond.ty) {
            return Err(CompileError::type_error(
                format!(
                    "IF condition must be LOGICAL, found {}",
                    self.types.display(cond.ty)
                ),
                cond.span,
            ));
        }

        let stmt = self.analyze_executable(stmt)?;
        Ok(SemaStmtKind::If {
            cond,
            stmt: Box::new(stmt),
        })
    }

    pub(super) fn analyze_if_computed(
        &mut self,
        cond: &Expr,
        labels: &[Label],
        span: Span,
    ) -> CompileResult<SemaStmtKind> {
        let cond = self.resolve_expr(cond)?;
        if !(self.types.is_integer_like(cond.ty) || self.types.is_real(cond.ty)) {
            return Err(CompileError::type_error(
                format!(
                    "arithmetic IF condition must be INTEGER or REAL, found {}",
                    self.types.display(cond.ty)
                ),
                cond.span,
            ));
        }

        if labels.len() > 3 {
            return Err(CompileError::semantic(
                format!("arithmetic IF takes at most 3 labels, found {}", labels.len()),
                span,
            ));
        }

        Ok(SemaStmtKind::IfComputed {
            cond,
            labels: labels.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::common::CompileError;
    use crate::frontend::fortran::parser::Parser;
    use crate::frontend::fortran::sema::{SemaProgram, SemaStmtKind, SemanticAnalyzer};

    fn analyze(source: &str) -> Result<SemaProgram, Vec<CompileError>> {
        let program = Parser::new(source).unwrap().parse().unwrap();
        SemanticAnalyzer::default().analyze(&program)
    }

    #[test]
    fn test_logical_if_with_nested_assignment() {
        let program = analyze("LOGICAL DONE\nDONE = .FALSE.\nIF (.NOT. DONE) X = 1\nEND\n").unwrap();
        let SemaStmtKind::If { stmt, .. } = &program.body[1].kind else {
            panic!("expected IF");
        };
        assert!(matches!(stmt.kind, SemaStmtKind::Assignment(_)));
    }

    #[test]
    fn test_logical_if_requires_logical_condition() {
        let errors = analyze("IF (1.5) GOTO 10\n10 CONTINUE\nEND\n").unwrap_err();
        assert!(errors[0].message().contains("must be LOGICAL"));
    }

    #[test]
    fn test_arithmetic_if() {
        let program = analyze("I = 1\nIF (I - 1) 10, 20, 30\n10 CONTINUE\n20 CONTINUE\n30 CONTINUE\nEND\n").unwrap();
        let SemaStmtKind::IfComputed { labels, .. } = &program.body[1].kind else {
            panic!("expected arithmetic IF");
        };
        assert_eq!(labels, &vec![10, 20, 30]);
    }

    #[test]
    fn test_arithmetic_if_rejects_extra_labels() {
        let errors = analyze("IF (1) 10, 10, 10, 10\n10 CONTINUE\nEND\n").unwrap_err();
        assert!(errors[0].message().contains("at most 3 labels"));
    }

    #[test]
    fn test_arithmetic_if_rejects_character_condition() {
        let errors = analyze("IF ('A') 10, 10, 10\n10 CONTINUE\nEND\n").unwrap_err();
        assert!(errors[0].message().contains("INTEGER or REAL"));
    }
}
