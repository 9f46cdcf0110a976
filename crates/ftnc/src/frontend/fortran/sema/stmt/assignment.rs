//! Assignment statements and statement function definitions

use tracing::debug;

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{ArrayRange, Assignment, Expr, LhsKind};
use crate::frontend::fortran::sema::{Decl, DeclKind, SemaExpr, SemaLhs, SemanticAnalyzer};
use crate::types::TypeId;

/// `dest = expr` with `expr` already converted to the type of `dest`
#[derive(Debug, Clone, PartialEq)]
pub struct SemaAssignment {
    pub dest: SemaLhs,
    pub expr: SemaExpr,
    pub span: Span,
}

/// A statement function definition `F(X, Y) = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct StatementFunction {
    pub name: String,
    pub args: Vec<String>,
    pub ty: TypeId,
    /// Body, converted to the function type
    pub body: SemaExpr,
    pub span: Span,
}

impl SemanticAnalyzer {
    /// Whether an assignment defines a statement function rather than
    /// assigning to an array element.
    ///
    /// `F(X) = X + 1` and `A(I) = 0` have the same shape; only the
    /// declaration of the base name tells them apart.
    pub fn is_stmt_func(&self, assignment: &Assignment) -> bool {
        let LhsKind::Array { parent, index } = &assignment.name.kind else {
            return false;
        };

        // Dummy argument lists are plain expressions, never ranges
        if !index.iter().all(ArrayRange::is_trivial) {
            return false;
        }

        let LhsKind::Variable(name) = &parent.kind else {
            return false;
        };

        // A name never interned has never been declared
        let Some(sym) = self.names.get(name) else {
            return true;
        };

        match self.scope.find(sym, false) {
            None => true,
            Some(decl) => !(decl.is_array(&self.types) || decl.is_final() || decl.is_intrinsic()),
        }
    }

    /// Check an assignment, casting the expression to the destination type
    /// when the types differ.
    ///
    /// The destination is marked written before the expression is resolved,
    /// and stays marked if the statement is rejected.
    pub fn analyze_assignment(&mut self, assignment: &Assignment, span: Span) -> CompileResult<SemaAssignment> {
        let dest = self.resolve_lhs(&assignment.name)?;
        self.mark_used(dest.base_name(), true, dest.span)?;

        let expr = self.resolve_expr(&assignment.init)?;
        let expr = if self.types.compatible(dest.ty, expr.ty) {
            expr
        } else {
            match self.cast(expr, dest.ty) {
                Ok(cast) => cast,
                Err(expr) => {
                    return Err(CompileError::type_mismatch(
                        self.types.display(expr.ty),
                        self.types.display(dest.ty),
                        span,
                    ));
                }
            }
        };

        Ok(SemaAssignment { dest, expr, span })
    }

    /// Define the statement function `F(X, ...) = expr`.
    ///
    /// Dummy arguments take the type of the same name in the enclosing
    /// scope, or their implicit type. The body is resolved in a child scope
    /// holding the dummies.
    pub(in crate::frontend::fortran::sema) fn define_stmt_func(
        &mut self,
        assignment: &Assignment,
        span: Span,
    ) -> CompileResult<()> {
        let LhsKind::Array { parent, index } = &assignment.name.kind else {
            return Err(CompileError::semantic("invalid statement function definition", span));
        };
        let name = parent.base_name().to_string();

        let mut dummies: Vec<(String, TypeId, Span)> = Vec::with_capacity(index.len());
        for range in index {
            let Some(dummy) = range.first.as_ref().and_then(Expr::as_name) else {
                return Err(CompileError::semantic(
                    "statement function arguments must be names",
                    range.span,
                ));
            };
            if dummies.iter().any(|(existing, ..)| existing == dummy) {
                return Err(CompileError::semantic(
                    format!("duplicate argument '{}' in statement function '{}'", dummy, name),
                    range.span,
                ));
            }
            let ty = self.dummy_type(dummy, range.span)?;
            dummies.push((dummy.to_string(), ty, range.span));
        }

        let sym = self.names.get_or_intern(&name);
        let ty = match self.scope.find(sym, false) {
            Some(decl) => decl.ty,
            None => self.declared(&name, span)?.1.ty,
        };
        debug!(name = %name, arity = dummies.len(), "statement function definition");

        self.scope.push_child();
        let body = self.resolve_stmt_func_body(&dummies, &assignment.init);
        self.scope.pop_to_parent();

        let body = self.cast(body?, ty).map_err(|body| {
            CompileError::type_mismatch(self.types.display(body.ty), self.types.display(ty), span)
        })?;

        let mut decl = Decl::new(
            name.clone(),
            DeclKind::StatementFunction {
                args: dummies.iter().map(|(_, ty, _)| *ty).collect(),
            },
            ty,
            span,
        );
        decl.is_final = true;
        match self.scope.find_mut(sym, false) {
            Some(existing) => *existing = decl,
            None => self
                .scope
                .define(sym, decl)
                .map_err(|e| CompileError::semantic(e, span))?,
        }

        self.functions.push(StatementFunction {
            name,
            args: dummies.into_iter().map(|(name, ..)| name).collect(),
            ty,
            body,
            span,
        });
        Ok(())
    }

    fn dummy_type(&mut self, dummy: &str, span: Span) -> CompileResult<TypeId> {
        let host = self
            .names
            .get(dummy)
            .and_then(|sym| self.scope.find(sym, true))
            .filter(|decl| matches!(decl.kind, DeclKind::Variable))
            .map(|decl| self.types.element_type(decl.ty).unwrap_or(decl.ty));
        if let Some(ty) = host {
            return Ok(ty);
        }

        self.scope
            .implicit()
            .type_for(dummy, &mut self.types)
            .ok_or_else(|| {
                CompileError::semantic(format!("'{}' has no IMPLICIT type", dummy), span)
            })
    }

    fn resolve_stmt_func_body(
        &mut self,
        dummies: &[(String, TypeId, Span)],
        body: &Expr,
    ) -> CompileResult<SemaExpr> {
        for (dummy, ty, span) in dummies {
            let sym = self.names.get_or_intern(dummy);
            let mut decl = Decl::variable(dummy.clone(), *ty, *span);
            decl.is_final = true;
            self.scope
                .define(sym, decl)
                .map_err(|e| CompileError::semantic(e, *span))?;
        }
        self.resolve_expr(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::fortran::ast::StmtKind;
    use crate::frontend::fortran::parser::Parser;
    use crate::frontend::fortran::sema::{SemaExprKind, SemaStmtKind};
    use pretty_assertions::assert_eq;

    fn assignment(source: &str) -> Assignment {
        match Parser::new(source).unwrap().parse_statement().unwrap().kind {
            StmtKind::Assignment(assignment) => assignment,
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    fn declare(analyzer: &mut SemanticAnalyzer, source: &str) {
        let stmt = Parser::new(source).unwrap().parse_statement().unwrap();
        assert_eq!(analyzer.analyze_stmt(&stmt).unwrap(), None);
    }

    #[test]
    fn test_undeclared_name_is_stmt_func() {
        let analyzer = SemanticAnalyzer::default();
        assert!(analyzer.is_stmt_func(&assignment("F(X) = X + 1")));
    }

    #[test]
    fn test_array_is_not_stmt_func() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "INTEGER A(10)");
        assert!(!analyzer.is_stmt_func(&assignment("A(I) = 0")));
    }

    #[test]
    fn test_scalar_declaration_is_stmt_func() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "REAL F");
        assert!(analyzer.is_stmt_func(&assignment("F(X) = X * 2.0")));
    }

    #[test]
    fn test_final_or_intrinsic_is_not_stmt_func() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "REAL F");
        declare(&mut analyzer, "INTRINSIC SIN");
        analyzer.analyze_stmt(&Parser::new("F = 1.0").unwrap().parse_statement().unwrap()).unwrap();

        assert!(!analyzer.is_stmt_func(&assignment("F(X) = X")));
        assert!(!analyzer.is_stmt_func(&assignment("SIN(X) = X")));
    }

    #[test]
    fn test_non_trivial_shapes_are_not_stmt_func() {
        let analyzer = SemanticAnalyzer::default();
        assert!(!analyzer.is_stmt_func(&assignment("F(1:2) = 0")));
        assert!(!analyzer.is_stmt_func(&assignment("P%F(X) = 0")));
        assert!(!analyzer.is_stmt_func(&assignment("F = 0")));
    }

    #[test]
    fn test_real_to_integer_inserts_cast() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "INTEGER N");
        let sema = analyzer.analyze_assignment(&assignment("N = 2.5"), Span::default()).unwrap();

        let int4 = analyzer.types.integer(4);
        assert_eq!(sema.dest.ty, int4);
        assert_eq!(sema.expr.ty, int4);
        assert!(matches!(sema.expr.kind, SemaExprKind::Cast(_)));
    }

    #[test]
    fn test_character_from_integer_is_type_mismatch() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "CHARACTER*10 NAME");
        let err = analyzer
            .analyze_assignment(&assignment("NAME = 42"), Span::default())
            .unwrap_err();

        assert!(matches!(err, CompileError::Type { .. }));
        assert_eq!(
            err.message(),
            "expression type INTEGER*4 doesn't match lhs type CHARACTER*10"
        );
    }

    #[test]
    fn test_mark_used_persists_after_failure() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "INTEGER K");
        assert!(analyzer.analyze_assignment(&assignment("K = 'a' + 1"), Span::default()).is_err());

        let decl = analyzer.find_decl("K").unwrap();
        assert!(decl.written);
        assert!(decl.is_final());
    }

    #[test]
    fn test_assignment_to_constant_is_rejected() {
        let mut analyzer = SemanticAnalyzer::default();
        declare(&mut analyzer, "PARAMETER (N = 1)");
        let err = analyzer
            .analyze_assignment(&assignment("N = 2"), Span::default())
            .unwrap_err();
        assert!(err.message().contains("named constant"));
    }

    #[test]
    fn test_stmt_func_definition_and_call() {
        let program = Parser::new("F(X) = X + 1\nY = F(2.0)\nEND\n").unwrap().parse().unwrap();
        let mut analyzer = SemanticAnalyzer::default();
        let sema = analyzer.analyze(&program).unwrap();

        assert_eq!(sema.functions.len(), 1);
        assert_eq!(sema.functions[0].args, vec!["X".to_string()]);
        assert!(analyzer.find_decl("F").unwrap().is_stmt_func());
        assert!(analyzer.find_decl("X").is_none());

        assert_eq!(sema.body.len(), 1);
        let SemaStmtKind::Assignment(assign) = &sema.body[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(assign.expr.kind, SemaExprKind::Call { .. }));
    }

    #[test]
    fn test_stmt_func_call_checks_arity() {
        let program = Parser::new("F(X, Y) = X * Y\nZ = F(1.0)\nEND\n").unwrap().parse().unwrap();
        let errors = SemanticAnalyzer::default().analyze(&program).unwrap_err();
        assert!(errors[0].message().contains("takes 2 arguments"));
    }
}
