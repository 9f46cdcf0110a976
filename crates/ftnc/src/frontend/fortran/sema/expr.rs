//! Expression resolution, typing and implicit casts

use tracing::debug;

use super::{DeclKind, SemaLhs, SemaLhsKind, SemanticAnalyzer, TypeVal};
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{ArrayRange, BinaryOp, Expr, ExprKind, Lhs, LhsKind, UnaryOp};
use crate::types::{TypeAttrs, TypeId};

/// A typed expression
#[derive(Debug, Clone, PartialEq)]
pub struct SemaExpr {
    pub kind: SemaExprKind,
    pub ty: TypeId,
    /// Folded value when the expression is constant
    pub constant: Option<TypeVal>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemaExprKind {
    /// Literal; the value is in `constant`
    Constant,
    Lhs(SemaLhs),
    /// Conversion of the operand to this expression's type
    Cast(Box<SemaExpr>),
    Unary {
        op: UnaryOp,
        operand: Box<SemaExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<SemaExpr>,
        right: Box<SemaExpr>,
    },
    /// Statement function reference
    Call { name: String, args: Vec<SemaExpr> },
}

impl SemaExpr {
    pub fn constant(value: TypeVal, ty: TypeId, span: Span) -> Self {
        Self {
            kind: SemaExprKind::Constant,
            ty,
            constant: Some(value),
            span,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

impl SemanticAnalyzer {
    /// Resolve a parsed expression to a typed one
    pub fn resolve_expr(&mut self, expr: &Expr) -> CompileResult<SemaExpr> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::IntLiteral(value) => {
                let ty = self.types.integer(0);
                Ok(SemaExpr::constant(TypeVal::Integer(*value), ty, span))
            }
            ExprKind::RealLiteral { value, double } => {
                let kind = if *double { self.types.default_kind() * 2 } else { 0 };
                let ty = self.types.real(kind);
                Ok(SemaExpr::constant(TypeVal::Real(*value), ty, span))
            }
            ExprKind::LogicalLiteral(value) => {
                let ty = self.types.logical(0);
                Ok(SemaExpr::constant(TypeVal::Logical(*value), ty, span))
            }
            ExprKind::CharLiteral(text) => {
                let ty = self.types.character(text.chars().count() as u32, TypeAttrs::NONE);
                Ok(SemaExpr::constant(TypeVal::Character(text.clone()), ty, span))
            }
            ExprKind::Lhs(lhs) => self.resolve_reference(lhs),
            ExprKind::Unary { op, operand } => self.resolve_unary(*op, operand, span),
            ExprKind::Binary { op, left, right } => self.resolve_binary(*op, left, right, span),
        }
    }

    /// Resolve an expression that must fold to a constant
    pub fn resolve_constant(&mut self, expr: &Expr) -> CompileResult<SemaExpr> {
        let resolved = self.resolve_expr(expr)?;
        if !resolved.is_constant() {
            return Err(CompileError::semantic("expression must be constant", expr.span));
        }
        Ok(resolved)
    }

    /// Resolve a constant INTEGER expression
    pub fn resolve_const_integer(&mut self, expr: &Expr, what: &str) -> CompileResult<i64> {
        let resolved = self.resolve_constant(expr)?;
        resolved
            .constant
            .as_ref()
            .and_then(TypeVal::as_integer)
            .ok_or_else(|| {
                CompileError::type_error(format!("{} must be a constant INTEGER", what), expr.span)
            })
    }

    /// Convert `expr` to `ty`. On failure the expression is handed back
    /// unchanged.
    ///
    /// Any two numeric types convert into each other and CHARACTER converts
    /// to CHARACTER of any length; nothing else has a cast.
    pub fn cast(&self, expr: SemaExpr, ty: TypeId) -> Result<SemaExpr, SemaExpr> {
        if expr.ty == ty {
            return Ok(expr);
        }

        let types = &self.types;
        let convertible = (types.is_numeric(expr.ty) && types.is_numeric(ty))
            || (types.is_character(expr.ty) && types.is_character(ty));
        if !convertible {
            return Err(expr);
        }

        debug!(from = %types.display(expr.ty), to = %types.display(ty), "inserting cast");
        let constant = expr.constant.as_ref().and_then(|value| value.convert(types, ty));
        let span = expr.span;
        Ok(SemaExpr {
            kind: SemaExprKind::Cast(Box::new(expr)),
            ty,
            constant,
            span,
        })
    }

    /// Cast only when `expr` is not already compatible with `ty`, reporting
    /// a type mismatch when no cast exists
    pub(super) fn coerce(&self, expr: SemaExpr, ty: TypeId, span: Span) -> CompileResult<SemaExpr> {
        if self.types.compatible(ty, expr.ty) {
            return Ok(expr);
        }
        self.cast(expr, ty).map_err(|expr| {
            CompileError::type_mismatch(self.types.display(expr.ty), self.types.display(ty), span)
        })
    }

    // =========================================================================
    // References
    // =========================================================================

    fn resolve_reference(&mut self, lhs: &Lhs) -> CompileResult<SemaExpr> {
        if let LhsKind::Array { parent, index } = &lhs.kind {
            if let LhsKind::Variable(name) = &parent.kind {
                match self.find_decl(name).map(|decl| &decl.kind) {
                    Some(DeclKind::StatementFunction { .. }) => {
                        return self.resolve_call(name, index, lhs.span);
                    }
                    Some(DeclKind::Intrinsic) => {
                        return Err(CompileError::semantic(
                            format!("intrinsic function '{}' is not supported", name),
                            lhs.span,
                        ));
                    }
                    _ => {}
                }
            }
        }

        let resolved = self.resolve_lhs(lhs)?;
        let base = resolved.base_name().to_string();
        let constant = match &resolved.kind {
            SemaLhsKind::Variable(name) => match self.find_decl(name).map(|decl| &decl.kind) {
                Some(DeclKind::Constant(value)) => Some(value.clone()),
                _ => None,
            },
            _ => None,
        };
        self.mark_used(&base, false, lhs.span)?;

        Ok(SemaExpr {
            ty: resolved.ty,
            span: resolved.span,
            kind: SemaExprKind::Lhs(resolved),
            constant,
        })
    }

    fn resolve_call(&mut self, name: &str, index: &[ArrayRange], span: Span) -> CompileResult<SemaExpr> {
        let (dummies, ty) = match self.find_decl(name) {
            Some(decl) => match &decl.kind {
                DeclKind::StatementFunction { args } => (args.clone(), decl.ty),
                _ => return Err(CompileError::semantic(format!("'{}' is not a function", name), span)),
            },
            None => return Err(CompileError::semantic(format!("unknown function '{}'", name), span)),
        };

        if index.len() != dummies.len() {
            return Err(CompileError::semantic(
                format!(
                    "statement function '{}' takes {} arguments, found {}",
                    name,
                    dummies.len(),
                    index.len()
                ),
                span,
            ));
        }

        let mut args = Vec::with_capacity(index.len());
        for (range, dummy) in index.iter().zip(dummies) {
            let Some(first) = range.first.as_ref().filter(|_| range.is_trivial()) else {
                return Err(CompileError::semantic("array sections are not supported", range.span));
            };
            let arg = self.resolve_expr(first)?;
            args.push(self.coerce(arg, dummy, range.span)?);
        }
        self.mark_used(name, false, span)?;

        Ok(SemaExpr {
            kind: SemaExprKind::Call {
                name: name.to_string(),
                args,
            },
            ty,
            constant: None,
            span,
        })
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn resolve_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> CompileResult<SemaExpr> {
        let operand = self.resolve_expr(operand)?;

        let valid = match op {
            UnaryOp::Plus | UnaryOp::Neg => self.types.is_numeric(operand.ty),
            UnaryOp::Not => self.types.is_logical_like(operand.ty),
        };
        if !valid {
            return Err(CompileError::type_error(
                format!(
                    "operator '{}' cannot be applied to {}",
                    op.symbol(),
                    self.types.display(operand.ty)
                ),
                span,
            ));
        }

        let ty = self.types.without_attrs(operand.ty);
        let constant = operand.constant.as_ref().and_then(|value| TypeVal::unary(op, value));
        Ok(SemaExpr {
            kind: SemaExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            constant,
            span,
        })
    }

    fn resolve_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> CompileResult<SemaExpr> {
        let left = self.resolve_expr(left)?;
        let right = self.resolve_expr(right)?;
        let (lt, rt) = (left.ty, right.ty);

        let types = &self.types;
        let numeric = types.is_numeric(lt) && types.is_numeric(rt);
        let character = types.is_character(lt) && types.is_character(rt);
        let logical = types.is_logical_like(lt) && types.is_logical_like(rt);

        // Operand type both sides are cast to, and the result type
        let (operand_ty, result_ty) = if op.is_arithmetic() && numeric {
            let promoted = self.types.promote(Some(lt), Some(rt));
            (promoted, promoted)
        } else if op.is_relational() && numeric {
            let promoted = self.types.promote(Some(lt), Some(rt));
            (promoted, promoted.map(|_| self.types.logical(0)))
        } else if op.is_relational() && character {
            (None, Some(self.types.logical(0)))
        } else if op.is_logical() && logical {
            let promoted = self.types.promote(Some(lt), Some(rt));
            (promoted, promoted)
        } else if op == BinaryOp::Concat && character {
            let Some(len) = self.types.size_kind(lt).checked_add(self.types.size_kind(rt)) else {
                return Err(CompileError::type_error("CHARACTER length overflow", span));
            };
            (None, Some(self.types.character(len, TypeAttrs::NONE)))
        } else {
            (None, None)
        };

        let Some(result_ty) = result_ty else {
            return Err(CompileError::type_error(
                format!(
                    "operator '{}' cannot combine {} and {}",
                    op.symbol(),
                    self.types.display(lt),
                    self.types.display(rt)
                ),
                span,
            ));
        };

        let (left, right) = match operand_ty {
            Some(ty) => (self.coerce(left, ty, span)?, self.coerce(right, ty, span)?),
            None => (left, right),
        };

        let constant = match (&left.constant, &right.constant) {
            (Some(a), Some(b)) => TypeVal::binary(op, a, b),
            _ => None,
        };

        Ok(SemaExpr {
            kind: SemaExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty: result_ty,
            constant,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::fortran::parser::Parser;
    use pretty_assertions::assert_eq;

    fn resolve(analyzer: &mut SemanticAnalyzer, source: &str) -> CompileResult<SemaExpr> {
        let expr = Parser::new(source).unwrap().parse_expr().unwrap();
        analyzer.resolve_expr(&expr)
    }

    #[test]
    fn test_literal_types() {
        let mut analyzer = SemanticAnalyzer::default();
        let int = resolve(&mut analyzer, "42").unwrap();
        let double = resolve(&mut analyzer, "1.0D0").unwrap();
        let text = resolve(&mut analyzer, "'abc'").unwrap();
        assert_eq!(analyzer.types().display(int.ty), "INTEGER*4");
        assert_eq!(analyzer.types().display(double.ty), "REAL*8");
        assert_eq!(analyzer.types().display(text.ty), "CHARACTER*3");
    }

    #[test]
    fn test_mixed_arithmetic_promotes_and_casts() {
        let mut analyzer = SemanticAnalyzer::default();
        let expr = resolve(&mut analyzer, "1 + 2.5").unwrap();
        assert_eq!(analyzer.types().display(expr.ty), "REAL*4");
        assert_eq!(expr.constant, Some(TypeVal::Real(3.5)));

        let SemaExprKind::Binary { left, .. } = &expr.kind else {
            panic!("expected binary expression");
        };
        assert!(matches!(left.kind, SemaExprKind::Cast(_)));
    }

    #[test]
    fn test_comparison_yields_logical() {
        let mut analyzer = SemanticAnalyzer::default();
        let expr = resolve(&mut analyzer, "2 .LT. 3.0").unwrap();
        assert_eq!(analyzer.types().display(expr.ty), "LOGICAL*4");
        assert_eq!(expr.constant, Some(TypeVal::Logical(true)));
    }

    #[test]
    fn test_concat_adds_lengths() {
        let mut analyzer = SemanticAnalyzer::default();
        let expr = resolve(&mut analyzer, "'ab' // 'cde'").unwrap();
        assert_eq!(analyzer.types().display(expr.ty), "CHARACTER*5");
        assert_eq!(expr.constant, Some(TypeVal::Character("abcde".to_string())));
    }

    #[test]
    fn test_concat_length_overflow_is_an_error() {
        let mut analyzer = SemanticAnalyzer::default();
        let stmt = Parser::new("CHARACTER*4000000000 S").unwrap().parse_statement().unwrap();
        analyzer.analyze_stmt(&stmt).unwrap();

        let err = resolve(&mut analyzer, "S // S").unwrap_err();
        assert!(matches!(err, CompileError::Type { .. }));
        assert_eq!(err.message(), "CHARACTER length overflow");

        let expr = resolve(&mut analyzer, "S // 'abc'").unwrap();
        assert_eq!(analyzer.types().display(expr.ty), "CHARACTER*4000000003");
    }

    #[test]
    fn test_operator_type_errors() {
        let mut analyzer = SemanticAnalyzer::default();
        let err = resolve(&mut analyzer, "'a' + 1").unwrap_err();
        assert!(matches!(err, CompileError::Type { .. }));
        assert!(err.message().contains("CHARACTER*1"));

        assert!(resolve(&mut analyzer, "1 .AND. .TRUE.").is_err());
        assert!(resolve(&mut analyzer, ".NOT. 1.5").is_err());
    }

    #[test]
    fn test_cast_rules() {
        let mut analyzer = SemanticAnalyzer::default();
        let real = resolve(&mut analyzer, "2.5").unwrap();
        let int4 = analyzer.types.integer(4);
        let cast = analyzer.cast(real, int4).unwrap();
        assert_eq!(cast.constant, Some(TypeVal::Integer(2)));

        let text = resolve(&mut analyzer, "'abc'").unwrap();
        let back = analyzer.cast(text, int4).unwrap_err();
        assert_eq!(back.constant, Some(TypeVal::Character("abc".to_string())));
    }

    #[test]
    fn test_implicit_variables_are_declared_and_used() {
        let mut analyzer = SemanticAnalyzer::default();
        let expr = resolve(&mut analyzer, "I * X").unwrap();
        assert_eq!(analyzer.types().display(expr.ty), "REAL*4");
        assert!(expr.constant.is_none());

        let decl = analyzer.find_decl("I").unwrap();
        assert!(decl.is_implicit);
        assert!(decl.used);
        assert!(decl.is_final());
    }

    #[test]
    fn test_implicit_none_rejects_undeclared() {
        let mut analyzer = SemanticAnalyzer::new(&crate::frontend::LangOpts {
            implicit_none: true,
            ..Default::default()
        });
        let err = resolve(&mut analyzer, "X + 1").unwrap_err();
        assert!(err.message().contains("no IMPLICIT type"));
    }
}
