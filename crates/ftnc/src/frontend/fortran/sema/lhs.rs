//! Resolution of variable references

use super::{DeclKind, SemaExpr, SemanticAnalyzer};
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{Lhs, LhsKind};
use crate::types::{TypeId, TypeKind};

/// A resolved reference to storage
#[derive(Debug, Clone, PartialEq)]
pub struct SemaLhs {
    pub kind: SemaLhsKind,
    pub ty: TypeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SemaLhsKind {
    Variable(String),
    /// Array element; one integer subscript per dimension
    Element {
        parent: Box<SemaLhs>,
        index: Vec<SemaExpr>,
    },
    /// Structure member, with its position in the structure
    Member {
        parent: Box<SemaLhs>,
        name: String,
        index: usize,
    },
}

impl SemaLhs {
    /// Name of the variable at the root of the reference
    pub fn base_name(&self) -> &str {
        match &self.kind {
            SemaLhsKind::Variable(name) => name,
            SemaLhsKind::Element { parent, .. } | SemaLhsKind::Member { parent, .. } => {
                parent.base_name()
            }
        }
    }
}

impl SemanticAnalyzer {
    /// Bind a reference to its declaration, declaring it implicitly if
    /// implicit typing allows. Does not mark the declaration used.
    pub fn resolve_lhs(&mut self, lhs: &Lhs) -> CompileResult<SemaLhs> {
        match &lhs.kind {
            LhsKind::Variable(name) => {
                let (_, decl) = self.declared(name, lhs.span)?;
                match decl.kind {
                    DeclKind::Variable | DeclKind::Constant(_) => {}
                    DeclKind::Intrinsic => {
                        return Err(CompileError::semantic(
                            format!("intrinsic '{}' cannot be used as a variable", name),
                            lhs.span,
                        ));
                    }
                    DeclKind::StatementFunction { .. } => {
                        return Err(CompileError::semantic(
                            format!("statement function '{}' cannot be used as a variable", name),
                            lhs.span,
                        ));
                    }
                }

                Ok(SemaLhs {
                    kind: SemaLhsKind::Variable(name.clone()),
                    ty: decl.ty,
                    span: lhs.span,
                })
            }

            LhsKind::Array { parent, index } => {
                let parent = self.resolve_lhs(parent)?;
                let (element, rank) = match &self.types.get(parent.ty).kind {
                    TypeKind::Array(element, shape) => (*element, shape.rank()),
                    _ => {
                        return Err(CompileError::semantic(
                            format!("'{}' is not an array", parent.base_name()),
                            lhs.span,
                        ));
                    }
                };

                if index.len() != rank {
                    return Err(CompileError::semantic(
                        format!(
                            "'{}' has rank {} but is referenced with {} subscripts",
                            parent.base_name(),
                            rank,
                            index.len()
                        ),
                        lhs.span,
                    ));
                }

                let mut subscripts = Vec::with_capacity(index.len());
                for range in index {
                    let Some(first) = range.first.as_ref().filter(|_| range.is_trivial()) else {
                        return Err(CompileError::semantic(
                            "array sections are not supported",
                            range.span,
                        ));
                    };

                    let subscript = self.resolve_expr(first)?;
                    if !self.types.is_integer_like(subscript.ty) {
                        return Err(CompileError::type_error(
                            format!(
                                "array subscript must be INTEGER, found {}",
                                self.types.display(subscript.ty)
                            ),
                            range.span,
                        ));
                    }
                    subscripts.push(subscript);
                }

                Ok(SemaLhs {
                    kind: SemaLhsKind::Element {
                        parent: Box::new(parent),
                        index: subscripts,
                    },
                    ty: element,
                    span: lhs.span,
                })
            }

            LhsKind::Member { parent, name } => {
                let parent = self.resolve_lhs(parent)?;
                let TypeKind::Structure(structure) = self.types.get(parent.ty).kind else {
                    return Err(CompileError::semantic(
                        format!("'{}' is not a derived type", parent.base_name()),
                        lhs.span,
                    ));
                };

                let def = self.types.structure_def(structure);
                let Some((index, ty)) = def.member(name) else {
                    return Err(CompileError::semantic(
                        format!("TYPE({}) has no member '{}'", def.name, name),
                        lhs.span,
                    ));
                };

                Ok(SemaLhs {
                    kind: SemaLhsKind::Member {
                        parent: Box::new(parent),
                        name: name.clone(),
                        index,
                    },
                    ty,
                    span: lhs.span,
                })
            }
        }
    }
}
