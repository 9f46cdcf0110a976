//! Statement nodes

use crate::common::Span;
use super::{DerivedTypeDef, Expr, Lhs, TypeDecl};

/// Statement label (`10 CONTINUE`)
pub type Label = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub label: Option<Label>,
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { label: None, kind, span }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: Lhs,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    ImplicitNone,
    Declaration(TypeDecl),
    DerivedType(DerivedTypeDef),
    /// `PARAMETER (N = expr, ...)`
    Parameter(Vec<(String, Expr)>),
    Intrinsic(Vec<String>),
    Assignment(Assignment),
    /// `IF (cond) stmt`
    IfStatement { cond: Expr, stmt: Box<Stmt> },
    /// `IF (cond) l1, l2, l3`
    IfComputed { cond: Expr, labels: Vec<Label> },
    Goto(Label),
    Continue,
}

/// A program unit: optional `PROGRAM name` header, statements, `END`
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}
