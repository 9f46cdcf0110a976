//! Type specifications as written in declarations

use crate::common::Span;
use super::{ArrayRange, Expr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    Logical,
    Integer,
    Real,
    DoublePrecision,
    Complex,
    DoubleComplex,
    Byte,
    Character,
    /// `TYPE(name)`
    Derived(String),
}

/// Parenthesized type parameter, e.g. `KIND=8` or an unnamed `(8)`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: Option<String>,
    pub value: Expr,
    pub span: Span,
}

/// Attributes following the type in a declaration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclAttrs {
    pub is_static: bool,
    pub is_automatic: bool,
    pub is_volatile: bool,
    pub is_pointer: bool,
    pub is_parameter: bool,
    pub dimension: Option<Vec<ArrayRange>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: TypeName,
    /// `*N` selector
    pub kind: Option<u32>,
    pub params: Vec<TypeParam>,
    pub attrs: DeclAttrs,
    pub span: Span,
}

/// One declared name: `NAME[(dims)][*N][= init]`
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    pub name: String,
    pub dims: Option<Vec<ArrayRange>>,
    pub kind: Option<u32>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub ty: TypeSpec,
    pub entities: Vec<EntityDecl>,
    pub span: Span,
}

/// `TYPE name` ... `END TYPE`
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTypeDef {
    pub name: String,
    pub members: Vec<TypeDecl>,
    pub span: Span,
}
