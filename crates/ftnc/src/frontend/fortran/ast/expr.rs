//! Expression and reference nodes

use crate::common::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The name when this expression is a bare variable reference
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Lhs(lhs) => match &lhs.kind {
                LhsKind::Variable(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral(i64),
    /// Real literal; `double` is set by a `D` exponent
    RealLiteral { value: f64, double: bool },
    LogicalLiteral(bool),
    CharLiteral(String),
    /// Variable, array element, member access or function reference
    Lhs(Lhs),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Eqv,
    Neqv,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Eqv | BinaryOp::Neqv)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
            BinaryOp::Concat => "//",
            BinaryOp::Eq => ".EQ.",
            BinaryOp::Ne => ".NE.",
            BinaryOp::Lt => ".LT.",
            BinaryOp::Le => ".LE.",
            BinaryOp::Gt => ".GT.",
            BinaryOp::Ge => ".GE.",
            BinaryOp::And => ".AND.",
            BinaryOp::Or => ".OR.",
            BinaryOp::Eqv => ".EQV.",
            BinaryOp::Neqv => ".NEQV.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => ".NOT.",
        }
    }
}

/// Reference that may appear on the left of an assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Lhs {
    pub kind: LhsKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LhsKind {
    Variable(String),
    /// `parent(index, ...)`
    Array { parent: Box<Lhs>, index: Vec<ArrayRange> },
    /// `parent%name`
    Member { parent: Box<Lhs>, name: String },
}

impl Lhs {
    pub fn new(kind: LhsKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Name of the variable at the root of the reference chain
    pub fn base_name(&self) -> &str {
        match &self.kind {
            LhsKind::Variable(name) => name,
            LhsKind::Array { parent, .. } | LhsKind::Member { parent, .. } => parent.base_name(),
        }
    }
}

/// One subscript entry: `first`, `first:last`, `first:last:stride`, `:` ...
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRange {
    pub is_slice: bool,
    pub first: Option<Expr>,
    pub last: Option<Expr>,
    pub stride: Option<Expr>,
    pub span: Span,
}

impl ArrayRange {
    /// A single subscript expression
    pub fn single(expr: Expr) -> Self {
        let span = expr.span;
        Self {
            is_slice: false,
            first: Some(expr),
            last: None,
            stride: None,
            span,
        }
    }

    /// Exactly one expression with no bounds or stride
    pub fn is_trivial(&self) -> bool {
        !self.is_slice && self.first.is_some() && self.last.is_none() && self.stride.is_none()
    }
}
