//! Compile-time constant values

use std::fmt;

use crate::frontend::fortran::ast::{BinaryOp, UnaryOp};
use crate::types::{TypeId, TypeKind, TypeRegistry};

/// Longest CHARACTER value that conversion will blank-pad at compile time
pub const MAX_PADDED_LEN: usize = 1 << 16;

/// Value of a constant expression
#[derive(Debug, Clone, PartialEq)]
pub enum TypeVal {
    Logical(bool),
    Integer(i64),
    Real(f64),
    Complex(f64, f64),
    Character(String),
}

impl TypeVal {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypeVal::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            TypeVal::Logical(value) => Some(*value),
            _ => None,
        }
    }

    fn as_real(&self) -> Option<f64> {
        match self {
            TypeVal::Integer(value) => Some(*value as f64),
            TypeVal::Real(value) => Some(*value),
            TypeVal::Complex(re, _) => Some(*re),
            TypeVal::Logical(value) => Some(f64::from(u8::from(*value))),
            TypeVal::Character(_) => None,
        }
    }

    /// Convert to the value category of `ty`, as an explicit cast would
    pub fn convert(&self, types: &TypeRegistry, ty: TypeId) -> Option<TypeVal> {
        match &types.get(ty).kind {
            TypeKind::Integer(_) | TypeKind::Byte => match self {
                TypeVal::Integer(value) => Some(TypeVal::Integer(*value)),
                TypeVal::Logical(value) => Some(TypeVal::Integer(i64::from(*value))),
                TypeVal::Real(_) | TypeVal::Complex(..) => {
                    self.as_real().map(|value| TypeVal::Integer(value.trunc() as i64))
                }
                TypeVal::Character(_) => None,
            },
            TypeKind::Real(_) => self.as_real().map(TypeVal::Real),
            TypeKind::Complex(_) => match self {
                TypeVal::Complex(re, im) => Some(TypeVal::Complex(*re, *im)),
                _ => self.as_real().map(|re| TypeVal::Complex(re, 0.0)),
            },
            TypeKind::Logical(_) => match self {
                TypeVal::Logical(value) => Some(TypeVal::Logical(*value)),
                TypeVal::Integer(value) => Some(TypeVal::Logical(*value != 0)),
                _ => None,
            },
            TypeKind::Character(len) => match self {
                TypeVal::Character(text) => {
                    let len = *len as usize;
                    let count = text.chars().count();
                    if count >= len {
                        return Some(TypeVal::Character(text.chars().take(len).collect()));
                    }
                    // Blank padding this long is left to run time
                    if len > MAX_PADDED_LEN {
                        return None;
                    }
                    let mut text = text.clone();
                    text.extend(std::iter::repeat(' ').take(len - count));
                    Some(TypeVal::Character(text))
                }
                _ => None,
            },
            TypeKind::Structure(_) | TypeKind::Pointer(_) | TypeKind::Array(..) => None,
        }
    }

    /// Fold a unary operation. `None` when the operand has the wrong category.
    pub fn unary(op: UnaryOp, operand: &TypeVal) -> Option<TypeVal> {
        match (op, operand) {
            (UnaryOp::Plus, value) if !matches!(value, TypeVal::Character(_)) => Some(value.clone()),
            (UnaryOp::Neg, TypeVal::Integer(value)) => value.checked_neg().map(TypeVal::Integer),
            (UnaryOp::Neg, TypeVal::Real(value)) => Some(TypeVal::Real(-value)),
            (UnaryOp::Neg, TypeVal::Complex(re, im)) => Some(TypeVal::Complex(-re, -im)),
            (UnaryOp::Not, TypeVal::Logical(value)) => Some(TypeVal::Logical(!value)),
            _ => None,
        }
    }

    /// Fold a binary operation over operands already converted to a common
    /// type. `None` leaves the expression unfolded: overflow, division by zero
    /// and mixed categories are not constant-folded.
    pub fn binary(op: BinaryOp, left: &TypeVal, right: &TypeVal) -> Option<TypeVal> {
        use TypeVal::*;

        if op.is_relational() {
            return Self::compare(op, left, right).map(Logical);
        }

        match (op, left, right) {
            (BinaryOp::Add, Integer(a), Integer(b)) => a.checked_add(*b).map(Integer),
            (BinaryOp::Sub, Integer(a), Integer(b)) => a.checked_sub(*b).map(Integer),
            (BinaryOp::Mul, Integer(a), Integer(b)) => a.checked_mul(*b).map(Integer),
            (BinaryOp::Div, Integer(a), Integer(b)) => a.checked_div(*b).map(Integer),
            (BinaryOp::Pow, Integer(a), Integer(b)) => {
                u32::try_from(*b).ok().and_then(|b| a.checked_pow(b)).map(Integer)
            }

            (BinaryOp::Add, Real(a), Real(b)) => Some(Real(a + b)),
            (BinaryOp::Sub, Real(a), Real(b)) => Some(Real(a - b)),
            (BinaryOp::Mul, Real(a), Real(b)) => Some(Real(a * b)),
            (BinaryOp::Div, Real(a), Real(b)) if *b != 0.0 => Some(Real(a / b)),
            (BinaryOp::Pow, Real(a), Real(b)) => Some(Real(a.powf(*b))),

            (BinaryOp::Add, Complex(ar, ai), Complex(br, bi)) => Some(Complex(ar + br, ai + bi)),
            (BinaryOp::Sub, Complex(ar, ai), Complex(br, bi)) => Some(Complex(ar - br, ai - bi)),
            (BinaryOp::Mul, Complex(ar, ai), Complex(br, bi)) => {
                Some(Complex(ar * br - ai * bi, ar * bi + ai * br))
            }

            (BinaryOp::And, Logical(a), Logical(b)) => Some(Logical(*a && *b)),
            (BinaryOp::Or, Logical(a), Logical(b)) => Some(Logical(*a || *b)),
            (BinaryOp::Eqv, Logical(a), Logical(b)) => Some(Logical(a == b)),
            (BinaryOp::Neqv, Logical(a), Logical(b)) => Some(Logical(a != b)),

            (BinaryOp::Concat, Character(a), Character(b)) => Some(Character(format!("{}{}", a, b))),
            _ => None,
        }
    }

    fn compare(op: BinaryOp, left: &TypeVal, right: &TypeVal) -> Option<bool> {
        use std::cmp::Ordering;

        let ordering = match (left, right) {
            (TypeVal::Integer(a), TypeVal::Integer(b)) => a.cmp(b),
            (TypeVal::Real(a), TypeVal::Real(b)) => a.partial_cmp(b)?,
            (TypeVal::Character(a), TypeVal::Character(b)) => a.cmp(b),
            (TypeVal::Complex(ar, ai), TypeVal::Complex(br, bi)) => {
                let equal = ar == br && ai == bi;
                return match op {
                    BinaryOp::Eq => Some(equal),
                    BinaryOp::Ne => Some(!equal),
                    _ => None,
                };
            }
            _ => return None,
        };

        Some(match op {
            BinaryOp::Eq => ordering == Ordering::Equal,
            BinaryOp::Ne => ordering != Ordering::Equal,
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeVal::Logical(true) => write!(f, ".TRUE."),
            TypeVal::Logical(false) => write!(f, ".FALSE."),
            TypeVal::Integer(value) => write!(f, "{}", value),
            TypeVal::Real(value) => write!(f, "{:?}", value),
            TypeVal::Complex(re, im) => write!(f, "({:?}, {:?})", re, im),
            TypeVal::Character(text) => write!(f, "'{}'", text.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_folding() {
        let (two, three) = (TypeVal::Integer(2), TypeVal::Integer(3));
        assert_eq!(TypeVal::binary(BinaryOp::Add, &two, &three), Some(TypeVal::Integer(5)));
        assert_eq!(TypeVal::binary(BinaryOp::Pow, &two, &three), Some(TypeVal::Integer(8)));
        assert_eq!(TypeVal::binary(BinaryOp::Div, &three, &two), Some(TypeVal::Integer(1)));
        assert_eq!(TypeVal::binary(BinaryOp::Lt, &two, &three), Some(TypeVal::Logical(true)));
    }

    #[test]
    fn test_folding_declines_undefined_results() {
        let zero = TypeVal::Integer(0);
        let max = TypeVal::Integer(i64::MAX);
        assert_eq!(TypeVal::binary(BinaryOp::Div, &max, &zero), None);
        assert_eq!(TypeVal::binary(BinaryOp::Add, &max, &max), None);
        assert_eq!(TypeVal::binary(BinaryOp::Pow, &max, &TypeVal::Integer(-1)), None);
        assert_eq!(TypeVal::binary(BinaryOp::Add, &zero, &TypeVal::Real(1.0)), None);
    }

    #[test]
    fn test_unary_folding() {
        assert_eq!(TypeVal::unary(UnaryOp::Neg, &TypeVal::Real(1.5)), Some(TypeVal::Real(-1.5)));
        assert_eq!(
            TypeVal::unary(UnaryOp::Not, &TypeVal::Logical(true)),
            Some(TypeVal::Logical(false))
        );
        assert_eq!(TypeVal::unary(UnaryOp::Not, &TypeVal::Integer(1)), None);
    }

    #[test]
    fn test_convert_follows_target_type() {
        let mut types = TypeRegistry::default();
        let int4 = types.integer(4);
        let complex8 = types.complex(8);
        let chars = types.character(3, crate::types::TypeAttrs::NONE);

        assert_eq!(TypeVal::Real(2.75).convert(&types, int4), Some(TypeVal::Integer(2)));
        assert_eq!(
            TypeVal::Integer(2).convert(&types, complex8),
            Some(TypeVal::Complex(2.0, 0.0))
        );
        assert_eq!(
            TypeVal::Character("AB".to_string()).convert(&types, chars),
            Some(TypeVal::Character("AB ".to_string()))
        );
        assert_eq!(TypeVal::Character("AB".to_string()).convert(&types, int4), None);
    }

    #[test]
    fn test_convert_character_lengths() {
        let mut types = TypeRegistry::default();
        let short = types.character(2, crate::types::TypeAttrs::NONE);
        let padded = types.character(MAX_PADDED_LEN as u32, crate::types::TypeAttrs::NONE);
        let huge = types.character(u32::MAX, crate::types::TypeAttrs::NONE);
        let text = TypeVal::Character("ABC".to_string());

        assert_eq!(text.convert(&types, short), Some(TypeVal::Character("AB".to_string())));
        let Some(TypeVal::Character(value)) = text.convert(&types, padded) else {
            panic!("expected a padded constant");
        };
        assert_eq!(value.len(), MAX_PADDED_LEN);
        assert!(value.starts_with("ABC "));
        assert_eq!(text.convert(&types, huge), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeVal::Real(1.0).to_string(), "1.0");
        assert_eq!(TypeVal::Character("it's".to_string()).to_string(), "'it''s'");
        assert_eq!(TypeVal::Logical(false).to_string(), ".FALSE.");
    }
}
