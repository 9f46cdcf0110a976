//! Canonical type system
//!
//! Every distinct type is interned by [`TypeRegistry`] into a single
//! canonical instance, referenced everywhere else through a [`TypeId`].
//! Two ids are equal exactly when the types they name are structurally equal,
//! so downstream code compares types with `==` on ids.
//!
//! The type algebra (sizes, promotion, compatibility) lives in `algebra.rs`
//! as further methods on the registry.

mod algebra;
mod array;
mod registry;
mod structure;

use std::fmt;

pub use array::{ArrayDim, ArrayShape};
pub use registry::TypeRegistry;
pub use structure::{StructMember, StructureDef, StructureId};

/// Canonical reference to an interned type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

/// Type category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Logical,
    Integer,
    Real,
    Complex,
    Byte,
    Character,
    Structure,
    Pointer,
    Array,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Logical => "LOGICAL",
            TypeTag::Integer => "INTEGER",
            TypeTag::Real => "REAL",
            TypeTag::Complex => "COMPLEX",
            TypeTag::Byte => "BYTE",
            TypeTag::Character => "CHARACTER",
            TypeTag::Structure => "STRUCTURE",
            TypeTag::Pointer => "POINTER",
            TypeTag::Array => "ARRAY",
        }
    }

    /// Tags that carry a size-kind and no substructure
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeTag::Logical
                | TypeTag::Integer
                | TypeTag::Real
                | TypeTag::Complex
                | TypeTag::Byte
                | TypeTag::Character
        )
    }

    fn hash_value(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration attributes carried by a type.
///
/// They take part in hashing and comparison, so `INTEGER` and
/// `INTEGER, VOLATILE` are distinct canonical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeAttrs {
    pub is_static: bool,
    pub is_automatic: bool,
    pub is_volatile: bool,
}

impl TypeAttrs {
    pub const NONE: TypeAttrs = TypeAttrs {
        is_static: false,
        is_automatic: false,
        is_volatile: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Each flag owns its own bit so every subset sums differently
    fn hash_value(&self) -> u64 {
        let mut hash = 0;
        if self.is_static {
            hash += 16;
        }
        if self.is_automatic {
            hash += 32;
        }
        if self.is_volatile {
            hash += 64;
        }
        hash
    }
}

/// Variant payload of a type descriptor
#[derive(Debug, Clone)]
pub enum TypeKind {
    Logical(u32),
    Integer(u32),
    Real(u32),
    Complex(u32),
    Byte,
    /// Character string of the given length
    Character(u32),
    Structure(StructureId),
    Pointer(TypeId),
    Array(TypeId, ArrayShape),
}

/// Type descriptor. Only canonical once returned by [`TypeRegistry::intern`].
#[derive(Debug, Clone)]
pub struct Type {
    pub kind: TypeKind,
    pub attrs: TypeAttrs,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            attrs: TypeAttrs::NONE,
        }
    }

    pub fn with_attrs(mut self, attrs: TypeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn tag(&self) -> TypeTag {
        match self.kind {
            TypeKind::Logical(_) => TypeTag::Logical,
            TypeKind::Integer(_) => TypeTag::Integer,
            TypeKind::Real(_) => TypeTag::Real,
            TypeKind::Complex(_) => TypeTag::Complex,
            TypeKind::Byte => TypeTag::Byte,
            TypeKind::Character(_) => TypeTag::Character,
            TypeKind::Structure(_) => TypeTag::Structure,
            TypeKind::Pointer(_) => TypeTag::Pointer,
            TypeKind::Array(..) => TypeTag::Array,
        }
    }

    /// Byte-width selector of a primitive, 0 for composite types
    pub fn size_kind(&self) -> u32 {
        match self.kind {
            TypeKind::Logical(kind)
            | TypeKind::Integer(kind)
            | TypeKind::Real(kind)
            | TypeKind::Complex(kind)
            | TypeKind::Character(kind) => kind,
            TypeKind::Byte => 1,
            TypeKind::Structure(_) | TypeKind::Pointer(_) | TypeKind::Array(..) => 0,
        }
    }

    /// Rebuild a primitive of this type's tag with a different kind
    fn with_size_kind(&self, kind: u32) -> Option<Type> {
        let kind = match self.kind {
            TypeKind::Logical(_) => TypeKind::Logical(kind),
            TypeKind::Integer(_) => TypeKind::Integer(kind),
            TypeKind::Real(_) => TypeKind::Real(kind),
            TypeKind::Complex(_) => TypeKind::Complex(kind),
            TypeKind::Character(_) => TypeKind::Character(kind),
            TypeKind::Byte => TypeKind::Byte,
            TypeKind::Structure(_) | TypeKind::Pointer(_) | TypeKind::Array(..) => return None,
        };
        Some(Type {
            kind,
            attrs: self.attrs,
        })
    }
}
