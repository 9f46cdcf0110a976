//! Type algebra: sizes, category queries and numeric promotion

use super::{Type, TypeAttrs, TypeId, TypeKind, TypeRegistry, TypeTag};

impl TypeRegistry {
    // ==================== Sizes ====================

    /// Storage size in bytes, saturating at `u64::MAX` for sizes that do
    /// not fit
    pub fn size_of(&self, id: TypeId) -> u64 {
        match &self.get(id).kind {
            TypeKind::Logical(kind) | TypeKind::Integer(kind) | TypeKind::Real(kind) => {
                u64::from(*kind)
            }
            TypeKind::Complex(kind) => u64::from(*kind) * 2,
            TypeKind::Byte => 1,
            TypeKind::Character(len) => u64::from(*len),
            TypeKind::Structure(structure) => self.structure_size(*structure),
            TypeKind::Pointer(_) => u64::from(self.pointer_size()),
            TypeKind::Array(subtype, shape) => self.size_of(*subtype).saturating_mul(shape.total()),
        }
    }

    pub fn structure_size(&self, structure: super::StructureId) -> u64 {
        self.structure_def(structure)
            .members
            .iter()
            .map(|member| self.size_of(member.ty))
            .fold(0, u64::saturating_add)
    }

    // ==================== Type queries ====================

    /// INTEGER or BYTE
    pub fn is_integer_like(&self, id: TypeId) -> bool {
        matches!(self.tag(id), TypeTag::Integer | TypeTag::Byte)
    }

    /// LOGICAL or BYTE
    pub fn is_logical_like(&self, id: TypeId) -> bool {
        matches!(self.tag(id), TypeTag::Logical | TypeTag::Byte)
    }

    pub fn is_real(&self, id: TypeId) -> bool {
        self.tag(id) == TypeTag::Real
    }

    pub fn is_complex(&self, id: TypeId) -> bool {
        self.tag(id) == TypeTag::Complex
    }

    pub fn is_character(&self, id: TypeId) -> bool {
        self.tag(id) == TypeTag::Character
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        self.tag(id) == TypeTag::Array
    }

    /// Types taking part in numeric promotion
    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(
            self.tag(id),
            TypeTag::Logical | TypeTag::Integer | TypeTag::Real | TypeTag::Complex | TypeTag::Byte
        )
    }

    /// Element type of an array
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).kind {
            TypeKind::Array(subtype, _) => Some(subtype),
            _ => None,
        }
    }

    // ==================== Promotion ====================

    /// Result type of a binary operation mixing `a` and `b`.
    ///
    /// A missing operand is the identity. Two primitives of the same tag
    /// promote to the larger kind, so CHARACTER picks the longer length.
    /// `None` for two present operands means they cannot be promoted:
    /// CHARACTER never mixes with another tag, and arrays, structures and
    /// pointers only combine with an identical type.
    pub fn promote(&mut self, a: Option<TypeId>, b: Option<TypeId>) -> Option<TypeId> {
        let (a, b) = match (a, b) {
            (None, b) => return b,
            (a, None) => return a,
            (Some(a), Some(b)) => (a, b),
        };

        if self.compare_ids(a, b) {
            return Some(a);
        }

        let (ta, tb) = (self.tag(a), self.tag(b));
        let (ka, kb) = (self.size_kind(a), self.size_kind(b));

        if ta == tb && ta.is_primitive() {
            let larger = if ka >= kb { a } else { b };
            return Some(self.without_attrs(larger));
        }

        if !self.is_numeric(a) || !self.is_numeric(b) {
            return None;
        }

        // BYTE never survives promotion
        if ta == TypeTag::Byte {
            return Some(b);
        }
        if tb == TypeTag::Byte {
            return Some(a);
        }

        let either = |tag: TypeTag| ta == tag || tb == tag;
        let logical = either(TypeTag::Logical);
        let integer = either(TypeTag::Integer);
        let real = either(TypeTag::Real);
        let complex = either(TypeTag::Complex);

        let kind = ka.max(kb);

        // Promoted results are rvalues and drop declaration attributes
        let promoted = if logical && integer {
            TypeKind::Integer(kind)
        } else if real && (logical || integer) {
            TypeKind::Real(kind)
        } else if complex && (real || logical || integer) {
            TypeKind::Complex(kind)
        } else {
            return None;
        };

        Some(self.intern(Type::new(promoted)))
    }

    /// Whether a value of `expr` can be stored in `dest` without a cast.
    ///
    /// Declaration attributes are storage properties of the destination and
    /// are ignored; everything else must match structurally.
    pub fn compatible(&self, dest: TypeId, expr: TypeId) -> bool {
        if dest == expr {
            return true;
        }

        let (dest, expr) = (self.get(dest), self.get(expr));
        if dest.attrs.is_empty() && expr.attrs.is_empty() {
            return self.compare(dest, expr);
        }

        self.compare(
            &dest.clone().with_attrs(TypeAttrs::NONE),
            &expr.clone().with_attrs(TypeAttrs::NONE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayDim, ArrayShape, StructureDef};

    fn volatile() -> TypeAttrs {
        TypeAttrs {
            is_volatile: true,
            ..TypeAttrs::NONE
        }
    }

    #[test]
    fn test_primitive_sizes() {
        let mut types = TypeRegistry::default();
        let complex8 = types.complex(8);
        let real8 = types.real(8);
        let byte = types.byte(TypeAttrs::NONE);
        let chars = types.character(12, TypeAttrs::NONE);
        assert_eq!(types.size_of(complex8), 16);
        assert_eq!(types.size_of(real8), 8);
        assert_eq!(types.size_of(byte), 1);
        assert_eq!(types.size_of(chars), 12);
    }

    #[test]
    fn test_composite_sizes() {
        let mut types = TypeRegistry::new(4, 8);
        let int4 = types.integer(4);
        let real8 = types.real(8);
        let array = types.array(int4, ArrayShape::new(vec![ArrayDim::upto(10)]), TypeAttrs::NONE);
        assert_eq!(types.size_of(array), 40);

        let pointer = types.pointer(real8, TypeAttrs::NONE);
        assert_eq!(types.size_of(pointer), 8);

        let point = types.define_structure(
            StructureDef::new("PAIR").with_member("A", int4).with_member("B", real8),
        );
        let pair = types.structure(point, TypeAttrs::NONE);
        assert_eq!(types.size_of(pair), 12);

        let pairs = types.array(pair, ArrayShape::new(vec![ArrayDim::upto(2), ArrayDim::upto(3)]), TypeAttrs::NONE);
        assert_eq!(types.size_of(pairs), 72);
    }

    #[test]
    fn test_huge_sizes_saturate() {
        let mut types = TypeRegistry::default();
        let int4 = types.integer(4);
        let shape = ArrayShape::new(vec![ArrayDim::upto(3_000_000_000); 3]);
        let array = types.array(int4, shape, TypeAttrs::NONE);
        assert_eq!(types.size_of(array), u64::MAX);

        let wide = types.array(int4, ArrayShape::new(vec![ArrayDim::upto(1 << 62)]), TypeAttrs::NONE);
        assert_eq!(types.size_of(wide), u64::MAX);

        let pair = types.define_structure(StructureDef::new("BIG").with_member("A", array).with_member("B", int4));
        let big = types.structure(pair, TypeAttrs::NONE);
        assert_eq!(types.size_of(big), u64::MAX);
    }

    #[test]
    fn test_category_queries() {
        let mut types = TypeRegistry::default();
        let byte = types.byte(TypeAttrs::NONE);
        let int4 = types.integer(4);
        let logical = types.logical(4);
        assert!(types.is_integer_like(byte));
        assert!(types.is_logical_like(byte));
        assert!(types.is_integer_like(int4));
        assert!(!types.is_logical_like(int4));
        assert!(types.is_logical_like(logical));
        assert!(!types.is_integer_like(logical));
    }

    #[test]
    fn test_promote_identity() {
        let mut types = TypeRegistry::default();
        let real4 = types.real(4);
        assert_eq!(types.promote(Some(real4), None), Some(real4));
        assert_eq!(types.promote(None, Some(real4)), Some(real4));
        assert_eq!(types.promote(None, None), None);
    }

    #[test]
    fn test_promote_same_tag_picks_larger_kind() {
        let mut types = TypeRegistry::default();
        let int2 = types.integer(2);
        let int8 = types.integer(8);
        assert_eq!(types.promote(Some(int2), Some(int8)), Some(int8));
        assert_eq!(types.promote(Some(int8), Some(int2)), Some(int8));
    }

    #[test]
    fn test_promote_absorbs_byte() {
        let mut types = TypeRegistry::default();
        let byte = types.byte(TypeAttrs::NONE);
        for kind in [1, 2, 4, 8] {
            let int = types.integer(kind);
            assert_eq!(types.promote(Some(byte), Some(int)), Some(int));
            assert_eq!(types.promote(Some(int), Some(byte)), Some(int));
        }
        let real8 = types.real(8);
        assert_eq!(types.promote(Some(byte), Some(real8)), Some(real8));
    }

    #[test]
    fn test_promote_lattice() {
        let mut types = TypeRegistry::default();
        let logical4 = types.logical(4);
        let int2 = types.integer(2);
        let int8 = types.integer(8);
        let real4 = types.real(4);
        let real8 = types.real(8);
        let complex4 = types.complex(4);
        let complex8 = types.complex(8);

        assert_eq!(types.promote(Some(logical4), Some(int8)), Some(int8));
        assert_eq!(types.promote(Some(int2), Some(real4)), Some(real4));
        assert_eq!(types.promote(Some(int8), Some(real4)), Some(real8));
        assert_eq!(types.promote(Some(real8), Some(complex4)), Some(complex8));
        assert_eq!(types.promote(Some(logical4), Some(complex4)), Some(complex4));
    }

    #[test]
    fn test_promote_is_symmetric() {
        let mut types = TypeRegistry::default();
        let int4 = types.integer(4);
        let all = vec![
            types.logical(4),
            types.logical(8),
            int4,
            types.integer(8),
            types.real(4),
            types.real(8),
            types.complex(4),
            types.complex(8),
            types.byte(TypeAttrs::NONE),
            types.character(3, TypeAttrs::NONE),
            types.pointer(int4, TypeAttrs::NONE),
            types.primitive(TypeTag::Integer, 4, volatile()).unwrap(),
            types.primitive(TypeTag::Real, 8, volatile()).unwrap(),
        ];

        for &a in &all {
            for &b in &all {
                let ab = types.promote(Some(a), Some(b));
                let ba = types.promote(Some(b), Some(a));
                match (ab, ba) {
                    (Some(x), Some(y)) => assert!(types.compare_ids(x, y)),
                    (None, None) => {}
                    _ => panic!("asymmetric promotion"),
                }
            }
        }
    }

    #[test]
    fn test_promote_drops_attributes() {
        let mut types = TypeRegistry::default();
        let int4 = types.primitive(TypeTag::Integer, 4, volatile()).unwrap();
        let real4 = types.real(4);
        let promoted = types.promote(Some(int4), Some(real4)).unwrap();
        assert!(types.get(promoted).attrs.is_empty());
    }

    #[test]
    fn test_promote_rejects_non_numeric() {
        let mut types = TypeRegistry::default();
        let chars = types.character(1, TypeAttrs::NONE);
        let int4 = types.integer(4);
        let byte = types.byte(TypeAttrs::NONE);
        let array = types.array(int4, ArrayShape::new(vec![ArrayDim::upto(2)]), TypeAttrs::NONE);
        assert_eq!(types.promote(Some(chars), Some(int4)), None);
        assert_eq!(types.promote(Some(int4), Some(chars)), None);
        assert_eq!(types.promote(Some(byte), Some(chars)), None);
        assert_eq!(types.promote(Some(array), Some(int4)), None);
        assert_eq!(types.promote(Some(chars), Some(chars)), Some(chars));
    }

    #[test]
    fn test_promote_character_picks_longer_length() {
        let mut types = TypeRegistry::default();
        let short = types.character(3, TypeAttrs::NONE);
        let long = types.character(5, TypeAttrs::NONE);
        let long_volatile = types.character(5, volatile());
        assert_eq!(types.promote(Some(short), Some(long)), Some(long));
        assert_eq!(types.promote(Some(long), Some(short)), Some(long));
        assert_eq!(types.promote(Some(long_volatile), Some(short)), Some(long));

        let int4 = types.integer(4);
        let other = types.array(int4, ArrayShape::new(vec![ArrayDim::upto(3)]), TypeAttrs::NONE);
        let array = types.array(int4, ArrayShape::new(vec![ArrayDim::upto(2)]), TypeAttrs::NONE);
        assert_eq!(types.promote(Some(array), Some(other)), None);
    }

    #[test]
    fn test_compatible_ignores_attributes_only() {
        let mut types = TypeRegistry::default();
        let int4 = types.integer(4);
        let volatile_int4 = types.primitive(TypeTag::Integer, 4, volatile()).unwrap();
        let real4 = types.real(4);
        assert!(types.compatible(volatile_int4, int4));
        assert!(types.compatible(int4, int4));
        assert!(!types.compatible(int4, real4));
        assert!(!types.compatible(real4, int4));
    }
}
