//! Type registry: find-or-insert interning of canonical types

use std::collections::HashMap;

use tracing::trace;

use super::{ArrayShape, StructureDef, StructureId, Type, TypeAttrs, TypeId, TypeKind, TypeTag};

#[derive(Debug)]
struct Entry {
    ty: Type,
    hash: u64,
}

/// Owns every canonical type of a compilation session.
///
/// The registry is an explicit context object rather than process-wide
/// state: independent compilations each get their own. `intern` takes
/// `&mut self`, so sharing a registry across threads requires wrapping it in
/// a lock around the whole find-or-insert.
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<Entry>,
    buckets: HashMap<u64, Vec<TypeId>>,
    structures: Vec<StructureDef>,
    default_kind: u32,
    pointer_size: u32,
}

impl TypeRegistry {
    /// Create an empty registry. `default_kind` replaces a requested kind of
    /// zero on LOGICAL/INTEGER/REAL/COMPLEX, and `pointer_size` is the byte
    /// width reported for pointer types.
    pub fn new(default_kind: u32, pointer_size: u32) -> Self {
        Self {
            types: Vec::new(),
            buckets: HashMap::new(),
            structures: Vec::new(),
            default_kind,
            pointer_size,
        }
    }

    pub fn default_kind(&self) -> u32 {
        self.default_kind
    }

    pub fn pointer_size(&self) -> u32 {
        self.pointer_size
    }

    /// Number of canonical types created so far
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Descriptor behind a canonical id
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize].ty
    }

    pub fn tag(&self, id: TypeId) -> TypeTag {
        self.get(id).tag()
    }

    pub fn size_kind(&self, id: TypeId) -> u32 {
        self.get(id).size_kind()
    }

    // ==================== Hashing and comparison ====================

    /// Structural hash of a (possibly not yet canonical) descriptor.
    ///
    /// Only used as a bucket key; collisions are settled by [`Self::compare`].
    pub fn hash(&self, ty: &Type) -> u64 {
        let hash = ty.tag().hash_value() + ty.attrs.hash_value();

        let sub = match &ty.kind {
            TypeKind::Structure(structure) => self.structure_hash(*structure),
            TypeKind::Pointer(subtype) => self.hash_of(*subtype),
            TypeKind::Array(subtype, shape) => {
                self.hash_of(*subtype).wrapping_add(shape.hash_value())
            }
            TypeKind::Logical(_)
            | TypeKind::Integer(_)
            | TypeKind::Real(_)
            | TypeKind::Complex(_)
            | TypeKind::Byte
            | TypeKind::Character(_) => u64::from(ty.size_kind()),
        };

        hash.wrapping_add(sub)
    }

    /// Hash of a canonical type, computed once at interning
    pub fn hash_of(&self, id: TypeId) -> u64 {
        self.types[id.0 as usize].hash
    }

    /// Structural equality of two descriptors, attributes included
    pub fn compare(&self, a: &Type, b: &Type) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }

        if a.tag() != b.tag() || a.attrs != b.attrs {
            return false;
        }

        match (&a.kind, &b.kind) {
            (TypeKind::Structure(x), TypeKind::Structure(y)) => self.structure_compare(*x, *y),
            (TypeKind::Pointer(x), TypeKind::Pointer(y)) => self.compare_ids(*x, *y),
            (TypeKind::Array(x, xs), TypeKind::Array(y, ys)) => {
                self.compare_ids(*x, *y) && xs == ys
            }
            _ => a.size_kind() == b.size_kind(),
        }
    }

    pub fn compare_ids(&self, a: TypeId, b: TypeId) -> bool {
        a == b || self.compare(self.get(a), self.get(b))
    }

    // ==================== Interning ====================

    fn normalize(&self, mut ty: Type) -> Type {
        match ty.kind {
            TypeKind::Logical(0) => ty.kind = TypeKind::Logical(self.default_kind),
            TypeKind::Integer(0) => ty.kind = TypeKind::Integer(self.default_kind),
            TypeKind::Real(0) => ty.kind = TypeKind::Real(self.default_kind),
            TypeKind::Complex(0) => ty.kind = TypeKind::Complex(self.default_kind),
            _ => {}
        }

        // A LOGICAL*1 is a synonym of BYTE
        if let TypeKind::Logical(1) = ty.kind {
            ty.kind = TypeKind::Byte;
        }

        ty
    }

    /// Return the canonical instance structurally equal to `candidate`,
    /// creating it on first request.
    pub fn intern(&mut self, candidate: Type) -> TypeId {
        let candidate = self.normalize(candidate);
        let hash = self.hash(&candidate);

        if let Some(bucket) = self.buckets.get(&hash) {
            if let Some(&id) = bucket
                .iter()
                .find(|&&id| self.compare(self.get(id), &candidate))
            {
                return id;
            }
        }

        let id = TypeId(self.types.len() as u32);
        self.types.push(Entry { ty: candidate, hash });
        self.buckets.entry(hash).or_default().push(id);
        trace!(id = id.0, hash, ty = %self.display(id), "interned type");
        id
    }

    // ==================== Constructors ====================

    /// Primitive numeric/logical type. Fails for non-primitive tags,
    /// CHARACTER (use [`Self::character`]) and BYTE wider than one byte.
    pub fn primitive(&mut self, tag: TypeTag, kind: u32, attrs: TypeAttrs) -> Option<TypeId> {
        let kind = match tag {
            TypeTag::Logical => TypeKind::Logical(kind),
            TypeTag::Integer => TypeKind::Integer(kind),
            TypeTag::Real => TypeKind::Real(kind),
            TypeTag::Complex => TypeKind::Complex(kind),
            TypeTag::Byte if kind <= 1 => TypeKind::Byte,
            _ => return None,
        };
        Some(self.intern(Type::new(kind).with_attrs(attrs)))
    }

    pub fn logical(&mut self, kind: u32) -> TypeId {
        self.intern(Type::new(TypeKind::Logical(kind)))
    }

    pub fn integer(&mut self, kind: u32) -> TypeId {
        self.intern(Type::new(TypeKind::Integer(kind)))
    }

    pub fn real(&mut self, kind: u32) -> TypeId {
        self.intern(Type::new(TypeKind::Real(kind)))
    }

    pub fn complex(&mut self, kind: u32) -> TypeId {
        self.intern(Type::new(TypeKind::Complex(kind)))
    }

    pub fn byte(&mut self, attrs: TypeAttrs) -> TypeId {
        self.intern(Type::new(TypeKind::Byte).with_attrs(attrs))
    }

    pub fn character(&mut self, len: u32, attrs: TypeAttrs) -> TypeId {
        self.intern(Type::new(TypeKind::Character(len)).with_attrs(attrs))
    }

    pub fn structure(&mut self, structure: StructureId, attrs: TypeAttrs) -> TypeId {
        self.intern(Type::new(TypeKind::Structure(structure)).with_attrs(attrs))
    }

    pub fn pointer(&mut self, target: TypeId, attrs: TypeAttrs) -> TypeId {
        self.intern(Type::new(TypeKind::Pointer(target)).with_attrs(attrs))
    }

    pub fn array(&mut self, subtype: TypeId, shape: ArrayShape, attrs: TypeAttrs) -> TypeId {
        self.intern(Type::new(TypeKind::Array(subtype, shape)).with_attrs(attrs))
    }

    /// Same type with a different primitive kind; `None` for composites
    pub fn with_kind(&mut self, id: TypeId, kind: u32) -> Option<TypeId> {
        let ty = self.get(id).with_size_kind(kind)?;
        Some(self.intern(ty))
    }

    /// Same type with static/automatic/volatile cleared
    pub fn without_attrs(&mut self, id: TypeId) -> TypeId {
        let ty = self.get(id);
        if ty.attrs.is_empty() {
            return id;
        }
        let ty = ty.clone().with_attrs(TypeAttrs::NONE);
        self.intern(ty)
    }

    // ==================== Structures ====================

    /// Register a structure definition. Each call creates a new definition.
    pub fn define_structure(&mut self, def: StructureDef) -> StructureId {
        let id = StructureId(self.structures.len() as u32);
        self.structures.push(def);
        id
    }

    pub fn structure_def(&self, id: StructureId) -> &StructureDef {
        &self.structures[id.0 as usize]
    }

    pub fn structure_hash(&self, id: StructureId) -> u64 {
        let def = self.structure_def(id);
        let name = def.name.bytes().fold(0u64, |hash, b| {
            hash.wrapping_mul(31).wrapping_add(u64::from(b.to_ascii_uppercase()))
        });
        def.members
            .iter()
            .fold(name, |hash, member| hash.wrapping_add(self.hash_of(member.ty)))
    }

    pub fn structure_compare(&self, a: StructureId, b: StructureId) -> bool {
        if a == b {
            return true;
        }

        let (a, b) = (self.structure_def(a), self.structure_def(b));
        a.name.eq_ignore_ascii_case(&b.name)
            && a.members.len() == b.members.len()
            && a.members.iter().zip(&b.members).all(|(x, y)| {
                x.name.eq_ignore_ascii_case(&y.name) && self.compare_ids(x.ty, y.ty)
            })
    }

    // ==================== Representation ====================

    /// Human-readable rendering used in diagnostics, e.g. `INTEGER*4`
    pub fn display(&self, id: TypeId) -> String {
        let ty = self.get(id);
        let mut out = String::new();

        if ty.attrs.is_static {
            out.push_str("STATIC ");
        }
        if ty.attrs.is_automatic {
            out.push_str("AUTOMATIC ");
        }
        if ty.attrs.is_volatile {
            out.push_str("VOLATILE ");
        }

        match &ty.kind {
            TypeKind::Byte => out.push_str("BYTE"),
            TypeKind::Structure(structure) => {
                out.push_str(&format!("TYPE({})", self.structure_def(*structure).name));
            }
            TypeKind::Pointer(target) => {
                out.push_str(&format!("POINTER TO {}", self.display(*target)));
            }
            TypeKind::Array(subtype, shape) => {
                out.push_str(&format!("{} ARRAY{}", self.display(*subtype), shape));
            }
            _ => out.push_str(&format!("{}*{}", ty.tag(), ty.size_kind())),
        }

        out
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(4, std::mem::size_of::<usize>() as u32)
    }
}
