//! Derived type (structure) definitions
//!
//! Structures are defined once and referenced from types by [`StructureId`];
//! the registry owns the definitions.

use super::TypeId;

/// Handle to a structure definition owned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub(crate) u32);

#[derive(Debug, Clone)]
pub struct StructMember {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct StructureDef {
    pub name: String,
    pub members: Vec<StructMember>,
}

impl StructureDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.members.push(StructMember { name: name.into(), ty });
        self
    }

    /// Position and type of the member called `name`
    pub fn member(&self, name: &str) -> Option<(usize, TypeId)> {
        self.members
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
            .map(|i| (i, self.members[i].ty))
    }
}
