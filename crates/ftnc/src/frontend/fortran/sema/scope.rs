//! Declaration table and scope management

use std::collections::HashMap;

use string_interner::DefaultSymbol;

use super::TypeVal;
use crate::common::Span;
use crate::types::{StructureId, TypeId, TypeRegistry};

/// What a declared name stands for
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Variable,
    /// Named constant from `PARAMETER`
    Constant(TypeVal),
    /// Name listed in an `INTRINSIC` statement
    Intrinsic,
    /// Statement function with its dummy argument types
    StatementFunction { args: Vec<TypeId> },
}

/// A declaration in the declaration table
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    pub ty: TypeId,
    pub span: Span,
    /// Constant initializer from the declaration
    pub init: Option<TypeVal>,
    pub used: bool,
    pub written: bool,
    /// Set once the declaration has been used; its type can no longer change
    pub is_final: bool,
    /// Created by implicit typing on first reference
    pub is_implicit: bool,
}

impl Decl {
    pub fn new(name: impl Into<String>, kind: DeclKind, ty: TypeId, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            span,
            init: None,
            used: false,
            written: false,
            is_final: false,
            is_implicit: false,
        }
    }

    pub fn variable(name: impl Into<String>, ty: TypeId, span: Span) -> Self {
        Self::new(name, DeclKind::Variable, ty, span)
    }

    pub fn is_array(&self, types: &TypeRegistry) -> bool {
        types.is_array(self.ty)
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn is_intrinsic(&self) -> bool {
        matches!(self.kind, DeclKind::Intrinsic)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, DeclKind::Constant(_))
    }

    pub fn is_stmt_func(&self) -> bool {
        matches!(self.kind, DeclKind::StatementFunction { .. })
    }

    /// An implicit declaration nobody has relied on yet may be replaced
    pub fn is_replaceable(&self) -> bool {
        self.is_implicit && !self.is_final
    }
}

/// Implicit typing: names starting with I through N are INTEGER, others REAL
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplicitRules {
    none: bool,
}

impl ImplicitRules {
    pub fn new(implicit_none: bool) -> Self {
        Self { none: implicit_none }
    }

    /// `IMPLICIT NONE`
    pub fn set_none(&mut self) {
        self.none = true;
    }

    pub fn is_none(&self) -> bool {
        self.none
    }

    pub fn type_for(&self, name: &str, types: &mut TypeRegistry) -> Option<TypeId> {
        if self.none {
            return None;
        }
        match name.chars().next()? {
            'I'..='N' => Some(types.integer(0)),
            _ => Some(types.real(0)),
        }
    }
}

/// A scope containing declarations
#[derive(Debug)]
pub struct Scope {
    decls: HashMap<DefaultSymbol, Decl>,
    /// Declaration order, for deterministic diagnostics and dumps
    order: Vec<DefaultSymbol>,
    structures: HashMap<DefaultSymbol, StructureId>,
    implicit: ImplicitRules,
    parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new(implicit: ImplicitRules) -> Self {
        Self {
            decls: HashMap::new(),
            order: Vec::new(),
            structures: HashMap::new(),
            implicit,
            parent: None,
        }
    }

    /// Define a declaration, replacing an implicit one that is not yet final
    pub fn define(&mut self, sym: DefaultSymbol, decl: Decl) -> Result<(), String> {
        match self.decls.get(&sym) {
            Some(existing) if !existing.is_replaceable() => {
                return Err(format!("'{}' is already declared", decl.name));
            }
            Some(_) => {}
            None => self.order.push(sym),
        }
        self.decls.insert(sym, decl);
        Ok(())
    }

    /// Define in the outermost scope
    pub fn define_global(&mut self, sym: DefaultSymbol, decl: Decl) -> Result<(), String> {
        match &mut self.parent {
            Some(parent) => parent.define_global(sym, decl),
            None => self.define(sym, decl),
        }
    }

    pub fn find(&self, sym: DefaultSymbol, recursive: bool) -> Option<&Decl> {
        match self.decls.get(&sym) {
            Some(decl) => Some(decl),
            None if recursive => self.parent.as_ref().and_then(|p| p.find(sym, true)),
            None => None,
        }
    }

    pub fn find_mut(&mut self, sym: DefaultSymbol, recursive: bool) -> Option<&mut Decl> {
        if self.decls.contains_key(&sym) {
            return self.decls.get_mut(&sym);
        }
        if !recursive {
            return None;
        }
        self.parent.as_mut().and_then(|p| p.find_mut(sym, true))
    }

    /// Record a read or write of `sym` and finalize its declaration.
    /// Returns `false` when the name is not declared.
    pub fn mark_used(&mut self, sym: DefaultSymbol, write: bool) -> bool {
        match self.find_mut(sym, true) {
            Some(decl) => {
                if write {
                    decl.written = true;
                } else {
                    decl.used = true;
                }
                decl.is_final = true;
                true
            }
            None => false,
        }
    }

    /// Declarations of this scope in definition order
    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.order.iter().filter_map(|sym| self.decls.get(sym))
    }

    /// Define a structure type in the current scope. Returns `false` if the
    /// name is already taken.
    pub fn define_structure(&mut self, sym: DefaultSymbol, id: StructureId) -> bool {
        if self.structures.contains_key(&sym) {
            return false;
        }
        self.structures.insert(sym, id);
        true
    }

    /// Look up a structure type by name
    pub fn lookup_structure(&self, sym: DefaultSymbol) -> Option<StructureId> {
        match self.structures.get(&sym) {
            Some(id) => Some(*id),
            None => self.parent.as_ref().and_then(|p| p.lookup_structure(sym)),
        }
    }

    pub fn implicit(&self) -> ImplicitRules {
        self.implicit
    }

    pub fn implicit_mut(&mut self) -> &mut ImplicitRules {
        &mut self.implicit
    }

    /// Take the parent scope, replacing self with the parent
    pub fn pop_to_parent(&mut self) -> bool {
        if let Some(parent) = self.parent.take() {
            *self = *parent;
            true
        } else {
            false
        }
    }

    /// Push a new child scope inheriting the implicit rules
    pub fn push_child(&mut self) {
        let implicit = self.implicit;
        let old_scope = std::mem::replace(self, Scope::new(implicit));
        self.parent = Some(Box::new(old_scope));
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(ImplicitRules::default())
    }
}
