//! Declaration semantics: type specifications, entities and named constants

use tracing::trace;

use super::{Decl, DeclKind, SemanticAnalyzer, TypeVal};
use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::fortran::ast::{
    ArrayRange, DeclAttrs, DerivedTypeDef, EntityDecl, Expr, TypeDecl, TypeName, TypeSpec,
};
use crate::types::{ArrayDim, ArrayShape, StructureDef, TypeAttrs, TypeId, TypeTag};

impl DeclAttrs {
    fn type_attrs(&self) -> TypeAttrs {
        TypeAttrs {
            is_static: self.is_static,
            is_automatic: self.is_automatic,
            is_volatile: self.is_volatile,
        }
    }
}

impl SemanticAnalyzer {
    /// Canonical type named by a type specification, before any
    /// per-entity `*N`, POINTER or DIMENSION is applied
    pub fn resolve_type_spec(&mut self, spec: &TypeSpec) -> CompileResult<TypeId> {
        let attrs = spec.attrs.type_attrs();

        match &spec.name {
            TypeName::Derived(name) => {
                if let Some(param) = spec.params.first() {
                    return Err(CompileError::semantic("unknown parameter in type", param.span));
                }
                let sym = self.names.get_or_intern(name);
                let Some(structure) = self.scope.lookup_structure(sym) else {
                    return Err(CompileError::semantic(
                        format!("unknown derived type '{}'", name),
                        spec.span,
                    ));
                };
                Ok(self.types.structure(structure, attrs))
            }
            TypeName::Character => {
                let len = self.character_length(spec)?;
                Ok(self.types.character(len, attrs))
            }
            TypeName::Logical => self.numeric_type(spec, TypeTag::Logical, 1),
            TypeName::Integer => self.numeric_type(spec, TypeTag::Integer, 1),
            TypeName::Real => self.numeric_type(spec, TypeTag::Real, 1),
            TypeName::DoublePrecision => self.numeric_type(spec, TypeTag::Real, 2),
            TypeName::Complex => self.numeric_type(spec, TypeTag::Complex, 1),
            TypeName::DoubleComplex => self.numeric_type(spec, TypeTag::Complex, 2),
            TypeName::Byte => self.numeric_type(spec, TypeTag::Byte, 1),
        }
    }

    /// LOGICAL, INTEGER, REAL, COMPLEX and BYTE with their kind selectors.
    /// DOUBLE types scale the selected kind by `factor`.
    fn numeric_type(&mut self, spec: &TypeSpec, tag: TypeTag, factor: u32) -> CompileResult<TypeId> {
        let mut kind = self.kind_parameter(spec)?;

        if let Some(star) = spec.kind {
            if kind > 0 {
                if star == kind {
                    self.warn("KIND specified multiple times in type", spec.span);
                } else {
                    return Err(CompileError::semantic(
                        "KIND specified differently in multiple places",
                        spec.span,
                    ));
                }
            }
            kind = star;
        } else if kind == 0 {
            // BYTE has no width to select
            kind = if tag == TypeTag::Byte { 1 } else { self.types.default_kind() };
        }

        let kind = kind.saturating_mul(factor);
        self.types
            .primitive(tag, kind, spec.attrs.type_attrs())
            .ok_or_else(|| CompileError::semantic(format!("invalid kind {} for {}", kind, tag), spec.span))
    }

    /// `KIND=` or unnamed parameter; 0 when absent
    fn kind_parameter(&mut self, spec: &TypeSpec) -> CompileResult<u32> {
        let mut kind = 0;
        for param in &spec.params {
            match param.name.as_deref() {
                None | Some("KIND") => {
                    let value = self.resolve_const_integer(&param.value, "KIND")?;
                    kind = u32::try_from(value).map_err(|_| {
                        CompileError::semantic(format!("invalid KIND {}", value), param.span)
                    })?;
                    if kind == 0 {
                        return Err(CompileError::semantic(
                            "KIND must not be specified as zero",
                            param.span,
                        ));
                    }
                }
                Some(_) => {
                    return Err(CompileError::semantic("unknown parameter in type", param.span));
                }
            }
        }
        Ok(kind)
    }

    /// `CHARACTER*N`, `CHARACTER(N)` or `CHARACTER(LEN=N)`; 1 when absent
    fn character_length(&mut self, spec: &TypeSpec) -> CompileResult<u32> {
        let mut len = None;
        for param in &spec.params {
            match param.name.as_deref() {
                None | Some("LEN") => {
                    let value = self.resolve_const_integer(&param.value, "LEN")?;
                    len = Some(u32::try_from(value).map_err(|_| {
                        CompileError::semantic(format!("invalid LEN {}", value), param.span)
                    })?);
                }
                Some("KIND") => {
                    if self.resolve_const_integer(&param.value, "KIND")? != 1 {
                        return Err(CompileError::semantic(
                            "only KIND=1 is supported for CHARACTER",
                            param.span,
                        ));
                    }
                }
                Some(_) => {
                    return Err(CompileError::semantic("unknown parameter in type", param.span));
                }
            }
        }

        match (spec.kind, len) {
            (Some(star), Some(len)) if star != len => Err(CompileError::semantic(
                "LEN specified differently in multiple places",
                spec.span,
            )),
            (Some(star), _) => Ok(star),
            (None, len) => Ok(len.unwrap_or(1)),
        }
    }

    /// Bounds of `(10)`, `(0:9)` or `(2, 3)`
    fn resolve_shape(&mut self, dims: &[ArrayRange]) -> CompileResult<ArrayShape> {
        let mut shape = Vec::with_capacity(dims.len());
        for range in dims {
            if range.stride.is_some() {
                return Err(CompileError::semantic("array bounds cannot have a stride", range.span));
            }
            let upper = if range.is_slice { range.last.as_ref() } else { range.first.as_ref() };
            let upper = self.array_bound(upper, range.span)?;

            let dim = if range.is_slice {
                let lower = self.array_bound(range.first.as_ref(), range.span)?;
                ArrayDim::new(lower, upper)
            } else {
                ArrayDim::upto(upper)
            };
            shape.push(dim);
        }
        Ok(ArrayShape::new(shape))
    }

    fn array_bound(&mut self, bound: Option<&Expr>, span: Span) -> CompileResult<i64> {
        match bound {
            Some(expr) => self.resolve_const_integer(expr, "array bound"),
            None => Err(CompileError::semantic("array bounds must be explicit", span)),
        }
    }

    /// Full type of one declared entity
    fn entity_type(&mut self, base: TypeId, spec: &TypeSpec, entity: &EntityDecl) -> CompileResult<TypeId> {
        let mut ty = base;
        if let Some(kind) = entity.kind {
            ty = self.types.with_kind(ty, kind).ok_or_else(|| {
                CompileError::semantic(format!("'{}' cannot take a size selector", entity.name), entity.span)
            })?;
        }

        if spec.attrs.is_pointer {
            ty = self.types.pointer(ty, TypeAttrs::NONE);
        }

        if let Some(dims) = entity.dims.as_ref().or(spec.attrs.dimension.as_ref()) {
            let shape = self.resolve_shape(dims)?;
            ty = self.types.array(ty, shape, TypeAttrs::NONE);
        }
        Ok(ty)
    }

    // =========================================================================
    // Specification statements
    // =========================================================================

    pub(super) fn analyze_declaration(&mut self, decl: &TypeDecl) -> CompileResult<()> {
        let base = self.resolve_type_spec(&decl.ty)?;

        for entity in &decl.entities {
            let ty = self.entity_type(base, &decl.ty, entity)?;

            let init = match &entity.init {
                Some(expr) => Some(self.constant_value(expr, ty, entity.span)?),
                None if decl.ty.attrs.is_parameter => {
                    return Err(CompileError::semantic(
                        format!("PARAMETER '{}' requires a value", entity.name),
                        entity.span,
                    ));
                }
                None => None,
            };

            let mut sema = Decl::variable(entity.name.clone(), ty, entity.span);
            if let (true, Some(value)) = (decl.ty.attrs.is_parameter, &init) {
                sema.kind = DeclKind::Constant(value.clone());
                sema.is_final = true;
            }
            sema.init = init;

            trace!(name = %entity.name, ty = %self.types.display(ty), "declaration");
            let sym = self.names.get_or_intern(&entity.name);
            self.scope
                .define(sym, sema)
                .map_err(|e| CompileError::semantic(e, entity.span))?;
        }
        Ok(())
    }

    /// Value of a constant initializer converted to `ty`
    fn constant_value(&mut self, expr: &Expr, ty: TypeId, span: Span) -> CompileResult<TypeVal> {
        let value = self.resolve_constant(expr)?;
        let value = self.coerce(value, ty, span)?;
        value
            .constant
            .ok_or_else(|| CompileError::semantic("initializer must be constant", span))
    }

    /// `PARAMETER (N = expr, ...)`: the name keeps its declared or implicit
    /// type and becomes a named constant
    pub(super) fn analyze_parameter(&mut self, constants: &[(String, Expr)], span: Span) -> CompileResult<()> {
        for (name, expr) in constants {
            let (sym, decl) = self.declared(name, span)?;
            if decl.is_constant() {
                return Err(CompileError::semantic(
                    format!("'{}' is already a named constant", name),
                    span,
                ));
            }
            if decl.is_final() || !matches!(decl.kind, DeclKind::Variable) {
                return Err(CompileError::semantic(
                    format!("'{}' cannot become a named constant", name),
                    span,
                ));
            }

            let value = self.constant_value(expr, decl.ty, expr.span)?;
            if let Some(decl) = self.scope.find_mut(sym, true) {
                decl.kind = DeclKind::Constant(value.clone());
                decl.init = Some(value);
                decl.is_final = true;
            }
        }
        Ok(())
    }

    pub(super) fn analyze_intrinsic(&mut self, names: &[String], span: Span) -> CompileResult<()> {
        for name in names {
            let sym = self.names.get_or_intern(name);
            let ty = match self.scope.implicit().type_for(name, &mut self.types) {
                Some(ty) => ty,
                None => self.types.real(0),
            };
            let mut decl = Decl::new(name.clone(), DeclKind::Intrinsic, ty, span);
            decl.is_final = true;
            self.scope
                .define(sym, decl)
                .map_err(|e| CompileError::semantic(e, span))?;
        }
        Ok(())
    }

    /// `TYPE name` ... `END TYPE`
    pub(super) fn analyze_derived_type(&mut self, def: &DerivedTypeDef) -> CompileResult<()> {
        let mut structure = StructureDef::new(def.name.clone());
        for member in &def.members {
            if member.ty.attrs.is_parameter {
                return Err(CompileError::semantic(
                    "PARAMETER is not allowed in a derived type",
                    member.span,
                ));
            }
            let base = self.resolve_type_spec(&member.ty)?;
            for entity in &member.entities {
                if structure.member(&entity.name).is_some() {
                    return Err(CompileError::semantic(
                        format!("duplicate member '{}' in TYPE {}", entity.name, def.name),
                        entity.span,
                    ));
                }
                let ty = self.entity_type(base, &member.ty, entity)?;
                structure = structure.with_member(entity.name.clone(), ty);
            }
        }

        let sym = self.names.get_or_intern(&def.name);
        let id = self.types.define_structure(structure);
        if !self.scope.define_structure(sym, id) {
            return Err(CompileError::semantic(
                format!("TYPE {} is already defined", def.name),
                def.span,
            ));
        }
        Ok(())
    }
}
