//! The `Type` sum type (§3.1).
//!
//! A resolved qualifier is tracked as a field rather than as nested wrapper
//! variants (`Const(Mut(T))`); `Type::qualified` is the single constructor
//! that can produce a qualified type and it refuses to stack a qualifier
//! onto an already-qualified inner type, which is what gives us invariant
//! I9 for free instead of needing a separate pass to detect stacking.

use super::expr::Expr;
use super::ids::DeclId;
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Unassigned,
    Const,
    Mut,
    Immut,
}

impl Default for Qualifier {
    fn default() -> Self {
        Qualifier::Unassigned
    }
}

/// (signed, floating, size_bits) for every builtin name, consulted by
/// [`Type::builtin`]. A static table rather than a `match` so a second
/// lookup (e.g. validating a target's `sizeof_builtin` table against the
/// names this crate actually produces) doesn't need its own copy.
static BUILTIN_TYPES: Lazy<HashMap<&'static str, (bool, bool, u32)>> = Lazy::new(|| {
    HashMap::from([
        ("bool", (false, false, 1)),
        ("i8", (true, false, 8)),
        ("u8", (false, false, 8)),
        ("i16", (true, false, 16)),
        ("u16", (false, false, 16)),
        ("i32", (true, false, 32)),
        ("u32", (false, false, 32)),
        ("i64", (true, false, 64)),
        ("u64", (false, false, 64)),
        ("isize", (true, false, 64)),
        ("usize", (false, false, 64)),
        ("f32", (true, true, 32)),
        ("f64", (true, true, 64)),
        ("void", (false, false, 0)),
    ])
});

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    BuiltIn { name: String, signed: bool, floating: bool, size_bits: u32 },
    Pointer(Box<Type>),
    Reference(Box<Type>),
    RValueReference(Box<Type>),
    FlatArray { elem: Box<Type>, length: Box<Expr> },
    Dimension { elem: Box<Type>, rank: u32 },
    FunctionPointer { result: Box<Type>, params: Vec<Type> },
    Struct(DeclId),
    Trait(DeclId),
    Enum(DeclId),
    TemplateStruct { decl: DeclId, args: Vec<Expr> },
    TemplateTrait { decl: DeclId, args: Vec<Expr> },
    /// Produced by the parser, eliminated by C5/C6: an overload set of
    /// generic declarations sharing a name, not yet disambiguated.
    Templated { candidates: Vec<DeclId>, args: Vec<Expr> },
    Unresolved { name: String, template_args: Option<Vec<Expr>> },
    UnresolvedNested { container: Box<Type>, name: String, template_args: Option<Vec<Expr>> },
    /// A member reference through an as-yet-unground generic.
    Dependent { container: Box<Type>, dependent: Box<Type> },
    Alias(DeclId),
    TemplateTypenameRef(DeclId),
    Imaginary(DeclId),
    /// Internal marker for the hidden v-table slot.
    VTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub qualifier: Qualifier,
    pub is_lvalue: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type { kind, qualifier: Qualifier::Unassigned, is_lvalue: false }
    }

    pub fn lvalue(mut self) -> Self {
        self.is_lvalue = true;
        self
    }

    /// Build a builtin type by name. Mirrors the table the basic type
    /// resolver (C5) consults when a textual reference names a builtin.
    pub fn builtin(name: &str) -> Option<Type> {
        let &(signed, floating, size_bits) = BUILTIN_TYPES.get(name)?;
        Some(Type::new(TypeKind::BuiltIn { name: name.to_string(), signed, floating, size_bits }))
    }

    pub fn void() -> Type {
        Type::builtin("void").unwrap()
    }

    pub fn is_void(&self) -> bool {
        matches!(&self.kind, TypeKind::BuiltIn { name, .. } if name == "void")
    }

    /// Apply a qualifier to `inner`. Diagnoses stacking (invariant I9):
    /// qualifiers compose at most one deep and are mutually exclusive.
    pub fn qualified(inner: Type, qualifier: Qualifier, span: &SourceSpan) -> SemaResult<Type> {
        if inner.qualifier != Qualifier::Unassigned && inner.qualifier != qualifier {
            return Err(FatalError::new(
                ErrorCode::QualifierMismatch,
                span.clone(),
                format!(
                    "cannot apply qualifier {:?} to a type already qualified {:?}",
                    qualifier, inner.qualifier
                ),
            ));
        }
        Ok(Type { qualifier, ..inner })
    }

    pub fn is_fully_resolved(&self) -> bool {
        !matches!(
            self.kind,
            TypeKind::Unresolved { .. } | TypeKind::UnresolvedNested { .. } | TypeKind::Templated { .. }
        )
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn as_struct(&self) -> Option<DeclId> {
        match &self.kind {
            TypeKind::Struct(id) => Some(*id),
            _ => None,
        }
    }

    /// Strip the top-level qualifier, keeping `kind` and `is_lvalue` as-is.
    /// Used alongside [`Type::strip_reference`] wherever a comparison needs
    /// to ignore `const`/`mut`/`immut` on the type being compared.
    pub fn strip_quals(&self) -> Type {
        Type { qualifier: Qualifier::Unassigned, ..self.clone() }
    }

    pub fn strip_reference(&self) -> &Type {
        match &self.kind {
            TypeKind::Reference(inner) | TypeKind::RValueReference(inner) => inner,
            _ => self,
        }
    }

    pub fn pointer_to(self) -> Type {
        Type::new(TypeKind::Pointer(Box::new(self)))
    }

    pub fn reference_to(self) -> Type {
        Type::new(TypeKind::Reference(Box::new(self)))
    }

    /// §4.6.3's "parameter types match modulo top-level qualifiers and
    /// references": strip one reference wrapper and the qualifier from each
    /// side, then compare the remaining `kind`. Shared by override/shadow
    /// matching, `has`-contract signature checking, and v-table slot lookup
    /// so the three don't each reimplement (and drift on) this rule.
    pub fn matches_modulo_quals_and_reference(&self, other: &Type) -> bool {
        self.strip_reference().strip_quals().kind == other.strip_reference().strip_quals().kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_resolves_known_names() {
        let i32_ty = Type::builtin("i32").unwrap();
        assert!(matches!(i32_ty.kind, TypeKind::BuiltIn { signed: true, size_bits: 32, .. }));
    }

    #[test]
    fn unknown_builtin_name_is_none() {
        assert!(Type::builtin("Widget").is_none());
    }

    #[test]
    fn stacking_qualifiers_is_rejected() {
        let span = SourceSpan::synthetic();
        let inner = Type::qualified(Type::builtin("i32").unwrap(), Qualifier::Mut, &span).unwrap();
        let stacked = Type::qualified(inner, Qualifier::Const, &span);
        assert!(stacked.is_err());
    }

    #[test]
    fn reapplying_the_same_qualifier_is_allowed() {
        let span = SourceSpan::synthetic();
        let inner = Type::qualified(Type::builtin("i32").unwrap(), Qualifier::Const, &span).unwrap();
        assert!(Type::qualified(inner, Qualifier::Const, &span).is_ok());
    }
}
