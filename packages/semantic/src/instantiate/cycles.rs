//! Circular composition detection (§4.6.4).
//!
//! Two distinct cycles can appear once bases and members are connected:
//! circular **inheritance** (`Circle : Circle` through any number of hops)
//! and circular **value composition** (`struct A { b: B }` / `struct B { a:
//! A }` by value, not by pointer/reference — a cycle here makes layout
//! undecidable, unlike a pointer/reference cycle, which just costs an
//! indirection). Both walk with an explicit guard stack rather than leaning
//! on recursion depth, so the diagnostic can name the member that closed the
//! loop.

use crate::ast::{DeclArena, DeclId, DeclKind, VarKind};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};

pub fn detect_circular_inheritance(arena: &DeclArena, decl: DeclId) -> SemaResult<()> {
    let mut working = vec![decl];
    let mut cursor = decl;
    loop {
        let Some(s) = arena.get(cursor).as_struct() else { return Ok(()) };
        let Some(base) = s.base_struct else { return Ok(()) };
        if working.contains(&base) {
            return Err(FatalError::new(
                ErrorCode::CircularInheritance,
                arena.get(decl).span.clone(),
                format!("`{}` inherits from itself through `{}`", arena.get(decl).name(), arena.get(base).name()),
            ));
        }
        working.push(base);
        cursor = base;
    }
}

/// Walk `decl`'s by-value member graph with `working` as the guard stack.
/// Top-level callers pass `&mut vec![decl]`; recursive calls push the
/// member's struct id before descending and pop it after, so `working`
/// always holds exactly the current path from the root.
pub fn detect_circular_value_composition(arena: &DeclArena, decl: DeclId, working: &mut Vec<DeclId>) -> SemaResult<()> {
    let members = match arena.get(decl).as_struct() {
        Some(s) => s.members.clone(),
        None => return Ok(()),
    };

    for member in members {
        let Some(member_struct) = by_value_struct_member(arena, member) else { continue };
        if working.contains(&member_struct) {
            return Err(FatalError::new(
                ErrorCode::CircularValueComposition,
                arena.get(member).span.clone(),
                format!("`{}` composes itself by value through `{}`", arena.get(decl).name(), arena.get(member).name()),
            ));
        }
        working.push(member_struct);
        detect_circular_value_composition(arena, member_struct, working)?;
        working.pop();
    }
    Ok(())
}

/// A member counts toward value-composition cycles only if its type *is* a
/// struct directly — a `Pointer`/`Reference` to the same struct is a finite
/// machine word and breaks the cycle.
fn by_value_struct_member(arena: &DeclArena, member: DeclId) -> Option<DeclId> {
    match &arena.get(member).kind {
        DeclKind::Variable { ty, var_kind: VarKind::Member, .. } => ty.as_struct(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Identifier, StructDecl, Type, TypeKind};
    use crate::position::SourceSpan;

    fn empty_struct(arena: &mut DeclArena, name: &str) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())))
    }

    fn member_of(arena: &mut DeclArena, name: &str, ty: Type) -> DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic(name),
            SourceSpan::synthetic(),
            DeclKind::Variable { ty, initializer: None, var_kind: VarKind::Member },
        ))
    }

    #[test]
    fn non_circular_inheritance_is_accepted() {
        let mut arena = DeclArena::new();
        let base = empty_struct(&mut arena, "Base");
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Derived"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { base_struct: Some(base), ..StructDecl::default() }),
        ));
        assert!(detect_circular_inheritance(&arena, derived).is_ok());
    }

    #[test]
    fn self_inheritance_is_rejected() {
        let mut arena = DeclArena::new();
        let a = empty_struct(&mut arena, "A");
        if let DeclKind::Struct(s) = &mut arena.get_mut(a).kind {
            s.base_struct = Some(a);
        }
        assert!(detect_circular_inheritance(&arena, a).is_err());
    }

    #[test]
    fn direct_by_value_self_composition_is_rejected() {
        let mut arena = DeclArena::new();
        let a = empty_struct(&mut arena, "A");
        let self_member = member_of(&mut arena, "inner", Type::new(TypeKind::Struct(a)));
        if let DeclKind::Struct(s) = &mut arena.get_mut(a).kind {
            s.members.push(self_member);
        }
        let err = detect_circular_value_composition(&arena, a, &mut vec![a]);
        assert!(err.is_err());
    }

    #[test]
    fn indirect_by_value_composition_cycle_is_rejected() {
        let mut arena = DeclArena::new();
        let a = empty_struct(&mut arena, "A");
        let b = empty_struct(&mut arena, "B");
        let a_member = member_of(&mut arena, "b", Type::new(TypeKind::Struct(b)));
        let b_member = member_of(&mut arena, "a", Type::new(TypeKind::Struct(a)));
        if let DeclKind::Struct(s) = &mut arena.get_mut(a).kind {
            s.members.push(a_member);
        }
        if let DeclKind::Struct(s) = &mut arena.get_mut(b).kind {
            s.members.push(b_member);
        }
        assert!(detect_circular_value_composition(&arena, a, &mut vec![a]).is_err());
    }

    #[test]
    fn pointer_member_breaks_the_cycle() {
        let mut arena = DeclArena::new();
        let a = empty_struct(&mut arena, "A");
        let self_ptr_member = member_of(&mut arena, "inner", Type::new(TypeKind::Struct(a)).pointer_to());
        if let DeclKind::Struct(s) = &mut arena.get_mut(a).kind {
            s.members.push(self_ptr_member);
        }
        assert!(detect_circular_value_composition(&arena, a, &mut vec![a]).is_ok());
    }
}
