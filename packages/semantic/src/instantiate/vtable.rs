//! V-table construction (§4.6.6).
//!
//! A struct with any virtual member (own or inherited) gets a v-table: the
//! base's slots, in order, with any own member that overrides a slot
//! replacing the occupant in place, followed by the struct's own newly
//! introduced virtual members appended at the end. The owning struct is
//! whichever struct in the chain first needed a v-table — every derived
//! struct shares that owner's hidden `VTable` slot rather than growing a
//! second one, so a pointer to any struct in the hierarchy can dispatch
//! through the same fixed offset. The owner alone gets a real hidden
//! `Decl` prepended to its `members` (kind `VTable`, §4.6.6): layout walks
//! `members` in order, so this is what actually reserves the pointer-sized
//! slot at offset 0 rather than leaving it as pure layout bookkeeping.

use crate::ast::{Decl, DeclArena, DeclId, DeclKind, Identifier, Type, TypeKind, VTableSlot, VarKind};

pub fn build_vtable(arena: &mut DeclArena, decl: DeclId) {
    let (own_members, base) = {
        let Some(s) = arena.get(decl).as_struct() else { return };
        (s.members.clone(), s.base_struct)
    };

    let mut slots: Vec<VTableSlot> = Vec::new();
    let mut owner = None;
    if let Some(base) = base {
        if let Some(base_struct) = arena.get(base).as_struct() {
            if !base_struct.vtable.is_empty() {
                slots = base_struct.vtable.clone();
                owner = base_struct.vtable_owner;
            }
        }
    }

    for &member in &own_members {
        let d = arena.get(member);
        if !d.is_virtual() && !d.is_override() {
            continue;
        }
        let name = d.name().to_string();
        match slots.iter_mut().find(|slot| arena.get(slot.function).name() == name) {
            Some(slot) => slot.function = member,
            None => slots.push(VTableSlot { function: member }),
        }
    }

    if slots.is_empty() {
        return;
    }
    let becomes_owner = owner.is_none();
    let owner = owner.unwrap_or(decl);

    if becomes_owner {
        let span = arena.get(decl).span.clone();
        let vtable_member = arena.alloc(Decl::new(
            Identifier::synthetic("$vtable"),
            span,
            DeclKind::Variable { ty: Type::new(TypeKind::VTable), initializer: None, var_kind: VarKind::Member },
        ));
        arena.get_mut(vtable_member).container = Some(decl);
        if let Some(s) = arena.get_mut(decl).as_struct_mut() {
            s.members.insert(0, vtable_member);
        }
    }

    if let Some(s) = arena.get_mut(decl).as_struct_mut() {
        s.vtable = slots;
        s.vtable_owner = Some(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableDecl, Decl, DeclKind, DeclModifiers, Identifier, StructDecl, Type};
    use crate::position::SourceSpan;

    fn virtual_method(arena: &mut DeclArena, name: &str, override_: bool) -> DeclId {
        let mut d = Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Function(CallableDecl::new(Vec::new(), Type::void())));
        d.modifiers |= if override_ { DeclModifiers::OVERRIDE } else { DeclModifiers::VIRTUAL };
        arena.alloc(d)
    }

    #[test]
    fn struct_with_no_virtual_members_gets_no_vtable() {
        let mut arena = DeclArena::new();
        let s = arena.alloc(Decl::new(Identifier::synthetic("Plain"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        build_vtable(&mut arena, s);
        assert!(arena.get(s).as_struct().unwrap().vtable.is_empty());
    }

    #[test]
    fn base_introduces_vtable_and_derived_shares_owner() {
        let mut arena = DeclArena::new();
        let draw = virtual_method(&mut arena, "draw", false);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![draw], ..StructDecl::default() }),
        ));
        build_vtable(&mut arena, base);
        assert_eq!(arena.get(base).as_struct().unwrap().vtable_owner, Some(base));

        let override_draw = virtual_method(&mut arena, "draw", true);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![override_draw], base_struct: Some(base), ..StructDecl::default() }),
        ));
        build_vtable(&mut arena, derived);

        let derived_struct = arena.get(derived).as_struct().unwrap();
        assert_eq!(derived_struct.vtable_owner, Some(base));
        assert_eq!(derived_struct.vtable.len(), 1);
        assert_eq!(derived_struct.vtable[0].function, override_draw);
    }

    #[test]
    fn derived_adds_its_own_new_virtual_slot() {
        let mut arena = DeclArena::new();
        let draw = virtual_method(&mut arena, "draw", false);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![draw], ..StructDecl::default() }),
        ));
        build_vtable(&mut arena, base);

        let resize = virtual_method(&mut arena, "resize", false);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![resize], base_struct: Some(base), ..StructDecl::default() }),
        ));
        build_vtable(&mut arena, derived);

        let derived_struct = arena.get(derived).as_struct().unwrap();
        assert_eq!(derived_struct.vtable.len(), 2);
        assert_eq!(derived_struct.vtable[1].function, resize);
    }
}
