//! Memory layout (§4.6.7).
//!
//! Lays a struct's members out in declaration order, inheriting the base
//! struct's layout verbatim and continuing after it, inserting padding
//! wherever a member's alignment demands it, and recording a trailing
//! padding slot so the struct's own size is a multiple of its alignment.
//! Requires the base struct (if any) and every struct-typed member to have
//! already had its own layout computed — callers walk the type graph
//! bottom-up the same way [`crate::instantiate::ctors`] does.

use crate::ast::{DeclArena, DeclId, LayoutMember, Type, TypeKind};
use crate::target::TargetDescriptor;

pub fn compute_layout(arena: &mut DeclArena, decl: DeclId, target: &TargetDescriptor) {
    let (base, own_members) = {
        let Some(s) = arena.get(decl).as_struct() else { return };
        (s.base_struct, s.members.clone())
    };

    let mut layout = Vec::new();
    let mut offset: u64 = 0;
    let mut max_align: u32 = 1;
    let mut raw_total: u64 = 0;

    if let Some(base) = base {
        if let Some(base_struct) = arena.get(base).as_struct() {
            layout = base_struct.memory_layout.clone();
            offset = base_struct.data_size_with_padding;
            max_align = base_struct.struct_align.max(1);
            raw_total = base_struct.data_size_without_padding;
        }
    }

    // The hidden v-table pointer is laid out once, by whichever struct in
    // the chain first introduces it — [`crate::instantiate::vtable`]
    // prepends a real `VTable`-kind member to that struct's `members` (and
    // only that struct's), so it falls out of the ordinary member loop
    // below; a derived struct sharing that owner already inherited the
    // slot as part of the base layout above and never gets one of its own.
    for member in own_members {
        let ty = member_type(arena, member);
        let (size, align) = size_align_of(arena, target, &ty);
        let aligned_offset = align_up(offset, align.max(1));
        if aligned_offset > offset {
            layout.push(LayoutMember { member: None, is_padding: true, offset, size: aligned_offset - offset, align: 1 });
        }
        layout.push(LayoutMember { member: Some(member), is_padding: false, offset: aligned_offset, size, align });
        offset = aligned_offset + size;
        raw_total += size;
        max_align = max_align.max(align);
    }

    let struct_align = max_align.min(target.alignof_struct().max(1));
    let with_padding = align_up(offset, struct_align);
    if with_padding > offset {
        layout.push(LayoutMember { member: None, is_padding: true, offset, size: with_padding - offset, align: 1 });
    }

    if let Some(s) = arena.get_mut(decl).as_struct_mut() {
        s.memory_layout = layout;
        s.data_size_without_padding = raw_total;
        s.data_size_with_padding = with_padding;
        s.struct_align = struct_align;
    }
}

fn member_type(arena: &DeclArena, member: DeclId) -> Type {
    match &arena.get(member).kind {
        crate::ast::DeclKind::Variable { ty, .. } => ty.clone(),
        _ => Type::void(),
    }
}

fn align_up(value: u64, align: u32) -> u64 {
    let align = align.max(1) as u64;
    (value + align - 1) / align * align
}

/// Size and alignment of a resolved `Type`, in bytes. Lengths on
/// `FlatArray`/`Dimension` are constant expressions evaluated by C7's
/// constexpr solver, which runs after this pass — until that value is
/// attached, such array types fall back to pointer-sized layout rather than
/// blocking C6 on a dependency it doesn't otherwise have.
fn size_align_of(arena: &DeclArena, target: &TargetDescriptor, ty: &Type) -> (u64, u32) {
    match &ty.kind {
        TypeKind::BuiltIn { signed: _, floating, size_bits, .. } => {
            let bytes = target.sizeof_builtin(*size_bits, *floating);
            (bytes as u64, bytes)
        }
        TypeKind::Pointer(_) | TypeKind::Reference(_) | TypeKind::RValueReference(_) | TypeKind::FunctionPointer { .. } => {
            (target.sizeof_ptr() as u64, target.sizeof_ptr())
        }
        TypeKind::VTable => (target.sizeof_ptr() as u64, target.sizeof_ptr()),
        TypeKind::Struct(id) => match arena.get(*id).as_struct() {
            Some(s) => (s.data_size_with_padding, s.struct_align.max(1)),
            None => (0, 1),
        },
        TypeKind::Enum(id) => match &arena.get(*id).kind {
            crate::ast::DeclKind::Enum { underlying, .. } => size_align_of(arena, target, underlying),
            _ => (target.sizeof_ptr() as u64, target.sizeof_ptr()),
        },
        TypeKind::FlatArray { elem, .. } | TypeKind::Dimension { elem, .. } => {
            let (_, elem_align) = size_align_of(arena, target, elem);
            (target.sizeof_ptr() as u64, elem_align.max(1))
        }
        _ => (target.sizeof_ptr() as u64, target.sizeof_ptr()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, DeclKind, Identifier, StructDecl, VarKind};
    use crate::position::SourceSpan;

    fn field(arena: &mut DeclArena, name: &str, ty: Type) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Variable { ty, initializer: None, var_kind: VarKind::Member }))
    }

    #[test]
    fn two_i32_fields_pack_without_padding() {
        let mut arena = DeclArena::new();
        let a = field(&mut arena, "a", Type::builtin("i32").unwrap());
        let b = field(&mut arena, "b", Type::builtin("i32").unwrap());
        let s = arena.alloc(Decl::new(
            Identifier::synthetic("Point"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![a, b], ..StructDecl::default() }),
        ));

        compute_layout(&mut arena, s, &TargetDescriptor::host());
        let sd = arena.get(s).as_struct().unwrap();
        assert_eq!(sd.data_size_without_padding, 8);
        assert_eq!(sd.data_size_with_padding, 8);
        assert_eq!(sd.struct_align, 4);
    }

    #[test]
    fn narrow_then_wide_field_inserts_padding() {
        let mut arena = DeclArena::new();
        let flag = field(&mut arena, "flag", Type::builtin("bool").unwrap());
        let big = field(&mut arena, "big", Type::builtin("i64").unwrap());
        let s = arena.alloc(Decl::new(
            Identifier::synthetic("Flagged"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![flag, big], ..StructDecl::default() }),
        ));

        compute_layout(&mut arena, s, &TargetDescriptor::host());
        let sd = arena.get(s).as_struct().unwrap();
        assert!(sd.memory_layout.iter().any(|m| m.is_padding));
        assert_eq!(sd.data_size_with_padding, 16);
        assert_eq!(sd.struct_align, 8);
    }

    #[test]
    fn derived_struct_continues_after_base_layout() {
        let mut arena = DeclArena::new();
        let base_field = field(&mut arena, "x", Type::builtin("i32").unwrap());
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Base"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_field], ..StructDecl::default() }),
        ));
        compute_layout(&mut arena, base, &TargetDescriptor::host());

        let derived_field = field(&mut arena, "y", Type::builtin("i32").unwrap());
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Derived"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![derived_field], base_struct: Some(base), ..StructDecl::default() }),
        ));
        compute_layout(&mut arena, derived, &TargetDescriptor::host());

        let dd = arena.get(derived).as_struct().unwrap();
        assert_eq!(dd.data_size_with_padding, 8);
        let derived_member_offset = dd.memory_layout.iter().find(|m| m.member == Some(derived_field)).unwrap().offset;
        assert_eq!(derived_member_offset, 4);
    }
}
