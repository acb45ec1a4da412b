//! Implicit constructor/destructor synthesis (§4.6.5).
//!
//! A struct without a user-provided default/copy/move constructor or
//! destructor gets one synthesized. Synthesis can fail if a member (or the
//! base) has no corresponding constructor/destructor of its own — the
//! result is `SynthesisState::Deleted` rather than a diagnostic here, since
//! "you used a deleted special member" is only an error at the use site
//! (C7), not at the struct declaration itself. Callers run this root-first
//! along the base-struct chain so a base's synthesis state is already
//! settled by the time a derived struct asks about it.

use crate::ast::{CallableDecl, CtorKind, Decl, DeclArena, DeclId, DeclKind, Identifier, SynthesisState, Type, TypeKind, VarKind};

pub fn synthesize_special_members(arena: &mut DeclArena, decl: DeclId) {
    synthesize_constructor(arena, decl, CtorKind::Normal);
    synthesize_constructor(arena, decl, CtorKind::Copy);
    synthesize_constructor(arena, decl, CtorKind::Move);
    synthesize_destructor(arena, decl);
}

fn synthesize_constructor(arena: &mut DeclArena, decl: DeclId, kind: CtorKind) {
    let (already, members, base, span) = {
        let Some(s) = arena.get(decl).as_struct() else { return };
        let already = s.constructors.iter().any(|&c| matches!(&arena.get(c).kind, DeclKind::Constructor { ctor_kind, .. } if *ctor_kind == kind));
        (already, s.members.clone(), s.base_struct, arena.get(decl).span.clone())
    };
    if already {
        return;
    }

    let state = if members_support(arena, &members, kind) && base.map(|b| base_supports(arena, b, kind)).unwrap_or(true) {
        SynthesisState::Verified
    } else {
        SynthesisState::Deleted
    };

    let params = match kind {
        CtorKind::Normal => Vec::new(),
        CtorKind::Copy | CtorKind::Move => vec![arena.alloc(Decl::new(
            Identifier::synthetic("other"),
            span.clone(),
            DeclKind::Parameter { ty: self_param_type(decl, kind), default_value: None, label: None, is_in: true },
        ))],
    };

    let ctor = arena.alloc(Decl::new(
        Identifier::synthetic(ctor_name(kind)),
        span,
        DeclKind::Constructor { callable: CallableDecl::new(params, Type::void()), ctor_kind: kind, state },
    ));

    if let Some(s) = arena.get_mut(decl).as_struct_mut() {
        s.constructors.push(ctor);
    }
}

fn self_param_type(decl: DeclId, kind: CtorKind) -> Type {
    let named = Type::new(TypeKind::Struct(decl));
    match kind {
        CtorKind::Copy => named.reference_to(),
        CtorKind::Move => Type::new(TypeKind::RValueReference(Box::new(named))),
        CtorKind::Normal => named,
    }
}

fn ctor_name(kind: CtorKind) -> &'static str {
    match kind {
        CtorKind::Normal => "init",
        CtorKind::Copy => "init.copy",
        CtorKind::Move => "init.move",
    }
}

fn members_support(arena: &DeclArena, members: &[DeclId], kind: CtorKind) -> bool {
    members.iter().all(|&m| member_supports(arena, m, kind))
}

fn member_supports(arena: &DeclArena, member: DeclId, kind: CtorKind) -> bool {
    match &arena.get(member).kind {
        DeclKind::Variable { ty, initializer, var_kind: VarKind::Member } => {
            if kind == CtorKind::Normal && initializer.is_some() {
                return true;
            }
            match ty.as_struct() {
                Some(struct_id) => struct_ctor_state(arena, struct_id, kind) != SynthesisState::Deleted,
                None => true, // builtins/pointers/references are trivially constructible.
            }
        }
        _ => true,
    }
}

fn base_supports(arena: &DeclArena, base: DeclId, kind: CtorKind) -> bool {
    struct_ctor_state(arena, base, kind) != SynthesisState::Deleted
}

fn struct_ctor_state(arena: &DeclArena, struct_id: DeclId, kind: CtorKind) -> SynthesisState {
    let Some(s) = arena.get(struct_id).as_struct() else { return SynthesisState::Verified };
    s.constructors
        .iter()
        .find_map(|&c| match &arena.get(c).kind {
            DeclKind::Constructor { ctor_kind, state, .. } if *ctor_kind == kind => Some(*state),
            _ => None,
        })
        .unwrap_or(SynthesisState::Verified)
}

fn synthesize_destructor(arena: &mut DeclArena, decl: DeclId) {
    let (already, members, base, span) = {
        let Some(s) = arena.get(decl).as_struct() else { return };
        (s.destructor.is_some(), s.members.clone(), s.base_struct, arena.get(decl).span.clone())
    };
    if already {
        return;
    }

    let members_ok = members.iter().all(|&m| member_destructible(arena, m));
    let base_ok = base.map(|b| struct_destructor_state(arena, b) != SynthesisState::Deleted).unwrap_or(true);
    let state = if members_ok && base_ok { SynthesisState::Verified } else { SynthesisState::Deleted };

    let dtor = arena.alloc(Decl::new(
        Identifier::synthetic("deinit"),
        span,
        DeclKind::Destructor { callable: CallableDecl::new(Vec::new(), Type::void()), state },
    ));
    if let Some(s) = arena.get_mut(decl).as_struct_mut() {
        s.destructor = Some(dtor);
    }
}

fn member_destructible(arena: &DeclArena, member: DeclId) -> bool {
    match &arena.get(member).kind {
        DeclKind::Variable { ty, var_kind: VarKind::Member, .. } => match ty.as_struct() {
            Some(struct_id) => struct_destructor_state(arena, struct_id) != SynthesisState::Deleted,
            None => true,
        },
        _ => true,
    }
}

fn struct_destructor_state(arena: &DeclArena, struct_id: DeclId) -> SynthesisState {
    let Some(s) = arena.get(struct_id).as_struct() else { return SynthesisState::Verified };
    match s.destructor {
        Some(d) => match &arena.get(d).kind {
            DeclKind::Destructor { state, .. } => *state,
            _ => SynthesisState::Verified,
        },
        None => SynthesisState::Verified,
    }
}
