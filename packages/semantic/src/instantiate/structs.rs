//! Struct/trait member processing (§4.6.2, §4.6.3).
//!
//! Once a struct's base is known (or a trait's inherited-trait list is
//! known), this builds the declaration's **`all_members`** set — every
//! member name visible on a value of that type, own members shadowing
//! same-named inherited ones — and enforces the override/shadow rule: a
//! member marked `override` must name-and-signature match a `virtual` base
//! member, and a member that matches one *without* declaring `override` is
//! flagged rather than silently shadowing it.

use crate::ast::{CallableDecl, DeclArena, DeclId, DeclKind, Type};
use crate::diagnostics::{DiagnosticSink, ErrorCode};

/// Build `all_members` for a `Struct` decl from its own `members` plus
/// whatever the base struct's `all_members` leaves unshadowed by name.
/// Callers walk the inheritance chain root-first so `base`'s own
/// `all_members` is already populated by the time this runs.
pub fn propagate_struct_members(arena: &mut DeclArena, decl: DeclId) {
    let (own, base) = {
        let s = arena.get(decl).as_struct().expect("propagate_struct_members on a non-struct decl");
        (s.members.clone(), s.base_struct)
    };

    let mut all = own.clone();
    if let Some(base) = base {
        let own_names: Vec<&str> = own.iter().map(|&m| arena.get(m).name()).collect();
        for member in base_all_members(arena, base) {
            if !own_names.contains(&arena.get(member).name()) {
                all.push(member);
            }
        }
    }

    if let Some(s) = arena.get_mut(decl).as_struct_mut() {
        s.all_members = all;
    }
}

fn base_all_members(arena: &DeclArena, base: DeclId) -> Vec<DeclId> {
    match arena.get(base).as_struct() {
        Some(s) if !s.all_members.is_empty() => s.all_members.clone(),
        Some(s) => s.members.clone(),
        None => Vec::new(),
    }
}

/// Likewise for traits: `all_members` is the union of own members and every
/// inherited trait's `all_members`, deduplicated by name. A trait has no
/// single base, so there's no shadow-by-chain order to respect — first
/// occurrence (own, then inheritance-list order) wins.
pub fn propagate_trait_members(arena: &mut DeclArena, decl: DeclId) {
    let (own, inherited) = {
        let t = arena.get(decl).as_trait().expect("propagate_trait_members on a non-trait decl");
        (t.members.clone(), t.inherited_traits.clone())
    };

    let mut seen: Vec<String> = own.iter().map(|&m| arena.get(m).name().to_string()).collect();
    let mut all = own.clone();
    for trait_id in inherited {
        let members = match &arena.get(trait_id).kind {
            DeclKind::Trait(t) if !t.all_members.is_empty() => t.all_members.clone(),
            DeclKind::Trait(t) => t.members.clone(),
            _ => continue,
        };
        for member in members {
            let name = arena.get(member).name().to_string();
            if !seen.contains(&name) {
                seen.push(name);
                all.push(member);
            }
        }
    }

    if let DeclKind::Trait(t) = &mut arena.get_mut(decl).kind {
        t.all_members = all;
    }
}

/// §4.6.3: every own member marked `override` must match a `virtual` base
/// member by name and parameter types (`OverrideMatchesNothing` otherwise);
/// every own member that matches a base virtual member's signature without
/// declaring `override` is flagged too (`MissingOverride`), since silently
/// shadowing a virtual member is almost always a mistake rather than intent.
pub fn check_override_shadow(arena: &DeclArena, decl: DeclId, sink: &mut DiagnosticSink) {
    let (own, base) = {
        let Some(s) = arena.get(decl).as_struct() else { return };
        (s.members.clone(), s.base_struct)
    };
    let Some(base) = base else {
        for &member in &own {
            if arena.get(member).is_override() {
                sink.warn(
                    ErrorCode::OverrideMatchesNothing,
                    arena.get(member).span.clone(),
                    format!("`{}` is marked override but `{}` has no base struct", arena.get(member).name(), arena.get(decl).name()),
                );
            }
        }
        return;
    };

    for &member in &own {
        let d = arena.get(member);
        let Some(callable) = d.callable() else { continue };
        match find_virtual_match(arena, base, d.name(), callable) {
            Some(_) if !d.is_override() => {
                sink.warn(
                    ErrorCode::MissingOverride,
                    d.span.clone(),
                    format!("`{}` shadows a virtual base member; mark it `override`", d.name()),
                );
            }
            None if d.is_override() => {
                sink.warn(
                    ErrorCode::OverrideMatchesNothing,
                    d.span.clone(),
                    format!("`{}` is marked override but matches no virtual base member", d.name()),
                );
            }
            _ => {}
        }
    }
}

fn find_virtual_match(arena: &DeclArena, base: DeclId, name: &str, callable: &CallableDecl) -> Option<DeclId> {
    base_all_members(arena, base).into_iter().find(|&m| {
        let d = arena.get(m);
        d.name() == name && d.is_virtual() && d.callable().map(|c| params_match(arena, &c.params, &callable.params)).unwrap_or(false)
    })
}

/// §4.6.3: "parameter label sequence and parameter types match modulo
/// top-level qualifiers and references" — `fn speak(self: &Self)` and
/// `fn speak(self: &mut Self)` are the same slot, not an overload. Also
/// used by [`crate::transform::find_vtable_slot`] to disambiguate two
/// same-named virtual overloads before accepting a v-table slot match.
pub(crate) fn params_match(arena: &DeclArena, a: &[DeclId], b: &[DeclId]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| param_type(arena, x).matches_modulo_quals_and_reference(&param_type(arena, y)))
}

fn param_type(arena: &DeclArena, param: DeclId) -> Type {
    match &arena.get(param).kind {
        DeclKind::Parameter { ty, .. } => ty.clone(),
        _ => Type::void(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, DeclModifiers, Identifier, StructDecl, VarKind};
    use crate::position::SourceSpan;

    fn var(arena: &mut DeclArena, name: &str) -> DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic(name),
            SourceSpan::synthetic(),
            DeclKind::Variable { ty: Type::builtin("i32").unwrap(), initializer: None, var_kind: VarKind::Member },
        ))
    }

    fn param_with_qualifier(arena: &mut DeclArena, qualifier: crate::ast::Qualifier) -> DeclId {
        let span = SourceSpan::synthetic();
        let ty = Type::qualified(Type::builtin("i32").unwrap(), qualifier, &span).unwrap().reference_to();
        arena.alloc(Decl::new(Identifier::synthetic("self"), span, DeclKind::Parameter { ty, default_value: None, label: None, is_in: false }))
    }

    fn method_with_param(arena: &mut DeclArena, name: &str, param: DeclId, virtual_: bool, override_: bool) -> DeclId {
        let mut d = Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Function(CallableDecl::new(vec![param], Type::void())));
        if virtual_ {
            d.modifiers |= DeclModifiers::VIRTUAL;
        }
        if override_ {
            d.modifiers |= DeclModifiers::OVERRIDE;
        }
        arena.alloc(d)
    }

    fn method(arena: &mut DeclArena, name: &str, virtual_: bool, override_: bool) -> DeclId {
        let mut d = Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Function(CallableDecl::new(Vec::new(), Type::void())));
        if virtual_ {
            d.modifiers |= DeclModifiers::VIRTUAL;
        }
        if override_ {
            d.modifiers |= DeclModifiers::OVERRIDE;
        }
        arena.alloc(d)
    }

    #[test]
    fn own_members_shadow_base_members_by_name() {
        let mut arena = DeclArena::new();
        let base_x = var(&mut arena, "x");
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Base"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_x], ..StructDecl::default() }),
        ));
        let own_x = var(&mut arena, "x");
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Derived"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_x], base_struct: Some(base), ..StructDecl::default() }),
        ));

        propagate_struct_members(&mut arena, derived);
        let all = arena.get(derived).as_struct().unwrap().all_members.clone();
        assert_eq!(all, vec![own_x]);
    }

    #[test]
    fn unshadowed_base_members_are_inherited() {
        let mut arena = DeclArena::new();
        let base_y = var(&mut arena, "y");
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Base"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_y], ..StructDecl::default() }),
        ));
        let own_x = var(&mut arena, "x");
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Derived"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_x], base_struct: Some(base), ..StructDecl::default() }),
        ));

        propagate_struct_members(&mut arena, derived);
        let all = arena.get(derived).as_struct().unwrap().all_members.clone();
        assert_eq!(all, vec![own_x, base_y]);
    }

    #[test]
    fn matching_override_is_accepted_silently() {
        let mut arena = DeclArena::new();
        let base_draw = method(&mut arena, "draw", true, false);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_draw], ..StructDecl::default() }),
        ));
        let own_draw = method(&mut arena, "draw", false, true);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_draw], base_struct: Some(base), ..StructDecl::default() }),
        ));

        let mut sink = DiagnosticSink::new();
        check_override_shadow(&arena, derived, &mut sink);
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn override_with_no_base_match_is_flagged() {
        let mut arena = DeclArena::new();
        let base = arena.alloc(Decl::new(Identifier::synthetic("Shape"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        let own_draw = method(&mut arena, "draw", false, true);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_draw], base_struct: Some(base), ..StructDecl::default() }),
        ));

        let mut sink = DiagnosticSink::new();
        check_override_shadow(&arena, derived, &mut sink);
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(sink.warnings()[0].code, ErrorCode::OverrideMatchesNothing);
    }

    #[test]
    fn shadowing_virtual_member_without_override_is_flagged() {
        let mut arena = DeclArena::new();
        let base_draw = method(&mut arena, "draw", true, false);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_draw], ..StructDecl::default() }),
        ));
        let own_draw = method(&mut arena, "draw", false, false);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_draw], base_struct: Some(base), ..StructDecl::default() }),
        ));

        let mut sink = DiagnosticSink::new();
        check_override_shadow(&arena, derived, &mut sink);
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(sink.warnings()[0].code, ErrorCode::MissingOverride);
    }

    #[test]
    fn override_matches_a_virtual_base_member_despite_a_qualifier_difference() {
        let mut arena = DeclArena::new();
        let base_param = param_with_qualifier(&mut arena, crate::ast::Qualifier::Unassigned);
        let base_speak = method_with_param(&mut arena, "speak", base_param, true, false);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Animal"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![base_speak], ..StructDecl::default() }),
        ));
        let own_param = param_with_qualifier(&mut arena, crate::ast::Qualifier::Mut);
        let own_speak = method_with_param(&mut arena, "speak", own_param, false, true);
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Dog"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![own_speak], base_struct: Some(base), ..StructDecl::default() }),
        ));

        let mut sink = DiagnosticSink::new();
        check_override_shadow(&arena, derived, &mut sink);
        assert!(sink.warnings().is_empty());
    }
}
