//! Imaginary instantiation (§4.6.8).
//!
//! A template body is validated once, generically, rather than once per
//! instantiation: every `Typename` parameter gets an `ImaginaryType`
//! stand-in exposing exactly the members its `where`/`has` contracts
//! promise — the trait's members for `where T : Trait`, the base's members
//! (plus a `specialized_base` link) for `where T : Base`, and the named
//! prototype itself for `has <prototype>`. C7 then type-checks the template
//! body against these stand-ins instead of against a real instantiation, so
//! an error inside the body is caught before any caller ever instantiates
//! it.

use crate::ast::{Contract, Decl, DeclArena, DeclId, DeclKind, Identifier, TemplateParameterKind, Type, TypeKind};
use std::collections::HashMap;

/// Build one `ImaginaryType` per `Typename` parameter in `params`, scoped to
/// what `contracts` promises about it. Returns a substitution-ready map from
/// template parameter to its imaginary stand-in.
pub fn build_imaginary_params(arena: &mut DeclArena, params: &[DeclId], contracts: &[Contract]) -> HashMap<DeclId, DeclId> {
    let mut out = HashMap::new();
    for &param in params {
        if !matches!(&arena.get(param).kind, DeclKind::TemplateParameter(TemplateParameterKind::Typename { .. })) {
            continue;
        }
        out.insert(param, build_one(arena, param, contracts));
    }
    out
}

fn build_one(arena: &mut DeclArena, param: DeclId, contracts: &[Contract]) -> DeclId {
    let mut members = Vec::new();
    let mut specialized_base = None;

    for contract in contracts {
        match contract {
            Contract::WhereTrait { param: p, trait_ty } if *p == param => {
                if let Some(trait_members) = trait_members_of(arena, trait_ty) {
                    members.extend(trait_members);
                }
            }
            Contract::WhereBase { param: p, base_ty } if *p == param => {
                specialized_base = type_decl(base_ty);
                if let Some(base_members) = struct_members_of(arena, base_ty) {
                    members.extend(base_members);
                }
            }
            Contract::Has { param: p, prototype } if *p == param => members.push(*prototype),
            _ => {}
        }
    }

    members.dedup();
    let span = arena.get(param).span.clone();
    let name = format!("{}$imaginary", arena.get(param).name());
    arena.alloc(Decl::new(Identifier::new(name, span.clone()), span, DeclKind::ImaginaryType { members, specialized_base }))
}

fn type_decl(ty: &Type) -> Option<DeclId> {
    match &ty.kind {
        TypeKind::Struct(id) | TypeKind::Trait(id) => Some(*id),
        _ => None,
    }
}

fn trait_members_of(arena: &DeclArena, ty: &Type) -> Option<Vec<DeclId>> {
    let id = type_decl(ty)?;
    match &arena.get(id).kind {
        DeclKind::Trait(t) if !t.all_members.is_empty() => Some(t.all_members.clone()),
        DeclKind::Trait(t) => Some(t.members.clone()),
        _ => None,
    }
}

fn struct_members_of(arena: &DeclArena, ty: &Type) -> Option<Vec<DeclId>> {
    let id = type_decl(ty)?;
    match &arena.get(id).kind {
        DeclKind::Struct(s) if !s.all_members.is_empty() => Some(s.all_members.clone()),
        DeclKind::Struct(s) => Some(s.members.clone()),
        _ => None,
    }
}
