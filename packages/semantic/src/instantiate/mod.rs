//! Declaration instantiator driver (C6, §4.6).
//!
//! Ties together template matching (§4.6.1), deep-copy instantiation
//! (§4.6.2), struct/trait member processing and the override/shadow rule
//! (§4.6.2/.3), circular composition detection (§4.6.4), implicit
//! special-member synthesis (§4.6.5), v-table construction (§4.6.6), memory
//! layout (§4.6.7), and imaginary instantiation (§4.6.8) into the single
//! fixed-point step every other pass calls on an unresolved type:
//! [`resolve_type`] turns a `Templated{candidates, args}` overload set into
//! a concrete, fully-processed declaration (deduplicated against any prior
//! instantiation of the same template with equal arguments), so no
//! "instantiated but not yet laid out" state ever escapes this module.
//!
//! [`resolve_type`] only fires when C5 already produced a `Templated`
//! reference; an ordinary, non-generic struct or trait never gets one, so
//! nothing else in the pipeline would ever call [`process_struct_chain`] for
//! it. [`resolve_templated_types_file`] and [`instantiate_structs_file`]
//! are the driver's (C10's) two file-wide sweeps that close that gap — the
//! former walks every type-bearing field upgrading any `Templated` it finds
//! (bare or wrapped under a pointer/reference/array), the latter then lays
//! out every plain struct/trait and builds every template's imaginary
//! instantiation. They must run in that order, and the first sweep must
//! finish across the whole batch before the second starts on any file.

pub mod ctors;
pub mod cycles;
pub mod imaginary;
pub mod layout;
pub mod structs;
pub mod templates;
pub mod vtable;

use crate::ast::{
    clone_callable, AstFile, Contract, Decl, DeclArena, DeclId, DeclKind, Expr, Identifier, NamespaceDecl, StructDecl, Substitution,
    TraitDecl, Type, TypeKind,
};
use crate::diagnostics::{DiagnosticSink, ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;
use crate::target::TargetDescriptor;
use crate::validate::owned_children;
use templates::{find_existing_instantiation, instantiate_function, instantiate_struct, instantiate_trait, match_strength, pick_strongest};

/// Resolve one `Templated{candidates, args}` type to a concrete,
/// fully-processed declaration. Non-`Templated` types pass through
/// unchanged — this is the only type shape C6 upgrades.
pub fn resolve_type(arena: &mut DeclArena, target: &TargetDescriptor, ty: &Type, sink: &mut DiagnosticSink) -> SemaResult<Type> {
    let TypeKind::Templated { candidates, args } = &ty.kind else { return Ok(ty.clone()) };
    let candidates = candidates.clone();
    let args = args.clone();

    let mut scored = Vec::new();
    for &candidate in &candidates {
        let params = template_params(arena, candidate);
        if let Some(strength) = match_strength(arena, &params, &args) {
            scored.push((candidate, strength));
        }
    }
    if scored.is_empty() {
        return Err(FatalError::new(ErrorCode::TemplateArgKind, template_span(arena, &candidates), "no template candidate accepts these arguments"));
    }
    let template = match pick_strongest(scored) {
        Ok(id) => id,
        Err(tied) => {
            return Err(FatalError::new(
                ErrorCode::AmbiguousTemplateMatch,
                template_span(arena, &tied),
                "more than one template candidate matches equally well",
            ));
        }
    };

    if let Some(existing) = existing_instantiation(arena, template, &args) {
        return Ok(wrap(arena, existing));
    }

    let inst = instantiate(arena, template, args)?;
    process_new_instantiation(arena, target, inst, sink)?;
    Ok(wrap(arena, inst))
}

fn template_params(arena: &DeclArena, decl: DeclId) -> Vec<DeclId> {
    match &arena.get(decl).kind {
        DeclKind::TemplateFunction(t) => t.params.clone(),
        DeclKind::TemplateStruct(t) => t.params.clone(),
        DeclKind::TemplateTrait(t) => t.params.clone(),
        _ => Vec::new(),
    }
}

fn template_span(arena: &DeclArena, ids: &[DeclId]) -> SourceSpan {
    ids.first().map(|&id| arena.get(id).span.clone()).unwrap_or_else(SourceSpan::synthetic)
}

fn existing_instantiation(arena: &DeclArena, template: DeclId, args: &[Expr]) -> Option<DeclId> {
    let entries = match &arena.get(template).kind {
        DeclKind::TemplateFunction(t) => &t.instantiations,
        DeclKind::TemplateStruct(t) => &t.instantiations,
        DeclKind::TemplateTrait(t) => &t.instantiations,
        _ => return None,
    };
    find_existing_instantiation(entries, args)
}

fn instantiate(arena: &mut DeclArena, template: DeclId, args: Vec<Expr>) -> SemaResult<DeclId> {
    match &arena.get(template).kind {
        DeclKind::TemplateFunction(_) => instantiate_function(arena, template, args),
        DeclKind::TemplateStruct(_) => instantiate_struct(arena, template, args),
        DeclKind::TemplateTrait(_) => instantiate_trait(arena, template, args),
        _ => Err(FatalError::internal(arena.get(template).span.clone(), "resolve_type template candidate is not a template decl")),
    }
}

/// `Templated` types name struct/trait generics almost exclusively — a
/// function template is instantiated through call resolution (C7), which
/// refers to it by `DeclId` directly rather than wrapping it in a `Type`.
fn wrap(arena: &DeclArena, inst: DeclId) -> Type {
    match &arena.get(inst).kind {
        DeclKind::Trait(_) => Type::new(TypeKind::Trait(inst)),
        _ => Type::new(TypeKind::Struct(inst)),
    }
}

/// Drive a freshly-instantiated declaration through every remaining §4.6
/// sub-step. Functions have no layout/v-table/ctor work of their own.
fn process_new_instantiation(arena: &mut DeclArena, target: &TargetDescriptor, inst: DeclId, sink: &mut DiagnosticSink) -> SemaResult<()> {
    match &arena.get(inst).kind {
        DeclKind::Struct(_) => process_struct_chain(arena, target, inst, sink),
        DeclKind::Trait(_) => {
            structs::propagate_trait_members(arena, inst);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Run §4.6.2 through §4.6.7 over `decl`'s base chain root-first, then over
/// `decl` itself, so every query a later step makes about the base (its
/// `all_members`, its layout, its v-table) is already settled.
pub fn process_struct_chain(arena: &mut DeclArena, target: &TargetDescriptor, decl: DeclId, sink: &mut DiagnosticSink) -> SemaResult<()> {
    if let Some(base) = arena.get(decl).as_struct().and_then(|s| s.base_struct) {
        let base_processed = arena.get(base).as_struct().map(|s| !s.memory_layout.is_empty() || s.members.is_empty()).unwrap_or(true);
        if !base_processed {
            process_struct_chain(arena, target, base, sink)?;
        }
    }

    cycles::detect_circular_inheritance(arena, decl)?;
    cycles::detect_circular_value_composition(arena, decl, &mut vec![decl])?;
    structs::propagate_struct_members(arena, decl);
    structs::check_override_shadow(arena, decl, sink);
    ctors::synthesize_special_members(arena, decl);
    vtable::build_vtable(arena, decl);
    layout::compute_layout(arena, decl, target);
    Ok(())
}

/// Build `template`'s imaginary instantiation (§4.6.8): one `ImaginaryType`
/// stand-in per `Typename` parameter, substituted into a deep copy of the
/// template's shape, stored on `imaginary_inst` rather than in the
/// `instantiations` list (it isn't a real instantiation — nothing ever
/// calls into it, and it's never returned by [`resolve_type`]).
pub fn build_imaginary_instantiation(arena: &mut DeclArena, template: DeclId) -> Option<DeclId> {
    enum Kind {
        Function,
        Struct,
        Trait,
    }
    let (kind, params, contracts) = match &arena.get(template).kind {
        DeclKind::TemplateFunction(t) => (Kind::Function, t.params.clone(), t.contracts.clone()),
        DeclKind::TemplateStruct(t) => (Kind::Struct, t.params.clone(), t.contracts.clone()),
        DeclKind::TemplateTrait(t) => (Kind::Trait, t.params.clone(), t.contracts.clone()),
        _ => return None,
    };

    let imaginary_map = imaginary::build_imaginary_params(arena, &params, &contracts);
    let mut subst = Substitution::new();
    for (&param, &imaginary_id) in &imaginary_map {
        subst.bind_type(param, Type::new(TypeKind::Imaginary(imaginary_id)));
    }

    let name = arena.get(template).name().to_string();
    let span = arena.get(template).span.clone();
    let container = arena.get(template).container;

    let inst = match kind {
        Kind::Function => {
            let callable = match &arena.get(template).kind {
                DeclKind::TemplateFunction(t) => t.callable.clone(),
                _ => unreachable!(),
            };
            let cloned = clone_callable(arena, &subst, &callable);
            arena.alloc(Decl::new(Identifier::new(name, span.clone()), span, DeclKind::Function(cloned)))
        }
        Kind::Struct => {
            let shape = match &arena.get(template).kind {
                DeclKind::TemplateStruct(t) => t.shape.clone(),
                _ => unreachable!(),
            };
            let members = templates::clone_struct_members(arena, &subst, &shape);
            arena.alloc(Decl::new(Identifier::new(name, span.clone()), span, DeclKind::Struct(StructDecl { members, ..StructDecl::default() })))
        }
        Kind::Trait => {
            let shape = match &arena.get(template).kind {
                DeclKind::TemplateTrait(t) => t.shape.clone(),
                _ => unreachable!(),
            };
            arena.alloc(Decl::new(Identifier::new(name, span.clone()), span, DeclKind::Trait(TraitDecl { members: shape.members, ..TraitDecl::default() })))
        }
    };

    arena.get_mut(inst).original_decl = Some(template);
    arena.get_mut(inst).container = container;

    match &mut arena.get_mut(template).kind {
        DeclKind::TemplateFunction(t) => t.imaginary_inst = Some(inst),
        DeclKind::TemplateStruct(t) => t.imaginary_inst = Some(inst),
        DeclKind::TemplateTrait(t) => t.imaginary_inst = Some(inst),
        _ => {}
    }
    Some(inst)
}

/// [`resolve_type`] only upgrades a bare `Templated` type; C5 can leave one
/// nested under a `Pointer`/`Reference`/array/function-pointer wrapper (a
/// generic struct used as `Box<T>*` parses as `Pointer(Templated{..})`).
/// Recurses the same shape C5's own `resolve_in_place` uses so a wrapped
/// `Templated` gets instantiated too, not just a bare one.
fn resolve_type_recursive(arena: &mut DeclArena, target: &TargetDescriptor, ty: Type, sink: &mut DiagnosticSink) -> SemaResult<Type> {
    let kind = match ty.kind {
        TypeKind::Pointer(inner) => TypeKind::Pointer(Box::new(resolve_type_recursive(arena, target, *inner, sink)?)),
        TypeKind::Reference(inner) => TypeKind::Reference(Box::new(resolve_type_recursive(arena, target, *inner, sink)?)),
        TypeKind::RValueReference(inner) => TypeKind::RValueReference(Box::new(resolve_type_recursive(arena, target, *inner, sink)?)),
        TypeKind::FlatArray { elem, length } => TypeKind::FlatArray { elem: Box::new(resolve_type_recursive(arena, target, *elem, sink)?), length },
        TypeKind::Dimension { elem, rank } => TypeKind::Dimension { elem: Box::new(resolve_type_recursive(arena, target, *elem, sink)?), rank },
        TypeKind::FunctionPointer { result, params } => {
            let result = Box::new(resolve_type_recursive(arena, target, *result, sink)?);
            let mut resolved_params = Vec::with_capacity(params.len());
            for p in params {
                resolved_params.push(resolve_type_recursive(arena, target, p, sink)?);
            }
            TypeKind::FunctionPointer { result, params: resolved_params }
        }
        other => return resolve_type(arena, target, &Type { kind: other, qualifier: ty.qualifier, is_lvalue: ty.is_lvalue }, sink),
    };
    Ok(Type { kind, qualifier: ty.qualifier, is_lvalue: ty.is_lvalue })
}

fn resolve_contract_types(arena: &mut DeclArena, target: &TargetDescriptor, contracts: &mut [Contract], sink: &mut DiagnosticSink) -> SemaResult<()> {
    for contract in contracts {
        match contract {
            Contract::WhereTrait { trait_ty, .. } => {
                *trait_ty = resolve_type_recursive(arena, target, std::mem::replace(trait_ty, Type::void()), sink)?
            }
            Contract::WhereBase { base_ty, .. } => {
                *base_ty = resolve_type_recursive(arena, target, std::mem::replace(base_ty, Type::void()), sink)?
            }
            _ => {}
        }
    }
    Ok(())
}

/// Placeholder swapped into a decl's `kind` while we own it outside the
/// arena, mirroring `resolve_types.rs`'s `take_kind`.
fn take_kind(arena: &mut DeclArena, decl: DeclId) -> DeclKind {
    std::mem::replace(&mut arena.get_mut(decl).kind, DeclKind::Namespace(NamespaceDecl { children: Vec::new(), prototype: None }))
}

/// Close the gap C5 leaves open, in two file-wide sweeps rather than one
/// combined walk: a struct's layout can only be computed once every member
/// across the *whole batch* carries a ground type, including a base struct
/// declared later in the same file or in a different file entirely. Mixing
/// "resolve this member's type" and "lay out this struct" into one recursive
/// pass would let a struct whose base is processed first (because
/// [`process_struct_chain`]'s own base-chain recursion reached it before the
/// driver's file-order walk did) compute its layout against a base whose own
/// members are still `Templated`.
///
/// `resolve_templated_types_file` must run for every file in the batch
/// before `instantiate_structs_file` runs for any of them.
pub fn resolve_templated_types_file(arena: &mut DeclArena, target: &TargetDescriptor, file: &AstFile, sink: &mut DiagnosticSink) -> SemaResult<()> {
    for &decl in &file.declarations {
        resolve_templated_types_decl(arena, target, decl, sink)?;
    }
    Ok(())
}

fn resolve_templated_types_decl(arena: &mut DeclArena, target: &TargetDescriptor, decl: DeclId, sink: &mut DiagnosticSink) -> SemaResult<()> {
    let mut kind = take_kind(arena, decl);
    let outcome = instantiate_own_type_fields(arena, target, &mut kind, sink);
    arena.get_mut(decl).kind = kind;
    outcome?;

    for child in owned_children(arena.get(decl)) {
        resolve_templated_types_decl(arena, target, child, sink)?;
    }
    Ok(())
}

/// Lay out every plain (non-generic) struct/trait this file declares
/// directly and build every template's imaginary instantiation. C5 never
/// produces a `Templated` reference to an ordinary struct (only a name with
/// more than one generic candidate does), so nothing ever drives
/// [`process_struct_chain`] for one; this closes that gap. Struct order
/// doesn't matter here — `process_struct_chain` already processes an
/// unprocessed base first, and by this point every member across the batch
/// already has a ground type.
pub fn instantiate_structs_file(arena: &mut DeclArena, target: &TargetDescriptor, file: &AstFile, sink: &mut DiagnosticSink) -> SemaResult<()> {
    for &decl in &file.declarations {
        instantiate_structs_decl(arena, target, decl, sink)?;
    }
    Ok(())
}

fn instantiate_structs_decl(arena: &mut DeclArena, target: &TargetDescriptor, decl: DeclId, sink: &mut DiagnosticSink) -> SemaResult<()> {
    match &arena.get(decl).kind {
        DeclKind::Struct(s) if s.memory_layout.is_empty() || s.members.is_empty() => process_struct_chain(arena, target, decl, sink)?,
        DeclKind::Trait(_) => structs::propagate_trait_members(arena, decl),
        DeclKind::TemplateFunction(t) if t.imaginary_inst.is_none() => {
            build_imaginary_instantiation(arena, decl);
        }
        DeclKind::TemplateStruct(t) if t.imaginary_inst.is_none() => {
            build_imaginary_instantiation(arena, decl);
        }
        DeclKind::TemplateTrait(t) if t.imaginary_inst.is_none() => {
            build_imaginary_instantiation(arena, decl);
        }
        _ => {}
    }

    for child in owned_children(arena.get(decl)) {
        instantiate_structs_decl(arena, target, child, sink)?;
    }
    Ok(())
}

fn instantiate_own_type_fields(arena: &mut DeclArena, target: &TargetDescriptor, kind: &mut DeclKind, sink: &mut DiagnosticSink) -> SemaResult<()> {
    match kind {
        DeclKind::Variable { ty, .. } => *ty = resolve_type_recursive(arena, target, std::mem::replace(ty, Type::void()), sink)?,
        DeclKind::Parameter { ty, .. } => *ty = resolve_type_recursive(arena, target, std::mem::replace(ty, Type::void()), sink)?,
        DeclKind::TypeAlias { aliased } => *aliased = resolve_type_recursive(arena, target, std::mem::replace(aliased, Type::void()), sink)?,
        DeclKind::Enum { underlying, .. } => *underlying = resolve_type_recursive(arena, target, std::mem::replace(underlying, Type::void()), sink)?,
        DeclKind::Extension(ext) => {
            ext.extended_type = resolve_type_recursive(arena, target, std::mem::replace(&mut ext.extended_type, Type::void()), sink)?
        }
        DeclKind::Function(c) | DeclKind::Constructor { callable: c, .. } | DeclKind::Destructor { callable: c, .. } => {
            c.return_type = resolve_type_recursive(arena, target, std::mem::replace(&mut c.return_type, Type::void()), sink)?
        }
        DeclKind::Operator { callable, .. } | DeclKind::CallOperator(callable) | DeclKind::TypeSuffix(callable) => {
            callable.return_type = resolve_type_recursive(arena, target, std::mem::replace(&mut callable.return_type, Type::void()), sink)?
        }
        DeclKind::TemplateFunction(t) => {
            t.callable.return_type = resolve_type_recursive(arena, target, std::mem::replace(&mut t.callable.return_type, Type::void()), sink)?;
            resolve_contract_types(arena, target, &mut t.contracts, sink)?;
        }
        DeclKind::TemplateStruct(t) => resolve_contract_types(arena, target, &mut t.contracts, sink)?,
        DeclKind::TemplateTrait(t) => resolve_contract_types(arena, target, &mut t.contracts, sink)?,
        _ => {}
    }
    Ok(())
}
