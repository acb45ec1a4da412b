//! Template overload resolution and instantiation (§4.6.1, §4.6.2).

use crate::ast::{
    clone_callable, clone_expr, Decl, DeclArena, DeclId, DeclKind, Expr, ExprKind, Identifier, StructDecl, Substitution,
    TemplateArgBinding, TemplateInstEntry, TemplateParameterKind, TraitDecl, Type, TypeKind,
};
use crate::contracts::{base_distance, template_args_equal};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use std::collections::HashMap;

/// One candidate's per-position match strength, ranked left-to-right
/// (§4.6.1): `Exact` beats `DefaultValues` beats `Castable`. A param/arg pair
/// that doesn't even reach one of these is a hard rejection, modeled by
/// `match_strength` returning `None` for the whole candidate rather than by
/// a variant here. Declared in this order so the derived `Ord` directly
/// implements "smallest strength wins".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Exact,
    DefaultValues,
    Castable(u32),
}

/// Score `args` against `params` for one template candidate. Returns the
/// per-position strength vector, or `None` if the candidate is rejected
/// outright (wrong arg kind, incompatible bound, too many/too few args).
pub fn match_strength(arena: &DeclArena, params: &[DeclId], args: &[Expr]) -> Option<smallvec::SmallVec<[Strength; 4]>> {
    if args.len() > params.len() {
        return None;
    }
    let mut out = smallvec::SmallVec::new();
    for (i, &param) in params.iter().enumerate() {
        let strength = match (&arena.get(param).kind, args.get(i)) {
            (DeclKind::TemplateParameter(TemplateParameterKind::Typename { bound, .. }), Some(arg)) => {
                let ExprKind::TypeValue(arg_ty) = &arg.kind else { return None };
                match bound {
                    None => Strength::Exact,
                    Some(bound_ty) => {
                        let Some(bound_decl) = type_decl(bound_ty) else { return None };
                        match base_distance(arena, arg_ty, bound_decl) {
                            Some(0) => Strength::Exact,
                            Some(n) => Strength::Castable(n),
                            None => return None,
                        }
                    }
                }
            }
            (DeclKind::TemplateParameter(TemplateParameterKind::Const { ty, .. }), Some(arg)) => {
                if value_type_of(arg) == *ty {
                    Strength::Exact
                } else {
                    return None;
                }
            }
            // A missing trailing arg is covered if the param carries a
            // default: a default expression for `Const`, a default type for
            // `Typename`.
            (DeclKind::TemplateParameter(TemplateParameterKind::Const { default: Some(_), .. }), None) => Strength::DefaultValues,
            (DeclKind::TemplateParameter(TemplateParameterKind::Typename { default: Some(_), .. }), None) => Strength::DefaultValues,
            _ => return None,
        };
        out.push(strength);
    }
    Some(out)
}

fn value_type_of(expr: &Expr) -> Type {
    expr.value_type.clone()
}

fn type_decl(ty: &Type) -> Option<DeclId> {
    match &ty.kind {
        TypeKind::Struct(id) | TypeKind::Trait(id) | TypeKind::Enum(id) => Some(*id),
        _ => None,
    }
}

/// Left-prioritized comparison: the first position where two strength
/// vectors differ decides. Equal vectors are ambiguous.
pub fn pick_strongest(candidates: Vec<(DeclId, smallvec::SmallVec<[Strength; 4]>)>) -> Result<DeclId, Vec<DeclId>> {
    let mut best: Option<(DeclId, &smallvec::SmallVec<[Strength; 4]>)> = None;
    let mut tied = Vec::new();
    for (id, strengths) in &candidates {
        match &best {
            None => best = Some((*id, strengths)),
            Some((_, current_best)) => match compare_strength(strengths, current_best) {
                std::cmp::Ordering::Less => {
                    tied.clear();
                    best = Some((*id, strengths));
                }
                std::cmp::Ordering::Equal => tied.push(*id),
                std::cmp::Ordering::Greater => {}
            },
        }
    }
    match best {
        Some((id, _)) if tied.is_empty() => Ok(id),
        Some((id, _)) => {
            tied.push(id);
            Err(tied)
        }
        None => Err(Vec::new()),
    }
}

fn compare_strength(a: &[Strength], b: &[Strength]) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b) {
        if x != y {
            return x.cmp(y);
        }
    }
    std::cmp::Ordering::Equal
}

/// Has this template already been instantiated with an equal argument
/// vector (§3.3 invariant 8: `template_instantiations` deduplicated by
/// template-argument equality)?
pub fn find_existing_instantiation(instantiations: &[TemplateInstEntry], args: &[Expr]) -> Option<DeclId> {
    instantiations.iter().find(|entry| template_args_equal(&entry.args, args)).map(|entry| entry.inst)
}

fn binding_for(arena: &DeclArena, param: DeclId, arg: &Expr) -> SemaResult<(DeclId, TemplateArgBinding)> {
    match (&arena.get(param).kind, &arg.kind) {
        (DeclKind::TemplateParameter(TemplateParameterKind::Typename { .. }), ExprKind::TypeValue(ty)) => {
            Ok((param, TemplateArgBinding::Type(ty.clone())))
        }
        (DeclKind::TemplateParameter(TemplateParameterKind::Const { .. }), _) => Ok((param, TemplateArgBinding::Const(arg.clone()))),
        _ => Err(FatalError::new(ErrorCode::TemplateArgKind, arg.span.clone(), "template argument kind does not match parameter")),
    }
}

fn build_substitution(arena: &DeclArena, params: &[DeclId], args: &[Expr]) -> SemaResult<Substitution> {
    let mut subst = Substitution::default();
    for (param, arg) in params.iter().zip(args) {
        let (id, binding) = binding_for(arena, *param, arg)?;
        match binding {
            TemplateArgBinding::Type(ty) => subst.bind_type(id, ty),
            TemplateArgBinding::Const(expr) => subst.bind_const(id, expr),
        }
    }
    Ok(subst)
}

/// Instantiate a `TemplateFunctionDecl` with a concrete argument vector
/// (§4.6.2): deep-copy the callable under a fresh `Substitution`, record the
/// instantiation, and return the new `Function` decl id with
/// `original_decl` pointing back at the template.
pub fn instantiate_function(arena: &mut DeclArena, template: DeclId, args: Vec<Expr>) -> SemaResult<DeclId> {
    let (params, callable, name, span, container) = {
        let d = arena.get(template);
        let DeclKind::TemplateFunction(t) = &d.kind else {
            return Err(FatalError::internal(d.span.clone(), "instantiate_function called on a non-template decl"));
        };
        (t.params.clone(), t.callable.clone(), d.name().to_string(), d.span.clone(), d.container)
    };

    let subst = build_substitution(arena, &params, &args)?;
    let cloned = clone_callable(arena, &subst, &callable);

    let mut inst = Decl::new(Identifier::new(name, span.clone()), span, DeclKind::Function(cloned));
    inst.original_decl = Some(template);
    inst.container = container;
    let inst_id = arena.alloc(inst);

    if let DeclKind::TemplateFunction(t) = &mut arena.get_mut(template).kind {
        t.instantiations.push(TemplateInstEntry { args, inst: inst_id });
    }
    Ok(inst_id)
}

/// Instantiate a `TemplateStructDecl` with a concrete argument vector
/// (§4.6.2): deep-copy the shape's member declarations under a fresh
/// `Substitution`. Member processing (base resolution, layout, v-table)
/// happens afterward in [`crate::instantiate::structs::process_struct_decl`]
/// — this step only produces the substituted, unprocessed shape.
pub fn instantiate_struct(arena: &mut DeclArena, template: DeclId, args: Vec<Expr>) -> SemaResult<DeclId> {
    let (params, shape, name, span, container) = {
        let d = arena.get(template);
        let DeclKind::TemplateStruct(t) = &d.kind else {
            return Err(FatalError::internal(d.span.clone(), "instantiate_struct called on a non-template decl"));
        };
        (t.params.clone(), t.shape.clone(), d.name().to_string(), d.span.clone(), d.container)
    };

    let subst = build_substitution(arena, &params, &args)?;
    let cloned_members = clone_struct_members(arena, &subst, &shape);

    let mut inst = Decl::new(
        Identifier::new(name, span.clone()),
        span,
        DeclKind::Struct(StructDecl { members: cloned_members, ..StructDecl::default() }),
    );
    inst.original_decl = Some(template);
    inst.container = container;
    let inst_id = arena.alloc(inst);

    if let DeclKind::TemplateStruct(t) = &mut arena.get_mut(template).kind {
        t.instantiations.push(TemplateInstEntry { args, inst: inst_id });
    }
    Ok(inst_id)
}

pub(crate) fn clone_struct_members(arena: &mut DeclArena, subst: &Substitution, shape: &StructDecl) -> Vec<DeclId> {
    let mut out = Vec::with_capacity(shape.members.len());
    for &member in &shape.members {
        let (ident, span, ty, initializer, var_kind) = {
            let d = arena.get(member);
            match &d.kind {
                DeclKind::Variable { ty, initializer, var_kind } => (d.ident.clone(), d.span.clone(), ty.clone(), initializer.clone(), *var_kind),
                _ => (d.ident.clone(), d.span.clone(), Type::void(), None, crate::ast::VarKind::Member),
            }
        };
        let substituted_ty = crate::ast::subst_type(&ty, subst);
        let substituted_init = initializer.as_ref().map(|expr| {
            let mut remap = HashMap::new();
            clone_expr(arena, subst, &mut remap, expr)
        });
        out.push(arena.alloc(Decl::new(ident, span, DeclKind::Variable { ty: substituted_ty, initializer: substituted_init, var_kind })));
    }
    out
}

/// Instantiate a `TemplateTraitDecl`'s shape the same way structs are
/// instantiated, but into a `TraitDecl` (traits have no layout/v-table).
pub fn instantiate_trait(arena: &mut DeclArena, template: DeclId, args: Vec<Expr>) -> SemaResult<DeclId> {
    let (params, shape, name, span, container) = {
        let d = arena.get(template);
        let DeclKind::TemplateTrait(t) = &d.kind else {
            return Err(FatalError::internal(d.span.clone(), "instantiate_trait called on a non-template decl"));
        };
        (t.params.clone(), t.shape.clone(), d.name().to_string(), d.span.clone(), d.container)
    };
    let _subst = build_substitution(arena, &params, &args)?;

    let mut inst = Decl::new(
        Identifier::new(name, span.clone()),
        span,
        DeclKind::Trait(TraitDecl { members: shape.members.clone(), ..TraitDecl::default() }),
    );
    inst.original_decl = Some(template);
    inst.container = container;
    let inst_id = arena.alloc(inst);

    if let DeclKind::TemplateTrait(t) = &mut arena.get_mut(template).kind {
        t.instantiations.push(TemplateInstEntry { args, inst: inst_id });
    }
    Ok(inst_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceSpan;

    fn two_decl_ids() -> (DeclId, DeclId) {
        let mut arena = DeclArena::new();
        let a = arena.alloc(Decl::new(Identifier::synthetic("a"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        let b = arena.alloc(Decl::new(Identifier::synthetic("b"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        (a, b)
    }

    #[test]
    fn exact_match_beats_castable() {
        let (a, b) = two_decl_ids();
        let strongest = pick_strongest(vec![(a, smallvec::smallvec![Strength::Castable(1)]), (b, smallvec::smallvec![Strength::Exact])]);
        assert_eq!(strongest, Ok(b));
    }

    #[test]
    fn equal_strength_vectors_are_ambiguous() {
        let (a, b) = two_decl_ids();
        let strongest = pick_strongest(vec![(a, smallvec::smallvec![Strength::Exact]), (b, smallvec::smallvec![Strength::Exact])]);
        assert!(strongest.is_err());
    }

    #[test]
    fn missing_trailing_typename_arg_is_covered_by_its_default() {
        let mut arena = DeclArena::new();
        let default_ty = Type::builtin("i32").unwrap();
        let param = arena.alloc(Decl::new(
            Identifier::synthetic("T"),
            SourceSpan::synthetic(),
            DeclKind::TemplateParameter(TemplateParameterKind::Typename { bound: None, default: Some(default_ty) }),
        ));
        let strength = match_strength(&arena, &[param], &[]);
        assert_eq!(strength, Some(smallvec::smallvec![Strength::DefaultValues]));
    }

    #[test]
    fn missing_trailing_typename_arg_without_a_default_is_rejected() {
        let mut arena = DeclArena::new();
        let param = arena.alloc(Decl::new(
            Identifier::synthetic("T"),
            SourceSpan::synthetic(),
            DeclKind::TemplateParameter(TemplateParameterKind::Typename { bound: None, default: None }),
        ));
        assert_eq!(match_strength(&arena, &[param], &[]), None);
    }

    #[test]
    fn repeated_instantiation_with_equal_args_is_found() {
        let (_, inst) = two_decl_ids();
        let span = SourceSpan::synthetic();
        let entries = vec![TemplateInstEntry {
            args: vec![Expr::new(ExprKind::TypeValue(Type::builtin("i32").unwrap()), span.clone())],
            inst,
        }];
        let args = vec![Expr::new(ExprKind::TypeValue(Type::builtin("i32").unwrap()), span)];
        assert_eq!(find_existing_instantiation(&entries, &args), Some(inst));
    }
}
