//! Contract utilities (C9, §4.9).
//!
//! Three services shared by C6's template matching and `where`/`has`
//! evaluation: structural equality on a template argument `Expr`, `where`
//! satisfaction against a concrete bound type, and `has` satisfaction by
//! signature comparison over a type's member set. Pure queries over the
//! arena — no diagnostics are raised here; the caller (C6) turns a `false`
//! into the matching `ErrorCode::WhereContractUnsatisfied` /
//! `HasContractUnsatisfied` diagnostic, since only the caller knows which
//! candidate and position the failure belongs to.

use crate::ast::{DeclArena, DeclId, DeclKind, Expr, ExprKind, MemberPrototype, Type};
use std::collections::HashSet;

/// Structural equality for a value used as a template argument: `TypeValue`
/// compares by `Type` equality (qualifiers included), literals by value.
/// Anything else compares `false` — only these two forms are legal template
/// arguments once C6/C7 have finished resolving them.
pub fn exprs_structurally_equal(a: &Expr, b: &Expr) -> bool {
    match (&a.kind, &b.kind) {
        (ExprKind::TypeValue(x), ExprKind::TypeValue(y)) => x == y,
        (ExprKind::ValueLiteral(x), ExprKind::ValueLiteral(y)) => x == y,
        _ => false,
    }
}

pub fn template_args_equal(a: &[Expr], b: &[Expr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| exprs_structurally_equal(x, y))
}

/// `where T : Trait` (§4.5): `ty` satisfies the contract if it names a
/// struct or trait whose (transitive) inherited-trait set contains
/// `trait_decl`, or if `ty` itself is `trait_decl`.
pub fn where_trait_satisfied(arena: &DeclArena, ty: &Type, trait_decl: DeclId) -> bool {
    let Some(decl) = type_decl(ty) else { return false };
    if decl == trait_decl {
        return true;
    }
    inherited_trait_closure(arena, decl).contains(&trait_decl)
}

/// `where T : BaseClass` (§4.5): `ty` satisfies the contract if it *is*
/// `base_decl` or descends from it through the `base_struct` chain.
pub fn where_base_satisfied(arena: &DeclArena, ty: &Type, base_decl: DeclId) -> bool {
    let Some(mut cursor) = type_decl(ty) else { return false };
    loop {
        if cursor == base_decl {
            return true;
        }
        match &arena.get(cursor).kind {
            DeclKind::Struct(s) => match s.base_struct {
                Some(next) => cursor = next,
                None => return false,
            },
            _ => return false,
        }
    }
}

/// Base-struct distance used by §4.6's match-strength ranking: `Some(0)` for
/// an exact match, `Some(n)` for an ancestor `n` steps up, `None` if `ty`
/// does not descend from `base_decl` at all.
pub fn base_distance(arena: &DeclArena, ty: &Type, base_decl: DeclId) -> Option<u32> {
    let mut cursor = type_decl(ty)?;
    let mut distance = 0;
    loop {
        if cursor == base_decl {
            return Some(distance);
        }
        match &arena.get(cursor).kind {
            DeclKind::Struct(s) => match s.base_struct {
                Some(next) => {
                    cursor = next;
                    distance += 1;
                }
                None => return None,
            },
            _ => return None,
        }
    }
}

fn type_decl(ty: &Type) -> Option<DeclId> {
    use crate::ast::TypeKind;
    match &ty.kind {
        TypeKind::Struct(id) | TypeKind::Trait(id) | TypeKind::Enum(id) => Some(*id),
        _ => None,
    }
}

fn inherited_trait_closure(arena: &DeclArena, decl: DeclId) -> HashSet<DeclId> {
    let mut seen = HashSet::new();
    let mut stack = direct_inherited_traits(arena, decl);
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            stack.extend(direct_inherited_traits(arena, next));
        }
    }
    seen
}

fn direct_inherited_traits(arena: &DeclArena, decl: DeclId) -> Vec<DeclId> {
    match &arena.get(decl).kind {
        DeclKind::Struct(s) => s.inherited_traits.clone(),
        DeclKind::Trait(t) => t.inherited_traits.clone(),
        _ => Vec::new(),
    }
}

/// `where T has <prototype>` (§4.5): does `ty`'s member set contain a
/// declaration matching `prototype`'s signature?
pub fn has_prototype_satisfied(arena: &DeclArena, ty: &Type, prototype: &MemberPrototype) -> bool {
    let Some(decl) = type_decl(ty) else { return false };
    match prototype {
        MemberPrototype::Trait(trait_ty) => match type_decl(trait_ty) {
            Some(trait_decl) => where_trait_satisfied(arena, ty, trait_decl),
            None => false,
        },
        MemberPrototype::Destructor => struct_of(arena, decl).map(|s| s.destructor.is_some()).unwrap_or(false),
        MemberPrototype::Constructor { params } => struct_of(arena, decl)
            .map(|s| s.constructors.iter().any(|&c| callable_params_match(arena, c, params)))
            .unwrap_or(false),
        MemberPrototype::Variable { name, ty: want } => members_of(arena, decl).iter().any(|&m| {
            let d = arena.get(m);
            matches!(&d.kind, DeclKind::Variable { ty, .. } if d.name() == name && ty == want)
        }),
        MemberPrototype::Property { name, ty: want } => members_of(arena, decl).iter().any(|&m| {
            let d = arena.get(m);
            matches!(&d.kind, DeclKind::Property(p) if d.name() == name && &p.getter.return_type == want)
        }),
        MemberPrototype::Subscript { .. } => {
            members_of(arena, decl).iter().any(|&m| matches!(arena.get(m).kind, DeclKind::SubscriptOperator(_)))
        }
        MemberPrototype::Function { name, params, return_type } => members_of(arena, decl).iter().any(|&m| {
            let d = arena.get(m);
            matches!(&d.kind, DeclKind::Function(c) if d.name() == name && &c.return_type == return_type && params_match(arena, &c.params, params))
        }),
        MemberPrototype::Operator { symbol, fixity, params } => members_of(arena, decl).iter().any(|&m| {
            matches!(&arena.get(m).kind, DeclKind::Operator { callable, fixity: f, symbol: s }
                if s == symbol && f == fixity && params_match(arena, &callable.params, params))
        }),
        MemberPrototype::CallOperator { params } => members_of(arena, decl)
            .iter()
            .any(|&m| matches!(&arena.get(m).kind, DeclKind::CallOperator(c) if params_match(arena, &c.params, params))),
    }
}

fn struct_of(arena: &DeclArena, decl: DeclId) -> Option<&crate::ast::StructDecl> {
    arena.get(decl).as_struct()
}

fn members_of(arena: &DeclArena, decl: DeclId) -> Vec<DeclId> {
    match &arena.get(decl).kind {
        DeclKind::Struct(s) => {
            if s.all_members.is_empty() {
                s.members.clone()
            } else {
                s.all_members.clone()
            }
        }
        DeclKind::Trait(t) => {
            if t.all_members.is_empty() {
                t.members.clone()
            } else {
                t.all_members.clone()
            }
        }
        _ => Vec::new(),
    }
}

fn callable_params_match(arena: &DeclArena, callable: DeclId, want: &[Type]) -> bool {
    match &arena.get(callable).kind {
        DeclKind::Constructor { callable: c, .. } => params_match(arena, &c.params, want),
        _ => false,
    }
}

/// Same §4.6.3 rule [`crate::instantiate::structs::params_match`] applies to
/// override/shadow matching: a `has` contract naming `fn foo(x: &T)` is
/// satisfied by a member declared `fn foo(x: T)`'s qualifier-equivalent form,
/// and vice versa, via [`Type::matches_modulo_quals_and_reference`].
fn params_match(arena: &DeclArena, params: &[DeclId], want: &[Type]) -> bool {
    if params.len() != want.len() {
        return false;
    }
    params.iter().zip(want).all(|(&p, want_ty)| match &arena.get(p).kind {
        DeclKind::Parameter { ty, .. } => ty.matches_modulo_quals_and_reference(want_ty),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Identifier, StructDecl, TraitDecl, TypeKind};
    use crate::position::SourceSpan;

    fn decl(arena: &mut DeclArena, name: &str, kind: DeclKind) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), kind))
    }

    #[test]
    fn direct_trait_is_satisfied() {
        let mut arena = DeclArena::new();
        let comparable = decl(&mut arena, "Comparable", DeclKind::Trait(TraitDecl::default()));
        let widget = decl(
            &mut arena,
            "Widget",
            DeclKind::Struct(StructDecl { inherited_traits: vec![comparable], ..StructDecl::default() }),
        );
        let ty = Type::new(TypeKind::Struct(widget));
        assert!(where_trait_satisfied(&arena, &ty, comparable));
    }

    #[test]
    fn transitive_trait_is_satisfied() {
        let mut arena = DeclArena::new();
        let ordered = decl(&mut arena, "Ordered", DeclKind::Trait(TraitDecl::default()));
        let comparable = decl(
            &mut arena,
            "Comparable",
            DeclKind::Trait(TraitDecl { inherited_traits: vec![ordered], ..TraitDecl::default() }),
        );
        let widget = decl(
            &mut arena,
            "Widget",
            DeclKind::Struct(StructDecl { inherited_traits: vec![comparable], ..StructDecl::default() }),
        );
        let ty = Type::new(TypeKind::Struct(widget));
        assert!(where_trait_satisfied(&arena, &ty, ordered));
    }

    #[test]
    fn base_distance_counts_ancestor_hops() {
        let mut arena = DeclArena::new();
        let shape = decl(&mut arena, "Shape", DeclKind::Struct(StructDecl::default()));
        let circle = decl(&mut arena, "Circle", DeclKind::Struct(StructDecl { base_struct: Some(shape), ..StructDecl::default() }));
        let ty = Type::new(TypeKind::Struct(circle));
        assert_eq!(base_distance(&arena, &ty, shape), Some(1));
        assert_eq!(base_distance(&arena, &ty, circle), Some(0));
    }

    #[test]
    fn unrelated_struct_does_not_satisfy_base_contract() {
        let mut arena = DeclArena::new();
        let shape = decl(&mut arena, "Shape", DeclKind::Struct(StructDecl::default()));
        let other = decl(&mut arena, "Other", DeclKind::Struct(StructDecl::default()));
        let ty = Type::new(TypeKind::Struct(other));
        assert!(!where_base_satisfied(&arena, &ty, shape));
    }

    #[test]
    fn literal_args_compare_by_value() {
        use crate::ast::LiteralValue;
        let span = SourceSpan::synthetic();
        let a = Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(3)), span.clone());
        let b = Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(3)), span.clone());
        let c = Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(4)), span);
        assert!(exprs_structurally_equal(&a, &b));
        assert!(!exprs_structurally_equal(&a, &c));
    }

    #[test]
    fn has_function_contract_is_satisfied_by_a_reference_qualifier_variant() {
        let mut arena = DeclArena::new();
        let span = SourceSpan::synthetic();
        let param_ty = Type::qualified(Type::builtin("i32").unwrap(), crate::ast::Qualifier::Mut, &span).unwrap().reference_to();
        let param = arena.alloc(Decl::new(
            Identifier::synthetic("x"),
            span.clone(),
            DeclKind::Parameter { ty: param_ty, default_value: None, label: None, is_in: false },
        ));
        let func = decl(
            &mut arena,
            "scale",
            DeclKind::Function(crate::ast::CallableDecl::new(vec![param], Type::void())),
        );
        let widget = decl(&mut arena, "Widget", DeclKind::Struct(StructDecl { members: vec![func], ..StructDecl::default() }));
        let ty = Type::new(TypeKind::Struct(widget));

        let prototype = MemberPrototype::Function { name: "scale".to_string(), params: vec![Type::builtin("i32").unwrap()], return_type: Type::void() };
        assert!(has_prototype_satisfied(&arena, &ty, &prototype));
    }

    #[test]
    fn type_args_compare_structurally_including_qualifier() {
        let span = SourceSpan::synthetic();
        let unqualified = Expr::new(ExprKind::TypeValue(Type::builtin("i32").unwrap()), span.clone());
        let qualified =
            Expr::new(ExprKind::TypeValue(Type::qualified(Type::builtin("i32").unwrap(), crate::ast::Qualifier::Const, &span).unwrap()), span);
        assert!(!exprs_structurally_equal(&unqualified, &qualified));
    }
}
