//! Properties and subscripts (§4.7 "Properties and subscripts").
//!
//! A bare reference to a property/subscript becomes a getter call; the LHS
//! of an assignment becomes a setter call instead, with the RHS threaded in
//! as the setter's value argument. A `&mut`-taking context asks for the
//! `RefMut` accessor when one exists, falling back to the plain getter.

use crate::ast::{Arg, DeclArena, DeclId, DeclKind, Expr, ExprKind};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;

/// Turn a resolved `PropertyRef`/`MemberPropertyRef` into a getter call.
pub fn property_read(arena: &DeclArena, object: Option<Box<Expr>>, property: DeclId, want_ref_mut: bool, span: SourceSpan) -> SemaResult<Expr> {
    let DeclKind::Property(p) = &arena.get(property).kind else {
        return Err(FatalError::internal(span, "property_read called on a non-property decl"));
    };
    let getter = if want_ref_mut { p.ref_mut_getter.as_ref().unwrap_or(&p.getter) } else { &p.getter };
    let ty = getter.return_type.clone();
    Ok(Expr::new(ExprKind::PropertyGetCall { object, decl: property }, span).with_type(ty))
}

/// Turn the LHS of `self.prop = value` (or `prop = value`) into a setter
/// call. Errors if the property has no setter (a read-only property).
pub fn property_write(arena: &DeclArena, object: Option<Box<Expr>>, property: DeclId, value: Expr, span: SourceSpan) -> SemaResult<Expr> {
    let DeclKind::Property(p) = &arena.get(property).kind else {
        return Err(FatalError::internal(span, "property_write called on a non-property decl"));
    };
    if p.setter.is_none() {
        return Err(FatalError::new(ErrorCode::CannotConvert, span, "property has no setter"));
    }
    Ok(Expr::new(ExprKind::PropertySetCall { object, decl: property, value: Box::new(value) }, span).with_type(crate::ast::Type::void()))
}

/// Symmetric to [`property_read`] for `a[args]`.
pub fn subscript_read(arena: &DeclArena, object: Expr, subscript: DeclId, args: Vec<Arg>, want_ref_mut: bool, span: SourceSpan) -> SemaResult<Expr> {
    let DeclKind::SubscriptOperator(s) = &arena.get(subscript).kind else {
        return Err(FatalError::internal(span, "subscript_read called on a non-subscript decl"));
    };
    let callable = if want_ref_mut { s.get_ref_mut.as_ref().or(s.get_ref.as_ref()).or(s.get_value.as_ref()) } else { s.get_value.as_ref().or(s.get_ref.as_ref()) };
    let Some(callable) = callable else {
        return Err(FatalError::new(ErrorCode::CannotConvert, span, "subscript has no applicable getter"));
    };
    let ty = callable.return_type.clone();
    Ok(Expr::new(
        ExprKind::SubscriptOperatorGetCall { object: Box::new(object), decl: subscript, args, want_ref_mut },
        span,
    )
    .with_type(ty))
}

pub fn subscript_write(arena: &DeclArena, object: Expr, subscript: DeclId, args: Vec<Arg>, value: Expr, span: SourceSpan) -> SemaResult<Expr> {
    let DeclKind::SubscriptOperator(s) = &arena.get(subscript).kind else {
        return Err(FatalError::internal(span, "subscript_write called on a non-subscript decl"));
    };
    if s.set.is_none() {
        return Err(FatalError::new(ErrorCode::CannotConvert, span, "subscript has no setter"));
    }
    Ok(Expr::new(
        ExprKind::SubscriptOperatorSetCall { object: Box::new(object), decl: subscript, args, value: Box::new(value) },
        span,
    )
    .with_type(crate::ast::Type::void()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableDecl, Decl, Identifier, PropertyDecl, SubscriptOperatorDecl, Type};

    fn decl(arena: &mut DeclArena, kind: DeclKind) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic("p"), SourceSpan::synthetic(), kind))
    }

    #[test]
    fn bare_property_read_becomes_get_call() {
        let mut arena = DeclArena::new();
        let prop = decl(
            &mut arena,
            DeclKind::Property(PropertyDecl { getter: CallableDecl::new(vec![], Type::builtin("i32").unwrap()), ref_mut_getter: None, setter: None }),
        );
        let expr = property_read(&arena, None, prop, false, SourceSpan::synthetic()).unwrap();
        assert!(matches!(expr.kind, ExprKind::PropertyGetCall { .. }));
        assert_eq!(expr.value_type, Type::builtin("i32").unwrap());
    }

    #[test]
    fn writing_a_read_only_property_is_rejected() {
        let mut arena = DeclArena::new();
        let prop = decl(
            &mut arena,
            DeclKind::Property(PropertyDecl { getter: CallableDecl::new(vec![], Type::builtin("i32").unwrap()), ref_mut_getter: None, setter: None }),
        );
        let value = Expr::new(ExprKind::ValueLiteral(crate::ast::LiteralValue::Int(1)), SourceSpan::synthetic());
        assert!(property_write(&arena, None, prop, value, SourceSpan::synthetic()).is_err());
    }

    #[test]
    fn subscript_prefers_ref_mut_getter_when_requested() {
        let mut arena = DeclArena::new();
        let sub = decl(
            &mut arena,
            DeclKind::SubscriptOperator(SubscriptOperatorDecl {
                get_value: Some(CallableDecl::new(vec![], Type::builtin("i32").unwrap())),
                get_ref_mut: Some(CallableDecl::new(vec![], Type::builtin("i32").unwrap().reference_to())),
                ..SubscriptOperatorDecl::default()
            }),
        );
        let object = Expr::new(ExprKind::CurrentSelf, SourceSpan::synthetic());
        let expr = subscript_read(&arena, object, sub, vec![], true, SourceSpan::synthetic()).unwrap();
        assert!(matches!(expr.value_type.kind, crate::ast::TypeKind::Reference(_)));
    }
}
