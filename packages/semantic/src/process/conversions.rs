//! Implicit conversions and reference/value bridging (§4.7 "Implicit
//! conversions and reference/value bridging", "Overload resolution"'s
//! `Castable` tier).

use crate::ast::{Expr, ExprKind, Type, TypeKind};
use crate::contracts::base_distance;
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::ast::DeclArena;

/// Argument type equals the parameter type under reference/qualifier
/// stripping (§4.7) — the same rule §4.6.3 applies to override/shadow and
/// `has`-contract matching, via [`Type::matches_modulo_quals_and_reference`].
pub fn same_underlying(a: &Type, b: &Type) -> bool {
    a.matches_modulo_quals_and_reference(b)
}

/// How far `from` is from `to` through an implicit conversion, or `None` if
/// no implicit path exists. Distance is used to break ties between multiple
/// `Castable` candidates (shorter wins) the same way §4.6.1 uses
/// `base_distance` for template binding.
pub fn conversion_distance(arena: &DeclArena, from: &Type, to: &Type) -> Option<u32> {
    match (&from.strip_reference().kind, &to.strip_reference().kind) {
        (TypeKind::BuiltIn { .. }, TypeKind::BuiltIn { .. }) => builtin_widening_distance(from, to),
        (TypeKind::Pointer(from_elem), TypeKind::Pointer(to_elem)) => conversion_distance(arena, from_elem, to_elem),
        (TypeKind::Struct(from_id), TypeKind::Struct(to_id)) => base_distance(arena, from, *to_id).filter(|_| from_id != to_id),
        _ => None,
    }
}

fn builtin_widening_distance(from: &Type, to: &Type) -> Option<u32> {
    let TypeKind::BuiltIn { signed: from_signed, floating: from_floating, size_bits: from_bits, .. } = &from.strip_reference().kind else {
        return None;
    };
    let TypeKind::BuiltIn { signed: to_signed, floating: to_floating, size_bits: to_bits, .. } = &to.strip_reference().kind else {
        return None;
    };
    if from_bits == to_bits && from_signed != to_signed {
        return None;
    }
    if *to_floating && !*from_floating {
        return Some(1 + to_bits.saturating_sub(*from_bits));
    }
    if *from_floating && !*to_floating {
        return None;
    }
    if to_bits > from_bits {
        Some(to_bits - from_bits)
    } else {
        None
    }
}

/// Bridge a resolved argument expression into the shape `param_ty` expects
/// (§4.7): deref-then-rvalue for a by-value parameter, implicit-reference
/// (or `RValueToInRef` for an `in` parameter) for a by-reference one, wrapped
/// in an `ImplicitCast` if the underlying types still differ after bridging.
pub fn bridge_argument(arg: Expr, param_ty: &Type, is_in: bool) -> SemaResult<Expr> {
    let span = arg.span.clone();
    let wants_reference = matches!(param_ty.kind, TypeKind::Reference(_) | TypeKind::RValueReference(_));

    let bridged = if wants_reference {
        if arg.is_lvalue() {
            Expr::new(ExprKind::Ref { expr: Box::new(arg) }, span.clone()).with_type(param_ty.clone())
        } else if is_in {
            Expr::new(ExprKind::RValueToInRef { expr: Box::new(arg) }, span.clone()).with_type(param_ty.clone())
        } else {
            return Err(FatalError::new(
                ErrorCode::ReferenceLifetimeMisuse,
                span,
                "cannot bind a temporary value to a non-`in` reference parameter",
            ));
        }
    } else {
        let mut value = arg;
        if matches!(value.value_type.kind, TypeKind::Reference(_) | TypeKind::RValueReference(_)) {
            let mut ty = value.value_type.strip_reference().clone();
            ty.is_lvalue = true;
            value = Expr::new(ExprKind::ImplicitDeref { expr: Box::new(value) }, span.clone()).with_type(ty);
        }
        if value.is_lvalue() {
            let ty = value.value_type.clone();
            value = Expr::new(ExprKind::LValueToRValue { expr: Box::new(value) }, span.clone()).with_type(ty);
        }
        value
    };

    if !same_underlying(&bridged.value_type, param_ty) {
        Ok(Expr::new(ExprKind::ImplicitCast { expr: Box::new(bridged), target: param_ty.clone() }, span).with_type(param_ty.clone()))
    } else {
        Ok(bridged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceSpan;

    #[test]
    fn i32_to_i64_is_a_valid_widening() {
        let arena = DeclArena::new();
        assert_eq!(conversion_distance(&arena, &Type::builtin("i32").unwrap(), &Type::builtin("i64").unwrap()), Some(32));
    }

    #[test]
    fn same_width_signed_to_unsigned_is_rejected() {
        let arena = DeclArena::new();
        assert_eq!(conversion_distance(&arena, &Type::builtin("i32").unwrap(), &Type::builtin("u32").unwrap()), None);
    }

    #[test]
    fn narrowing_is_rejected() {
        let arena = DeclArena::new();
        assert_eq!(conversion_distance(&arena, &Type::builtin("i64").unwrap(), &Type::builtin("i32").unwrap()), None);
    }

    #[test]
    fn rvalue_argument_for_by_value_param_gets_lvalue_to_rvalue_stripped() {
        let span = SourceSpan::synthetic();
        let arg = Expr::new(ExprKind::ValueLiteral(crate::ast::LiteralValue::Int(3)), span).with_type(Type::builtin("i32").unwrap());
        let bridged = bridge_argument(arg, &Type::builtin("i32").unwrap(), false).unwrap();
        assert!(matches!(bridged.kind, ExprKind::ValueLiteral(_)));
    }

    #[test]
    fn rvalue_into_non_in_reference_param_is_rejected() {
        let span = SourceSpan::synthetic();
        let arg = Expr::new(ExprKind::ValueLiteral(crate::ast::LiteralValue::Int(3)), span).with_type(Type::builtin("i32").unwrap());
        let result = bridge_argument(arg, &Type::builtin("i32").unwrap().reference_to(), false);
        assert!(result.is_err());
    }
}
