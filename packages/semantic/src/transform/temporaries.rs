//! Temporary-value capture (§4.8 step 1).
//!
//! Every non-void call-shaped expression — a function call, a member call,
//! an operator dispatch, a property/subscript get — gets its result bound
//! to a fresh local the moment it's produced, so the call's own cleanup
//! (step 2) has something concrete to destroy once the enclosing statement
//! finishes. The call expression is replaced in place by a reference to
//! that local; the local itself is recorded on the owning `Stmt`'s
//! `temporary_values`, not pushed onto the function's local-variable stack.

use crate::ast::{Decl, DeclArena, DeclId, DeclKind, Expr, ExprKind, Identifier, VarKind};

/// Whether `expr` produces a value by invoking something — the shape that
/// needs a temporary once its result outlives the call itself.
pub fn is_capturable(expr: &Expr) -> bool {
    if expr.value_type.is_void() {
        return false;
    }
    matches!(
        expr.kind,
        ExprKind::FunctionCall { .. }
            | ExprKind::MemberFunctionCall { .. }
            | ExprKind::VTableFunctionCall { .. }
            | ExprKind::SubscriptCall { .. }
            | ExprKind::MemberSubscriptCall { .. }
            | ExprKind::PropertyGetCall { .. }
            | ExprKind::SubscriptOperatorGetCall { .. }
            | ExprKind::Prefix { decl: Some(_), .. }
            | ExprKind::Postfix { decl: Some(_), .. }
            | ExprKind::Infix { decl: Some(_), .. }
    )
}

/// Allocates a fresh local holding `expr`'s current value and returns a
/// `TemporaryValueRef` to it in `expr`'s place, plus the `DeclId` to record
/// on the statement's `temporary_values`.
pub fn capture(arena: &mut DeclArena, temp_counter: &mut u32, expr: Expr) -> (DeclId, Expr) {
    let span = expr.span.clone();
    let ty = expr.value_type.clone();
    let name = format!("$temp{}", *temp_counter);
    *temp_counter += 1;
    let decl = arena.alloc(Decl::new(
        Identifier::synthetic(name),
        span.clone(),
        DeclKind::Variable { ty: ty.clone(), initializer: Some(expr), var_kind: VarKind::Local },
    ));
    (decl, Expr::new(ExprKind::TemporaryValueRef(decl), span).with_type(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableDecl, LiteralValue, Type};
    use crate::position::SourceSpan;

    // A throwaway DeclId for shape-only tests; the arena never looks it up.
    fn dummy_function_decl() -> DeclId {
        let mut arena = DeclArena::new();
        arena.alloc(Decl::new(Identifier::synthetic("f"), SourceSpan::synthetic(), DeclKind::Function(CallableDecl::new(vec![], Type::void()))))
    }

    fn void_call() -> Expr {
        Expr::new(ExprKind::FunctionCall { callee: dummy_function_decl(), args: Vec::new() }, SourceSpan::synthetic())
    }

    #[test]
    fn void_calls_are_never_captured() {
        assert!(!is_capturable(&void_call()));
    }

    #[test]
    fn non_void_call_is_capturable() {
        let mut expr = void_call();
        expr.value_type = Type::builtin("i32").unwrap();
        assert!(is_capturable(&expr));
    }

    #[test]
    fn literal_is_never_capturable() {
        let expr = Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(1)), SourceSpan::synthetic()).with_type(Type::builtin("i32").unwrap());
        assert!(!is_capturable(&expr));
    }

    #[test]
    fn capture_produces_a_temporary_value_ref() {
        let mut arena = DeclArena::new();
        let mut counter = 0;
        let mut expr = void_call();
        expr.value_type = Type::builtin("i32").unwrap();
        let (id, replaced) = capture(&mut arena, &mut counter, expr);
        assert!(matches!(replaced.kind, ExprKind::TemporaryValueRef(got) if got == id));
        assert!(matches!(arena.get(id).kind, DeclKind::Variable { initializer: Some(_), .. }));
    }
}
