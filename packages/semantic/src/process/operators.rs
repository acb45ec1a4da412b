//! Operator dispatch and assignment desugaring (§4.7 "Operator dispatch").
//!
//! Infix/prefix/postfix operators dispatch via extension-method lookup on
//! the LHS type first; a built-in rule covers `BuiltIn`×`BuiltIn` and
//! pointer arithmetic when no user operator overload applies. `x OP= y`
//! desugars to `x = (x OP y)`, duplicating the LHS sub-tree — safe because
//! every side-effecting sub-expression it could contain (a call, a
//! subscript) is captured into a named temporary by C8 step 1 before this
//! tree reaches codegen, so the duplicate never re-runs a side effect.

use crate::ast::{DeclArena, DeclKind, Expr, ExprKind, Fixity, Type, TypeKind};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;
use crate::validate::owned_children;

const COMPARISON_OPS: &[&str] = &["==", "!=", "<", ">", "<=", ">="];
const LOGICAL_OPS: &[&str] = &["&&", "||"];

fn is_builtin(ty: &Type) -> bool {
    matches!(ty.strip_reference().kind, TypeKind::BuiltIn { .. })
}

fn builtin_result_type(lhs: &Type, rhs: &Type, op: &str) -> Type {
    if COMPARISON_OPS.contains(&op) || LOGICAL_OPS.contains(&op) {
        return Type::builtin("bool").unwrap();
    }
    let TypeKind::BuiltIn { size_bits: lhs_bits, .. } = &lhs.strip_reference().kind else { return lhs.clone() };
    let TypeKind::BuiltIn { size_bits: rhs_bits, .. } = &rhs.strip_reference().kind else { return lhs.clone() };
    if rhs_bits > lhs_bits {
        rhs.strip_reference().clone()
    } else {
        lhs.strip_reference().clone()
    }
}

fn find_operator(arena: &DeclArena, lhs_ty: &Type, op: &str, fixity: Fixity) -> Option<crate::ast::DeclId> {
    let struct_id = lhs_ty.strip_reference().as_struct()?;
    owned_children(arena.get(struct_id)).into_iter().find(|&m| {
        matches!(&arena.get(m).kind, DeclKind::Operator { symbol, fixity: f, .. } if symbol == op && *f == fixity)
    })
}

fn op_return_type(arena: &DeclArena, decl: crate::ast::DeclId) -> Type {
    arena.get(decl).callable().map(|c| c.return_type.clone()).unwrap_or_else(Type::void)
}

pub fn resolve_infix(arena: &DeclArena, lhs: Expr, op: &str, rhs: Expr, span: SourceSpan) -> SemaResult<Expr> {
    if is_builtin(&lhs.value_type) && is_builtin(&rhs.value_type) {
        let ty = builtin_result_type(&lhs.value_type, &rhs.value_type, op);
        return Ok(Expr::new(ExprKind::Infix { op: op.to_string(), lhs: Box::new(lhs), rhs: Box::new(rhs), decl: None }, span).with_type(ty));
    }
    if matches!(lhs.value_type.strip_reference().kind, TypeKind::Pointer(_)) && is_builtin(&rhs.value_type) {
        let ty = lhs.value_type.strip_reference().clone();
        return Ok(Expr::new(ExprKind::Infix { op: op.to_string(), lhs: Box::new(lhs), rhs: Box::new(rhs), decl: None }, span).with_type(ty));
    }
    if let Some(op_decl) = find_operator(arena, &lhs.value_type, op, Fixity::Infix) {
        let ty = op_return_type(arena, op_decl);
        return Ok(Expr::new(ExprKind::MemberInfix { op: op.to_string(), object: Box::new(lhs), rhs: Box::new(rhs), decl: op_decl }, span).with_type(ty));
    }
    Err(FatalError::new(ErrorCode::CannotConvert, span, format!("no overload of `{}` accepts these operand types", op)))
}

pub fn resolve_prefix(arena: &DeclArena, op: &str, operand: Expr, span: SourceSpan) -> SemaResult<Expr> {
    if is_builtin(&operand.value_type) {
        let ty = operand.value_type.strip_reference().clone();
        return Ok(Expr::new(ExprKind::Prefix { op: op.to_string(), operand: Box::new(operand), decl: None }, span).with_type(ty));
    }
    if let Some(op_decl) = find_operator(arena, &operand.value_type, op, Fixity::Prefix) {
        let ty = op_return_type(arena, op_decl);
        return Ok(Expr::new(ExprKind::MemberPrefix { op: op.to_string(), object: Box::new(operand), decl: op_decl }, span).with_type(ty));
    }
    Err(FatalError::new(ErrorCode::CannotConvert, span, format!("no overload of prefix `{}` accepts this operand type", op)))
}

pub fn resolve_postfix(arena: &DeclArena, op: &str, operand: Expr, span: SourceSpan) -> SemaResult<Expr> {
    if is_builtin(&operand.value_type) {
        let ty = operand.value_type.strip_reference().clone();
        return Ok(Expr::new(ExprKind::Postfix { op: op.to_string(), operand: Box::new(operand), decl: None }, span).with_type(ty));
    }
    if let Some(op_decl) = find_operator(arena, &operand.value_type, op, Fixity::Postfix) {
        let ty = op_return_type(arena, op_decl);
        return Ok(Expr::new(ExprKind::MemberPostfix { op: op.to_string(), object: Box::new(operand), decl: op_decl }, span).with_type(ty));
    }
    Err(FatalError::new(ErrorCode::CannotConvert, span, format!("no overload of postfix `{}` accepts this operand type", op)))
}

/// `x OP= y` -> `x = (x OP y)` (§4.7). `compound_op` is the full spelling
/// (`"+="`); returns an error if it doesn't end in `=`.
pub fn desugar_compound_assignment(arena: &DeclArena, lhs: Expr, compound_op: &str, rhs: Expr, span: SourceSpan) -> SemaResult<Expr> {
    let base_op = compound_op.strip_suffix('=').filter(|s| !s.is_empty()).ok_or_else(|| {
        FatalError::internal(span.clone(), format!("`{}` is not a compound-assignment operator", compound_op))
    })?;
    let infix = resolve_infix(arena, lhs.clone(), base_op, rhs, span.clone())?;
    Ok(Expr::new(ExprKind::Assignment { lhs: Box::new(lhs), rhs: Box::new(infix) }, span).with_type(Type::void()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LiteralValue;

    fn lit(v: i128, ty: Type) -> Expr {
        Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(v)), SourceSpan::synthetic()).with_type(ty)
    }

    #[test]
    fn builtin_comparison_yields_bool() {
        let arena = DeclArena::new();
        let expr = resolve_infix(&arena, lit(1, Type::builtin("i32").unwrap()), "<", lit(2, Type::builtin("i32").unwrap()), SourceSpan::synthetic()).unwrap();
        assert_eq!(expr.value_type, Type::builtin("bool").unwrap());
    }

    #[test]
    fn builtin_arithmetic_widens_to_the_larger_operand() {
        let arena = DeclArena::new();
        let expr = resolve_infix(&arena, lit(1, Type::builtin("i32").unwrap()), "+", lit(2, Type::builtin("i64").unwrap()), SourceSpan::synthetic()).unwrap();
        assert_eq!(expr.value_type, Type::builtin("i64").unwrap());
    }

    #[test]
    fn compound_assignment_desugars_to_assign_of_infix() {
        let arena = DeclArena::new();
        let lhs = lit(1, Type::builtin("i32").unwrap());
        let rhs = lit(2, Type::builtin("i32").unwrap());
        let expr = desugar_compound_assignment(&arena, lhs, "+=", rhs, SourceSpan::synthetic()).unwrap();
        match expr.kind {
            ExprKind::Assignment { rhs, .. } => assert!(matches!(rhs.kind, ExprKind::Infix { .. })),
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn no_operator_overload_is_a_diagnostic() {
        let mut arena = DeclArena::new();
        let struct_id = arena.alloc(crate::ast::Decl::new(
            crate::ast::Identifier::synthetic("Widget"),
            SourceSpan::synthetic(),
            DeclKind::Struct(crate::ast::StructDecl::default()),
        ));
        let widget_ty = Type::new(TypeKind::Struct(struct_id));
        let lhs = Expr::new(ExprKind::CurrentSelf, SourceSpan::synthetic()).with_type(widget_ty);
        let rhs = lit(1, Type::builtin("i32").unwrap());
        assert!(resolve_infix(&arena, lhs, "+", rhs, SourceSpan::synthetic()).is_err());
    }
}
