//! Const expression solver (§4.7 "Const expression solver").
//!
//! Folds the small sub-language legal in a `const` template argument
//! position or an enum constant initializer: literals, parenthesization,
//! unary `-`/`!`, and the arithmetic/comparison infix operators. Anything
//! else reachable from that position (a call, a member access, a name that
//! isn't itself another const) is `ErrorCode::NonConstInConstContext`.

use crate::ast::{DeclArena, DeclKind, Expr, ExprKind, LiteralValue};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i128),
    Float(f64),
    Bool(bool),
}

impl ConstValue {
    pub fn into_literal(self) -> SemaResult<LiteralValue> {
        match self {
            ConstValue::Int(v) => Ok(LiteralValue::Int(v)),
            ConstValue::Float(v) => Ok(LiteralValue::Float(v)),
            ConstValue::Bool(_) => Err(FatalError::internal(crate::position::SourceSpan::synthetic(), "boolean const value has no literal form")),
        }
    }
}

pub fn eval_const(arena: &DeclArena, expr: &Expr) -> SemaResult<ConstValue> {
    match &expr.kind {
        ExprKind::ValueLiteral(LiteralValue::Int(v)) => Ok(ConstValue::Int(*v)),
        ExprKind::ValueLiteral(LiteralValue::Float(v)) => Ok(ConstValue::Float(*v)),
        ExprKind::BoolLiteral(v) => Ok(ConstValue::Bool(*v)),
        ExprKind::Paren(inner) => eval_const(arena, inner),
        ExprKind::Prefix { op, operand, .. } => eval_unary(op, eval_const(arena, operand)?, &expr.span),
        ExprKind::Infix { op, lhs, rhs, .. } => eval_binary(op, eval_const(arena, lhs)?, eval_const(arena, rhs)?, &expr.span),
        ExprKind::EnumConstRef(decl) => {
            let DeclKind::EnumConst { value: Some(init) } = &arena.get(*decl).kind else {
                return Err(FatalError::new(ErrorCode::NonConstInConstContext, expr.span.clone(), "enum constant has no initializer to fold"));
            };
            eval_const(arena, init)
        }
        ExprKind::TemplateConstRef(_) => {
            Err(FatalError::new(ErrorCode::NonConstInConstContext, expr.span.clone(), "a template const parameter is not foldable until instantiated"))
        }
        _ => Err(FatalError::new(ErrorCode::NonConstInConstContext, expr.span.clone(), "not a constant expression")),
    }
}

fn eval_unary(op: &str, v: ConstValue, span: &crate::position::SourceSpan) -> SemaResult<ConstValue> {
    match (op, v) {
        ("-", ConstValue::Int(n)) => Ok(ConstValue::Int(-n)),
        ("-", ConstValue::Float(n)) => Ok(ConstValue::Float(-n)),
        ("!", ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
        _ => Err(FatalError::new(ErrorCode::UnsupportedConstOperation, span.clone(), format!("`{}` is not defined for this constant's type", op))),
    }
}

fn eval_binary(op: &str, lhs: ConstValue, rhs: ConstValue, span: &crate::position::SourceSpan) -> SemaResult<ConstValue> {
    use ConstValue::*;
    match (op, lhs, rhs) {
        ("+", Int(a), Int(b)) => Ok(Int(a + b)),
        ("-", Int(a), Int(b)) => Ok(Int(a - b)),
        ("*", Int(a), Int(b)) => Ok(Int(a * b)),
        ("/", Int(a), Int(b)) if b != 0 => Ok(Int(a / b)),
        ("%", Int(a), Int(b)) if b != 0 => Ok(Int(a % b)),
        ("/", Int(_), Int(0)) | ("%", Int(_), Int(0)) => {
            Err(FatalError::new(ErrorCode::UnsupportedConstOperation, span.clone(), "division by zero in a constant expression"))
        }
        ("+", Float(a), Float(b)) => Ok(Float(a + b)),
        ("-", Float(a), Float(b)) => Ok(Float(a - b)),
        ("*", Float(a), Float(b)) => Ok(Float(a * b)),
        ("/", Float(a), Float(b)) => Ok(Float(a / b)),
        ("==", Int(a), Int(b)) => Ok(Bool(a == b)),
        ("!=", Int(a), Int(b)) => Ok(Bool(a != b)),
        ("<", Int(a), Int(b)) => Ok(Bool(a < b)),
        (">", Int(a), Int(b)) => Ok(Bool(a > b)),
        ("<=", Int(a), Int(b)) => Ok(Bool(a <= b)),
        (">=", Int(a), Int(b)) => Ok(Bool(a >= b)),
        ("&&", Bool(a), Bool(b)) => Ok(Bool(a && b)),
        ("||", Bool(a), Bool(b)) => Ok(Bool(a || b)),
        _ => Err(FatalError::new(ErrorCode::UnsupportedConstOperation, span.clone(), format!("`{}` is not defined for these constant operand types", op))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceSpan;

    fn lit(v: i128) -> Expr {
        Expr::new(ExprKind::ValueLiteral(LiteralValue::Int(v)), SourceSpan::synthetic())
    }

    fn infix(op: &str, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::Infix { op: op.to_string(), lhs: Box::new(lhs), rhs: Box::new(rhs), decl: None }, SourceSpan::synthetic())
    }

    #[test]
    fn folds_nested_arithmetic() {
        let arena = DeclArena::new();
        let expr = infix("+", lit(2), infix("*", lit(3), lit(4)));
        assert_eq!(eval_const(&arena, &expr).unwrap(), ConstValue::Int(14));
    }

    #[test]
    fn division_by_zero_is_a_diagnostic() {
        let arena = DeclArena::new();
        let expr = infix("/", lit(1), lit(0));
        assert!(eval_const(&arena, &expr).is_err());
    }

    #[test]
    fn comparison_yields_bool() {
        let arena = DeclArena::new();
        let expr = infix("<", lit(1), lit(2));
        assert_eq!(eval_const(&arena, &expr).unwrap(), ConstValue::Bool(true));
    }

    #[test]
    fn a_non_const_name_is_rejected() {
        let arena = DeclArena::new();
        let expr = Expr::new(ExprKind::Identifier(crate::ast::Identifier::synthetic("x")), SourceSpan::synthetic());
        assert!(eval_const(&arena, &expr).is_err());
    }
}
