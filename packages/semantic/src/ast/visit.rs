//! A recursive mutable visitor over statements and expressions.
//!
//! Adapted from the teacher's `CombinedRecursiveAstVisitor`
//! (`combined_visitor.ts`/`.rs`): visiting a node first dispatches to the
//! node's own hook, then — unless the hook chooses to stop — recurses into
//! its children via a free `walk_*` function. Every later pass (type
//! resolution, code processing, destructor insertion) is "walk every
//! declaration/expression" per §4.4/§4.6/§4.7, so they all build on this
//! instead of hand-rolling their own traversal.

use super::expr::{Expr, ExprKind};
use super::stmt::{Stmt, StmtKind};

/// Implement the hooks you care about; unhandled node kinds still recurse
/// via the default `walk_*` bodies.
pub trait MutVisitor {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }
}

pub fn walk_expr<V: MutVisitor + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::ArrayLiteral(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        ExprKind::MemberVariableRef { object, .. }
        | ExprKind::MemberPropertyRef { object, .. }
        | ExprKind::MemberSubscriptOperatorRef { object, .. }
        | ExprKind::VTableFunctionReference { object, .. } => v.visit_expr(object),
        ExprKind::MemberFunctionCall { object, args, .. } | ExprKind::VTableFunctionCall { object, args, .. } => {
            v.visit_expr(object);
            for a in args {
                v.visit_expr(&mut a.value);
            }
        }
        ExprKind::UnresolvedCall { callee, args } => {
            v.visit_expr(callee);
            for a in args {
                v.visit_expr(&mut a.value);
            }
        }
        ExprKind::UnresolvedMemberAccess { object, .. } => v.visit_expr(object),
        ExprKind::FunctionCall { args, .. } | ExprKind::SubscriptCall { args, .. } => {
            for a in args {
                v.visit_expr(&mut a.value);
            }
        }
        ExprKind::ConstructorCall { args, object_ref, .. } => {
            for a in args {
                v.visit_expr(&mut a.value);
            }
            if let Some(obj) = object_ref {
                v.visit_expr(obj);
            }
        }
        ExprKind::MemberSubscriptCall { object, args, .. } => {
            v.visit_expr(object);
            for a in args {
                v.visit_expr(&mut a.value);
            }
        }
        ExprKind::PropertyGetCall { object, .. } => {
            if let Some(obj) = object {
                v.visit_expr(obj);
            }
        }
        ExprKind::PropertySetCall { object, value, .. } => {
            if let Some(obj) = object {
                v.visit_expr(obj);
            }
            v.visit_expr(value);
        }
        ExprKind::SubscriptOperatorGetCall { object, args, .. } => {
            v.visit_expr(object);
            for a in args {
                v.visit_expr(&mut a.value);
            }
        }
        ExprKind::SubscriptOperatorSetCall { object, args, value, .. } => {
            v.visit_expr(object);
            for a in args {
                v.visit_expr(&mut a.value);
            }
            v.visit_expr(value);
        }
        ExprKind::Prefix { operand, .. } | ExprKind::Postfix { operand, .. } => v.visit_expr(operand),
        ExprKind::Infix { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Assignment { lhs, rhs } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::MemberPrefix { object, .. } | ExprKind::MemberPostfix { object, .. } => v.visit_expr(object),
        ExprKind::MemberInfix { object, rhs, .. } => {
            v.visit_expr(object);
            v.visit_expr(rhs);
        }
        ExprKind::ImplicitCast { expr, .. }
        | ExprKind::As { expr, .. }
        | ExprKind::Ref { expr }
        | ExprKind::ImplicitDeref { expr }
        | ExprKind::LValueToRValue { expr }
        | ExprKind::RValueToInRef { expr }
        | ExprKind::Try { expr }
        | ExprKind::Paren(expr)
        | ExprKind::LabeledArgument { expr, .. }
        | ExprKind::Is { expr, .. }
        | ExprKind::Has { expr, .. } => v.visit_expr(expr),
        ExprKind::Ternary { cond, then_expr, else_expr } => {
            v.visit_expr(cond);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::ValueLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::TypeValue(_)
        | ExprKind::Identifier(_)
        | ExprKind::LocalVariableRef(_)
        | ExprKind::ParameterRef(_)
        | ExprKind::VariableRef(_)
        | ExprKind::EnumConstRef(_)
        | ExprKind::FunctionReference(_)
        | ExprKind::PropertyRef(_)
        | ExprKind::SubscriptOperatorRef(_)
        | ExprKind::ConstructorReference(_)
        | ExprKind::CallOperatorReference(_)
        | ExprKind::CurrentSelf
        | ExprKind::ImaginaryRef(_)
        | ExprKind::TemporaryValueRef(_)
        | ExprKind::TemplateConstRef(_)
        | ExprKind::CheckExtendsType { .. }
        | ExprKind::VariableDecl(_) => {}
    }
}

pub fn walk_stmt<V: MutVisitor + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Compound { stmts } => {
            for s in stmts {
                v.visit_stmt(s);
            }
        }
        StmtKind::Case { values, body } => {
            for val in values {
                v.visit_expr(val);
            }
            for s in body {
                v.visit_stmt(s);
            }
        }
        StmtKind::Catch { body, .. } => v.visit_stmt(body),
        StmtKind::DoCatch { body, catches } => {
            v.visit_stmt(body);
            for c in catches {
                v.visit_stmt(c);
            }
        }
        StmtKind::DoWhile { body, cond } | StmtKind::RepeatWhile { body, cond } => {
            v.visit_stmt(body);
            v.visit_expr(cond);
        }
        StmtKind::While { cond, body } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        StmtKind::For { init, cond, step, body } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(step) = step {
                v.visit_expr(step);
            }
            v.visit_stmt(body);
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            v.visit_expr(cond);
            v.visit_stmt(then_branch);
            if let Some(e) = else_branch {
                v.visit_stmt(e);
            }
        }
        StmtKind::Labeled { stmt, .. } => v.visit_stmt(stmt),
        StmtKind::Return { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        StmtKind::Switch { value, cases } => {
            v.visit_expr(value);
            for c in cases {
                v.visit_stmt(c);
            }
        }
        StmtKind::Expr(e) => v.visit_expr(e),
        StmtKind::Break { .. } | StmtKind::Continue { .. } | StmtKind::Fallthrough | StmtKind::Goto { .. } => {}
    }
}
