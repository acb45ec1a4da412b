//! Deep-copy with substitution.
//!
//! `deepCopy()` in the reference design is invoked "unpredictably"
//! (§9 design notes); here it has exactly one call site — template
//! argument substitution (§4.6.2 step 4) — and is modeled as the explicit
//! [`Substitution`] value plus the `subst_*` functions in this module. Every
//! owned declaration reachable from a template body (parameters, locals) is
//! given a fresh [`DeclId`] in `remap` as it is encountered; references are
//! rewritten through the same map so the clone is fully independent of the
//! template's body, matching the ownership rule in §3.2: "the resulting
//! `*Inst` declaration has its own owned, deep-copied AST."

use super::decl::{CallableDecl, Decl, DeclKind};
use super::expr::{Arg, Expr, ExprKind};
use super::ids::{DeclArena, DeclId};
use super::stmt::{Stmt, StmtKind};
use super::ty::{Type, TypeKind};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum TemplateArgBinding {
    Type(Type),
    Const(Expr),
}

/// Maps a template's formal parameters to the concrete arguments chosen
/// for one instantiation.
#[derive(Debug, Default, Clone)]
pub struct Substitution {
    pub bindings: HashMap<DeclId, TemplateArgBinding>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn bind_type(&mut self, param: DeclId, ty: Type) {
        self.bindings.insert(param, TemplateArgBinding::Type(ty));
    }

    pub fn bind_const(&mut self, param: DeclId, value: Expr) {
        self.bindings.insert(param, TemplateArgBinding::Const(value));
    }
}

/// Tracks old→new ids for locals/parameters allocated while cloning one
/// template body, so forward references within the same body resolve to
/// the same fresh declaration.
pub type DeclRemap = HashMap<DeclId, DeclId>;

pub fn subst_type(ty: &Type, subst: &Substitution) -> Type {
    let kind = match &ty.kind {
        TypeKind::TemplateTypenameRef(param) => {
            if let Some(TemplateArgBinding::Type(bound)) = subst.bindings.get(param) {
                return Type { kind: bound.kind.clone(), qualifier: ty.qualifier, is_lvalue: ty.is_lvalue };
            }
            TypeKind::TemplateTypenameRef(*param)
        }
        TypeKind::Pointer(inner) => TypeKind::Pointer(Box::new(subst_type(inner, subst))),
        TypeKind::Reference(inner) => TypeKind::Reference(Box::new(subst_type(inner, subst))),
        TypeKind::RValueReference(inner) => TypeKind::RValueReference(Box::new(subst_type(inner, subst))),
        TypeKind::FlatArray { elem, length } => TypeKind::FlatArray {
            elem: Box::new(subst_type(elem, subst)),
            length: Box::new(subst_expr_pure(length, subst)),
        },
        TypeKind::Dimension { elem, rank } => {
            TypeKind::Dimension { elem: Box::new(subst_type(elem, subst)), rank: *rank }
        }
        TypeKind::FunctionPointer { result, params } => TypeKind::FunctionPointer {
            result: Box::new(subst_type(result, subst)),
            params: params.iter().map(|p| subst_type(p, subst)).collect(),
        },
        TypeKind::TemplateStruct { decl, args } => TypeKind::TemplateStruct {
            decl: *decl,
            args: args.iter().map(|a| subst_expr_pure(a, subst)).collect(),
        },
        TypeKind::TemplateTrait { decl, args } => TypeKind::TemplateTrait {
            decl: *decl,
            args: args.iter().map(|a| subst_expr_pure(a, subst)).collect(),
        },
        TypeKind::Dependent { container, dependent } => TypeKind::Dependent {
            container: Box::new(subst_type(container, subst)),
            dependent: Box::new(subst_type(dependent, subst)),
        },
        TypeKind::UnresolvedNested { container, name, template_args } => TypeKind::UnresolvedNested {
            container: Box::new(subst_type(container, subst)),
            name: name.clone(),
            template_args: template_args
                .as_ref()
                .map(|args| args.iter().map(|a| subst_expr_pure(a, subst)).collect()),
        },
        other => other.clone(),
    };
    Type { kind, qualifier: ty.qualifier, is_lvalue: ty.is_lvalue }
}

/// Substitute within an expression tree that cannot own new declarations
/// (template-argument positions: array lengths, const args). Unlike
/// [`subst_expr`] it never needs a `DeclArena`.
fn subst_expr_pure(expr: &Expr, subst: &Substitution) -> Expr {
    let kind = match &expr.kind {
        ExprKind::TemplateConstRef(param) => {
            if let Some(TemplateArgBinding::Const(bound)) = subst.bindings.get(param) {
                return bound.clone();
            }
            ExprKind::TemplateConstRef(*param)
        }
        ExprKind::TypeValue(ty) => ExprKind::TypeValue(subst_type(ty, subst)),
        ExprKind::Paren(inner) => ExprKind::Paren(Box::new(subst_expr_pure(inner, subst))),
        ExprKind::Infix { op, lhs, rhs, decl } => ExprKind::Infix {
            op: op.clone(),
            lhs: Box::new(subst_expr_pure(lhs, subst)),
            rhs: Box::new(subst_expr_pure(rhs, subst)),
            decl: *decl,
        },
        ExprKind::Prefix { op, operand, decl } => {
            ExprKind::Prefix { op: op.clone(), operand: Box::new(subst_expr_pure(operand, subst)), decl: *decl }
        }
        other => other.clone(),
    };
    Expr { kind, value_type: subst_type(&expr.value_type, subst), span: expr.span.clone() }
}

/// Clone and substitute a statement tree, allocating fresh declarations for
/// every local variable and parameter it owns along the way.
pub fn clone_stmt(arena: &mut DeclArena, subst: &Substitution, remap: &mut DeclRemap, stmt: &Stmt) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Compound { stmts } => {
            StmtKind::Compound { stmts: stmts.iter().map(|s| clone_stmt(arena, subst, remap, s)).collect() }
        }
        StmtKind::Case { values, body } => StmtKind::Case {
            values: values.iter().map(|v| clone_expr(arena, subst, remap, v)).collect(),
            body: body.iter().map(|s| clone_stmt(arena, subst, remap, s)).collect(),
        },
        StmtKind::Catch { bound, body } => StmtKind::Catch {
            bound: bound.map(|id| remap_local_decl(arena, subst, remap, id)),
            body: Box::new(clone_stmt(arena, subst, remap, body)),
        },
        StmtKind::DoCatch { body, catches } => StmtKind::DoCatch {
            body: Box::new(clone_stmt(arena, subst, remap, body)),
            catches: catches.iter().map(|c| clone_stmt(arena, subst, remap, c)).collect(),
        },
        StmtKind::DoWhile { body, cond } => StmtKind::DoWhile {
            body: Box::new(clone_stmt(arena, subst, remap, body)),
            cond: clone_expr(arena, subst, remap, cond),
        },
        StmtKind::RepeatWhile { body, cond } => StmtKind::RepeatWhile {
            body: Box::new(clone_stmt(arena, subst, remap, body)),
            cond: clone_expr(arena, subst, remap, cond),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: clone_expr(arena, subst, remap, cond),
            body: Box::new(clone_stmt(arena, subst, remap, body)),
        },
        StmtKind::For { init, cond, step, body } => StmtKind::For {
            init: init.as_ref().map(|s| Box::new(clone_stmt(arena, subst, remap, s))),
            cond: cond.as_ref().map(|c| clone_expr(arena, subst, remap, c)),
            step: step.as_ref().map(|s| clone_expr(arena, subst, remap, s)),
            body: Box::new(clone_stmt(arena, subst, remap, body)),
        },
        StmtKind::If { cond, then_branch, else_branch } => StmtKind::If {
            cond: clone_expr(arena, subst, remap, cond),
            then_branch: Box::new(clone_stmt(arena, subst, remap, then_branch)),
            else_branch: else_branch.as_ref().map(|s| Box::new(clone_stmt(arena, subst, remap, s))),
        },
        StmtKind::Labeled { label, stmt, local_count_at_label } => StmtKind::Labeled {
            label: label.clone(),
            stmt: Box::new(clone_stmt(arena, subst, remap, stmt)),
            local_count_at_label: *local_count_at_label,
        },
        StmtKind::Return { value, pre_return_deferred } => StmtKind::Return {
            value: value.as_ref().map(|v| clone_expr(arena, subst, remap, v)),
            pre_return_deferred: pre_return_deferred.iter().map(|id| remap.get(id).copied().unwrap_or(*id)).collect(),
        },
        StmtKind::Switch { value, cases } => StmtKind::Switch {
            value: clone_expr(arena, subst, remap, value),
            cases: cases.iter().map(|c| clone_stmt(arena, subst, remap, c)).collect(),
        },
        StmtKind::Expr(e) => StmtKind::Expr(clone_expr(arena, subst, remap, e)),
        StmtKind::Break { pre_break_deferred } => StmtKind::Break {
            pre_break_deferred: pre_break_deferred.iter().map(|id| remap.get(id).copied().unwrap_or(*id)).collect(),
        },
        StmtKind::Continue { pre_continue_deferred } => StmtKind::Continue {
            pre_continue_deferred: pre_continue_deferred
                .iter()
                .map(|id| remap.get(id).copied().unwrap_or(*id))
                .collect(),
        },
        StmtKind::Goto { label, pre_goto_deferred } => StmtKind::Goto {
            label: label.clone(),
            pre_goto_deferred: pre_goto_deferred.iter().map(|id| remap.get(id).copied().unwrap_or(*id)).collect(),
        },
        StmtKind::Fallthrough => StmtKind::Fallthrough,
    };
    Stmt { kind, span: stmt.span.clone(), temporary_values: Vec::new() }
}

fn remap_local_decl(arena: &mut DeclArena, subst: &Substitution, remap: &mut DeclRemap, old: DeclId) -> DeclId {
    if let Some(new_id) = remap.get(&old) {
        return *new_id;
    }
    let mut fresh = arena.get(old).clone();
    if let DeclKind::Variable { ty, initializer, .. } = &mut fresh.kind {
        *ty = subst_type(ty, subst);
        if let Some(init) = initializer.take() {
            *initializer = Some(clone_expr(arena, subst, remap, &init));
        }
    }
    let new_id = arena.alloc(fresh);
    remap.insert(old, new_id);
    new_id
}

pub fn clone_expr(arena: &mut DeclArena, subst: &Substitution, remap: &mut DeclRemap, expr: &Expr) -> Expr {
    let kind = match &expr.kind {
        ExprKind::TemplateConstRef(param) => {
            if let Some(TemplateArgBinding::Const(bound)) = subst.bindings.get(param) {
                return bound.clone();
            }
            ExprKind::TemplateConstRef(*param)
        }
        ExprKind::VariableDecl(old) => ExprKind::VariableDecl(remap_local_decl(arena, subst, remap, *old)),
        ExprKind::LocalVariableRef(old) => ExprKind::LocalVariableRef(remap.get(old).copied().unwrap_or(*old)),
        ExprKind::ParameterRef(old) => ExprKind::ParameterRef(remap.get(old).copied().unwrap_or(*old)),
        ExprKind::TypeValue(ty) => ExprKind::TypeValue(subst_type(ty, subst)),
        ExprKind::ArrayLiteral(items) => {
            ExprKind::ArrayLiteral(items.iter().map(|i| clone_expr(arena, subst, remap, i)).collect())
        }
        ExprKind::MemberVariableRef { object, member } => {
            ExprKind::MemberVariableRef { object: Box::new(clone_expr(arena, subst, remap, object)), member: *member }
        }
        ExprKind::MemberPropertyRef { object, member } => {
            ExprKind::MemberPropertyRef { object: Box::new(clone_expr(arena, subst, remap, object)), member: *member }
        }
        ExprKind::MemberSubscriptOperatorRef { object, member } => ExprKind::MemberSubscriptOperatorRef {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            member: *member,
        },
        ExprKind::VTableFunctionReference { object, owner, slot } => ExprKind::VTableFunctionReference {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            owner: *owner,
            slot: *slot,
        },
        ExprKind::FunctionCall { callee, args } => {
            ExprKind::FunctionCall { callee: *callee, args: clone_args(arena, subst, remap, args) }
        }
        ExprKind::MemberFunctionCall { object, callee, args } => ExprKind::MemberFunctionCall {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            callee: *callee,
            args: clone_args(arena, subst, remap, args),
        },
        ExprKind::VTableFunctionCall { object, owner, slot, callee, args } => ExprKind::VTableFunctionCall {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            owner: *owner,
            slot: *slot,
            callee: *callee,
            args: clone_args(arena, subst, remap, args),
        },
        ExprKind::UnresolvedCall { callee, args } => ExprKind::UnresolvedCall {
            callee: Box::new(clone_expr(arena, subst, remap, callee)),
            args: clone_args(arena, subst, remap, args),
        },
        ExprKind::UnresolvedMemberAccess { object, member } => {
            ExprKind::UnresolvedMemberAccess { object: Box::new(clone_expr(arena, subst, remap, object)), member: member.clone() }
        }
        ExprKind::ConstructorCall { ctor, args, object_ref } => ExprKind::ConstructorCall {
            ctor: *ctor,
            args: clone_args(arena, subst, remap, args),
            object_ref: object_ref.as_ref().map(|o| Box::new(clone_expr(arena, subst, remap, o))),
        },
        ExprKind::SubscriptCall { decl, args } => {
            ExprKind::SubscriptCall { decl: *decl, args: clone_args(arena, subst, remap, args) }
        }
        ExprKind::MemberSubscriptCall { object, decl, args } => ExprKind::MemberSubscriptCall {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            decl: *decl,
            args: clone_args(arena, subst, remap, args),
        },
        ExprKind::PropertyGetCall { object, decl } => ExprKind::PropertyGetCall {
            object: object.as_ref().map(|o| Box::new(clone_expr(arena, subst, remap, o))),
            decl: *decl,
        },
        ExprKind::PropertySetCall { object, decl, value } => ExprKind::PropertySetCall {
            object: object.as_ref().map(|o| Box::new(clone_expr(arena, subst, remap, o))),
            decl: *decl,
            value: Box::new(clone_expr(arena, subst, remap, value)),
        },
        ExprKind::SubscriptOperatorGetCall { object, decl, args, want_ref_mut } => ExprKind::SubscriptOperatorGetCall {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            decl: *decl,
            args: clone_args(arena, subst, remap, args),
            want_ref_mut: *want_ref_mut,
        },
        ExprKind::SubscriptOperatorSetCall { object, decl, args, value } => ExprKind::SubscriptOperatorSetCall {
            object: Box::new(clone_expr(arena, subst, remap, object)),
            decl: *decl,
            args: clone_args(arena, subst, remap, args),
            value: Box::new(clone_expr(arena, subst, remap, value)),
        },
        ExprKind::Prefix { op, operand, decl } => {
            ExprKind::Prefix { op: op.clone(), operand: Box::new(clone_expr(arena, subst, remap, operand)), decl: *decl }
        }
        ExprKind::Postfix { op, operand, decl } => {
            ExprKind::Postfix { op: op.clone(), operand: Box::new(clone_expr(arena, subst, remap, operand)), decl: *decl }
        }
        ExprKind::Infix { op, lhs, rhs, decl } => ExprKind::Infix {
            op: op.clone(),
            lhs: Box::new(clone_expr(arena, subst, remap, lhs)),
            rhs: Box::new(clone_expr(arena, subst, remap, rhs)),
            decl: *decl,
        },
        ExprKind::Assignment { lhs, rhs } => ExprKind::Assignment {
            lhs: Box::new(clone_expr(arena, subst, remap, lhs)),
            rhs: Box::new(clone_expr(arena, subst, remap, rhs)),
        },
        ExprKind::MemberPrefix { op, object, decl } => {
            ExprKind::MemberPrefix { op: op.clone(), object: Box::new(clone_expr(arena, subst, remap, object)), decl: *decl }
        }
        ExprKind::MemberPostfix { op, object, decl } => {
            ExprKind::MemberPostfix { op: op.clone(), object: Box::new(clone_expr(arena, subst, remap, object)), decl: *decl }
        }
        ExprKind::MemberInfix { op, object, rhs, decl } => ExprKind::MemberInfix {
            op: op.clone(),
            object: Box::new(clone_expr(arena, subst, remap, object)),
            rhs: Box::new(clone_expr(arena, subst, remap, rhs)),
            decl: *decl,
        },
        ExprKind::ImplicitCast { expr: e, target } => ExprKind::ImplicitCast {
            expr: Box::new(clone_expr(arena, subst, remap, e)),
            target: subst_type(target, subst),
        },
        ExprKind::As { expr: e, target } => {
            ExprKind::As { expr: Box::new(clone_expr(arena, subst, remap, e)), target: subst_type(target, subst) }
        }
        ExprKind::Ref { expr: e } => ExprKind::Ref { expr: Box::new(clone_expr(arena, subst, remap, e)) },
        ExprKind::ImplicitDeref { expr: e } => {
            ExprKind::ImplicitDeref { expr: Box::new(clone_expr(arena, subst, remap, e)) }
        }
        ExprKind::LValueToRValue { expr: e } => {
            ExprKind::LValueToRValue { expr: Box::new(clone_expr(arena, subst, remap, e)) }
        }
        ExprKind::RValueToInRef { expr: e } => {
            ExprKind::RValueToInRef { expr: Box::new(clone_expr(arena, subst, remap, e)) }
        }
        ExprKind::Ternary { cond, then_expr, else_expr } => ExprKind::Ternary {
            cond: Box::new(clone_expr(arena, subst, remap, cond)),
            then_expr: Box::new(clone_expr(arena, subst, remap, then_expr)),
            else_expr: Box::new(clone_expr(arena, subst, remap, else_expr)),
        },
        ExprKind::Try { expr: e } => ExprKind::Try { expr: Box::new(clone_expr(arena, subst, remap, e)) },
        ExprKind::Paren(e) => ExprKind::Paren(Box::new(clone_expr(arena, subst, remap, e))),
        ExprKind::LabeledArgument { label, expr: e } => {
            ExprKind::LabeledArgument { label: label.clone(), expr: Box::new(clone_expr(arena, subst, remap, e)) }
        }
        ExprKind::CheckExtendsType { ty, extends } => {
            ExprKind::CheckExtendsType { ty: subst_type(ty, subst), extends: subst_type(extends, subst) }
        }
        ExprKind::Is { expr: e, ty } => {
            ExprKind::Is { expr: Box::new(clone_expr(arena, subst, remap, e)), ty: subst_type(ty, subst) }
        }
        ExprKind::Has { expr: e, prototype_name } => {
            ExprKind::Has { expr: Box::new(clone_expr(arena, subst, remap, e)), prototype_name: prototype_name.clone() }
        }
        other => other.clone(),
    };
    Expr { kind, value_type: subst_type(&expr.value_type, subst), span: expr.span.clone() }
}

fn clone_args(arena: &mut DeclArena, subst: &Substitution, remap: &mut DeclRemap, args: &[Arg]) -> Vec<Arg> {
    args.iter()
        .map(|a| Arg { label: a.label.clone(), value: clone_expr(arena, subst, remap, &a.value) })
        .collect()
}

/// Clone a callable's parameter list and body under `subst`, allocating
/// fresh `DeclId`s for the parameters up front so the body (which may
/// reference any parameter, in or out of order) resolves consistently.
pub fn clone_callable(arena: &mut DeclArena, subst: &Substitution, callable: &CallableDecl) -> CallableDecl {
    let mut remap = DeclRemap::new();
    let mut new_params = Vec::with_capacity(callable.params.len());
    for &old_param in &callable.params {
        let mut fresh: Decl = arena.get(old_param).clone();
        if let DeclKind::Parameter { ty, default_value, .. } = &mut fresh.kind {
            *ty = subst_type(ty, subst);
            if let Some(dv) = default_value.take() {
                *default_value = Some(clone_expr(arena, subst, &mut remap, &dv));
            }
        }
        let new_id = arena.alloc(fresh);
        remap.insert(old_param, new_id);
        new_params.push(new_id);
    }
    CallableDecl {
        params: new_params,
        return_type: subst_type(&callable.return_type, subst),
        body: callable.body.as_ref().map(|b| clone_stmt(arena, subst, &mut remap, b)),
        throws: callable.throws,
        requires: callable.requires.iter().map(|e| clone_expr(arena, subst, &mut remap, e)).collect(),
        ensures: callable.ensures.iter().map(|e| clone_expr(arena, subst, &mut remap, e)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::decl::{Decl, DeclKind, VarKind};
    use crate::ast::ident::Identifier;
    use crate::position::SourceSpan;

    #[test]
    fn template_typename_ref_substitutes_to_bound_type() {
        let mut arena = DeclArena::new();
        let param = arena.alloc(Decl::new(
            Identifier::synthetic("T"),
            SourceSpan::synthetic(),
            DeclKind::TemplateParameter(crate::ast::decl::TemplateParameterKind::Typename { bound: None, default: None }),
        ));
        let mut subst = Substitution::new();
        subst.bind_type(param, Type::builtin("i32").unwrap());

        let ty = Type::new(TypeKind::TemplateTypenameRef(param));
        let substituted = subst_type(&ty, &subst);
        assert!(matches!(substituted.kind, TypeKind::BuiltIn { size_bits: 32, .. }));
    }

    #[test]
    fn cloning_a_local_declares_a_fresh_decl_id() {
        let mut arena = DeclArena::new();
        let local = arena.alloc(Decl::new(
            Identifier::synthetic("x"),
            SourceSpan::synthetic(),
            DeclKind::Variable { ty: Type::builtin("i32").unwrap(), initializer: None, var_kind: VarKind::Local },
        ));
        let decl_expr = Expr::new(ExprKind::VariableDecl(local), SourceSpan::synthetic());
        let subst = Substitution::new();
        let mut remap = DeclRemap::new();
        let cloned = clone_expr(&mut arena, &subst, &mut remap, &decl_expr);
        match cloned.kind {
            ExprKind::VariableDecl(new_id) => assert_ne!(new_id, local),
            _ => panic!("expected VariableDecl"),
        }
        assert_eq!(arena.len(), 2);
    }
}
