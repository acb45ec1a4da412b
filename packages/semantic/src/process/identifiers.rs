//! Identifier resolution and member access (§4.7 "Identifier resolution",
//! "Member access").
//!
//! A bare name is tried, in order: locals innermost-first, the current
//! callable's parameters, the enclosing template's parameters, the current
//! struct's members (wrapping the result in an implicit `self.`), the
//! enclosing declaration chain (mirroring C5's [`crate::resolve_types`]
//! walk), the file's top-level declarations, then its imports. `a.b` skips
//! straight to looking `b` up against `a`'s resolved type.

use crate::ast::{AstFile, Decl, DeclArena, DeclId, DeclKind, Expr, ExprKind, Type};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::namespace::NamespaceTable;
use crate::position::SourceSpan;
use crate::validate::owned_children;

/// The name-resolution environment for one callable body. `locals` grows
/// and shrinks as the body walk enters/leaves a block (§4.7 scoping).
pub struct Scope<'a> {
    pub locals: Vec<(String, DeclId)>,
    pub params: &'a [DeclId],
    pub template_params: &'a [DeclId],
    pub self_struct: Option<DeclId>,
    pub container: Option<DeclId>,
    pub file: &'a AstFile,
    pub namespaces: &'a NamespaceTable,
}

impl<'a> Scope<'a> {
    pub fn push_local(&mut self, name: String, decl: DeclId) {
        self.locals.push((name, decl));
    }

    /// Truncate back to a block-entry mark captured via `self.locals.len()`.
    pub fn pop_locals_to(&mut self, mark: usize) {
        self.locals.truncate(mark);
    }
}

fn struct_members(decl: &Decl) -> &[DeclId] {
    match &decl.kind {
        DeclKind::Struct(s) => &s.all_members,
        DeclKind::ImaginaryType { members, .. } => members,
        _ => &[],
    }
}

pub fn resolve_identifier(arena: &DeclArena, scope: &Scope, name: &str, span: SourceSpan) -> SemaResult<Expr> {
    if let Some((_, decl)) = scope.locals.iter().rev().find(|(n, _)| n == name) {
        return Ok(Expr::new(ExprKind::LocalVariableRef(*decl), span).with_type(arena.get(*decl).callable_ty_or_var_ty()));
    }

    if let Some(&decl) = scope.params.iter().find(|&&p| arena.get(p).name() == name) {
        return Ok(Expr::new(ExprKind::ParameterRef(decl), span).with_type(arena.get(decl).callable_ty_or_var_ty()));
    }

    if let Some(&decl) = scope.template_params.iter().find(|&&p| arena.get(p).name() == name) {
        return Ok(const_template_param_ref(arena, decl, span));
    }

    if let Some(self_struct) = scope.self_struct {
        if let Some(&member) = struct_members(arena.get(self_struct)).iter().find(|&&m| arena.get(m).name() == name) {
            let current_self = Box::new(Expr::new(ExprKind::CurrentSelf, span.clone()).with_type(Type::new(crate::ast::TypeKind::Struct(self_struct))));
            return decl_to_value_expr(arena, member, Some(current_self), span);
        }
    }

    let mut cursor = scope.container;
    while let Some(current) = cursor {
        if let Some(&found) = owned_children(arena.get(current)).iter().find(|&&c| arena.get(c).name() == name) {
            return decl_to_value_expr(arena, found, None, span);
        }
        cursor = arena.get(current).container;
    }

    if let Some(&decl) = scope.file.declarations.iter().find(|&&d| arena.get(d).name() == name) {
        return decl_to_value_expr(arena, decl, None, span);
    }

    for &import in &scope.file.imports {
        if let DeclKind::Import(i) = &arena.get(import).kind {
            if let Some(resolved) = i.resolved {
                if arena.get(resolved).name() == name {
                    return decl_to_value_expr(arena, resolved, None, span);
                }
            }
        }
    }

    Err(FatalError::new(ErrorCode::NameNotFound, span, format!("cannot find `{}` in this scope", name)))
}

pub fn resolve_member_access(arena: &DeclArena, object: Expr, member_name: &str, span: SourceSpan) -> SemaResult<Expr> {
    let Some(struct_id) = object.value_type.strip_reference().as_struct() else {
        return Err(FatalError::new(ErrorCode::CannotConvert, span, format!("`{}` is not a struct value", member_name)));
    };
    let Some(&member) = struct_members(arena.get(struct_id)).iter().find(|&&m| arena.get(m).name() == member_name) else {
        return Err(FatalError::new(ErrorCode::NameNotFound, span, format!("no member `{}` on this type", member_name)));
    };
    decl_to_value_expr(arena, member, Some(Box::new(object)), span)
}

fn const_template_param_ref(arena: &DeclArena, decl: DeclId, span: SourceSpan) -> Expr {
    use crate::ast::TemplateParameterKind;
    let ty = match &arena.get(decl).kind {
        DeclKind::TemplateParameter(TemplateParameterKind::Const { ty, .. }) => ty.clone(),
        DeclKind::TemplateParameter(TemplateParameterKind::Typename { .. }) => Type::new(crate::ast::TypeKind::Imaginary(decl)),
        _ => Type::void(),
    };
    Expr::new(ExprKind::TemplateConstRef(decl), span).with_type(ty)
}

/// Turn a resolved declaration into the value-producing `Expr` the spec
/// names for it, wrapping in `object.` when one is supplied (member
/// access or an implicit `self.` insertion).
fn decl_to_value_expr(arena: &DeclArena, decl: DeclId, object: Option<Box<Expr>>, span: SourceSpan) -> SemaResult<Expr> {
    let d = arena.get(decl);
    match &d.kind {
        DeclKind::Variable { ty, var_kind, .. } => {
            let ty = ty.clone().lvalue();
            let kind = match (var_kind, &object) {
                (crate::ast::VarKind::Member, Some(_)) => ExprKind::MemberVariableRef { object: object.unwrap(), member: decl },
                (crate::ast::VarKind::Member, None) => return Err(FatalError::internal(span, "member variable referenced without an object")),
                _ => ExprKind::VariableRef(decl),
            };
            Ok(Expr::new(kind, span).with_type(ty))
        }
        DeclKind::EnumConst { .. } => {
            let container = d.container.ok_or_else(|| FatalError::internal(span.clone(), "enum constant has no container"))?;
            Ok(Expr::new(ExprKind::EnumConstRef(decl), span).with_type(Type::new(crate::ast::TypeKind::Enum(container))))
        }
        DeclKind::Function(c) => {
            let ty = c.return_type.clone();
            match object {
                Some(object) => Ok(Expr::new(ExprKind::MemberFunctionCall { object, callee: decl, args: Vec::new() }, span).with_type(ty)),
                None => Ok(Expr::new(ExprKind::FunctionReference(decl), span).with_type(ty)),
            }
        }
        DeclKind::Property(p) => {
            let ty = p.getter.return_type.clone();
            let kind = match object {
                Some(object) => ExprKind::MemberPropertyRef { object, member: decl },
                None => ExprKind::PropertyRef(decl),
            };
            Ok(Expr::new(kind, span).with_type(ty))
        }
        DeclKind::SubscriptOperator(_) => {
            let kind = match object {
                Some(object) => ExprKind::MemberSubscriptOperatorRef { object, member: decl },
                None => ExprKind::SubscriptOperatorRef(decl),
            };
            Ok(Expr::new(kind, span).with_type(Type::void()))
        }
        DeclKind::ImaginaryType { .. } => Ok(Expr::new(ExprKind::ImaginaryRef(decl), span).with_type(Type::new(crate::ast::TypeKind::Imaginary(decl)))),
        DeclKind::Parameter { ty, .. } => Ok(Expr::new(ExprKind::ParameterRef(decl), span).with_type(ty.clone().lvalue())),
        _ => Err(FatalError::new(ErrorCode::NameNotFound, span, format!("`{}` cannot be used as a value", d.name()))),
    }
}

trait DeclValueType {
    fn callable_ty_or_var_ty(&self) -> Type;
}

impl DeclValueType for Decl {
    fn callable_ty_or_var_ty(&self) -> Type {
        match &self.kind {
            DeclKind::Variable { ty, .. } | DeclKind::Parameter { ty, .. } => ty.clone().lvalue(),
            _ => Type::void(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Identifier, StructDecl, VarKind};
    use crate::position::SourceSpan;

    fn var(arena: &mut DeclArena, name: &str, kind: VarKind) -> DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic(name),
            SourceSpan::synthetic(),
            DeclKind::Variable { ty: Type::builtin("i32").unwrap(), initializer: None, var_kind: kind },
        ))
    }

    fn test_scope<'a>(file: &'a AstFile, namespaces: &'a NamespaceTable) -> Scope<'a> {
        Scope { locals: Vec::new(), params: &[], template_params: &[], self_struct: None, container: None, file, namespaces }
    }

    #[test]
    fn local_shadows_outer_scope() {
        let mut arena = DeclArena::new();
        let local = var(&mut arena, "x", VarKind::Local);
        let file = AstFile::new(0, "a.lang");
        let namespaces = NamespaceTable::default();
        let mut scope = test_scope(&file, &namespaces);
        scope.push_local("x".to_string(), local);
        let expr = resolve_identifier(&arena, &scope, "x", SourceSpan::synthetic()).unwrap();
        assert!(matches!(expr.kind, ExprKind::LocalVariableRef(id) if id == local));
    }

    #[test]
    fn bare_member_name_gets_an_implicit_self() {
        let mut arena = DeclArena::new();
        let member = var(&mut arena, "count", VarKind::Member);
        let struct_id = arena.alloc(Decl::new(
            Identifier::synthetic("Widget"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { all_members: vec![member], ..StructDecl::default() }),
        ));
        let file = AstFile::new(0, "a.lang");
        let namespaces = NamespaceTable::default();
        let mut scope = test_scope(&file, &namespaces);
        scope.self_struct = Some(struct_id);
        let expr = resolve_identifier(&arena, &scope, "count", SourceSpan::synthetic()).unwrap();
        match expr.kind {
            ExprKind::MemberVariableRef { object, member: m } => {
                assert!(matches!(object.kind, ExprKind::CurrentSelf));
                assert_eq!(m, member);
            }
            other => panic!("expected implicit self member ref, got {:?}", other),
        }
    }

    #[test]
    fn unknown_name_is_a_diagnostic() {
        let arena = DeclArena::new();
        let file = AstFile::new(0, "a.lang");
        let namespaces = NamespaceTable::default();
        let scope = test_scope(&file, &namespaces);
        assert!(resolve_identifier(&arena, &scope, "nope", SourceSpan::synthetic()).is_err());
    }

    #[test]
    fn member_access_against_a_resolved_struct_finds_the_field() {
        let mut arena = DeclArena::new();
        let member = var(&mut arena, "count", VarKind::Member);
        let struct_id = arena.alloc(Decl::new(
            Identifier::synthetic("Widget"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { all_members: vec![member], ..StructDecl::default() }),
        ));
        let object = Expr::new(ExprKind::CurrentSelf, SourceSpan::synthetic()).with_type(Type::new(crate::ast::TypeKind::Struct(struct_id)));
        let expr = resolve_member_access(&arena, object, "count", SourceSpan::synthetic()).unwrap();
        assert!(matches!(expr.kind, ExprKind::MemberVariableRef { member: m, .. } if m == member));
    }
}
