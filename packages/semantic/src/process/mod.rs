//! Code processor (C7, §4.7).
//!
//! Walks every callable body left behind by C6 and rewrites it in place:
//! bare names and `a.b` become resolved references (`identifiers`), bare
//! calls pick an overload (`overload`) and resolve to a concrete call node
//! (here, plus `constructors` for `TypeName(args)`/`base(args)`), arguments
//! get bridged across the by-value/by-reference boundary (`conversions`),
//! infix/prefix/postfix operators and assignment desugar (`operators`), and
//! `const` positions fold to a literal (`constexpr`). A template's raw body
//! is never processed directly — only each of its instantiations and its
//! `imaginary_inst` are, since only those carry ground (or `Imaginary`)
//! types a walk can actually resolve against.

pub mod constexpr;
pub mod constructors;
pub mod conversions;
pub mod identifiers;
pub mod operators;
pub mod overload;
pub mod properties;

use crate::ast::{
    walk_expr, walk_stmt, Arg, AstFile, DeclArena, DeclId, DeclKind, Expr, ExprKind, Identifier, MutVisitor, Stmt, Type,
};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::namespace::NamespaceTable;
use crate::position::SourceSpan;
use crate::validate::owned_children;
use identifiers::Scope;

pub fn process_file_bodies(arena: &mut DeclArena, file: &AstFile, namespaces: &NamespaceTable) -> SemaResult<()> {
    for &decl in &file.declarations {
        process_decl(arena, decl, file, namespaces)?;
    }
    Ok(())
}

fn process_decl(arena: &mut DeclArena, decl: DeclId, file: &AstFile, namespaces: &NamespaceTable) -> SemaResult<()> {
    let instantiations: Option<Vec<DeclId>> = match &arena.get(decl).kind {
        DeclKind::TemplateFunction(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        DeclKind::TemplateStruct(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        DeclKind::TemplateTrait(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        _ => None,
    };
    if let Some(insts) = instantiations {
        for inst in insts {
            process_decl(arena, inst, file, namespaces)?;
        }
        return Ok(());
    }

    if arena.get(decl).callable().is_some_and(|c| c.body.is_some()) {
        process_callable_body(arena, decl, file, namespaces)?;
    }

    for child in owned_children(arena.get(decl)) {
        process_decl(arena, child, file, namespaces)?;
    }
    Ok(())
}

fn take_body(arena: &mut DeclArena, decl: DeclId) -> Option<Stmt> {
    arena.get_mut(decl).callable_mut().and_then(|c| c.body.take())
}

fn restore_body(arena: &mut DeclArena, decl: DeclId, body: Stmt) {
    if let Some(c) = arena.get_mut(decl).callable_mut() {
        c.body = Some(body);
    }
}

fn owning_struct(arena: &DeclArena, container: Option<DeclId>) -> Option<DeclId> {
    container.filter(|&c| matches!(arena.get(c).kind, DeclKind::Struct(_) | DeclKind::ImaginaryType { .. }))
}

fn process_callable_body(arena: &mut DeclArena, decl: DeclId, file: &AstFile, namespaces: &NamespaceTable) -> SemaResult<()> {
    let Some(mut body) = take_body(arena, decl) else { return Ok(()) };
    let params = arena.get(decl).callable().map(|c| c.params.clone()).unwrap_or_default();
    let container = arena.get(decl).container;
    let self_struct = owning_struct(arena, container);

    if let (DeclKind::Constructor { .. }, Some(struct_id)) = (&arena.get(decl).kind, self_struct) {
        constructors::insert_implicit_base_call(arena, struct_id, &mut body)?;
    }

    let scope = Scope { locals: Vec::new(), params: &params, template_params: &[], self_struct, container, file, namespaces };
    let mut resolver = Resolver { arena: &mut *arena, scope, result: Ok(()) };
    resolver.visit_stmt(&mut body);
    resolver.result?;

    restore_body(arena, decl, body);
    Ok(())
}

fn is_assignment_op(op: &str) -> bool {
    op == "="
}

fn is_compound_assignment_op(op: &str) -> bool {
    op.len() > 1 && op.ends_with('=') && !matches!(op, "==" | "!=" | "<=" | ">=")
}

/// Every sibling in `struct_id`'s visible member set named `name` and
/// shaped like a free function — the overload set a bare `method(args)`
/// call resolves against once it already knows which object it's on.
fn member_function_candidates(arena: &DeclArena, struct_id: DeclId, name: &str) -> Vec<(DeclId, Vec<DeclId>)> {
    let Some(s) = arena.get(struct_id).as_struct() else { return Vec::new() };
    s.all_members
        .iter()
        .filter(|&&m| arena.get(m).name() == name)
        .filter_map(|&m| arena.get(m).callable().map(|c| (m, c.params.clone())))
        .collect()
}

/// Walks the container chain and the file/imports, the way
/// [`identifiers::resolve_identifier`] does, but only accepting a name that
/// names a struct — the lookup a bare `TypeName(args)` call needs before it
/// can be told apart from a function call of the same shape.
fn lookup_struct_name(arena: &DeclArena, scope: &Scope, name: &str) -> Option<DeclId> {
    let is_struct = |id: DeclId| matches!(arena.get(id).kind, DeclKind::Struct(_));

    let mut cursor = scope.container;
    while let Some(current) = cursor {
        if let Some(found) = owned_children(arena.get(current)).into_iter().find(|&c| arena.get(c).name() == name && is_struct(c)) {
            return Some(found);
        }
        cursor = arena.get(current).container;
    }
    if let Some(found) = scope.file.declarations.iter().copied().find(|&d| arena.get(d).name() == name && is_struct(d)) {
        return Some(found);
    }
    for &import in &scope.file.imports {
        if let DeclKind::Import(i) = &arena.get(import).kind {
            if let Some(resolved) = i.resolved {
                if arena.get(resolved).name() == name && is_struct(resolved) {
                    return Some(resolved);
                }
            }
        }
    }
    None
}

struct Resolver<'a, 'b> {
    arena: &'a mut DeclArena,
    scope: Scope<'b>,
    result: SemaResult<()>,
}

impl<'a, 'b> Resolver<'a, 'b> {
    fn fail(&mut self, err: FatalError) {
        if self.result.is_ok() {
            self.result = Err(err);
        }
    }

    fn resolve_call(&mut self, callee: Expr, args: Vec<Arg>) -> SemaResult<Expr> {
        let span = callee.span.clone();
        match callee.kind {
            ExprKind::FunctionReference(decl) => {
                let params = self.arena.get(decl).callable().map(|c| c.params.clone()).unwrap_or_default();
                let resolved = overload::resolve_overload(self.arena, &[(decl, params)], &args, &span)?;
                let ret = self.arena.get(resolved).callable().map(|c| c.return_type.clone()).unwrap_or_else(Type::void);
                Ok(Expr::new(ExprKind::FunctionCall { callee: resolved, args }, span).with_type(ret))
            }
            ExprKind::MemberFunctionCall { object, callee: decl, .. } => {
                let struct_id = object
                    .value_type
                    .strip_reference()
                    .as_struct()
                    .ok_or_else(|| FatalError::internal(span.clone(), "member function call target is not a struct value"))?;
                let name = self.arena.get(decl).name().to_string();
                let candidates = member_function_candidates(self.arena, struct_id, &name);
                let resolved = overload::resolve_overload(self.arena, &candidates, &args, &span)?;
                let ret = self.arena.get(resolved).callable().map(|c| c.return_type.clone()).unwrap_or_else(Type::void);
                Ok(Expr::new(ExprKind::MemberFunctionCall { object, callee: resolved, args }, span).with_type(ret))
            }
            _ => Err(FatalError::new(ErrorCode::CannotConvert, span, "this expression is not callable")),
        }
    }

    fn resolve_assignment(&mut self, lhs: Expr, rhs: Expr, span: SourceSpan) -> SemaResult<Expr> {
        match lhs.kind {
            ExprKind::MemberPropertyRef { object, member } => properties::property_write(self.arena, Some(object), member, rhs, span),
            ExprKind::PropertyRef(member) => properties::property_write(self.arena, None, member, rhs, span),
            other => {
                let lhs = Expr { kind: other, ..lhs };
                Ok(Expr::new(ExprKind::Assignment { lhs: Box::new(lhs), rhs: Box::new(rhs) }, span).with_type(Type::void()))
            }
        }
    }

    fn transform(&mut self, expr: &mut Expr) -> SemaResult<()> {
        let span = expr.span.clone();
        let placeholder = ExprKind::CurrentSelf;
        match std::mem::replace(&mut expr.kind, placeholder) {
            ExprKind::Identifier(Identifier { name, span: ident_span }) => {
                *expr = identifiers::resolve_identifier(self.arena, &self.scope, &name, ident_span)?;
            }
            ExprKind::UnresolvedMemberAccess { object, member } => {
                *expr = identifiers::resolve_member_access(self.arena, *object, &member, span)?;
            }
            ExprKind::UnresolvedCall { callee, args } => {
                *expr = self.resolve_call(*callee, args)?;
            }
            ExprKind::Assignment { lhs, rhs } => {
                *expr = self.resolve_assignment(*lhs, *rhs, span)?;
            }
            ExprKind::Infix { op, lhs, rhs, decl: None } if is_assignment_op(&op) => {
                *expr = self.resolve_assignment(*lhs, *rhs, span)?;
            }
            ExprKind::Infix { op, lhs, rhs, decl: None } if is_compound_assignment_op(&op) => {
                *expr = operators::desugar_compound_assignment(self.arena, *lhs, &op, *rhs, span)?;
            }
            ExprKind::Infix { op, lhs, rhs, decl: None } => {
                *expr = operators::resolve_infix(self.arena, *lhs, &op, *rhs, span)?;
            }
            ExprKind::Prefix { op, operand, decl: None } => {
                *expr = operators::resolve_prefix(self.arena, &op, *operand, span)?;
            }
            ExprKind::Postfix { op, operand, decl: None } => {
                *expr = operators::resolve_postfix(self.arena, &op, *operand, span)?;
            }
            other => expr.kind = other,
        }
        Ok(())
    }
}

impl<'a, 'b> MutVisitor for Resolver<'a, 'b> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if self.result.is_err() {
            return;
        }

        // `TypeName(args)` must be told apart from a function call before
        // its callee is walked, since a bare struct name isn't a value
        // `identifiers::resolve_identifier` knows how to produce.
        if let ExprKind::UnresolvedCall { callee, .. } = &expr.kind {
            if let ExprKind::Identifier(ident) = &callee.kind {
                if let Some(struct_id) = lookup_struct_name(self.arena, &self.scope, &ident.name) {
                    let span = expr.span.clone();
                    let ExprKind::UnresolvedCall { mut args, .. } = std::mem::replace(&mut expr.kind, ExprKind::CurrentSelf) else {
                        unreachable!()
                    };
                    for a in &mut args {
                        self.visit_expr(&mut a.value);
                    }
                    if self.result.is_err() {
                        return;
                    }
                    match constructors::resolve_constructor_call(self.arena, struct_id, args, span) {
                        Ok(resolved) => *expr = resolved,
                        Err(e) => self.fail(e),
                    }
                    return;
                }
            }
        }

        walk_expr(self, expr);
        if self.result.is_err() {
            return;
        }
        if let Err(e) = self.transform(expr) {
            self.fail(e);
        }
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if self.result.is_err() {
            return;
        }
        walk_stmt(self, stmt);
    }
}
