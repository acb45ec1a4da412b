//! Constructors and base-constructor calls (§4.7 "Constructors",
//! "Base-constructor calls").
//!
//! `TypeName(args)` resolves against the named struct's `constructors` the
//! same way a free-function call resolves against an overload set. Inside a
//! constructor body, a leading `base(args)`/`self(args)` statement picks a
//! base/delegating constructor the same way; if the body has neither and the
//! struct has a base with a visible default constructor, one is inserted so
//! every constructed object still runs its base's initialization (§4.6.5).

use crate::ast::{Arg, DeclArena, DeclId, Expr, ExprKind, Stmt, StmtKind, Type};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;
use crate::process::overload::resolve_overload;

/// `TypeName(args)` once `struct_id` and `args` are already resolved.
pub fn resolve_constructor_call(arena: &DeclArena, struct_id: DeclId, args: Vec<Arg>, span: SourceSpan) -> SemaResult<Expr> {
    let Some(s) = arena.get(struct_id).as_struct() else {
        return Err(FatalError::internal(span, "resolve_constructor_call target is not a struct"));
    };
    if s.constructors.is_empty() {
        return Err(FatalError::new(ErrorCode::NameNotFound, span, "this type declares no constructors"));
    }
    let candidates: Vec<(DeclId, Vec<DeclId>)> = s
        .constructors
        .iter()
        .map(|&c| (c, arena.get(c).callable().map(|cd| cd.params.clone()).unwrap_or_default()))
        .collect();
    let ctor = resolve_overload(arena, &candidates, &args, &span)?;
    Ok(Expr::new(ExprKind::ConstructorCall { ctor, args, object_ref: None }, span).with_type(Type::new(crate::ast::TypeKind::Struct(struct_id))))
}

/// `base(args)` or `self(args)` as the leading statement of a constructor
/// body. `target` is the base struct for `base(...)`, or `struct_id` itself
/// for a delegating `self(...)`.
pub fn resolve_leading_ctor_call(arena: &DeclArena, target: DeclId, args: Vec<Arg>, span: SourceSpan) -> SemaResult<Expr> {
    resolve_constructor_call(arena, target, args, span)
}

/// Finds the (unique, zero-argument-satisfiable) default constructor of
/// `struct_id`, if one exists and is visible.
fn default_constructor(arena: &DeclArena, struct_id: DeclId) -> Option<DeclId> {
    let s = arena.get(struct_id).as_struct()?;
    s.constructors.iter().copied().find(|&c| {
        arena
            .get(c)
            .callable()
            .map(|cd| cd.params.iter().all(|&p| matches!(&arena.get(p).kind, crate::ast::DeclKind::Parameter { default_value: Some(_), .. })))
            .unwrap_or(false)
    })
}

/// Whether a constructor body's first statement is already a leading
/// `base(...)`/`self(...)` call — recognized, pre-resolution, as an
/// `ExprKind::UnresolvedCall` whose callee is the literal identifier `base`
/// or `self`.
fn has_leading_ctor_call(body: &Stmt) -> bool {
    let StmtKind::Compound { stmts } = &body.kind else { return false };
    let Some(first) = stmts.first() else { return false };
    let StmtKind::Expr(e) = &first.kind else { return false };
    matches!(&e.kind, ExprKind::ConstructorCall { .. })
        || matches!(&e.kind, ExprKind::UnresolvedCall { callee, .. } if matches!(&callee.kind, ExprKind::Identifier(id) if id.name == "base" || id.name == "self"))
}

/// If `struct_id`'s constructor body has no explicit leading `base`/`self`
/// call and its base struct has a default constructor, prepend one (§4.6.5's
/// "implicit default-base-ctor insertion").
pub fn insert_implicit_base_call(arena: &DeclArena, struct_id: DeclId, body: &mut Stmt) -> SemaResult<()> {
    if has_leading_ctor_call(body) {
        return Ok(());
    }
    let Some(base_struct) = arena.get(struct_id).as_struct().and_then(|s| s.base_struct) else {
        return Ok(());
    };
    let Some(ctor) = default_constructor(arena, base_struct) else {
        return Ok(());
    };
    let span = body.span.clone();
    let call = Expr::new(ExprKind::ConstructorCall { ctor, args: Vec::new(), object_ref: None }, span.clone())
        .with_type(Type::new(crate::ast::TypeKind::Struct(base_struct)));
    let stmt = Stmt::new(StmtKind::Expr(call), span);
    if let StmtKind::Compound { stmts } = &mut body.kind {
        stmts.insert(0, stmt);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableDecl, CtorKind, Decl, DeclKind, Identifier, StructDecl, SynthesisState};

    fn ctor(arena: &mut DeclArena, params: Vec<DeclId>) -> DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic("ctor"),
            SourceSpan::synthetic(),
            DeclKind::Constructor { callable: CallableDecl::new(params, Type::void()), ctor_kind: CtorKind::Normal, state: SynthesisState::UserProvided },
        ))
    }

    #[test]
    fn constructor_call_resolves_against_the_struct_overload_set() {
        let mut arena = DeclArena::new();
        let zero_arg = ctor(&mut arena, vec![]);
        let struct_id = arena.alloc(Decl::new(
            Identifier::synthetic("Widget"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { constructors: vec![zero_arg], ..StructDecl::default() }),
        ));
        let expr = resolve_constructor_call(&arena, struct_id, vec![], SourceSpan::synthetic()).unwrap();
        assert!(matches!(expr.kind, ExprKind::ConstructorCall { ctor, .. } if ctor == zero_arg));
    }

    #[test]
    fn struct_with_no_constructors_is_rejected() {
        let mut arena = DeclArena::new();
        let struct_id = arena.alloc(Decl::new(Identifier::synthetic("Widget"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        assert!(resolve_constructor_call(&arena, struct_id, vec![], SourceSpan::synthetic()).is_err());
    }

    #[test]
    fn default_base_ctor_is_inserted_when_body_has_no_leading_call() {
        let mut arena = DeclArena::new();
        let base_ctor = ctor(&mut arena, vec![]);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { constructors: vec![base_ctor], ..StructDecl::default() }),
        ));
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { base_struct: Some(base), ..StructDecl::default() }),
        ));
        let mut body = Stmt::new(StmtKind::Compound { stmts: vec![] }, SourceSpan::synthetic());
        insert_implicit_base_call(&arena, derived, &mut body).unwrap();
        let StmtKind::Compound { stmts } = &body.kind else { unreachable!() };
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0].kind, StmtKind::Expr(e) if matches!(e.kind, ExprKind::ConstructorCall { ctor, .. } if ctor == base_ctor)));
    }

    #[test]
    fn explicit_leading_call_suppresses_the_implicit_insertion() {
        let mut arena = DeclArena::new();
        let base_ctor = ctor(&mut arena, vec![]);
        let base = arena.alloc(Decl::new(
            Identifier::synthetic("Shape"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { constructors: vec![base_ctor], ..StructDecl::default() }),
        ));
        let derived = arena.alloc(Decl::new(
            Identifier::synthetic("Circle"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { base_struct: Some(base), ..StructDecl::default() }),
        ));
        let explicit_call = Expr::new(ExprKind::ConstructorCall { ctor: base_ctor, args: vec![], object_ref: None }, SourceSpan::synthetic());
        let mut body = Stmt::new(StmtKind::Compound { stmts: vec![Stmt::new(StmtKind::Expr(explicit_call), SourceSpan::synthetic())] }, SourceSpan::synthetic());
        insert_implicit_base_call(&arena, derived, &mut body).unwrap();
        let StmtKind::Compound { stmts } = &body.kind else { unreachable!() };
        assert_eq!(stmts.len(), 1);
    }
}
