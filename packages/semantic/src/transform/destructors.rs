//! Destructor-insertion bookkeeping (§4.8 step 2, step 6).
//!
//! Nothing here builds a destructor call node — that's the code generator's
//! job, working from the declarations a block already lists. What this pass
//! computes is *which* declarations a given exit point (`return`, `break`,
//! `continue`, `goto`) leaves behind, in teardown order, so the generator
//! doesn't have to re-derive it by walking every enclosing scope itself.
//! Order follows §4.8: a statement's own temporaries first (innermost,
//! reverse of declaration order), then locals innermost-to-outermost, then
//! parameters, then — inside a destructor body's own `return` — the
//! struct's directly-declared members.

use crate::ast::{DeclArena, DeclId, Type};

/// A by-value struct is the only thing with anything to destroy; references,
/// pointers and built-ins own nothing here.
pub fn is_destructible(ty: &Type) -> bool {
    ty.is_struct()
}

fn decl_type<'a>(arena: &'a DeclArena, decl: DeclId) -> Option<&'a Type> {
    use crate::ast::DeclKind;
    match &arena.get(decl).kind {
        DeclKind::Variable { ty, .. } | DeclKind::Parameter { ty, .. } => Some(ty),
        _ => None,
    }
}

/// Builds the deferred-destruction list for an exit point, innermost first:
/// the exiting statement's own temporaries (reverse creation order), then
/// `locals` and `params` (both reverse declaration order), then `members`
/// (reverse declaration order) for a destructor body's own `return`.
/// Declarations with nothing to destroy (references, builtins) are dropped.
pub fn deferred_list(arena: &DeclArena, stmt_temporaries: &[DeclId], locals: &[DeclId], params: &[DeclId], members: &[DeclId]) -> Vec<DeclId> {
    let mut out = Vec::new();
    for chunk in [stmt_temporaries, locals, params, members] {
        out.extend(chunk.iter().rev().copied().filter(|&d| decl_type(arena, d).map(is_destructible).unwrap_or(false)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, DeclKind, Identifier, TypeKind, VarKind};
    use crate::position::SourceSpan;

    fn local(arena: &mut DeclArena, name: &str, ty: Type) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Variable { ty, initializer: None, var_kind: VarKind::Local }))
    }

    fn struct_ty() -> Type {
        let mut arena = DeclArena::new();
        let s = arena.alloc(Decl::new(Identifier::synthetic("S"), SourceSpan::synthetic(), DeclKind::Struct(Default::default())));
        Type::new(TypeKind::Struct(s))
    }

    #[test]
    fn builtins_are_never_destructible() {
        assert!(!is_destructible(&Type::builtin("i32").unwrap()));
    }

    #[test]
    fn struct_values_are_destructible() {
        assert!(is_destructible(&struct_ty()));
    }

    #[test]
    fn reference_to_a_struct_is_not_destructible() {
        assert!(!is_destructible(&struct_ty().reference_to()));
    }

    #[test]
    fn deferred_list_is_innermost_first_and_filters_non_destructible() {
        let mut arena = DeclArena::new();
        let a = local(&mut arena, "a", struct_ty());
        let b = local(&mut arena, "b", Type::builtin("i32").unwrap());
        let c = local(&mut arena, "c", struct_ty());
        let list = deferred_list(&arena, &[], &[a, b, c], &[], &[]);
        assert_eq!(list, vec![c, a]);
    }
}
