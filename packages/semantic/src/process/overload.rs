//! Overload resolution (§4.7 "Overload resolution").
//!
//! Candidates are scored the same way §4.6.1 scores template candidates —
//! per-position strength, strongest tier wins, a tie is a diagnostic — but
//! against call arguments and parameter declarations instead of template
//! parameters and type arguments. Kept as its own small ranking rather than
//! reusing [`crate::instantiate::templates`] directly since the element type
//! (call argument vs. template argument) and the rejection rules (argument
//! labels, `in` parameters) differ.

use crate::ast::{Arg, DeclArena, DeclKind};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;
use crate::process::conversions::{conversion_distance, same_underlying};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Match,
    DefaultValues,
    Castable(u32),
}

/// Score one candidate's parameter list against the call-site arguments.
/// `None` means the candidate is rejected outright: wrong argument count,
/// a label mismatch, or a positional argument with no implicit path to its
/// parameter's type.
pub fn match_strength(arena: &DeclArena, params: &[crate::ast::DeclId], args: &[Arg]) -> Option<SmallVec<[MatchKind; 4]>> {
    if args.len() > params.len() {
        return None;
    }
    let mut out = SmallVec::new();
    for (i, &param) in params.iter().enumerate() {
        let DeclKind::Parameter { ty: param_ty, default_value, label, .. } = &arena.get(param).kind else {
            return None;
        };
        match args.get(i) {
            None => match default_value {
                Some(_) => out.push(MatchKind::DefaultValues),
                None => return None,
            },
            Some(arg) => {
                if let (Some(arg_label), Some(param_label)) = (&arg.label, label) {
                    if arg_label != param_label {
                        return None;
                    }
                }
                let arg_ty = &arg.value.value_type;
                if same_underlying(arg_ty, param_ty) {
                    out.push(MatchKind::Match);
                } else {
                    match conversion_distance(arena, arg_ty, param_ty) {
                        Some(dist) => out.push(MatchKind::Castable(dist)),
                        None => return None,
                    }
                }
            }
        }
    }
    Some(out)
}

/// Left-prioritized comparison, identical in shape to
/// [`crate::instantiate::templates::pick_strongest`]: the first differing
/// position decides; an exact tie across every position is ambiguous.
pub fn pick_strongest(candidates: Vec<(crate::ast::DeclId, SmallVec<[MatchKind; 4]>)>) -> Result<crate::ast::DeclId, Vec<crate::ast::DeclId>> {
    let mut best: Option<(crate::ast::DeclId, &SmallVec<[MatchKind; 4]>)> = None;
    let mut tied = Vec::new();
    for (id, strengths) in &candidates {
        match &best {
            None => best = Some((*id, strengths)),
            Some((_, current_best)) => match compare(strengths, current_best) {
                std::cmp::Ordering::Less => {
                    tied.clear();
                    best = Some((*id, strengths));
                }
                std::cmp::Ordering::Equal => tied.push(*id),
                std::cmp::Ordering::Greater => {}
            },
        }
    }
    match best {
        Some((id, _)) if tied.is_empty() => Ok(id),
        Some((id, _)) => {
            tied.push(id);
            Err(tied)
        }
        None => Err(Vec::new()),
    }
}

fn compare(a: &[MatchKind], b: &[MatchKind]) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b) {
        if x != y {
            return x.cmp(y);
        }
    }
    std::cmp::Ordering::Equal
}

/// Resolve a call site's candidate list (free functions, member functions,
/// operators, constructors, subscripts — §4.7) to exactly one declaration.
/// `candidates` pairs each candidate with the parameter list to score it
/// against, since that list is fetched differently per `DeclKind`.
pub fn resolve_overload(
    arena: &DeclArena,
    candidates: &[(crate::ast::DeclId, Vec<crate::ast::DeclId>)],
    args: &[Arg],
    span: &SourceSpan,
) -> SemaResult<crate::ast::DeclId> {
    let scored: Vec<_> = candidates
        .iter()
        .filter_map(|(id, params)| match_strength(arena, params, args).map(|s| (*id, s)))
        .collect();
    if scored.is_empty() {
        return Err(FatalError::new(ErrorCode::NameNotFound, span.clone(), "no overload accepts these arguments"));
    }
    pick_strongest(scored).map_err(|_| FatalError::new(ErrorCode::AmbiguousName, span.clone(), "call is ambiguous between multiple overloads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, DeclArena, DeclKind, Expr, ExprKind, Identifier, Type};

    fn param(arena: &mut DeclArena, ty: Type, default: Option<Expr>) -> crate::ast::DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic("p"),
            SourceSpan::synthetic(),
            DeclKind::Parameter { ty, default_value: default, label: None, is_in: false },
        ))
    }

    fn int_arg(value: i128, ty: Type) -> Arg {
        Arg { label: None, value: Expr::new(ExprKind::ValueLiteral(crate::ast::LiteralValue::Int(value)), SourceSpan::synthetic()).with_type(ty) }
    }

    #[test]
    fn exact_type_match_scores_as_match() {
        let mut arena = DeclArena::new();
        let p = param(&mut arena, Type::builtin("i32").unwrap(), None);
        let args = vec![int_arg(1, Type::builtin("i32").unwrap())];
        let strength = match_strength(&arena, &[p], &args).unwrap();
        assert_eq!(strength.as_slice(), &[MatchKind::Match]);
    }

    #[test]
    fn widening_argument_scores_as_castable() {
        let mut arena = DeclArena::new();
        let p = param(&mut arena, Type::builtin("i64").unwrap(), None);
        let args = vec![int_arg(1, Type::builtin("i32").unwrap())];
        let strength = match_strength(&arena, &[p], &args).unwrap();
        assert!(matches!(strength.as_slice(), [MatchKind::Castable(_)]));
    }

    #[test]
    fn missing_trailing_arg_with_default_is_accepted() {
        let mut arena = DeclArena::new();
        let default = Expr::new(ExprKind::ValueLiteral(crate::ast::LiteralValue::Int(0)), SourceSpan::synthetic());
        let p = param(&mut arena, Type::builtin("i32").unwrap(), Some(default));
        let strength = match_strength(&arena, &[p], &[]).unwrap();
        assert_eq!(strength.as_slice(), &[MatchKind::DefaultValues]);
    }

    #[test]
    fn missing_required_arg_rejects_the_candidate() {
        let mut arena = DeclArena::new();
        let p = param(&mut arena, Type::builtin("i32").unwrap(), None);
        assert!(match_strength(&arena, &[p], &[]).is_none());
    }

    #[test]
    fn exact_match_beats_castable_at_resolution() {
        let mut arena = DeclArena::new();
        let exact = param(&mut arena, Type::builtin("i32").unwrap(), None);
        let wide = param(&mut arena, Type::builtin("i64").unwrap(), None);
        let exact_fn = arena.alloc(Decl::new(
            Identifier::synthetic("f"),
            SourceSpan::synthetic(),
            DeclKind::Function(crate::ast::CallableDecl::new(vec![exact], Type::void())),
        ));
        let wide_fn = arena.alloc(Decl::new(
            Identifier::synthetic("f"),
            SourceSpan::synthetic(),
            DeclKind::Function(crate::ast::CallableDecl::new(vec![wide], Type::void())),
        ));
        let args = vec![int_arg(1, Type::builtin("i32").unwrap())];
        let candidates = vec![(wide_fn, vec![wide]), (exact_fn, vec![exact])];
        assert_eq!(resolve_overload(&arena, &candidates, &args, &SourceSpan::synthetic()).unwrap(), exact_fn);
    }
}
