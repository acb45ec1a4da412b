//! Return completeness (§4.8 step 5) and the implicit `void` return (step 3).
//!
//! `Stmt::always_exits` already answers "does every path through this
//! statement end in a `return`" — this module is just the two decisions
//! that answer drives: a non-`void` callable whose body doesn't always exit
//! is a diagnostic, a `void` one gets a synthesized trailing `return;` so
//! every callable ends in an explicit exit a deferred-destruction list can
//! be attached to.

use crate::ast::{DeclId, Stmt, StmtKind};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;

/// Whether `body` needs a synthesized trailing `return;` appended: it's
/// only meaningful to call this once the caller has already confirmed the
/// callable returns `void` (a non-`void` callable that falls through is
/// `MissingReturn`, not a candidate for synthesis).
pub fn falls_through(body: &Stmt) -> bool {
    !body.always_exits()
}

pub fn missing_return_error(span: SourceSpan) -> FatalError {
    FatalError::new(ErrorCode::MissingReturn, span, "not every path through this function returns a value")
}

/// Appends `return;` (with `pre_return_deferred` already filled in by the
/// caller) to a `void` callable's body when it can fall off the end.
pub fn append_implicit_return(body: &mut Stmt, pre_return_deferred: Vec<DeclId>) {
    let span = body.span.clone();
    let stmt = Stmt::new(StmtKind::Return { value: None, pre_return_deferred }, span.clone());
    match &mut body.kind {
        StmtKind::Compound { stmts } => stmts.push(stmt),
        _ => {
            let placeholder = Stmt::new(StmtKind::Fallthrough, span.clone());
            let old = std::mem::replace(body, placeholder);
            *body = Stmt::new(StmtKind::Compound { stmts: vec![old, stmt] }, span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn ret(span: SourceSpan) -> Stmt {
        Stmt::new(StmtKind::Return { value: None, pre_return_deferred: Vec::new() }, span)
    }

    #[test]
    fn a_bare_compound_falls_through() {
        let body = Stmt::new(StmtKind::Compound { stmts: vec![] }, SourceSpan::synthetic());
        assert!(falls_through(&body));
    }

    #[test]
    fn a_compound_ending_in_return_does_not() {
        let body = Stmt::new(StmtKind::Compound { stmts: vec![ret(SourceSpan::synthetic())] }, SourceSpan::synthetic());
        assert!(!falls_through(&body));
    }

    #[test]
    fn implicit_return_is_appended_to_a_falling_through_compound() {
        let mut body = Stmt::new(StmtKind::Compound { stmts: vec![] }, SourceSpan::synthetic());
        append_implicit_return(&mut body, Vec::new());
        let StmtKind::Compound { stmts } = &body.kind else { unreachable!() };
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0].kind, StmtKind::Return { .. }));
    }

    #[test]
    fn non_compound_bodies_are_wrapped_before_appending() {
        let mut body = Stmt::new(StmtKind::Expr(Expr::new(crate::ast::ExprKind::CurrentSelf, SourceSpan::synthetic())), SourceSpan::synthetic());
        append_implicit_return(&mut body, Vec::new());
        let StmtKind::Compound { stmts } = &body.kind else { unreachable!() };
        assert_eq!(stmts.len(), 2);
    }
}
