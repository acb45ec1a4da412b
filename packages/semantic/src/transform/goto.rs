//! Goto validation (§4.8 step 4).
//!
//! The only thing a `goto` can get wrong here is jumping *forward* past a
//! variable declaration the label's side of the jump expects to already be
//! initialized. A single forward walk with a shared local-count stack makes
//! this a direct comparison: record the live local count when a `goto` is
//! visited, and when its label is later visited, a label-side count greater
//! than the goto's recorded count means declarations were skipped. A
//! backward jump (label already visited before the matching `goto`) never
//! skips anything — the label's recorded count is necessarily smaller than
//! or equal to whatever is live at the `goto`, because the walk only ever
//! pushes locals between them.

use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::position::SourceSpan;

#[derive(Debug, Default)]
pub struct GotoValidator {
    seen_labels: Vec<(String, usize)>,
    pending: Vec<(String, usize, SourceSpan)>,
}

impl GotoValidator {
    pub fn new() -> Self {
        GotoValidator::default()
    }

    /// Call when a `goto label;` is visited, with the live local count at
    /// that point. A backward jump (label already seen) needs no check.
    pub fn record_goto(&mut self, label: &str, live_locals: usize, span: &SourceSpan) {
        if self.seen_labels.iter().any(|(l, _)| l == label) {
            return;
        }
        self.pending.push((label.to_string(), live_locals, span.clone()));
    }

    /// Call when `label:` is visited, with the live local count at that
    /// point. Resolves every still-pending forward `goto` to this label.
    pub fn record_label(&mut self, label: &str, live_locals: usize) -> SemaResult<()> {
        self.seen_labels.push((label.to_string(), live_locals));
        let mut remaining = Vec::new();
        for (l, goto_count, span) in self.pending.drain(..) {
            if l == label {
                if live_locals > goto_count {
                    return Err(FatalError::new(
                        ErrorCode::GotoSkipsDeclaration,
                        span,
                        format!("goto to `{}` skips a variable declaration", label),
                    ));
                }
            } else {
                remaining.push((l, goto_count, span));
            }
        }
        self.pending = remaining;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_goto_past_a_declaration_is_rejected() {
        let mut v = GotoValidator::new();
        v.record_goto("done", 0, &SourceSpan::synthetic());
        assert!(v.record_label("done", 1).is_err());
    }

    #[test]
    fn forward_goto_to_the_same_scope_depth_is_accepted() {
        let mut v = GotoValidator::new();
        v.record_goto("done", 1, &SourceSpan::synthetic());
        assert!(v.record_label("done", 1).is_ok());
    }

    #[test]
    fn backward_goto_is_never_rejected() {
        let mut v = GotoValidator::new();
        assert!(v.record_label("top", 2).is_ok());
        // the label was already seen, so this is a no-op: nothing pending
        // to ever reject.
        v.record_goto("top", 0, &SourceSpan::synthetic());
        assert!(v.pending.is_empty());
    }
}
