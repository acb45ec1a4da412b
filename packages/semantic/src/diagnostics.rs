//! Diagnostic taxonomy and the fatal-first-error sink.
//!
//! Adapted from the teacher's `FatalDiagnosticError`/`ErrorCode` pair
//! (`ngtsc/diagnostics/src/error.rs`, `error_code.rs`): a diagnostic owns an
//! [`ErrorCode`], a source span, and a message, and implements
//! [`std::error::Error`] so it can be threaded through `Result` instead of
//! being thrown and caught. Unlike the teacher (which mixes TS diagnostic
//! categories with ts-compiler bridging), every error here is one of the
//! kinds enumerated in the specification's error-handling section, and
//! warnings are tracked separately so they never abort compilation.

use crate::position::SourceSpan;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lookup failures
    NameNotFound,
    AmbiguousName,
    VisibilityViolation,
    // Type mismatches
    CannotConvert,
    QualifierMismatch,
    ReferenceLifetimeMisuse,
    // Template failures
    TemplateArgCount,
    TemplateArgKind,
    WhereContractUnsatisfied,
    HasContractUnsatisfied,
    AmbiguousTemplateMatch,
    // Structural errors
    CircularInheritance,
    CircularValueComposition,
    // Override/virtual errors
    OverrideMatchesNothing,
    MissingOverride,
    DeletedConstructorUse,
    // Control-flow errors
    MissingReturn,
    GotoSkipsDeclaration,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    UninitializedLocal,
    // Constant-expression errors
    NonConstInConstContext,
    UnsupportedConstOperation,
    // Internal errors (a §3.3 invariant failed)
    Internal,
}

impl ErrorCode {
    pub fn is_internal(self) -> bool {
        matches!(self, ErrorCode::Internal)
    }
}

/// A single diagnostic: file/position range plus a human-readable message.
/// Matches §7: "Every diagnostic carries a file path, a line/column range,
/// and a human-readable message."
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub span: SourceSpan,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, span: SourceSpan, message: impl Into<String>) -> Self {
        Diagnostic { code, span, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.code.is_internal() { "[INTERNAL] " } else { "" };
        write!(f, "{}{}: {}{}", self.span, prefix, self.message, "")
    }
}

/// A diagnostic fatal to the current translation unit. Every semantic pass
/// returns `Result<T, FatalError>`; there is no cross-pass recovery, so the
/// first `Err` unwinds straight out of the pipeline (§4.10, §7).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FatalError(pub Diagnostic);

impl FatalError {
    pub fn new(code: ErrorCode, span: SourceSpan, message: impl Into<String>) -> Self {
        FatalError(Diagnostic::new(code, span, message))
    }

    pub fn internal(span: SourceSpan, message: impl Into<String>) -> Self {
        FatalError(Diagnostic::new(ErrorCode::Internal, span, message))
    }
}

pub type SemaResult<T> = Result<T, FatalError>;

/// Accumulates warnings across a run; does not abort compilation. A fatal
/// diagnostic is never pushed here — it propagates as an `Err` instead.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    warnings: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, code: ErrorCode, span: SourceSpan, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(code, span, message));
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use crate::position::{SourceFile, TextPosition};

    fn span() -> SourceSpan {
        let file = Rc::new(SourceFile { id: 0, path: "a.lang".into() });
        SourceSpan::new(file, TextPosition::new(0, 1, 1), TextPosition::new(1, 1, 2))
    }

    #[test]
    fn internal_errors_are_prefixed() {
        let err = FatalError::internal(span(), "vtable missing owner");
        assert!(err.to_string().contains("[INTERNAL]"));
    }

    #[test]
    fn warnings_do_not_abort() {
        let mut sink = DiagnosticSink::new();
        sink.warn(ErrorCode::VisibilityViolation, span(), "unused import");
        assert_eq!(sink.warnings().len(), 1);
    }
}
