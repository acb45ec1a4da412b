//! The `Stmt` sum type (§3.1).

use super::expr::Expr;
use super::ids::DeclId;
use crate::position::SourceSpan;

#[derive(Debug, Clone)]
pub enum StmtKind {
    Break { pre_break_deferred: Vec<DeclId> },
    Case { values: Vec<Expr>, body: Vec<Stmt> },
    Catch { bound: Option<DeclId>, body: Box<Stmt> },
    Compound { stmts: Vec<Stmt> },
    Continue { pre_continue_deferred: Vec<DeclId> },
    DoCatch { body: Box<Stmt>, catches: Vec<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Expr },
    Fallthrough,
    For { init: Option<Box<Stmt>>, cond: Option<Expr>, step: Option<Expr>, body: Box<Stmt> },
    Goto { label: String, pre_goto_deferred: Vec<DeclId> },
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    Labeled { label: String, stmt: Box<Stmt>, local_count_at_label: usize },
    RepeatWhile { body: Box<Stmt>, cond: Expr },
    Return { value: Option<Expr>, pre_return_deferred: Vec<DeclId> },
    Switch { value: Expr, cases: Vec<Stmt> },
    While { cond: Expr, body: Box<Stmt> },
    Expr(Expr),
}

/// Every statement carries its own `temporary_values`, populated by the
/// code transformer (C8) — the home for call-result temporaries that live
/// for the lifetime of this one statement (§4.8 step 1).
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: SourceSpan,
    pub temporary_values: Vec<DeclId>,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: SourceSpan) -> Self {
        Stmt { kind, span, temporary_values: Vec::new() }
    }

    pub fn compound(stmts: Vec<Stmt>, span: SourceSpan) -> Self {
        Stmt::new(StmtKind::Compound { stmts }, span)
    }

    /// Does this statement terminate control flow unconditionally (used by
    /// the return-completeness check, §4.8 step 5)?
    pub fn always_exits(&self) -> bool {
        match &self.kind {
            StmtKind::Return { .. } => true,
            StmtKind::Compound { stmts } => stmts.last().map(Stmt::always_exits).unwrap_or(false),
            StmtKind::If { then_branch, else_branch: Some(else_branch), .. } => {
                then_branch.always_exits() && else_branch.always_exits()
            }
            _ => false,
        }
    }
}
