//! langc's semantic middle: type resolution, generic instantiation,
//! overload resolution, destructor insertion and control-flow validation.
//!
//! Passes run in this order: [`namespace`] (C3) builds the cross-file lookup
//! tables, [`validate`] (C4) checks the raw AST is internally consistent
//! against them, [`resolve_types`] (C5) turns syntactic type references into
//! `DeclId`s, [`instantiate`] (C6) expands templates and computes layout,
//! [`process`] (C7) resolves every callable body's names/calls/operators,
//! and [`transform`] (C8) captures temporaries, lowers virtual calls to
//! v-table dispatch, and inserts destructors. [`contracts`] and [`target`]
//! are shared utilities the later passes call into rather than passes of
//! their own. [`pipeline`] (C10) is the single entry point that drives all
//! of the above over a parsed batch in the right order.

pub mod ast;
pub mod contracts;
pub mod diagnostics;
pub mod instantiate;
pub mod namespace;
pub mod pipeline;
pub mod position;
pub mod process;
pub mod resolve_types;
pub mod target;
pub mod transform;
pub mod validate;
