//! Code transformer (C8, §4.8).
//!
//! The last pass before codegen: walks every callable body C7 left fully
//! resolved and, left to right in a single forward recursion, (1) captures
//! every non-void call-shaped expression's result into a temporary
//! (`temporaries`), (2) lowers virtual member calls outside their declaring
//! constructor/destructor to v-table dispatch, (3) validates that no `goto`
//! skips a variable declaration (`goto`), (4) fills in the `pre_*_deferred`
//! lists every early-exit statement already carries fields for
//! (`destructors`), and (5) either synthesizes a trailing `return;` for a
//! `void` callable that can fall off the end, or diagnoses `MissingReturn`
//! for one that isn't (`returns`). A single flat `locals` stack — pushed on
//! every `VariableDeclExpr`, truncated back on scope exit — is shared
//! across the whole walk, the same shape the statement-bool-return design
//! in the original pass used for "does this block return on every path."

pub mod destructors;
pub mod goto;
pub mod returns;
pub mod temporaries;

use crate::ast::{
    walk_expr, AstFile, DeclArena, DeclId, DeclKind, Expr, ExprKind, MutVisitor, Stmt, StmtKind, Type,
};
use crate::diagnostics::{ErrorCode, FatalError, SemaResult};
use crate::instantiate::structs;
use crate::validate::owned_children;
use goto::GotoValidator;

pub fn transform_file(arena: &mut DeclArena, file: &AstFile) -> SemaResult<()> {
    for &decl in &file.declarations {
        transform_decl(arena, decl)?;
    }
    Ok(())
}

fn transform_decl(arena: &mut DeclArena, decl: DeclId) -> SemaResult<()> {
    let instantiations: Option<Vec<DeclId>> = match &arena.get(decl).kind {
        DeclKind::TemplateFunction(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        DeclKind::TemplateStruct(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        DeclKind::TemplateTrait(t) => Some(t.instantiations.iter().map(|e| e.inst).chain(t.imaginary_inst).collect()),
        _ => None,
    };
    if let Some(insts) = instantiations {
        for inst in insts {
            transform_decl(arena, inst)?;
        }
        return Ok(());
    }

    if arena.get(decl).callable().is_some_and(|c| c.body.is_some()) {
        transform_callable_body(arena, decl)?;
    }

    for child in owned_children(arena.get(decl)) {
        transform_decl(arena, child)?;
    }
    Ok(())
}

fn owning_struct(arena: &DeclArena, container: Option<DeclId>) -> Option<DeclId> {
    container.filter(|&c| matches!(arena.get(c).kind, DeclKind::Struct(_)))
}

fn take_body(arena: &mut DeclArena, decl: DeclId) -> Option<Stmt> {
    arena.get_mut(decl).callable_mut().and_then(|c| c.body.take())
}

fn restore_body(arena: &mut DeclArena, decl: DeclId, body: Stmt) {
    if let Some(c) = arena.get_mut(decl).callable_mut() {
        c.body = Some(body);
    }
}

fn transform_callable_body(arena: &mut DeclArena, decl: DeclId) -> SemaResult<()> {
    let Some(mut body) = take_body(arena, decl) else { return Ok(()) };
    let d = arena.get(decl);
    let params = d.callable().map(|c| c.params.clone()).unwrap_or_default();
    let return_type = d.callable().map(|c| c.return_type.clone()).unwrap_or_else(Type::void);
    let is_destructor = matches!(d.kind, DeclKind::Destructor { .. });
    let is_ctor_or_dtor = matches!(d.kind, DeclKind::Constructor { .. } | DeclKind::Destructor { .. });
    let own_members = owning_struct(arena, d.container)
        .and_then(|s| arena.get(s).as_struct())
        .map(|s| s.members.clone())
        .unwrap_or_default();

    let mut transformer = Transformer {
        arena,
        locals: Vec::new(),
        params,
        is_ctor_or_dtor,
        is_destructor,
        own_members,
        break_stack: Vec::new(),
        continue_stack: Vec::new(),
        goto: GotoValidator::new(),
        current_sink: Vec::new(),
        temp_counter: 0,
    };
    transformer.process_function_body(&mut body, &return_type)?;

    restore_body(arena, decl, body);
    Ok(())
}

struct Transformer<'a> {
    arena: &'a mut DeclArena,
    locals: Vec<DeclId>,
    params: Vec<DeclId>,
    is_ctor_or_dtor: bool,
    is_destructor: bool,
    own_members: Vec<DeclId>,
    break_stack: Vec<usize>,
    continue_stack: Vec<usize>,
    goto: GotoValidator,
    current_sink: Vec<DeclId>,
    temp_counter: u32,
}

/// Matches `callee` to its v-table slot by name *and* signature (§4.6.3's
/// modulo-qualifier-and-reference rule, via
/// [`crate::instantiate::structs::params_match`]) — two virtual overloads
/// sharing a name in the same base would otherwise collide on the first
/// name match and lower a call to the wrong slot.
fn find_vtable_slot(arena: &DeclArena, struct_id: DeclId, callee: DeclId) -> Option<(DeclId, usize)> {
    let s = arena.get(struct_id).as_struct()?;
    let owner = s.vtable_owner?;
    let name = arena.get(callee).name();
    let callee_params = &arena.get(callee).callable()?.params;
    let slot = s.vtable.iter().position(|slot| {
        let target = arena.get(slot.function);
        target.name() == name && target.callable().map(|c| structs::params_match(arena, &c.params, callee_params)).unwrap_or(false)
    })?;
    Some((owner, slot))
}

impl<'a> Transformer<'a> {
    /// Capture/virtual-lowering are both infallible, so unlike the code
    /// processor's `Resolver` this visitor never needs a `self.result` sink
    /// to smuggle an error out of `MutVisitor`'s `()`-returning hooks.
    fn run_expr(&mut self, expr: &mut Expr) -> Vec<DeclId> {
        self.current_sink = Vec::new();
        self.visit_expr(expr);
        std::mem::take(&mut self.current_sink)
    }

    /// Lowers a `MemberFunctionCall` to a virtual method, outside its
    /// declaring constructor/destructor, into `VTableFunctionCall`
    /// (§4.8 step 7). Inside a constructor/destructor the static, direct
    /// call C7 already built is exactly the "exact declared type" dispatch
    /// the spec asks for, so there's nothing to rewrite there.
    fn lower_virtual_call(&mut self, expr: &mut Expr) {
        if self.is_ctor_or_dtor {
            return;
        }
        let ExprKind::MemberFunctionCall { callee, .. } = &expr.kind else { return };
        let target = self.arena.get(*callee);
        if !target.is_virtual() && !target.is_override() {
            return;
        }
        let Some(struct_id) = expr_object_struct(&expr.kind).and_then(|o| o.value_type.strip_reference().as_struct()) else { return };
        let Some((owner, slot)) = find_vtable_slot(self.arena, struct_id, *callee) else { return };
        let span = expr.span.clone();
        let ty = expr.value_type.clone();
        let placeholder = Expr::new(ExprKind::CurrentSelf, span.clone());
        let ExprKind::MemberFunctionCall { object, callee, args } = std::mem::replace(&mut expr.kind, placeholder.kind) else { unreachable!() };
        expr.kind = ExprKind::VTableFunctionCall { object, owner, slot, callee, args };
        expr.value_type = ty;
        expr.span = span;
    }

    fn process_variable_decl(&mut self, decl_id: DeclId, stmt: &mut Stmt) -> SemaResult<()> {
        let mut init = match &mut self.arena.get_mut(decl_id).kind {
            DeclKind::Variable { initializer, .. } => initializer.take(),
            _ => None,
        };
        if let Some(init_expr) = &mut init {
            let sink = self.run_expr(init_expr);
            stmt.temporary_values.extend(sink);
        }
        if let DeclKind::Variable { initializer, .. } = &mut self.arena.get_mut(decl_id).kind {
            *initializer = init;
        }
        self.locals.push(decl_id);
        Ok(())
    }

    fn member_list(&self) -> Vec<DeclId> {
        if self.is_destructor {
            self.own_members.clone()
        } else {
            Vec::new()
        }
    }

    fn process_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        match &mut stmt.kind {
            StmtKind::Compound { stmts } => {
                let depth = self.locals.len();
                for s in stmts.iter_mut() {
                    self.process_stmt(s)?;
                }
                self.locals.truncate(depth);
            }
            StmtKind::Expr(e) => {
                if let ExprKind::VariableDecl(decl_id) = &e.kind {
                    let decl_id = *decl_id;
                    self.process_variable_decl(decl_id, stmt)?;
                } else {
                    let sink = self.run_expr(e);
                    stmt.temporary_values.extend(sink);
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let sink = self.run_expr(cond);
                stmt.temporary_values.extend(sink);
                self.process_stmt(then_branch)?;
                if let Some(e) = else_branch {
                    self.process_stmt(e)?;
                }
            }
            StmtKind::While { cond, body } => {
                let sink = self.run_expr(cond);
                stmt.temporary_values.extend(sink);
                self.break_stack.push(self.locals.len());
                self.continue_stack.push(self.locals.len());
                self.process_stmt(body)?;
                self.break_stack.pop();
                self.continue_stack.pop();
            }
            StmtKind::DoWhile { body, cond } | StmtKind::RepeatWhile { body, cond } => {
                self.break_stack.push(self.locals.len());
                self.continue_stack.push(self.locals.len());
                self.process_stmt(body)?;
                self.break_stack.pop();
                self.continue_stack.pop();
                let sink = self.run_expr(cond);
                stmt.temporary_values.extend(sink);
            }
            StmtKind::For { init, cond, step, body } => {
                let depth = self.locals.len();
                if let Some(init) = init {
                    self.process_stmt(init)?;
                }
                if let Some(cond) = cond {
                    let sink = self.run_expr(cond);
                    stmt.temporary_values.extend(sink);
                }
                self.break_stack.push(self.locals.len());
                self.continue_stack.push(self.locals.len());
                self.process_stmt(body)?;
                self.break_stack.pop();
                self.continue_stack.pop();
                if let Some(step) = step {
                    let sink = self.run_expr(step);
                    stmt.temporary_values.extend(sink);
                }
                self.locals.truncate(depth);
            }
            StmtKind::Switch { value, cases } => {
                let sink = self.run_expr(value);
                stmt.temporary_values.extend(sink);
                self.break_stack.push(self.locals.len());
                for c in cases.iter_mut() {
                    self.process_stmt(c)?;
                }
                self.break_stack.pop();
            }
            StmtKind::Case { values, body } => {
                for v in values.iter_mut() {
                    let sink = self.run_expr(v);
                    stmt.temporary_values.extend(sink);
                }
                for s in body.iter_mut() {
                    self.process_stmt(s)?;
                }
            }
            StmtKind::Labeled { label, stmt: inner, local_count_at_label } => {
                *local_count_at_label = self.locals.len();
                let label = label.clone();
                self.goto.record_label(&label, self.locals.len())?;
                self.process_stmt(inner)?;
            }
            StmtKind::Goto { label, pre_goto_deferred } => {
                self.goto.record_goto(label, self.locals.len(), &stmt.span);
                *pre_goto_deferred = destructors::deferred_list(self.arena, &[], &self.locals, &[], &[]);
            }
            StmtKind::Break { pre_break_deferred } => {
                let depth = *self
                    .break_stack
                    .last()
                    .ok_or_else(|| FatalError::new(ErrorCode::BreakOutsideLoop, stmt.span.clone(), "`break` outside a loop or switch"))?;
                *pre_break_deferred = destructors::deferred_list(self.arena, &[], &self.locals[depth..], &[], &[]);
            }
            StmtKind::Continue { pre_continue_deferred } => {
                let depth = *self
                    .continue_stack
                    .last()
                    .ok_or_else(|| FatalError::new(ErrorCode::ContinueOutsideLoop, stmt.span.clone(), "`continue` outside a loop"))?;
                *pre_continue_deferred = destructors::deferred_list(self.arena, &[], &self.locals[depth..], &[], &[]);
            }
            StmtKind::Return { value, pre_return_deferred } => {
                if let Some(v) = value {
                    let sink = self.run_expr(v);
                    stmt.temporary_values.extend(sink);
                }
                let members = self.member_list();
                *pre_return_deferred = destructors::deferred_list(self.arena, &stmt.temporary_values, &self.locals, &self.params, &members);
            }
            StmtKind::Catch { body, .. } => self.process_stmt(body)?,
            StmtKind::DoCatch { body, catches } => {
                self.process_stmt(body)?;
                for c in catches.iter_mut() {
                    self.process_stmt(c)?;
                }
            }
            StmtKind::Fallthrough => {}
        }
        Ok(())
    }

    fn process_function_body(&mut self, body: &mut Stmt, return_type: &Type) -> SemaResult<()> {
        let depth = self.locals.len();
        let StmtKind::Compound { stmts } = &mut body.kind else {
            self.process_stmt(body)?;
            return self.finish_function_body(body, return_type, depth);
        };
        for s in stmts.iter_mut() {
            self.process_stmt(s)?;
        }
        self.finish_function_body(body, return_type, depth)
    }

    fn finish_function_body(&mut self, body: &mut Stmt, return_type: &Type, depth: usize) -> SemaResult<()> {
        if return_type.is_void() {
            if returns::falls_through(body) {
                let members = self.member_list();
                let deferred = destructors::deferred_list(self.arena, &[], &self.locals, &self.params, &members);
                returns::append_implicit_return(body, deferred);
            }
        } else if returns::falls_through(body) {
            self.locals.truncate(depth);
            return Err(returns::missing_return_error(body.span.clone()));
        }
        self.locals.truncate(depth);
        Ok(())
    }
}

fn expr_object_struct(kind: &ExprKind) -> Option<&Expr> {
    match kind {
        ExprKind::MemberFunctionCall { object, .. } => Some(object),
        _ => None,
    }
}

impl<'a> MutVisitor for Transformer<'a> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
        self.lower_virtual_call(expr);
        if temporaries::is_capturable(expr) {
            let span = expr.span.clone();
            let placeholder = Expr::new(ExprKind::CurrentSelf, span);
            let owned = std::mem::replace(expr, placeholder);
            let (temp_id, replaced) = temporaries::capture(self.arena, &mut self.temp_counter, owned);
            *expr = replaced;
            self.current_sink.push(temp_id);
        }
    }
}

#[cfg(test)]
mod slot_tests {
    use super::*;
    use crate::ast::{CallableDecl, Decl, Identifier, StructDecl, VTableSlot};
    use crate::position::SourceSpan;

    fn method(arena: &mut DeclArena, name: &str, params: Vec<DeclId>) -> DeclId {
        arena.alloc(Decl::new(Identifier::synthetic(name), SourceSpan::synthetic(), DeclKind::Function(CallableDecl::new(params, Type::void()))))
    }

    fn bool_param(arena: &mut DeclArena) -> DeclId {
        arena.alloc(Decl::new(
            Identifier::synthetic("loud"),
            SourceSpan::synthetic(),
            DeclKind::Parameter { ty: Type::builtin("bool").unwrap(), default_value: None, label: None, is_in: false },
        ))
    }

    #[test]
    fn slot_lookup_disambiguates_overloaded_virtual_methods_by_signature() {
        let mut arena = DeclArena::new();
        let quiet_speak = method(&mut arena, "speak", Vec::new());
        let loud_param = bool_param(&mut arena);
        let loud_speak = method(&mut arena, "speak", vec![loud_param]);
        let owner = arena.alloc(Decl::new(Identifier::synthetic("Animal"), SourceSpan::synthetic(), DeclKind::Struct(StructDecl::default())));
        let s = arena.alloc(Decl::new(
            Identifier::synthetic("Animal"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl {
                vtable: vec![VTableSlot { function: quiet_speak }, VTableSlot { function: loud_speak }],
                vtable_owner: Some(owner),
                ..StructDecl::default()
            }),
        ));

        let callee_param = bool_param(&mut arena);
        let callee = method(&mut arena, "speak", vec![callee_param]);
        let (found_owner, slot) = find_vtable_slot(&arena, s, callee).unwrap();
        assert_eq!(found_owner, owner);
        assert_eq!(slot, 1);
    }
}
