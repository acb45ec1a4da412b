//! Pipeline driver (C10, §4.11).
//!
//! Owns nothing across runs — a fresh [`DiagnosticSink`] per call, mutating
//! a caller-owned [`DeclArena`] in place — and threads a parsed batch
//! through every component in the fixed order §5 mandates: C3 and C4 are
//! inherently cross-file (the namespace merge and import resolution need
//! every file's scaffolding visible at once), so they run once over the
//! whole batch; C5 through C8 observe no other file's in-progress state,
//! so each runs per file, in file order. The first `FatalError` from any
//! file wins and aborts the run — per §4.10, there is no cross-pass or
//! cross-file recovery.
//!
//! Grounded on the teacher's top-level `compile()` phase sequencing
//! (`packages/compiler-cli`'s program driver): a single entry point owning
//! the run's mutable state and calling each phase in a fixed order, rather
//! than a trait-object pass list a caller assembles itself.
//!
//! **On `rayon`.** §5 notes that C5 through C8's per-file work is
//! embarrassingly parallel in principle once C3/C4 have fixed the shared
//! namespace tree, and the teacher's manifest already carries `rayon` for
//! exactly this shape of fan-out. This crate's `SourceSpan` ([`position`])
//! holds an `Rc<SourceFile>` rather than an `Arc` — cheap to clone on every
//! node (every `Expr`/`Stmt`/`Decl` carries one) in a pipeline that's
//! single-threaded by construction (§5: "single-threaded, cooperative"),
//! which is what every pass up through C8 actually is. `Rc` is neither
//! `Send` nor `Sync`, so `DeclArena` cannot cross a `rayon` thread boundary
//! without first switching every span to `Arc` — a C1 data-model change
//! with no other motivation than this one driver function. `rayon` is
//! dropped as an unused dependency rather than wired up against data it
//! cannot touch; see DESIGN.md.

use crate::ast::{AstFile, DeclArena};
use crate::diagnostics::{Diagnostic, DiagnosticSink, SemaResult};
use crate::instantiate;
use crate::namespace::{self, NamespaceTable};
use crate::process;
use crate::resolve_types;
use crate::target::TargetDescriptor;
use crate::transform;
use crate::validate;

/// Everything a caller gets back from a successful run: the namespace
/// table (a code generator or IDE integration may still want to resolve a
/// dotted path against it) and whatever non-fatal warnings piled up.
pub struct PipelineOutput {
    pub namespaces: NamespaceTable,
    pub warnings: Vec<Diagnostic>,
}

/// Run C3 through C8 over `files` against `arena`, mutating every
/// declaration `files` reaches in place. `arena` must already hold every
/// `Decl` each `AstFile`'s `DeclId`s point into — this crate never parses
/// source text itself (§6.1: that's upstream of C1).
pub fn run_pipeline(arena: &mut DeclArena, files: &[AstFile], target: &TargetDescriptor) -> SemaResult<PipelineOutput> {
    let mut sink = DiagnosticSink::new();

    // C3: cross-file namespace merge.
    let namespaces = namespace::build_namespace_prototypes(arena, files);

    // C4: cross-file container linking and import resolution.
    validate::validate_declarations(arena, files, &namespaces, &mut sink);

    // C5: per-file, but run sequentially — a file's own `Unresolved` names
    // may bind against a sibling file's top-level declarations (§4.4), so
    // nothing here is actually independent until C5 has seen every file.
    for file in files {
        resolve_types::resolve_file_types(arena, file, &namespaces, &mut sink);
    }

    // C6, sweep one: ground every `Templated` type reference C5 produced,
    // across the whole batch, before any struct is laid out (a base class
    // declared in another file must already have ground member types).
    for file in files {
        instantiate::resolve_templated_types_file(arena, target, file, &mut sink)?;
    }
    // C6, sweep two: lay out every plain struct/trait and build every
    // template's imaginary instantiation. Order across files no longer
    // matters — `process_struct_chain` resolves an unprocessed base itself.
    for file in files {
        instantiate::instantiate_structs_file(arena, target, file, &mut sink)?;
    }

    // C7 and C8: no file's body-processing or transform pass reads another
    // file's in-progress state once C3-C6 have fixed the shared namespace
    // tree and every declaration's layout. In principle this is per-file
    // independent work; in practice `Decl` is not `Send`, so it runs
    // sequentially over one shared `&mut DeclArena` (see the module doc).
    for file in files {
        process::process_file_bodies(arena, file, &namespaces)?;
        transform::transform_file(arena, file)?;
    }

    Ok(PipelineOutput { namespaces, warnings: sink.warnings().to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CallableDecl, Decl, DeclKind, Identifier, StructDecl, Type, VarKind};
    use crate::diagnostics::FatalError;
    use crate::position::SourceSpan;

    #[test]
    fn an_ordinary_struct_gets_laid_out_without_ever_being_named_generically() {
        let mut arena = DeclArena::new();
        let field = arena.alloc(Decl::new(
            Identifier::synthetic("x"),
            SourceSpan::synthetic(),
            DeclKind::Variable { ty: Type::builtin("i32").unwrap(), initializer: None, var_kind: VarKind::Member },
        ));
        let s = arena.alloc(Decl::new(
            Identifier::synthetic("Point"),
            SourceSpan::synthetic(),
            DeclKind::Struct(StructDecl { members: vec![field], ..StructDecl::default() }),
        ));
        let file = AstFile { declarations: vec![s], ..AstFile::new(0, "a.lang") };

        let output = run_pipeline(&mut arena, &[file], &TargetDescriptor::host()).unwrap();
        assert!(output.warnings.is_empty());
        let sd = arena.get(s).as_struct().unwrap();
        assert_eq!(sd.data_size_with_padding, 4);
        assert_eq!(sd.constructors.len(), 3);
    }

    #[test]
    fn a_function_missing_a_return_on_every_path_is_a_fatal_error() {
        use crate::ast::{Stmt, StmtKind};

        let mut arena = DeclArena::new();
        let body = Stmt::new(StmtKind::Compound { stmts: vec![] }, SourceSpan::synthetic());
        let mut callable = CallableDecl::new(Vec::new(), Type::builtin("i32").unwrap());
        callable.body = Some(body);
        let f = arena.alloc(Decl::new(Identifier::synthetic("f"), SourceSpan::synthetic(), DeclKind::Function(callable)));
        let file = AstFile { declarations: vec![f], ..AstFile::new(0, "a.lang") };

        let err = run_pipeline(&mut arena, &[file], &TargetDescriptor::host());
        assert!(matches!(err, Err(FatalError(d)) if d.code == crate::diagnostics::ErrorCode::MissingReturn));
    }
}
