//! Basic declaration validator (C4, §4.3).
//!
//! A single pass over every file's declaration tree: sets `container`
//! back-pointers, resolves `ImportDecl` against the C3 prototype tree, and
//! flags same-name/same-signature duplicates within one container. Does not
//! touch `Type`s or `Expr`s — that starts at C5.

use crate::ast::{AstFile, Decl, DeclArena, DeclId, DeclKind};
use crate::diagnostics::{DiagnosticSink, ErrorCode};
use crate::namespace::NamespaceTable;
use std::collections::HashMap;

pub fn validate_declarations(
    arena: &mut DeclArena,
    files: &[AstFile],
    namespaces: &NamespaceTable,
    sink: &mut DiagnosticSink,
) {
    for file in files {
        for &decl in &file.declarations {
            link_containers(arena, decl, None);
        }
        for &import in &file.imports {
            resolve_import(arena, import, namespaces, sink);
        }
    }
    for file in files {
        for &decl in &file.declarations {
            detect_duplicates(arena, decl, sink);
        }
    }
}

/// Recursively sets `container` on `decl` and everything it owns.
fn link_containers(arena: &mut DeclArena, decl: DeclId, container: Option<DeclId>) {
    arena.get_mut(decl).container = container;

    let children = owned_children(arena.get(decl));
    for child in children {
        link_containers(arena, child, Some(decl));
    }
}

/// Every `DeclId` a declaration owns directly (one level, not recursive).
pub(crate) fn owned_children(decl: &Decl) -> Vec<DeclId> {
    match &decl.kind {
        DeclKind::Namespace(ns) => ns.children.clone(),
        DeclKind::Struct(s) => {
            let mut v = s.members.clone();
            v.extend(s.constructors.iter().copied());
            v.extend(s.destructor);
            v
        }
        DeclKind::Trait(t) => t.members.clone(),
        DeclKind::Extension(e) => e.members.clone(),
        DeclKind::Enum { consts, .. } => consts.clone(),
        DeclKind::TemplateFunction(t) => {
            let mut v = t.params.clone();
            v.extend(t.callable.params.iter().copied());
            v
        }
        DeclKind::TemplateStruct(t) => {
            let mut v = t.params.clone();
            v.extend(t.shape.members.clone());
            v
        }
        DeclKind::TemplateTrait(t) => {
            let mut v = t.params.clone();
            v.extend(t.shape.members.clone());
            v
        }
        DeclKind::Function(c) | DeclKind::CallOperator(c) | DeclKind::TypeSuffix(c) => c.params.clone(),
        DeclKind::Constructor { callable, .. } | DeclKind::Destructor { callable, .. } => callable.params.clone(),
        DeclKind::Operator { callable, .. } => callable.params.clone(),
        _ => Vec::new(),
    }
}

fn resolve_import(
    arena: &mut DeclArena,
    import: DeclId,
    namespaces: &NamespaceTable,
    sink: &mut DiagnosticSink,
) {
    let (path, span) = match &arena.get(import).kind {
        DeclKind::Import(i) => (i.path.clone(), arena.get(import).span.clone()),
        _ => return,
    };
    if path.is_empty() {
        return;
    }

    if let Some(proto) = namespaces.get(&path) {
        let target = proto.node;
        if let DeclKind::Import(i) = &mut arena.get_mut(import).kind {
            i.resolved = Some(target);
        }
        return;
    }

    // Not a whole namespace: the final segment may be a member declared
    // directly inside the parent namespace.
    let (parent_path, leaf) = path.split_at(path.len() - 1);
    let leaf = &leaf[0];
    if let Some(proto) = namespaces.get(parent_path) {
        for &contributor in &proto.contributors {
            let children = owned_children(arena.get(contributor));
            if let Some(found) = children.into_iter().find(|c| arena.get(*c).name() == leaf) {
                if let DeclKind::Import(i) = &mut arena.get_mut(import).kind {
                    i.resolved = Some(found);
                }
                return;
            }
        }
    }

    sink.warn(ErrorCode::NameNotFound, span, format!("import path `{}` does not resolve to a declaration", path.join(".")));
}

/// A coarse signature used only to flag *obvious* duplicates: decl kind tag
/// plus, for callables, the parameter count. Full signature comparison
/// (argument types, labels) happens in C6/C7 once types are resolved.
fn signature_key(arena: &DeclArena, decl: DeclId) -> (&'static str, usize) {
    let d = arena.get(decl);
    match &d.kind {
        DeclKind::Function(c) => ("fn", c.params.len()),
        DeclKind::Variable { .. } => ("var", 0),
        DeclKind::Struct(_) => ("struct", 0),
        DeclKind::Trait(_) => ("trait", 0),
        DeclKind::TypeAlias { .. } => ("alias", 0),
        DeclKind::Enum { .. } => ("enum", 0),
        DeclKind::TemplateFunction(t) => ("template_fn", t.params.len()),
        DeclKind::TemplateStruct(t) => ("template_struct", t.params.len()),
        DeclKind::TemplateTrait(t) => ("template_trait", t.params.len()),
        _ => ("other", 0),
    }
}

fn detect_duplicates(arena: &DeclArena, decl: DeclId, sink: &mut DiagnosticSink) {
    let children = owned_children(arena.get(decl));
    let mut seen: HashMap<(String, &'static str, usize), DeclId> = HashMap::new();
    for &child in &children {
        let name = arena.get(child).name().to_string();
        let key = (name.clone(), signature_key(arena, child).0, signature_key(arena, child).1);
        if seen.contains_key(&key) {
            sink.warn(
                ErrorCode::AmbiguousName,
                arena.get(child).span.clone(),
                format!("`{}` is declared more than once in this scope", name),
            );
        } else {
            seen.insert(key, child);
        }
    }
    for child in children {
        detect_duplicates(arena, child, sink);
    }
}
