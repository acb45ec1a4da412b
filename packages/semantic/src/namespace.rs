//! Namespace prototyper (C3, §4.2).
//!
//! Merges per-file `NamespaceDecl`s that share a dotted path into one
//! logical **prototype namespace tree**. Each file-local namespace node gets
//! its `prototype` back-pointer set to the merged node; the merged node
//! itself owns only the merged set of nested namespace prototypes (never the
//! function/struct/trait/etc. decls a namespace directly contains — those
//! stay owned by the file that declared them). A separate index
//! ([`NamespaceTable`]) remembers which file-local nodes contributed to each
//! path, so C5/C7 cross-file lookups can walk every contributor's own
//! `children` to find a namespace's full member set.

use crate::ast::{AstFile, DeclArena, DeclId, DeclKind, Identifier, NamespaceDecl};
use crate::position::SourceSpan;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct PrototypeNamespace {
    pub path: Vec<String>,
    /// The merged node: owns only deduplicated nested-namespace prototypes.
    pub node: DeclId,
    /// Every file-local `NamespaceDecl` that shares this path.
    pub contributors: Vec<DeclId>,
}

#[derive(Debug, Default)]
pub struct NamespaceTable {
    by_path: IndexMap<String, PrototypeNamespace>,
}

impl NamespaceTable {
    pub fn get(&self, path: &[String]) -> Option<&PrototypeNamespace> {
        self.by_path.get(&join(path))
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

fn join(path: &[String]) -> String {
    path.join(".")
}

/// Build (or extend) the prototype tree over every file's namespace
/// scaffolding. Mutates each visited file-local `NamespaceDecl::prototype`
/// and returns the contributor index.
pub fn build_namespace_prototypes(arena: &mut DeclArena, files: &[AstFile]) -> NamespaceTable {
    let mut table = NamespaceTable::default();
    for file in files {
        if let Some(root) = file.root_namespace {
            visit_namespace(arena, &mut table, root, &mut Vec::new());
        }
    }
    table
}

fn visit_namespace(arena: &mut DeclArena, table: &mut NamespaceTable, id: DeclId, path: &mut Vec<String>) {
    let name = arena.get(id).name().to_string();
    path.push(name);

    let key = join(path);
    let prototype_id = if let Some(existing) = table.by_path.get(&key) {
        existing.node
    } else {
        let span = arena.get(id).span.clone();
        let node = arena.alloc(synthetic_namespace(path.last().unwrap().clone(), span));
        table.by_path.insert(
            key.clone(),
            PrototypeNamespace { path: path.clone(), node, contributors: Vec::new() },
        );
        node
    };

    if let DeclKind::Namespace(ns) = &mut arena.get_mut(id).kind {
        ns.prototype = Some(prototype_id);
    }
    table.by_path.get_mut(&key).unwrap().contributors.push(id);

    let nested: Vec<DeclId> = match &arena.get(id).kind {
        DeclKind::Namespace(ns) => ns
            .children
            .iter()
            .copied()
            .filter(|child| matches!(arena.get(*child).kind, DeclKind::Namespace(_)))
            .collect(),
        _ => Vec::new(),
    };

    for child in nested {
        visit_namespace(arena, table, child, path);
        merge_child_into_prototype(arena, prototype_id, child);
    }

    path.pop();
}

/// Record `child`'s merged prototype as a nested prototype of `parent`'s
/// prototype, deduplicated by name.
fn merge_child_into_prototype(arena: &mut DeclArena, parent_prototype: DeclId, child: DeclId) {
    let child_prototype = match &arena.get(child).kind {
        DeclKind::Namespace(ns) => ns.prototype,
        _ => None,
    };
    let Some(child_prototype) = child_prototype else { return };
    let child_name = arena.get(child_prototype).name().to_string();

    let existing_children = match &arena.get(parent_prototype).kind {
        DeclKind::Namespace(ns) => ns.children.clone(),
        _ => return,
    };
    let already_present = existing_children
        .iter()
        .any(|existing| arena_name_eq(arena, *existing, &child_name));
    if !already_present {
        if let DeclKind::Namespace(parent_ns) = &mut arena.get_mut(parent_prototype).kind {
            parent_ns.children.push(child_prototype);
        }
    }
}

fn arena_name_eq(arena: &DeclArena, id: DeclId, name: &str) -> bool {
    arena.get(id).name() == name
}

fn synthetic_namespace(name: String, span: SourceSpan) -> crate::ast::Decl {
    crate::ast::Decl::new(
        Identifier::new(name, span.clone()),
        span,
        DeclKind::Namespace(NamespaceDecl { children: Vec::new(), prototype: None }),
    )
}
