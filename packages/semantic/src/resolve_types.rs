//! Basic type resolver (C5, §4.4).
//!
//! Walks every declaration, rewriting textual `TypeKind::Unresolved`/
//! `UnresolvedNested` references into bindings: a built-in name becomes
//! `BuiltIn`; a name found in scope becomes `Struct`/`Trait`/`Enum`/`Alias`/
//! `TemplateTypenameRef`, or — when more than one generic declaration shares
//! the name — `Templated{candidates, args}` for C6 to disambiguate. A name
//! found nowhere stays `Unresolved` and is diagnosed once C6 fails to ground
//! it (C5 itself does not error on an unresolved name: a later pass may
//! still supply the binding via an import demanded by C4 after C5 runs on
//! some other file in the same batch).

use crate::ast::{AstFile, Contract, DeclArena, DeclId, DeclKind, NamespaceDecl, TemplateParameterKind, Type, TypeKind};
use crate::diagnostics::DiagnosticSink;
use crate::namespace::NamespaceTable;
use crate::validate::owned_children;

pub fn resolve_file_types(arena: &mut DeclArena, file: &AstFile, namespaces: &NamespaceTable, sink: &mut DiagnosticSink) {
    for &decl in &file.declarations {
        resolve_decl_types(arena, decl, file, namespaces, sink);
    }
}

/// Placeholder swapped into a decl's `kind` while we own it outside the
/// arena; restored (with resolved types) before returning.
fn take_kind(arena: &mut DeclArena, decl: DeclId) -> DeclKind {
    std::mem::replace(&mut arena.get_mut(decl).kind, DeclKind::Namespace(NamespaceDecl { children: Vec::new(), prototype: None }))
}

fn resolve_decl_types(arena: &mut DeclArena, decl: DeclId, file: &AstFile, namespaces: &NamespaceTable, sink: &mut DiagnosticSink) {
    let container = arena.get(decl).container;

    let mut kind = take_kind(arena, decl);
    match &mut kind {
        DeclKind::Variable { ty, .. } => *ty = resolve_in_place(std::mem::replace(ty, Type::void()), container, arena, file, namespaces, sink),
        DeclKind::Parameter { ty, .. } => *ty = resolve_in_place(std::mem::replace(ty, Type::void()), container, arena, file, namespaces, sink),
        DeclKind::TypeAlias { aliased } => *aliased = resolve_in_place(std::mem::replace(aliased, Type::void()), container, arena, file, namespaces, sink),
        DeclKind::Enum { underlying, .. } => *underlying = resolve_in_place(std::mem::replace(underlying, Type::void()), container, arena, file, namespaces, sink),
        DeclKind::Extension(ext) => ext.extended_type = resolve_in_place(std::mem::replace(&mut ext.extended_type, Type::void()), container, arena, file, namespaces, sink),
        DeclKind::TemplateParameter(TemplateParameterKind::Typename { bound, default }) => {
            if let Some(bound) = bound {
                *bound = resolve_in_place(std::mem::replace(bound, Type::void()), container, arena, file, namespaces, sink);
            }
            if let Some(default) = default {
                *default = resolve_in_place(std::mem::replace(default, Type::void()), container, arena, file, namespaces, sink);
            }
        }
        DeclKind::TemplateParameter(TemplateParameterKind::Const { ty, .. }) => {
            *ty = resolve_in_place(std::mem::replace(ty, Type::void()), container, arena, file, namespaces, sink)
        }
        DeclKind::TemplateFunction(t) => {
            t.callable.return_type =
                resolve_in_place(std::mem::replace(&mut t.callable.return_type, Type::void()), container, arena, file, namespaces, sink);
            resolve_contracts(&mut t.contracts, container, arena, file, namespaces, sink);
        }
        DeclKind::TemplateStruct(t) => resolve_contracts(&mut t.contracts, container, arena, file, namespaces, sink),
        DeclKind::TemplateTrait(t) => resolve_contracts(&mut t.contracts, container, arena, file, namespaces, sink),
        DeclKind::Function(c) | DeclKind::Constructor { callable: c, .. } | DeclKind::Destructor { callable: c, .. } => {
            c.return_type = resolve_in_place(std::mem::replace(&mut c.return_type, Type::void()), container, arena, file, namespaces, sink)
        }
        DeclKind::Operator { callable, .. } | DeclKind::CallOperator(callable) | DeclKind::TypeSuffix(callable) => {
            callable.return_type =
                resolve_in_place(std::mem::replace(&mut callable.return_type, Type::void()), container, arena, file, namespaces, sink)
        }
        _ => {}
    }
    arena.get_mut(decl).kind = kind;

    for child in owned_children(arena.get(decl)) {
        resolve_decl_types(arena, child, file, namespaces, sink);
    }
}

fn resolve_contracts(
    contracts: &mut [Contract],
    container: Option<DeclId>,
    arena: &mut DeclArena,
    file: &AstFile,
    namespaces: &NamespaceTable,
    sink: &mut DiagnosticSink,
) {
    for contract in contracts {
        match contract {
            Contract::WhereTrait { trait_ty, .. } => {
                *trait_ty = resolve_in_place(std::mem::replace(trait_ty, Type::void()), container, arena, file, namespaces, sink)
            }
            Contract::WhereBase { base_ty, .. } => {
                *base_ty = resolve_in_place(std::mem::replace(base_ty, Type::void()), container, arena, file, namespaces, sink)
            }
            _ => {}
        }
    }
}

fn resolve_in_place(
    ty: Type,
    scope: Option<DeclId>,
    arena: &mut DeclArena,
    file: &AstFile,
    namespaces: &NamespaceTable,
    sink: &mut DiagnosticSink,
) -> Type {
    let kind = match ty.kind {
        TypeKind::Unresolved { name, template_args } => {
            resolve_name(&name, template_args, scope, arena, file, namespaces, sink)
        }
        TypeKind::UnresolvedNested { container, name, template_args } => {
            let container = resolve_in_place(*container, scope, arena, file, namespaces, sink);
            resolve_nested(container, &name, template_args, arena, sink)
        }
        TypeKind::Pointer(inner) => TypeKind::Pointer(Box::new(resolve_in_place(*inner, scope, arena, file, namespaces, sink))),
        TypeKind::Reference(inner) => TypeKind::Reference(Box::new(resolve_in_place(*inner, scope, arena, file, namespaces, sink))),
        TypeKind::RValueReference(inner) => {
            TypeKind::RValueReference(Box::new(resolve_in_place(*inner, scope, arena, file, namespaces, sink)))
        }
        TypeKind::FlatArray { elem, length } => {
            TypeKind::FlatArray { elem: Box::new(resolve_in_place(*elem, scope, arena, file, namespaces, sink)), length }
        }
        TypeKind::Dimension { elem, rank } => {
            TypeKind::Dimension { elem: Box::new(resolve_in_place(*elem, scope, arena, file, namespaces, sink)), rank }
        }
        TypeKind::FunctionPointer { result, params } => TypeKind::FunctionPointer {
            result: Box::new(resolve_in_place(*result, scope, arena, file, namespaces, sink)),
            params: params.into_iter().map(|p| resolve_in_place(p, scope, arena, file, namespaces, sink)).collect(),
        },
        other => other,
    };
    Type { kind, qualifier: ty.qualifier, is_lvalue: ty.is_lvalue }
}

/// §4.4's lookup order: built-ins, then template parameter scopes
/// (innermost first) and the enclosing declaration chain, then the file,
/// then imports.
fn resolve_name(
    name: &str,
    template_args: Option<Vec<crate::ast::Expr>>,
    scope: Option<DeclId>,
    arena: &DeclArena,
    file: &AstFile,
    namespaces: &NamespaceTable,
    sink: &mut DiagnosticSink,
) -> TypeKind {
    if let Some(builtin) = Type::builtin(name) {
        return builtin.kind;
    }

    let mut candidates = Vec::new();
    let mut cursor = scope;
    while let Some(current) = cursor {
        for child in owned_children(arena.get(current)) {
            if child != current && arena.get(child).name() == name {
                candidates.push(child);
            }
        }
        if !candidates.is_empty() {
            break;
        }
        cursor = arena.get(current).container;
    }

    if candidates.is_empty() {
        for &decl in &file.declarations {
            if arena.get(decl).name() == name {
                candidates.push(decl);
            }
        }
    }

    if candidates.is_empty() {
        for &import in &file.imports {
            if let DeclKind::Import(i) = &arena.get(import).kind {
                if let Some(resolved) = i.resolved {
                    if arena.get(resolved).name() == name {
                        candidates.push(resolved);
                    }
                }
            }
        }
    }

    if candidates.is_empty() {
        // Leave unresolved; C6 (or a later file's contribution to the
        // prototype namespace tree) may still ground this.
        let _ = namespaces;
        return TypeKind::Unresolved { name: name.to_string(), template_args };
    }

    if candidates.len() > 1 {
        return TypeKind::Templated { candidates, args: template_args.unwrap_or_default() };
    }

    bind_single_candidate(candidates[0], arena, template_args, sink)
}

fn bind_single_candidate(
    id: DeclId,
    arena: &DeclArena,
    template_args: Option<Vec<crate::ast::Expr>>,
    sink: &mut DiagnosticSink,
) -> TypeKind {
    match &arena.get(id).kind {
        DeclKind::Struct(_) => TypeKind::Struct(id),
        DeclKind::Trait(_) => TypeKind::Trait(id),
        DeclKind::Enum { .. } => TypeKind::Enum(id),
        DeclKind::TypeAlias { .. } => TypeKind::Alias(id),
        DeclKind::TemplateParameter(_) => TypeKind::TemplateTypenameRef(id),
        DeclKind::TemplateStruct(_) => TypeKind::TemplateStruct { decl: id, args: template_args.unwrap_or_default() },
        DeclKind::TemplateTrait(_) => TypeKind::TemplateTrait { decl: id, args: template_args.unwrap_or_default() },
        _ => {
            sink.warn(
                crate::diagnostics::ErrorCode::NameNotFound,
                arena.get(id).span.clone(),
                format!("`{}` does not name a type", arena.get(id).name()),
            );
            TypeKind::Unresolved { name: arena.get(id).name().to_string(), template_args }
        }
    }
}

fn resolve_nested(
    container: Type,
    name: &str,
    template_args: Option<Vec<crate::ast::Expr>>,
    arena: &DeclArena,
    sink: &mut DiagnosticSink,
) -> TypeKind {
    let container_decl = match &container.kind {
        TypeKind::Struct(id) | TypeKind::Trait(id) => Some(*id),
        TypeKind::TemplateStruct { decl, .. } | TypeKind::TemplateTrait { decl, .. } => {
            // Not yet ground: the member reference is dependent on the
            // container's own instantiation.
            return TypeKind::Dependent {
                container: Box::new(container.clone()),
                dependent: Box::new(Type::new(TypeKind::Unresolved { name: name.to_string(), template_args })),
            };
        }
        _ => None,
    };

    let Some(container_decl) = container_decl else {
        return TypeKind::UnresolvedNested { container: Box::new(container), name: name.to_string(), template_args };
    };

    for child in owned_children(arena.get(container_decl)) {
        if arena.get(child).name() == name {
            return bind_single_candidate(child, arena, template_args, sink);
        }
    }

    TypeKind::UnresolvedNested { container: Box::new(container), name: name.to_string(), template_args }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, Identifier, NamespaceDecl, VarKind};
    use crate::position::SourceSpan;

    #[test]
    fn builtin_name_resolves_without_scope_search() {
        let arena = DeclArena::new();
        let namespaces = NamespaceTable::default();
        let file = AstFile::new(0, "a.lang");
        let mut sink = DiagnosticSink::new();
        let resolved = resolve_name("i32", None, None, &arena, &file, &namespaces, &mut sink);
        assert!(matches!(resolved, TypeKind::BuiltIn { size_bits: 32, .. }));
    }

    #[test]
    fn struct_in_enclosing_namespace_resolves_to_struct_type() {
        let mut arena = DeclArena::new();
        let struct_id = arena.alloc(Decl::new(
            Identifier::synthetic("Widget"),
            SourceSpan::synthetic(),
            DeclKind::Struct(crate::ast::StructDecl::default()),
        ));
        let ns = arena.alloc(Decl::new(
            Identifier::synthetic("app"),
            SourceSpan::synthetic(),
            DeclKind::Namespace(NamespaceDecl { children: vec![struct_id], prototype: None }),
        ));
        arena.get_mut(struct_id).container = Some(ns);

        let var_id = arena.alloc(Decl::new(
            Identifier::synthetic("w"),
            SourceSpan::synthetic(),
            DeclKind::Variable {
                ty: Type::new(TypeKind::Unresolved { name: "Widget".to_string(), template_args: None }),
                initializer: None,
                var_kind: VarKind::Local,
            },
        ));
        arena.get_mut(var_id).container = Some(ns);

        let file = AstFile::new(0, "a.lang");
        let namespaces = NamespaceTable::default();
        let mut sink = DiagnosticSink::new();
        resolve_decl_types(&mut arena, var_id, &file, &namespaces, &mut sink);

        match &arena.get(var_id).kind {
            DeclKind::Variable { ty, .. } => assert_eq!(ty.kind, TypeKind::Struct(struct_id)),
            _ => panic!("expected variable"),
        }
    }
}
