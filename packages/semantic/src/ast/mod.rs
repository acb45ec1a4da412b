//! The AST data model (C1): arena-indexed declarations, the `Type`/`Expr`/
//! `Stmt` sum types, and the recursive visitor/deep-copy machinery every
//! later pass builds on.

pub mod clone;
pub mod decl;
pub mod expr;
pub mod file;
pub mod ident;
pub mod ids;
pub mod stmt;
pub mod ty;
pub mod visit;

pub use clone::{clone_callable, clone_expr, clone_stmt, subst_type, Substitution, TemplateArgBinding};
pub use decl::{
    CallableDecl, Contract, CtorKind, Decl, DeclKind, DeclModifiers, ExtensionDecl, Fixity, ImportDecl,
    LayoutMember, MemberPrototype, NamespaceDecl, PropertyDecl, StructDecl, StructKind, SubscriptOperatorDecl,
    SynthesisState, TemplateFunctionDecl, TemplateInstEntry, TemplateParameterKind, TemplateStructDecl,
    TemplateTraitDecl, TraitDecl, VTableSlot, VarKind, Visibility,
};
pub use expr::{Arg, Expr, ExprKind, LiteralValue};
pub use file::AstFile;
pub use ident::Identifier;
pub use ids::{DeclArena, DeclId};
pub use stmt::{Stmt, StmtKind};
pub use ty::{Qualifier, Type, TypeKind};
pub use visit::{walk_expr, walk_stmt, MutVisitor};
