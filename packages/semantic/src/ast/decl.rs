//! The `Decl` sum type (§3.1) and its per-kind payloads.

use super::expr::Expr;
use super::ident::Identifier;
use super::ids::DeclId;
use super::stmt::Stmt;
use super::ty::Type;
use crate::position::SourceSpan;
use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unassigned,
    Public,
    Private,
    Internal,
    Protected,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeclModifiers: u16 {
        const STATIC   = 1 << 0;
        const CONST    = 1 << 1;
        const MUT      = 1 << 2;
        const VIRTUAL  = 1 << 3;
        const OVERRIDE = 1 << 4;
        const ABSTRACT = 1 << 5;
        const EXTERN   = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructKind {
    Struct,
    Class,
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtorKind {
    Normal,
    Copy,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Global,
    Member,
    Local,
}

/// Whether a compiler-synthesized constructor/destructor could actually be
/// built (§4.6.5): if any required sub-constructor is unavailable the decl
/// is `Deleted` instead, and referring to it is a diagnostic at C7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisState {
    UserProvided,
    Verified,
    Deleted,
}

/// Shared shape of every function-like declaration: free functions,
/// constructors, destructors, operators, the call operator, type suffixes,
/// subscript accessors and property accessors all have a parameter list, a
/// return type and an optional body.
#[derive(Debug, Clone)]
pub struct CallableDecl {
    pub params: Vec<DeclId>,
    pub return_type: Type,
    pub body: Option<Stmt>,
    pub throws: bool,
    pub requires: Vec<Expr>,
    pub ensures: Vec<Expr>,
}

impl CallableDecl {
    pub fn new(params: Vec<DeclId>, return_type: Type) -> Self {
        CallableDecl { params, return_type, body: None, throws: false, requires: Vec::new(), ensures: Vec::new() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptOperatorDecl {
    pub get_ref: Option<CallableDecl>,
    pub get_ref_mut: Option<CallableDecl>,
    pub get_value: Option<CallableDecl>,
    pub set: Option<CallableDecl>,
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub getter: CallableDecl,
    pub ref_mut_getter: Option<CallableDecl>,
    pub setter: Option<CallableDecl>,
}

/// A v-table slot: the signature it serves and the declaration presently
/// occupying it.
#[derive(Debug, Clone)]
pub struct VTableSlot {
    pub function: DeclId,
}

#[derive(Debug, Clone, Default)]
pub struct StructDecl {
    pub struct_kind_set: bool,
    pub kind: Option<StructKind>,
    pub base_struct: Option<DeclId>,
    pub inherited_traits: Vec<DeclId>,
    /// Members this struct (or template shape) declares directly.
    pub members: Vec<DeclId>,
    /// Full visible member set after §4.6.2(b) shadow/override propagation.
    pub all_members: Vec<DeclId>,
    pub constructors: Vec<DeclId>,
    pub destructor: Option<DeclId>,
    pub vtable: Vec<VTableSlot>,
    pub vtable_owner: Option<DeclId>,
    pub is_instantiated: bool,
    pub memory_layout: Vec<LayoutMember>,
    pub data_size_without_padding: u64,
    pub data_size_with_padding: u64,
    pub struct_align: u32,
}

#[derive(Debug, Clone)]
pub struct LayoutMember {
    pub member: Option<DeclId>,
    pub is_padding: bool,
    pub offset: u64,
    pub size: u64,
    pub align: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TraitDecl {
    pub inherited_traits: Vec<DeclId>,
    pub members: Vec<DeclId>,
    pub all_members: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct ExtensionDecl {
    pub extended_type: Type,
    pub inherited_traits: Vec<DeclId>,
    pub members: Vec<DeclId>,
}

/// `where`/`has`/`requires`/`ensures`/`throws` on a generic declaration
/// (§4.5). Processed in a phase distinct from body instantiation because
/// other declarations may demand the contract before the body is ready.
#[derive(Debug, Clone)]
pub enum Contract {
    WhereTrait { param: DeclId, trait_ty: Type },
    WhereBase { param: DeclId, base_ty: Type },
    Has { param: DeclId, prototype: DeclId },
    Requires(Expr),
    Ensures(Expr),
    Throws,
}

#[derive(Debug, Clone)]
pub struct TemplateInstEntry {
    pub args: Vec<Expr>,
    pub inst: DeclId,
}

#[derive(Debug, Clone)]
pub struct TemplateFunctionDecl {
    pub params: Vec<DeclId>,
    pub contracts: Vec<Contract>,
    pub callable: CallableDecl,
    pub instantiations: Vec<TemplateInstEntry>,
    pub imaginary_inst: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct TemplateStructDecl {
    pub params: Vec<DeclId>,
    pub contracts: Vec<Contract>,
    pub shape: StructDecl,
    pub instantiations: Vec<TemplateInstEntry>,
    pub imaginary_inst: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct TemplateTraitDecl {
    pub params: Vec<DeclId>,
    pub contracts: Vec<Contract>,
    pub shape: TraitDecl,
    pub instantiations: Vec<TemplateInstEntry>,
    pub imaginary_inst: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub enum TemplateParameterKind {
    Typename { bound: Option<Type>, default: Option<Type> },
    Const { ty: Type, default: Option<Expr> },
}

/// A member signature referenced inside a `has` contract (§4.5).
#[derive(Debug, Clone)]
pub enum MemberPrototype {
    Trait(Type),
    Constructor { params: Vec<Type> },
    Destructor,
    Variable { name: String, ty: Type },
    Property { name: String, ty: Type },
    Subscript { index_ty: Type, value_ty: Type },
    Function { name: String, params: Vec<Type>, return_type: Type },
    Operator { symbol: String, fixity: Fixity, params: Vec<Type> },
    CallOperator { params: Vec<Type> },
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub children: Vec<DeclId>,
    /// Back-pointer to the merged, cross-file node (C3).
    pub prototype: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: Vec<String>,
    pub resolved: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Namespace(NamespaceDecl),
    Import(ImportDecl),
    TypeAlias { aliased: Type },
    Enum { underlying: Type, consts: Vec<DeclId> },
    EnumConst { value: Option<Expr> },
    Variable { ty: Type, initializer: Option<Expr>, var_kind: VarKind },
    Parameter { ty: Type, default_value: Option<Expr>, label: Option<String>, is_in: bool },
    TemplateParameter(TemplateParameterKind),
    Function(CallableDecl),
    Constructor { callable: CallableDecl, ctor_kind: CtorKind, state: SynthesisState },
    Destructor { callable: CallableDecl, state: SynthesisState },
    Operator { callable: CallableDecl, fixity: Fixity, symbol: String },
    CallOperator(CallableDecl),
    TypeSuffix(CallableDecl),
    SubscriptOperator(SubscriptOperatorDecl),
    Property(PropertyDecl),
    Struct(StructDecl),
    Trait(TraitDecl),
    Extension(ExtensionDecl),
    TemplateFunction(TemplateFunctionDecl),
    TemplateStruct(TemplateStructDecl),
    TemplateTrait(TemplateTraitDecl),
    TraitPrototype(MemberPrototype),
    /// A stand-in for an unbound template parameter, used only inside an
    /// imaginary instantiation created to validate a template body (§4.6.8).
    ImaginaryType { members: Vec<DeclId>, specialized_base: Option<DeclId> },
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub source_file: u32,
    pub visibility: Visibility,
    pub is_const_expr: bool,
    pub ident: Identifier,
    pub modifiers: DeclModifiers,
    pub container: Option<DeclId>,
    pub contained_in_template: bool,
    /// Non-owning back-reference into the template this was instantiated
    /// from; `None` for declarations that are not template instantiations.
    pub original_decl: Option<DeclId>,
    pub span: SourceSpan,
    pub kind: DeclKind,
}

impl Decl {
    pub fn new(ident: Identifier, span: SourceSpan, kind: DeclKind) -> Self {
        Decl {
            source_file: 0,
            visibility: Visibility::Unassigned,
            is_const_expr: false,
            ident,
            modifiers: DeclModifiers::empty(),
            container: None,
            contained_in_template: false,
            original_decl: None,
            span,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.ident.name
    }

    pub fn is_virtual(&self) -> bool {
        self.modifiers.contains(DeclModifiers::VIRTUAL)
    }

    pub fn is_override(&self) -> bool {
        self.modifiers.contains(DeclModifiers::OVERRIDE)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(DeclModifiers::ABSTRACT)
    }

    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.kind {
            DeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructDecl> {
        match &mut self.kind {
            DeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_trait(&self) -> Option<&TraitDecl> {
        match &self.kind {
            DeclKind::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn callable(&self) -> Option<&CallableDecl> {
        match &self.kind {
            DeclKind::Function(c)
            | DeclKind::Constructor { callable: c, .. }
            | DeclKind::Destructor { callable: c, .. }
            | DeclKind::Operator { callable: c, .. }
            | DeclKind::CallOperator(c)
            | DeclKind::TypeSuffix(c) => Some(c),
            _ => None,
        }
    }

    pub fn callable_mut(&mut self) -> Option<&mut CallableDecl> {
        match &mut self.kind {
            DeclKind::Function(c)
            | DeclKind::Constructor { callable: c, .. }
            | DeclKind::Destructor { callable: c, .. }
            | DeclKind::Operator { callable: c, .. }
            | DeclKind::CallOperator(c)
            | DeclKind::TypeSuffix(c) => Some(c),
            _ => None,
        }
    }
}
