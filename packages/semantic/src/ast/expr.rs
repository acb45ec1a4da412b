//! The `Expr` sum type (§3.1).

use super::ident::Identifier;
use super::ids::DeclId;
use super::ty::Type;
use crate::position::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i128),
    Float(f64),
    Str(String),
    Char(char),
}

/// A call argument; `label` is `None` for positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub label: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Literals
    ValueLiteral(LiteralValue),
    BoolLiteral(bool),
    ArrayLiteral(Vec<Expr>),
    TypeValue(Type),

    // Unresolved reference, eliminated by C7
    Identifier(Identifier),
    /// `callee(args)` before `callee` is resolved to a candidate
    /// declaration — the raw shape a call keeps until overload resolution
    /// narrows it to `FunctionCall`/`MemberFunctionCall`/`ConstructorCall`/...
    UnresolvedCall { callee: Box<Expr>, args: Vec<Arg> },
    /// `a.b` before `b` is resolved against `a`'s type.
    UnresolvedMemberAccess { object: Box<Expr>, member: String },

    // Resolved references (non-owning: the declaration outlives the ref)
    LocalVariableRef(DeclId),
    ParameterRef(DeclId),
    VariableRef(DeclId),
    MemberVariableRef { object: Box<Expr>, member: DeclId },
    EnumConstRef(DeclId),
    FunctionReference(DeclId),
    VTableFunctionReference { object: Box<Expr>, owner: DeclId, slot: usize },
    PropertyRef(DeclId),
    MemberPropertyRef { object: Box<Expr>, member: DeclId },
    SubscriptOperatorRef(DeclId),
    MemberSubscriptOperatorRef { object: Box<Expr>, member: DeclId },
    ConstructorReference(DeclId),
    CallOperatorReference(DeclId),
    CurrentSelf,
    ImaginaryRef(DeclId),
    TemporaryValueRef(DeclId),
    TemplateConstRef(DeclId),

    // Calls
    FunctionCall { callee: DeclId, args: Vec<Arg> },
    MemberFunctionCall { object: Box<Expr>, callee: DeclId, args: Vec<Arg> },
    /// A virtual member call outside its declaring constructor/destructor:
    /// dispatches through `owner`'s v-table at `slot` rather than calling
    /// `callee` directly. `callee` is kept for its signature/return type —
    /// the statically-resolved override is never the one actually invoked.
    VTableFunctionCall { object: Box<Expr>, owner: DeclId, slot: usize, callee: DeclId, args: Vec<Arg> },
    ConstructorCall { ctor: DeclId, args: Vec<Arg>, object_ref: Option<Box<Expr>> },
    SubscriptCall { decl: DeclId, args: Vec<Arg> },
    MemberSubscriptCall { object: Box<Expr>, decl: DeclId, args: Vec<Arg> },
    PropertyGetCall { object: Option<Box<Expr>>, decl: DeclId },
    PropertySetCall { object: Option<Box<Expr>>, decl: DeclId, value: Box<Expr> },
    SubscriptOperatorGetCall { object: Box<Expr>, decl: DeclId, args: Vec<Arg>, want_ref_mut: bool },
    SubscriptOperatorSetCall { object: Box<Expr>, decl: DeclId, args: Vec<Arg>, value: Box<Expr> },

    // Operators
    Prefix { op: String, operand: Box<Expr>, decl: Option<DeclId> },
    Postfix { op: String, operand: Box<Expr>, decl: Option<DeclId> },
    Infix { op: String, lhs: Box<Expr>, rhs: Box<Expr>, decl: Option<DeclId> },
    Assignment { lhs: Box<Expr>, rhs: Box<Expr> },
    MemberPrefix { op: String, object: Box<Expr>, decl: DeclId },
    MemberPostfix { op: String, object: Box<Expr>, decl: DeclId },
    MemberInfix { op: String, object: Box<Expr>, rhs: Box<Expr>, decl: DeclId },

    // Conversions
    ImplicitCast { expr: Box<Expr>, target: Type },
    As { expr: Box<Expr>, target: Type },
    Ref { expr: Box<Expr> },
    ImplicitDeref { expr: Box<Expr> },
    LValueToRValue { expr: Box<Expr> },
    RValueToInRef { expr: Box<Expr> },

    // Control
    Ternary { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    Try { expr: Box<Expr> },
    Paren(Box<Expr>),
    LabeledArgument { label: String, expr: Box<Expr> },

    // Introspection
    CheckExtendsType { ty: Type, extends: Type },
    Is { expr: Box<Expr>, ty: Type },
    Has { expr: Box<Expr>, prototype_name: String },

    /// A let-binding used as an expression; refers to the fresh local it
    /// declares.
    VariableDecl(DeclId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub value_type: Type,
    pub span: SourceSpan,
}

impl Expr {
    pub fn new(kind: ExprKind, span: SourceSpan) -> Self {
        Expr { kind, value_type: Type::void(), span }
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.value_type = ty;
        self
    }

    pub fn is_lvalue(&self) -> bool {
        self.value_type.is_lvalue
    }
}
