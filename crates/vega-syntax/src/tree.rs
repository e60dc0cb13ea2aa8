//! Arena-allocated Java syntax tree.
//!
//! Nodes are addressed by [`NodeId`]; parent links and the role a node plays in
//! its parent are stored as plain indices next to the node. The tree is
//! immutable once [`TreeBuilder::finish`] has validated it.
//!
//! [`NodeKind`] is generic over the child reference type so the same closed set
//! of syntactic forms describes both nodes of an existing tree and fragments
//! synthesized by a rewrite.

use std::fmt;
use std::ops::BitOr;

use text_size::{TextRange, TextSize};
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierFlags(u16);

impl ModifierFlags {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(1 << 0);
    pub const PROTECTED: Self = Self(1 << 1);
    pub const PRIVATE: Self = Self(1 << 2);
    pub const ABSTRACT: Self = Self(1 << 3);
    pub const STATIC: Self = Self(1 << 4);
    pub const FINAL: Self = Self(1 << 5);
    pub const DEFAULT: Self = Self(1 << 6);
    pub const SYNCHRONIZED: Self = Self(1 << 7);
    pub const NATIVE: Self = Self(1 << 8);
    pub const TRANSIENT: Self = Self(1 << 9);
    pub const VOLATILE: Self = Self(1 << 10);

    /// Source order used when printing modifiers.
    const KEYWORDS: [(ModifierFlags, &'static str); 11] = [
        (Self::PUBLIC, "public"),
        (Self::PROTECTED, "protected"),
        (Self::PRIVATE, "private"),
        (Self::ABSTRACT, "abstract"),
        (Self::DEFAULT, "default"),
        (Self::STATIC, "static"),
        (Self::FINAL, "final"),
        (Self::TRANSIENT, "transient"),
        (Self::VOLATILE, "volatile"),
        (Self::SYNCHRONIZED, "synchronized"),
        (Self::NATIVE, "native"),
    ];

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == keyword)
            .map(|(flag, _)| *flag)
    }

    pub fn keywords(self) -> impl Iterator<Item = &'static str> {
        Self::KEYWORDS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, kw)| kw)
    }
}

impl BitOr for ModifierFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keywords()).finish()
    }
}

/// Modifier keywords plus marker annotations (`@Override`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub flags: ModifierFlags,
    pub annotations: Vec<String>,
}

impl Modifiers {
    pub fn new(flags: ModifierFlags) -> Self {
        Self {
            flags,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(ModifierFlags::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.flags.contains(ModifierFlags::PRIVATE)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(ModifierFlags::FINAL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeDeclKind {
    Class,
    Interface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub const fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "char" => Primitive::Char,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "void" => Primitive::Void,
            _ => return None,
        })
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Void)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
}

impl AssignOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    OrOr,
    AndAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::OrOr => "||",
            BinaryOp::AndAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding power; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::OrOr => 1,
            BinaryOp::AndAnd => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Add | BinaryOp::Sub => 8,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 9,
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
                | BinaryOp::OrOr
                | BinaryOp::AndAnd
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrefixOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Inc,
    Dec,
}

impl PrefixOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            PrefixOp::Plus => "+",
            PrefixOp::Minus => "-",
            PrefixOp::Not => "!",
            PrefixOp::BitNot => "~",
            PrefixOp::Inc => "++",
            PrefixOp::Dec => "--",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    Inc,
    Dec,
}

impl PostfixOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            PostfixOp::Inc => "++",
            PostfixOp::Dec => "--",
        }
    }
}

/// The structural property a child occupies in its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prop {
    Package,
    Imports,
    Types,
    Name,
    TypeParams,
    Superclass,
    Interfaces,
    Members,
    Bounds,
    Type,
    Fragments,
    ReturnType,
    Params,
    Thrown,
    Body,
    Initializer,
    Statements,
    Expression,
    Condition,
    Then,
    Else,
    Init,
    Updates,
    Parameter,
    Iterable,
    Resources,
    Catches,
    Finally,
    Qualifier,
    Receiver,
    TypeArgs,
    Args,
    Dims,
    Elements,
    Array,
    Index,
    Lhs,
    Rhs,
    Operand,
    Alternatives,
    Bound,
    ElementType,
}

/// Location of a node in its parent: the property and, for list properties,
/// the index in that list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Role {
    pub prop: Prop,
    pub index: Option<usize>,
}

impl Role {
    pub const fn single(prop: Prop) -> Self {
        Self { prop, index: None }
    }

    pub const fn item(prop: Prop, index: usize) -> Self {
        Self {
            prop,
            index: Some(index),
        }
    }

    pub fn is(self, prop: Prop) -> bool {
        self.prop == prop
    }
}

/// Closed set of syntactic forms. `C` is the child reference type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind<C = NodeId> {
    CompilationUnit {
        package: Option<C>,
        imports: Vec<C>,
        types: Vec<C>,
    },
    PackageDecl {
        name: C,
    },
    ImportDecl {
        is_static: bool,
        on_demand: bool,
        name: C,
    },
    TypeDecl {
        modifiers: Modifiers,
        kind: TypeDeclKind,
        name: C,
        type_params: Vec<C>,
        superclass: Option<C>,
        interfaces: Vec<C>,
        members: Vec<C>,
    },
    TypeParam {
        name: C,
        bounds: Vec<C>,
    },
    FieldDecl {
        modifiers: Modifiers,
        ty: C,
        fragments: Vec<C>,
    },
    MethodDecl {
        modifiers: Modifiers,
        type_params: Vec<C>,
        /// `None` for constructors.
        return_type: Option<C>,
        name: C,
        params: Vec<C>,
        thrown: Vec<C>,
        body: Option<C>,
    },
    Initializer {
        is_static: bool,
        body: C,
    },
    /// Method, catch, for-each and lambda parameters. Inferred lambda
    /// parameters have no type.
    Parameter {
        modifiers: Modifiers,
        ty: Option<C>,
        varargs: bool,
        name: C,
    },
    VarFragment {
        name: C,
        initializer: Option<C>,
    },
    AnonymousBody {
        members: Vec<C>,
    },

    Block {
        statements: Vec<C>,
    },
    LocalVarDecl {
        modifiers: Modifiers,
        ty: C,
        fragments: Vec<C>,
    },
    ExprStmt {
        expr: C,
    },
    If {
        condition: C,
        then_branch: C,
        else_branch: Option<C>,
    },
    While {
        condition: C,
        body: C,
    },
    For {
        init: Vec<C>,
        condition: Option<C>,
        updates: Vec<C>,
        body: C,
    },
    ForEach {
        param: C,
        iterable: C,
        body: C,
    },
    Return {
        expr: Option<C>,
    },
    Throw {
        expr: C,
    },
    Break,
    Continue,
    Empty,
    Try {
        resources: Vec<C>,
        body: C,
        catches: Vec<C>,
        finally: Option<C>,
    },
    CatchClause {
        param: C,
        body: C,
    },

    SimpleName {
        ident: String,
    },
    QualifiedName {
        qualifier: C,
        name: C,
    },
    Literal {
        kind: LiteralKind,
        text: String,
    },
    This {
        qualifier: Option<C>,
    },
    FieldAccess {
        receiver: C,
        name: C,
    },
    MethodCall {
        receiver: Option<C>,
        type_args: Vec<C>,
        name: C,
        args: Vec<C>,
    },
    SuperMethodCall {
        qualifier: Option<C>,
        type_args: Vec<C>,
        name: C,
        args: Vec<C>,
    },
    New {
        ty: C,
        args: Vec<C>,
        body: Option<C>,
    },
    ArrayCreation {
        element_ty: C,
        dims: Vec<C>,
        extra_dims: u32,
        initializer: Option<C>,
    },
    ArrayInit {
        elements: Vec<C>,
    },
    ArrayAccess {
        array: C,
        index: C,
    },
    Assign {
        op: AssignOp,
        lhs: C,
        rhs: C,
    },
    Binary {
        op: BinaryOp,
        lhs: C,
        rhs: C,
    },
    Prefix {
        op: PrefixOp,
        operand: C,
    },
    Postfix {
        op: PostfixOp,
        operand: C,
    },
    Conditional {
        condition: C,
        then_expr: C,
        else_expr: C,
    },
    Cast {
        ty: C,
        expr: C,
    },
    InstanceOf {
        expr: C,
        ty: C,
    },
    Paren {
        expr: C,
    },
    Lambda {
        params: Vec<C>,
        parenthesized: bool,
        body: C,
    },
    ExprMethodRef {
        expr: C,
        type_args: Vec<C>,
        name: C,
    },
    TypeMethodRef {
        ty: C,
        type_args: Vec<C>,
        name: C,
    },
    SuperMethodRef {
        qualifier: Option<C>,
        type_args: Vec<C>,
        name: C,
    },
    CreationRef {
        ty: C,
        type_args: Vec<C>,
    },
    /// Declaration in expression position (`for` initializers, resources).
    VarDeclExpr {
        modifiers: Modifiers,
        ty: C,
        fragments: Vec<C>,
    },

    PrimitiveType {
        keyword: Primitive,
    },
    SimpleType {
        name: C,
    },
    ParameterizedType {
        base: C,
        args: Vec<C>,
    },
    ArrayType {
        element: C,
        dims: Vec<C>,
    },
    Dimension,
    UnionType {
        alternatives: Vec<C>,
    },
    Wildcard {
        upper: bool,
        bound: Option<C>,
    },
}

macro_rules! slot_match {
    ($kind:expr, $prop:expr; $($variant:ident . $field:ident => $p:ident),* $(,)?) => {
        match ($kind, $prop) {
            $((NodeKind::$variant { $field, .. }, Prop::$p) => Some($field),)*
            _ => None,
        }
    };
}

macro_rules! list_slots {
    ($kind:expr, $prop:expr) => {
        slot_match!($kind, $prop;
            CompilationUnit.imports => Imports,
            CompilationUnit.types => Types,
            TypeDecl.type_params => TypeParams,
            TypeDecl.interfaces => Interfaces,
            TypeDecl.members => Members,
            TypeParam.bounds => Bounds,
            FieldDecl.fragments => Fragments,
            MethodDecl.type_params => TypeParams,
            MethodDecl.params => Params,
            MethodDecl.thrown => Thrown,
            AnonymousBody.members => Members,
            Block.statements => Statements,
            LocalVarDecl.fragments => Fragments,
            VarDeclExpr.fragments => Fragments,
            For.init => Init,
            For.updates => Updates,
            Try.resources => Resources,
            Try.catches => Catches,
            MethodCall.type_args => TypeArgs,
            MethodCall.args => Args,
            SuperMethodCall.type_args => TypeArgs,
            SuperMethodCall.args => Args,
            New.args => Args,
            ArrayCreation.dims => Dims,
            ArrayInit.elements => Elements,
            Lambda.params => Params,
            ExprMethodRef.type_args => TypeArgs,
            TypeMethodRef.type_args => TypeArgs,
            SuperMethodRef.type_args => TypeArgs,
            CreationRef.type_args => TypeArgs,
            ParameterizedType.args => TypeArgs,
            ArrayType.dims => Dims,
            UnionType.alternatives => Alternatives,
        )
    };
}

macro_rules! optional_slots {
    ($kind:expr, $prop:expr) => {
        slot_match!($kind, $prop;
            CompilationUnit.package => Package,
            TypeDecl.superclass => Superclass,
            MethodDecl.return_type => ReturnType,
            MethodDecl.body => Body,
            Parameter.ty => Type,
            VarFragment.initializer => Initializer,
            If.else_branch => Else,
            For.condition => Condition,
            Return.expr => Expression,
            Try.finally => Finally,
            This.qualifier => Qualifier,
            MethodCall.receiver => Receiver,
            SuperMethodCall.qualifier => Qualifier,
            New.body => Body,
            ArrayCreation.initializer => Initializer,
            SuperMethodRef.qualifier => Qualifier,
            Wildcard.bound => Bound,
        )
    };
}

struct Children<'a, C> {
    out: Vec<(Role, &'a C)>,
}

impl<'a, C> Children<'a, C> {
    fn one(&mut self, prop: Prop, child: &'a C) -> &mut Self {
        self.out.push((Role::single(prop), child));
        self
    }

    fn opt(&mut self, prop: Prop, child: &'a Option<C>) -> &mut Self {
        if let Some(child) = child {
            self.out.push((Role::single(prop), child));
        }
        self
    }

    fn list(&mut self, prop: Prop, children: &'a [C]) -> &mut Self {
        for (idx, child) in children.iter().enumerate() {
            self.out.push((Role::item(prop, idx), child));
        }
        self
    }
}

impl<C> NodeKind<C> {
    /// Children in document order, tagged with their role.
    pub fn children(&self) -> Vec<(Role, &C)> {
        use Prop as P;

        let mut c = Children { out: Vec::new() };
        match self {
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            } => {
                c.opt(P::Package, package)
                    .list(P::Imports, imports)
                    .list(P::Types, types);
            }
            NodeKind::PackageDecl { name } | NodeKind::ImportDecl { name, .. } => {
                c.one(P::Name, name);
            }
            NodeKind::TypeDecl {
                name,
                type_params,
                superclass,
                interfaces,
                members,
                ..
            } => {
                c.one(P::Name, name)
                    .list(P::TypeParams, type_params)
                    .opt(P::Superclass, superclass)
                    .list(P::Interfaces, interfaces)
                    .list(P::Members, members);
            }
            NodeKind::TypeParam { name, bounds } => {
                c.one(P::Name, name).list(P::Bounds, bounds);
            }
            NodeKind::FieldDecl { ty, fragments, .. }
            | NodeKind::LocalVarDecl { ty, fragments, .. }
            | NodeKind::VarDeclExpr { ty, fragments, .. } => {
                c.one(P::Type, ty).list(P::Fragments, fragments);
            }
            NodeKind::MethodDecl {
                type_params,
                return_type,
                name,
                params,
                thrown,
                body,
                ..
            } => {
                c.list(P::TypeParams, type_params)
                    .opt(P::ReturnType, return_type)
                    .one(P::Name, name)
                    .list(P::Params, params)
                    .list(P::Thrown, thrown)
                    .opt(P::Body, body);
            }
            NodeKind::Initializer { body, .. } => {
                c.one(P::Body, body);
            }
            NodeKind::Parameter { ty, name, .. } => {
                c.opt(P::Type, ty).one(P::Name, name);
            }
            NodeKind::VarFragment { name, initializer } => {
                c.one(P::Name, name).opt(P::Initializer, initializer);
            }
            NodeKind::AnonymousBody { members } => {
                c.list(P::Members, members);
            }
            NodeKind::Block { statements } => {
                c.list(P::Statements, statements);
            }
            NodeKind::ExprStmt { expr } | NodeKind::Throw { expr } | NodeKind::Paren { expr } => {
                c.one(P::Expression, expr);
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                c.one(P::Condition, condition)
                    .one(P::Then, then_branch)
                    .opt(P::Else, else_branch);
            }
            NodeKind::While { condition, body } => {
                c.one(P::Condition, condition).one(P::Body, body);
            }
            NodeKind::For {
                init,
                condition,
                updates,
                body,
            } => {
                c.list(P::Init, init)
                    .opt(P::Condition, condition)
                    .list(P::Updates, updates)
                    .one(P::Body, body);
            }
            NodeKind::ForEach {
                param,
                iterable,
                body,
            } => {
                c.one(P::Parameter, param)
                    .one(P::Iterable, iterable)
                    .one(P::Body, body);
            }
            NodeKind::Return { expr } => {
                c.opt(P::Expression, expr);
            }
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Empty
            | NodeKind::SimpleName { .. }
            | NodeKind::Literal { .. }
            | NodeKind::PrimitiveType { .. }
            | NodeKind::Dimension => {}
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                c.list(P::Resources, resources)
                    .one(P::Body, body)
                    .list(P::Catches, catches)
                    .opt(P::Finally, finally);
            }
            NodeKind::CatchClause { param, body } => {
                c.one(P::Parameter, param).one(P::Body, body);
            }
            NodeKind::QualifiedName { qualifier, name } => {
                c.one(P::Qualifier, qualifier).one(P::Name, name);
            }
            NodeKind::This { qualifier } => {
                c.opt(P::Qualifier, qualifier);
            }
            NodeKind::FieldAccess { receiver, name } => {
                c.one(P::Receiver, receiver).one(P::Name, name);
            }
            NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            } => {
                c.opt(P::Receiver, receiver)
                    .list(P::TypeArgs, type_args)
                    .one(P::Name, name)
                    .list(P::Args, args);
            }
            NodeKind::SuperMethodCall {
                qualifier,
                type_args,
                name,
                args,
            } => {
                c.opt(P::Qualifier, qualifier)
                    .list(P::TypeArgs, type_args)
                    .one(P::Name, name)
                    .list(P::Args, args);
            }
            NodeKind::New { ty, args, body } => {
                c.one(P::Type, ty).list(P::Args, args).opt(P::Body, body);
            }
            NodeKind::ArrayCreation {
                element_ty,
                dims,
                initializer,
                ..
            } => {
                c.one(P::ElementType, element_ty)
                    .list(P::Dims, dims)
                    .opt(P::Initializer, initializer);
            }
            NodeKind::ArrayInit { elements } => {
                c.list(P::Elements, elements);
            }
            NodeKind::ArrayAccess { array, index } => {
                c.one(P::Array, array).one(P::Index, index);
            }
            NodeKind::Assign { lhs, rhs, .. } | NodeKind::Binary { lhs, rhs, .. } => {
                c.one(P::Lhs, lhs).one(P::Rhs, rhs);
            }
            NodeKind::Prefix { operand, .. } | NodeKind::Postfix { operand, .. } => {
                c.one(P::Operand, operand);
            }
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                c.one(P::Condition, condition)
                    .one(P::Then, then_expr)
                    .one(P::Else, else_expr);
            }
            NodeKind::Cast { ty, expr } => {
                c.one(P::Type, ty).one(P::Expression, expr);
            }
            NodeKind::InstanceOf { expr, ty } => {
                c.one(P::Expression, expr).one(P::Type, ty);
            }
            NodeKind::Lambda { params, body, .. } => {
                c.list(P::Params, params).one(P::Body, body);
            }
            NodeKind::ExprMethodRef {
                expr,
                type_args,
                name,
            } => {
                c.one(P::Expression, expr)
                    .list(P::TypeArgs, type_args)
                    .one(P::Name, name);
            }
            NodeKind::TypeMethodRef {
                ty,
                type_args,
                name,
            } => {
                c.one(P::Type, ty)
                    .list(P::TypeArgs, type_args)
                    .one(P::Name, name);
            }
            NodeKind::SuperMethodRef {
                qualifier,
                type_args,
                name,
            } => {
                c.opt(P::Qualifier, qualifier)
                    .list(P::TypeArgs, type_args)
                    .one(P::Name, name);
            }
            NodeKind::CreationRef { ty, type_args } => {
                c.one(P::Type, ty).list(P::TypeArgs, type_args);
            }
            NodeKind::SimpleType { name } => {
                c.one(P::Name, name);
            }
            NodeKind::ParameterizedType { base, args } => {
                c.one(P::Type, base).list(P::TypeArgs, args);
            }
            NodeKind::ArrayType { element, dims } => {
                c.one(P::ElementType, element).list(P::Dims, dims);
            }
            NodeKind::UnionType { alternatives } => {
                c.list(P::Alternatives, alternatives);
            }
            NodeKind::Wildcard { bound, .. } => {
                c.opt(P::Bound, bound);
            }
        }
        c.out
    }

    /// Rebuilds this node with every child reference mapped through `f`, in
    /// document order.
    pub fn map<D>(&self, mut f: impl FnMut(&C) -> D) -> NodeKind<D> {
        fn opt<C, D>(value: &Option<C>, f: &mut impl FnMut(&C) -> D) -> Option<D> {
            value.as_ref().map(|c| f(c))
        }
        fn list<C, D>(values: &[C], f: &mut impl FnMut(&C) -> D) -> Vec<D> {
            values.iter().map(|c| f(c)).collect()
        }

        let f = &mut f;
        match self {
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            } => NodeKind::CompilationUnit {
                package: opt(package, f),
                imports: list(imports, f),
                types: list(types, f),
            },
            NodeKind::PackageDecl { name } => NodeKind::PackageDecl { name: f(name) },
            NodeKind::ImportDecl {
                is_static,
                on_demand,
                name,
            } => NodeKind::ImportDecl {
                is_static: *is_static,
                on_demand: *on_demand,
                name: f(name),
            },
            NodeKind::TypeDecl {
                modifiers,
                kind,
                name,
                type_params,
                superclass,
                interfaces,
                members,
            } => NodeKind::TypeDecl {
                modifiers: modifiers.clone(),
                kind: *kind,
                name: f(name),
                type_params: list(type_params, f),
                superclass: opt(superclass, f),
                interfaces: list(interfaces, f),
                members: list(members, f),
            },
            NodeKind::TypeParam { name, bounds } => NodeKind::TypeParam {
                name: f(name),
                bounds: list(bounds, f),
            },
            NodeKind::FieldDecl {
                modifiers,
                ty,
                fragments,
            } => NodeKind::FieldDecl {
                modifiers: modifiers.clone(),
                ty: f(ty),
                fragments: list(fragments, f),
            },
            NodeKind::MethodDecl {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                thrown,
                body,
            } => NodeKind::MethodDecl {
                modifiers: modifiers.clone(),
                type_params: list(type_params, f),
                return_type: opt(return_type, f),
                name: f(name),
                params: list(params, f),
                thrown: list(thrown, f),
                body: opt(body, f),
            },
            NodeKind::Initializer { is_static, body } => NodeKind::Initializer {
                is_static: *is_static,
                body: f(body),
            },
            NodeKind::Parameter {
                modifiers,
                ty,
                varargs,
                name,
            } => NodeKind::Parameter {
                modifiers: modifiers.clone(),
                ty: opt(ty, f),
                varargs: *varargs,
                name: f(name),
            },
            NodeKind::VarFragment { name, initializer } => NodeKind::VarFragment {
                name: f(name),
                initializer: opt(initializer, f),
            },
            NodeKind::AnonymousBody { members } => NodeKind::AnonymousBody {
                members: list(members, f),
            },
            NodeKind::Block { statements } => NodeKind::Block {
                statements: list(statements, f),
            },
            NodeKind::LocalVarDecl {
                modifiers,
                ty,
                fragments,
            } => NodeKind::LocalVarDecl {
                modifiers: modifiers.clone(),
                ty: f(ty),
                fragments: list(fragments, f),
            },
            NodeKind::ExprStmt { expr } => NodeKind::ExprStmt { expr: f(expr) },
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => NodeKind::If {
                condition: f(condition),
                then_branch: f(then_branch),
                else_branch: opt(else_branch, f),
            },
            NodeKind::While { condition, body } => NodeKind::While {
                condition: f(condition),
                body: f(body),
            },
            NodeKind::For {
                init,
                condition,
                updates,
                body,
            } => NodeKind::For {
                init: list(init, f),
                condition: opt(condition, f),
                updates: list(updates, f),
                body: f(body),
            },
            NodeKind::ForEach {
                param,
                iterable,
                body,
            } => NodeKind::ForEach {
                param: f(param),
                iterable: f(iterable),
                body: f(body),
            },
            NodeKind::Return { expr } => NodeKind::Return {
                expr: opt(expr, f),
            },
            NodeKind::Throw { expr } => NodeKind::Throw { expr: f(expr) },
            NodeKind::Break => NodeKind::Break,
            NodeKind::Continue => NodeKind::Continue,
            NodeKind::Empty => NodeKind::Empty,
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => NodeKind::Try {
                resources: list(resources, f),
                body: f(body),
                catches: list(catches, f),
                finally: opt(finally, f),
            },
            NodeKind::CatchClause { param, body } => NodeKind::CatchClause {
                param: f(param),
                body: f(body),
            },
            NodeKind::SimpleName { ident } => NodeKind::SimpleName {
                ident: ident.clone(),
            },
            NodeKind::QualifiedName { qualifier, name } => NodeKind::QualifiedName {
                qualifier: f(qualifier),
                name: f(name),
            },
            NodeKind::Literal { kind, text } => NodeKind::Literal {
                kind: *kind,
                text: text.clone(),
            },
            NodeKind::This { qualifier } => NodeKind::This {
                qualifier: opt(qualifier, f),
            },
            NodeKind::FieldAccess { receiver, name } => NodeKind::FieldAccess {
                receiver: f(receiver),
                name: f(name),
            },
            NodeKind::MethodCall {
                receiver,
                type_args,
                name,
                args,
            } => NodeKind::MethodCall {
                receiver: opt(receiver, f),
                type_args: list(type_args, f),
                name: f(name),
                args: list(args, f),
            },
            NodeKind::SuperMethodCall {
                qualifier,
                type_args,
                name,
                args,
            } => NodeKind::SuperMethodCall {
                qualifier: opt(qualifier, f),
                type_args: list(type_args, f),
                name: f(name),
                args: list(args, f),
            },
            NodeKind::New { ty, args, body } => NodeKind::New {
                ty: f(ty),
                args: list(args, f),
                body: opt(body, f),
            },
            NodeKind::ArrayCreation {
                element_ty,
                dims,
                extra_dims,
                initializer,
            } => NodeKind::ArrayCreation {
                element_ty: f(element_ty),
                dims: list(dims, f),
                extra_dims: *extra_dims,
                initializer: opt(initializer, f),
            },
            NodeKind::ArrayInit { elements } => NodeKind::ArrayInit {
                elements: list(elements, f),
            },
            NodeKind::ArrayAccess { array, index } => NodeKind::ArrayAccess {
                array: f(array),
                index: f(index),
            },
            NodeKind::Assign { op, lhs, rhs } => NodeKind::Assign {
                op: *op,
                lhs: f(lhs),
                rhs: f(rhs),
            },
            NodeKind::Binary { op, lhs, rhs } => NodeKind::Binary {
                op: *op,
                lhs: f(lhs),
                rhs: f(rhs),
            },
            NodeKind::Prefix { op, operand } => NodeKind::Prefix {
                op: *op,
                operand: f(operand),
            },
            NodeKind::Postfix { op, operand } => NodeKind::Postfix {
                op: *op,
                operand: f(operand),
            },
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => NodeKind::Conditional {
                condition: f(condition),
                then_expr: f(then_expr),
                else_expr: f(else_expr),
            },
            NodeKind::Cast { ty, expr } => NodeKind::Cast {
                ty: f(ty),
                expr: f(expr),
            },
            NodeKind::InstanceOf { expr, ty } => NodeKind::InstanceOf {
                expr: f(expr),
                ty: f(ty),
            },
            NodeKind::Paren { expr } => NodeKind::Paren { expr: f(expr) },
            NodeKind::Lambda {
                params,
                parenthesized,
                body,
            } => NodeKind::Lambda {
                params: list(params, f),
                parenthesized: *parenthesized,
                body: f(body),
            },
            NodeKind::ExprMethodRef {
                expr,
                type_args,
                name,
            } => NodeKind::ExprMethodRef {
                expr: f(expr),
                type_args: list(type_args, f),
                name: f(name),
            },
            NodeKind::TypeMethodRef {
                ty,
                type_args,
                name,
            } => NodeKind::TypeMethodRef {
                ty: f(ty),
                type_args: list(type_args, f),
                name: f(name),
            },
            NodeKind::SuperMethodRef {
                qualifier,
                type_args,
                name,
            } => NodeKind::SuperMethodRef {
                qualifier: opt(qualifier, f),
                type_args: list(type_args, f),
                name: f(name),
            },
            NodeKind::CreationRef { ty, type_args } => NodeKind::CreationRef {
                ty: f(ty),
                type_args: list(type_args, f),
            },
            NodeKind::VarDeclExpr {
                modifiers,
                ty,
                fragments,
            } => NodeKind::VarDeclExpr {
                modifiers: modifiers.clone(),
                ty: f(ty),
                fragments: list(fragments, f),
            },
            NodeKind::PrimitiveType { keyword } => NodeKind::PrimitiveType { keyword: *keyword },
            NodeKind::SimpleType { name } => NodeKind::SimpleType { name: f(name) },
            NodeKind::ParameterizedType { base, args } => NodeKind::ParameterizedType {
                base: f(base),
                args: list(args, f),
            },
            NodeKind::ArrayType { element, dims } => NodeKind::ArrayType {
                element: f(element),
                dims: list(dims, f),
            },
            NodeKind::Dimension => NodeKind::Dimension,
            NodeKind::UnionType { alternatives } => NodeKind::UnionType {
                alternatives: list(alternatives, f),
            },
            NodeKind::Wildcard { upper, bound } => NodeKind::Wildcard {
                upper: *upper,
                bound: opt(bound, f),
            },
        }
    }

    pub fn list(&self, prop: Prop) -> Option<&Vec<C>> {
        list_slots!(self, prop)
    }

    pub fn list_mut(&mut self, prop: Prop) -> Option<&mut Vec<C>> {
        list_slots!(self, prop)
    }

    pub fn optional(&self, prop: Prop) -> Option<&Option<C>> {
        optional_slots!(self, prop)
    }

    pub fn optional_mut(&mut self, prop: Prop) -> Option<&mut Option<C>> {
        optional_slots!(self, prop)
    }

    pub fn ident(&self) -> Option<&str> {
        match self {
            NodeKind::SimpleName { ident } => Some(ident),
            _ => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::LocalVarDecl { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::For { .. }
                | NodeKind::ForEach { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Empty
                | NodeKind::Try { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::SimpleName { .. }
                | NodeKind::QualifiedName { .. }
                | NodeKind::Literal { .. }
                | NodeKind::This { .. }
                | NodeKind::FieldAccess { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::SuperMethodCall { .. }
                | NodeKind::New { .. }
                | NodeKind::ArrayCreation { .. }
                | NodeKind::ArrayInit { .. }
                | NodeKind::ArrayAccess { .. }
                | NodeKind::Assign { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Prefix { .. }
                | NodeKind::Postfix { .. }
                | NodeKind::Conditional { .. }
                | NodeKind::Cast { .. }
                | NodeKind::InstanceOf { .. }
                | NodeKind::Paren { .. }
                | NodeKind::Lambda { .. }
                | NodeKind::ExprMethodRef { .. }
                | NodeKind::TypeMethodRef { .. }
                | NodeKind::SuperMethodRef { .. }
                | NodeKind::CreationRef { .. }
                | NodeKind::VarDeclExpr { .. }
        )
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::PrimitiveType { .. }
                | NodeKind::SimpleType { .. }
                | NodeKind::ParameterizedType { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::UnionType { .. }
                | NodeKind::Wildcard { .. }
        )
    }

    pub fn is_name(&self) -> bool {
        matches!(
            self,
            NodeKind::SimpleName { .. } | NodeKind::QualifiedName { .. }
        )
    }

    pub fn is_method_ref(&self) -> bool {
        matches!(
            self,
            NodeKind::ExprMethodRef { .. }
                | NodeKind::TypeMethodRef { .. }
                | NodeKind::SuperMethodRef { .. }
                | NodeKind::CreationRef { .. }
        )
    }

    pub fn is_body_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeDecl { .. }
                | NodeKind::FieldDecl { .. }
                | NodeKind::MethodDecl { .. }
                | NodeKind::Initializer { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "CompilationUnit",
            NodeKind::PackageDecl { .. } => "PackageDecl",
            NodeKind::ImportDecl { .. } => "ImportDecl",
            NodeKind::TypeDecl { .. } => "TypeDecl",
            NodeKind::TypeParam { .. } => "TypeParam",
            NodeKind::FieldDecl { .. } => "FieldDecl",
            NodeKind::MethodDecl { .. } => "MethodDecl",
            NodeKind::Initializer { .. } => "Initializer",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::VarFragment { .. } => "VarFragment",
            NodeKind::AnonymousBody { .. } => "AnonymousBody",
            NodeKind::Block { .. } => "Block",
            NodeKind::LocalVarDecl { .. } => "LocalVarDecl",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::For { .. } => "For",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::Return { .. } => "Return",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Empty => "Empty",
            NodeKind::Try { .. } => "Try",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::SimpleName { .. } => "SimpleName",
            NodeKind::QualifiedName { .. } => "QualifiedName",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::This { .. } => "This",
            NodeKind::FieldAccess { .. } => "FieldAccess",
            NodeKind::MethodCall { .. } => "MethodCall",
            NodeKind::SuperMethodCall { .. } => "SuperMethodCall",
            NodeKind::New { .. } => "New",
            NodeKind::ArrayCreation { .. } => "ArrayCreation",
            NodeKind::ArrayInit { .. } => "ArrayInit",
            NodeKind::ArrayAccess { .. } => "ArrayAccess",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Prefix { .. } => "Prefix",
            NodeKind::Postfix { .. } => "Postfix",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::InstanceOf { .. } => "InstanceOf",
            NodeKind::Paren { .. } => "Paren",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::ExprMethodRef { .. } => "ExprMethodRef",
            NodeKind::TypeMethodRef { .. } => "TypeMethodRef",
            NodeKind::SuperMethodRef { .. } => "SuperMethodRef",
            NodeKind::CreationRef { .. } => "CreationRef",
            NodeKind::VarDeclExpr { .. } => "VarDeclExpr",
            NodeKind::PrimitiveType { .. } => "PrimitiveType",
            NodeKind::SimpleType { .. } => "SimpleType",
            NodeKind::ParameterizedType { .. } => "ParameterizedType",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::Dimension => "Dimension",
            NodeKind::UnionType { .. } => "UnionType",
            NodeKind::Wildcard { .. } => "Wildcard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub range: TextRange,
    pub parent: Option<NodeId>,
    pub role: Option<Role>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {child:?} is a child of both {first:?} and {second:?}")]
    SharedChild {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },
    #[error("node {child:?} at {child_range:?} lies outside its parent {parent:?} at {parent_range:?}")]
    ChildOutsideParent {
        child: NodeId,
        child_range: TextRange,
        parent: NodeId,
        parent_range: TextRange,
    },
    #[error("siblings {first:?} and {second:?} overlap or are out of order")]
    OverlappingSiblings { first: NodeId, second: NodeId },
    #[error("node {0:?} is not reachable from the root")]
    Detached(NodeId),
}

/// Bottom-up tree construction: children are allocated before their parent.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<(NodeKind, TextRange)>,
}

/// Position in a [`TreeBuilder`] that allocation can be rewound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push((kind, range));
        id
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.idx()].1
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.idx()].0
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.nodes.len())
    }

    /// Discards every node allocated after `checkpoint`.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.nodes.truncate(checkpoint.0);
    }

    pub fn finish(self, root: NodeId, text: impl Into<String>) -> Result<SyntaxTree, TreeError> {
        let len = self.nodes.len();
        if root.idx() >= len {
            return Err(TreeError::UnknownNode(root));
        }

        let mut parents: Vec<Option<(NodeId, Role)>> = vec![None; len];
        for (idx, (kind, range)) in self.nodes.iter().enumerate() {
            let parent = NodeId::from_raw(idx as u32);
            let mut prev: Option<(NodeId, TextRange)> = None;
            for (role, &child) in kind.children() {
                if child.idx() >= len {
                    return Err(TreeError::UnknownNode(child));
                }
                if let Some((first, _)) = parents[child.idx()] {
                    return Err(TreeError::SharedChild {
                        child,
                        first,
                        second: parent,
                    });
                }
                let child_range = self.nodes[child.idx()].1;
                if !range.contains_range(child_range) {
                    return Err(TreeError::ChildOutsideParent {
                        child,
                        child_range,
                        parent,
                        parent_range: *range,
                    });
                }
                if let Some((prev_id, prev_range)) = prev {
                    if prev_range.end() > child_range.start() {
                        return Err(TreeError::OverlappingSiblings {
                            first: prev_id,
                            second: child,
                        });
                    }
                }
                prev = Some((child, child_range));
                parents[child.idx()] = Some((parent, role));
            }
        }

        for (idx, parent) in parents.iter().enumerate() {
            if idx != root.idx() && parent.is_none() {
                return Err(TreeError::Detached(NodeId::from_raw(idx as u32)));
            }
        }

        let nodes = self
            .nodes
            .into_iter()
            .zip(parents)
            .map(|((kind, range), parent)| NodeData {
                kind,
                range,
                parent: parent.map(|(p, _)| p),
                role: parent.map(|(_, r)| r),
            })
            .collect();

        Ok(SyntaxTree {
            text: text.into(),
            nodes,
            root,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxTree {
    text: String,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.idx() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.idx()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.idx()].kind
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.idx()].range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.idx()].parent
    }

    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.nodes[id.idx()].role
    }

    /// `true` if `id` sits in `prop` of its parent.
    pub fn has_role(&self, id: NodeId, prop: Prop) -> bool {
        self.role(id).is_some_and(|role| role.prop == prop)
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        &self.text[self.range(id)]
    }

    pub fn ident(&self, id: NodeId) -> Option<&str> {
        self.kind(id).ident()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id)
            .children()
            .into_iter()
            .map(|(_, child)| *child)
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(|idx| NodeId::from_raw(idx as u32))
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// `id` followed by its ancestors.
    pub fn ancestors_with_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&node| self.parent(node))
    }

    pub fn find_ancestor(
        &self,
        id: NodeId,
        mut pred: impl FnMut(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(id).find(|&node| pred(self.kind(node)))
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors_with_self(node).any(|n| n == ancestor)
    }

    /// `id` and all of its descendants in document order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Innermost node whose range contains `range`.
    pub fn covering_node(&self, range: TextRange) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for child in self.children(current) {
                if self.range(child).contains_range(range) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    pub fn covering_node_at(&self, offset: TextSize) -> NodeId {
        self.covering_node(TextRange::empty(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    fn name(builder: &mut TreeBuilder, ident: &str, start: u32) -> NodeId {
        builder.alloc(
            NodeKind::SimpleName {
                ident: ident.to_string(),
            },
            range(start, start + ident.len() as u32),
        )
    }

    #[test]
    fn finish_links_parents_and_roles() {
        // a.b
        let mut builder = TreeBuilder::new();
        let a = name(&mut builder, "a", 0);
        let b = name(&mut builder, "b", 2);
        let qualified = builder.alloc(
            NodeKind::QualifiedName {
                qualifier: a,
                name: b,
            },
            range(0, 3),
        );
        let tree = builder.finish(qualified, "a.b").unwrap();

        assert_eq!(tree.parent(a), Some(qualified));
        assert_eq!(tree.role(b), Some(Role::single(Prop::Name)));
        assert_eq!(tree.role(qualified), None);
        assert_eq!(tree.children(qualified), vec![a, b]);
        assert_eq!(tree.node_text(b), "b");
        assert_eq!(tree.covering_node(range(2, 3)), b);
        assert_eq!(tree.covering_node(range(0, 3)), qualified);
    }

    #[test]
    fn finish_rejects_overlapping_siblings() {
        let mut builder = TreeBuilder::new();
        let a = name(&mut builder, "ab", 0);
        let b = name(&mut builder, "b", 1);
        let qualified = builder.alloc(
            NodeKind::QualifiedName {
                qualifier: a,
                name: b,
            },
            range(0, 2),
        );
        let err = builder.finish(qualified, "ab").unwrap_err();
        assert_eq!(
            err,
            TreeError::OverlappingSiblings {
                first: a,
                second: b
            }
        );
    }

    #[test]
    fn finish_rejects_child_outside_parent() {
        let mut builder = TreeBuilder::new();
        let a = name(&mut builder, "abc", 0);
        let ty = builder.alloc(NodeKind::SimpleType { name: a }, range(0, 2));
        assert!(matches!(
            builder.finish(ty, "abc"),
            Err(TreeError::ChildOutsideParent { .. })
        ));
    }

    #[test]
    fn rewind_drops_speculative_nodes() {
        let mut builder = TreeBuilder::new();
        let a = name(&mut builder, "a", 0);
        let checkpoint = builder.checkpoint();
        name(&mut builder, "zzz", 0);
        builder.rewind(checkpoint);
        let ty = builder.alloc(NodeKind::SimpleType { name: a }, range(0, 1));
        let tree = builder.finish(ty, "a").unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn list_slots_are_addressable() {
        let mut kind: NodeKind = NodeKind::Block {
            statements: Vec::new(),
        };
        assert!(kind.list(Prop::Statements).is_some());
        assert!(kind.list(Prop::Args).is_none());
        kind.list_mut(Prop::Statements)
            .unwrap()
            .push(NodeId::from_raw(7));
        assert_eq!(kind.children().len(), 1);
        assert!(kind.optional_mut(Prop::Body).is_none());
    }

    #[test]
    fn modifier_keywords_follow_source_order() {
        let flags = ModifierFlags::FINAL | ModifierFlags::PRIVATE | ModifierFlags::STATIC;
        assert_eq!(
            flags.keywords().collect::<Vec<_>>(),
            vec!["private", "static", "final"]
        );
    }
}
