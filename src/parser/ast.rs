use crate::span::Spanned;

/// One parsed `.java` file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<Spanned<String>>,
    pub types: Vec<Spanned<ClassDecl>>,
}

impl CompilationUnit {
    pub fn find_type(&self, name: &str) -> Option<&Spanned<ClassDecl>> {
        self.types.iter().find(|t| t.node.name.node == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    /// Body skipped by the parser.
    Enum,
    /// `@interface`; body skipped by the parser.
    Annotation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub annotations: Vec<Spanned<String>>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub kind: TypeKind,
    pub name: Spanned<String>,
    pub modifiers: Modifiers,
    pub type_params: Vec<Spanned<String>>,
    pub extends: Vec<Spanned<TypeExpr>>,
    pub implements: Vec<Spanned<TypeExpr>>,
    pub members: Vec<Spanned<Member>>,
}

impl ClassDecl {
    /// Declared fields, flattened across multi-declarator field declarations.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDecl, &Declarator)> {
        self.members.iter().filter_map(|m| match &m.node {
            Member::Field(f) => Some(f),
            _ => None,
        })
        .flat_map(|f| f.vars.iter().map(move |v| (f, v)))
    }

    pub fn constructors(&self) -> impl Iterator<Item = (usize, &MethodDecl)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match &m.node {
            Member::Constructor(c) => Some((i, c)),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = (usize, &MethodDecl)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match &m.node {
            Member::Method(md) => Some((i, md)),
            _ => None,
        })
    }

    /// Method or constructor stored at member index `index`.
    pub fn callable(&self, index: usize) -> Option<&MethodDecl> {
        match self.members.get(index).map(|m| &m.node) {
            Some(Member::Method(m)) | Some(Member::Constructor(m)) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    Initializer { is_static: bool, body: Spanned<Block> },
    NestedType(Box<ClassDecl>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: Spanned<TypeExpr>,
    pub vars: Vec<Declarator>,
}

/// `name[] = init` in a field or local declaration.
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: Spanned<String>,
    /// Brackets written after the name, as in `int a[]`.
    pub extra_dims: usize,
    pub init: Option<Spanned<Expr>>,
}

/// A method or constructor. Constructors carry `void` as their return type.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<Spanned<String>>,
    pub return_type: Spanned<TypeExpr>,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    /// Brackets written after the parameter list, as in `int f()[]`.
    pub extra_dims: usize,
    pub throws: Vec<Spanned<TypeExpr>>,
    pub body: Option<Spanned<Block>>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub modifiers: Modifiers,
    pub ty: Spanned<TypeExpr>,
    pub name: Spanned<String>,
    pub extra_dims: usize,
    pub varargs: bool,
}

impl Param {
    /// The parameter type with trailing declarator brackets folded in.
    pub fn full_type(&self) -> TypeExpr {
        self.ty.node.with_extra_dims(self.extra_dims)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    Void,
    Class {
        scope: Option<Box<TypeExpr>>,
        name: String,
        type_args: Vec<TypeExpr>,
    },
    Array {
        elem: Box<TypeExpr>,
        dims: usize,
    },
    /// `?`, `? extends T`, `? super T`
    Wildcard(Option<Box<TypeExpr>>),
    /// `A | B` in a catch clause.
    Union(Vec<TypeExpr>),
    /// `A & B` in a cast.
    Intersection(Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn class(name: impl Into<String>) -> Self {
        TypeExpr::Class { scope: None, name: name.into(), type_args: Vec::new() }
    }

    pub fn array_of(elem: TypeExpr, dims: usize) -> Self {
        if dims == 0 {
            return elem;
        }
        match elem {
            TypeExpr::Array { elem, dims: inner } => TypeExpr::Array { elem, dims: inner + dims },
            other => TypeExpr::Array { elem: Box::new(other), dims },
        }
    }

    pub fn with_extra_dims(&self, extra: usize) -> Self {
        TypeExpr::array_of(self.clone(), extra)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeExpr::Void)
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Primitive(p) => write!(f, "{}", p.name()),
            TypeExpr::Void => write!(f, "void"),
            TypeExpr::Class { scope, name, type_args } => {
                if let Some(scope) = scope {
                    write!(f, "{scope}.")?;
                }
                write!(f, "{name}")?;
                if !type_args.is_empty() {
                    let args: Vec<String> = type_args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TypeExpr::Array { elem, dims } => {
                write!(f, "{elem}")?;
                for _ in 0..*dims {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            TypeExpr::Wildcard(None) => write!(f, "?"),
            TypeExpr::Wildcard(Some(bound)) => write!(f, "? extends {bound}"),
            TypeExpr::Union(types) => {
                let parts: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "{}", parts.join(" | "))
            }
            TypeExpr::Intersection(types) => {
                let parts: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "{}", parts.join(" & "))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    /// Local variable declaration (also produced by `for` initialisers).
    LocalVar(LocalVar),
    Expr(Spanned<Expr>),
    If {
        condition: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        condition: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        condition: Spanned<Expr>,
    },
    For {
        init: Vec<Spanned<Stmt>>,
        condition: Option<Spanned<Expr>>,
        update: Vec<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    ForEach {
        var: LocalVar,
        iterable: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Return(Option<Spanned<Expr>>),
    Break(Option<Spanned<String>>),
    Continue(Option<Spanned<String>>),
    Switch {
        selector: Spanned<Expr>,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: Spanned<String>,
        body: Box<Spanned<Stmt>>,
    },
    Throw(Spanned<Expr>),
    Try {
        resources: Vec<LocalVar>,
        body: Spanned<Block>,
        catches: Vec<CatchClause>,
        finally: Option<Spanned<Block>>,
    },
    Synchronized {
        lock: Spanned<Expr>,
        body: Spanned<Block>,
    },
    Assert {
        condition: Spanned<Expr>,
        message: Option<Spanned<Expr>>,
    },
    /// `this(...)`, `super(...)` or `outer.super(...)` at the head of a constructor.
    ExplicitCtorCall {
        is_this: bool,
        qualifier: Option<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    LocalClass(Box<ClassDecl>),
    Empty,
}

#[derive(Debug, Clone)]
pub struct LocalVar {
    pub modifiers: Modifiers,
    pub ty: Spanned<TypeExpr>,
    pub vars: Vec<Declarator>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub label: Option<Spanned<Expr>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Param,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::UShr => ">>>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Operators whose result is `boolean` regardless of operand types.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq | BinOp::Eq | BinOp::NotEq | BinOp::And | BinOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<Spanned<Expr>>),
    Block(Spanned<Block>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal text exactly as written in the source.
    Literal { kind: LiteralKind, text: String },
    Name(String),
    FieldAccess {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
    ArrayAccess {
        array: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    MethodCall {
        scope: Option<Box<Spanned<Expr>>>,
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    ObjectCreation {
        ty: Spanned<TypeExpr>,
        args: Vec<Spanned<Expr>>,
        body: Option<Vec<Spanned<Member>>>,
    },
    ArrayCreation {
        elem: Spanned<TypeExpr>,
        dims: Vec<Spanned<Expr>>,
        /// Trailing `[]` with no size expression.
        extra_dims: usize,
        init: Option<Vec<Spanned<Expr>>>,
    },
    ArrayInit(Vec<Spanned<Expr>>),
    Assign {
        op: AssignOp,
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Cast {
        ty: Spanned<TypeExpr>,
        expr: Box<Spanned<Expr>>,
    },
    Conditional {
        condition: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
    },
    InstanceOf {
        expr: Box<Spanned<Expr>>,
        ty: Spanned<TypeExpr>,
    },
    Enclosed(Box<Spanned<Expr>>),
    This(Option<String>),
    Super(Option<String>),
    /// `Foo.class`
    ClassLit(Spanned<TypeExpr>),
    Lambda {
        params: Vec<Spanned<String>>,
        body: LambdaBody,
    },
    MethodRef {
        scope: Box<Spanned<Expr>>,
        name: Spanned<String>,
    },
}

impl Expr {
    /// Short source-like rendering for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Expr::Literal { text, .. } => text.clone(),
            Expr::Name(n) => n.clone(),
            Expr::FieldAccess { object, field } => format!("{}.{}", object.node.describe(), field.node),
            Expr::ArrayAccess { array, index } => format!("{}[{}]", array.node.describe(), index.node.describe()),
            Expr::MethodCall { scope: Some(scope), name, .. } => format!("{}.{}(..)", scope.node.describe(), name.node),
            Expr::MethodCall { scope: None, name, .. } => format!("{}(..)", name.node),
            Expr::ObjectCreation { ty, .. } => format!("new {}(..)", ty.node),
            Expr::ArrayCreation { elem, .. } => format!("new {}[..]", elem.node),
            Expr::ArrayInit(_) => "{..}".to_string(),
            Expr::Assign { target, op, .. } => format!("{} {} ..", target.node.describe(), op.as_str()),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", lhs.node.describe(), op.as_str(), rhs.node.describe())
            }
            Expr::Unary { op, operand } if op.is_postfix() => format!("{}{}", operand.node.describe(), op.as_str()),
            Expr::Unary { op, operand } => format!("{}{}", op.as_str(), operand.node.describe()),
            Expr::Cast { ty, expr } => format!("({}) {}", ty.node, expr.node.describe()),
            Expr::Conditional { condition, .. } => format!("{} ? .. : ..", condition.node.describe()),
            Expr::InstanceOf { expr, ty } => format!("{} instanceof {}", expr.node.describe(), ty.node),
            Expr::Enclosed(inner) => format!("({})", inner.node.describe()),
            Expr::This(Some(q)) => format!("{q}.this"),
            Expr::This(None) => "this".to_string(),
            Expr::Super(Some(q)) => format!("{q}.super"),
            Expr::Super(None) => "super".to_string(),
            Expr::ClassLit(ty) => format!("{}.class", ty.node),
            Expr::Lambda { .. } => "lambda".to_string(),
            Expr::MethodRef { scope, name } => format!("{}::{}", scope.node.describe(), name.node),
        }
    }
}
