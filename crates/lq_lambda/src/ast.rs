//! Flat AST for micro-lambda bodies.
//!
//! Expressions live in an [`ExprArena`] and refer to each other by
//! [`ExprId`]; a parsed lambda owns exactly one arena.

use std::fmt;

use lq_value::Value;
use smallvec::SmallVec;

/// Byte range into the lambda text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Index into an [`ExprArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Argument lists rarely exceed four entries.
pub type ExprList = SmallVec<[ExprId; 4]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// `.`
    Concat,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    /// `??`
    Coalesce,
}

impl BinaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => ".",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Left-hand side of `=`.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    /// `$name = ...`
    Var(String),
    /// `$ctx->field = ...`
    Ctx(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Scalar literal.
    Literal(Value),
    /// `$name`
    Var(String),
    /// `$ctx->field`
    CtxField(String),
    /// `[a, 'k' => b]`
    Array(Vec<(Option<ExprId>, ExprId)>),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    /// `cond ? then : otherwise`; `then` is absent for `cond ?: otherwise`.
    Ternary {
        cond: ExprId,
        then: Option<ExprId>,
        otherwise: ExprId,
    },
    Index {
        target: ExprId,
        index: ExprId,
    },
    /// `target->name`
    Member {
        target: ExprId,
        name: String,
    },
    /// `receiver->method(args)`
    MethodCall {
        receiver: ExprId,
        method: String,
        args: ExprList,
    },
    /// `name(args)`
    Call {
        name: String,
        args: ExprList,
    },
    Assign {
        target: AssignTarget,
        value: ExprId,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(ExprId),
    Return(ExprId),
}

/// Lambda body: a single expression or a braced statement block.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Expr(ExprId),
    Block(Vec<Stmt>),
}

/// Storage for every expression of one lambda.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "expression count is bounded by lambda text length, which fits in u32"
    )]
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn span(&self, id: ExprId) -> Span {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.exprs.iter()
    }
}
