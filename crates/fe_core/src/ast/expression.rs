//! Expression variants (§3 "Untyped AST" — expression variants).

use crate::ast::pattern::Pattern;
use crate::ast::statement::{Block, FunctionParam};
use crate::ast::type_expr::TypeExpr;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expression>,
    pub body: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expression {
    IntLiteral {
        value: i128,
        span: Span,
    },
    FloatLiteral {
        value: f64,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    BytesLiteral {
        value: Vec<u8>,
        span: Span,
    },
    CharLiteral {
        value: char,
        span: Span,
    },
    BoolLiteral {
        value: bool,
        span: Span,
    },
    NullLiteral(Span),
    UnitLiteral(Span),
    Id(String, Span),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        span: Span,
    },
    FieldAccess {
        target: Box<Expression>,
        field: String,
        span: Span,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<Expression>,
        span: Span,
    },
    RecordLiteral {
        type_name: Option<String>,
        fields: Vec<(String, Expression)>,
        span: Span,
    },
    Range {
        start: Box<Expression>,
        end: Box<Expression>,
        inclusive: bool,
        span: Span,
    },
    Ok {
        value: Box<Expression>,
        span: Span,
    },
    Err {
        variant: String,
        fields: Vec<(String, Expression)>,
        span: Span,
    },
    /// `check expr` or `check expr with { k: v, … }` — the optional `with`
    /// clause attaches extra context fields to the error if it propagates.
    Check {
        inner: Box<Expression>,
        context_fields: Vec<(String, Expression)>,
        span: Span,
    },
    Ensure {
        condition: Box<Expression>,
        otherwise: Box<Expression>,
        span: Span,
    },
    MapError {
        inner: Box<Expression>,
        param: String,
        mapper: Box<Expression>,
        span: Span,
    },
    Match {
        scrutinee: Box<Expression>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Lambda {
        params: Vec<FunctionParam>,
        return_type: Option<TypeExpr>,
        effects: Vec<String>,
        error_domain: Option<String>,
        body: Box<Block>,
        span: Span,
    },
    UnsafeCast {
        target_type: TypeExpr,
        inner: Box<Expression>,
        span: Span,
    },
    Comptime {
        inner: Box<Expression>,
        span: Span,
    },
    /// `with context { k: v, … } in { block }`.
    With {
        context_fields: Vec<(String, Expression)>,
        body: Box<Block>,
        span: Span,
    },
    /// A block used in expression position, yielding the value of its last
    /// expression-statement.
    Block(Box<Block>),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::IntLiteral { span, .. }
            | Expression::FloatLiteral { span, .. }
            | Expression::StringLiteral { span, .. }
            | Expression::BytesLiteral { span, .. }
            | Expression::CharLiteral { span, .. }
            | Expression::BoolLiteral { span, .. }
            | Expression::NullLiteral(span)
            | Expression::UnitLiteral(span)
            | Expression::Id(_, span)
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Call { span, .. }
            | Expression::FieldAccess { span, .. }
            | Expression::Index { span, .. }
            | Expression::ArrayLiteral { span, .. }
            | Expression::RecordLiteral { span, .. }
            | Expression::Range { span, .. }
            | Expression::Ok { span, .. }
            | Expression::Err { span, .. }
            | Expression::Check { span, .. }
            | Expression::Ensure { span, .. }
            | Expression::MapError { span, .. }
            | Expression::Match { span, .. }
            | Expression::Lambda { span, .. }
            | Expression::UnsafeCast { span, .. }
            | Expression::Comptime { span, .. }
            | Expression::With { span, .. } => span.clone(),
            Expression::Block(block) => block.span.clone(),
        }
    }
}
