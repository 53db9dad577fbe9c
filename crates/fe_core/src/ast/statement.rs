//! Statement variants (§3), plus the function/type parameter shapes and
//! declaration bodies they're built from.

use crate::ast::expression::Expression;
use crate::ast::type_expr::TypeExpr;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    In,
    Out,
    Invariant,
}

/// A generic parameter: may carry variance, an optional constraint type, and
/// a const-generic flag with the const's own type (§3 "Function and type
/// parameters").
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub variance: Variance,
    pub constraint: Option<TypeExpr>,
    pub const_type: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub type_expr: TypeExpr,
    pub inout: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub type_expr: Option<TypeExpr>,
    pub init: Expression,
    pub is_pub: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<FunctionParam>,
    pub return_type: TypeExpr,
    pub effects: Vec<String>,
    pub error_domain: Option<String>,
    pub is_pub: bool,
    pub is_export: bool,
    pub body: Block,
    pub span: Span,
    pub name_span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub underlying: TypeExpr,
    pub is_pub: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ErrorVariant {
    pub name: String,
    pub fields: Vec<(String, TypeExpr)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ErrorDecl {
    pub name: String,
    pub variants: Vec<ErrorVariant>,
    pub span: Span,
}

/// A domain may be declared as a union of standalone error type names, or
/// with inline variants (§3 "Symbols, scopes, and domains"). Both shapes are
/// materialised into the same variant list downstream (pass 1).
#[derive(Debug, Clone)]
pub enum DomainShape {
    Union(Vec<String>),
    Inline(Vec<ErrorVariant>),
}

#[derive(Debug, Clone)]
pub struct DomainDecl {
    pub name: String,
    pub shape: DomainShape,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub target: Expression,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub binding: String,
    pub iterable: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Statement {
    ConstDecl(VarDecl),
    VarDecl(VarDecl),
    FunctionDecl(FunctionDecl),
    TypeDecl(TypeDecl),
    ErrorDecl(ErrorDecl),
    DomainDecl(DomainDecl),
    Return(Option<Expression>, Span),
    Defer(Expression, Span),
    Expr(Expression),
    Assignment(Assignment),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Break(Span),
    Continue(Span),
    /// `use error D;` — a module-level default error domain for non-public
    /// functions that don't declare their own (§4.4.5).
    UseErrorDefault(String, Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::ConstDecl(decl) | Statement::VarDecl(decl) => decl.span.clone(),
            Statement::FunctionDecl(decl) => decl.span.clone(),
            Statement::TypeDecl(decl) => decl.span.clone(),
            Statement::ErrorDecl(decl) => decl.span.clone(),
            Statement::DomainDecl(decl) => decl.span.clone(),
            Statement::Return(_, span)
            | Statement::Defer(_, span)
            | Statement::Break(span)
            | Statement::Continue(span)
            | Statement::UseErrorDefault(_, span) => span.clone(),
            Statement::Expr(expr) => expr.span(),
            Statement::Assignment(assignment) => assignment.span.clone(),
            Statement::If(stmt) => stmt.span.clone(),
            Statement::While(stmt) => stmt.span.clone(),
            Statement::For(stmt) => stmt.span.clone(),
        }
    }

    /// A human-readable kind name, used by pass 1's duplicate-declaration
    /// diagnostic (`duplicate declaration of <kind> '<name>'`).
    pub fn declared_name(&self) -> Option<(&'static str, &str)> {
        match self {
            Statement::ConstDecl(decl) => Some(("constant", &decl.name)),
            Statement::VarDecl(decl) => Some(("variable", &decl.name)),
            Statement::FunctionDecl(decl) => Some(("function", &decl.name)),
            Statement::TypeDecl(decl) => Some(("type", &decl.name)),
            Statement::ErrorDecl(decl) => Some(("error type", &decl.name)),
            Statement::DomainDecl(decl) => Some(("domain", &decl.name)),
            _ => None,
        }
    }
}
