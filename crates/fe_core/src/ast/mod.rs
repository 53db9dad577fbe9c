//! The untyped AST (§3). A tagged tree: every node owns its children and
//! carries a [`Span`](crate::span::Span). This tree is the *scratch* arena of
//! spec.md §5 — it is handed to the semantic analyser by value and dropped
//! once the typed module no longer needs it (see `crate::context`).

pub mod expression;
pub mod pattern;
pub mod statement;
pub mod type_expr;

pub use expression::{BinaryOp, Expression, MatchArm, UnaryOp};
pub use pattern::Pattern;
pub use statement::{
    Block, DomainDecl, DomainShape, ErrorDecl, ErrorVariant, ForStatement, FunctionDecl,
    FunctionParam, IfStatement, Statement, TypeDecl, TypeParam, Variance, VarDecl, WhileStatement,
};
pub use type_expr::{ConstExpr, TypeExpr};

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub span: Span,
}

/// Optional package declaration, list of import declarations, list of
/// top-level statements (§3 "Untyped AST").
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub statements: Vec<Statement>,
}
