//! Type expressions (§3 "Untyped AST" — type expressions), resolved by pass 2
//! into `crate::types::ResolvedType`.

use crate::span::Span;

/// `N` in `Array<T, N>` must be a const expression; a literal integer is
/// handled in α1, anything else is diagnosed during pass 2 (spec.md §4.4.2).
#[derive(Debug, Clone)]
pub enum ConstExpr {
    IntLiteral(i128, Span),
    Id(String, Span),
}

impl ConstExpr {
    pub fn span(&self) -> Span {
        match self {
            ConstExpr::IntLiteral(_, span) | ConstExpr::Id(_, span) => span.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// A simple named type: `i32`, `MyStruct`, a type parameter name.
    Named(String, Span),
    /// `Name<args>`.
    Generic {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// `Array<T, N>` (dynamic-sized when no `N` is given: represented with
    /// `size: None`).
    Array {
        element: Box<TypeExpr>,
        size: Option<ConstExpr>,
        span: Span,
    },
    /// `Vector<T>` / `Vector<T, N>`, the SIMD vector type.
    Vector {
        element: Box<TypeExpr>,
        size: Option<ConstExpr>,
        span: Span,
    },
    /// `View<T>` / `View<mut T>`.
    View {
        element: Box<TypeExpr>,
        mutable: bool,
        span: Span,
    },
    /// `T?`.
    Nullable(Box<TypeExpr>, Span),
    /// Function type, with effect and error-domain clauses.
    Function {
        params: Vec<TypeExpr>,
        return_type: Box<TypeExpr>,
        effects: Vec<String>,
        error_domain: Option<String>,
        span: Span,
    },
    Record {
        fields: Vec<(String, TypeExpr)>,
        span: Span,
    },
    /// A discriminated-union type expression (anonymous, inline union of
    /// member types — distinct from a declared `domain` union).
    Union {
        variants: Vec<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named(_, span)
            | TypeExpr::Generic { span, .. }
            | TypeExpr::Array { span, .. }
            | TypeExpr::Vector { span, .. }
            | TypeExpr::View { span, .. }
            | TypeExpr::Nullable(_, span)
            | TypeExpr::Function { span, .. }
            | TypeExpr::Record { span, .. }
            | TypeExpr::Union { span, .. } => span.clone(),
        }
    }
}
