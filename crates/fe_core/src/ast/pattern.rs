//! Patterns (§3): wildcard, identifier, literal, variant with sub-patterns.
//! Consumed by pass 3 (typing the arms of a `match`) and pass 7
//! (exhaustiveness).

use crate::span::Span;

#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(Span),
    Identifier(String, Span),
    IntLiteral(i128, Span),
    StringLiteral(String, Span),
    Variant {
        name: String,
        subpatterns: Vec<Pattern>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(span)
            | Pattern::Identifier(_, span)
            | Pattern::IntLiteral(_, span)
            | Pattern::StringLiteral(_, span)
            | Pattern::Variant { span, .. } => span.clone(),
        }
    }

    /// A wildcard or a plain identifier pattern covers everything (§4.4.7).
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Pattern::Wildcard(_) | Pattern::Identifier(_, _))
    }
}
