//! Parser-internal error type (§7.1 "Internal error representation" —
//! per-pass `thiserror` enum, converted to a [`Diagnostic`](crate::diagnostics::Diagnostic)
//! at the point the parser hands its result to `analyze`).

use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: &'static str, span: Span },

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("parser recursion limit ({limit}) exceeded")]
    RecursionLimitExceeded { limit: usize, span: Span },

    #[error("{message}")]
    Custom { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedEof { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::RecursionLimitExceeded { span, .. }
            | ParseError::Custom { span, .. } => span.clone(),
        }
    }
}
