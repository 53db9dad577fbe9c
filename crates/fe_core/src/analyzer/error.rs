//! Per-pass internal error enums (§7.1). Each is converted into a
//! [`Diagnostic`](crate::diagnostics::Diagnostic) at the point its pass
//! emits it — these enums exist so a pass can use `?` internally while the
//! `DiagnosticsCollector` stays the single user-facing sink.

use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Clone, Error)]
pub enum DeclarationError {
    #[error("duplicate declaration of {kind} '{name}'")]
    Duplicate {
        kind: &'static str,
        name: String,
        span: Span,
        first_span: Span,
    },
    #[error("domain '{domain_name}' references unknown error type '{referenced_name}'")]
    UnknownErrorType {
        domain_name: String,
        referenced_name: String,
        span: Span,
    },
}

impl DeclarationError {
    pub fn span(&self) -> Span {
        match self {
            DeclarationError::Duplicate { span, .. } => span.clone(),
            DeclarationError::UnknownErrorType { span, .. } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String, span: Span },
    #[error("'{name}' is not a type")]
    NotAType { name: String, span: Span },
    #[error("wrong number of type arguments for '{name}': expected {expected}, found {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("unknown effect '{name}'")]
    UnknownEffect { name: String, span: Span },
    #[error("invalid const expression in array/vector size")]
    InvalidConstExpr { span: Span },
}

impl ResolutionError {
    pub fn span(&self) -> Span {
        match self {
            ResolutionError::UnknownType { span, .. }
            | ResolutionError::NotAType { span, .. }
            | ResolutionError::WrongArity { span, .. }
            | ResolutionError::UnknownEffect { span, .. }
            | ResolutionError::InvalidConstExpr { span } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum TypeError {
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("undefined name '{name}'")]
    UndefinedName { name: String, span: Span },
    #[error("expected {expected} arguments, found {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("called value is not a function")]
    NotCallable { span: Span },
    #[error("no field '{field}' on this type")]
    UnknownField { field: String, span: Span },
    #[error("cannot assign to '{name}': not a mutable binding")]
    AssignToImmutable { name: String, span: Span },
    #[error("cannot assign to a non-name expression")]
    AssignToNonName { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::UndefinedName { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::NotCallable { span }
            | TypeError::UnknownField { span, .. }
            | TypeError::AssignToImmutable { span, .. }
            | TypeError::AssignToNonName { span } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum EffectError {
    #[error("function body uses effect '{effect}' not declared in its signature")]
    UndeclaredEffect { effect: String, span: Span },
    #[error("exported function '{name}' must declare its effects explicitly")]
    ExportMissingEffects { name: String, span: Span },
    #[error("missing in-scope capability for effect '{effect}'")]
    MissingCapability { effect: String, span: Span },
}

impl EffectError {
    pub fn span(&self) -> Span {
        match self {
            EffectError::UndeclaredEffect { span, .. }
            | EffectError::ExportMissingEffects { span, .. }
            | EffectError::MissingCapability { span, .. } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("'{construct}' used outside a function with a declared error domain")]
    OutsideFallibleFunction { construct: &'static str, span: Span },
    #[error("unknown variant '{variant}' in domain '{domain}'")]
    UnknownVariant {
        variant: String,
        domain: String,
        span: Span,
    },
    #[error("variant '{variant}' field mismatch")]
    FieldMismatch { variant: String, span: Span },
    #[error("propagated domain '{inner}' is not a subset of '{outer}'")]
    NotASubset {
        inner: String,
        outer: String,
        span: Span,
    },
}

impl DomainError {
    pub fn span(&self) -> Span {
        match self {
            DomainError::OutsideFallibleFunction { span, .. }
            | DomainError::UnknownVariant { span, .. }
            | DomainError::FieldMismatch { span, .. }
            | DomainError::NotASubset { span, .. } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RegionError {
    #[error("use of moved value '{name}'")]
    UseAfterMove {
        name: String,
        span: Span,
        moved_at: Span,
    },
    #[error("'{name}' may be moved more than once: the loop body can run more than once")]
    MoveInLoopBody { name: String, span: Span },
    #[error("view '{name}' escapes the region that created it via return")]
    ViewEscapesScope { name: String, span: Span },
}

impl RegionError {
    pub fn span(&self) -> Span {
        match self {
            RegionError::UseAfterMove { span, .. }
            | RegionError::MoveInLoopBody { span, .. }
            | RegionError::ViewEscapesScope { span, .. } => span.clone(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ExhaustivenessError {
    #[error("match on domain '{domain}' is not exhaustive: missing variant(s) {missing:?}")]
    MissingVariants {
        domain: String,
        missing: Vec<String>,
        span: Span,
    },
}

impl ExhaustivenessError {
    pub fn span(&self) -> Span {
        match self {
            ExhaustivenessError::MissingVariants { span, .. } => span.clone(),
        }
    }
}
