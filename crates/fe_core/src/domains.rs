//! Error-domain table (component 6, §3/§4.4.1 "Error-domain checking").
//!
//! A domain names a closed set of error variants. It can be declared two
//! ways — `domain D = A | B;` (a union of standalone error type names) or
//! `domain D { Variant(..), .. }` (inline variants) — and both shapes
//! materialise into the same flat variant list here, so pass 5 never has to
//! care which syntax produced a given domain.

use std::collections::HashMap;

use crate::ast::{DomainDecl, DomainShape, ErrorDecl, ErrorVariant};
use crate::span::Span;

#[derive(Debug, Clone)]
pub struct ResolvedDomain {
    pub name: String,
    pub variants: Vec<ErrorVariant>,
    pub span: Span,
}

impl ResolvedDomain {
    pub fn variant(&self, name: &str) -> Option<&ErrorVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name.as_str())
    }
}

/// Raised when a `domain D = A | B;` union names an error type that was
/// never declared with `error`.
#[derive(Debug, Clone)]
pub struct UnknownErrorType {
    pub domain_name: String,
    pub referenced_name: String,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct DomainTable {
    domains: HashMap<String, ResolvedDomain>,
    /// Standalone `error E { .. }` declarations, kept so domain unions can
    /// pull in their variants; also consulted by `ok`/`err` expression
    /// typing when a bare error type name is used outside a domain.
    error_types: HashMap<String, ErrorDecl>,
}

impl DomainTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_error_type(&mut self, decl: ErrorDecl) {
        self.error_types.insert(decl.name.clone(), decl);
    }

    pub fn error_type(&self, name: &str) -> Option<&ErrorDecl> {
        self.error_types.get(name)
    }

    /// Materialise a `DomainDecl`'s shape into a flat variant list. For a
    /// `Union`, every named error type must already be registered via
    /// `declare_error_type` (pass 1 registers all error/domain declarations
    /// before resolving any union, so declaration order in source doesn't
    /// matter).
    pub fn resolve_domain(&mut self, decl: &DomainDecl) -> Result<(), UnknownErrorType> {
        let variants = match &decl.shape {
            DomainShape::Inline(variants) => variants.clone(),
            DomainShape::Union(names) => {
                let mut variants = Vec::new();
                for name in names {
                    let error_type =
                        self.error_types
                            .get(name)
                            .ok_or_else(|| UnknownErrorType {
                                domain_name: decl.name.clone(),
                                referenced_name: name.clone(),
                                span: decl.span.clone(),
                            })?;
                    variants.extend(error_type.variants.clone());
                }
                variants
            }
        };

        self.domains.insert(
            decl.name.clone(),
            ResolvedDomain {
                name: decl.name.clone(),
                variants,
                span: decl.span.clone(),
            },
        );
        Ok(())
    }

    pub fn domain(&self, name: &str) -> Option<&ResolvedDomain> {
        self.domains.get(name)
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn span() -> Span {
        Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    fn variant(name: &str) -> ErrorVariant {
        ErrorVariant {
            name: name.to_string(),
            fields: Vec::new(),
            span: span(),
        }
    }

    #[test]
    fn inline_domain_keeps_its_own_variants() {
        let mut table = DomainTable::new();
        let decl = DomainDecl {
            name: "Db".to_string(),
            shape: DomainShape::Inline(vec![variant("NotFound"), variant("Timeout")]),
            span: span(),
        };
        table.resolve_domain(&decl).unwrap();
        let domain = table.domain("Db").unwrap();
        assert_eq!(domain.variant_names().collect::<Vec<_>>(), ["NotFound", "Timeout"]);
    }

    #[test]
    fn union_domain_concatenates_referenced_error_types() {
        let mut table = DomainTable::new();
        table.declare_error_type(ErrorDecl {
            name: "IoError".to_string(),
            variants: vec![variant("NotFound")],
            span: span(),
        });
        table.declare_error_type(ErrorDecl {
            name: "NetError".to_string(),
            variants: vec![variant("Timeout")],
            span: span(),
        });

        let decl = DomainDecl {
            name: "AppError".to_string(),
            shape: DomainShape::Union(vec!["IoError".to_string(), "NetError".to_string()]),
            span: span(),
        };
        table.resolve_domain(&decl).unwrap();
        let domain = table.domain("AppError").unwrap();
        assert_eq!(
            domain.variant_names().collect::<Vec<_>>(),
            ["NotFound", "Timeout"]
        );
    }

    #[test]
    fn union_domain_rejects_unknown_error_type() {
        let mut table = DomainTable::new();
        let decl = DomainDecl {
            name: "AppError".to_string(),
            shape: DomainShape::Union(vec!["Missing".to_string()]),
            span: span(),
        };
        let err = table.resolve_domain(&decl).unwrap_err();
        assert_eq!(err.referenced_name, "Missing");
    }
}
