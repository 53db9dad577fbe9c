//! Pass 1: declaration collection (§4.4.1).
//!
//! Walks every top-level statement, binding one symbol per declaration into
//! the global scope and registering error/domain declarations into the
//! domain table. This pass is gated: any error it produces skips passes
//! 2 through 7 entirely, since resolution built on an incomplete symbol
//! table would only cascade (§4.4, "Pass ordering").

use crate::ast::{Module, Statement};
use crate::context::CompilationContext;
use crate::symbols::{Symbol, SymbolKind};

pub fn run(ctx: &mut CompilationContext, module: &Module) {
    for statement in &module.statements {
        declare_statement(ctx, statement);
    }

    // Error types must all be registered before any domain union is
    // resolved, so declaration order never matters (domains.rs).
    for statement in &module.statements {
        if let Statement::ErrorDecl(decl) = statement {
            ctx.domains.declare_error_type(decl.clone());
        }
    }
    for statement in &module.statements {
        if let Statement::DomainDecl(decl) = statement {
            if let Err(err) = ctx.domains.resolve_domain(decl) {
                ctx.diagnostics.add_error(
                    format!(
                        "domain '{}' references unknown error type '{}'",
                        err.domain_name, err.referenced_name
                    ),
                    err.span,
                );
            }
        }
    }
}

fn symbol_kind_for(label: &str) -> SymbolKind {
    match label {
        "constant" => SymbolKind::Constant,
        "variable" => SymbolKind::Variable,
        "function" => SymbolKind::Function,
        "type" => SymbolKind::TypeDef,
        "error type" => SymbolKind::TypeDef,
        "domain" => SymbolKind::Domain,
        _ => SymbolKind::Variable,
    }
}

fn declare_statement(ctx: &mut CompilationContext, statement: &Statement) {
    let Some((label, name)) = statement.declared_name() else {
        return;
    };
    let span = match statement {
        Statement::FunctionDecl(decl) => decl.name_span.clone(),
        _ => statement.span(),
    };
    let symbol = Symbol::new(name, symbol_kind_for(label), span.clone());
    if let Err(duplicate) = ctx.scope.declare(symbol) {
        ctx.diagnostics.add_error(
            format!(
                "duplicate declaration of {} '{}'",
                duplicate.kind, duplicate.name
            ),
            duplicate.span.clone(),
        );
        ctx.diagnostics.add_note(
            format!("'{}' first declared here", duplicate.name),
            duplicate.first_span,
        );
        return;
    }
    ctx.locations.record_reference(span.clone(), span);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ErrorDecl, ErrorVariant, Statement, VarDecl};
    use crate::ast::Expression;
    use std::rc::Rc;

    fn span() -> crate::span::Span {
        crate::span::Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    #[test]
    fn duplicate_top_level_constants_are_reported() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![
                Statement::ConstDecl(VarDecl {
                    name: "x".to_string(),
                    type_expr: None,
                    init: Expression::IntLiteral { value: 1, span: span() },
                    is_pub: false,
                    span: span(),
                }),
                Statement::ConstDecl(VarDecl {
                    name: "x".to_string(),
                    type_expr: None,
                    init: Expression::IntLiteral { value: 2, span: span() },
                    is_pub: false,
                    span: span(),
                }),
            ],
        };
        run(&mut ctx, &module);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn error_types_register_before_domain_unions_resolve() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![
                Statement::DomainDecl(crate::ast::DomainDecl {
                    name: "AppError".to_string(),
                    shape: crate::ast::DomainShape::Union(vec!["IoError".to_string()]),
                    span: span(),
                }),
                Statement::ErrorDecl(ErrorDecl {
                    name: "IoError".to_string(),
                    variants: vec![ErrorVariant {
                        name: "NotFound".to_string(),
                        fields: Vec::new(),
                        span: span(),
                    }],
                    span: span(),
                }),
            ],
        };
        run(&mut ctx, &module);
        assert!(!ctx.diagnostics.has_errors());
        assert!(ctx.domains.domain("AppError").is_some());
    }
}
