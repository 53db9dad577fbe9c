//! Pass 5: error-domain checking (§4.4.5).
//!
//! `ok`/`err`/`check`/`ensure` are legal only inside a function with an
//! effective error domain: one it declares itself, or — for non-`pub`
//! functions — the module's `use error D;` default. Checks variant/field
//! shape against the domain table and the propagation subset rule for
//! `check`.

use crate::analyzer::error::DomainError;
use crate::ast::{Block, Expression, FunctionDecl, MatchArm, Statement};
use crate::context::CompilationContext;
use crate::typed_ast::TypedModule;
use crate::types::ResolvedType;

pub fn run(ctx: &mut CompilationContext, typed: &mut TypedModule) {
    let module_default = typed.module.statements.iter().find_map(|s| match s {
        Statement::UseErrorDefault(name, _) => Some(name.clone()),
        _ => None,
    });

    let decls: Vec<FunctionDecl> = typed
        .module
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::FunctionDecl(decl) => Some(decl.clone()),
            _ => None,
        })
        .collect();

    for decl in &decls {
        let domain = decl.error_domain.clone().or_else(|| {
            if decl.is_pub {
                None
            } else {
                module_default.clone()
            }
        });
        check_block(ctx, typed, &decl.body, domain.as_deref());
    }
}

fn check_block(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    block: &Block,
    domain: Option<&str>,
) {
    for statement in &block.statements {
        check_statement(ctx, typed, statement, domain);
    }
}

fn check_statement(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    statement: &Statement,
    domain: Option<&str>,
) {
    match statement {
        Statement::ConstDecl(decl) | Statement::VarDecl(decl) => {
            check_expr(ctx, typed, &decl.init, domain)
        }
        Statement::Return(Some(expr), _) | Statement::Defer(expr, _) | Statement::Expr(expr) => {
            check_expr(ctx, typed, expr, domain)
        }
        Statement::Return(None, _) => {}
        Statement::Assignment(assignment) => {
            check_expr(ctx, typed, &assignment.target, domain);
            check_expr(ctx, typed, &assignment.value, domain);
        }
        Statement::If(stmt) => {
            check_expr(ctx, typed, &stmt.condition, domain);
            check_block(ctx, typed, &stmt.then_block, domain);
            if let Some(else_block) = &stmt.else_block {
                check_block(ctx, typed, else_block, domain);
            }
        }
        Statement::While(stmt) => {
            check_expr(ctx, typed, &stmt.condition, domain);
            check_block(ctx, typed, &stmt.body, domain);
        }
        Statement::For(stmt) => {
            check_expr(ctx, typed, &stmt.iterable, domain);
            check_block(ctx, typed, &stmt.body, domain);
        }
        Statement::FunctionDecl(_)
        | Statement::TypeDecl(_)
        | Statement::ErrorDecl(_)
        | Statement::DomainDecl(_)
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::UseErrorDefault(_, _) => {}
    }
}

fn check_expr(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    expr: &Expression,
    domain: Option<&str>,
) {
    match expr {
        Expression::Ok { value, span } => {
            if domain.is_none() {
                report_outside(ctx, "ok", span.clone());
            }
            check_expr(ctx, typed, value, domain);
        }
        Expression::Err { variant, fields, span } => {
            match domain {
                None => report_outside(ctx, "err", span.clone()),
                Some(domain_name) => check_variant(ctx, domain_name, variant, fields, span.clone()),
            }
            for (_, value) in fields {
                check_expr(ctx, typed, value, domain);
            }
        }
        Expression::Check { inner, context_fields, span } => {
            if domain.is_none() {
                report_outside(ctx, "check", span.clone());
            } else if let Some(outer) = domain {
                if let Some(inner_ty) = typed.types.get(&inner.span()).cloned() {
                    if let ResolvedType::Result(_, inner_domain) = inner_ty.as_ref() {
                        if inner_domain != outer {
                            check_subset(ctx, inner_domain, outer, span.clone());
                        }
                    }
                }
            }
            check_expr(ctx, typed, inner, domain);
            for (_, value) in context_fields {
                check_expr(ctx, typed, value, domain);
            }
        }
        Expression::Ensure { condition, otherwise, span } => {
            if domain.is_none() {
                report_outside(ctx, "ensure", span.clone());
            }
            check_expr(ctx, typed, condition, domain);
            check_expr(ctx, typed, otherwise, domain);
        }
        Expression::Binary { left, right, .. } => {
            check_expr(ctx, typed, left, domain);
            check_expr(ctx, typed, right, domain);
        }
        Expression::Unary { operand, .. } => check_expr(ctx, typed, operand, domain),
        Expression::Call { callee, args, .. } => {
            check_expr(ctx, typed, callee, domain);
            for arg in args {
                check_expr(ctx, typed, arg, domain);
            }
        }
        Expression::FieldAccess { target, .. } => check_expr(ctx, typed, target, domain),
        Expression::Index { target, index, .. } => {
            check_expr(ctx, typed, target, domain);
            check_expr(ctx, typed, index, domain);
        }
        Expression::ArrayLiteral { elements, .. } => {
            for element in elements {
                check_expr(ctx, typed, element, domain);
            }
        }
        Expression::RecordLiteral { fields, .. } => {
            for (_, value) in fields {
                check_expr(ctx, typed, value, domain);
            }
        }
        Expression::Range { start, end, .. } => {
            check_expr(ctx, typed, start, domain);
            check_expr(ctx, typed, end, domain);
        }
        Expression::MapError { inner, mapper, .. } => {
            check_expr(ctx, typed, inner, domain);
            check_expr(ctx, typed, mapper, domain);
        }
        Expression::Match { scrutinee, arms, .. } => {
            check_expr(ctx, typed, scrutinee, domain);
            for MatchArm { guard, body, .. } in arms {
                if let Some(guard) = guard {
                    check_expr(ctx, typed, guard, domain);
                }
                check_expr(ctx, typed, body, domain);
            }
        }
        Expression::Lambda { body, error_domain, .. } => {
            let lambda_domain = error_domain.clone().or_else(|| domain.map(str::to_string));
            check_block(ctx, typed, body, lambda_domain.as_deref());
        }
        Expression::UnsafeCast { inner, .. } | Expression::Comptime { inner, .. } => {
            check_expr(ctx, typed, inner, domain)
        }
        Expression::With { context_fields, body, .. } => {
            for (_, value) in context_fields {
                check_expr(ctx, typed, value, domain);
            }
            check_block(ctx, typed, body, domain);
        }
        Expression::Block(block) => check_block(ctx, typed, block, domain),
        Expression::IntLiteral { .. }
        | Expression::FloatLiteral { .. }
        | Expression::StringLiteral { .. }
        | Expression::BytesLiteral { .. }
        | Expression::CharLiteral { .. }
        | Expression::BoolLiteral { .. }
        | Expression::NullLiteral(_)
        | Expression::UnitLiteral(_)
        | Expression::Id(_, _) => {}
    }
}

fn report_outside(ctx: &mut CompilationContext, construct: &'static str, span: crate::span::Span) {
    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
        DomainError::OutsideFallibleFunction {
            construct,
            span: span.clone(),
        }
        .to_string(),
        span,
    ));
}

fn check_variant(
    ctx: &mut CompilationContext,
    domain_name: &str,
    variant_name: &str,
    fields: &[(String, Expression)],
    span: crate::span::Span,
) {
    let Some(domain) = ctx.domains.domain(domain_name) else {
        return;
    };
    let declared_fields: Option<Vec<String>> = domain
        .variant(variant_name)
        .map(|v| v.fields.iter().map(|(n, _)| n.clone()).collect());

    match declared_fields {
        None => ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            DomainError::UnknownVariant {
                variant: variant_name.to_string(),
                domain: domain_name.to_string(),
                span: span.clone(),
            }
            .to_string(),
            span,
        )),
        Some(declared_names) => {
            let given_names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
            let mismatched = declared_names.len() != given_names.len()
                || declared_names.iter().any(|n| !given_names.contains(&n.as_str()));
            if mismatched {
                ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                    DomainError::FieldMismatch {
                        variant: variant_name.to_string(),
                        span: span.clone(),
                    }
                    .to_string(),
                    span,
                ));
            }
        }
    }
}

/// `check`'s propagation subset rule (§4.4.5): a propagated inner domain
/// must name only variants also present in the outer domain.
fn check_subset(ctx: &mut CompilationContext, inner: &str, outer: &str, span: crate::span::Span) {
    let Some(inner_names): Option<Vec<String>> = ctx
        .domains
        .domain(inner)
        .map(|d| d.variant_names().map(str::to_string).collect())
    else {
        return;
    };
    let Some(outer_names): Option<Vec<String>> = ctx
        .domains
        .domain(outer)
        .map(|d| d.variant_names().map(str::to_string).collect())
    else {
        return;
    };
    let is_subset = inner_names.iter().all(|name| outer_names.contains(name));
    if !is_subset {
        ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            DomainError::NotASubset {
                inner: inner.to_string(),
                outer: outer.to_string(),
                span: span.clone(),
            }
            .to_string(),
            span,
        ));
    }
}
