//! Pass 7: pattern exhaustiveness (§4.4.7).
//!
//! `match` expressions over a `Result(_, domain)` scrutinee are checked
//! against the domain's declared, closed variant set: a missing variant is
//! an error. `match` over an anonymous `Union` scrutinee is checked the same
//! way, but a missing variant is only a warning, since nothing closes off an
//! inline union's membership the way a domain declaration does (`Union`
//! members that aren't themselves `Named` types are left unchecked — no
//! variant name to report). Any other resolved type is left alone; there's
//! no closed-world variant list to check it against. A catch-all arm always
//! satisfies the check regardless of source.

use crate::analyzer::error::ExhaustivenessError;
use crate::ast::{Block, Expression, FunctionDecl, MatchArm, Module, Pattern, Statement};
use crate::context::CompilationContext;
use crate::typed_ast::TypedModule;
use crate::types::ResolvedType;

pub fn run(ctx: &mut CompilationContext, typed: &mut TypedModule) {
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
        check_block(ctx, typed, &decl.body);
    }
}

fn check_block(ctx: &mut CompilationContext, typed: &mut TypedModule, block: &Block) {
    for statement in &block.statements {
        check_statement(ctx, typed, statement);
    }
}

fn check_statement(ctx: &mut CompilationContext, typed: &mut TypedModule, statement: &Statement) {
    match statement {
        Statement::ConstDecl(decl) | Statement::VarDecl(decl) => {
            check_expr(ctx, typed, &decl.init)
        }
        Statement::Return(Some(expr), _) | Statement::Defer(expr, _) | Statement::Expr(expr) => {
            check_expr(ctx, typed, expr)
        }
        Statement::Return(None, _) => {}
        Statement::Assignment(assignment) => {
            check_expr(ctx, typed, &assignment.target);
            check_expr(ctx, typed, &assignment.value);
        }
        Statement::If(stmt) => {
            check_expr(ctx, typed, &stmt.condition);
            check_block(ctx, typed, &stmt.then_block);
            if let Some(else_block) = &stmt.else_block {
                check_block(ctx, typed, else_block);
            }
        }
        Statement::While(stmt) => {
            check_expr(ctx, typed, &stmt.condition);
            check_block(ctx, typed, &stmt.body);
        }
        Statement::For(stmt) => {
            check_expr(ctx, typed, &stmt.iterable);
            check_block(ctx, typed, &stmt.body);
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

fn check_expr(ctx: &mut CompilationContext, typed: &mut TypedModule, expr: &Expression) {
    match expr {
        Expression::Match { scrutinee, arms, span } => {
            check_expr(ctx, typed, scrutinee);
            for arm in arms {
                check_expr(ctx, typed, &arm.body);
                if let Some(guard) = &arm.guard {
                    check_expr(ctx, typed, guard);
                }
            }
            check_match(ctx, typed, scrutinee, arms, span.clone());
        }
        Expression::Binary { left, right, .. } => {
            check_expr(ctx, typed, left);
            check_expr(ctx, typed, right);
        }
        Expression::Unary { operand, .. } => check_expr(ctx, typed, operand),
        Expression::Call { callee, args, .. } => {
            check_expr(ctx, typed, callee);
            for arg in args {
                check_expr(ctx, typed, arg);
            }
        }
        Expression::FieldAccess { target, .. } => check_expr(ctx, typed, target),
        Expression::Index { target, index, .. } => {
            check_expr(ctx, typed, target);
            check_expr(ctx, typed, index);
        }
        Expression::ArrayLiteral { elements, .. } => {
            for element in elements {
                check_expr(ctx, typed, element);
            }
        }
        Expression::RecordLiteral { fields, .. } => {
            for (_, value) in fields {
                check_expr(ctx, typed, value);
            }
        }
        Expression::Range { start, end, .. } => {
            check_expr(ctx, typed, start);
            check_expr(ctx, typed, end);
        }
        Expression::Ok { value, .. } => check_expr(ctx, typed, value),
        Expression::Err { fields, .. } => {
            for (_, value) in fields {
                check_expr(ctx, typed, value);
            }
        }
        Expression::Check { inner, context_fields, .. } => {
            check_expr(ctx, typed, inner);
            for (_, value) in context_fields {
                check_expr(ctx, typed, value);
            }
        }
        Expression::Ensure { condition, otherwise, .. } => {
            check_expr(ctx, typed, condition);
            check_expr(ctx, typed, otherwise);
        }
        Expression::MapError { inner, mapper, .. } => {
            check_expr(ctx, typed, inner);
            check_expr(ctx, typed, mapper);
        }
        Expression::Lambda { body, .. } => check_block(ctx, typed, body),
        Expression::UnsafeCast { inner, .. } | Expression::Comptime { inner, .. } => {
            check_expr(ctx, typed, inner)
        }
        Expression::With { context_fields, body, .. } => {
            for (_, value) in context_fields {
                check_expr(ctx, typed, value);
            }
            check_block(ctx, typed, body);
        }
        Expression::Block(block) => check_block(ctx, typed, block),
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

/// A domain's variant set is fixed at its declaration site (closed);
/// an anonymous inline union type has no declaration site that closes off
/// its membership (open). §4.4.7 reports the former as an error and the
/// latter as a warning.
enum VariantSource {
    Domain(String),
    Union,
}

fn check_match(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    scrutinee: &Expression,
    arms: &[MatchArm],
    span: crate::span::Span,
) {
    if arms.iter().any(|arm| arm.pattern.is_catch_all()) {
        return;
    }
    let Some(scrutinee_ty) = typed.types.get(&scrutinee.span()).cloned() else {
        return;
    };

    let (variant_names, source): (Vec<String>, VariantSource) = match scrutinee_ty.as_ref() {
        ResolvedType::Result(_, domain_name) => {
            let Some(names) = ctx
                .domains
                .domain(domain_name)
                .map(|d| d.variant_names().map(str::to_string).collect())
            else {
                return;
            };
            (names, VariantSource::Domain(domain_name.clone()))
        }
        ResolvedType::Union(members) => {
            let names: Option<Vec<String>> = members
                .iter()
                .map(|member| match member.as_ref() {
                    ResolvedType::Named(name, _) => Some(name.clone()),
                    _ => None,
                })
                .collect();
            let Some(names) = names else { return };
            (names, VariantSource::Union)
        }
        _ => return,
    };

    let covered: Vec<&str> = arms
        .iter()
        .filter_map(|arm| match &arm.pattern {
            Pattern::Variant { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    let missing: Vec<String> = variant_names
        .into_iter()
        .filter(|name| !covered.contains(&name.as_str()))
        .collect();

    if missing.is_empty() {
        return;
    }

    let domain_label = match &source {
        VariantSource::Domain(name) => name.clone(),
        VariantSource::Union => "<union>".to_string(),
    };
    let message = ExhaustivenessError::MissingVariants {
        domain: domain_label,
        missing,
        span: span.clone(),
    }
    .to_string();
    let diagnostic = match source {
        VariantSource::Domain(_) => crate::diagnostics::Diagnostic::error(message, span),
        VariantSource::Union => crate::diagnostics::Diagnostic::warning(message, span),
    };
    ctx.diagnostics.add(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionDecl, FunctionParam, TypeExpr};
    use std::rc::Rc;

    fn span() -> crate::span::Span {
        crate::span::Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    fn setup_domain(ctx: &mut CompilationContext) {
        ctx.domains.declare_error_type(crate::ast::ErrorDecl {
            name: "DbError".to_string(),
            variants: vec![
                crate::ast::ErrorVariant {
                    name: "NotFound".to_string(),
                    fields: Vec::new(),
                    span: span(),
                },
                crate::ast::ErrorVariant {
                    name: "Timeout".to_string(),
                    fields: Vec::new(),
                    span: span(),
                },
            ],
            span: span(),
        });
        ctx.domains
            .resolve_domain(&crate::ast::DomainDecl {
                name: "DbError".to_string(),
                shape: crate::ast::DomainShape::Union(vec!["DbError".to_string()]),
                span: span(),
            })
            .unwrap();
    }

    fn match_expr(arms: Vec<MatchArm>) -> Expression {
        Expression::Match {
            scrutinee: Box::new(Expression::Id("result".to_string(), span())),
            arms,
            span: span(),
        }
    }

    fn arm(name: &str) -> MatchArm {
        MatchArm {
            pattern: Pattern::Variant {
                name: name.to_string(),
                subpatterns: vec![],
                span: span(),
            },
            guard: None,
            body: Expression::UnitLiteral(span()),
            span: span(),
        }
    }

    fn decl_with_match(match_expr: Expression) -> (FunctionDecl, crate::span::Span) {
        let scrutinee_span = span();
        (
            FunctionDecl {
                name: "f".to_string(),
                type_params: vec![],
                params: vec![FunctionParam {
                    name: "result".to_string(),
                    type_expr: TypeExpr::Named("Unit".to_string(), span()),
                    inout: false,
                    span: span(),
                }],
                return_type: TypeExpr::Named("Unit".to_string(), span()),
                effects: vec![],
                error_domain: None,
                is_pub: false,
                is_export: false,
                body: Block {
                    statements: vec![Statement::Expr(match_expr)],
                    span: span(),
                },
                span: span(),
                name_span: span(),
            },
            scrutinee_span,
        )
    }

    #[test]
    fn missing_variant_is_reported() {
        let mut ctx = CompilationContext::new("t.fe", "");
        setup_domain(&mut ctx);
        let (decl, scrutinee_span) = decl_with_match(match_expr(vec![arm("NotFound")]));
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![Statement::FunctionDecl(decl)],
        };
        let mut typed = TypedModule::new(module);
        typed.types.insert(
            scrutinee_span,
            std::rc::Rc::new(ResolvedType::Result(
                std::rc::Rc::new(ResolvedType::Unit),
                "DbError".to_string(),
            )),
        );
        run(&mut ctx, &mut typed);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn catch_all_arm_satisfies_exhaustiveness() {
        let mut ctx = CompilationContext::new("t.fe", "");
        setup_domain(&mut ctx);
        let mut arms = vec![arm("NotFound")];
        arms.push(MatchArm {
            pattern: Pattern::Wildcard(span()),
            guard: None,
            body: Expression::UnitLiteral(span()),
            span: span(),
        });
        let (decl, scrutinee_span) = decl_with_match(match_expr(arms));
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![Statement::FunctionDecl(decl)],
        };
        let mut typed = TypedModule::new(module);
        typed.types.insert(
            scrutinee_span,
            std::rc::Rc::new(ResolvedType::Result(
                std::rc::Rc::new(ResolvedType::Unit),
                "DbError".to_string(),
            )),
        );
        run(&mut ctx, &mut typed);
        assert!(!ctx.diagnostics.has_errors());
    }

    #[test]
    fn missing_union_variant_is_a_warning_not_an_error() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let (decl, scrutinee_span) = decl_with_match(match_expr(vec![arm("NotFound")]));
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![Statement::FunctionDecl(decl)],
        };
        let mut typed = TypedModule::new(module);
        typed.types.insert(
            scrutinee_span,
            std::rc::Rc::new(ResolvedType::Union(vec![
                std::rc::Rc::new(ResolvedType::Named(
                    "NotFound".to_string(),
                    std::rc::Rc::new(ResolvedType::Unit),
                )),
                std::rc::Rc::new(ResolvedType::Named(
                    "Timeout".to_string(),
                    std::rc::Rc::new(ResolvedType::Unit),
                )),
            ])),
        );
        run(&mut ctx, &mut typed);
        assert!(!ctx.diagnostics.has_errors());
        assert_eq!(ctx.diagnostics.diagnostics().len(), 1);
        assert_eq!(
            ctx.diagnostics.diagnostics()[0].level,
            crate::diagnostics::Level::Warning
        );
    }
}
