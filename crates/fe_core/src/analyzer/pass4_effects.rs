//! Pass 4: effect checking (§4.4.4).
//!
//! For every function, walks its body collecting the effects contributed by
//! primitive calls (`io.println`, `fs.read`, …) and by calls to other local
//! functions (whose own declared effects are already resolved by pass 2),
//! then checks the accumulated set is a subset of the function's declared
//! effect clause.

use crate::analyzer::error::EffectError;
use crate::ast::{Expression, FunctionDecl, MatchArm, Module, Statement};
use crate::context::CompilationContext;
use crate::effects::{Effect, EffectSet};
use crate::types::{Capability, ResolvedType};

pub fn run(ctx: &mut CompilationContext, module: &Module) {
    for statement in &module.statements {
        if let Statement::FunctionDecl(decl) = statement {
            check_function(ctx, decl);
        }
    }
}

fn check_function(ctx: &mut CompilationContext, decl: &FunctionDecl) {
    let mut declared = EffectSet::new();
    for name in &decl.effects {
        if let Some(effect) = Effect::lookup(name) {
            declared.insert(effect);
        }
    }

    let mut body_effects = EffectSet::new();
    for statement in &decl.body.statements {
        collect_statement_effects(ctx, statement, &mut body_effects);
    }

    let leaked = body_effects.leaked_from(&declared);
    for effect in &leaked {
        ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            EffectError::UndeclaredEffect {
                effect: effect.name().to_string(),
                span: decl.span.clone(),
            }
            .to_string(),
            decl.span.clone(),
        ));
    }

    if (decl.is_pub || decl.is_export) && decl.effects.is_empty() && body_effects.iter().next().is_some()
    {
        ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            EffectError::ExportMissingEffects {
                name: decl.name.clone(),
                span: decl.span.clone(),
            }
            .to_string(),
            decl.span.clone(),
        ));
    }

    let capability_params: Vec<Capability> = decl
        .params
        .iter()
        .filter_map(|param| capability_of_type_expr(&param.type_expr))
        .collect();

    for effect in body_effects.iter() {
        let required_capability = capability_for_effect(effect);
        if !capability_params.contains(&required_capability) {
            ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                EffectError::MissingCapability {
                    effect: effect.name().to_string(),
                    span: decl.span.clone(),
                }
                .to_string(),
                decl.span.clone(),
            ));
        }
    }
}

fn capability_of_type_expr(type_expr: &crate::ast::TypeExpr) -> Option<Capability> {
    if let crate::ast::TypeExpr::Named(name, _) = type_expr {
        if let Some(ResolvedType::Capability(cap)) = ResolvedType::primitive_by_name(name) {
            return Some(cap);
        }
    }
    None
}

fn capability_for_effect(effect: Effect) -> Capability {
    match effect {
        Effect::Io => Capability::Io,
        Effect::Fs => Capability::Fs,
        Effect::Net => Capability::Net,
        Effect::Time => Capability::Time,
        Effect::Rng => Capability::Rng,
        Effect::Alloc => Capability::Alloc,
        Effect::Simd => Capability::Simd,
        Effect::Cpu => Capability::Cpu,
        Effect::Ffi => Capability::Ffi,
        Effect::Atomics => Capability::Atomics,
    }
}

fn collect_statement_effects(
    ctx: &mut CompilationContext,
    statement: &Statement,
    effects: &mut EffectSet,
) {
    match statement {
        Statement::ConstDecl(decl) | Statement::VarDecl(decl) => {
            collect_expr_effects(ctx, &decl.init, effects)
        }
        Statement::Return(Some(expr), _) | Statement::Defer(expr, _) | Statement::Expr(expr) => {
            collect_expr_effects(ctx, expr, effects)
        }
        Statement::Return(None, _) => {}
        Statement::Assignment(assignment) => {
            collect_expr_effects(ctx, &assignment.target, effects);
            collect_expr_effects(ctx, &assignment.value, effects);
        }
        Statement::If(stmt) => {
            collect_expr_effects(ctx, &stmt.condition, effects);
            for s in &stmt.then_block.statements {
                collect_statement_effects(ctx, s, effects);
            }
            if let Some(else_block) = &stmt.else_block {
                for s in &else_block.statements {
                    collect_statement_effects(ctx, s, effects);
                }
            }
        }
        Statement::While(stmt) => {
            collect_expr_effects(ctx, &stmt.condition, effects);
            for s in &stmt.body.statements {
                collect_statement_effects(ctx, s, effects);
            }
        }
        Statement::For(stmt) => {
            collect_expr_effects(ctx, &stmt.iterable, effects);
            for s in &stmt.body.statements {
                collect_statement_effects(ctx, s, effects);
            }
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

/// The qualified name of a call target, if it has the shape `a.b` that the
/// primitive effect table keys on (§4.4.4).
fn qualified_call_name(callee: &Expression) -> Option<String> {
    match callee {
        Expression::FieldAccess { target, field, .. } => match target.as_ref() {
            Expression::Id(base, _) => Some(format!("{base}.{field}")),
            _ => None,
        },
        _ => None,
    }
}

fn collect_expr_effects(ctx: &mut CompilationContext, expr: &Expression, effects: &mut EffectSet) {
    match expr {
        Expression::Call { callee, args, .. } => {
            if let Some(qualified) = qualified_call_name(callee) {
                if let Some(effect) = Effect::of_primitive(&qualified) {
                    effects.insert(effect);
                }
            } else if let Expression::Id(name, _) = callee.as_ref() {
                if let Some(symbol) = ctx.scope.resolve(name) {
                    if let Some(resolved) = symbol.resolved_type() {
                        if let ResolvedType::Function { effects: fn_effects, .. } = resolved.as_ref()
                        {
                            for effect in fn_effects {
                                effects.insert(*effect);
                            }
                        }
                    }
                }
            }
            collect_expr_effects(ctx, callee, effects);
            for arg in args {
                collect_expr_effects(ctx, arg, effects);
            }
        }
        Expression::Binary { left, right, .. } => {
            collect_expr_effects(ctx, left, effects);
            collect_expr_effects(ctx, right, effects);
        }
        Expression::Unary { operand, .. } => collect_expr_effects(ctx, operand, effects),
        Expression::FieldAccess { target, .. } => collect_expr_effects(ctx, target, effects),
        Expression::Index { target, index, .. } => {
            collect_expr_effects(ctx, target, effects);
            collect_expr_effects(ctx, index, effects);
        }
        Expression::ArrayLiteral { elements, .. } => {
            for element in elements {
                collect_expr_effects(ctx, element, effects);
            }
        }
        Expression::RecordLiteral { fields, .. } => {
            for (_, value) in fields {
                collect_expr_effects(ctx, value, effects);
            }
        }
        Expression::Range { start, end, .. } => {
            collect_expr_effects(ctx, start, effects);
            collect_expr_effects(ctx, end, effects);
        }
        Expression::Ok { value, .. } => collect_expr_effects(ctx, value, effects),
        Expression::Err { fields, .. } => {
            for (_, value) in fields {
                collect_expr_effects(ctx, value, effects);
            }
        }
        Expression::Check { inner, context_fields, .. } => {
            collect_expr_effects(ctx, inner, effects);
            for (_, value) in context_fields {
                collect_expr_effects(ctx, value, effects);
            }
        }
        Expression::Ensure { condition, otherwise, .. } => {
            collect_expr_effects(ctx, condition, effects);
            collect_expr_effects(ctx, otherwise, effects);
        }
        Expression::MapError { inner, mapper, .. } => {
            collect_expr_effects(ctx, inner, effects);
            collect_expr_effects(ctx, mapper, effects);
        }
        Expression::Match { scrutinee, arms, .. } => {
            collect_expr_effects(ctx, scrutinee, effects);
            for MatchArm { guard, body, .. } in arms {
                if let Some(guard) = guard {
                    collect_expr_effects(ctx, guard, effects);
                }
                collect_expr_effects(ctx, body, effects);
            }
        }
        Expression::Lambda { body, .. } => {
            for statement in &body.statements {
                collect_statement_effects(ctx, statement, effects);
            }
        }
        Expression::UnsafeCast { inner, .. } | Expression::Comptime { inner, .. } => {
            collect_expr_effects(ctx, inner, effects)
        }
        Expression::With { context_fields, body, .. } => {
            for (_, value) in context_fields {
                collect_expr_effects(ctx, value, effects);
            }
            for statement in &body.statements {
                collect_statement_effects(ctx, statement, effects);
            }
        }
        Expression::Block(block) => {
            for statement in &block.statements {
                collect_statement_effects(ctx, statement, effects);
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionDecl};
    use std::rc::Rc;

    fn span() -> crate::span::Span {
        crate::span::Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    fn io_println_call() -> Expression {
        Expression::Call {
            callee: Box::new(Expression::FieldAccess {
                target: Box::new(Expression::Id("io".to_string(), span())),
                field: "println".to_string(),
                span: span(),
            }),
            args: vec![],
            span: span(),
        }
    }

    #[test]
    fn undeclared_effect_is_reported() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = FunctionDecl {
            name: "main".to_string(),
            type_params: vec![],
            params: vec![],
            return_type: crate::ast::TypeExpr::Named("Unit".to_string(), span()),
            effects: vec![],
            error_domain: None,
            is_pub: false,
            is_export: false,
            body: Block {
                statements: vec![Statement::Expr(io_println_call())],
                span: span(),
            },
            span: span(),
            name_span: span(),
        };
        check_function(&mut ctx, &decl);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn declared_effect_covers_the_call() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = FunctionDecl {
            name: "main".to_string(),
            type_params: vec![],
            params: vec![crate::ast::FunctionParam {
                name: "stdio".to_string(),
                type_expr: crate::ast::TypeExpr::Named("Io".to_string(), span()),
                inout: false,
                span: span(),
            }],
            return_type: crate::ast::TypeExpr::Named("Unit".to_string(), span()),
            effects: vec!["io".to_string()],
            error_domain: None,
            is_pub: false,
            is_export: false,
            body: Block {
                statements: vec![Statement::Expr(io_println_call())],
                span: span(),
            },
            span: span(),
            name_span: span(),
        };
        check_function(&mut ctx, &decl);
        assert!(!ctx.diagnostics.has_errors());
    }
}
