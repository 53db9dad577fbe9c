//! Pass 3: type checking (§4.4.3).
//!
//! Types every expression reachable from a function body or top-level
//! initializer, recording the result into [`TypedModule::types`] and every
//! resolved identifier into [`TypedModule::symbols`]. Sub-expressions that
//! cannot be typed get [`ResolvedType::Unknown`] (the soft-fail sentinel,
//! §7 "Propagation policy") instead of aborting the pass — a later check
//! that expects a concrete type silently lets `Unknown` through rather than
//! re-reporting the same failure.

use std::rc::Rc;

use crate::analyzer::error::TypeError;
use crate::analyzer::pass2_type_resolution::resolve_type_expr;
use crate::ast::{
    Assignment, Block, Expression, ForStatement, FunctionDecl, IfStatement, MatchArm, Pattern,
    Statement, VarDecl, WhileStatement,
};
use crate::context::CompilationContext;
use crate::symbols::{Symbol, SymbolKind};
use crate::typed_ast::TypedModule;
use crate::types::ResolvedType;

/// Threaded through a function body while it's being typed: the error
/// domain in effect for `ok`/`err`/`check`/`ensure` (pass 5 does the actual
/// legality check; pass 3 only needs it to give `ok`/`err` a concrete
/// `Result` type) and the declared return type, used to soft-check `return`.
#[derive(Clone, Default)]
struct FnTypingState {
    current_domain: Option<String>,
    return_type: Option<Rc<ResolvedType>>,
}

pub fn run(ctx: &mut CompilationContext, typed: &mut TypedModule) {
    let statements = typed.module.statements.clone();
    let top_level = FnTypingState::default();
    for statement in &statements {
        type_statement(ctx, typed, statement, &top_level);
    }
}

fn unknown(ctx: &mut CompilationContext) -> Rc<ResolvedType> {
    ctx.interner.intern_type(ResolvedType::Unknown)
}

fn mismatch(ctx: &mut CompilationContext, expected: &ResolvedType, found: &ResolvedType, span: crate::span::Span) {
    if expected.is_unknown() || found.is_unknown() {
        return;
    }
    if expected == found {
        return;
    }
    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
        TypeError::Mismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            span: span.clone(),
        }
        .to_string(),
        span,
    ));
}

/// §4.4.3 "Assignments": the target must be a name with a mutable binding
/// (`var`, or an `inout` parameter) — assigning to a `const` or to a
/// non-name expression (`a.b = 1`, `a[0] = 1`) is an error.
fn check_assignment_target(ctx: &mut CompilationContext, target: &Expression) {
    let Expression::Id(name, span) = target else {
        ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            TypeError::AssignToNonName { span: target.span() }.to_string(),
            target.span(),
        ));
        return;
    };
    let Some(symbol) = ctx.scope.resolve(name) else {
        return;
    };
    if !symbol.mutable {
        ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
            TypeError::AssignToImmutable {
                name: name.clone(),
                span: span.clone(),
            }
            .to_string(),
            span.clone(),
        ));
    }
}

fn type_statement(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    statement: &Statement,
    state: &FnTypingState,
) {
    match statement {
        Statement::ConstDecl(decl) => type_var_decl(ctx, typed, decl, SymbolKind::Constant, state),
        Statement::VarDecl(decl) => type_var_decl(ctx, typed, decl, SymbolKind::Variable, state),
        Statement::FunctionDecl(decl) => type_function_decl(ctx, typed, decl),
        Statement::TypeDecl(_) | Statement::ErrorDecl(_) | Statement::DomainDecl(_) => {}
        Statement::Return(Some(expr), _) => {
            let ty = type_expr(ctx, typed, expr, state);
            if let Some(expected) = &state.return_type {
                mismatch(ctx, expected.as_ref(), ty.as_ref(), expr.span());
            }
        }
        Statement::Return(None, _) => {}
        Statement::Defer(expr, _) => {
            type_expr(ctx, typed, expr, state);
        }
        Statement::Expr(expr) => {
            type_expr(ctx, typed, expr, state);
        }
        Statement::Assignment(Assignment { target, value, .. }) => {
            let target_ty = type_expr(ctx, typed, target, state);
            let value_ty = type_expr(ctx, typed, value, state);
            mismatch(ctx, target_ty.as_ref(), value_ty.as_ref(), value.span());
            check_assignment_target(ctx, target);
        }
        Statement::If(IfStatement {
            condition,
            then_block,
            else_block,
            ..
        }) => {
            let cond_ty = type_expr(ctx, typed, condition, state);
            mismatch(ctx, &ResolvedType::Bool, cond_ty.as_ref(), condition.span());
            type_block(ctx, typed, then_block, state);
            if let Some(else_block) = else_block {
                type_block(ctx, typed, else_block, state);
            }
        }
        Statement::While(WhileStatement {
            condition, body, ..
        }) => {
            let cond_ty = type_expr(ctx, typed, condition, state);
            mismatch(ctx, &ResolvedType::Bool, cond_ty.as_ref(), condition.span());
            type_block(ctx, typed, body, state);
        }
        Statement::For(ForStatement {
            binding,
            iterable,
            body,
            span,
        }) => {
            let iterable_ty = type_expr(ctx, typed, iterable, state);
            let element_ty = match iterable_ty.as_ref() {
                ResolvedType::Array(elem, _)
                | ResolvedType::Vector(elem, _)
                | ResolvedType::View(elem, _)
                | ResolvedType::Range(elem) => elem.clone(),
                _ => unknown(ctx),
            };
            ctx.scope.enter_scope();
            let _ = ctx.scope.declare(
                Symbol::new(binding.clone(), SymbolKind::Variable, span.clone())
                    .with_type(element_ty),
            );
            type_block(ctx, typed, body, state);
            ctx.scope.exit_scope();
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::UseErrorDefault(_, _) => {}
    }
}

fn type_var_decl(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    decl: &VarDecl,
    kind: SymbolKind,
    state: &FnTypingState,
) {
    let init_ty = type_expr(ctx, typed, &decl.init, state);
    let resolved = if let Some(type_expr_ast) = &decl.type_expr {
        match resolve_type_expr(ctx, type_expr_ast, &[]) {
            Ok(declared) => {
                mismatch(ctx, declared.as_ref(), init_ty.as_ref(), decl.init.span());
                declared
            }
            Err(err) => {
                ctx.diagnostics.add_error(err.to_string(), err.span());
                init_ty
            }
        }
    } else {
        init_ty
    };

    // Local declarations aren't pre-declared by pass 1 (only top-level
    // names are); a name already bound in the *current* frame at module
    // scope was declared by pass 1 and just needs its inferred type filled
    // in, otherwise this is a fresh local binding.
    if let Some(existing) = ctx.scope.resolve_in_current(&decl.name) {
        existing.set_resolved_type(resolved);
    } else {
        let _ = ctx.scope.declare(
            Symbol::new(decl.name.clone(), kind, decl.span.clone()).with_type(resolved),
        );
    }
}

fn type_function_decl(ctx: &mut CompilationContext, typed: &mut TypedModule, decl: &FunctionDecl) {
    let type_param_names: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
    let return_type = resolve_type_expr(ctx, &decl.return_type, &type_param_names)
        .unwrap_or_else(|_| unknown(ctx));

    ctx.scope.enter_scope();
    for param in &decl.params {
        let param_ty =
            resolve_type_expr(ctx, &param.type_expr, &type_param_names).unwrap_or_else(|_| unknown(ctx));
        let _ = ctx.scope.declare(
            Symbol::new(param.name.clone(), SymbolKind::Parameter, param.span.clone())
                .with_type(param_ty),
        );
    }

    let state = FnTypingState {
        current_domain: decl.error_domain.clone(),
        return_type: Some(return_type),
    };
    type_block(ctx, typed, &decl.body, &state);
    ctx.scope.exit_scope();
}

fn type_block(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    block: &Block,
    state: &FnTypingState,
) {
    ctx.scope.enter_scope();
    for statement in &block.statements {
        type_statement(ctx, typed, statement, state);
    }
    ctx.scope.exit_scope();
}

/// Types a block used as an expression: the type of its trailing
/// expression-statement, or `Unit` if it has none or ends in something else.
fn type_block_value(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    block: &Block,
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    ctx.scope.enter_scope();
    let mut result = ctx.interner.intern_type(ResolvedType::Unit);
    for (idx, statement) in block.statements.iter().enumerate() {
        if idx + 1 == block.statements.len() {
            if let Statement::Expr(expr) = statement {
                result = type_expr(ctx, typed, expr, state);
                ctx.scope.exit_scope();
                return result;
            }
        }
        type_statement(ctx, typed, statement, state);
    }
    ctx.scope.exit_scope();
    result
}

fn bind_pattern(ctx: &mut CompilationContext, pattern: &Pattern, ty: Rc<ResolvedType>) {
    match pattern {
        Pattern::Identifier(name, span) => {
            let _ = ctx
                .scope
                .declare(Symbol::new(name.clone(), SymbolKind::Variable, span.clone()).with_type(ty));
        }
        Pattern::Variant { subpatterns, .. } => {
            for sub in subpatterns {
                bind_pattern(ctx, sub, unknown(ctx));
            }
        }
        _ => {}
    }
}

fn type_expr(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    expr: &Expression,
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    let ty = type_expr_inner(ctx, typed, expr, state);
    typed.types.insert(expr.span(), ty.clone());
    ty
}

fn type_expr_inner(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    expr: &Expression,
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    match expr {
        Expression::IntLiteral { .. } => ctx.interner.intern_type(ResolvedType::I32),
        Expression::FloatLiteral { .. } => ctx.interner.intern_type(ResolvedType::F64),
        Expression::StringLiteral { .. } => ctx.interner.intern_type(ResolvedType::String),
        Expression::BytesLiteral { .. } => ctx.interner.intern_type(ResolvedType::Bytes),
        Expression::CharLiteral { .. } => ctx.interner.intern_type(ResolvedType::Char),
        Expression::BoolLiteral { .. } => ctx.interner.intern_type(ResolvedType::Bool),
        Expression::NullLiteral(_) => unknown(ctx),
        Expression::UnitLiteral(_) => ctx.interner.intern_type(ResolvedType::Unit),
        Expression::Id(name, span) => match ctx.scope.resolve(name) {
            Some(symbol) => {
                ctx.locations.record_reference(span.clone(), symbol.span.clone());
                typed.symbols.insert(span.clone(), symbol.clone());
                symbol.resolved_type().unwrap_or_else(|| unknown(ctx))
            }
            None => {
                ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                    TypeError::UndefinedName {
                        name: name.clone(),
                        span: span.clone(),
                    }
                    .to_string(),
                    span.clone(),
                ));
                unknown(ctx)
            }
        },
        Expression::Binary { op, left, right, span } => {
            type_binary(ctx, typed, *op, left, right, span.clone(), state)
        }
        Expression::Unary { op, operand, span } => {
            let operand_ty = type_expr(ctx, typed, operand, state);
            use crate::ast::UnaryOp;
            match op {
                UnaryOp::Neg if operand_ty.is_numeric() || operand_ty.is_unknown() => operand_ty,
                UnaryOp::Not => {
                    mismatch(ctx, &ResolvedType::Bool, operand_ty.as_ref(), span.clone());
                    ctx.interner.intern_type(ResolvedType::Bool)
                }
                UnaryOp::BitNot if operand_ty.is_integer() || operand_ty.is_unknown() => operand_ty,
                _ => unknown(ctx),
            }
        }
        Expression::Call { callee, args, span } => {
            type_call(ctx, typed, callee, args, span.clone(), state)
        }
        Expression::FieldAccess { target, field, span } => {
            let target_ty = type_expr(ctx, typed, target, state);
            field_type(ctx, &target_ty, field, span.clone())
        }
        Expression::Index { target, index, span } => {
            let target_ty = type_expr(ctx, typed, target, state);
            let index_ty = type_expr(ctx, typed, index, state);
            if !index_ty.is_integer() && !index_ty.is_unknown() {
                mismatch(ctx, &ResolvedType::Usize, index_ty.as_ref(), index.span());
            }
            match target_ty.as_ref() {
                ResolvedType::Array(elem, _)
                | ResolvedType::Vector(elem, _)
                | ResolvedType::View(elem, _) => elem.clone(),
                _ if target_ty.is_unknown() => unknown(ctx),
                _ => {
                    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                        format!("'{target_ty}' cannot be indexed"),
                        span.clone(),
                    ));
                    unknown(ctx)
                }
            }
        }
        Expression::ArrayLiteral { elements, .. } => {
            let mut element_ty = None;
            for element in elements {
                let ty = type_expr(ctx, typed, element, state);
                match &element_ty {
                    None => element_ty = Some(ty),
                    Some(first) => mismatch(ctx, first.as_ref(), ty.as_ref(), element.span()),
                }
            }
            let elem = element_ty.unwrap_or_else(|| unknown(ctx));
            ctx.interner.intern_type(ResolvedType::Array(elem, elements.len()))
        }
        Expression::RecordLiteral { fields, span, .. } => {
            let mut names = Vec::with_capacity(fields.len());
            let mut types = Vec::with_capacity(fields.len());
            for (name, value) in fields {
                names.push(ctx.interner.intern_string(name));
                types.push(type_expr(ctx, typed, value, state));
            }
            let _ = span;
            ctx.interner.intern_type(ResolvedType::Record(names, types))
        }
        Expression::Range { start, end, span, .. } => {
            let start_ty = type_expr(ctx, typed, start, state);
            let end_ty = type_expr(ctx, typed, end, state);
            mismatch(ctx, start_ty.as_ref(), end_ty.as_ref(), span.clone());
            ctx.interner.intern_type(ResolvedType::Range(start_ty))
        }
        Expression::Ok { value, .. } => {
            let ok_ty = type_expr(ctx, typed, value, state);
            match &state.current_domain {
                Some(domain) => ctx
                    .interner
                    .intern_type(ResolvedType::Result(ok_ty, domain.clone())),
                None => unknown(ctx),
            }
        }
        Expression::Err { variant, fields, span } => {
            for (_, value) in fields {
                type_expr(ctx, typed, value, state);
            }
            let _ = variant;
            match &state.current_domain {
                Some(domain) => ctx.interner.intern_type(ResolvedType::Result(
                    Rc::new(ResolvedType::Unknown),
                    domain.clone(),
                )),
                None => {
                    let _ = span;
                    unknown(ctx)
                }
            }
        }
        Expression::Check { inner, context_fields, .. } => {
            let inner_ty = type_expr(ctx, typed, inner, state);
            for (_, value) in context_fields {
                type_expr(ctx, typed, value, state);
            }
            match inner_ty.as_ref() {
                ResolvedType::Result(ok, _) => ok.clone(),
                _ if inner_ty.is_unknown() => unknown(ctx),
                _ => {
                    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                        format!("'check' requires a Result, found '{inner_ty}'"),
                        inner.span(),
                    ));
                    unknown(ctx)
                }
            }
        }
        Expression::Ensure { condition, otherwise, .. } => {
            let cond_ty = type_expr(ctx, typed, condition, state);
            mismatch(ctx, &ResolvedType::Bool, cond_ty.as_ref(), condition.span());
            type_expr(ctx, typed, otherwise, state);
            ctx.interner.intern_type(ResolvedType::Unit)
        }
        Expression::MapError { inner, param, mapper, span } => {
            let inner_ty = type_expr(ctx, typed, inner, state);
            ctx.scope.enter_scope();
            let _ = ctx.scope.declare(
                Symbol::new(param.clone(), SymbolKind::Parameter, span.clone()).with_type(unknown(ctx)),
            );
            type_expr(ctx, typed, mapper, state);
            ctx.scope.exit_scope();
            inner_ty
        }
        Expression::Match { scrutinee, arms, .. } => type_match(ctx, typed, scrutinee, arms, state),
        Expression::Lambda {
            params,
            return_type,
            effects: _,
            error_domain,
            body,
            span,
        } => {
            let _ = span;
            let mut param_types = Vec::with_capacity(params.len());
            ctx.scope.enter_scope();
            for param in params {
                let param_ty =
                    resolve_type_expr(ctx, &param.type_expr, &[]).unwrap_or_else(|_| unknown(ctx));
                param_types.push(param_ty.clone());
                let _ = ctx.scope.declare(
                    Symbol::new(param.name.clone(), SymbolKind::Parameter, param.span.clone())
                        .with_type(param_ty),
                );
            }
            let ret = match return_type {
                Some(rt) => resolve_type_expr(ctx, rt, &[]).unwrap_or_else(|_| unknown(ctx)),
                None => unknown(ctx),
            };
            let lambda_state = FnTypingState {
                current_domain: error_domain.clone().or_else(|| state.current_domain.clone()),
                return_type: Some(ret.clone()),
            };
            type_block(ctx, typed, body, &lambda_state);
            ctx.scope.exit_scope();
            ctx.interner.intern_type(ResolvedType::Function {
                params: param_types,
                return_type: ret,
                effects: Vec::new(),
                error_domain: error_domain.clone(),
                type_params: Vec::new(),
            })
        }
        Expression::UnsafeCast { target_type, inner, .. } => {
            type_expr(ctx, typed, inner, state);
            resolve_type_expr(ctx, target_type, &[]).unwrap_or_else(|_| unknown(ctx))
        }
        Expression::Comptime { inner, .. } => type_expr(ctx, typed, inner, state),
        Expression::With { context_fields, body, .. } => {
            for (_, value) in context_fields {
                type_expr(ctx, typed, value, state);
            }
            type_block_value(ctx, typed, body, state)
        }
        Expression::Block(block) => type_block_value(ctx, typed, block, state),
    }
}

fn type_binary(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    op: crate::ast::BinaryOp,
    left: &Expression,
    right: &Expression,
    span: crate::span::Span,
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    use crate::ast::BinaryOp::*;
    let left_ty = type_expr(ctx, typed, left, state);
    let right_ty = type_expr(ctx, typed, right, state);
    match op {
        Add | Sub | Mul | Div | Mod | BitAnd | BitOr | BitXor | Shl | Shr => {
            mismatch(ctx, left_ty.as_ref(), right_ty.as_ref(), span);
            left_ty
        }
        Concat => {
            mismatch(ctx, &ResolvedType::String, left_ty.as_ref(), left.span());
            mismatch(ctx, &ResolvedType::String, right_ty.as_ref(), right.span());
            ctx.interner.intern_type(ResolvedType::String)
        }
        Eq | NotEq | Lt | LtEq | Gt | GtEq => {
            mismatch(ctx, left_ty.as_ref(), right_ty.as_ref(), span);
            ctx.interner.intern_type(ResolvedType::Bool)
        }
        And | Or => {
            mismatch(ctx, &ResolvedType::Bool, left_ty.as_ref(), left.span());
            mismatch(ctx, &ResolvedType::Bool, right_ty.as_ref(), right.span());
            ctx.interner.intern_type(ResolvedType::Bool)
        }
    }
}

fn type_call(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    callee: &Expression,
    args: &[Expression],
    span: crate::span::Span,
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    let callee_ty = type_expr(ctx, typed, callee, state);
    let arg_types: Vec<_> = args.iter().map(|a| type_expr(ctx, typed, a, state)).collect();

    match callee_ty.as_ref() {
        ResolvedType::Function {
            params,
            return_type,
            ..
        } => {
            if params.len() != args.len() {
                ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                    TypeError::ArityMismatch {
                        expected: params.len(),
                        found: args.len(),
                        span: span.clone(),
                    }
                    .to_string(),
                    span,
                ));
            } else {
                for ((param_ty, arg_ty), arg) in params.iter().zip(arg_types.iter()).zip(args.iter()) {
                    mismatch(ctx, param_ty.as_ref(), arg_ty.as_ref(), arg.span());
                }
            }
            return_type.clone()
        }
        _ if callee_ty.is_unknown() => unknown(ctx),
        _ => {
            ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                TypeError::NotCallable { span: span.clone() }.to_string(),
                span,
            ));
            unknown(ctx)
        }
    }
}

fn field_type(
    ctx: &mut CompilationContext,
    target_ty: &Rc<ResolvedType>,
    field: &str,
    span: crate::span::Span,
) -> Rc<ResolvedType> {
    let inner = match target_ty.as_ref() {
        ResolvedType::Named(_, underlying) => underlying.as_ref(),
        other => other,
    };
    match inner {
        ResolvedType::Record(names, types) => {
            match names.iter().position(|n| n.as_ref() == field) {
                Some(idx) => types[idx].clone(),
                None => {
                    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                        TypeError::UnknownField {
                            field: field.to_string(),
                            span: span.clone(),
                        }
                        .to_string(),
                        span,
                    ));
                    unknown(ctx)
                }
            }
        }
        _ if target_ty.is_unknown() => unknown(ctx),
        _ => {
            ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                TypeError::UnknownField {
                    field: field.to_string(),
                    span: span.clone(),
                }
                .to_string(),
                span,
            ));
            unknown(ctx)
        }
    }
}

fn type_match(
    ctx: &mut CompilationContext,
    typed: &mut TypedModule,
    scrutinee: &Expression,
    arms: &[MatchArm],
    state: &FnTypingState,
) -> Rc<ResolvedType> {
    type_expr(ctx, typed, scrutinee, state);
    let mut result: Option<Rc<ResolvedType>> = None;
    for arm in arms {
        ctx.scope.enter_scope();
        bind_pattern(ctx, &arm.pattern, unknown(ctx));
        if let Some(guard) = &arm.guard {
            let guard_ty = type_expr(ctx, typed, guard, state);
            mismatch(ctx, &ResolvedType::Bool, guard_ty.as_ref(), guard.span());
        }
        let arm_ty = type_expr(ctx, typed, &arm.body, state);
        ctx.scope.exit_scope();
        match &result {
            None => result = Some(arm_ty),
            Some(first) => mismatch(ctx, first.as_ref(), arm_ty.as_ref(), arm.body.span()),
        }
    }
    result.unwrap_or_else(|| unknown(ctx))
}

#[cfg(test)]
mod assignment_tests {
    #[test]
    fn assigning_to_a_const_is_an_error() {
        let result = crate::compile(
            "t.fe",
            r#"
                function f() {
                    const x: i32 = 0;
                    x = 1;
                }
            "#,
        );
        assert!(result.has_errors());
    }

    #[test]
    fn assigning_to_a_var_is_allowed() {
        let result = crate::compile(
            "t.fe",
            r#"
                function f() {
                    var x: i32 = 0;
                    x = 1;
                }
            "#,
        );
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn assigning_to_a_non_name_is_an_error() {
        let result = crate::compile(
            "t.fe",
            r#"
                function f(r: Rec) {
                    r.field = 1;
                }
            "#,
        );
        assert!(result.has_errors());
    }
}
