//! Pass 6: region/move checking (§4.4.6).
//!
//! A binding whose type isn't one of the Copy primitives is moved the first
//! time it's read as a bare identifier; reading it again afterwards is a
//! use-after-move. This is a function-wide, straight-line approximation —
//! it does not model per-block reclaiming of a moved name via shadowing in
//! a nested scope, which would need a real control-flow graph. Documented
//! as a deliberate simplification; see DESIGN.md.
//!
//! `if`/`else` branches are checked against independent clones of the
//! `moved` set (c): a move made only in `then` cannot poison a read in
//! `else`. The two post-branch sets are unioned back into the continuation,
//! so a binding moved in *either* arm is "possibly moved" after the merge.
//!
//! Loop bodies (`while`/`for`) are checked once, then any binding that
//! existed before the loop and became newly moved inside the body is
//! flagged (d): the loop may run again, which would re-move it.
//!
//! A `return` of a bare name bound to a locally-declared `View` is flagged
//! (e): the view's region is this function's, which is disposed at return.
//! A view arriving as a function parameter is exempt — its region belongs
//! to the caller and outlives this call. There is no explicit mid-function
//! region-disposal construct in the grammar, so (f) ("disposing a region
//! invalidates views bound to it") has no concrete trigger point to check
//! here beyond the return case in (e); see DESIGN.md.

use std::collections::HashMap;

use crate::analyzer::error::RegionError;
use crate::ast::{Block, Expression, FunctionDecl, MatchArm, Module, Statement, TypeExpr};
use crate::context::CompilationContext;
use crate::span::Span;
use crate::types::ResolvedType;

pub fn run(ctx: &mut CompilationContext, module: &Module) {
    for statement in &module.statements {
        if let Statement::FunctionDecl(decl) = statement {
            check_function(ctx, decl);
        }
    }
}

fn is_copy_type_expr(type_expr: &TypeExpr) -> bool {
    match type_expr {
        TypeExpr::Named(name, _) => matches!(
            ResolvedType::primitive_by_name(name),
            Some(ResolvedType::I8)
                | Some(ResolvedType::I16)
                | Some(ResolvedType::I32)
                | Some(ResolvedType::I64)
                | Some(ResolvedType::I128)
                | Some(ResolvedType::U8)
                | Some(ResolvedType::U16)
                | Some(ResolvedType::U32)
                | Some(ResolvedType::U64)
                | Some(ResolvedType::U128)
                | Some(ResolvedType::Usize)
                | Some(ResolvedType::F16)
                | Some(ResolvedType::F32)
                | Some(ResolvedType::F64)
                | Some(ResolvedType::Bool)
                | Some(ResolvedType::Char)
                | Some(ResolvedType::Unit)
                | Some(ResolvedType::Capability(_))
        ),
        TypeExpr::Nullable(inner, _) => is_copy_type_expr(inner),
        // A view is a non-owning borrow: binding it elsewhere aliases it
        // rather than consuming it, so ordinary move-checking doesn't apply.
        // Its region-scoping is instead checked separately (e): see
        // `local_views` in `check_statement`/`check_loop_body`.
        TypeExpr::View { .. } => true,
        _ => false,
    }
}

fn check_function(ctx: &mut CompilationContext, decl: &FunctionDecl) {
    // Name -> is-move-type. Declared fresh per function; parameters without
    // an inferable Copy-ness default to "move" (the conservative choice).
    let mut is_move: HashMap<String, bool> = HashMap::new();
    for param in &decl.params {
        is_move.insert(param.name.clone(), !is_copy_type_expr(&param.type_expr));
    }
    let mut moved: HashMap<String, Span> = HashMap::new();
    let mut local_views: HashMap<String, Span> = HashMap::new();
    check_block(ctx, &decl.body, &mut is_move, &mut moved, &mut local_views);
}

fn check_block(
    ctx: &mut CompilationContext,
    block: &Block,
    is_move: &mut HashMap<String, bool>,
    moved: &mut HashMap<String, Span>,
    local_views: &mut HashMap<String, Span>,
) {
    for statement in &block.statements {
        check_statement(ctx, statement, is_move, moved, local_views);
    }
}

fn check_statement(
    ctx: &mut CompilationContext,
    statement: &Statement,
    is_move: &mut HashMap<String, bool>,
    moved: &mut HashMap<String, Span>,
    local_views: &mut HashMap<String, Span>,
) {
    match statement {
        Statement::ConstDecl(decl) | Statement::VarDecl(decl) => {
            check_expr(ctx, &decl.init, is_move, moved, local_views);
            let type_is_move = decl
                .type_expr
                .as_ref()
                .map(|t| !is_copy_type_expr(t))
                .unwrap_or(true);
            is_move.insert(decl.name.clone(), type_is_move);
            moved.remove(&decl.name);
            if type_is_move {
                if let Expression::Id(source_name, _) = &decl.init {
                    if is_move.get(source_name).copied().unwrap_or(false) {
                        moved.insert(source_name.clone(), decl.init.span());
                    }
                }
            }
            if matches!(decl.type_expr, Some(TypeExpr::View { .. })) {
                local_views.insert(decl.name.clone(), decl.span.clone());
            } else {
                local_views.remove(&decl.name);
            }
        }
        Statement::Return(Some(expr), _) => {
            check_expr(ctx, expr, is_move, moved, local_views);
            if let Expression::Id(name, span) = expr {
                if local_views.contains_key(name) {
                    ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                        RegionError::ViewEscapesScope {
                            name: name.clone(),
                            span: span.clone(),
                        }
                        .to_string(),
                        span.clone(),
                    ));
                }
            }
        }
        Statement::Defer(expr, _) | Statement::Expr(expr) => check_expr(ctx, expr, is_move, moved, local_views),
        Statement::Return(None, _) => {}
        Statement::Assignment(assignment) => {
            check_expr(ctx, &assignment.value, is_move, moved, local_views);
            if let Expression::Id(name, _) = &assignment.target {
                moved.remove(name);
            } else {
                check_expr(ctx, &assignment.target, is_move, moved, local_views);
            }
        }
        Statement::If(stmt) => {
            check_expr(ctx, &stmt.condition, is_move, moved, local_views);
            let mut then_moved = moved.clone();
            check_block(ctx, &stmt.then_block, is_move, &mut then_moved, local_views);
            let mut else_moved = moved.clone();
            if let Some(else_block) = &stmt.else_block {
                check_block(ctx, else_block, is_move, &mut else_moved, local_views);
            }
            for (name, span) in then_moved.into_iter().chain(else_moved) {
                moved.entry(name).or_insert(span);
            }
        }
        Statement::While(stmt) => {
            check_expr(ctx, &stmt.condition, is_move, moved, local_views);
            check_loop_body(ctx, &stmt.body, is_move, moved, local_views);
        }
        Statement::For(stmt) => {
            check_expr(ctx, &stmt.iterable, is_move, moved, local_views);
            check_loop_body(ctx, &stmt.body, is_move, moved, local_views);
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

/// (d): a move made inside a loop body of a binding that already existed
/// before the loop started is flagged, since a second iteration would read
/// an already-moved value. Bindings declared fresh inside the body itself
/// (not present before the loop) are exempt — each iteration re-declares
/// them.
fn check_loop_body(
    ctx: &mut CompilationContext,
    block: &Block,
    is_move: &mut HashMap<String, bool>,
    moved: &mut HashMap<String, Span>,
    local_views: &mut HashMap<String, Span>,
) {
    let outer_names: std::collections::HashSet<String> = is_move.keys().cloned().collect();
    let moved_before: std::collections::HashSet<String> = moved.keys().cloned().collect();
    check_block(ctx, block, is_move, moved, local_views);
    for (name, span) in moved.iter() {
        if outer_names.contains(name) && !moved_before.contains(name) {
            ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                RegionError::MoveInLoopBody {
                    name: name.clone(),
                    span: span.clone(),
                }
                .to_string(),
                span.clone(),
            ));
        }
    }
}

fn check_expr(
    ctx: &mut CompilationContext,
    expr: &Expression,
    is_move: &mut HashMap<String, bool>,
    moved: &mut HashMap<String, Span>,
    local_views: &mut HashMap<String, Span>,
) {
    match expr {
        Expression::Id(name, span) => {
            if let Some(moved_at) = moved.get(name) {
                ctx.diagnostics.add(crate::diagnostics::Diagnostic::error(
                    RegionError::UseAfterMove {
                        name: name.clone(),
                        span: span.clone(),
                        moved_at: moved_at.clone(),
                    }
                    .to_string(),
                    span.clone(),
                ));
            }
        }
        Expression::Binary { left, right, .. } => {
            check_expr(ctx, left, is_move, moved, local_views);
            check_expr(ctx, right, is_move, moved, local_views);
        }
        Expression::Unary { operand, .. } => check_expr(ctx, operand, is_move, moved, local_views),
        Expression::Call { callee, args, .. } => {
            check_expr(ctx, callee, is_move, moved, local_views);
            for arg in args {
                check_expr(ctx, arg, is_move, moved, local_views);
            }
        }
        Expression::FieldAccess { target, .. } => check_expr(ctx, target, is_move, moved, local_views),
        Expression::Index { target, index, .. } => {
            check_expr(ctx, target, is_move, moved, local_views);
            check_expr(ctx, index, is_move, moved, local_views);
        }
        Expression::ArrayLiteral { elements, .. } => {
            for element in elements {
                check_expr(ctx, element, is_move, moved, local_views);
            }
        }
        Expression::RecordLiteral { fields, .. } => {
            for (_, value) in fields {
                check_expr(ctx, value, is_move, moved, local_views);
            }
        }
        Expression::Range { start, end, .. } => {
            check_expr(ctx, start, is_move, moved, local_views);
            check_expr(ctx, end, is_move, moved, local_views);
        }
        Expression::Ok { value, .. } => check_expr(ctx, value, is_move, moved, local_views),
        Expression::Err { fields, .. } => {
            for (_, value) in fields {
                check_expr(ctx, value, is_move, moved, local_views);
            }
        }
        Expression::Check { inner, context_fields, .. } => {
            check_expr(ctx, inner, is_move, moved, local_views);
            for (_, value) in context_fields {
                check_expr(ctx, value, is_move, moved, local_views);
            }
        }
        Expression::Ensure { condition, otherwise, .. } => {
            check_expr(ctx, condition, is_move, moved, local_views);
            check_expr(ctx, otherwise, is_move, moved, local_views);
        }
        Expression::MapError { inner, mapper, .. } => {
            check_expr(ctx, inner, is_move, moved, local_views);
            check_expr(ctx, mapper, is_move, moved, local_views);
        }
        Expression::Match { scrutinee, arms, .. } => {
            check_expr(ctx, scrutinee, is_move, moved, local_views);
            for MatchArm { guard, body, .. } in arms {
                if let Some(guard) = guard {
                    check_expr(ctx, guard, is_move, moved, local_views);
                }
                check_expr(ctx, body, is_move, moved, local_views);
            }
        }
        Expression::Lambda { body, .. } => check_block(ctx, body, is_move, moved, local_views),
        Expression::UnsafeCast { inner, .. } | Expression::Comptime { inner, .. } => {
            check_expr(ctx, inner, is_move, moved, local_views)
        }
        Expression::With { context_fields, body, .. } => {
            for (_, value) in context_fields {
                check_expr(ctx, value, is_move, moved, local_views);
            }
            check_block(ctx, body, is_move, moved, local_views);
        }
        Expression::Block(block) => check_block(ctx, block, is_move, moved, local_views),
        Expression::IntLiteral { .. }
        | Expression::FloatLiteral { .. }
        | Expression::StringLiteral { .. }
        | Expression::BytesLiteral { .. }
        | Expression::CharLiteral { .. }
        | Expression::BoolLiteral { .. }
        | Expression::NullLiteral(_)
        | Expression::UnitLiteral(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, FunctionParam, VarDecl};
    use std::rc::Rc;

    fn span() -> Span {
        Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    fn decl_with_body(statements: Vec<Statement>) -> FunctionDecl {
        FunctionDecl {
            name: "f".to_string(),
            type_params: vec![],
            params: vec![FunctionParam {
                name: "s".to_string(),
                type_expr: TypeExpr::Named("String".to_string(), span()),
                inout: false,
                span: span(),
            }],
            return_type: TypeExpr::Named("Unit".to_string(), span()),
            effects: vec![],
            error_domain: None,
            is_pub: false,
            is_export: false,
            body: Block { statements, span: span() },
            span: span(),
            name_span: span(),
        }
    }

    #[test]
    fn use_after_move_is_reported() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = decl_with_body(vec![
            Statement::VarDecl(VarDecl {
                name: "t".to_string(),
                type_expr: None,
                init: Expression::Id("s".to_string(), span()),
                is_pub: false,
                span: span(),
            }),
            Statement::Expr(Expression::Id("s".to_string(), span())),
        ]);
        check_function(&mut ctx, &decl);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn copy_types_are_never_flagged() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let mut decl = decl_with_body(vec![
            Statement::VarDecl(VarDecl {
                name: "t".to_string(),
                type_expr: None,
                init: Expression::Id("n".to_string(), span()),
                is_pub: false,
                span: span(),
            }),
            Statement::Expr(Expression::Id("n".to_string(), span())),
        ]);
        decl.params[0].name = "n".to_string();
        decl.params[0].type_expr = TypeExpr::Named("i32".to_string(), span());
        check_function(&mut ctx, &decl);
        assert!(!ctx.diagnostics.has_errors());
    }

    #[test]
    fn moving_in_one_branch_does_not_poison_the_other() {
        use crate::ast::IfStatement;
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = decl_with_body(vec![Statement::If(IfStatement {
            condition: Expression::BoolLiteral { value: true, span: span() },
            then_block: Block {
                statements: vec![Statement::VarDecl(VarDecl {
                    name: "t".to_string(),
                    type_expr: None,
                    init: Expression::Id("s".to_string(), span()),
                    is_pub: false,
                    span: span(),
                })],
                span: span(),
            },
            else_block: Some(Block {
                statements: vec![Statement::Expr(Expression::Id("s".to_string(), span()))],
                span: span(),
            }),
            span: span(),
        })]);
        check_function(&mut ctx, &decl);
        assert!(!ctx.diagnostics.has_errors());
    }

    #[test]
    fn moving_the_same_binding_in_both_branches_is_possibly_moved_after() {
        use crate::ast::IfStatement;
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = decl_with_body(vec![
            Statement::If(IfStatement {
                condition: Expression::BoolLiteral { value: true, span: span() },
                then_block: Block {
                    statements: vec![Statement::VarDecl(VarDecl {
                        name: "t1".to_string(),
                        type_expr: None,
                        init: Expression::Id("s".to_string(), span()),
                        is_pub: false,
                        span: span(),
                    })],
                    span: span(),
                },
                else_block: Some(Block {
                    statements: vec![Statement::VarDecl(VarDecl {
                        name: "t2".to_string(),
                        type_expr: None,
                        init: Expression::Id("s".to_string(), span()),
                        is_pub: false,
                        span: span(),
                    })],
                    span: span(),
                }),
                span: span(),
            }),
            Statement::Expr(Expression::Id("s".to_string(), span())),
        ]);
        check_function(&mut ctx, &decl);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn moving_a_pre_existing_binding_inside_a_loop_body_is_reported() {
        use crate::ast::WhileStatement;
        let mut ctx = CompilationContext::new("t.fe", "");
        let decl = decl_with_body(vec![Statement::While(WhileStatement {
            condition: Expression::BoolLiteral { value: true, span: span() },
            body: Block {
                statements: vec![Statement::VarDecl(VarDecl {
                    name: "t".to_string(),
                    type_expr: None,
                    init: Expression::Id("s".to_string(), span()),
                    is_pub: false,
                    span: span(),
                })],
                span: span(),
            },
            span: span(),
        })]);
        check_function(&mut ctx, &decl);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn returning_a_locally_declared_view_is_reported() {
        let mut decl = decl_with_body(vec![
            Statement::VarDecl(VarDecl {
                name: "v".to_string(),
                type_expr: Some(TypeExpr::View {
                    element: Box::new(TypeExpr::Named("i32".to_string(), span())),
                    mutable: false,
                    span: span(),
                }),
                init: Expression::Id("s".to_string(), span()),
                is_pub: false,
                span: span(),
            }),
            Statement::Return(Some(Expression::Id("v".to_string(), span())), span()),
        ]);
        decl.return_type = TypeExpr::View {
            element: Box::new(TypeExpr::Named("i32".to_string(), span())),
            mutable: false,
            span: span(),
        };
        let mut ctx = CompilationContext::new("t.fe", "");
        check_function(&mut ctx, &decl);
        assert!(ctx.diagnostics.has_errors());
    }

    #[test]
    fn returning_a_view_received_as_a_parameter_is_allowed() {
        let mut decl = decl_with_body(vec![Statement::Return(
            Some(Expression::Id("s".to_string(), span())),
            span(),
        )]);
        decl.params[0].type_expr = TypeExpr::View {
            element: Box::new(TypeExpr::Named("i32".to_string(), span())),
            mutable: false,
            span: span(),
        };
        let mut ctx = CompilationContext::new("t.fe", "");
        check_function(&mut ctx, &decl);
        assert!(!ctx.diagnostics.has_errors());
    }
}
