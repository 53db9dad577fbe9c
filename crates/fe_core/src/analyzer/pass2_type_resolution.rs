//! Pass 2: type resolution (§4.4.2).
//!
//! Resolves every declared `TypeExpr` reachable from a top-level declaration
//! into a `Rc<ResolvedType>`, interning as it goes, and writes the result
//! into the declaring symbol's `declared_type` cell. Local declarations
//! inside function bodies are resolved lazily by pass 3, which calls
//! [`resolve_type_expr`] directly — it's `pub(crate)` for exactly that reuse.

use std::rc::Rc;

use crate::analyzer::error::ResolutionError;
use crate::ast::{ConstExpr, Module, Statement, TypeExpr};
use crate::context::CompilationContext;
use crate::effects::Effect;
use crate::symbols::SymbolKind;
use crate::types::ResolvedType;

pub fn run(ctx: &mut CompilationContext, module: &Module) {
    for statement in &module.statements {
        match statement {
            Statement::VarDecl(decl) | Statement::ConstDecl(decl) => {
                if let Some(type_expr) = &decl.type_expr {
                    match resolve_type_expr(ctx, type_expr, &[]) {
                        Ok(resolved) => {
                            if let Some(symbol) = ctx.scope.resolve(&decl.name) {
                                symbol.set_resolved_type(resolved);
                            }
                        }
                        Err(err) => ctx.diagnostics.add_error(err.to_string(), err.span()),
                    }
                }
            }
            Statement::FunctionDecl(decl) => {
                let type_param_names: Vec<String> =
                    decl.type_params.iter().map(|p| p.name.clone()).collect();

                let mut params = Vec::with_capacity(decl.params.len());
                let mut ok = true;
                for param in &decl.params {
                    match resolve_type_expr(ctx, &param.type_expr, &type_param_names) {
                        Ok(resolved) => params.push(resolved),
                        Err(err) => {
                            ctx.diagnostics.add_error(err.to_string(), err.span());
                            ok = false;
                        }
                    }
                }

                let return_type = match resolve_type_expr(ctx, &decl.return_type, &type_param_names)
                {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        ctx.diagnostics.add_error(err.to_string(), err.span());
                        ok = false;
                        ctx.interner.intern_type(ResolvedType::Unknown)
                    }
                };

                let mut effects = Vec::new();
                for name in &decl.effects {
                    match Effect::lookup(name) {
                        Some(effect) => effects.push(effect),
                        None => ctx.diagnostics.add_error(
                            ResolutionError::UnknownEffect {
                                name: name.clone(),
                                span: decl.span.clone(),
                            }
                            .to_string(),
                            decl.span.clone(),
                        ),
                    }
                }

                if ok {
                    if let Some(symbol) = ctx.scope.resolve(&decl.name) {
                        let function_type = ctx.interner.intern_type(ResolvedType::Function {
                            params,
                            return_type,
                            effects,
                            error_domain: decl.error_domain.clone(),
                            type_params: type_param_names,
                        });
                        symbol.set_resolved_type(function_type);
                    }
                }
            }
            Statement::TypeDecl(decl) => {
                let type_param_names: Vec<String> =
                    decl.type_params.iter().map(|p| p.name.clone()).collect();
                if let Some(symbol) = ctx.scope.resolve(&decl.name) {
                    debug_assert!(symbol.kind == SymbolKind::TypeDef);
                    // Placeholder breaks self-referential cycles (§9 "Named"):
                    // a recursive mention of this type seen while resolving
                    // its own underlying type observes this sentinel rather
                    // than recursing forever.
                    symbol.set_resolved_type(ctx.interner.intern_type(ResolvedType::Named(
                        decl.name.clone(),
                        Rc::new(ResolvedType::Unknown),
                    )));
                    match resolve_type_expr(ctx, &decl.underlying, &type_param_names) {
                        Ok(underlying) => {
                            let named = ctx
                                .interner
                                .intern_type(ResolvedType::Named(decl.name.clone(), underlying));
                            symbol.set_resolved_type(named);
                        }
                        Err(err) => ctx.diagnostics.add_error(err.to_string(), err.span()),
                    }
                }
            }
            _ => {}
        }
    }
}

/// Resolve a single type expression against the symbol table, with
/// `type_params` naming the generic parameters currently in scope (empty for
/// locals and module-level declarations with no generics).
pub(crate) fn resolve_type_expr(
    ctx: &mut CompilationContext,
    type_expr: &TypeExpr,
    type_params: &[String],
) -> Result<Rc<ResolvedType>, ResolutionError> {
    match type_expr {
        TypeExpr::Named(name, span) => {
            if let Some(idx) = type_params.iter().position(|p| p == name) {
                return Ok(ctx
                    .interner
                    .intern_type(ResolvedType::TypeParam(name.clone(), idx)));
            }
            if let Some(primitive) = ResolvedType::primitive_by_name(name) {
                return Ok(ctx.interner.intern_type(primitive));
            }
            match ctx.scope.resolve(name) {
                Some(symbol) if symbol.kind == SymbolKind::TypeDef => {
                    symbol.resolved_type().ok_or(ResolutionError::UnknownType {
                        name: name.clone(),
                        span: span.clone(),
                    })
                }
                Some(_) => Err(ResolutionError::NotAType {
                    name: name.clone(),
                    span: span.clone(),
                }),
                None => Err(ResolutionError::UnknownType {
                    name: name.clone(),
                    span: span.clone(),
                }),
            }
        }
        TypeExpr::Generic { name, args, span } => {
            let mut resolved_args = Vec::with_capacity(args.len());
            for arg in args {
                resolved_args.push(resolve_type_expr(ctx, arg, type_params)?);
            }
            match ctx.scope.resolve(name) {
                Some(symbol) if symbol.kind == SymbolKind::TypeDef => {
                    let underlying = symbol.resolved_type();
                    Ok(ctx.interner.intern_type(ResolvedType::GenericInstance {
                        base_name: name.clone(),
                        args: resolved_args,
                        underlying,
                    }))
                }
                Some(_) => Err(ResolutionError::NotAType {
                    name: name.clone(),
                    span: span.clone(),
                }),
                None => Err(ResolutionError::UnknownType {
                    name: name.clone(),
                    span: span.clone(),
                }),
            }
        }
        TypeExpr::Array { element, size, .. } => {
            let elem = resolve_type_expr(ctx, element, type_params)?;
            let n = resolve_const_size(size)?;
            Ok(ctx.interner.intern_type(ResolvedType::Array(elem, n)))
        }
        TypeExpr::Vector { element, size, .. } => {
            let elem = resolve_type_expr(ctx, element, type_params)?;
            let n = resolve_const_size(size)?;
            Ok(ctx.interner.intern_type(ResolvedType::Vector(elem, n)))
        }
        TypeExpr::View {
            element, mutable, ..
        } => {
            let elem = resolve_type_expr(ctx, element, type_params)?;
            Ok(ctx.interner.intern_type(ResolvedType::View(elem, *mutable)))
        }
        TypeExpr::Nullable(inner, _) => {
            let inner = resolve_type_expr(ctx, inner, type_params)?;
            Ok(ctx.interner.intern_type(ResolvedType::Nullable(inner)))
        }
        TypeExpr::Function {
            params,
            return_type,
            effects,
            error_domain,
            span,
        } => {
            let mut resolved_params = Vec::with_capacity(params.len());
            for param in params {
                resolved_params.push(resolve_type_expr(ctx, param, type_params)?);
            }
            let return_type = resolve_type_expr(ctx, return_type, type_params)?;
            let mut resolved_effects = Vec::with_capacity(effects.len());
            for name in effects {
                match Effect::lookup(name) {
                    Some(effect) => resolved_effects.push(effect),
                    None => {
                        return Err(ResolutionError::UnknownEffect {
                            name: name.clone(),
                            span: span.clone(),
                        })
                    }
                }
            }
            Ok(ctx.interner.intern_type(ResolvedType::Function {
                params: resolved_params,
                return_type,
                effects: resolved_effects,
                error_domain: error_domain.clone(),
                type_params: type_params.to_vec(),
            }))
        }
        TypeExpr::Record { fields, .. } => {
            let mut names = Vec::with_capacity(fields.len());
            let mut types = Vec::with_capacity(fields.len());
            for (name, field_type) in fields {
                names.push(ctx.interner.intern_string(name));
                types.push(resolve_type_expr(ctx, field_type, type_params)?);
            }
            Ok(ctx.interner.intern_type(ResolvedType::Record(names, types)))
        }
        TypeExpr::Union { variants, .. } => {
            let mut resolved = Vec::with_capacity(variants.len());
            for variant in variants {
                resolved.push(resolve_type_expr(ctx, variant, type_params)?);
            }
            Ok(ctx.interner.intern_type(ResolvedType::Union(resolved)))
        }
    }
}

/// `N` in `Array<T, N>`/`Vector<T, N>`. A literal integer is the only
/// supported const expression (§4.4.2's α1 note); a bare identifier is
/// diagnosed rather than evaluated. No size at all means a dynamically-sized
/// array/vector, represented here as size `0` — there is no dedicated
/// "unsized" variant on `ResolvedType::Array`/`Vector`.
fn resolve_const_size(size: &Option<ConstExpr>) -> Result<usize, ResolutionError> {
    match size {
        None => Ok(0),
        Some(ConstExpr::IntLiteral(value, _)) => Ok((*value).max(0) as usize),
        Some(ConstExpr::Id(_, id_span)) => Err(ResolutionError::InvalidConstExpr {
            span: id_span.clone(),
        }),
    }
}
