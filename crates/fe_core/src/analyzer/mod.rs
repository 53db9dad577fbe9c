//! The seven-pass semantic analyser (§4.4 "Pass ordering").
//!
//! Pass 1 is gated: if it reports any error, passes 2-7 are skipped
//! entirely, since resolution built on an incomplete or duplicate-ridden
//! symbol table would only cascade. Every other pass always runs, even when
//! an earlier pass (2 through 6) reported errors — soft-fail sentinels
//! (`ResolvedType::Unknown`) keep later passes from cascading instead.

pub mod error;
pub mod pass1_declarations;
pub mod pass2_type_resolution;
pub mod pass3_type_checking;
pub mod pass4_effects;
pub mod pass5_domains;
pub mod pass6_regions;
pub mod pass7_exhaustiveness;

use log::debug;

use crate::ast::Module;
use crate::context::CompilationContext;
use crate::typed_ast::TypedModule;

/// Run all seven passes over `module`, returning the typed output. The
/// `ctx.diagnostics` collector accumulates every error/warning/note emitted
/// along the way; callers check `ctx.diagnostics.has_errors()` themselves.
pub fn analyze(ctx: &mut CompilationContext, module: Module) -> TypedModule {
    pass1_declarations::run(ctx, &module);

    if ctx.diagnostics.has_errors() {
        debug!("pass 1 reported errors in '{}', skipping passes 2-7", ctx.file);
        return TypedModule::new(module);
    }

    pass2_type_resolution::run(ctx, &module);

    let mut typed = TypedModule::new(module);
    pass3_type_checking::run(ctx, &mut typed);
    pass4_effects::run(ctx, &typed.module);
    pass5_domains::run(ctx, &mut typed);
    pass6_regions::run(ctx, &typed.module);
    pass7_exhaustiveness::run(ctx, &mut typed);
    typed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Statement, VarDecl};
    use std::rc::Rc;

    fn span() -> crate::span::Span {
        crate::span::Span::new(Rc::from("t.fe"), 1, 1, 1)
    }

    #[test]
    fn pass1_errors_skip_all_later_passes() {
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
        let typed = analyze(&mut ctx, module);
        assert!(ctx.diagnostics.has_errors());
        assert!(typed.types.is_empty());
    }

    #[test]
    fn clean_module_produces_a_typed_result() {
        let mut ctx = CompilationContext::new("t.fe", "");
        let module = Module {
            package: None,
            imports: Vec::new(),
            statements: vec![Statement::ConstDecl(VarDecl {
                name: "x".to_string(),
                type_expr: None,
                init: Expression::IntLiteral { value: 1, span: span() },
                is_pub: false,
                span: span(),
            })],
        };
        let typed = analyze(&mut ctx, module);
        assert!(!ctx.diagnostics.has_errors());
        assert!(!typed.types.is_empty());
    }
}
