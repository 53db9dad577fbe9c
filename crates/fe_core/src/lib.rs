//! Front-end for the `fe` language: lexer, parser, and a seven-pass
//! semantic analyser (§2 "Overview").
//!
//! [`compile`] runs the whole pipeline over one file's source text and
//! returns the typed module plus whatever diagnostics were collected along
//! the way; `lexer::lex`/`parser::parse` are exposed separately for callers
//! (tests, a future language server) that want to stop partway through.

pub mod analyzer;
pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod domains;
pub mod effects;
pub mod lexer;
pub mod parser;
pub mod sidetables;
pub mod span;
pub mod symbols;
pub mod typed_ast;
pub mod types;

use std::rc::Rc;

use log::{debug, info};

use context::CompilationContext;
use diagnostics::Diagnostic;
use lexer::LexError;
use typed_ast::TypedModule;

/// The result of running the full pipeline over one file: the typed module
/// (empty side tables if lexing failed outright) plus every diagnostic
/// collected across lexing, parsing, and analysis, in emission order.
pub struct CompileResult {
    pub typed: TypedModule,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == diagnostics::Level::Error)
    }
}

/// Lex, parse, and run the seven-pass analyser over `source`, named `file`
/// for diagnostic rendering. A lex failure short-circuits with just that
/// one diagnostic; a parse failure still runs the analyser over whatever
/// top-level statements were recovered (§4.3 "Error recovery").
pub fn compile(file: impl Into<Rc<str>>, source: impl Into<String>) -> CompileResult {
    let file = file.into();
    let source = source.into();
    info!("compiling '{file}'");
    let mut ctx = CompilationContext::new(file.clone(), source.clone());

    let tokens = match lexer::lex(&source, file.clone()) {
        Ok(tokens) => tokens,
        Err(LexError { message, span }) => {
            debug!("lexing '{file}' failed: {message}");
            ctx.diagnostics.add_error(message, span);
            return CompileResult {
                typed: TypedModule::new(ast::Module::default()),
                diagnostics: ctx.diagnostics.into_diagnostics(),
            };
        }
    };
    debug!("lexed '{file}' into {} tokens", tokens.len());

    let (module, parse_errors) = parser::parse(tokens);
    debug!(
        "parsed '{file}' into {} top-level statements ({} parse errors)",
        module.statements.len(),
        parse_errors.len()
    );
    for error in parse_errors {
        let span = error.span();
        ctx.diagnostics.add_error(error.to_string(), span);
    }

    let typed = analyzer::analyze(&mut ctx, module);
    if ctx.diagnostics.has_errors() {
        debug!("'{file}' failed semantic analysis");
    } else {
        info!("'{file}' compiled cleanly");
    }
    CompileResult {
        typed,
        diagnostics: ctx.diagnostics.into_diagnostics(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_small_clean_module() {
        let result = compile(
            "t.fe",
            r#"
                const limit: i32 = 10;

                function double(n: i32) -> i32 {
                    return n * 2;
                }
            "#,
        );
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn duplicate_declarations_are_reported_and_later_passes_are_skipped() {
        let result = compile(
            "t.fe",
            r#"
                const x: i32 = 1;
                const x: i32 = 2;
            "#,
        );
        assert!(result.has_errors());
        assert!(result.typed.types.is_empty());
    }

    #[test]
    fn undeclared_effect_is_caught_even_though_it_is_not_a_pass1_error() {
        let result = compile(
            "t.fe",
            r#"
                function main(stdio: Io) {
                    io.println("hi");
                }
            "#,
        );
        assert!(result.has_errors());
    }
}
