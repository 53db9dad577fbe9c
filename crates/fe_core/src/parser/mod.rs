//! Recursive-descent parser with precedence climbing (component 4, §4.3).
//!
//! Hand-written rather than built on a combinator engine or a grammar DSL:
//! each grammar rule is its own function over a shared [`ParseState`], the
//! common shape for a front-end this size in the reference ecosystem (see
//! `examples/other_examples/manifests/{LaBatata101-ruff,FuelLabs-sway}` for
//! comparable hand-rolled recursive-descent parsers). Error recovery
//! resynchronises at the next token that can start a top-level declaration,
//! so one malformed statement does not abort the whole parse (§4.3 "Error
//! recovery", testable property 2).

pub mod error;
pub mod expr;
pub mod parse_state;
pub mod pattern;
pub mod stmt;
pub mod types;

pub use error::ParseError;
pub use parse_state::ParseState;

use crate::ast::Module;
use crate::lexer::token::Token;

/// Parse a full token stream (already `lex`ed, including the trailing
/// `Token::Eof`) into an untyped [`Module`]. Parse errors are collected
/// rather than aborting the parse — every top-level declaration that could
/// be recovered to is still attempted.
pub fn parse(tokens: Vec<Token>) -> (Module, Vec<ParseError>) {
    let mut state = ParseState::new(tokens);
    let module = stmt::parse_module(&mut state);
    (module, state.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> (Module, Vec<ParseError>) {
        let tokens = lex(source, "test.fe").expect("lexing should succeed");
        parse(tokens)
    }

    #[test]
    fn parses_a_const_declaration() {
        let (module, errors) = parse_source("const x: i32 = 1;");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(module.statements.len(), 1);
        assert!(matches!(module.statements[0], crate::ast::Statement::ConstDecl(_)));
    }

    #[test]
    fn parses_a_function_with_effects_and_error_domain() {
        let source = r#"
            function read(path: String) -> String effects [fs] error IoError {
                return path;
            }
        "#;
        let (module, errors) = parse_source(source);
        assert!(errors.is_empty(), "{errors:?}");
        let crate::ast::Statement::FunctionDecl(decl) = &module.statements[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(decl.name, "read");
        assert_eq!(decl.effects, vec!["fs".to_string()]);
        assert_eq!(decl.error_domain.as_deref(), Some("IoError"));
    }

    #[test]
    fn parses_binary_precedence_left_to_right() {
        let (module, errors) = parse_source("const x: i32 = 1 + 2 * 3;");
        assert!(errors.is_empty(), "{errors:?}");
        let crate::ast::Statement::ConstDecl(decl) = &module.statements[0] else {
            panic!("expected a const declaration");
        };
        let crate::ast::Expression::Binary { op, right, .. } = &decl.init else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, crate::ast::BinaryOp::Add);
        assert!(matches!(**right, crate::ast::Expression::Binary { op: crate::ast::BinaryOp::Mul, .. }));
    }

    #[test]
    fn parses_match_expression_with_guard() {
        let source = r#"
            function classify(n: i32) -> String {
                return match n {
                    0 => "zero";
                    _ if n > 0 => "positive";
                    _ => "negative";
                };
            }
        "#;
        let (_module, errors) = parse_source(source);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn recovers_after_a_malformed_declaration() {
        let source = "const = ; function ok_fn() -> i32 { return 1; }";
        let (module, errors) = parse_source(source);
        assert!(!errors.is_empty());
        assert!(module
            .statements
            .iter()
            .any(|s| matches!(s, crate::ast::Statement::FunctionDecl(d) if d.name == "ok_fn")));
    }

    #[test]
    fn parses_domain_union_and_inline_shapes() {
        let source = r#"
            error IoError { NotFound, Timeout { after_ms: i32 } }
            domain AppError = IoError;
            domain DbError = { Missing, Stale }
        "#;
        let (module, errors) = parse_source(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(module.statements.len(), 3);
    }
}
