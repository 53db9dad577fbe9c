//! Pattern parsing for `match` arms (§3 "Patterns", §4.3).

use crate::ast::Pattern;
use crate::lexer::token::{GetPosition, Punct, Token};
use crate::parser::error::ParseError;
use crate::parser::parse_state::ParseState;
use crate::parser::types::expect_punct;

pub fn parse_pattern(state: &mut ParseState) -> Result<Pattern, ParseError> {
    match state.peek().clone() {
        Token::Id(name, span) if name == "_" => {
            state.bump();
            Ok(Pattern::Wildcard(span))
        }
        Token::Id(name, span) => {
            state.bump();
            if matches!(state.peek(), Token::Punct(Punct::LParen, _)) {
                state.bump();
                let mut subpatterns = Vec::new();
                while !matches!(state.peek(), Token::Punct(Punct::RParen, _)) {
                    subpatterns.push(parse_pattern(state)?);
                    if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                        state.bump();
                    } else {
                        break;
                    }
                }
                let close = expect_punct(state, Punct::RParen, "`)`")?;
                Ok(Pattern::Variant {
                    name,
                    subpatterns,
                    span: span.merge(&close),
                })
            } else {
                Ok(Pattern::Identifier(name, span))
            }
        }
        Token::Int { value, span, .. } => {
            state.bump();
            Ok(Pattern::IntLiteral(value, span))
        }
        Token::Str { value, span } => {
            state.bump();
            Ok(Pattern::StringLiteral(value, span))
        }
        Token::Punct(Punct::Minus, span) => {
            state.bump();
            match state.bump() {
                Token::Int { value, span: int_span, .. } => {
                    Ok(Pattern::IntLiteral(-value, span.merge(&int_span)))
                }
                other => Err(ParseError::UnexpectedToken {
                    expected: "an integer literal after `-`".into(),
                    found: format!("{other:?}"),
                    span: other.position(),
                }),
            }
        }
        other => Err(ParseError::UnexpectedToken {
            expected: "a pattern".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}
