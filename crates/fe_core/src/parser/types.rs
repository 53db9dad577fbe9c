//! Type-expression parsing (§4.3, §3 "Type expressions").

use crate::ast::type_expr::{ConstExpr, TypeExpr};
use crate::lexer::token::{GetPosition, Keyword, Punct, Token};
use crate::parser::error::ParseError;
use crate::parser::parse_state::ParseState;
use crate::span::Span;

pub fn parse_type(state: &mut ParseState) -> Result<TypeExpr, ParseError> {
    state.enter()?;
    let result = parse_type_inner(state);
    state.exit();
    let inner = result?;

    // Trailing `?` makes any type expression nullable.
    if matches!(state.peek(), Token::Punct(Punct::Question, _)) {
        let q_span = state.bump().position();
        let span = inner.span().merge(&q_span);
        return Ok(TypeExpr::Nullable(Box::new(inner), span));
    }
    Ok(inner)
}

fn parse_type_inner(state: &mut ParseState) -> Result<TypeExpr, ParseError> {
    match state.peek().clone() {
        Token::Punct(Punct::LBrace, _) => parse_record_type(state),
        Token::Keyword(Keyword::Function, _) => parse_function_type(state),
        Token::Id(name, span) => {
            state.bump();
            parse_named_or_generic(state, name, span)
        }
        other => Err(ParseError::UnexpectedToken {
            expected: "a type expression".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}

fn parse_named_or_generic(
    state: &mut ParseState,
    name: String,
    span: Span,
) -> Result<TypeExpr, ParseError> {
    if !matches!(state.peek(), Token::Punct(Punct::Lt, _)) {
        return Ok(TypeExpr::Named(name, span));
    }
    state.bump(); // `<`

    match name.as_str() {
        "Array" => {
            let element = parse_type(state)?;
            let size = parse_optional_const_size(state)?;
            let close = expect_punct(state, Punct::Gt, "`>`")?;
            Ok(TypeExpr::Array {
                element: Box::new(element),
                size,
                span: span.merge(&close),
            })
        }
        "Vector" => {
            let element = parse_type(state)?;
            let size = parse_optional_const_size(state)?;
            let close = expect_punct(state, Punct::Gt, "`>`")?;
            Ok(TypeExpr::Vector {
                element: Box::new(element),
                size,
                span: span.merge(&close),
            })
        }
        "View" => {
            let mutable = matches!(state.peek(), Token::Keyword(Keyword::Inout, _));
            if mutable {
                state.bump();
            }
            let element = parse_type(state)?;
            let close = expect_punct(state, Punct::Gt, "`>`")?;
            Ok(TypeExpr::View {
                element: Box::new(element),
                mutable,
                span: span.merge(&close),
            })
        }
        _ => {
            let mut args = vec![parse_type(state)?];
            while matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                state.bump();
                args.push(parse_type(state)?);
            }
            let close = expect_punct(state, Punct::Gt, "`>`")?;
            Ok(TypeExpr::Generic {
                name,
                args,
                span: span.merge(&close),
            })
        }
    }
}

fn parse_optional_const_size(state: &mut ParseState) -> Result<Option<ConstExpr>, ParseError> {
    if !matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
        return Ok(None);
    }
    state.bump();
    let const_expr = match state.bump() {
        Token::Int { value, span, .. } => ConstExpr::IntLiteral(value, span),
        Token::Id(name, span) => ConstExpr::Id(name, span),
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "a const expression".into(),
                found: format!("{other:?}"),
                span: other.position(),
            })
        }
    };
    Ok(Some(const_expr))
}

fn parse_record_type(state: &mut ParseState) -> Result<TypeExpr, ParseError> {
    let open = expect_punct(state, Punct::LBrace, "`{`")?;
    let mut fields = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        let name = expect_ident(state)?;
        expect_punct(state, Punct::Colon, "`:`")?;
        let ty = parse_type(state)?;
        fields.push((name, ty));
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    let close = expect_punct(state, Punct::RBrace, "`}`")?;
    Ok(TypeExpr::Record {
        fields,
        span: open.merge(&close),
    })
}

fn parse_function_type(state: &mut ParseState) -> Result<TypeExpr, ParseError> {
    let start = state.bump().position(); // `function`
    expect_punct(state, Punct::LParen, "`(`")?;
    let mut params = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RParen, _)) {
        params.push(parse_type(state)?);
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::RParen, "`)`")?;
    expect_punct(state, Punct::Arrow, "`->`")?;
    let return_type = parse_type(state)?;

    let mut effects = Vec::new();
    if matches!(state.peek(), Token::Keyword(Keyword::Effects, _)) {
        state.bump();
        expect_punct(state, Punct::LBracket, "`[`")?;
        while !matches!(state.peek(), Token::Punct(Punct::RBracket, _)) {
            effects.push(expect_ident(state)?);
            if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                state.bump();
            } else {
                break;
            }
        }
        expect_punct(state, Punct::RBracket, "`]`")?;
    }

    let mut error_domain = None;
    let mut end = return_type.span();
    if matches!(state.peek(), Token::Keyword(Keyword::Error, _)) {
        state.bump();
        let name = expect_ident(state)?;
        end = state.prev_span();
        error_domain = Some(name);
    }

    Ok(TypeExpr::Function {
        params,
        return_type: Box::new(return_type),
        effects,
        error_domain,
        span: start.merge(&end),
    })
}

pub(crate) fn expect_punct(
    state: &mut ParseState,
    punct: Punct,
    label: &str,
) -> Result<Span, ParseError> {
    let token = state.peek().clone();
    if matches!(&token, Token::Punct(p, _) if *p == punct) {
        state.bump();
        Ok(token.position())
    } else {
        Err(ParseError::UnexpectedToken {
            expected: label.into(),
            found: format!("{token:?}"),
            span: token.position(),
        })
    }
}

pub(crate) fn expect_keyword(
    state: &mut ParseState,
    keyword: Keyword,
    label: &str,
) -> Result<Span, ParseError> {
    let token = state.peek().clone();
    if matches!(&token, Token::Keyword(k, _) if *k == keyword) {
        state.bump();
        Ok(token.position())
    } else {
        Err(ParseError::UnexpectedToken {
            expected: label.into(),
            found: format!("{token:?}"),
            span: token.position(),
        })
    }
}

pub(crate) fn expect_ident(state: &mut ParseState) -> Result<String, ParseError> {
    match state.bump() {
        Token::Id(name, _) => Ok(name),
        other => Err(ParseError::UnexpectedToken {
            expected: "an identifier".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}
