//! Expression parsing: precedence-climbing binary/unary operators (§4.3's
//! thirteen-level table) plus the special forms of §4.4.3
//! (`ok`/`err`/`check`/`ensure`/`map_error`/`match`/lambda/`unsafe_cast`/
//! `comptime`/`with context … in`).

use crate::ast::expression::{BinaryOp, MatchArm, UnaryOp};
use crate::ast::{Block, Expression, FunctionParam};
use crate::lexer::token::{GetPosition, Keyword, Punct, Token};
use crate::parser::error::ParseError;
use crate::parser::parse_state::ParseState;
use crate::parser::pattern::parse_pattern;
use crate::parser::stmt::parse_block;
use crate::parser::types::{expect_ident, expect_keyword, expect_punct, parse_type};
use crate::span::Span;

pub fn parse_expression(state: &mut ParseState) -> Result<Expression, ParseError> {
    state.enter()?;
    let result = parse_range(state);
    state.exit();
    result
}

fn parse_range(state: &mut ParseState) -> Result<Expression, ParseError> {
    let left = parse_logical_or(state)?;
    let inclusive = match state.peek() {
        Token::Punct(Punct::DotDotEq, _) => true,
        Token::Punct(Punct::DotDot, _) => false,
        _ => return Ok(left),
    };
    state.bump();
    let right = parse_logical_or(state)?;
    let span = left.span().merge(&right.span());
    Ok(Expression::Range {
        start: Box::new(left),
        end: Box::new(right),
        inclusive,
        span,
    })
}

macro_rules! left_assoc_level {
    ($name:ident, $next:ident, [$(($punct:pat, $op:expr)),+ $(,)?]) => {
        fn $name(state: &mut ParseState) -> Result<Expression, ParseError> {
            let mut left = $next(state)?;
            loop {
                let op = match state.peek() {
                    $(Token::Punct($punct, _) => $op,)+
                    _ => break,
                };
                state.bump();
                let right = $next(state)?;
                let span = left.span().merge(&right.span());
                left = Expression::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                };
            }
            Ok(left)
        }
    };
}

left_assoc_level!(parse_logical_or, parse_logical_and, [(Punct::OrOr, BinaryOp::Or)]);
left_assoc_level!(parse_logical_and, parse_equality, [(Punct::AndAnd, BinaryOp::And)]);
left_assoc_level!(
    parse_equality,
    parse_comparison,
    [(Punct::EqEq, BinaryOp::Eq), (Punct::NotEq, BinaryOp::NotEq)]
);
left_assoc_level!(
    parse_comparison,
    parse_bitor,
    [
        (Punct::Lt, BinaryOp::Lt),
        (Punct::LtEq, BinaryOp::LtEq),
        (Punct::Gt, BinaryOp::Gt),
        (Punct::GtEq, BinaryOp::GtEq),
    ]
);
left_assoc_level!(parse_bitor, parse_bitxor, [(Punct::Pipe, BinaryOp::BitOr)]);
left_assoc_level!(parse_bitxor, parse_bitand, [(Punct::Caret, BinaryOp::BitXor)]);
left_assoc_level!(parse_bitand, parse_shift, [(Punct::Amp, BinaryOp::BitAnd)]);
left_assoc_level!(
    parse_shift,
    parse_additive,
    [(Punct::Shl, BinaryOp::Shl), (Punct::Shr, BinaryOp::Shr)]
);
left_assoc_level!(
    parse_additive,
    parse_multiplicative,
    [
        (Punct::Plus, BinaryOp::Add),
        (Punct::Minus, BinaryOp::Sub),
        (Punct::PlusPlus, BinaryOp::Concat),
    ]
);
left_assoc_level!(
    parse_multiplicative,
    parse_unary,
    [
        (Punct::Star, BinaryOp::Mul),
        (Punct::Slash, BinaryOp::Div),
        (Punct::Percent, BinaryOp::Mod),
    ]
);

fn parse_unary(state: &mut ParseState) -> Result<Expression, ParseError> {
    let op = match state.peek() {
        Token::Punct(Punct::Minus, _) => Some(UnaryOp::Neg),
        Token::Punct(Punct::Bang, _) => Some(UnaryOp::Not),
        Token::Punct(Punct::Tilde, _) => Some(UnaryOp::BitNot),
        _ => None,
    };
    let Some(op) = op else {
        return parse_postfix(state);
    };
    let start = state.bump().position();
    let operand = parse_unary(state)?;
    let span = start.merge(&operand.span());
    Ok(Expression::Unary {
        op,
        operand: Box::new(operand),
        span,
    })
}

fn parse_postfix(state: &mut ParseState) -> Result<Expression, ParseError> {
    let mut expr = parse_primary(state)?;
    loop {
        expr = match state.peek() {
            Token::Punct(Punct::LParen, _) => {
                state.bump();
                let mut args = Vec::new();
                while !matches!(state.peek(), Token::Punct(Punct::RParen, _)) {
                    args.push(parse_expression(state)?);
                    if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                        state.bump();
                    } else {
                        break;
                    }
                }
                let close = expect_punct(state, Punct::RParen, "`)`")?;
                let span = expr.span().merge(&close);
                Expression::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                }
            }
            Token::Punct(Punct::Dot, _) => {
                state.bump();
                let field = expect_ident(state)?;
                let span = expr.span().merge(&state.prev_span());
                Expression::FieldAccess {
                    target: Box::new(expr),
                    field,
                    span,
                }
            }
            Token::Punct(Punct::LBracket, _) => {
                state.bump();
                let index = parse_expression(state)?;
                let close = expect_punct(state, Punct::RBracket, "`]`")?;
                let span = expr.span().merge(&close);
                Expression::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    span,
                }
            }
            _ => break,
        };
    }
    Ok(expr)
}

fn parse_primary(state: &mut ParseState) -> Result<Expression, ParseError> {
    match state.peek().clone() {
        Token::Int { value, span, .. } => {
            state.bump();
            Ok(Expression::IntLiteral { value, span })
        }
        Token::Float { value, span } => {
            state.bump();
            Ok(Expression::FloatLiteral { value, span })
        }
        Token::Str { value, span } => {
            state.bump();
            Ok(Expression::StringLiteral { value, span })
        }
        Token::ByteStr { value, span } => {
            state.bump();
            Ok(Expression::BytesLiteral { value, span })
        }
        Token::Char { value, span } => {
            state.bump();
            Ok(Expression::CharLiteral { value, span })
        }
        Token::Keyword(Keyword::True, span) => {
            state.bump();
            Ok(Expression::BoolLiteral { value: true, span })
        }
        Token::Keyword(Keyword::False, span) => {
            state.bump();
            Ok(Expression::BoolLiteral { value: false, span })
        }
        Token::Keyword(Keyword::Null, span) => {
            state.bump();
            Ok(Expression::NullLiteral(span))
        }
        Token::Keyword(Keyword::Ok, span) => {
            state.bump();
            let value = parse_expression(state)?;
            let span = span.merge(&value.span());
            Ok(Expression::Ok {
                value: Box::new(value),
                span,
            })
        }
        Token::Keyword(Keyword::Err, span) => parse_err(state, span),
        Token::Keyword(Keyword::Check, span) => parse_check(state, span),
        Token::Keyword(Keyword::Ensure, span) => parse_ensure(state, span),
        Token::Keyword(Keyword::MapError, span) => parse_map_error(state, span),
        Token::Keyword(Keyword::Match, span) => parse_match(state, span),
        Token::Keyword(Keyword::Comptime, span) => {
            state.bump();
            let inner = parse_expression(state)?;
            let span = span.merge(&inner.span());
            Ok(Expression::Comptime {
                inner: Box::new(inner),
                span,
            })
        }
        Token::Keyword(Keyword::UnsafeCast, span) => parse_unsafe_cast(state, span),
        Token::Keyword(Keyword::With, span) => parse_with(state, span),
        Token::Punct(Punct::LParen, span) => parse_lambda_or_parenthesized(state, span),
        Token::Punct(Punct::LBracket, span) => {
            state.bump();
            let mut elements = Vec::new();
            while !matches!(state.peek(), Token::Punct(Punct::RBracket, _)) {
                elements.push(parse_expression(state)?);
                if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                    state.bump();
                } else {
                    break;
                }
            }
            let close = expect_punct(state, Punct::RBracket, "`]`")?;
            Ok(Expression::ArrayLiteral {
                elements,
                span: span.merge(&close),
            })
        }
        Token::Punct(Punct::LBrace, span) => parse_block_or_anonymous_record(state, span),
        Token::Id(name, span) => {
            state.bump();
            if matches!(state.peek(), Token::Punct(Punct::LBrace, _)) && looks_like_record(state) {
                parse_record_literal(state, Some(name), span)
            } else {
                Ok(Expression::Id(name, span))
            }
        }
        other => Err(ParseError::UnexpectedToken {
            expected: "an expression".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}

/// A `{` after an identifier starts a record literal only when the very next
/// tokens look like `ident :` — this disambiguates `if cond { ... }` (a
/// block, not a record) from `Point { x: 1, y: 2 }`.
fn looks_like_record(state: &ParseState) -> bool {
    // Deliberately does not treat bare `{}` as an (empty) record literal —
    // `if cond { }` must keep parsing as an empty block.
    matches!(
        (state.peek_at(1), state.peek_at(2)),
        (Token::Id(_, _), Token::Punct(Punct::Colon, _))
    )
}

fn parse_record_literal(
    state: &mut ParseState,
    type_name: Option<String>,
    start: Span,
) -> Result<Expression, ParseError> {
    expect_punct(state, Punct::LBrace, "`{`")?;
    let mut fields = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        let name = expect_ident(state)?;
        expect_punct(state, Punct::Colon, "`:`")?;
        let value = parse_expression(state)?;
        fields.push((name, value));
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    let close = expect_punct(state, Punct::RBrace, "`}`")?;
    Ok(Expression::RecordLiteral {
        type_name,
        fields,
        span: start.merge(&close),
    })
}

fn parse_block_or_anonymous_record(
    state: &mut ParseState,
    span: Span,
) -> Result<Expression, ParseError> {
    if looks_like_record(state) {
        return parse_record_literal(state, None, span);
    }
    let block = parse_block(state)?;
    Ok(Expression::Block(Box::new(block)))
}

fn parse_err(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    let variant = expect_ident(state)?;
    let mut fields = Vec::new();
    let mut end = state.prev_span();
    if matches!(state.peek(), Token::Punct(Punct::LBrace, _)) {
        state.bump();
        while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
            let name = expect_ident(state)?;
            expect_punct(state, Punct::Colon, "`:`")?;
            let value = parse_expression(state)?;
            fields.push((name, value));
            if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                state.bump();
            } else {
                break;
            }
        }
        end = expect_punct(state, Punct::RBrace, "`}`")?;
    }
    Ok(Expression::Err {
        variant,
        fields,
        span: span.merge(&end),
    })
}

fn parse_check(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    let inner = parse_expression(state)?;
    let mut context_fields = Vec::new();
    let mut end = inner.span();
    if matches!(state.peek(), Token::Keyword(Keyword::With, _)) {
        state.bump();
        expect_punct(state, Punct::LBrace, "`{`")?;
        while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
            let name = expect_ident(state)?;
            expect_punct(state, Punct::Colon, "`:`")?;
            let value = parse_expression(state)?;
            context_fields.push((name, value));
            if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                state.bump();
            } else {
                break;
            }
        }
        end = expect_punct(state, Punct::RBrace, "`}`")?;
    }
    Ok(Expression::Check {
        inner: Box::new(inner),
        context_fields,
        span: span.merge(&end),
    })
}

fn parse_ensure(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    let condition = parse_expression(state)?;
    expect_keyword(state, Keyword::Else, "`else`")?;
    let otherwise = parse_expression(state)?;
    let span = span.merge(&otherwise.span());
    Ok(Expression::Ensure {
        condition: Box::new(condition),
        otherwise: Box::new(otherwise),
        span,
    })
}

fn parse_map_error(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    let inner = parse_expression(state)?;
    expect_using(state)?;
    expect_punct(state, Punct::LParen, "`(`")?;
    let param = expect_ident(state)?;
    expect_punct(state, Punct::FatArrow, "`=>`")?;
    let mapper = parse_expression(state)?;
    let close = expect_punct(state, Punct::RParen, "`)`")?;
    Ok(Expression::MapError {
        inner: Box::new(inner),
        param,
        mapper: Box::new(mapper),
        span: span.merge(&close),
    })
}

/// `using` is not a reserved keyword (§4.2's keyword list omits it) — it is
/// matched as a contextual identifier, the same way Rust treats `union`.
fn expect_using(state: &mut ParseState) -> Result<(), ParseError> {
    match state.peek().clone() {
        Token::Id(name, _) if name == "using" => {
            state.bump();
            Ok(())
        }
        other => Err(ParseError::UnexpectedToken {
            expected: "`using`".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}

fn parse_match(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    let scrutinee = parse_expression(state)?;
    expect_punct(state, Punct::LBrace, "`{`")?;
    let mut arms = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        let pattern = parse_pattern(state)?;
        let guard = if matches!(state.peek(), Token::Keyword(Keyword::If, _)) {
            state.bump();
            Some(parse_expression(state)?)
        } else {
            None
        };
        expect_punct(state, Punct::FatArrow, "`=>`")?;
        let body = parse_expression(state)?;
        let arm_span = pattern.span().merge(&body.span());
        arms.push(MatchArm {
            pattern,
            guard,
            body,
            span: arm_span,
        });
        if matches!(state.peek(), Token::Punct(Punct::Semicolon, _)) {
            state.bump();
        } else {
            break;
        }
    }
    let close = expect_punct(state, Punct::RBrace, "`}`")?;
    Ok(Expression::Match {
        scrutinee: Box::new(scrutinee),
        arms,
        span: span.merge(&close),
    })
}

fn parse_unsafe_cast(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    expect_punct(state, Punct::Lt, "`<`")?;
    let target_type = parse_type(state)?;
    expect_punct(state, Punct::Gt, "`>`")?;
    expect_punct(state, Punct::LParen, "`(`")?;
    let inner = parse_expression(state)?;
    let close = expect_punct(state, Punct::RParen, "`)`")?;
    Ok(Expression::UnsafeCast {
        target_type,
        inner: Box::new(inner),
        span: span.merge(&close),
    })
}

fn parse_with(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump();
    expect_keyword(state, Keyword::Context, "`context`")?;
    expect_punct(state, Punct::LBrace, "`{`")?;
    let mut context_fields = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        let name = expect_ident(state)?;
        expect_punct(state, Punct::Colon, "`:`")?;
        let value = parse_expression(state)?;
        context_fields.push((name, value));
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::RBrace, "`}`")?;
    expect_keyword(state, Keyword::In, "`in`")?;
    let body = parse_block(state)?;
    let span = span.merge(&body.span);
    Ok(Expression::With {
        context_fields,
        body: Box::new(body),
        span,
    })
}

fn parse_lambda_or_parenthesized(
    state: &mut ParseState,
    span: Span,
) -> Result<Expression, ParseError> {
    let checkpoint = state.get_index();
    match parse_lambda(state, span.clone()) {
        Ok(lambda) => Ok(lambda),
        Err(_) => {
            state.set_index(checkpoint);
            state.bump(); // `(`
            let inner = parse_expression(state)?;
            expect_punct(state, Punct::RParen, "`)`")?;
            Ok(inner)
        }
    }
}

fn parse_lambda(state: &mut ParseState, span: Span) -> Result<Expression, ParseError> {
    state.bump(); // `(`
    let mut params = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RParen, _)) {
        let inout = matches!(state.peek(), Token::Keyword(Keyword::Inout, _));
        if inout {
            state.bump();
        }
        let name = expect_ident(state)?;
        expect_punct(state, Punct::Colon, "`:`")?;
        let type_expr = parse_type(state)?;
        let param_span = state.prev_span();
        params.push(FunctionParam {
            name,
            type_expr,
            inout,
            span: param_span,
        });
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::RParen, "`)`")?;

    let return_type = if matches!(state.peek(), Token::Punct(Punct::Arrow, _)) {
        state.bump();
        Some(parse_type(state)?)
    } else {
        None
    };

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
    if matches!(state.peek(), Token::Keyword(Keyword::Error, _)) {
        state.bump();
        error_domain = Some(expect_ident(state)?);
    }

    expect_punct(state, Punct::FatArrow, "`=>`")?;
    let body = if matches!(state.peek(), Token::Punct(Punct::LBrace, _)) {
        parse_block(state)?
    } else {
        let expr = parse_expression(state)?;
        let body_span = expr.span();
        Block {
            statements: vec![crate::ast::Statement::Expr(expr)],
            span: body_span,
        }
    };
    let span = span.merge(&body.span);
    Ok(Expression::Lambda {
        params,
        return_type,
        effects,
        error_domain,
        body: Box::new(body),
        span,
    })
}
