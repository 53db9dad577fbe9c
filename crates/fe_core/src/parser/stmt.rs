//! Statement and top-level declaration parsing (§4.3).

use crate::ast::{
    Assignment, Block, DomainDecl, DomainShape, ErrorDecl, ErrorVariant, ForStatement,
    FunctionDecl, FunctionParam, IfStatement, ImportDecl, Module, PackageDecl, Statement,
    TypeDecl, TypeParam, VarDecl, Variance, WhileStatement,
};
use crate::lexer::token::{GetPosition, Keyword, Punct, Token};
use crate::parser::error::ParseError;
use crate::parser::expr::parse_expression;
use crate::parser::parse_state::ParseState;
use crate::parser::types::{expect_ident, expect_keyword, expect_punct, parse_type};
use crate::span::Span;

pub fn parse_module(state: &mut ParseState) -> Module {
    let mut module = Module::default();

    if matches!(state.peek(), Token::Keyword(Keyword::Package, _)) {
        let span = state.bump().position();
        match expect_ident(state) {
            Ok(name) => {
                let span = span.merge(&state.prev_span());
                module.package = Some(PackageDecl { name, span });
                let _ = expect_punct(state, Punct::Semicolon, "`;`");
            }
            Err(e) => recover(state, e),
        }
    }

    while matches!(state.peek(), Token::Keyword(Keyword::Import, _)) {
        match parse_import(state) {
            Ok(import) => module.imports.push(import),
            Err(e) => {
                recover(state, e);
                break;
            }
        }
    }

    while !state.is_at_end() {
        match parse_statement(state) {
            Ok(stmt) => module.statements.push(stmt),
            Err(e) => recover(state, e),
        }
    }

    module
}

/// Recover to the next token that can plausibly start a top-level
/// declaration, after recording the error (§4.3 "Error recovery").
fn recover(state: &mut ParseState, error: ParseError) {
    state.add_error(error);
    state.synchronize(|tok| {
        matches!(
            tok,
            Token::Keyword(
                Keyword::Const
                    | Keyword::Var
                    | Keyword::Function
                    | Keyword::Type
                    | Keyword::Error
                    | Keyword::Domain
                    | Keyword::Pub
                    | Keyword::Export
                    | Keyword::Use
                    | Keyword::Import
            )
        )
    });
    if !state.is_at_end() {
        state.bump();
    }
}

fn parse_import(state: &mut ParseState) -> Result<ImportDecl, ParseError> {
    let start = state.bump().position(); // `import`
    let mut path = vec![expect_ident(state)?];
    while matches!(state.peek(), Token::Punct(Punct::Dot, _)) {
        state.bump();
        path.push(expect_ident(state)?);
    }
    let mut alias = None;
    if matches!(state.peek(), Token::Keyword(Keyword::As, _)) {
        state.bump();
        alias = Some(expect_ident(state)?);
    }
    let end = state.prev_span();
    expect_punct(state, Punct::Semicolon, "`;`")?;
    Ok(ImportDecl {
        path,
        alias,
        span: start.merge(&end),
    })
}

pub fn parse_statement(state: &mut ParseState) -> Result<Statement, ParseError> {
    match state.peek().clone() {
        Token::Keyword(Keyword::Pub, span) => {
            state.bump();
            parse_decl_after_visibility(state, span, true)
        }
        Token::Keyword(Keyword::Const | Keyword::Var | Keyword::Function | Keyword::Type | Keyword::Error | Keyword::Domain, span) => {
            parse_decl_after_visibility(state, span, false)
        }
        Token::Keyword(Keyword::Export, span) => {
            state.bump();
            let decl = parse_decl_after_visibility(state, span, true)?;
            Ok(mark_export(decl))
        }
        Token::Keyword(Keyword::Use, span) => {
            state.bump();
            expect_keyword(state, Keyword::Error, "`error`")?;
            let name = expect_ident(state)?;
            let end = state.prev_span();
            expect_punct(state, Punct::Semicolon, "`;`")?;
            Ok(Statement::UseErrorDefault(name, span.merge(&end)))
        }
        Token::Keyword(Keyword::Return, span) => {
            state.bump();
            let value = if matches!(state.peek(), Token::Punct(Punct::Semicolon, _)) {
                None
            } else {
                Some(parse_expression(state)?)
            };
            let end = state.prev_span();
            expect_punct(state, Punct::Semicolon, "`;`")?;
            Ok(Statement::Return(value, span.merge(&end)))
        }
        Token::Keyword(Keyword::Defer, span) => {
            state.bump();
            let expr = parse_expression(state)?;
            let end = state.prev_span();
            expect_punct(state, Punct::Semicolon, "`;`")?;
            Ok(Statement::Defer(expr, span.merge(&end)))
        }
        Token::Keyword(Keyword::If, span) => parse_if(state, span),
        Token::Keyword(Keyword::While, span) => parse_while(state, span),
        Token::Keyword(Keyword::For, span) => parse_for(state, span),
        Token::Keyword(Keyword::Break, span) => {
            state.bump();
            expect_punct(state, Punct::Semicolon, "`;`")?;
            Ok(Statement::Break(span))
        }
        Token::Keyword(Keyword::Continue, span) => {
            state.bump();
            expect_punct(state, Punct::Semicolon, "`;`")?;
            Ok(Statement::Continue(span))
        }
        _ => parse_expr_or_assignment_statement(state),
    }
}

fn mark_export(stmt: Statement) -> Statement {
    match stmt {
        Statement::FunctionDecl(mut decl) => {
            decl.is_export = true;
            Statement::FunctionDecl(decl)
        }
        other => other,
    }
}

fn parse_decl_after_visibility(
    state: &mut ParseState,
    span: Span,
    is_pub: bool,
) -> Result<Statement, ParseError> {
    match state.peek().clone() {
        Token::Keyword(Keyword::Const, _) => parse_var_decl(state, span, is_pub, true).map(Statement::ConstDecl),
        Token::Keyword(Keyword::Var, _) => parse_var_decl(state, span, is_pub, false).map(Statement::VarDecl),
        Token::Keyword(Keyword::Function, _) => parse_function_decl(state, span, is_pub).map(Statement::FunctionDecl),
        Token::Keyword(Keyword::Type, _) => parse_type_decl(state, span, is_pub).map(Statement::TypeDecl),
        Token::Keyword(Keyword::Error, _) => parse_error_decl(state, span).map(Statement::ErrorDecl),
        Token::Keyword(Keyword::Domain, _) => parse_domain_decl(state, span).map(Statement::DomainDecl),
        other => Err(ParseError::UnexpectedToken {
            expected: "a declaration".into(),
            found: format!("{other:?}"),
            span: other.position(),
        }),
    }
}

fn parse_var_decl(
    state: &mut ParseState,
    start: Span,
    is_pub: bool,
    _is_const: bool,
) -> Result<VarDecl, ParseError> {
    state.bump(); // `const` / `var`
    let name = expect_ident(state)?;
    let type_expr = if matches!(state.peek(), Token::Punct(Punct::Colon, _)) {
        state.bump();
        Some(parse_type(state)?)
    } else {
        None
    };
    expect_punct(state, Punct::Eq, "`=`")?;
    let init = parse_expression(state)?;
    let end = state.prev_span();
    expect_punct(state, Punct::Semicolon, "`;`")?;
    Ok(VarDecl {
        name,
        type_expr,
        init,
        is_pub,
        span: start.merge(&end),
    })
}

fn parse_type_params(state: &mut ParseState) -> Result<Vec<TypeParam>, ParseError> {
    if !matches!(state.peek(), Token::Punct(Punct::Lt, _)) {
        return Ok(Vec::new());
    }
    state.bump();
    let mut params = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::Gt, _)) {
        let variance = match state.peek() {
            Token::Keyword(Keyword::In, _) => {
                state.bump();
                Variance::In
            }
            Token::Keyword(Keyword::Out, _) => {
                state.bump();
                Variance::Out
            }
            _ => Variance::Invariant,
        };
        let start = state.span();
        let name = expect_ident(state)?;
        let constraint = if matches!(state.peek(), Token::Punct(Punct::Colon, _)) {
            state.bump();
            Some(parse_type(state)?)
        } else {
            None
        };
        let const_type = if matches!(state.peek(), Token::Keyword(Keyword::Const, _)) {
            state.bump();
            expect_punct(state, Punct::Colon, "`:`")?;
            Some(parse_type(state)?)
        } else {
            None
        };
        let span = start.merge(&state.prev_span());
        params.push(TypeParam {
            name,
            variance,
            constraint,
            const_type,
            span,
        });
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::Gt, "`>`")?;
    Ok(params)
}

fn parse_function_params(state: &mut ParseState) -> Result<Vec<FunctionParam>, ParseError> {
    expect_punct(state, Punct::LParen, "`(`")?;
    let mut params = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RParen, _)) {
        let inout = matches!(state.peek(), Token::Keyword(Keyword::Inout, _));
        let start = state.span();
        if inout {
            state.bump();
        }
        let name = expect_ident(state)?;
        expect_punct(state, Punct::Colon, "`:`")?;
        let type_expr = parse_type(state)?;
        let span = start.merge(&state.prev_span());
        params.push(FunctionParam {
            name,
            type_expr,
            inout,
            span,
        });
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::RParen, "`)`")?;
    Ok(params)
}

fn parse_function_decl(
    state: &mut ParseState,
    start: Span,
    is_pub: bool,
) -> Result<FunctionDecl, ParseError> {
    state.bump(); // `function`
    let name_span = state.span();
    let name = expect_ident(state)?;
    let type_params = parse_type_params(state)?;
    let params = parse_function_params(state)?;

    let return_type = if matches!(state.peek(), Token::Punct(Punct::Arrow, _)) {
        state.bump();
        parse_type(state)?
    } else {
        crate::ast::TypeExpr::Named("Unit".to_string(), state.prev_span())
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

    let body = parse_block(state)?;
    let span = start.merge(&body.span);
    Ok(FunctionDecl {
        name,
        type_params,
        params,
        return_type,
        effects,
        error_domain,
        is_pub,
        is_export: false,
        body,
        span,
        name_span,
    })
}

fn parse_type_decl(
    state: &mut ParseState,
    start: Span,
    is_pub: bool,
) -> Result<TypeDecl, ParseError> {
    state.bump(); // `type`
    let name = expect_ident(state)?;
    let type_params = parse_type_params(state)?;
    expect_punct(state, Punct::Eq, "`=`")?;
    let underlying = parse_type(state)?;
    let end = state.prev_span();
    expect_punct(state, Punct::Semicolon, "`;`")?;
    Ok(TypeDecl {
        name,
        type_params,
        underlying,
        is_pub,
        span: start.merge(&end),
    })
}

fn parse_error_variants(state: &mut ParseState) -> Result<Vec<ErrorVariant>, ParseError> {
    expect_punct(state, Punct::LBrace, "`{`")?;
    let mut variants = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        let variant_span = state.span();
        let name = expect_ident(state)?;
        let mut fields = Vec::new();
        if matches!(state.peek(), Token::Punct(Punct::LBrace, _)) {
            state.bump();
            while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
                let field_name = expect_ident(state)?;
                expect_punct(state, Punct::Colon, "`:`")?;
                let field_type = parse_type(state)?;
                fields.push((field_name, field_type));
                if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
                    state.bump();
                } else {
                    break;
                }
            }
            expect_punct(state, Punct::RBrace, "`}`")?;
        }
        let span = variant_span.merge(&state.prev_span());
        variants.push(ErrorVariant { name, fields, span });
        if matches!(state.peek(), Token::Punct(Punct::Comma, _)) {
            state.bump();
        } else {
            break;
        }
    }
    expect_punct(state, Punct::RBrace, "`}`")?;
    Ok(variants)
}

fn parse_error_decl(state: &mut ParseState, start: Span) -> Result<ErrorDecl, ParseError> {
    state.bump(); // `error`
    let name = expect_ident(state)?;
    let variants = parse_error_variants(state)?;
    let end = state.prev_span();
    Ok(ErrorDecl {
        name,
        variants,
        span: start.merge(&end),
    })
}

fn parse_domain_decl(state: &mut ParseState, start: Span) -> Result<DomainDecl, ParseError> {
    state.bump(); // `domain`
    let name = expect_ident(state)?;
    expect_punct(state, Punct::Eq, "`=`")?;

    if matches!(state.peek(), Token::Punct(Punct::LBrace, _)) {
        let variants = parse_error_variants(state)?;
        let end = state.prev_span();
        return Ok(DomainDecl {
            name,
            shape: DomainShape::Inline(variants),
            span: start.merge(&end),
        });
    }

    let mut names = vec![expect_ident(state)?];
    while matches!(state.peek(), Token::Punct(Punct::Pipe, _)) {
        state.bump();
        names.push(expect_ident(state)?);
    }
    let end = state.prev_span();
    expect_punct(state, Punct::Semicolon, "`;`")?;
    Ok(DomainDecl {
        name,
        shape: DomainShape::Union(names),
        span: start.merge(&end),
    })
}

pub fn parse_block(state: &mut ParseState) -> Result<Block, ParseError> {
    state.enter()?;
    let result = parse_block_inner(state);
    state.exit();
    result
}

fn parse_block_inner(state: &mut ParseState) -> Result<Block, ParseError> {
    let start = expect_punct(state, Punct::LBrace, "`{`")?;
    let mut statements = Vec::new();
    while !matches!(state.peek(), Token::Punct(Punct::RBrace, _)) {
        statements.push(parse_statement(state)?);
    }
    let close = expect_punct(state, Punct::RBrace, "`}`")?;
    Ok(Block {
        statements,
        span: start.merge(&close),
    })
}

fn parse_if(state: &mut ParseState, start: Span) -> Result<Statement, ParseError> {
    state.bump(); // `if`
    let condition = parse_expression(state)?;
    let then_block = parse_block(state)?;
    let else_block = if matches!(state.peek(), Token::Keyword(Keyword::Else, _)) {
        state.bump();
        if matches!(state.peek(), Token::Keyword(Keyword::If, _)) {
            let nested_span = state.span();
            let nested = parse_if(state, nested_span)?;
            Some(Block {
                span: nested.span(),
                statements: vec![nested],
            })
        } else {
            Some(parse_block(state)?)
        }
    } else {
        None
    };
    let end = else_block
        .as_ref()
        .map(|b| b.span.clone())
        .unwrap_or_else(|| then_block.span.clone());
    Ok(Statement::If(IfStatement {
        condition,
        then_block,
        else_block,
        span: start.merge(&end),
    }))
}

fn parse_while(state: &mut ParseState, start: Span) -> Result<Statement, ParseError> {
    state.bump(); // `while`
    let condition = parse_expression(state)?;
    let body = parse_block(state)?;
    let span = start.merge(&body.span);
    Ok(Statement::While(WhileStatement {
        condition,
        body,
        span,
    }))
}

fn parse_for(state: &mut ParseState, start: Span) -> Result<Statement, ParseError> {
    state.bump(); // `for`
    let binding = expect_ident(state)?;
    expect_keyword(state, Keyword::In, "`in`")?;
    let iterable = parse_expression(state)?;
    let body = parse_block(state)?;
    let span = start.merge(&body.span);
    Ok(Statement::For(ForStatement {
        binding,
        iterable,
        body,
        span,
    }))
}

fn parse_expr_or_assignment_statement(state: &mut ParseState) -> Result<Statement, ParseError> {
    let expr = parse_expression(state)?;
    if matches!(state.peek(), Token::Punct(Punct::Eq, _)) {
        state.bump();
        let value = parse_expression(state)?;
        let span = expr.span().merge(&value.span());
        expect_punct(state, Punct::Semicolon, "`;`")?;
        return Ok(Statement::Assignment(Assignment {
            target: expr,
            value,
            span,
        }));
    }
    expect_punct(state, Punct::Semicolon, "`;`")?;
    Ok(Statement::Expr(expr))
}
