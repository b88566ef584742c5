//! Recursive-descent parser for the infix grammar.
//!
//! Statements are parsed top-down; expressions use Pratt precedence
//! climbing. Precedence levels, loosest to tightest: `or`, `and`,
//! comparisons, `+ -`, `* / %`, `**` (right-associative), unary.

use vexpr_ast::{BinaryOp, Expr, ExprKind, FnDecl, Span, Stmt, StmtKind, UnaryOp};
use vexpr_lexer::Token;

use crate::error::ParseError;
use crate::stream::TokenStream;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Get binary operator metadata (precedence, associativity, operator enum).
///
/// Higher precedence = tighter binding. Single source of truth for binary
/// operator parsing.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Or => Some((10, Assoc::Left, BinaryOp::Or)),
        Token::And => Some((20, Assoc::Left, BinaryOp::And)),
        Token::EqEq => Some((30, Assoc::Left, BinaryOp::Eq)),
        Token::BangEq => Some((30, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((30, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((30, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        Token::Percent => Some((50, Assoc::Left, BinaryOp::Rem)),
        Token::StarStar => Some((60, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

/// Parse a full token stream into function declarations and statements.
pub fn parse_program(tokens: &[(Token, Span)]) -> Result<(Vec<FnDecl>, Vec<Stmt>), ParseError> {
    let mut stream = TokenStream::new(tokens);
    let mut functions = Vec::new();
    let mut stmts = Vec::new();

    while !stream.at_end() {
        if stream.check(&Token::Fn) {
            functions.push(parse_fn_decl(&mut stream)?);
        } else {
            stmts.push(parse_stmt(&mut stream)?);
        }
    }

    Ok((functions, stmts))
}

/// Parse a single expression from a token slice (must consume all tokens).
pub fn parse_expr_all(tokens: &[(Token, Span)]) -> Result<Expr, ParseError> {
    let mut stream = TokenStream::new(tokens);
    let expr = parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after expression",
            stream.current_span(),
        ));
    }
    Ok(expr)
}

/// `fn name(p, q) { expr }`
fn parse_fn_decl(stream: &mut TokenStream) -> Result<FnDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Fn)?;
    let name = expect_ident(stream, "after `fn`")?;

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        params.push(expect_ident(stream, "in parameter list")?);
        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RParen)?;

    stream.expect(Token::LBrace)?;
    let body = parse_expr(stream)?;
    stream.expect(Token::RBrace)?;

    Ok(FnDecl {
        name,
        params,
        body,
        span: stream.span_from(start),
    })
}

fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    match stream.peek() {
        Some(Token::If) => parse_if(stream),
        Some(Token::Ident(_)) if matches!(stream.peek_nth(1), Some(Token::Eq)) => {
            parse_assign(stream)
        }
        _ => {
            let start = stream.current_pos();
            let expr = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            Ok(Stmt::new(StmtKind::Expr(expr), stream.span_from(start)))
        }
    }
}

fn parse_assign(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    let name = expect_ident(stream, "in assignment")?;
    stream.expect(Token::Eq)?;
    let value = parse_expr(stream)?;
    stream.expect(Token::Semicolon)?;
    Ok(Stmt::new(
        StmtKind::Assign { name, value },
        stream.span_from(start),
    ))
}

fn parse_if(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;
    let cond = parse_expr(stream)?;
    let then_body = parse_block(stream)?;

    let else_body = if matches!(stream.peek(), Some(Token::Else)) {
        stream.advance();
        if matches!(stream.peek(), Some(Token::If)) {
            // `else if` chains nest as a single-statement else body
            vec![parse_if(stream)?]
        } else {
            parse_block(stream)?
        }
    } else {
        Vec::new()
    };

    Ok(Stmt::new(
        StmtKind::If {
            cond,
            then_body,
            else_body,
        },
        stream.span_from(start),
    ))
}

fn parse_block(stream: &mut TokenStream) -> Result<Vec<Stmt>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut stmts = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "while parsing block, missing `}`",
                stream.current_span(),
            ));
        }
        stmts.push(parse_stmt(stream)?);
    }
    stream.expect(Token::RBrace)?;
    Ok(stmts)
}

/// Parse an expression (entry point for the Pratt core).
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_pratt(stream, 0)
}

/// Pratt parser - handles binary operators with precedence climbing.
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        if let Some((prec, assoc, op)) = binary_op_info(token) {
            if prec < min_prec {
                break;
            }

            stream.advance();

            let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
            let right = parse_pratt(stream, next_prec)?;

            let span = left.span.merge(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        } else {
            break;
        }
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, atoms).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus) | Some(Token::Not) => parse_unary(stream),
        _ => parse_atom(stream),
    }
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Not) => UnaryOp::Not,
        other => {
            return Err(ParseError::unexpected_token(other, "unary operator", span));
        }
    };

    let operand = parse_prefix(stream)?;
    let span = span.merge(&operand.span);

    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

/// Atoms: literals, identifiers, calls, parenthesized expressions.
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    match stream.advance().cloned() {
        Some(Token::Number(value)) => Ok(Expr::new(ExprKind::Number(value), span)),
        Some(Token::Ident(name)) => {
            if matches!(stream.peek(), Some(Token::LParen)) {
                let args = parse_call_args(stream)?;
                let end = stream.span_from(stream.current_pos().saturating_sub(1));
                Ok(Expr::new(
                    ExprKind::Call { name, args },
                    span.merge(&end),
                ))
            } else {
                Ok(Expr::new(ExprKind::Var(name), span))
            }
        }
        Some(Token::LParen) => {
            let expr = parse_expr(stream)?;
            let close = stream.expect(Token::RParen)?;
            Ok(Expr::new(expr.kind, span.merge(&close)))
        }
        other => Err(ParseError::unexpected_token(
            other.as_ref(),
            "while parsing expression",
            span,
        )),
    }
}

/// Parse function call arguments.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        args.push(parse_expr(stream)?);

        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}

fn expect_ident(stream: &mut TokenStream, context: &str) -> Result<String, ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(name)) => Ok(name.clone()),
        other => Err(ParseError::unexpected_token(
            other,
            &format!("expected identifier {}", context),
            span,
        )),
    }
}
