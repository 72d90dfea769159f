// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Predicate expression parser using nom parsers
//!
//! Grammar (precedence low to high): `or` < `and` < comparison < `not` <
//! primary. Property paths, literals and the `.size` pseudo-property are
//! primaries. Word operators (`and`, `or`, `not`, `eq`, `lt`, ...) tokenize
//! as whole words so identifiers like `android` never split.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, opt, recognize, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::ast::{CmpOp, Expr};
use crate::error::ExprError;
use crate::types::Value;

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn keyword<'a>(k: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    verify(word, move |w: &str| w.eq_ignore_ascii_case(k))
}

fn path_token(input: &str) -> IResult<&str, &str> {
    verify(
        take_while1(|c: char| {
            c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '\'' | '"')
        }),
        |token: &str| {
            token
                .chars()
                .next()
                .map(|c| c.is_alphabetic() || c == '_')
                .unwrap_or(false)
        },
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| Expr::Literal(Value::String(s.to_string())),
    )(input)
}

fn number_literal(input: &str) -> IResult<&str, Expr> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    let literal = if text.contains('.') {
        match text.parse::<f64>() {
            Ok(d) => Value::Double(d),
            Err(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Float,
                )))
            }
        }
    } else {
        match text.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Digit,
                )))
            }
        }
    };
    Ok((rest, Expr::Literal(literal)))
}

/// Identifiers double as keyword literals; the token decides.
fn path_or_keyword(input: &str) -> IResult<&str, Expr> {
    let (rest, token) = path_token(input)?;
    let expr = match token {
        "null" => Expr::Literal(Value::Null),
        "true" => Expr::Literal(Value::Boolean(true)),
        "false" => Expr::Literal(Value::Boolean(false)),
        _ => {
            if let Some(prefix) = token.strip_suffix(".size") {
                Expr::Size(prefix.to_string())
            } else {
                Expr::Property(token.to_string())
            }
        }
    };
    Ok((rest, expr))
}

/// `ids.size()`: the call form needs the parens consumed too
fn size_call(input: &str) -> IResult<&str, Expr> {
    let (rest, token) = path_token(input)?;
    let prefix = match token.strip_suffix(".size") {
        Some(prefix) => prefix,
        None => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )))
        }
    };
    let (rest, _) = pair(char('('), char(')'))(rest)?;
    Ok((rest, Expr::Size(prefix.to_string())))
}

fn primary(input: &str) -> IResult<&str, Expr> {
    preceded(
        multispace0,
        alt((
            delimited(
                char('('),
                or_expr,
                preceded(multispace0, char(')')),
            ),
            string_literal,
            number_literal,
            size_call,
            path_or_keyword,
        )),
    )(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            preceded(
                preceded(multispace0, alt((tag("!"), keyword("not")))),
                unary,
            ),
            |inner| Expr::Not(Box::new(inner)),
        ),
        primary,
    ))(input)
}

fn cmp_op(input: &str) -> IResult<&str, CmpOp> {
    preceded(
        multispace0,
        alt((
            map(tag("=="), |_| CmpOp::Eq),
            map(tag("!="), |_| CmpOp::Ne),
            map(tag("<>"), |_| CmpOp::Ne),
            map(tag("<="), |_| CmpOp::Le),
            map(tag(">="), |_| CmpOp::Ge),
            map(tag("<"), |_| CmpOp::Lt),
            map(tag(">"), |_| CmpOp::Gt),
            map(keyword("eq"), |_| CmpOp::Eq),
            map(keyword("neq"), |_| CmpOp::Ne),
            map(keyword("lte"), |_| CmpOp::Le),
            map(keyword("gte"), |_| CmpOp::Ge),
            map(keyword("lt"), |_| CmpOp::Lt),
            map(keyword("gt"), |_| CmpOp::Gt),
        )),
    )(input)
}

fn cmp_expr(input: &str) -> IResult<&str, Expr> {
    let (rest, left) = unary(input)?;
    let (rest, tail) = opt(pair(cmp_op, unary))(rest)?;
    Ok(match tail {
        Some((op, right)) => (rest, Expr::Compare(op, Box::new(left), Box::new(right))),
        None => (rest, left),
    })
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = cmp_expr(input)?;
    let (rest, others) = many0(preceded(
        preceded(multispace0, alt((tag("&&"), keyword("and")))),
        cmp_expr,
    ))(rest)?;
    Ok((
        rest,
        others
            .into_iter()
            .fold(first, |acc, e| Expr::And(Box::new(acc), Box::new(e))),
    ))
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (rest, first) = and_expr(input)?;
    let (rest, others) = many0(preceded(
        preceded(multispace0, alt((tag("||"), keyword("or")))),
        and_expr,
    ))(rest)?;
    Ok((
        rest,
        others
            .into_iter()
            .fold(first, |acc, e| Expr::Or(Box::new(acc), Box::new(e))),
    ))
}

/// Parse a predicate expression, requiring the whole input to be consumed.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    match or_expr(source) {
        Ok((rest, expr)) if rest.trim().is_empty() => Ok(expr),
        Ok((rest, _)) => Err(ExprError::Parse {
            source_text: source.to_string(),
            detail: format!("unexpected trailing input '{}'", rest.trim()),
        }),
        Err(e) => Err(ExprError::Parse {
            source_text: source.to_string(),
            detail: e.to_string(),
        }),
    }
}
