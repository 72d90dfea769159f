// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression evaluation against a binding namespace

use std::cmp::Ordering;

use super::ast::{CmpOp, Expr};
use crate::error::ExprError;
use crate::types::Value;

/// One entry produced by iterating a collection expression: lists yield
/// `(index, item)`, maps yield `(key, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IterEntry {
    pub index: Value,
    pub item: Value,
}

/// Evaluate an expression to a value. Property misses resolve to `Null`;
/// the binding namespace itself is a map value.
pub fn eval(expr: &Expr, bindings: &Value) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Property(path) => Ok(bindings.get_path(path)),
        Expr::Size(path) => {
            let target = bindings.get_path(path);
            Ok(match target.size() {
                Some(n) => Value::Integer(n as i64),
                None => Value::Null,
            })
        }
        Expr::Not(inner) => {
            let v = eval(inner, bindings)?;
            Ok(Value::Boolean(!truthy(&v, inner)?))
        }
        Expr::And(left, right) => {
            let lv = eval(left, bindings)?;
            if !truthy(&lv, left)? {
                return Ok(Value::Boolean(false));
            }
            let rv = eval(right, bindings)?;
            Ok(Value::Boolean(truthy(&rv, right)?))
        }
        Expr::Or(left, right) => {
            let lv = eval(left, bindings)?;
            if truthy(&lv, left)? {
                return Ok(Value::Boolean(true));
            }
            let rv = eval(right, bindings)?;
            Ok(Value::Boolean(truthy(&rv, right)?))
        }
        Expr::Compare(op, left, right) => {
            let lv = eval(left, bindings)?;
            let rv = eval(right, bindings)?;
            compare(*op, &lv, &rv).map(Value::Boolean)
        }
    }
}

/// Evaluate an expression as a predicate.
pub fn eval_bool(expr: &Expr, bindings: &Value) -> Result<bool, ExprError> {
    let v = eval(expr, bindings)?;
    truthy(&v, expr)
}

/// Evaluate an expression as an iterable collection. `Null` iterates as
/// empty so an absent collection renders nothing; scalars are an error.
pub fn eval_iterable(expr: &Expr, bindings: &Value) -> Result<Vec<IterEntry>, ExprError> {
    let v = eval(expr, bindings)?;
    match v {
        Value::Null => Ok(Vec::new()),
        Value::List(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| IterEntry {
                index: Value::Integer(i as i64),
                item,
            })
            .collect()),
        Value::Map(entries) => Ok(entries
            .into_iter()
            .map(|(k, item)| IterEntry {
                index: Value::String(k),
                item,
            })
            .collect()),
        other => Err(ExprError::NotIterable(format!("{:?}", other))),
    }
}

fn truthy(value: &Value, expr: &Expr) -> Result<bool, ExprError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::Integer(i) => Ok(*i != 0),
        Value::Double(d) => Ok(*d != 0.0),
        _ => Err(ExprError::NotBoolean(format!("{:?}", expr))),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    // Equality is total: null equals only null, mismatched types are unequal
    // (numeric values compare numerically across Integer/Double).
    match op {
        CmpOp::Eq => return Ok(loose_eq(left, right)),
        CmpOp::Ne => return Ok(!loose_eq(left, right)),
        _ => {}
    }
    let ordering = order(left, right).ok_or_else(|| ExprError::Incomparable {
        left: format!("{:?}", left),
        right: format!("{:?}", right),
    })?;
    Ok(match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Eq | CmpOp::Ne => unreachable!("handled above"),
    })
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Double(b)) | (Value::Double(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => {
            let a = left.as_double()?;
            let b = right.as_double()?;
            a.partial_cmp(&b)
        }
    }
}
