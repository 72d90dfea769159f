// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Predicate expression language
//!
//! Boolean predicates (`<if test=..>`), iterable extraction (`<foreach
//! collection=..>`) and value expressions (`<bind>`, `${}` substitution)
//! share one small expression language. Parse cost dominates evaluation
//! cost, so parsed ASTs are cached globally keyed by source text; an AST is
//! a pure function of its text and safe to share across threads.

pub mod ast;
pub mod eval;
pub mod parser;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

pub use ast::{CmpOp, Expr};
pub use eval::IterEntry;

use crate::error::ExprError;
use crate::types::Value;

static EXPR_CACHE: Lazy<RwLock<HashMap<String, Arc<Expr>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Parse an expression, consulting the shared AST cache first.
pub fn parse_expression(source: &str) -> Result<Arc<Expr>, ExprError> {
    if let Some(cached) = EXPR_CACHE.read().get(source) {
        return Ok(Arc::clone(cached));
    }
    let parsed = Arc::new(parser::parse(source)?);
    EXPR_CACHE
        .write()
        .insert(source.to_string(), Arc::clone(&parsed));
    Ok(parsed)
}

/// Evaluate a boolean predicate against the binding namespace.
pub fn evaluate_bool(source: &str, bindings: &Value) -> Result<bool, ExprError> {
    let expr = parse_expression(source)?;
    eval::eval_bool(&expr, bindings)
}

/// Evaluate a collection expression into its entries.
pub fn evaluate_iterable(source: &str, bindings: &Value) -> Result<Vec<IterEntry>, ExprError> {
    let expr = parse_expression(source)?;
    eval::eval_iterable(&expr, bindings)
}

/// Evaluate an expression to its value (bind variables, `${}` splices).
pub fn evaluate_value(source: &str, bindings: &Value) -> Result<Value, ExprError> {
    let expr = parse_expression(source)?;
    eval::eval(&expr, bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_shared_ast() {
        let a = parse_expression("cached_probe != null").expect("parse");
        let b = parse_expression("cached_probe != null").expect("parse");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
