// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression AST for statement predicates

use crate::types::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Parsed predicate expression
///
/// Expressions are immutable after parse and shared across threads through
/// the global expression cache, so evaluation never mutates the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (`null`, booleans, numbers, 'strings')
    Literal(Value),
    /// Property path against the binding namespace (`user.address.city`)
    Property(String),
    /// Collection/string size pseudo-property (`ids.size`, `ids.size()`)
    Size(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
}
