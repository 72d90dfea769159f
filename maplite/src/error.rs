// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the mapping pipeline
//!
//! One enum per subsystem, converted at subsystem boundaries. Compile errors
//! mean the statement never becomes executable; executor errors surface to
//! the caller of the session API.

use thiserror::Error;

/// Expression parsing and evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Malformed expression '{source_text}': {detail}")]
    Parse { source_text: String, detail: String },

    #[error("Expression '{0}' did not evaluate to a boolean")]
    NotBoolean(String),

    #[error("Expression '{0}' did not evaluate to an iterable collection")]
    NotIterable(String),

    #[error("Cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },
}

/// Statement compilation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Malformed parameter marker '#{{{0}}}'")]
    MalformedMarker(String),

    #[error("Unknown parameter attribute '{attribute}' in '#{{{marker}}}'")]
    UnknownAttribute { marker: String, attribute: String },

    #[error("No type converter resolves for parameter '{property}' ({detail})")]
    UnresolvableConverter { property: String, detail: String },

    #[error("Malformed statement template: {0}")]
    MalformedTemplate(String),

    #[error(transparent)]
    Expression(#[from] ExprError),
}

/// Cache layer errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache '{cache_id}' failed to serialize entry: {detail}")]
    Serialization { cache_id: String, detail: String },

    #[error("Cache '{cache_id}' failed to deserialize entry: {detail}")]
    Deserialization { cache_id: String, detail: String },

    #[error("Timed out waiting {waited_ms}ms for lock on key in cache '{cache_id}'")]
    LockTimeout { cache_id: String, waited_ms: u64 },
}

/// Configuration and statement-registry errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Statement '{0}' is not registered")]
    UnknownStatement(String),

    #[error("Statement '{0}' is already registered")]
    DuplicateStatement(String),

    #[error("Statement '{0}' requests caching but no cache is bound to it")]
    CacheNotBound(String),

    #[error("Invalid statement definition '{id}': {detail}")]
    InvalidStatement { id: String, detail: String },
}

/// Failure reported by a data-store driver. The executor rewraps it with
/// the statement id before surfacing it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct DriverError(pub String);

/// Execution errors surfaced by the executor strategies
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Executor was closed")]
    Closed,

    #[error("Statement '{statement_id}' failed: {detail}")]
    ExecutionFailed { statement_id: String, detail: String },

    #[error(
        "Batch failed in statement '{statement_id}' after {} completed batch(es): {detail}",
        successes.len()
    )]
    BatchFailure {
        statement_id: String,
        detail: String,
        /// Results of the batch units that completed before the failure.
        successes: Vec<crate::executor::BatchResult>,
    },

    #[error("Statement '{statement_id}' cannot use the shared cache: {detail}")]
    CacheConsistency { statement_id: String, detail: String },

    #[error("Row bounds are not allowed here: {0}")]
    UnsafeRowBounds(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Expression(#[from] ExprError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
