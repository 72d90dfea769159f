// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! MapLite - A SQL-mapping execution engine
//!
//! MapLite compiles parameterized statement templates against runtime
//! argument objects, decides when a previously computed result may be
//! served from cache, and dispatches execution through pluggable
//! statement strategies.
//!
//! # Features
//!
//! - **Dynamic SQL**: conditional templates (`<if>`, `<choose>`,
//!   `<foreach>`, `<where>`, `<set>`, `<trim>`, `<bind>`) rendered
//!   against an argument object
//! - **Typed parameters**: `#{...}` markers become positional
//!   placeholders with ordered, converter-resolved descriptors
//! - **Two-level caching**: a session-local result cache plus shared
//!   namespace caches assembled from stackable decorators
//! - **Transaction-aligned visibility**: uncommitted results stay in a
//!   per-session buffer until commit
//! - **Execution strategies**: plain, handle-reusing, and batching
//!   executors behind one trait
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use maplite::{build_sql_source, Configuration, MappedStatement, StatementKind};
//!
//! let source = build_sql_source(
//!     "SELECT * FROM users <where><if test=\"id != null\">id = #{id}</if></where>",
//! )?;
//! let mut config = Configuration::new();
//! config.register_statement(
//!     MappedStatement::builder("users.find", StatementKind::Select, source)
//!         .with_use_cache(false)
//!         .build()?,
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod compile;
pub mod error;
pub mod executor;
pub mod expr;
pub mod sqlnode;
pub mod statement;
pub mod types;

// Re-export the session-facing API surface
pub use cache::{Cache, CacheBuilder, CacheEntry, CacheKey, EvictionPolicy};
pub use compile::{build_sql_source, BoundStatement, ParameterDescriptor, SqlSource, WireParam};
pub use error::{CacheError, CompileError, ConfigError, DriverError, ExecutorError, ExprError};
pub use executor::{
    new_executor, BatchResult, Executor, ExecutorStrategy, UpdateCount,
};
pub use statement::{
    Configuration, Driver, ExecutorKind, KeyGenerator, LocalCacheScope, MappedStatement,
    RowBounds, StatementHandle, StatementKind,
};
pub use types::Value;

/// MapLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
