// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Mapped statements and session-facing collaborators
//!
//! A `MappedStatement` binds an id to a compiled SQL source plus the
//! execution hints the executor consults: statement kind, cache binding,
//! flush behavior, generated-key strategy, timeout. `Configuration` holds
//! the registry of statements together with engine-wide defaults.

pub mod config;
pub mod driver;

use std::sync::Arc;
use std::time::Duration;

pub use config::{Configuration, ExecutorKind, LocalCacheScope, StatementRegistry};
pub use driver::{Driver, StatementHandle};

use crate::cache::Cache;
use crate::compile::SqlSource;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn is_select(self) -> bool {
        self == StatementKind::Select
    }
}

/// How generated keys flow back onto the argument object after an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGenerator {
    NoKey,
    /// Store-generated keys are written to this property of each input
    /// row's argument.
    GeneratedKeys { key_property: String },
}

/// Pagination window. The default places no bounds at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub offset: usize,
    pub limit: usize,
}

pub const NO_ROW_LIMIT: usize = usize::MAX;

impl Default for RowBounds {
    fn default() -> Self {
        RowBounds {
            offset: 0,
            limit: NO_ROW_LIMIT,
        }
    }
}

impl RowBounds {
    pub fn new(offset: usize, limit: usize) -> Self {
        RowBounds { offset, limit }
    }

    pub fn is_default(&self) -> bool {
        self.offset == 0 && self.limit == NO_ROW_LIMIT
    }
}

/// One registered statement: identity, compiled source, and execution
/// hints. Immutable after build; shared across calls behind `Arc`.
pub struct MappedStatement {
    id: String,
    kind: StatementKind,
    source: Arc<dyn SqlSource>,
    cache: Option<Arc<dyn Cache>>,
    use_cache: bool,
    flush_cache_required: bool,
    key_generator: KeyGenerator,
    result_shape: Option<String>,
    timeout: Option<Duration>,
}

impl MappedStatement {
    pub fn builder(
        id: impl Into<String>,
        kind: StatementKind,
        source: Arc<dyn SqlSource>,
    ) -> MappedStatementBuilder {
        MappedStatementBuilder::new(id, kind, source)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn source(&self) -> &Arc<dyn SqlSource> {
        &self.source
    }

    pub fn cache(&self) -> Option<&Arc<dyn Cache>> {
        self.cache.as_ref()
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn flush_cache_required(&self) -> bool {
        self.flush_cache_required
    }

    pub fn key_generator(&self) -> &KeyGenerator {
        &self.key_generator
    }

    pub fn result_shape(&self) -> Option<&str> {
        self.result_shape.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder with the defaults the statement kind implies: selects cache
/// and do not flush, writes flush and do not cache.
pub struct MappedStatementBuilder {
    id: String,
    kind: StatementKind,
    source: Arc<dyn SqlSource>,
    cache: Option<Arc<dyn Cache>>,
    use_cache: bool,
    flush_cache_required: bool,
    key_generator: KeyGenerator,
    result_shape: Option<String>,
    timeout: Option<Duration>,
}

impl MappedStatementBuilder {
    pub fn new(id: impl Into<String>, kind: StatementKind, source: Arc<dyn SqlSource>) -> Self {
        MappedStatementBuilder {
            id: id.into(),
            kind,
            source,
            cache: None,
            use_cache: kind.is_select(),
            flush_cache_required: !kind.is_select(),
            key_generator: KeyGenerator::NoKey,
            result_shape: None,
            timeout: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_flush_cache_required(mut self, flush: bool) -> Self {
        self.flush_cache_required = flush;
        self
    }

    pub fn with_key_generator(mut self, key_generator: KeyGenerator) -> Self {
        self.key_generator = key_generator;
        self
    }

    pub fn with_result_shape(mut self, result_shape: impl Into<String>) -> Self {
        self.result_shape = Some(result_shape.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<MappedStatement, ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidStatement {
                id: self.id,
                detail: "statement id must not be empty".to_string(),
            });
        }
        if let KeyGenerator::GeneratedKeys { key_property } = &self.key_generator {
            if key_property.is_empty() {
                return Err(ConfigError::InvalidStatement {
                    id: self.id,
                    detail: "generated-keys strategy needs a key property".to_string(),
                });
            }
            if !matches!(self.kind, StatementKind::Insert) {
                return Err(ConfigError::InvalidStatement {
                    id: self.id,
                    detail: "generated keys apply only to inserts".to_string(),
                });
            }
        }
        Ok(MappedStatement {
            id: self.id,
            kind: self.kind,
            source: self.source,
            cache: self.cache,
            use_cache: self.use_cache,
            flush_cache_required: self.flush_cache_required,
            key_generator: self.key_generator,
            result_shape: self.result_shape,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::StaticSqlSource;

    fn source() -> Arc<dyn SqlSource> {
        Arc::new(StaticSqlSource::new("SELECT 1").expect("static source"))
    }

    #[test]
    fn kind_drives_cache_defaults() {
        let select = MappedStatement::builder("s", StatementKind::Select, source())
            .build()
            .expect("build");
        assert!(select.use_cache());
        assert!(!select.flush_cache_required());

        let update = MappedStatement::builder("u", StatementKind::Update, source())
            .build()
            .expect("build");
        assert!(!update.use_cache());
        assert!(update.flush_cache_required());
    }

    #[test]
    fn empty_id_rejected() {
        let result = MappedStatement::builder("  ", StatementKind::Select, source()).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidStatement { .. })
        ));
    }

    #[test]
    fn generated_keys_require_insert() {
        let result = MappedStatement::builder("q", StatementKind::Select, source())
            .with_key_generator(KeyGenerator::GeneratedKeys {
                key_property: "id".to_string(),
            })
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidStatement { .. })
        ));
    }

    #[test]
    fn default_row_bounds_are_unbounded() {
        let bounds = RowBounds::default();
        assert!(bounds.is_default());
        assert!(!RowBounds::new(0, 10).is_default());
    }
}
