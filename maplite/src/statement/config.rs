// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration and the statement registry

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use super::MappedStatement;
use crate::error::ConfigError;
use crate::types::ConverterRegistry;

/// Statement-execution strategy selected for new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Simple,
    Reuse,
    Batch,
}

/// Lifetime of the session-local result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCacheScope {
    /// Results live until the session commits, rolls back, or updates.
    Session,
    /// Results are dropped when the outermost query call returns, so only
    /// nested sub-queries of one call share them.
    Statement,
}

/// Registered statements by id.
#[derive(Default)]
pub struct StatementRegistry {
    statements: HashMap<String, Arc<MappedStatement>>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        StatementRegistry::default()
    }

    /// Rejects duplicate ids and selects that request caching without a
    /// bound cache.
    pub fn register(&mut self, statement: MappedStatement) -> Result<(), ConfigError> {
        if self.statements.contains_key(statement.id()) {
            return Err(ConfigError::DuplicateStatement(statement.id().to_string()));
        }
        if statement.kind().is_select() && statement.use_cache() && statement.cache().is_none() {
            return Err(ConfigError::CacheNotBound(statement.id().to_string()));
        }
        debug!("registered statement {}", statement.id());
        self.statements
            .insert(statement.id().to_string(), Arc::new(statement));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Arc<MappedStatement>, ConfigError> {
        self.statements
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownStatement(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Engine-wide defaults plus the statement registry. Built once, then
/// shared read-only by every session.
pub struct Configuration {
    executor_kind: ExecutorKind,
    cache_enabled: bool,
    local_cache_scope: LocalCacheScope,
    environment_id: Option<String>,
    safe_row_bounds: bool,
    converters: ConverterRegistry,
    registry: StatementRegistry,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            executor_kind: ExecutorKind::Simple,
            cache_enabled: true,
            local_cache_scope: LocalCacheScope::Session,
            environment_id: None,
            safe_row_bounds: false,
            converters: ConverterRegistry::new(),
            registry: StatementRegistry::new(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Configuration::default()
    }

    pub fn with_executor_kind(mut self, kind: ExecutorKind) -> Self {
        self.executor_kind = kind;
        self
    }

    /// Engine-wide switch for the shared (L2) cache layer. Off means no
    /// session gets the caching decorator regardless of statement flags.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_local_cache_scope(mut self, scope: LocalCacheScope) -> Self {
        self.local_cache_scope = scope;
        self
    }

    /// Distinguishes cache keys across deployment environments sharing a
    /// cache store.
    pub fn with_environment_id(mut self, id: impl Into<String>) -> Self {
        self.environment_id = Some(id.into());
        self
    }

    /// When set, non-default row bounds on cached statements are rejected
    /// instead of silently producing page-dependent cache entries.
    pub fn with_safe_row_bounds(mut self, safe: bool) -> Self {
        self.safe_row_bounds = safe;
        self
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        self.executor_kind
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn local_cache_scope(&self) -> LocalCacheScope {
        self.local_cache_scope
    }

    pub fn environment_id(&self) -> Option<&str> {
        self.environment_id.as_deref()
    }

    pub fn safe_row_bounds(&self) -> bool {
        self.safe_row_bounds
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn register_statement(&mut self, statement: MappedStatement) -> Result<(), ConfigError> {
        self.registry.register(statement)
    }

    pub fn statement(&self, id: &str) -> Result<Arc<MappedStatement>, ConfigError> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &StatementRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBuilder;
    use crate::compile::{SqlSource, StaticSqlSource};
    use crate::statement::{MappedStatement, StatementKind};

    fn source() -> Arc<dyn SqlSource> {
        Arc::new(StaticSqlSource::new("SELECT 1").expect("static source"))
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut config = Configuration::new();
        let first = MappedStatement::builder("s", StatementKind::Select, source())
            .with_use_cache(false)
            .build()
            .expect("build");
        let second = MappedStatement::builder("s", StatementKind::Select, source())
            .with_use_cache(false)
            .build()
            .expect("build");
        config.register_statement(first).expect("first");
        let err = config.register_statement(second).expect_err("duplicate");
        assert!(matches!(err, ConfigError::DuplicateStatement(_)));
    }

    #[test]
    fn cached_select_needs_a_bound_cache() {
        let mut config = Configuration::new();
        let unbound = MappedStatement::builder("s", StatementKind::Select, source())
            .build()
            .expect("build");
        let err = config.register_statement(unbound).expect_err("unbound");
        assert!(matches!(err, ConfigError::CacheNotBound(_)));

        let bound = MappedStatement::builder("s", StatementKind::Select, source())
            .with_cache(CacheBuilder::new("ns").build())
            .build()
            .expect("build");
        config.register_statement(bound).expect("bound");
    }

    #[test]
    fn unknown_statement_lookup_fails() {
        let config = Configuration::new();
        assert!(matches!(
            config.statement("missing"),
            Err(ConfigError::UnknownStatement(_))
        ));
    }
}
