// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared-cache decorator
//!
//! Wraps any executor and consults each statement's namespace (L2) cache
//! through a transactional buffer, so results produced inside an open
//! transaction never become visible to other sessions before commit.

use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheKey, TransactionalCacheManager};
use crate::compile::{BoundStatement, ParamMode};
use crate::error::ExecutorError;
use crate::statement::{Configuration, MappedStatement, RowBounds};
use crate::types::Value;

use super::{BatchResult, Executor, UpdateCount};

pub struct CachingExecutor {
    config: Arc<Configuration>,
    delegate: Box<dyn Executor>,
    manager: TransactionalCacheManager,
}

impl CachingExecutor {
    pub fn new(config: Arc<Configuration>, delegate: Box<dyn Executor>) -> Self {
        CachingExecutor {
            config,
            delegate,
            manager: TransactionalCacheManager::new(),
        }
    }

    /// Output parameters mutate the argument after execution; a cache hit
    /// would skip that mutation, so such statements may not share a cache.
    fn ensure_no_out_params(
        statement: &MappedStatement,
        bound: &BoundStatement,
    ) -> Result<(), ExecutorError> {
        for descriptor in bound.descriptors() {
            if descriptor.mode != ParamMode::In {
                return Err(ExecutorError::CacheConsistency {
                    statement_id: statement.id().to_string(),
                    detail: format!(
                        "parameter '{}' has mode {:?}",
                        descriptor.property, descriptor.mode
                    ),
                });
            }
        }
        Ok(())
    }

    fn ensure_safe_bounds(
        &self,
        statement: &MappedStatement,
        bounds: RowBounds,
    ) -> Result<(), ExecutorError> {
        if self.config.safe_row_bounds() && !bounds.is_default() {
            return Err(ExecutorError::UnsafeRowBounds(format!(
                "statement '{}' is cached; bounded pages would poison the shared cache",
                statement.id()
            )));
        }
        Ok(())
    }
}

impl Executor for CachingExecutor {
    fn update(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
    ) -> Result<UpdateCount, ExecutorError> {
        if let Some(cache) = statement.cache() {
            if statement.flush_cache_required() {
                self.manager.clear(cache);
            }
        }
        self.delegate.update(statement, argument)
    }

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutorError> {
        let bound = statement
            .source()
            .bound_statement(self.config.converters(), argument)?;
        let key = self.delegate.create_cache_key(statement, bounds, &bound)?;
        self.query_with_key(statement, argument, bounds, key, bound)
    }

    fn query_with_key(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
        key: CacheKey,
        bound: BoundStatement,
    ) -> Result<Vec<Value>, ExecutorError> {
        let cache = match statement.cache() {
            Some(cache) if statement.use_cache() => Arc::clone(cache),
            _ => {
                if let Some(cache) = statement.cache() {
                    if statement.flush_cache_required() {
                        self.manager.clear(cache);
                    }
                }
                return self
                    .delegate
                    .query_with_key(statement, argument, bounds, key, bound);
            }
        };

        Self::ensure_no_out_params(statement, &bound)?;
        self.ensure_safe_bounds(statement, bounds)?;
        if statement.flush_cache_required() {
            self.manager.clear(&cache);
        }

        if let Some(CacheEntry::Ready(Value::List(rows))) = self.manager.get(&cache, &key)? {
            trace!("shared cache hit for {}", statement.id());
            return Ok(rows);
        }
        let rows = self
            .delegate
            .query_with_key(statement, argument, bounds, key.clone(), bound)?;
        self.manager
            .put(&cache, key, CacheEntry::Ready(Value::List(rows.clone())));
        Ok(rows)
    }

    fn flush_statements(&mut self) -> Result<Vec<BatchResult>, ExecutorError> {
        self.delegate.flush_statements()
    }

    fn create_cache_key(
        &mut self,
        statement: &MappedStatement,
        bounds: RowBounds,
        bound: &BoundStatement,
    ) -> Result<CacheKey, ExecutorError> {
        self.delegate.create_cache_key(statement, bounds, bound)
    }

    fn is_cached(&self, key: &CacheKey) -> bool {
        self.delegate.is_cached(key)
    }

    fn defer_load(
        &mut self,
        key: CacheKey,
        target: Arc<Mutex<Value>>,
        property: String,
    ) -> Result<(), ExecutorError> {
        self.delegate.defer_load(key, target, property)
    }

    fn clear_local_cache(&mut self) {
        self.delegate.clear_local_cache();
    }

    fn commit(&mut self, force_rollback: bool) -> Result<(), ExecutorError> {
        self.delegate.commit(force_rollback)?;
        self.manager.commit()?;
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> Result<(), ExecutorError> {
        let result = self.delegate.rollback(required);
        self.manager.rollback()?;
        result
    }

    fn close(&mut self, force_rollback: bool) -> Result<(), ExecutorError> {
        if force_rollback {
            self.manager.rollback()?;
        } else {
            self.manager.commit()?;
        }
        self.delegate.close(force_rollback)
    }

    fn is_closed(&self) -> bool {
        self.delegate.is_closed()
    }
}
