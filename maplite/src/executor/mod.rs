// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Statement execution strategies and session state
//!
//! One executor exists per unit of work and is externally serialized. The
//! shared session machinery (local result cache, deferred loads,
//! reentrancy tracking) lives in `BaseExecutor`; the strategies decide
//! only how statement handles are obtained, reused, or batched. The
//! shared-cache decorator wraps any executor and aligns second-level
//! cache visibility with transaction boundaries.

pub mod batch;
pub mod caching;
pub mod reuse;
pub mod simple;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

pub use batch::BatchExecutor;
pub use caching::CachingExecutor;
pub use reuse::ReuseExecutor;
pub use simple::SimpleExecutor;

use crate::cache::{Cache, CacheEntry, CacheKey, PerpetualCache};
use crate::compile::BoundStatement;
use crate::error::{DriverError, ExecutorError};
use crate::statement::{
    Configuration, Driver, ExecutorKind, KeyGenerator, LocalCacheScope, MappedStatement, RowBounds,
};
use crate::types::Value;

/// Affected-row count of an update. Batched updates cannot know their
/// count until the batch flushes, so they report `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCount {
    Known(u64),
    Pending,
}

impl UpdateCount {
    pub fn known(self) -> Option<u64> {
        match self {
            UpdateCount::Known(n) => Some(n),
            UpdateCount::Pending => None,
        }
    }
}

/// Outcome of one flushed batch unit: the statement it ran, the affected
/// counts per queued row, and the queued argument objects with generated
/// keys written onto them.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub statement_id: String,
    pub sql: String,
    pub update_counts: Vec<u64>,
    pub parameter_objects: Vec<Value>,
}

/// A nested result waiting for its sub-query's value to land in the
/// session cache. Targets are shared handles because the owning row is
/// still being assembled when the load is scheduled.
pub struct DeferredLoad {
    key: CacheKey,
    target: Arc<Mutex<Value>>,
    property: String,
}

impl DeferredLoad {
    fn can_load(&self, local: &PerpetualCache) -> bool {
        matches!(
            local.get(&self.key),
            Ok(Some(CacheEntry::Ready(_)))
        )
    }

    fn load(&self, local: &PerpetualCache) -> Result<(), ExecutorError> {
        if let Some(CacheEntry::Ready(value)) = local.get(&self.key)? {
            let value = unwrap_rows(value);
            self.target.lock().set_property(&self.property, value);
        }
        Ok(())
    }
}

/// A query result is cached as a row list; a property load takes the
/// single row when exactly one came back, the whole list otherwise.
fn unwrap_rows(value: Value) -> Value {
    match value {
        Value::List(mut rows) if rows.len() == 1 => rows.remove(0),
        other => other,
    }
}

/// The session-facing execution contract. One executor per unit of
/// work; moving it across threads is allowed, sharing it is not.
pub trait Executor: Send {
    fn update(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
    ) -> Result<UpdateCount, ExecutorError>;

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutorError>;

    fn query_with_key(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
        key: CacheKey,
        bound: BoundStatement,
    ) -> Result<Vec<Value>, ExecutorError>;

    fn flush_statements(&mut self) -> Result<Vec<BatchResult>, ExecutorError>;

    fn create_cache_key(
        &mut self,
        statement: &MappedStatement,
        bounds: RowBounds,
        bound: &BoundStatement,
    ) -> Result<CacheKey, ExecutorError>;

    fn is_cached(&self, key: &CacheKey) -> bool;

    fn defer_load(
        &mut self,
        key: CacheKey,
        target: Arc<Mutex<Value>>,
        property: String,
    ) -> Result<(), ExecutorError>;

    fn clear_local_cache(&mut self);

    fn commit(&mut self, force_rollback: bool) -> Result<(), ExecutorError>;

    fn rollback(&mut self, required: bool) -> Result<(), ExecutorError>;

    /// After close every operation fails fast with `ExecutorError::Closed`.
    fn close(&mut self, force_rollback: bool) -> Result<(), ExecutorError>;

    fn is_closed(&self) -> bool;
}

/// What a strategy returns for one query execution.
pub struct QueryOutcome {
    pub rows: Vec<Value>,
    pub output_parameters: BTreeMap<String, Value>,
}

/// What a strategy returns for one update execution.
pub struct UpdateOutcome {
    pub count: UpdateCount,
    pub generated_keys: Vec<Value>,
}

/// How statement handles are obtained and released. Strategies own the
/// driver; all session semantics stay in `BaseExecutor`.
pub trait ExecutorStrategy: Send {
    fn do_update(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<UpdateOutcome, ExecutorError>;

    fn do_query(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<QueryOutcome, ExecutorError>;

    /// Executes or discards accumulated work and releases retained
    /// handles.
    fn do_flush(&mut self, rollback: bool) -> Result<Vec<BatchResult>, ExecutorError>;
}

pub(crate) fn execution_error(statement_id: &str, err: DriverError) -> ExecutorError {
    ExecutorError::ExecutionFailed {
        statement_id: statement_id.to_string(),
        detail: err.to_string(),
    }
}

const LOCAL_CACHE_ID: &str = "__local__";

/// Session executor: strategy plus the per-unit-of-work state every
/// strategy shares.
pub struct BaseExecutor {
    config: Arc<Configuration>,
    strategy: Box<dyn ExecutorStrategy>,
    local_cache: PerpetualCache,
    /// Stored-procedure output parameters by query key, so a local cache
    /// hit can restore them onto the argument object.
    local_output_cache: HashMap<CacheKey, BTreeMap<String, Value>>,
    deferred_loads: Vec<DeferredLoad>,
    query_stack: u32,
    closed: bool,
}

impl BaseExecutor {
    pub fn new(config: Arc<Configuration>, strategy: Box<dyn ExecutorStrategy>) -> Self {
        BaseExecutor {
            config,
            strategy,
            local_cache: PerpetualCache::new(LOCAL_CACHE_ID),
            local_output_cache: HashMap::new(),
            deferred_loads: Vec::new(),
            query_stack: 0,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), ExecutorError> {
        if self.closed {
            Err(ExecutorError::Closed)
        } else {
            Ok(())
        }
    }

    fn apply_generated_keys(
        statement: &MappedStatement,
        argument: &mut Value,
        keys: &[Value],
    ) {
        if let KeyGenerator::GeneratedKeys { key_property } = statement.key_generator() {
            if let Some(first) = keys.first() {
                argument.set_property(key_property, first.clone());
            }
        }
    }

    fn restore_output_parameters(&self, key: &CacheKey, argument: &mut Value) {
        if let Some(outputs) = self.local_output_cache.get(key) {
            for (property, value) in outputs {
                argument.set_property(property, value.clone());
            }
        }
    }

    /// The miss path: mark the key in flight, run the strategy, replace
    /// the marker with the real rows. The marker always comes out again,
    /// even when execution fails.
    fn query_from_database(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
        key: &CacheKey,
        bound: &BoundStatement,
    ) -> Result<Vec<Value>, ExecutorError> {
        self.local_cache.put(key.clone(), CacheEntry::Pending)?;
        let outcome = self.strategy.do_query(statement, bound, &self.config);
        self.local_cache.remove(key)?;
        let outcome = outcome?;

        let rows: Vec<Value> = outcome
            .rows
            .into_iter()
            .skip(bounds.offset)
            .take(bounds.limit)
            .collect();
        self.local_cache
            .put(key.clone(), CacheEntry::Ready(Value::List(rows.clone())))?;
        if !outcome.output_parameters.is_empty() {
            for (property, value) in &outcome.output_parameters {
                argument.set_property(property, value.clone());
            }
            self.local_output_cache
                .insert(key.clone(), outcome.output_parameters);
        }
        Ok(rows)
    }
}

impl Executor for BaseExecutor {
    fn update(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
    ) -> Result<UpdateCount, ExecutorError> {
        self.ensure_open()?;
        debug!("update {}", statement.id());
        self.clear_local_cache();
        let bound = statement
            .source()
            .bound_statement(self.config.converters(), argument)?;
        let outcome = self.strategy.do_update(statement, &bound, &self.config)?;
        Self::apply_generated_keys(statement, argument, &outcome.generated_keys);
        Ok(outcome.count)
    }

    fn query(
        &mut self,
        statement: &Arc<MappedStatement>,
        argument: &mut Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutorError> {
        self.ensure_open()?;
        let bound = statement
            .source()
            .bound_statement(self.config.converters(), argument)?;
        let key = self.create_cache_key(statement, bounds, &bound)?;
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
        self.ensure_open()?;
        if self.query_stack == 0 && statement.flush_cache_required() {
            self.clear_local_cache();
        }

        self.query_stack += 1;
        let result = match self.local_cache.get(&key)? {
            Some(CacheEntry::Ready(value)) => {
                trace!("local cache hit for {}", statement.id());
                self.restore_output_parameters(&key, argument);
                match value {
                    Value::List(rows) => Ok(rows),
                    other => Ok(vec![other]),
                }
            }
            _ => {
                trace!("local cache miss for {}", statement.id());
                self.query_from_database(statement, argument, bounds, &key, &bound)
            }
        };
        self.query_stack -= 1;

        if result.is_ok() && self.query_stack == 0 {
            let pending = std::mem::take(&mut self.deferred_loads);
            for load in pending {
                load.load(&self.local_cache)?;
            }
            if self.config.local_cache_scope() == LocalCacheScope::Statement {
                self.clear_local_cache();
            }
        }
        result
    }

    fn flush_statements(&mut self) -> Result<Vec<BatchResult>, ExecutorError> {
        self.ensure_open()?;
        self.strategy.do_flush(false)
    }

    /// Key = statement id, bounds, final SQL, each inbound parameter
    /// value in descriptor order, then the environment id when set.
    fn create_cache_key(
        &mut self,
        statement: &MappedStatement,
        bounds: RowBounds,
        bound: &BoundStatement,
    ) -> Result<CacheKey, ExecutorError> {
        self.ensure_open()?;
        let mut key = CacheKey::new();
        key.update(Value::from(statement.id()));
        key.update(Value::Integer(bounds.offset as i64));
        key.update(Value::Integer(bounds.limit as i64));
        key.update(Value::from(bound.sql()));
        for param in bound.wire_parameters(self.config.converters()) {
            key.update(param.value);
        }
        if let Some(environment) = self.config.environment_id() {
            key.update(Value::from(environment));
        }
        Ok(key)
    }

    fn is_cached(&self, key: &CacheKey) -> bool {
        matches!(self.local_cache.get(key), Ok(Some(_)))
    }

    fn defer_load(
        &mut self,
        key: CacheKey,
        target: Arc<Mutex<Value>>,
        property: String,
    ) -> Result<(), ExecutorError> {
        self.ensure_open()?;
        let load = DeferredLoad {
            key,
            target,
            property,
        };
        if load.can_load(&self.local_cache) {
            load.load(&self.local_cache)
        } else {
            self.deferred_loads.push(load);
            Ok(())
        }
    }

    fn clear_local_cache(&mut self) {
        if !self.closed {
            self.local_cache.clear();
            self.local_output_cache.clear();
        }
    }

    fn commit(&mut self, force_rollback: bool) -> Result<(), ExecutorError> {
        self.ensure_open()?;
        self.clear_local_cache();
        self.strategy.do_flush(force_rollback)?;
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> Result<(), ExecutorError> {
        if self.closed {
            return Ok(());
        }
        self.clear_local_cache();
        if required {
            self.strategy.do_flush(true)?;
        }
        Ok(())
    }

    fn close(&mut self, force_rollback: bool) -> Result<(), ExecutorError> {
        if self.closed {
            return Ok(());
        }
        let result = self.rollback(force_rollback);
        self.deferred_loads.clear();
        self.local_cache.clear();
        self.local_output_cache.clear();
        self.closed = true;
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Builds the executor stack a session uses: the configured strategy
/// under `BaseExecutor`, wrapped with the shared-cache decorator unless
/// caching is disabled globally.
pub fn new_executor(config: Arc<Configuration>, driver: Box<dyn Driver>) -> Box<dyn Executor> {
    let strategy: Box<dyn ExecutorStrategy> = match config.executor_kind() {
        ExecutorKind::Simple => Box::new(SimpleExecutor::new(driver)),
        ExecutorKind::Reuse => Box::new(ReuseExecutor::new(driver)),
        ExecutorKind::Batch => Box::new(BatchExecutor::new(driver)),
    };
    let base = BaseExecutor::new(Arc::clone(&config), strategy);
    if config.cache_enabled() {
        Box::new(CachingExecutor::new(config, Box::new(base)))
    } else {
        Box::new(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopStrategy;

    impl ExecutorStrategy for NoopStrategy {
        fn do_update(
            &mut self,
            _statement: &MappedStatement,
            _bound: &BoundStatement,
            _config: &Configuration,
        ) -> Result<UpdateOutcome, ExecutorError> {
            Ok(UpdateOutcome {
                count: UpdateCount::Known(0),
                generated_keys: Vec::new(),
            })
        }

        fn do_query(
            &mut self,
            _statement: &MappedStatement,
            _bound: &BoundStatement,
            _config: &Configuration,
        ) -> Result<QueryOutcome, ExecutorError> {
            Ok(QueryOutcome {
                rows: Vec::new(),
                output_parameters: BTreeMap::new(),
            })
        }

        fn do_flush(&mut self, _rollback: bool) -> Result<Vec<BatchResult>, ExecutorError> {
            Ok(Vec::new())
        }
    }

    fn key_for(id: i64) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::Integer(id));
        key
    }

    fn map_target() -> Arc<Mutex<Value>> {
        Arc::new(Mutex::new(Value::Map(BTreeMap::new())))
    }

    #[test]
    fn pending_entries_queue_deferred_loads_instead_of_applying() {
        let mut executor =
            BaseExecutor::new(Arc::new(Configuration::new()), Box::new(NoopStrategy));
        let key = key_for(1);
        executor
            .local_cache
            .put(key.clone(), CacheEntry::Pending)
            .unwrap();

        let target = map_target();
        executor
            .defer_load(key, Arc::clone(&target), "owner".to_string())
            .unwrap();

        assert_eq!(executor.deferred_loads.len(), 1);
        assert_eq!(target.lock().get_path("owner"), Value::Null);
    }

    #[test]
    fn ready_entries_satisfy_deferred_loads_immediately() {
        let mut executor =
            BaseExecutor::new(Arc::new(Configuration::new()), Box::new(NoopStrategy));
        let key = key_for(2);
        executor
            .local_cache
            .put(
                key.clone(),
                CacheEntry::Ready(Value::List(vec![Value::Integer(7)])),
            )
            .unwrap();

        let target = map_target();
        executor
            .defer_load(key, Arc::clone(&target), "owner".to_string())
            .unwrap();

        assert!(executor.deferred_loads.is_empty());
        assert_eq!(target.lock().get_path("owner"), Value::Integer(7));
    }

    #[test]
    fn single_row_results_unwrap_for_property_loads() {
        assert_eq!(
            unwrap_rows(Value::List(vec![Value::Integer(1)])),
            Value::Integer(1)
        );
        let two = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(unwrap_rows(two.clone()), two);
        assert_eq!(unwrap_rows(Value::List(Vec::new())), Value::List(Vec::new()));
    }
}
