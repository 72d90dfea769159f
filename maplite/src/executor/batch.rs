// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Batching strategy
//!
//! Consecutive updates sharing both rendered SQL and statement id extend
//! the currently open batch unit; anything else opens a new unit. Units
//! execute in submission order on flush. A mid-batch failure carries the
//! results of every unit that completed before it; later units are not
//! attempted.

use log::debug;

use crate::compile::BoundStatement;
use crate::error::ExecutorError;
use crate::statement::{
    Configuration, Driver, KeyGenerator, MappedStatement, StatementHandle,
};
use crate::types::Value;

use super::{execution_error, BatchResult, ExecutorStrategy, QueryOutcome, UpdateCount, UpdateOutcome};

struct BatchUnit {
    statement_id: String,
    sql: String,
    handle: Box<dyn StatementHandle>,
    /// Copies of the argument objects queued into this unit, in row
    /// order. Generated keys are written onto them at flush time.
    parameter_objects: Vec<Value>,
    key_property: Option<String>,
}

pub struct BatchExecutor {
    driver: Box<dyn Driver>,
    units: Vec<BatchUnit>,
}

impl BatchExecutor {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        BatchExecutor {
            driver,
            units: Vec::new(),
        }
    }

    fn extends_open_unit(&self, statement: &MappedStatement, sql: &str) -> bool {
        self.units
            .last()
            .map(|unit| unit.sql == sql && unit.statement_id == statement.id())
            .unwrap_or(false)
    }

    fn flush_units(&mut self) -> Result<Vec<BatchResult>, ExecutorError> {
        let units = std::mem::take(&mut self.units);
        let mut results = Vec::with_capacity(units.len());
        for mut unit in units {
            let update_counts = match unit.handle.execute_batch() {
                Ok(counts) => counts,
                Err(err) => {
                    return Err(ExecutorError::BatchFailure {
                        statement_id: unit.statement_id,
                        detail: err.to_string(),
                        successes: results,
                    });
                }
            };
            let generated_keys = unit
                .handle
                .generated_keys()
                .map_err(|e| execution_error(&unit.statement_id, e))?;
            if let Some(key_property) = &unit.key_property {
                for (row, key) in unit.parameter_objects.iter_mut().zip(generated_keys) {
                    row.set_property(key_property, key);
                }
            }
            debug!(
                "flushed batch unit {} ({} row(s))",
                unit.statement_id,
                update_counts.len()
            );
            results.push(BatchResult {
                statement_id: unit.statement_id,
                sql: unit.sql,
                update_counts,
                parameter_objects: unit.parameter_objects,
            });
        }
        Ok(results)
    }
}

impl ExecutorStrategy for BatchExecutor {
    fn do_update(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<UpdateOutcome, ExecutorError> {
        let params = bound.wire_parameters(config.converters());
        if !self.extends_open_unit(statement, bound.sql()) {
            let handle = self
                .driver
                .prepare(bound.sql())
                .map_err(|e| execution_error(statement.id(), e))?;
            let key_property = match statement.key_generator() {
                KeyGenerator::GeneratedKeys { key_property } => Some(key_property.clone()),
                KeyGenerator::NoKey => None,
            };
            self.units.push(BatchUnit {
                statement_id: statement.id().to_string(),
                sql: bound.sql().to_string(),
                handle,
                parameter_objects: Vec::new(),
                key_property,
            });
        }
        let unit = match self.units.last_mut() {
            Some(unit) => unit,
            None => {
                return Err(ExecutorError::ExecutionFailed {
                    statement_id: statement.id().to_string(),
                    detail: "no open batch unit".to_string(),
                })
            }
        };
        unit.handle
            .add_batch(&params)
            .map_err(|e| execution_error(statement.id(), e))?;
        unit.parameter_objects.push(bound.argument().clone());
        Ok(UpdateOutcome {
            count: UpdateCount::Pending,
            generated_keys: Vec::new(),
        })
    }

    /// A query sees the store state the queued updates would produce, so
    /// pending batches execute first.
    fn do_query(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<QueryOutcome, ExecutorError> {
        self.flush_units()?;
        let params = bound.wire_parameters(config.converters());
        let mut handle = self
            .driver
            .prepare(bound.sql())
            .map_err(|e| execution_error(statement.id(), e))?;
        let rows = handle
            .execute_query(&params, statement.timeout())
            .map_err(|e| execution_error(statement.id(), e))?;
        let output_parameters = handle
            .output_parameters()
            .map_err(|e| execution_error(statement.id(), e))?;
        Ok(QueryOutcome {
            rows,
            output_parameters,
        })
    }

    fn do_flush(&mut self, rollback: bool) -> Result<Vec<BatchResult>, ExecutorError> {
        if rollback {
            self.units.clear();
            return Ok(Vec::new());
        }
        self.flush_units()
    }
}
