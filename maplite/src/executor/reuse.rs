// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reusing strategy: handles keyed by rendered SQL for the life of the
//! unit of work

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::trace;

use crate::compile::BoundStatement;
use crate::error::ExecutorError;
use crate::statement::{Configuration, Driver, MappedStatement, StatementHandle};

use super::{execution_error, BatchResult, ExecutorStrategy, QueryOutcome, UpdateCount, UpdateOutcome};

pub struct ReuseExecutor {
    driver: Box<dyn Driver>,
    handles: HashMap<String, Box<dyn StatementHandle>>,
}

impl ReuseExecutor {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        ReuseExecutor {
            driver,
            handles: HashMap::new(),
        }
    }

    fn handle_for(
        &mut self,
        statement: &MappedStatement,
        sql: &str,
    ) -> Result<&mut Box<dyn StatementHandle>, ExecutorError> {
        match self.handles.entry(sql.to_string()) {
            Entry::Occupied(existing) => Ok(existing.into_mut()),
            Entry::Vacant(slot) => {
                trace!("preparing new handle for {}", statement.id());
                let handle = self
                    .driver
                    .prepare(sql)
                    .map_err(|e| execution_error(statement.id(), e))?;
                Ok(slot.insert(handle))
            }
        }
    }
}

impl ExecutorStrategy for ReuseExecutor {
    fn do_update(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<UpdateOutcome, ExecutorError> {
        let params = bound.wire_parameters(config.converters());
        let statement_id = statement.id().to_string();
        let handle = self.handle_for(statement, bound.sql())?;
        let count = handle
            .execute_update(&params)
            .map_err(|e| execution_error(&statement_id, e))?;
        let generated_keys = handle
            .generated_keys()
            .map_err(|e| execution_error(&statement_id, e))?;
        Ok(UpdateOutcome {
            count: UpdateCount::Known(count),
            generated_keys,
        })
    }

    fn do_query(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<QueryOutcome, ExecutorError> {
        let params = bound.wire_parameters(config.converters());
        let timeout = statement.timeout();
        let statement_id = statement.id().to_string();
        let handle = self.handle_for(statement, bound.sql())?;
        let rows = handle
            .execute_query(&params, timeout)
            .map_err(|e| execution_error(&statement_id, e))?;
        let output_parameters = handle
            .output_parameters()
            .map_err(|e| execution_error(&statement_id, e))?;
        Ok(QueryOutcome {
            rows,
            output_parameters,
        })
    }

    /// Dropping the retained handles closes them.
    fn do_flush(&mut self, _rollback: bool) -> Result<Vec<BatchResult>, ExecutorError> {
        self.handles.clear();
        Ok(Vec::new())
    }
}
