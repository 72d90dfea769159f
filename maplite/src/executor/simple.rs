// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plain execution strategy: one fresh handle per statement call

use crate::compile::BoundStatement;
use crate::error::ExecutorError;
use crate::statement::{Configuration, Driver, MappedStatement, StatementHandle};

use super::{execution_error, BatchResult, ExecutorStrategy, QueryOutcome, UpdateCount, UpdateOutcome};

pub struct SimpleExecutor {
    driver: Box<dyn Driver>,
}

impl SimpleExecutor {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        SimpleExecutor { driver }
    }

    fn prepare(
        &self,
        statement: &MappedStatement,
        sql: &str,
    ) -> Result<Box<dyn StatementHandle>, ExecutorError> {
        self.driver
            .prepare(sql)
            .map_err(|e| execution_error(statement.id(), e))
    }
}

impl ExecutorStrategy for SimpleExecutor {
    fn do_update(
        &mut self,
        statement: &MappedStatement,
        bound: &BoundStatement,
        config: &Configuration,
    ) -> Result<UpdateOutcome, ExecutorError> {
        let mut handle = self.prepare(statement, bound.sql())?;
        let params = bound.wire_parameters(config.converters());
        let count = handle
            .execute_update(&params)
            .map_err(|e| execution_error(statement.id(), e))?;
        let generated_keys = handle
            .generated_keys()
            .map_err(|e| execution_error(statement.id(), e))?;
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
        let mut handle = self.prepare(statement, bound.sql())?;
        let params = bound.wire_parameters(config.converters());
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

    fn do_flush(&mut self, _rollback: bool) -> Result<Vec<BatchResult>, ExecutorError> {
        Ok(Vec::new())
    }
}
