// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data-store boundary traits
//!
//! The engine never touches a database directly. A `Driver` prepares
//! statement handles from final SQL text; the executor feeds them wire
//! parameters and interprets affected-row counts. Row contents pass
//! through opaquely as `Value`s.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::compile::WireParam;
use crate::error::DriverError;
use crate::types::Value;

/// Connection-like factory for statement handles. One driver per unit of
/// work; the executor serializes all access.
pub trait Driver: Send {
    fn prepare(&self, sql: &str) -> Result<Box<dyn StatementHandle>, DriverError>;
}

/// One prepared statement. Handles are single-threaded and owned by the
/// executor; dropping a handle closes it.
pub trait StatementHandle: Send {
    /// Runs the query and returns raw rows. The timeout is per statement
    /// and enforced by the driver, not the engine.
    fn execute_query(
        &mut self,
        params: &[WireParam],
        timeout: Option<Duration>,
    ) -> Result<Vec<Value>, DriverError>;

    fn execute_update(&mut self, params: &[WireParam]) -> Result<u64, DriverError>;

    /// Queues one parameter row for batched execution.
    fn add_batch(&mut self, params: &[WireParam]) -> Result<(), DriverError>;

    /// Executes queued rows, returning one affected count per row in
    /// submission order.
    fn execute_batch(&mut self) -> Result<Vec<u64>, DriverError>;

    /// Keys generated by the store for the rows of the last execution,
    /// in row order. Empty when the store generated none.
    fn generated_keys(&mut self) -> Result<Vec<Value>, DriverError> {
        Ok(Vec::new())
    }

    /// Output parameter values by property name after a stored-procedure
    /// call. Empty for plain statements.
    fn output_parameters(&mut self) -> Result<BTreeMap<String, Value>, DriverError> {
        Ok(BTreeMap::new())
    }
}
