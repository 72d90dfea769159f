//! Test utilities for MapLite integration tests
//!
//! Provides a recording in-memory driver plus configuration helpers.
//! Tests go through the public API only: build a `Configuration`,
//! register statements, open an executor with `new_executor`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use maplite::{
    Driver, DriverError, StatementHandle, Value, WireParam,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared observable state behind every handle a `RecordingDriver`
/// prepares.
#[derive(Default)]
pub struct DriverState {
    rows_by_sql: Mutex<HashMap<String, Vec<Value>>>,
    keys_by_sql: Mutex<HashMap<String, Vec<Value>>>,
    outputs_by_sql: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    failing_sql: Mutex<HashSet<String>>,
    prepared: Mutex<Vec<String>>,
    query_delay: Mutex<Option<Duration>>,
    queries: AtomicUsize,
    updates: AtomicUsize,
}

impl DriverState {
    pub fn respond(&self, sql: &str, rows: Vec<Value>) {
        self.rows_by_sql.lock().insert(sql.to_string(), rows);
    }

    pub fn generate_keys(&self, sql: &str, keys: Vec<Value>) {
        self.keys_by_sql.lock().insert(sql.to_string(), keys);
    }

    pub fn emit_outputs(&self, sql: &str, outputs: BTreeMap<String, Value>) {
        self.outputs_by_sql.lock().insert(sql.to_string(), outputs);
    }

    pub fn fail_on(&self, sql: &str) {
        self.failing_sql.lock().insert(sql.to_string());
    }

    pub fn delay_queries(&self, delay: Duration) {
        *self.query_delay.lock() = Some(delay);
    }

    pub fn prepared_sql(&self) -> Vec<String> {
        self.prepared.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

/// Driver whose handles serve canned rows and record every execution.
pub struct RecordingDriver {
    state: Arc<DriverState>,
}

impl RecordingDriver {
    pub fn new() -> (Self, Arc<DriverState>) {
        let state = Arc::new(DriverState::default());
        (
            RecordingDriver {
                state: Arc::clone(&state),
            },
            state,
        )
    }

    pub fn with_state(state: Arc<DriverState>) -> Self {
        RecordingDriver { state }
    }
}

impl Driver for RecordingDriver {
    fn prepare(&self, sql: &str) -> Result<Box<dyn StatementHandle>, DriverError> {
        self.state.prepared.lock().push(sql.to_string());
        Ok(Box::new(RecordingHandle {
            sql: sql.to_string(),
            state: Arc::clone(&self.state),
            batched_rows: 0,
        }))
    }
}

struct RecordingHandle {
    sql: String,
    state: Arc<DriverState>,
    batched_rows: usize,
}

impl StatementHandle for RecordingHandle {
    fn execute_query(
        &mut self,
        _params: &[WireParam],
        _timeout: Option<Duration>,
    ) -> Result<Vec<Value>, DriverError> {
        let delay = *self.state.query_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.state.failing_sql.lock().contains(&self.sql) {
            return Err(DriverError(format!("canned failure for '{}'", self.sql)));
        }
        self.state.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .rows_by_sql
            .lock()
            .get(&self.sql)
            .cloned()
            .unwrap_or_default())
    }

    fn execute_update(&mut self, _params: &[WireParam]) -> Result<u64, DriverError> {
        if self.state.failing_sql.lock().contains(&self.sql) {
            return Err(DriverError(format!("canned failure for '{}'", self.sql)));
        }
        self.state.updates.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }

    fn add_batch(&mut self, _params: &[WireParam]) -> Result<(), DriverError> {
        self.batched_rows += 1;
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>, DriverError> {
        if self.state.failing_sql.lock().contains(&self.sql) {
            return Err(DriverError(format!("canned failure for '{}'", self.sql)));
        }
        self.state
            .updates
            .fetch_add(self.batched_rows, Ordering::SeqCst);
        let counts = vec![1; self.batched_rows];
        self.batched_rows = 0;
        Ok(counts)
    }

    fn generated_keys(&mut self) -> Result<Vec<Value>, DriverError> {
        Ok(self
            .state
            .keys_by_sql
            .lock()
            .get(&self.sql)
            .cloned()
            .unwrap_or_default())
    }

    fn output_parameters(&mut self) -> Result<BTreeMap<String, Value>, DriverError> {
        Ok(self
            .state
            .outputs_by_sql
            .lock()
            .get(&self.sql)
            .cloned()
            .unwrap_or_default())
    }
}

/// A canned user row for fixtures.
pub fn user_row(id: i64, name: &str) -> Value {
    Value::from(serde_json::json!({ "id": id, "name": name }))
}
