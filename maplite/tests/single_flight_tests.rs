//! Cache-stampede protection across concurrent sessions
//!
//! A blocking namespace cache must let exactly one session materialize a
//! missing key while its rivals wait for the published value.

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;
use std::time::Duration;

use maplite::{
    build_sql_source, new_executor, CacheBuilder, Configuration, EvictionPolicy, Executor,
    MappedStatement, RowBounds, StatementKind, Value,
};
use testutils::{init_logging, user_row, RecordingDriver};

const FIND_SQL: &str = "SELECT * FROM users WHERE id = ?";

#[test]
fn concurrent_misses_materialize_once() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond(FIND_SQL, vec![user_row(5, "ada")]);
    state.delay_queries(Duration::from_millis(50));
    drop(driver);

    let cache = CacheBuilder::new("users")
        .with_eviction(EvictionPolicy::Lru { capacity: 64 })
        .with_blocking(true)
        .build();
    let source = build_sql_source("SELECT * FROM users WHERE id = #{id}").expect("template");
    let mut config = Configuration::new();
    config
        .register_statement(
            MappedStatement::builder("users.find", StatementKind::Select, source)
                .with_cache(cache)
                .build()
                .expect("builds"),
        )
        .expect("registers");
    let config = Arc::new(config);

    let mut workers = Vec::new();
    for _ in 0..8 {
        let config = Arc::clone(&config);
        let state = Arc::clone(&state);
        workers.push(std::thread::spawn(move || {
            let statement = config.statement("users.find").expect("registered");
            let mut executor = new_executor(
                Arc::clone(&config),
                Box::new(RecordingDriver::with_state(state)),
            );
            let mut argument = Value::from(serde_json::json!({ "id": 5 }));
            let rows = executor
                .query(&statement, &mut argument, RowBounds::default())
                .expect("query");
            executor.commit(false).expect("commit");
            executor.close(false).expect("close");
            rows
        }));
    }

    for worker in workers {
        let rows = worker.join().expect("worker completes");
        assert_eq!(rows, vec![user_row(5, "ada")]);
    }

    assert_eq!(state.query_count(), 1);
}
