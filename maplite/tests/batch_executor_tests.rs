//! Batching strategy behavior, including mid-batch failure

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;

use maplite::{
    build_sql_source, new_executor, Configuration, Executor, ExecutorError, ExecutorKind,
    MappedStatement, StatementKind, UpdateCount, Value,
};
use testutils::{init_logging, RecordingDriver};

fn register_update(config: &mut Configuration, id: &str, template: &str) {
    let source = build_sql_source(template).expect("template compiles");
    config
        .register_statement(
            MappedStatement::builder(id, StatementKind::Update, source)
                .build()
                .expect("statement builds"),
        )
        .expect("statement registers");
}

#[test]
fn consecutive_identical_updates_share_one_batch_unit() {
    init_logging();
    let (driver, state) = RecordingDriver::new();

    let mut config = Configuration::new().with_executor_kind(ExecutorKind::Batch);
    register_update(
        &mut config,
        "users.rename",
        "UPDATE users SET name = #{name} WHERE id = #{id}",
    );
    let config = Arc::new(config);

    let statement = config.statement("users.rename").expect("registered");
    let mut executor = new_executor(Arc::clone(&config), Box::new(driver));

    for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
        let mut argument = Value::from(serde_json::json!({ "id": id, "name": name }));
        let count = executor.update(&statement, &mut argument).expect("queued");
        assert_eq!(count, UpdateCount::Pending);
    }
    assert_eq!(state.update_count(), 0);

    let results = executor.flush_statements().expect("flush succeeds");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].statement_id, "users.rename");
    assert_eq!(results[0].update_counts, vec![1, 1, 1]);
    assert_eq!(state.update_count(), 3);
    assert_eq!(state.prepared_sql().len(), 1);
}

#[test]
fn mid_batch_failure_keeps_earlier_results_and_skips_later_units() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.fail_on("UPDATE b SET x = ?");

    let mut config = Configuration::new().with_executor_kind(ExecutorKind::Batch);
    register_update(&mut config, "a.update", "UPDATE a SET x = #{x}");
    register_update(&mut config, "b.update", "UPDATE b SET x = #{x}");
    register_update(&mut config, "c.update", "UPDATE c SET x = #{x}");
    let config = Arc::new(config);

    let mut executor = new_executor(Arc::clone(&config), Box::new(driver));
    for id in ["a.update", "b.update", "c.update"] {
        let statement = config.statement(id).expect("registered");
        let mut argument = Value::from(serde_json::json!({ "x": 1 }));
        executor.update(&statement, &mut argument).expect("queued");
    }

    let err = executor.flush_statements().expect_err("second unit fails");
    match err {
        ExecutorError::BatchFailure {
            statement_id,
            successes,
            ..
        } => {
            assert_eq!(statement_id, "b.update");
            assert_eq!(successes.len(), 1);
            assert_eq!(successes[0].statement_id, "a.update");
            assert_eq!(successes[0].update_counts, vec![1]);
        }
        other => panic!("expected BatchFailure, got {other:?}"),
    }

    // Only the first unit executed.
    assert_eq!(state.update_count(), 1);
}

#[test]
fn query_flushes_pending_batches_first() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond("SELECT * FROM users", Vec::new());

    let mut config = Configuration::new().with_executor_kind(ExecutorKind::Batch);
    register_update(
        &mut config,
        "users.rename",
        "UPDATE users SET name = #{name} WHERE id = #{id}",
    );
    let select = build_sql_source("SELECT * FROM users").expect("template");
    config
        .register_statement(
            MappedStatement::builder("users.all", StatementKind::Select, select)
                .with_use_cache(false)
                .build()
                .expect("builds"),
        )
        .expect("registers");
    let config = Arc::new(config);

    let rename = config.statement("users.rename").expect("registered");
    let all = config.statement("users.all").expect("registered");
    let mut executor = new_executor(Arc::clone(&config), Box::new(driver));

    let mut argument = Value::from(serde_json::json!({ "id": 1, "name": "a" }));
    executor.update(&rename, &mut argument).expect("queued");
    assert_eq!(state.update_count(), 0);

    let mut select_arg = Value::Null;
    executor
        .query(&all, &mut select_arg, maplite::RowBounds::default())
        .expect("query");

    assert_eq!(state.update_count(), 1);
}
