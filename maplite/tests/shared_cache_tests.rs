//! Shared (second-level) cache behavior across units of work

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;

use maplite::{
    build_sql_source, new_executor, Cache, CacheBuilder, Configuration, EvictionPolicy, Executor,
    MappedStatement, RowBounds, StatementKind, Value,
};
use testutils::{init_logging, user_row, RecordingDriver};

const FIND_SQL: &str = "SELECT * FROM users WHERE id = ?";

/// Configuration with a cached select and a cache-flushing update, both
/// bound to one shared namespace cache.
fn cached_config(cache: Arc<dyn Cache>) -> Arc<Configuration> {
    let find = build_sql_source("SELECT * FROM users WHERE id = #{id}").expect("template");
    let rename =
        build_sql_source("UPDATE users SET name = #{name} WHERE id = #{id}").expect("template");

    let mut config = Configuration::new();
    config
        .register_statement(
            MappedStatement::builder("users.find", StatementKind::Select, find)
                .with_cache(Arc::clone(&cache))
                .build()
                .expect("builds"),
        )
        .expect("registers");
    config
        .register_statement(
            MappedStatement::builder("users.rename", StatementKind::Update, rename)
                .with_cache(cache)
                .build()
                .expect("builds"),
        )
        .expect("registers");
    Arc::new(config)
}

fn namespace_cache() -> Arc<dyn Cache> {
    CacheBuilder::new("users")
        .with_eviction(EvictionPolicy::Lru { capacity: 64 })
        .build()
}

#[test]
fn committed_result_is_served_to_the_next_session() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond(FIND_SQL, vec![user_row(5, "ada")]);

    let config = cached_config(namespace_cache());
    let statement = config.statement("users.find").expect("registered");

    let mut first = new_executor(Arc::clone(&config), Box::new(driver));
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    let rows = first
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");
    assert_eq!(rows, vec![user_row(5, "ada")]);
    first.commit(false).expect("commit");
    first.close(false).expect("close");

    let mut second = new_executor(
        Arc::clone(&config),
        Box::new(RecordingDriver::with_state(Arc::clone(&state))),
    );
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    let rows = second
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");
    assert_eq!(rows, vec![user_row(5, "ada")]);

    assert_eq!(state.query_count(), 1);
}

#[test]
fn uncommitted_result_stays_invisible_to_other_sessions() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond(FIND_SQL, vec![user_row(5, "ada")]);

    let config = cached_config(namespace_cache());
    let statement = config.statement("users.find").expect("registered");

    let mut first = new_executor(Arc::clone(&config), Box::new(driver));
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    first
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");

    let mut second = new_executor(
        Arc::clone(&config),
        Box::new(RecordingDriver::with_state(Arc::clone(&state))),
    );
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    second
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");

    assert_eq!(state.query_count(), 2);
}

#[test]
fn rollback_leaves_the_shared_cache_unchanged() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond(FIND_SQL, vec![user_row(5, "ada")]);

    let cache = namespace_cache();
    let config = cached_config(Arc::clone(&cache));
    let statement = config.statement("users.find").expect("registered");

    let mut first = new_executor(Arc::clone(&config), Box::new(driver));
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    first
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");
    first.rollback(true).expect("rollback");
    first.close(true).expect("close");

    assert_eq!(cache.size(), 0);

    let mut second = new_executor(
        Arc::clone(&config),
        Box::new(RecordingDriver::with_state(Arc::clone(&state))),
    );
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    second
        .query(&statement, &mut argument, RowBounds::default())
        .expect("query");
    assert_eq!(state.query_count(), 2);
}

#[test]
fn flushing_update_clears_the_namespace_on_commit() {
    init_logging();
    let (driver, state) = RecordingDriver::new();
    state.respond(FIND_SQL, vec![user_row(5, "ada")]);

    let config = cached_config(namespace_cache());
    let find = config.statement("users.find").expect("registered");
    let rename = config.statement("users.rename").expect("registered");

    let mut session = new_executor(Arc::clone(&config), Box::new(driver));
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    session
        .query(&find, &mut argument, RowBounds::default())
        .expect("query");
    session.commit(false).expect("commit");

    let mut update_arg = Value::from(serde_json::json!({ "id": 5, "name": "grace" }));
    session.update(&rename, &mut update_arg).expect("update");
    session.commit(false).expect("commit");
    session.close(false).expect("close");

    let mut next = new_executor(
        Arc::clone(&config),
        Box::new(RecordingDriver::with_state(Arc::clone(&state))),
    );
    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    next.query(&find, &mut argument, RowBounds::default())
        .expect("query");

    assert_eq!(state.query_count(), 2);
}

#[test]
fn safe_row_bounds_reject_pages_on_cached_statements() {
    init_logging();
    let (driver, _state) = RecordingDriver::new();

    let find = build_sql_source("SELECT * FROM users WHERE id = #{id}").expect("template");
    let mut config = Configuration::new().with_safe_row_bounds(true);
    config
        .register_statement(
            MappedStatement::builder("users.find", StatementKind::Select, find)
                .with_cache(namespace_cache())
                .build()
                .expect("builds"),
        )
        .expect("registers");
    let config = Arc::new(config);

    let statement = config.statement("users.find").expect("registered");
    let mut executor = new_executor(Arc::clone(&config), Box::new(driver));

    let mut argument = Value::from(serde_json::json!({ "id": 5 }));
    let err = executor
        .query(&statement, &mut argument, RowBounds::new(0, 10))
        .expect_err("must reject bounded page");
    assert!(matches!(err, maplite::ExecutorError::UnsafeRowBounds(_)));
}
