//! Tests for schema initialization and migration

use super::*;
use crate::test_support::{plan_with, TestDeps};
use loghose_config::LogRouteConfig;
use loghose_metrics::MemoryMetrics;
use loghose_store::{MemoryStateStore, SqliteStore};

fn manager(deps: &TestDeps) -> SchemaManager {
    SchemaManager::new(
        "shard_test",
        deps.store.clone(),
        deps.state.clone(),
        deps.metrics.clone(),
    )
}

#[tokio::test]
async fn test_create_table_emits_ddl_and_metric() {
    let deps = TestDeps::new();
    let schema_manager = manager(&deps);
    let plan = plan_with("firehose", vec![]);
    let route = plan.firehose();

    schema_manager.initialize(route, "SJC").await.unwrap();

    let ddl = deps.store.exec_sql.lock().clone();
    assert!(ddl[0].starts_with("CREATE TABLE IF NOT EXISTS firehose"));
    assert!(ddl[0].contains("logId TEXT PRIMARY KEY"));
    // One index per indexed master column
    let indexes: Vec<&String> = ddl.iter().filter(|s| s.starts_with("CREATE INDEX")).collect();
    assert_eq!(indexes.len(), 5);
    assert!(indexes
        .iter()
        .any(|s| s.contains("idx_receivedAt ON firehose (receivedAt)")));

    let migrations = deps.metrics.schema_migrations();
    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].migration_type, MigrationType::CreateTable);
    assert_eq!(migrations[0].schema_hash, route.schema_hash);

    // The fingerprint was persisted
    let stored = deps
        .state
        .get("shard_test", "schema_hash_firehose")
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some(route.schema_hash.as_str()));
}

#[tokio::test]
async fn test_initialize_is_memoized_per_instance() {
    let deps = TestDeps::new();
    let schema_manager = manager(&deps);
    let plan = plan_with("firehose", vec![]);

    schema_manager.initialize(plan.firehose(), "SJC").await.unwrap();
    let ddl_count = deps.store.exec_sql.lock().len();

    schema_manager.initialize(plan.firehose(), "SJC").await.unwrap();
    assert_eq!(deps.store.exec_sql.lock().len(), ddl_count);
    assert_eq!(deps.metrics.schema_migrations().len(), 1);
}

#[tokio::test]
async fn test_matching_fingerprint_performs_no_ddl() {
    let deps = TestDeps::new();
    let plan = plan_with("firehose", vec![]);

    // First manager migrates; a fresh manager (new instance lifetime)
    // sees the stored fingerprint and does nothing
    manager(&deps).initialize(plan.firehose(), "SJC").await.unwrap();
    let ddl_count = deps.store.exec_sql.lock().len();

    manager(&deps).initialize(plan.firehose(), "SJC").await.unwrap();
    assert_eq!(deps.store.exec_sql.lock().len(), ddl_count);
    assert_eq!(deps.metrics.schema_migrations().len(), 1);
}

#[tokio::test]
async fn test_additive_migration_on_real_store() {
    let store = std::sync::Arc::new(SqliteStore::memory().await.unwrap());
    let state = std::sync::Arc::new(MemoryStateStore::new());
    let metrics = std::sync::Arc::new(MemoryMetrics::new());

    // Start with a two-column projection of the table
    let slim_plan = plan_with(
        "firehose",
        vec![LogRouteConfig::new("events").with_columns(vec![
            "logId".to_string(),
            "receivedAt".to_string(),
        ])],
    );
    let slim_route = slim_plan.route_for_table("events").unwrap();
    let slim_manager =
        SchemaManager::new("shard_a", store.clone(), state.clone(), metrics.clone());
    slim_manager.initialize(slim_route, "SJC").await.unwrap();

    let columns = store
        .all("PRAGMA table_info(events)", vec![])
        .await
        .unwrap();
    assert_eq!(columns.len(), 2);

    // Widen to the full master schema: columns are added, none removed
    let full_plan = plan_with("firehose", vec![LogRouteConfig::new("events")]);
    let full_route = full_plan.route_for_table("events").unwrap();
    let full_manager =
        SchemaManager::new("shard_a", store.clone(), state.clone(), metrics.clone());
    full_manager.initialize(full_route, "SJC").await.unwrap();

    let columns = store
        .all("PRAGMA table_info(events)", vec![])
        .await
        .unwrap();
    assert_eq!(columns.len(), 55);
    let names: Vec<String> = columns
        .iter()
        .filter_map(|row| row.text(1).map(str::to_string))
        .collect();
    assert!(names.contains(&"logId".to_string()));
    assert!(names.contains(&"receivedAt".to_string()));

    let migrations = metrics.schema_migrations();
    assert_eq!(migrations.len(), 2);
    assert_eq!(migrations[0].migration_type, MigrationType::CreateTable);
    assert_eq!(migrations[1].migration_type, MigrationType::AlterTable);
}

#[tokio::test]
async fn test_create_on_real_store_then_insert() {
    let store = std::sync::Arc::new(SqliteStore::memory().await.unwrap());
    let state = std::sync::Arc::new(MemoryStateStore::new());
    let metrics = std::sync::Arc::new(MemoryMetrics::new());

    let plan = plan_with("firehose", vec![]);
    let route = plan.firehose();
    let schema_manager =
        SchemaManager::new("shard_a", store.clone(), state.clone(), metrics.clone());
    schema_manager.initialize(route, "SJC").await.unwrap();

    let mut record = loghose_protocol::LogRecord::new();
    record.set(loghose_protocol::field::LOG_ID, "id-1");
    record.set(loghose_protocol::field::URL, "https://example.com/");
    let statements = crate::insert::build_insert_statements(route, &[record]);
    loghose_store::LogStore::execute_batch(store.as_ref(), statements)
        .await
        .unwrap();

    let row = store
        .first(
            "SELECT logId, url FROM firehose",
            vec![],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.text(0), Some("id-1"));
    assert_eq!(row.text(1), Some("https://example.com/"));
}

#[tokio::test]
async fn test_ddl_failure_propagates_and_keeps_fingerprint_unset() {
    let deps = TestDeps::new();
    let schema_manager = manager(&deps);
    let plan = plan_with("firehose", vec![]);

    deps.store.fail_next_ddl(1);
    let err = schema_manager.initialize(plan.firehose(), "SJC").await;
    assert!(err.is_err());

    // No fingerprint persisted, no migration metric, not memoized
    assert!(deps
        .state
        .get("shard_test", "schema_hash_firehose")
        .await
        .unwrap()
        .is_none());
    assert!(deps.metrics.schema_migrations().is_empty());

    // The next attempt retries the migration and succeeds
    schema_manager.initialize(plan.firehose(), "SJC").await.unwrap();
    assert_eq!(deps.metrics.schema_migrations().len(), 1);
}
