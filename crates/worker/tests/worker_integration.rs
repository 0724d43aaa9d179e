//! End-to-end tests: worker -> batcher -> turso store

use std::sync::Arc;

use http::Method;
use loghose::{BatcherDeps, EnvConfig, LogRequest, LogRouteConfig, Worker};
use loghose_diagnostics::{DiagnosticsSink, MemoryDiagnostics};
use loghose_metrics::{MemoryMetrics, MigrationType, WriteOutcome};
use loghose_store::{LogStore, MemoryStateStore, SqliteStore, Statement};

struct Harness {
    store: Arc<SqliteStore>,
    metrics: Arc<MemoryMetrics>,
    diagnostics: Arc<MemoryDiagnostics>,
    deps: BatcherDeps,
}

async fn harness() -> Harness {
    let store = Arc::new(SqliteStore::memory().await.unwrap());
    let state = Arc::new(MemoryStateStore::new());
    let diagnostics = Arc::new(MemoryDiagnostics::new());
    let dead_letter = Arc::new(MemoryDiagnostics::new());
    let metrics = Arc::new(MemoryMetrics::new());

    let deps = BatcherDeps {
        store: store.clone(),
        state,
        diagnostics: diagnostics.clone(),
        dead_letter,
        metrics: metrics.clone(),
    };
    Harness {
        store,
        metrics,
        diagnostics,
        deps,
    }
}

fn env() -> EnvConfig {
    EnvConfig::default()
}

async fn count(store: &SqliteStore, table: &str) -> i64 {
    store
        .first(&format!("SELECT COUNT(*) FROM {table}"), vec![])
        .await
        .unwrap()
        .unwrap()
        .integer(0)
        .unwrap()
}

#[tokio::test]
async fn test_logged_request_lands_in_firehose() {
    let h = harness().await;
    let worker = Worker::new(env(), vec![], h.deps.clone()).unwrap();

    let request = LogRequest::new(Method::POST, "https://example.com/checkout?step=2")
        .with_header("user-agent", "integration-agent")
        .with_header("cf-ray", "ray-e2e-1")
        .with_body("{\"cart\":1}");
    worker.log(request, Some(serde_json::json!({"orderId": 42})));
    worker.shutdown().await;

    let row = h
        .store
        .first(
            "SELECT method, url, urlPathname, body, data FROM log_firehose",
            vec![],
        )
        .await
        .unwrap()
        .expect("one firehose row");
    assert_eq!(row.text(0), Some("POST"));
    assert_eq!(row.text(1), Some("https://example.com/checkout?step=2"));
    assert_eq!(row.text(2), Some("/checkout"));
    assert_eq!(row.text(3), Some("{\"cart\":1}"));
    assert_eq!(row.text(4), Some("{\"orderId\":42}"));

    // First flush migrated the table
    let migrations = h.metrics.schema_migrations();
    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].migration_type, MigrationType::CreateTable);
    assert_eq!(h.metrics.batch_write_count(WriteOutcome::Success), 1);
}

#[tokio::test]
async fn test_filtered_route_receives_only_matches() {
    let h = harness().await;
    let filter: Vec<loghose_config::FilterGroup> =
        serde_json::from_str(r#"[{"header:x-ab-test-group": {"equals": "B"}}]"#).unwrap();
    let routes = vec![LogRouteConfig::new("experiments")
        .with_filter(filter)
        .with_columns(vec![
            "logId".to_string(),
            "url".to_string(),
            "receivedAt".to_string(),
        ])];
    let worker = Worker::new(env(), routes, h.deps.clone()).unwrap();

    let in_group = LogRequest::new(Method::GET, "https://example.com/a")
        .with_header("X-AB-Test-Group", "B");
    let out_of_group = LogRequest::new(Method::GET, "https://example.com/b");
    worker.log(in_group, None);
    worker.log(out_of_group, None);
    worker.shutdown().await;

    // Both land in the firehose; only the match lands in experiments
    assert_eq!(count(&h.store, "log_firehose").await, 2);
    assert_eq!(count(&h.store, "experiments").await, 1);

    let row = h
        .store
        .first("SELECT url FROM experiments", vec![])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.text(0), Some("https://example.com/a"));
}

#[tokio::test]
async fn test_get_log_data_does_not_enqueue() {
    let h = harness().await;
    let worker = Worker::new(env(), vec![], h.deps.clone()).unwrap();

    let request = LogRequest::new(Method::GET, "https://example.com/debug")
        .with_header("user-agent", "debug-agent");
    let record = worker.get_log_data(&request, None);
    assert_eq!(
        record.get("url").as_text(),
        Some("https://example.com/debug")
    );
    worker.shutdown().await;

    // No table was ever created, let alone written
    let table = h
        .store
        .first(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'log_firehose'",
            vec![],
        )
        .await
        .unwrap();
    assert!(table.is_none());
}

#[tokio::test]
async fn test_unchanged_schema_skips_migration() {
    let h = harness().await;

    // A shared ray id pins both requests to the same instance, whose
    // durable fingerprint survives the worker restart
    let worker = Worker::new(env(), vec![], h.deps.clone()).unwrap();
    worker.log(
        LogRequest::new(Method::GET, "https://example.com/1").with_header("cf-ray", "ray-fixed"),
        None,
    );
    worker.shutdown().await;

    let worker = Worker::new(env(), vec![], h.deps.clone()).unwrap();
    worker.log(
        LogRequest::new(Method::GET, "https://example.com/2").with_header("cf-ray", "ray-fixed"),
        None,
    );
    worker.shutdown().await;

    assert_eq!(count(&h.store, "log_firehose").await, 2);
    assert_eq!(h.metrics.schema_migrations().len(), 1);
    assert_eq!(h.metrics.batch_write_count(WriteOutcome::Success), 2);
}

#[tokio::test]
async fn test_scheduled_pruning_end_to_end() {
    let h = harness().await;
    let routes = vec![LogRouteConfig::new("events").with_retention(30, 1)];

    // Seed the table through the normal logging path
    let worker = Worker::new(env(), routes.clone(), h.deps.clone()).unwrap();
    worker.log(LogRequest::new(Method::GET, "https://example.com/now"), None);
    worker.shutdown().await;
    assert_eq!(count(&h.store, "events").await, 1);

    // Plant a row far past the horizon
    h.store
        .execute(Statement::new(
            "INSERT INTO events (logId, receivedAt) VALUES (?1, ?2)",
            vec!["ancient".into(), "2020-01-01T00:00:00.000Z".into()],
        ))
        .await
        .unwrap();
    assert_eq!(count(&h.store, "events").await, 2);

    // Cron tick: the stale row goes, the fresh one stays
    let worker = Worker::new(env(), routes, h.deps.clone()).unwrap();
    worker.run_scheduled().await;
    worker.shutdown().await;

    assert_eq!(count(&h.store, "events").await, 1);
    let prunes = h.metrics.data_pruning();
    assert_eq!(prunes.len(), 1);
    assert_eq!(prunes[0].outcome, WriteOutcome::Success);
    assert_eq!(prunes[0].rows_deleted, 1);

    // Summary entry is fire-and-forget; give it a beat
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let summary = h
        .diagnostics
        .get("pruning_summary")
        .await
        .unwrap()
        .expect("pruning summary");
    assert_eq!(summary["events"]["lastRowsDeleted"], 1);
}

#[tokio::test]
async fn test_sampling_buckets_are_persisted_in_range() {
    let h = harness().await;
    let worker = Worker::new(env(), vec![], h.deps.clone()).unwrap();

    for i in 0..5 {
        let request = LogRequest::new(Method::GET, "https://example.com/")
            .with_header("user-agent", format!("agent-{i}").as_str())
            .with_header("cf-connecting-ip", format!("203.0.113.{i}").as_str());
        worker.log(request, None);
    }
    worker.shutdown().await;

    let rows = h
        .store
        .all("SELECT sample10, sample100 FROM log_firehose", vec![])
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
    for row in rows {
        let sample10 = row.integer(0).unwrap();
        let sample100 = row.integer(1).unwrap();
        assert!((0..=9).contains(&sample10));
        assert!((0..=99).contains(&sample100));
    }
}
