//! Shared test doubles and fixtures for batcher tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use loghose_config::{EnvConfig, LogRouteConfig};
use loghose_diagnostics::MemoryDiagnostics;
use loghose_metrics::MemoryMetrics;
use loghose_plan::{compile_plan, LogPlan};
use loghose_protocol::{field, LogRecord};
use loghose_store::{
    LogStore, MemoryStateStore, Row, SqlValue, Statement, StoreError,
};
use parking_lot::Mutex;

use crate::config::BatcherDeps;

/// Store double that records batches instead of persisting them
///
/// `fail_next_batches` makes the next N `execute_batch` calls fail, for
/// driving the retry and dead-letter paths.
#[derive(Default)]
pub struct CapturingStore {
    pub batches: Mutex<Vec<Vec<Statement>>>,
    pub exec_sql: Mutex<Vec<String>>,
    pub fail_next_batches: AtomicU32,
    pub fail_next_ddl: AtomicU32,
}

impl CapturingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        self.fail_next_batches.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_ddl(&self, count: u32) {
        self.fail_next_ddl.store(count, Ordering::SeqCst);
    }

    /// Batches that were INSERTs (DDL batches filtered out)
    pub fn insert_batches(&self) -> Vec<Vec<Statement>> {
        self.batches
            .lock()
            .iter()
            .filter(|batch| {
                batch
                    .first()
                    .is_some_and(|s| s.sql.starts_with("INSERT"))
            })
            .cloned()
            .collect()
    }

    /// First bound parameter (the log id) of every statement in every
    /// insert batch, flattened in submission order
    pub fn inserted_log_ids(&self) -> Vec<String> {
        self.insert_batches()
            .iter()
            .flatten()
            .filter_map(|s| match s.params.first() {
                Some(SqlValue::Text(id)) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl LogStore for CapturingStore {
    async fn execute_batch(&self, statements: Vec<Statement>) -> Result<(), StoreError> {
        let pending = self.fail_next_batches.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_batches.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::failed("injected batch failure"));
        }
        self.batches.lock().push(statements);
        Ok(())
    }

    async fn execute(&self, _statement: Statement) -> Result<u64, StoreError> {
        Ok(0)
    }

    async fn exec(&self, sql: &str) -> Result<(), StoreError> {
        let pending = self.fail_next_ddl.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_ddl.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::failed("injected DDL failure"));
        }
        self.exec_sql.lock().push(sql.to_string());
        Ok(())
    }

    async fn first(
        &self,
        _sql: &str,
        _params: Vec<SqlValue>,
    ) -> Result<Option<Row>, StoreError> {
        Ok(None)
    }

    async fn all(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        Ok(Vec::new())
    }
}

/// Deps wired to in-memory doubles, exposing each for assertions
pub struct TestDeps {
    pub store: Arc<CapturingStore>,
    pub state: Arc<MemoryStateStore>,
    pub diagnostics: Arc<MemoryDiagnostics>,
    pub dead_letter: Arc<MemoryDiagnostics>,
    pub metrics: Arc<MemoryMetrics>,
}

impl TestDeps {
    pub fn new() -> Self {
        Self {
            store: Arc::new(CapturingStore::new()),
            state: Arc::new(MemoryStateStore::new()),
            diagnostics: Arc::new(MemoryDiagnostics::new()),
            dead_letter: Arc::new(MemoryDiagnostics::new()),
            metrics: Arc::new(MemoryMetrics::new()),
        }
    }

    pub fn deps(&self) -> BatcherDeps {
        BatcherDeps {
            store: self.store.clone(),
            state: self.state.clone(),
            diagnostics: self.diagnostics.clone(),
            dead_letter: self.dead_letter.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Compile a plan with the given firehose table and user routes
pub fn plan_with(firehose_table: &str, user_routes: Vec<LogRouteConfig>) -> Arc<LogPlan> {
    let env = EnvConfig {
        firehose_table: firehose_table.to_string(),
        ..EnvConfig::default()
    };
    Arc::new(compile_plan(&env, &user_routes).unwrap())
}

/// A minimal record with a log id and optional ray id
pub fn record(log_id: &str, ray_id: Option<&str>) -> LogRecord {
    let mut record = LogRecord::new();
    record.set(field::LOG_ID, log_id);
    record.set(field::RAY_ID, ray_id);
    record.set(field::COLO, "SJC");
    record
}
