//! Recording metrics sink for tests

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{BatchWrite, DataPruning, MetricsSink, SchemaMigration, WriteOutcome};

/// Records every point for later assertions
#[derive(Clone, Default)]
pub struct MemoryMetrics {
    batch_writes: Arc<Mutex<Vec<BatchWrite>>>,
    schema_migrations: Arc<Mutex<Vec<SchemaMigration>>>,
    data_pruning: Arc<Mutex<Vec<DataPruning>>>,
}

impl MemoryMetrics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded batch writes
    pub fn batch_writes(&self) -> Vec<BatchWrite> {
        self.batch_writes.lock().clone()
    }

    /// All recorded schema migrations
    pub fn schema_migrations(&self) -> Vec<SchemaMigration> {
        self.schema_migrations.lock().clone()
    }

    /// All recorded prunes
    pub fn data_pruning(&self) -> Vec<DataPruning> {
        self.data_pruning.lock().clone()
    }

    /// Count of batch writes with the given outcome
    pub fn batch_write_count(&self, outcome: WriteOutcome) -> usize {
        self.batch_writes
            .lock()
            .iter()
            .filter(|p| p.outcome == outcome)
            .count()
    }
}

impl MetricsSink for MemoryMetrics {
    fn record_batch_write(&self, point: BatchWrite) {
        self.batch_writes.lock().push(point);
    }

    fn record_schema_migration(&self, point: SchemaMigration) {
        self.schema_migrations.lock().push(point);
    }

    fn record_data_pruning(&self, point: DataPruning) {
        self.data_pruning.lock().push(point);
    }
}
