//! Tracing-backed metrics sink

use crate::{BatchWrite, DataPruning, MetricsSink, SchemaMigration};

/// Reports metric points as structured log events
///
/// The default production sink: each point becomes one `info!` event
/// under the `loghose::metrics` target, with the dataset name as a
/// field so downstream log processing can split the streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl TracingMetrics {
    /// Create a tracing-backed sink
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for TracingMetrics {
    fn record_batch_write(&self, point: BatchWrite) {
        tracing::info!(
            target: "loghose::metrics",
            dataset = "batch_writes",
            table = %point.table_name,
            outcome = point.outcome.as_str(),
            colo = %point.colo,
            batch_size = point.batch_size,
            duration_ms = point.duration_ms,
            write_count = 1,
            "batch write"
        );
    }

    fn record_schema_migration(&self, point: SchemaMigration) {
        tracing::info!(
            target: "loghose::metrics",
            dataset = "schema_migrations",
            table = %point.table_name,
            migration_type = point.migration_type.as_str(),
            schema_hash = %point.schema_hash,
            colo = %point.colo,
            duration_ms = point.duration_ms,
            migration_count = 1,
            "schema migration"
        );
    }

    fn record_data_pruning(&self, point: DataPruning) {
        tracing::info!(
            target: "loghose::metrics",
            dataset = "data_pruning",
            table = %point.table_name,
            outcome = point.outcome.as_str(),
            colo = %point.colo,
            rows_deleted = point.rows_deleted,
            duration_ms = point.duration_ms,
            prune_count = 1,
            "data pruning"
        );
    }
}
