//! Snapshot payload types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Point-in-time state of a batcher instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Instance id
    pub id: String,
    /// Edge point-of-presence tag
    pub colo: String,
    /// Buffered record count per table
    pub buffer_sizes: HashMap<String, usize>,
    /// Consecutive flush failures per table
    pub failure_counts: HashMap<String, u32>,
    /// Whether a log plan has been delivered
    pub has_plan: bool,
    /// Next alarm deadline, epoch milliseconds
    pub alarm_time: Option<i64>,
}

/// Alive registration, written with a short TTL on every alarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveInstance {
    pub colo: String,
    /// Epoch milliseconds
    pub last_seen: i64,
}

/// A failed batch write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBatch {
    /// ISO-8601 failure time
    pub timestamp: String,
    pub table_name: String,
    pub error: String,
    /// The records that failed to persist
    pub batch: serde_json::Value,
}

/// Per-table pruning summary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruningSummaryEntry {
    /// Epoch milliseconds of the last successful prune
    pub last_pruned_timestamp: i64,
    pub last_rows_deleted: u64,
    pub last_prune_duration_ms: i64,
}
