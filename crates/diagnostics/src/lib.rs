//! Diagnostics and dead-letter sinks
//!
//! Both are string -> JSON key/value namespaces with optional TTL on
//! write. Diagnostics receives fire-and-forget operational snapshots;
//! the dead-letter namespace is a distinct instance of the same trait
//! that receives batches which exhausted their retries.
//!
//! # Well-known keys
//!
//! | Key | Payload |
//! |-----|---------|
//! | `state_<id>` | [`InstanceSnapshot`], written on every alarm |
//! | `active_do_<id>` | [`ActiveInstance`] with a 65 second TTL |
//! | `last_firehose_batch` | most recent successful firehose batch |
//! | `last_firehose_event` | last record of that batch |
//! | `last_failed_batch` | [`FailedBatch`] |
//! | `pruning_summary` | table -> [`PruningSummaryEntry`] |
//! | `deadletter_<table>_<iso>` | quarantined batch (dead-letter namespace) |

mod keys;
mod memory;
mod payload;

pub use keys::{
    active_key, deadletter_key, state_key, ACTIVE_TTL_SECS, LAST_FAILED_BATCH,
    LAST_FIREHOSE_BATCH, LAST_FIREHOSE_EVENT, PRUNING_SUMMARY,
};
pub use memory::MemoryDiagnostics;
pub use payload::{ActiveInstance, FailedBatch, InstanceSnapshot, PruningSummaryEntry};

use async_trait::async_trait;

/// Errors from a diagnostics sink
#[derive(Debug, thiserror::Error)]
#[error("diagnostics write failed: {0}")]
pub struct DiagnosticsError(pub String);

/// Result type for diagnostics operations
pub type Result<T> = std::result::Result<T, DiagnosticsError>;

/// A string -> JSON key/value namespace with optional TTL
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    /// Write a value, optionally expiring after `ttl_secs`
    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl_secs: Option<u64>,
    ) -> Result<()>;

    /// Read a value back
    ///
    /// Used for read-modify-write of aggregate entries such as the
    /// pruning summary.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
}
