//! Well-known key builders

/// TTL for instance-alive registrations
pub const ACTIVE_TTL_SECS: u64 = 65;

/// Most recent successful firehose batch
pub const LAST_FIREHOSE_BATCH: &str = "last_firehose_batch";

/// Last record of the most recent successful firehose batch
pub const LAST_FIREHOSE_EVENT: &str = "last_firehose_event";

/// Most recent failed batch payload
pub const LAST_FAILED_BATCH: &str = "last_failed_batch";

/// Per-table pruning summary map
pub const PRUNING_SUMMARY: &str = "pruning_summary";

/// State snapshot key for an instance
pub fn state_key(instance_id: &str) -> String {
    format!("state_{instance_id}")
}

/// Alive-registration key for an instance
pub fn active_key(instance_id: &str) -> String {
    format!("active_do_{instance_id}")
}

/// Dead-letter key for a quarantined batch
pub fn deadletter_key(table_name: &str, iso_timestamp: &str) -> String {
    format!("deadletter_{table_name}_{iso_timestamp}")
}
