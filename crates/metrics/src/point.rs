//! Metric point types

use serde::Serialize;

/// Outcome of a write or prune attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Success,
    Failure,
}

impl WriteOutcome {
    /// Tag value for reporting
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Kind of schema migration performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationType {
    /// No prior fingerprint: the table was created
    CreateTable,
    /// Fingerprint changed: columns were added
    AlterTable,
}

impl MigrationType {
    /// Tag value for reporting
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTable => "create_table",
            Self::AlterTable => "alter_table",
        }
    }
}

/// One point in the `batch_writes` dataset
#[derive(Debug, Clone, Serialize)]
pub struct BatchWrite {
    pub table_name: String,
    pub outcome: WriteOutcome,
    pub colo: String,
    pub batch_size: usize,
    pub duration_ms: i64,
}

/// One point in the `schema_migrations` dataset
#[derive(Debug, Clone, Serialize)]
pub struct SchemaMigration {
    pub table_name: String,
    pub migration_type: MigrationType,
    pub schema_hash: String,
    pub colo: String,
    pub duration_ms: i64,
}

/// One point in the `data_pruning` dataset
#[derive(Debug, Clone, Serialize)]
pub struct DataPruning {
    pub table_name: String,
    pub outcome: WriteOutcome,
    pub colo: String,
    pub rows_deleted: u64,
    pub duration_ms: i64,
}
