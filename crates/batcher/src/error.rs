//! Batcher error types

use thiserror::Error;

/// Errors on the flush path
///
/// None of these ever reach the logging caller; they decide between
/// retry, dead-letter, and buffer retention.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The store rejected a batch write
    #[error("batch write failed: {0}")]
    Store(#[from] loghose_store::StoreError),

    /// Schema initialization failed for a table
    #[error("schema initialization failed for {table}: {source}")]
    Schema {
        table: String,
        source: loghose_store::StoreError,
    },
}

/// Result type for batcher operations
pub type Result<T> = std::result::Result<T, BatchError>;
