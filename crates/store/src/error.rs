//! Store error types

use thiserror::Error;

/// Errors from the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from the underlying engine
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// Store-level failure with a plain message
    ///
    /// Also used by test doubles injecting write failures.
    #[error("store failure: {0}")]
    Failed(String),
}

impl StoreError {
    /// Create a plain-message failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
