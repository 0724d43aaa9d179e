//! Configuration error types

use thiserror::Error;

/// Errors surfaced while reading configuration
///
/// These are fatal: an invalid route table or malformed filter JSON must
/// prevent the worker from serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route is missing its destination table name
    #[error("route {index} is missing tableName")]
    MissingTableName { index: usize },

    /// Filter configuration is not valid JSON
    #[error("malformed filter JSON: {0}")]
    MalformedFilterJson(#[from] serde_json::Error),

    /// Invalid value for a configuration field
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
