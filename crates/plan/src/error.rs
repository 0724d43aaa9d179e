//! Plan compilation errors

use thiserror::Error;

/// Errors that fail plan compilation
///
/// Any of these prevents the worker from serving requests.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A route is missing its destination table name
    #[error("route {index} is missing tableName")]
    MissingTableName { index: usize },

    /// A route projects a column that is not in the master schema
    #[error("route {table}: unknown column {column}")]
    UnknownColumn { table: String, column: String },

    /// Firehose filter configuration could not be read
    #[error(transparent)]
    Config(#[from] loghose_config::ConfigError),
}

/// Result type for plan compilation
pub type Result<T> = std::result::Result<T, PlanError>;
