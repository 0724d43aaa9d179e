//! Filter compilation errors

use thiserror::Error;

/// Errors raised while compiling a filter
///
/// A route whose filter fails to compile is degraded to deny-all by the
/// plan compiler; the error itself never crosses the logging path.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Field key is not in the accessor table and has no dynamic prefix
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    /// Operator name is not recognized
    #[error("unknown operator {operator} on field {field}")]
    UnknownOperator { field: String, operator: String },

    /// Operator is not valid for the field's declared type
    #[error("operator {operator} is not valid for {field_type} field {field}")]
    InvalidOperator {
        field: String,
        operator: &'static str,
        field_type: &'static str,
    },

    /// Literal does not match the field's declared type
    #[error("literal for {operator} on {field} must be a {expected}")]
    LiteralType {
        field: String,
        operator: &'static str,
        expected: &'static str,
    },

    /// Dynamic key prefix with an empty name, e.g. `header:`
    #[error("dynamic filter key has an empty name: {0}")]
    EmptyDynamicName(String),
}

/// Result type for filter compilation
pub type Result<T> = std::result::Result<T, FilterError>;
