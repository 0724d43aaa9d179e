//! Environment-backed settings
//!
//! All numeric values parse defensively: non-numeric or non-positive
//! input logs a warning and reverts to the default, so a bad deploy can
//! degrade throughput but never stop the pipeline.

use std::str::FromStr;

#[cfg(test)]
#[path = "env_test.rs"]
mod tests;

const DEFAULT_FIREHOSE_TABLE: &str = "log_firehose";
const DEFAULT_BATCH_INTERVAL_MS: u64 = 10_000;
const DEFAULT_MAX_BATCH_SIZE: usize = 200;
const DEFAULT_MAX_BODY_SIZE: usize = 10_000;

/// Settings read from the process environment
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Firehose destination table name
    pub firehose_table: String,

    /// Raw JSON filter groups for the firehose route, if configured
    pub firehose_filters: Option<String>,

    /// Firehose retention horizon in days
    pub firehose_retention_days: Option<u32>,

    /// Firehose pruning cadence in days
    pub firehose_pruning_interval_days: Option<u32>,

    /// Alarm-driven flush interval in milliseconds
    pub batch_interval_ms: u64,

    /// Size-triggered flush threshold
    pub max_batch_size: usize,

    /// Captured body truncation length in characters
    pub max_body_size: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            firehose_table: DEFAULT_FIREHOSE_TABLE.to_string(),
            firehose_filters: None,
            firehose_retention_days: None,
            firehose_pruning_interval_days: None,
            batch_interval_ms: DEFAULT_BATCH_INTERVAL_MS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl EnvConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup function
    ///
    /// Tests use this to avoid mutating process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            firehose_table: lookup("LOG_HOSE_TABLE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.firehose_table),
            firehose_filters: lookup("LOG_HOSE_FILTERS").filter(|v| !v.trim().is_empty()),
            firehose_retention_days: parse_optional(
                "LOG_HOSE_RETENTION_DAYS",
                lookup("LOG_HOSE_RETENTION_DAYS"),
            ),
            firehose_pruning_interval_days: parse_optional(
                "LOG_HOSE_PRUNING_INTERVAL_DAYS",
                lookup("LOG_HOSE_PRUNING_INTERVAL_DAYS"),
            ),
            batch_interval_ms: parse_positive(
                "BATCH_INTERVAL_MS",
                lookup("BATCH_INTERVAL_MS"),
                defaults.batch_interval_ms,
            ),
            max_batch_size: parse_positive(
                "MAX_BATCH_SIZE",
                lookup("MAX_BATCH_SIZE"),
                defaults.max_batch_size,
            ),
            max_body_size: parse_positive(
                "MAX_BODY_SIZE",
                lookup("MAX_BODY_SIZE"),
                defaults.max_body_size,
            ),
        }
    }
}

/// Parse a positive number, reverting to the default on bad input
fn parse_positive<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = value else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => parsed,
        _ => {
            tracing::warn!(
                var = name,
                value = %raw,
                default = %default,
                "ignoring invalid value, using default"
            );
            default
        }
    }
}

/// Parse an optional positive number, dropping bad input entirely
fn parse_optional(name: &str, value: Option<String>) -> Option<u32> {
    let raw = value?;
    match raw.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => Some(parsed),
        _ => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid value");
            None
        }
    }
}
