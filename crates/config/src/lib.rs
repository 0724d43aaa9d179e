//! loghose configuration
//!
//! Environment-driven settings plus the user-supplied route array.
//! Minimal configuration should just work - every environment variable
//! has a sensible default and malformed numeric input reverts to it.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_HOSE_TABLE` | `log_firehose` | Firehose destination table |
//! | `LOG_HOSE_FILTERS` | none | JSON filter groups for the firehose route |
//! | `LOG_HOSE_RETENTION_DAYS` | none | Firehose retention horizon |
//! | `LOG_HOSE_PRUNING_INTERVAL_DAYS` | none | Firehose pruning cadence |
//! | `BATCH_INTERVAL_MS` | `10000` | Alarm-driven flush interval |
//! | `MAX_BATCH_SIZE` | `200` | Size-triggered flush threshold |
//! | `MAX_BODY_SIZE` | `10000` | Captured body truncation length (chars) |

mod env;
mod error;
mod route;

pub use env::EnvConfig;
pub use error::{ConfigError, Result};
pub use route::{parse_filter_json, FilterGroup, FilterRule, LogRouteConfig};
