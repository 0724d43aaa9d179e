//! loghose - fire-and-forget request-logging pipeline
//!
//! The entrypoint crate. A [`Worker`] compiles its log plan once at
//! construction, then accepts requests on two surfaces:
//!
//! - [`Worker::log`] - enqueue a request for logging and return
//!   immediately; assembly, routing, and dispatch run as a background
//!   task the worker tracks until completion.
//! - [`Worker::get_log_data`] - assemble and return the record without
//!   enqueuing (debug affordance).
//!
//! The scheduled surface, [`Worker::run_scheduled`], walks the plan and
//! runs retention checks on dedicated pruner instances.
//!
//! # Example
//!
//! ```ignore
//! let deps = BatcherDeps { /* store, state, diagnostics, dead_letter, metrics */ };
//! let worker = Worker::new(EnvConfig::from_env(), routes, deps)?;
//!
//! worker.log(request, Some(serde_json::json!({"orderId": 42})));
//! // ... at shutdown:
//! worker.shutdown().await;
//! ```

mod worker;

pub use loghose_batcher::BatcherDeps;
pub use loghose_config::{EnvConfig, LogRouteConfig};
pub use loghose_plan::PlanError;
pub use loghose_protocol::{CfProperties, LogRecord, LogRequest};
pub use worker::Worker;
