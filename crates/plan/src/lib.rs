//! Log plan compiler
//!
//! Combines the firehose configuration with user-declared routes into an
//! immutable [`LogPlan`]: an ordered list of compiled routes, each with a
//! predicate, a column-projected schema, a schema fingerprint, and
//! retention policy.
//!
//! The plan is compiled once per process start and shared read-only.
//! Route-structure problems (missing table name, unknown column,
//! malformed firehose filter JSON) fail compilation outright; a filter
//! whose *rules* fail to compile degrades that one route to deny-all so
//! the rest of the plan keeps serving.

mod compile;
mod error;

pub use compile::{compile_plan, CompiledLogRoute, LogPlan};
pub use error::{PlanError, Result};
