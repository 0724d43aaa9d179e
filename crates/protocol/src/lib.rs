//! Core data model for the loghose pipeline
//!
//! Everything the other crates agree on lives here: the master column
//! schema, the log record that flows through the batchers, and the
//! request contract the host hands us.
//!
//! # Overview
//!
//! - [`Schema`] / [`ColumnSpec`] - the ordered master schema and its
//!   column-projected subsets, with a deterministic 16-character
//!   fingerprint used to detect schema drift.
//! - [`LogRecord`] / [`LogValue`] - a flat field -> value mapping built
//!   by the assembler and persisted by the batcher.
//! - [`LogRequest`] / [`RequestView`] - the incoming request contract
//!   plus a per-request view that parses the URL and cookies at most
//!   once.

mod record;
mod request;
mod schema;
mod value;

pub use record::LogRecord;
pub use request::{BotManagement, CfProperties, LogRequest, RequestView};
pub use schema::{field, ColumnSpec, ColumnType, Schema, SchemaError};
pub use value::LogValue;
