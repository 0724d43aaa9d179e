//! Filter engine - decide which routes a request belongs in
//!
//! A filter is compiled once from declarative rule groups into a
//! predicate over the request; the hot path is accessor lookups and
//! comparisons with no allocation beyond the memoized URL/cookie parse.
//!
//! # Rule semantics
//!
//! - Rules inside a group are conjoined (AND).
//! - The group list is disjoined (OR).
//! - An absent or empty group list matches every request.
//! - Type mismatches are rejected at compile time for known fields;
//!   at evaluation time a subject of the wrong shape simply fails the
//!   rule rather than erroring.
//! - A null subject fails every operator except `doesNotExist`.
//!
//! # Field keys
//!
//! Static keys are dotted paths declared in the accessor table
//! (`request.method`, `url.pathname`, `cf.threatScore`, ...). Dynamic
//! keys use a prefix: `header:<name>` and `cookie:<name>`, both
//! string-typed.

mod compile;
mod error;
mod fields;
mod operator;

pub use compile::{compile, CompiledFilter};
pub use error::{FilterError, Result};
pub use fields::{field_spec, FieldType, FilterOperand};
pub use operator::Operator;
