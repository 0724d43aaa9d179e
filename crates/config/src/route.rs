//! Route and filter configuration types
//!
//! A route names a destination table, an optional filter, an optional
//! column projection, and retention policy. Routes are supplied as a
//! JSON array at startup; field names are camelCase on the wire.
//!
//! # Filter JSON
//!
//! A filter is a list of rule groups. Rules inside a group are ANDed,
//! groups are ORed:
//!
//! ```json
//! [
//!   {"request.method": {"equals": "POST"}, "cf.threatScore": {"greaterThan": 10}},
//!   {"header:x-ab-test-group": {"equals": "B"}}
//! ]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;

/// Operator name -> literal, for a single field
///
/// A field may carry several operators; all must hold.
pub type FilterRule = BTreeMap<String, serde_json::Value>;

/// One rule group: field key -> rules, conjoined
pub type FilterGroup = BTreeMap<String, FilterRule>;

/// Declarative configuration for one log route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogRouteConfig {
    /// Destination table name (required)
    pub table_name: Option<String>,

    /// Filter groups; absent or empty means match-all
    pub filter: Option<Vec<FilterGroup>>,

    /// Column projection; absent means the full master schema
    pub columns: Option<Vec<String>>,

    /// Retention horizon in days
    pub retention_days: Option<u32>,

    /// Pruning cadence in days
    pub pruning_interval_days: Option<u32>,
}

impl LogRouteConfig {
    /// Create a route for a table with no filter and the full schema
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..Self::default()
        }
    }

    /// Set the filter groups
    pub fn with_filter(mut self, filter: Vec<FilterGroup>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the column projection
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Set the retention policy
    pub fn with_retention(mut self, retention_days: u32, pruning_interval_days: u32) -> Self {
        self.retention_days = Some(retention_days);
        self.pruning_interval_days = Some(pruning_interval_days);
        self
    }
}

/// Parse filter groups from a JSON string
///
/// Used for the `LOG_HOSE_FILTERS` environment value. A parse failure is
/// a [`crate::ConfigError`]: the worker must not start with a filter it
/// cannot read.
pub fn parse_filter_json(raw: &str) -> Result<Vec<FilterGroup>> {
    Ok(serde_json::from_str(raw)?)
}
