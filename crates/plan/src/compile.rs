//! Route compilation

use loghose_config::{parse_filter_json, EnvConfig, FilterGroup, LogRouteConfig};
use loghose_filter::CompiledFilter;
use loghose_protocol::{RequestView, Schema, SchemaError};

use crate::error::{PlanError, Result};

#[cfg(test)]
#[path = "compile_test.rs"]
mod tests;

/// One compiled route: where matching records go and what they carry
#[derive(Debug, Clone)]
pub struct CompiledLogRoute {
    /// Destination table
    pub table_name: String,
    /// Compiled predicate over the request
    pub filter: CompiledFilter,
    /// Ordered column schema for the destination table
    pub schema: Schema,
    /// 16-character fingerprint of the schema
    pub schema_hash: String,
    /// Retention horizon in days, if pruning is configured
    pub retention_days: Option<u32>,
    /// Pruning cadence in days, if pruning is configured
    pub pruning_interval_days: Option<u32>,
}

impl CompiledLogRoute {
    /// Whether this route participates in scheduled pruning
    pub fn prunable(&self) -> bool {
        self.retention_days.is_some() && self.pruning_interval_days.is_some()
    }
}

/// The compiled log plan
///
/// Index 0 is always the firehose route; user routes follow in
/// declaration order.
#[derive(Debug, Clone)]
pub struct LogPlan {
    routes: Vec<CompiledLogRoute>,
}

impl LogPlan {
    /// All routes, firehose first
    pub fn routes(&self) -> &[CompiledLogRoute] {
        &self.routes
    }

    /// The firehose route
    pub fn firehose(&self) -> &CompiledLogRoute {
        &self.routes[0]
    }

    /// The firehose destination table name
    pub fn firehose_table(&self) -> &str {
        &self.routes[0].table_name
    }

    /// Find a route by destination table
    pub fn route_for_table(&self, table_name: &str) -> Option<&CompiledLogRoute> {
        self.routes.iter().find(|r| r.table_name == table_name)
    }

    /// Evaluate every route's predicate against a request
    ///
    /// Returns the matched routes in plan order. The URL and cookies are
    /// parsed at most once across all routes via the shared view.
    pub fn matched_routes(&self, view: &RequestView) -> Vec<&CompiledLogRoute> {
        self.routes
            .iter()
            .filter(|route| route.filter.matches(view))
            .collect()
    }
}

/// Compile the full plan from environment config and user routes
///
/// The firehose route is synthesized at index 0 with the full master
/// schema; user routes are appended in declaration order.
pub fn compile_plan(env: &EnvConfig, user_routes: &[LogRouteConfig]) -> Result<LogPlan> {
    let firehose_filter = match &env.firehose_filters {
        Some(raw) => Some(parse_filter_json(raw).map_err(PlanError::Config)?),
        None => None,
    };

    let mut routes = Vec::with_capacity(user_routes.len() + 1);
    routes.push(compile_route(
        env.firehose_table.clone(),
        firehose_filter.as_deref(),
        None,
        env.firehose_retention_days,
        env.firehose_pruning_interval_days,
    )?);

    for (index, config) in user_routes.iter().enumerate() {
        let table_name = config
            .table_name
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(PlanError::MissingTableName { index })?;

        routes.push(compile_route(
            table_name,
            config.filter.as_deref(),
            config.columns.as_deref(),
            config.retention_days,
            config.pruning_interval_days,
        )?);
    }

    tracing::info!(routes = routes.len(), "log plan compiled");
    Ok(LogPlan { routes })
}

/// Compile one route
fn compile_route(
    table_name: String,
    filter: Option<&[FilterGroup]>,
    columns: Option<&[String]>,
    retention_days: Option<u32>,
    pruning_interval_days: Option<u32>,
) -> Result<CompiledLogRoute> {
    let schema = match columns {
        Some(names) => Schema::master().subset(names).map_err(|err| {
            let SchemaError::UnknownColumn(column) = err;
            PlanError::UnknownColumn {
                table: table_name.clone(),
                column,
            }
        })?,
        None => Schema::master().clone(),
    };
    let schema_hash = schema.fingerprint();

    // A broken filter must not take the whole plan down: the route is
    // degraded to deny-all and the failure is loud in the logs.
    let filter = match loghose_filter::compile(filter) {
        Ok(filter) => filter,
        Err(err) => {
            tracing::error!(
                table = %table_name,
                error = %err,
                "FATAL: filter failed to compile, route degraded to deny-all"
            );
            CompiledFilter::deny_all()
        }
    };

    Ok(CompiledLogRoute {
        table_name,
        filter,
        schema,
        schema_hash,
        retention_days,
        pruning_interval_days,
    })
}
