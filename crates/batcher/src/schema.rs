//! Schema manager - idempotent table creation and additive migration
//!
//! Each table is initialized at most once per instance lifetime. The
//! durable fingerprint (`schema_hash_<table>`) decides whether any DDL
//! runs at all; when it does, migration is strictly additive: columns
//! are never dropped or renamed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use loghose_metrics::{MetricsSink, MigrationType, SchemaMigration};
use loghose_plan::CompiledLogRoute;
use loghose_protocol::Schema;
use loghose_store::{LogStore, SqlValue, StateStore, Statement, StoreError};
use parking_lot::Mutex;

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;

/// Durable key holding a table's schema fingerprint
fn schema_hash_key(table_name: &str) -> String {
    format!("schema_hash_{table_name}")
}

/// Per-instance schema initialization
pub struct SchemaManager {
    instance_id: String,
    store: Arc<dyn LogStore>,
    state: Arc<dyn StateStore>,
    metrics: Arc<dyn MetricsSink>,
    initialized: Mutex<HashSet<String>>,
}

impl SchemaManager {
    /// Create a manager for one instance
    pub fn new(
        instance_id: impl Into<String>,
        store: Arc<dyn LogStore>,
        state: Arc<dyn StateStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            store,
            state,
            metrics,
            initialized: Mutex::new(HashSet::new()),
        }
    }

    /// Ensure a route's table matches its schema fingerprint
    ///
    /// Memoized per table for the instance lifetime. When the stored
    /// fingerprint differs (or is absent), the schema is applied and the
    /// new fingerprint persisted; a migration metric is emitted with the
    /// kind of DDL performed.
    pub async fn initialize(
        &self,
        route: &CompiledLogRoute,
        colo: &str,
    ) -> Result<(), StoreError> {
        let table = route.table_name.as_str();
        if self.initialized.lock().contains(table) {
            return Ok(());
        }

        let key = schema_hash_key(table);
        let stored = self.state.get(&self.instance_id, &key).await?;

        if stored.as_deref() == Some(route.schema_hash.as_str()) {
            self.initialized.lock().insert(table.to_string());
            return Ok(());
        }

        let started = Instant::now();
        apply_schema(self.store.as_ref(), table, &route.schema).await?;
        self.state
            .put(&self.instance_id, &key, &route.schema_hash)
            .await?;

        let migration_type = if stored.is_none() {
            MigrationType::CreateTable
        } else {
            MigrationType::AlterTable
        };
        tracing::info!(
            table = %table,
            migration = migration_type.as_str(),
            schema_hash = %route.schema_hash,
            "schema migrated"
        );
        self.metrics.record_schema_migration(SchemaMigration {
            table_name: table.to_string(),
            migration_type,
            schema_hash: route.schema_hash.clone(),
            colo: colo.to_string(),
            duration_ms: started.elapsed().as_millis() as i64,
        });

        self.initialized.lock().insert(table.to_string());
        Ok(())
    }
}

/// Create the table or additively migrate it to the schema
pub async fn apply_schema(
    store: &dyn LogStore,
    table_name: &str,
    schema: &Schema,
) -> Result<(), StoreError> {
    let exists = store
        .first(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            vec![SqlValue::Text(table_name.to_string())],
        )
        .await?
        .is_some();

    if !exists {
        create_table(store, table_name, schema).await?;
    } else {
        add_missing_columns(store, table_name, schema).await?;
    }

    create_missing_indexes(store, table_name, schema).await
}

async fn create_table(
    store: &dyn LogStore,
    table_name: &str,
    schema: &Schema,
) -> Result<(), StoreError> {
    let columns: Vec<String> = schema
        .columns()
        .iter()
        .map(|col| column_ddl(col.name, col.column_type.as_sql(), col.constraints))
        .collect();
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table_name,
        columns.join(", ")
    );
    run_ddl(store, &sql).await
}

async fn add_missing_columns(
    store: &dyn LogStore,
    table_name: &str,
    schema: &Schema,
) -> Result<(), StoreError> {
    let rows = store
        .all(&format!("PRAGMA table_info({table_name})"), vec![])
        .await?;
    let existing: HashSet<String> = rows
        .iter()
        .filter_map(|row| row.text(1).map(str::to_string))
        .collect();

    let alters: Vec<Statement> = schema
        .columns()
        .iter()
        .filter(|col| !existing.contains(col.name))
        .map(|col| {
            Statement::plain(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table_name,
                column_ddl(col.name, col.column_type.as_sql(), col.constraints)
            ))
        })
        .collect();

    if alters.is_empty() {
        return Ok(());
    }

    tracing::info!(
        table = %table_name,
        added = alters.len(),
        "adding missing columns"
    );
    if let Err(err) = store.execute_batch(alters.clone()).await {
        for statement in &alters {
            tracing::error!(sql = %statement.sql, error = %err, "DDL failed");
        }
        return Err(err);
    }
    Ok(())
}

async fn create_missing_indexes(
    store: &dyn LogStore,
    table_name: &str,
    schema: &Schema,
) -> Result<(), StoreError> {
    let rows = store
        .all(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1",
            vec![SqlValue::Text(table_name.to_string())],
        )
        .await?;
    let existing: HashSet<String> = rows
        .iter()
        .filter_map(|row| row.text(0).map(str::to_string))
        .collect();

    for col in schema.indexed_columns() {
        let index_name = format!("idx_{}", col.name);
        if existing.contains(&index_name) {
            continue;
        }
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {index_name} ON {table_name} ({})",
            col.name
        );
        run_ddl(store, &sql).await?;
    }

    Ok(())
}

fn column_ddl(name: &str, sql_type: &str, constraints: Option<&str>) -> String {
    match constraints {
        Some(constraints) => format!("{name} {sql_type} {constraints}"),
        None => format!("{name} {sql_type}"),
    }
}

async fn run_ddl(store: &dyn LogStore, sql: &str) -> Result<(), StoreError> {
    if let Err(err) = store.exec(sql).await {
        tracing::error!(sql = %sql, error = %err, "DDL failed");
        return Err(err);
    }
    Ok(())
}
