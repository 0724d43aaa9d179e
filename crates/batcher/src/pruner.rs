//! Retention pruner

use chrono::{Duration, SecondsFormat, Utc};
use loghose_store::{LogStore, Statement, StoreError};

#[cfg(test)]
#[path = "pruner_test.rs"]
mod tests;

/// Delete rows older than the retention horizon
///
/// The cutoff binds as an ISO-8601 timestamp so it compares correctly
/// against `receivedAt`. When rows were deleted the table is re-analyzed
/// so the store refreshes its planner statistics; an analysis failure is
/// logged but does not fail the prune. Delete errors propagate so the
/// caller leaves `last_pruned` unchanged and the next cron tick retries.
pub async fn prune_table(
    store: &dyn LogStore,
    table_name: &str,
    retention_days: u32,
) -> Result<u64, StoreError> {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    let cutoff_iso = cutoff.to_rfc3339_opts(SecondsFormat::Millis, true);

    let deleted = store
        .execute(Statement::new(
            format!("DELETE FROM {table_name} WHERE receivedAt < ?1"),
            vec![cutoff_iso.clone().into()],
        ))
        .await?;

    tracing::info!(
        table = %table_name,
        cutoff = %cutoff_iso,
        rows_deleted = deleted,
        "retention prune"
    );

    if deleted > 0 {
        if let Err(err) = store.exec(&format!("ANALYZE {table_name}")).await {
            tracing::warn!(table = %table_name, error = %err, "table analysis failed");
        }
    }

    Ok(deleted)
}
