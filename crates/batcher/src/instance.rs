//! The batcher instance actor
//!
//! One task owns the buffers. Commands arrive on an mpsc channel and are
//! processed one at a time; the flush alarm is a deadline in the same
//! `select!` loop. Claiming a buffer is therefore always a synchronous
//! step before the first await, so no interleaved `add_log` can observe
//! or mutate a batch mid-flush.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use loghose_diagnostics::{
    active_key, deadletter_key, state_key, ActiveInstance, DiagnosticsSink, FailedBatch,
    InstanceSnapshot, PruningSummaryEntry, ACTIVE_TTL_SECS, LAST_FAILED_BATCH,
    LAST_FIREHOSE_BATCH, LAST_FIREHOSE_EVENT, PRUNING_SUMMARY,
};
use loghose_metrics::{BatchWrite, DataPruning, WriteOutcome};
use loghose_plan::{CompiledLogRoute, LogPlan};
use loghose_protocol::{field, LogRecord};
use tokio::sync::mpsc;

use crate::command::{BatcherHandle, Command};
use crate::config::{BatcherConfig, BatcherDeps};
use crate::error::BatchError;
use crate::insert::build_insert_statements;
use crate::pruner::prune_table;
use crate::schema::SchemaManager;

#[cfg(test)]
#[path = "instance_test.rs"]
mod tests;

const DAY_MS: i64 = 86_400_000;

/// Durable key holding a table's last prune time
fn last_pruned_key(table_name: &str) -> String {
    format!("last_pruned_{table_name}")
}

/// Outcome of flushing one claimed batch
struct FlushReport {
    table: String,
    batch: Vec<LogRecord>,
    duration_ms: i64,
    result: Result<(), BatchError>,
}

/// A durable batching instance
pub struct Batcher {
    id: String,
    config: BatcherConfig,
    deps: BatcherDeps,
    schema: SchemaManager,

    buffers: HashMap<String, Vec<LogRecord>>,
    failure_counts: HashMap<String, u32>,
    plan: Option<Arc<LogPlan>>,
    colo: Option<String>,

    /// Armed alarm: wake-up instant plus its epoch-ms rendering
    alarm: Option<(tokio::time::Instant, i64)>,

    rx: mpsc::Receiver<Command>,
    /// Weak sender back into our own queue, for size-triggered flushes.
    /// Weak so the task still winds down once every handle is dropped.
    self_tx: mpsc::WeakSender<Command>,
}

impl Batcher {
    /// Create an instance and its handle
    ///
    /// The caller spawns [`Batcher::run`]; the handle feeds it.
    pub fn new(
        id: impl Into<String>,
        config: BatcherConfig,
        deps: BatcherDeps,
    ) -> (Self, BatcherHandle) {
        let id = id.into();
        let (tx, rx) = mpsc::channel(config.command_buffer);
        let schema = SchemaManager::new(
            id.clone(),
            Arc::clone(&deps.store),
            Arc::clone(&deps.state),
            Arc::clone(&deps.metrics),
        );

        let handle = BatcherHandle::new(id.clone(), tx.clone());
        let batcher = Self {
            id,
            config,
            deps,
            schema,
            buffers: HashMap::new(),
            failure_counts: HashMap::new(),
            plan: None,
            colo: None,
            alarm: None,
            rx,
            self_tx: tx.downgrade(),
        };
        (batcher, handle)
    }

    /// Run the instance until every handle is dropped
    ///
    /// Channel closure triggers a best-effort drain before the task
    /// exits.
    pub async fn run(mut self) {
        tracing::debug!(instance = %self.id, "batcher started");
        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.drain().await;
                        break;
                    }
                },
                _ = sleep_until_alarm(self.alarm), if self.alarm.is_some() => {
                    self.alarm = None;
                    self.on_alarm().await;
                }
            }
        }
        tracing::debug!(instance = %self.id, "batcher stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddLog { record, tables } => self.handle_add(record, tables),
            Command::SetLogPlan(plan) => {
                self.plan = Some(plan);
            }
            Command::Flush { table } => self.flush_one(&table).await,
            Command::RetentionCheck { table, ack } => {
                self.run_retention_check(&table).await;
                let _ = ack.send(());
            }
            Command::Drain { ack } => {
                self.drain().await;
                let _ = ack.send(());
            }
        }
    }

    /// Append a record to every matched table's buffer
    ///
    /// Entirely synchronous. A buffer reaching the size threshold
    /// schedules an immediate flush through our own queue; the alarm is
    /// re-armed on every add.
    fn handle_add(&mut self, record: LogRecord, tables: Vec<String>) {
        if self.colo.is_none() {
            if let Some(colo) = record.get(field::COLO).as_text() {
                self.colo = Some(colo.to_string());
            }
        }

        for table in tables {
            let buffer = self.buffers.entry(table.clone()).or_default();
            buffer.push(record.clone());

            if buffer.len() >= self.config.max_batch_size {
                // Guarded: a full queue just means the alarm flushes it.
                let scheduled = self.self_tx.upgrade().is_some_and(|tx| {
                    tx.try_send(Command::Flush {
                        table: table.clone(),
                    })
                    .is_ok()
                });
                if !scheduled {
                    tracing::debug!(
                        instance = %self.id,
                        table = %table,
                        "flush queue full, deferring to alarm"
                    );
                }
            }
        }

        self.arm_alarm();
    }

    /// Arm the alarm to `now + batch_interval`; arming while pending
    /// simply re-times it
    fn arm_alarm(&mut self) {
        let interval = Duration::from_millis(self.config.batch_interval_ms);
        let deadline = tokio::time::Instant::now() + interval;
        let epoch_ms = Utc::now().timestamp_millis() + self.config.batch_interval_ms as i64;
        self.alarm = Some((deadline, epoch_ms));
    }

    /// Flush a single table's buffer
    async fn flush_one(&mut self, table: &str) {
        // Claim first, before any await
        let batch = match self.buffers.get_mut(table) {
            Some(buffer) if !buffer.is_empty() => std::mem::take(buffer),
            _ => return,
        };

        let Some(plan) = self.plan.clone() else {
            tracing::error!(
                instance = %self.id,
                table = %table,
                "no log plan set, buffer retained"
            );
            self.restore(table, batch);
            return;
        };
        let Some(route) = plan.route_for_table(table) else {
            tracing::error!(
                instance = %self.id,
                table = %table,
                "table is not in the log plan, buffer retained"
            );
            self.restore(table, batch);
            return;
        };

        let report = self.flush_route(route, batch).await;
        self.apply_report(report).await;
    }

    /// Alarm: snapshot diagnostics, then flush every buffer concurrently
    async fn on_alarm(&mut self) {
        self.snapshot_to_diagnostics();

        let Some(plan) = self.plan.clone() else {
            tracing::error!(
                instance = %self.id,
                "alarm fired with no log plan, buffers retained"
            );
            return;
        };

        self.flush_all(&plan).await;
    }

    /// Claim every non-empty buffer with a resolvable route and flush
    /// them concurrently
    async fn flush_all(&mut self, plan: &Arc<LogPlan>) {
        // Claim phase: synchronous, so no add can interleave
        let mut claimed: Vec<(&CompiledLogRoute, Vec<LogRecord>)> = Vec::new();
        let tables: Vec<String> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| !buffer.is_empty())
            .map(|(table, _)| table.clone())
            .collect();

        for table in tables {
            let Some(route) = plan.route_for_table(&table) else {
                tracing::error!(
                    instance = %self.id,
                    table = %table,
                    "table is not in the log plan, buffer retained"
                );
                continue;
            };
            if let Some(buffer) = self.buffers.get_mut(&table) {
                claimed.push((route, std::mem::take(buffer)));
            }
        }

        if claimed.is_empty() {
            return;
        }

        let reports = futures::future::join_all(
            claimed
                .into_iter()
                .map(|(route, batch)| self.flush_route(route, batch)),
        )
        .await;

        for report in reports {
            self.apply_report(report).await;
        }
    }

    /// Flush one claimed batch: schema init, build, submit
    async fn flush_route(
        &self,
        route: &CompiledLogRoute,
        batch: Vec<LogRecord>,
    ) -> FlushReport {
        let table = route.table_name.clone();
        let started = Instant::now();

        if let Err(source) = self.schema.initialize(route, self.colo()).await {
            return FlushReport {
                duration_ms: started.elapsed().as_millis() as i64,
                result: Err(BatchError::Schema { table: table.clone(), source }),
                table,
                batch,
            };
        }

        let statements = build_insert_statements(route, &batch);
        let result = self
            .deps
            .store
            .execute_batch(statements)
            .await
            .map_err(BatchError::Store);

        FlushReport {
            duration_ms: started.elapsed().as_millis() as i64,
            result,
            table,
            batch,
        }
    }

    /// Apply a flush outcome: metrics, diagnostics, retry or dead-letter
    async fn apply_report(&mut self, report: FlushReport) {
        let FlushReport {
            table,
            batch,
            duration_ms,
            result,
        } = report;
        let size = batch.len();

        match result {
            Ok(()) => {
                self.failure_counts.remove(&table);
                tracing::debug!(
                    instance = %self.id,
                    table = %table,
                    size,
                    duration_ms,
                    "batch flushed"
                );

                let is_firehose = self
                    .plan
                    .as_ref()
                    .is_some_and(|plan| plan.firehose_table() == table);
                if is_firehose {
                    self.push_firehose_snapshot(&batch);
                }

                self.deps.metrics.record_batch_write(BatchWrite {
                    table_name: table,
                    outcome: WriteOutcome::Success,
                    colo: self.colo().to_string(),
                    batch_size: size,
                    duration_ms,
                });
            }
            Err(err) => {
                tracing::error!(
                    instance = %self.id,
                    table = %table,
                    size,
                    error = %err,
                    "batch flush failed"
                );

                self.push_failed_batch(&table, &err, &batch);

                let failures = self.failure_counts.entry(table.clone()).or_insert(0);
                *failures += 1;

                if *failures >= self.config.max_retries {
                    self.failure_counts.insert(table.clone(), 0);
                    self.quarantine(&table, batch).await;
                } else {
                    self.restore(&table, batch);
                }

                self.deps.metrics.record_batch_write(BatchWrite {
                    table_name: table,
                    outcome: WriteOutcome::Failure,
                    colo: self.colo().to_string(),
                    batch_size: size,
                    duration_ms,
                });
            }
        }
    }

    /// Re-prepend a claimed batch so retried records keep FIFO order
    /// ahead of anything added since the claim
    fn restore(&mut self, table: &str, mut batch: Vec<LogRecord>) {
        let buffer = self.buffers.entry(table.to_string()).or_default();
        batch.append(buffer);
        *buffer = batch;
    }

    /// Move an exhausted batch to the dead-letter namespace
    ///
    /// Terminal for the batch: awaited, written once, and not restored.
    async fn quarantine(&mut self, table: &str, batch: Vec<LogRecord>) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let key = deadletter_key(table, &timestamp);
        let size = batch.len();
        let payload = serde_json::json!({
            "tableName": table,
            "timestamp": timestamp,
            "batch": batch,
        });

        match self.deps.dead_letter.put(&key, payload, None).await {
            Ok(()) => {
                tracing::warn!(
                    instance = %self.id,
                    table = %table,
                    size,
                    key = %key,
                    "batch quarantined to dead-letter"
                );
            }
            Err(err) => {
                tracing::error!(
                    instance = %self.id,
                    table = %table,
                    size,
                    error = %err,
                    "dead-letter write failed, batch lost"
                );
            }
        }
    }

    /// Best-effort shutdown drain: flush everything, swallow errors
    async fn drain(&mut self) {
        let Some(plan) = self.plan.clone() else {
            let buffered: usize = self.buffers.values().map(Vec::len).sum();
            if buffered > 0 {
                tracing::error!(
                    instance = %self.id,
                    buffered,
                    "draining with no log plan, records lost"
                );
            }
            return;
        };
        self.flush_all(&plan).await;
    }

    /// Run a retention check for a table in the plan
    async fn run_retention_check(&mut self, table: &str) {
        let Some(plan) = self.plan.clone() else {
            tracing::error!(
                instance = %self.id,
                table = %table,
                "retention check before log plan was set"
            );
            return;
        };
        let Some(route) = plan.route_for_table(table) else {
            tracing::error!(
                instance = %self.id,
                table = %table,
                "retention check for a table not in the plan"
            );
            return;
        };
        let (Some(retention_days), Some(interval_days)) =
            (route.retention_days, route.pruning_interval_days)
        else {
            return;
        };

        let now_ms = Utc::now().timestamp_millis();
        let key = last_pruned_key(table);
        let last_pruned = match self.deps.state.get(&self.id, &key).await {
            Ok(value) => value.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0),
            Err(err) => {
                tracing::error!(instance = %self.id, error = %err, "state read failed");
                return;
            }
        };

        if now_ms - last_pruned <= i64::from(interval_days) * DAY_MS {
            tracing::debug!(
                instance = %self.id,
                table = %table,
                "retention check throttled"
            );
            return;
        }

        // Make sure the table exists before trying to prune it
        if let Err(err) = self.schema.initialize(route, self.colo()).await {
            tracing::error!(
                instance = %self.id,
                table = %table,
                error = %err,
                "schema init failed, prune skipped"
            );
            return;
        }

        let started = Instant::now();
        match prune_table(self.deps.store.as_ref(), table, retention_days).await {
            Ok(rows_deleted) => {
                let duration_ms = started.elapsed().as_millis() as i64;
                if let Err(err) = self
                    .deps
                    .state
                    .put(&self.id, &key, &now_ms.to_string())
                    .await
                {
                    tracing::error!(instance = %self.id, error = %err, "state write failed");
                }

                self.deps.metrics.record_data_pruning(DataPruning {
                    table_name: table.to_string(),
                    outcome: WriteOutcome::Success,
                    colo: self.colo().to_string(),
                    rows_deleted,
                    duration_ms,
                });
                self.push_pruning_summary(table, now_ms, rows_deleted, duration_ms);
            }
            Err(err) => {
                tracing::error!(
                    instance = %self.id,
                    table = %table,
                    error = %err,
                    "prune failed"
                );
                self.deps.metrics.record_data_pruning(DataPruning {
                    table_name: table.to_string(),
                    outcome: WriteOutcome::Failure,
                    colo: self.colo().to_string(),
                    rows_deleted: 0,
                    duration_ms: started.elapsed().as_millis() as i64,
                });
            }
        }
    }

    fn colo(&self) -> &str {
        self.colo.as_deref().unwrap_or("unknown")
    }

    // =========================================================================
    // Fire-and-forget diagnostics
    // =========================================================================

    /// Push the instance state snapshot and alive registration
    fn snapshot_to_diagnostics(&self) {
        let snapshot = InstanceSnapshot {
            id: self.id.clone(),
            colo: self.colo().to_string(),
            buffer_sizes: self
                .buffers
                .iter()
                .map(|(table, buffer)| (table.clone(), buffer.len()))
                .collect(),
            failure_counts: self.failure_counts.clone(),
            has_plan: self.plan.is_some(),
            alarm_time: self.alarm.map(|(_, epoch_ms)| epoch_ms),
        };
        let active = ActiveInstance {
            colo: self.colo().to_string(),
            last_seen: Utc::now().timestamp_millis(),
        };

        if let Ok(value) = serde_json::to_value(&snapshot) {
            fire_and_forget(&self.deps.diagnostics, state_key(&self.id), value, None);
        }
        if let Ok(value) = serde_json::to_value(&active) {
            fire_and_forget(
                &self.deps.diagnostics,
                active_key(&self.id),
                value,
                Some(ACTIVE_TTL_SECS),
            );
        }
    }

    /// Push the last successful firehose batch and event
    fn push_firehose_snapshot(&self, batch: &[LogRecord]) {
        if let Ok(value) = serde_json::to_value(batch) {
            fire_and_forget(
                &self.deps.diagnostics,
                LAST_FIREHOSE_BATCH.to_string(),
                value,
                None,
            );
        }
        if let Some(last) = batch.last() {
            if let Ok(value) = serde_json::to_value(last) {
                fire_and_forget(
                    &self.deps.diagnostics,
                    LAST_FIREHOSE_EVENT.to_string(),
                    value,
                    None,
                );
            }
        }
    }

    /// Push a failed-batch payload
    fn push_failed_batch(&self, table: &str, error: &BatchError, batch: &[LogRecord]) {
        let payload = FailedBatch {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            table_name: table.to_string(),
            error: error.to_string(),
            batch: serde_json::to_value(batch).unwrap_or(serde_json::Value::Null),
        };
        if let Ok(value) = serde_json::to_value(&payload) {
            fire_and_forget(
                &self.deps.diagnostics,
                LAST_FAILED_BATCH.to_string(),
                value,
                None,
            );
        }
    }

    /// Merge this table's entry into the pruning summary
    fn push_pruning_summary(
        &self,
        table: &str,
        pruned_at_ms: i64,
        rows_deleted: u64,
        duration_ms: i64,
    ) {
        let diagnostics = Arc::clone(&self.deps.diagnostics);
        let table = table.to_string();
        let entry = PruningSummaryEntry {
            last_pruned_timestamp: pruned_at_ms,
            last_rows_deleted: rows_deleted,
            last_prune_duration_ms: duration_ms,
        };

        tokio::spawn(async move {
            let mut summary = match diagnostics.get(PRUNING_SUMMARY).await {
                Ok(Some(serde_json::Value::Object(map))) => map,
                _ => serde_json::Map::new(),
            };
            if let Ok(value) = serde_json::to_value(&entry) {
                summary.insert(table, value);
            }
            if let Err(err) = diagnostics
                .put(PRUNING_SUMMARY, serde_json::Value::Object(summary), None)
                .await
            {
                tracing::warn!(error = %err, "pruning summary write failed");
            }
        });
    }
}

/// Write a diagnostics value in the background; failures only log
fn fire_and_forget(
    diagnostics: &Arc<dyn DiagnosticsSink>,
    key: String,
    value: serde_json::Value,
    ttl_secs: Option<u64>,
) {
    let diagnostics = Arc::clone(diagnostics);
    tokio::spawn(async move {
        if let Err(err) = diagnostics.put(&key, value, ttl_secs).await {
            tracing::warn!(key = %key, error = %err, "diagnostics write failed");
        }
    });
}

async fn sleep_until_alarm(alarm: Option<(tokio::time::Instant, i64)>) {
    if let Some((deadline, _)) = alarm {
        tokio::time::sleep_until(deadline).await;
    }
}
