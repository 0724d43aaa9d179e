//! Commands and the instance handle

use std::sync::Arc;

use loghose_plan::LogPlan;
use loghose_protocol::LogRecord;
use tokio::sync::{mpsc, oneshot};

/// Commands processed by a batcher instance
pub(crate) enum Command {
    /// Append a record to every matched table's buffer
    AddLog {
        record: LogRecord,
        tables: Vec<String>,
    },

    /// Deliver the compiled plan so alarm-driven flushes can resolve
    /// routes without re-evaluating filters
    SetLogPlan(Arc<LogPlan>),

    /// Flush one table's buffer now (size-triggered, self-scheduled)
    Flush { table: String },

    /// Run a retention check for a route's table
    RetentionCheck {
        table: String,
        ack: oneshot::Sender<()>,
    },

    /// Flush everything and acknowledge (shutdown path)
    Drain { ack: oneshot::Sender<()> },
}

/// Handle for sending commands to a batcher instance
///
/// Cloneable; all clones feed the same single-consumer task.
#[derive(Clone)]
pub struct BatcherHandle {
    id: String,
    tx: mpsc::Sender<Command>,
}

impl BatcherHandle {
    pub(crate) fn new(id: String, tx: mpsc::Sender<Command>) -> Self {
        Self { id, tx }
    }

    /// Instance id this handle addresses
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enqueue a record for the given destination tables
    pub async fn add_log(&self, record: LogRecord, tables: Vec<String>) {
        if self
            .tx
            .send(Command::AddLog { record, tables })
            .await
            .is_err()
        {
            tracing::error!(instance = %self.id, "batcher is gone, record dropped");
        }
    }

    /// Deliver the compiled log plan
    pub async fn set_log_plan(&self, plan: Arc<LogPlan>) {
        if self.tx.send(Command::SetLogPlan(plan)).await.is_err() {
            tracing::error!(instance = %self.id, "batcher is gone, plan not delivered");
        }
    }

    /// Run a retention check for a table, waiting for completion
    pub async fn run_retention_check(&self, table: impl Into<String>) {
        let (ack, done) = oneshot::channel();
        let command = Command::RetentionCheck {
            table: table.into(),
            ack,
        };
        if self.tx.send(command).await.is_err() {
            tracing::error!(instance = %self.id, "batcher is gone, retention check skipped");
            return;
        }
        let _ = done.await;
    }

    /// Flush all buffers, waiting for completion
    pub async fn drain(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Drain { ack }).await.is_err() {
            return;
        }
        let _ = done.await;
    }

    /// Whether the instance task is still alive
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}
