//! Batcher configuration and shared dependencies

use std::sync::Arc;

use loghose_diagnostics::DiagnosticsSink;
use loghose_metrics::MetricsSink;
use loghose_store::{LogStore, StateStore};

use crate::MAX_RETRIES;

/// Tuning knobs for a batcher instance
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Alarm-driven flush interval in milliseconds
    pub batch_interval_ms: u64,

    /// Size-triggered flush threshold
    pub max_batch_size: usize,

    /// Consecutive failures before dead-letter
    pub max_retries: u32,

    /// Command channel capacity
    pub command_buffer: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_interval_ms: 10_000,
            max_batch_size: 200,
            max_retries: MAX_RETRIES,
            command_buffer: 1_024,
        }
    }
}

impl BatcherConfig {
    /// Set the flush interval
    pub fn with_batch_interval_ms(mut self, interval_ms: u64) -> Self {
        self.batch_interval_ms = interval_ms;
        self
    }

    /// Set the size-triggered flush threshold
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }
}

/// Shared collaborators handed to every instance
#[derive(Clone)]
pub struct BatcherDeps {
    /// The log database
    pub store: Arc<dyn LogStore>,

    /// Durable per-instance state
    pub state: Arc<dyn StateStore>,

    /// Diagnostics namespace
    pub diagnostics: Arc<dyn DiagnosticsSink>,

    /// Dead-letter namespace (distinct from diagnostics)
    pub dead_letter: Arc<dyn DiagnosticsSink>,

    /// Metrics sink
    pub metrics: Arc<dyn MetricsSink>,
}
