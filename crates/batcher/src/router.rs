//! Shard dispatcher
//!
//! Maps each record deterministically to a named batcher instance so a
//! retried request lands on the same buffers. The shard key is the ray
//! id when the edge supplied one, else the record's own log id; the key
//! hashes onto a fixed shard ring. Instances spawn lazily on first
//! contact and receive the compiled plan before their first record.

use std::collections::HashMap;
use std::sync::Arc;

use loghose_plan::LogPlan;
use loghose_protocol::{field, LogRecord};
use parking_lot::Mutex;

use crate::command::BatcherHandle;
use crate::config::{BatcherConfig, BatcherDeps};
use crate::instance::Batcher;

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

/// Default number of shard instances
pub const DEFAULT_SHARD_COUNT: u32 = 8;

/// Deterministic name-to-instance dispatcher
pub struct ShardRouter {
    config: BatcherConfig,
    deps: BatcherDeps,
    shard_count: u32,
    instances: Mutex<HashMap<String, BatcherHandle>>,
}

impl ShardRouter {
    /// Create a router with the default shard count
    pub fn new(config: BatcherConfig, deps: BatcherDeps) -> Self {
        Self::with_shard_count(config, deps, DEFAULT_SHARD_COUNT)
    }

    /// Create a router with an explicit shard count
    pub fn with_shard_count(config: BatcherConfig, deps: BatcherDeps, shard_count: u32) -> Self {
        Self {
            config,
            deps,
            shard_count: shard_count.max(1),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Shard instance name for a record
    ///
    /// Same request (same ray id) always maps to the same name.
    pub fn shard_for(&self, record: &LogRecord) -> String {
        let key = record
            .get(field::RAY_ID)
            .as_text()
            .or_else(|| record.get(field::LOG_ID).as_text())
            .unwrap_or("");
        let index = crc32fast::hash(key.as_bytes()) % self.shard_count;
        format!("shard_{index}")
    }

    /// Dispatch a record and its matched destination tables
    ///
    /// On first contact with an instance the compiled plan is delivered
    /// ahead of the record, so alarm-driven flushes can resolve routes.
    pub async fn dispatch(&self, record: LogRecord, tables: Vec<String>, plan: &Arc<LogPlan>) {
        let name = self.shard_for(&record);
        let (handle, newly_spawned) = self.get_or_spawn(&name);

        if newly_spawned {
            handle.set_log_plan(Arc::clone(plan)).await;
        }
        handle.add_log(record, tables).await;
    }

    /// Handle for a named instance, spawning it if needed
    ///
    /// The cron path uses names like `pruner_<table>` and sends the plan
    /// itself before any retention check.
    pub fn named(&self, name: &str) -> BatcherHandle {
        self.get_or_spawn(name).0
    }

    /// Currently live instance handles
    pub fn handles(&self) -> Vec<BatcherHandle> {
        self.instances.lock().values().cloned().collect()
    }

    /// Drain every live instance (shutdown path)
    pub async fn drain_all(&self) {
        for handle in self.handles() {
            handle.drain().await;
        }
    }

    fn get_or_spawn(&self, name: &str) -> (BatcherHandle, bool) {
        let mut instances = self.instances.lock();
        if let Some(handle) = instances.get(name) {
            if handle.is_alive() {
                return (handle.clone(), false);
            }
        }

        let (batcher, handle) = Batcher::new(name, self.config.clone(), self.deps.clone());
        tokio::spawn(batcher.run());
        instances.insert(name.to_string(), handle.clone());
        tracing::debug!(instance = %name, "batcher spawned");
        (handle, true)
    }
}
