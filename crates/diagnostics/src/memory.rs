//! In-memory diagnostics sink
//!
//! Used in tests and local runs. TTLs are recorded but not enforced;
//! expiry is the remote namespace's concern.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{DiagnosticsSink, Result};

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    ttl_secs: Option<u64>,
}

/// In-memory key/value sink
#[derive(Clone, Default)]
pub struct MemoryDiagnostics {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryDiagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently present
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Keys with a given prefix
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// The TTL recorded for a key, if any
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.entries.lock().get(key).and_then(|e| e.ttl_secs)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the sink is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl DiagnosticsSink for MemoryDiagnostics {
    async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl_secs: Option<u64>,
    ) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), Entry { value, ttl_secs });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.lock().get(key).map(|e| e.value.clone()))
    }
}
