//! Durable per-instance state
//!
//! Each batcher instance persists a handful of small values: the schema
//! fingerprint per table and the last-pruned timestamp per table. Keys
//! are scoped by instance id so every instance sees only its own state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use turso::{Builder, Database};

use crate::error::Result;

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

/// Durable key/value state for batcher instances
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value
    async fn get(&self, instance_id: &str, key: &str) -> Result<Option<String>>;

    /// Write a value (upsert)
    async fn put(&self, instance_id: &str, key: &str, value: &str) -> Result<()>;
}

const SCHEMA_STATE: &str = r#"
CREATE TABLE IF NOT EXISTS batcher_state (
    instance_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (instance_id, key)
)
"#;

/// Turso-backed durable state
#[derive(Clone)]
pub struct SqliteStateStore {
    db: Database,
}

impl SqliteStateStore {
    /// Open a file-backed state store
    pub async fn open(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory state store (for tests and local runs)
    pub async fn memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// Share an already-open database handle
    pub async fn with_database(db: Database) -> Result<Self> {
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(SCHEMA_STATE, ()).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get(&self, instance_id: &str, key: &str) -> Result<Option<String>> {
        let conn = self.db.connect()?;
        let mut rows = conn
            .query(
                "SELECT value FROM batcher_state WHERE instance_id = ?1 AND key = ?2",
                [instance_id, key],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let value = row.get_value(0)?;
            Ok(match value {
                turso::Value::Text(s) => Some(s),
                _ => None,
            })
        } else {
            Ok(None)
        }
    }

    async fn put(&self, instance_id: &str, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO batcher_state (instance_id, key, value) VALUES (?1, ?2, ?3)",
            [instance_id, key, value],
        )
        .await?;
        Ok(())
    }
}

/// In-memory durable state for tests
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    entries: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl MemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, instance_id: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .get(&(instance_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(&self, instance_id: &str, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(
            (instance_id.to_string(), key.to_string()),
            value.to_string(),
        );
        Ok(())
    }
}
