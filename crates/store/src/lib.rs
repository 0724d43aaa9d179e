//! Store interfaces for the loghose pipeline
//!
//! The pipeline touches storage through two deliberately narrow traits:
//!
//! - [`LogStore`] - batched SQL against the log database (SQLite
//!   dialect: `sqlite_master`, `PRAGMA table_info`, `ANALYZE`).
//! - [`StateStore`] - durable per-instance key/value state (schema
//!   fingerprints, last-pruned timestamps).
//!
//! Production uses the turso-backed [`SqliteStore`] /
//! [`SqliteStateStore`]; tests swap in `:memory:` databases or the
//! in-memory [`MemoryStateStore`].

mod error;
mod sqlite;
mod state;
mod statement;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;
pub use state::{MemoryStateStore, SqliteStateStore, StateStore};
pub use statement::{Row, SqlValue, Statement};

use async_trait::async_trait;

/// Batched SQL access to the log database
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Execute a list of statements as one unit
    ///
    /// Either every statement applies or none do.
    async fn execute_batch(&self, statements: Vec<Statement>) -> Result<()>;

    /// Execute one statement, returning the number of affected rows
    async fn execute(&self, statement: Statement) -> Result<u64>;

    /// Execute DDL with no parameters
    async fn exec(&self, sql: &str) -> Result<()>;

    /// Run a query and return the first row, if any
    async fn first(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>>;

    /// Run a query and return all rows
    async fn all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>>;
}
