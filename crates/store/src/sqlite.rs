//! Turso-backed log store
//!
//! Turso is an async SQLite-compatible engine, so the batcher's DDL and
//! catalog queries (`sqlite_master`, `PRAGMA table_info`) work as-is.

use async_trait::async_trait;
use turso::{Builder, Database};

use crate::error::{Result, StoreError};
use crate::statement::{Row, SqlValue, Statement};
use crate::LogStore;

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

/// The production log store
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open a file-backed store
    pub async fn open(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Ok(Self { db })
    }

    /// Open an in-memory store (for tests and local runs)
    pub async fn memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Ok(Self { db })
    }

    /// The underlying database handle
    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn to_engine(values: Vec<SqlValue>) -> Vec<turso::Value> {
    values
        .into_iter()
        .map(|v| match v {
            SqlValue::Text(s) => turso::Value::Text(s),
            SqlValue::Integer(n) => turso::Value::Integer(n),
            SqlValue::Real(f) => turso::Value::Real(f),
            SqlValue::Null => turso::Value::Null,
        })
        .collect()
}

fn from_engine(value: turso::Value) -> SqlValue {
    match value {
        turso::Value::Text(s) => SqlValue::Text(s),
        turso::Value::Integer(n) => SqlValue::Integer(n),
        turso::Value::Real(f) => SqlValue::Real(f),
        turso::Value::Blob(b) => SqlValue::Text(String::from_utf8_lossy(&b).into_owned()),
        turso::Value::Null => SqlValue::Null,
    }
}

fn convert_row(row: &turso::Row) -> Result<Row> {
    let mut values = Vec::with_capacity(row.column_count());
    for i in 0..row.column_count() {
        values.push(from_engine(row.get_value(i)?));
    }
    Ok(Row::new(values))
}

#[async_trait]
impl LogStore for SqliteStore {
    async fn execute_batch(&self, statements: Vec<Statement>) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }

        let conn = self.db.connect()?;
        conn.execute("BEGIN", ()).await?;

        for statement in statements {
            if let Err(err) = conn
                .execute(&statement.sql, to_engine(statement.params))
                .await
            {
                if let Err(rollback_err) = conn.execute("ROLLBACK", ()).await {
                    tracing::warn!(error = %rollback_err, "rollback failed after batch error");
                }
                return Err(StoreError::Database(err));
            }
        }

        conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    async fn execute(&self, statement: Statement) -> Result<u64> {
        let conn = self.db.connect()?;
        let affected = conn
            .execute(&statement.sql, to_engine(statement.params))
            .await?;
        Ok(affected)
    }

    async fn exec(&self, sql: &str) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(sql, ()).await?;
        Ok(())
    }

    async fn first(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(sql, to_engine(params)).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(convert_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(sql, to_engine(params)).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(convert_row(&row)?);
        }
        Ok(out)
    }
}
