//! Tests for the turso-backed log store

use super::*;

async fn store_with_table() -> SqliteStore {
    let store = SqliteStore::memory().await.unwrap();
    store
        .exec("CREATE TABLE items (id TEXT PRIMARY KEY, label TEXT, rank INTEGER)")
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_execute_batch_inserts_all_rows() {
    let store = store_with_table().await;

    let statements = vec![
        Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["a".into(), "first".into(), SqlValue::Integer(1)],
        ),
        Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["b".into(), "second".into(), SqlValue::Integer(2)],
        ),
    ];
    store.execute_batch(statements).await.unwrap();

    let rows = store
        .all("SELECT id, label, rank FROM items ORDER BY rank", vec![])
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text(0), Some("a"));
    assert_eq!(rows[1].integer(2), Some(2));
}

#[tokio::test]
async fn test_execute_batch_is_atomic() {
    let store = store_with_table().await;

    let statements = vec![
        Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["a".into(), "ok".into(), SqlValue::Integer(1)],
        ),
        // Duplicate primary key makes the batch fail
        Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["a".into(), "dup".into(), SqlValue::Integer(2)],
        ),
    ];
    assert!(store.execute_batch(statements).await.is_err());

    let rows = store.all("SELECT id FROM items", vec![]).await.unwrap();
    assert!(rows.is_empty(), "failed batch must not leave partial rows");
}

#[tokio::test]
async fn test_execute_reports_affected_rows() {
    let store = store_with_table().await;
    store
        .execute(Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["a".into(), "x".into(), SqlValue::Integer(1)],
        ))
        .await
        .unwrap();

    let affected = store
        .execute(Statement::new(
            "DELETE FROM items WHERE id = ?1",
            vec!["a".into()],
        ))
        .await
        .unwrap();
    assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_first_returns_none_on_empty() {
    let store = store_with_table().await;
    let row = store
        .first("SELECT id FROM items WHERE id = ?1", vec!["missing".into()])
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn test_null_binding_round_trips() {
    let store = store_with_table().await;
    store
        .execute(Statement::new(
            "INSERT INTO items (id, label, rank) VALUES (?1, ?2, ?3)",
            vec!["a".into(), SqlValue::Null, SqlValue::Null],
        ))
        .await
        .unwrap();

    let row = store
        .first("SELECT label FROM items WHERE id = ?1", vec!["a".into()])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get(0), Some(&SqlValue::Null));
}

#[tokio::test]
async fn test_catalog_queries_work() {
    let store = store_with_table().await;

    let row = store
        .first(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            vec!["items".into()],
        )
        .await
        .unwrap();
    assert!(row.is_some());

    let columns = store.all("PRAGMA table_info(items)", vec![]).await.unwrap();
    assert_eq!(columns.len(), 3);
    // Column name is the second field of table_info output
    assert_eq!(columns[0].text(1), Some("id"));
}
