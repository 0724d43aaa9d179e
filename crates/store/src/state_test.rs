//! Tests for durable instance state

use super::*;

#[tokio::test]
async fn test_sqlite_state_round_trip() {
    let store = SqliteStateStore::memory().await.unwrap();

    assert_eq!(store.get("shard_0", "schema_hash_t").await.unwrap(), None);

    store.put("shard_0", "schema_hash_t", "abc123").await.unwrap();
    assert_eq!(
        store.get("shard_0", "schema_hash_t").await.unwrap().as_deref(),
        Some("abc123")
    );

    // Upsert replaces
    store.put("shard_0", "schema_hash_t", "def456").await.unwrap();
    assert_eq!(
        store.get("shard_0", "schema_hash_t").await.unwrap().as_deref(),
        Some("def456")
    );
}

#[tokio::test]
async fn test_state_is_scoped_by_instance() {
    let store = SqliteStateStore::memory().await.unwrap();
    store.put("shard_0", "k", "zero").await.unwrap();
    store.put("shard_1", "k", "one").await.unwrap();

    assert_eq!(store.get("shard_0", "k").await.unwrap().as_deref(), Some("zero"));
    assert_eq!(store.get("shard_1", "k").await.unwrap().as_deref(), Some("one"));
}

#[tokio::test]
async fn test_memory_state_round_trip() {
    let store = MemoryStateStore::new();
    store.put("i", "k", "v").await.unwrap();
    assert_eq!(store.get("i", "k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(store.get("i", "other").await.unwrap(), None);
}
