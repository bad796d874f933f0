// crates/sentinel-store/tests/roundtrip.rs
// Integration tests for `KvStore` against a real SQLite file on disk.

use sentinel_config::StoreConfig;
use sentinel_core::ValidationError;
use sentinel_store::KvStore;
use sentinel_store::StoreError;

fn open_store(dir: &tempfile::TempDir) -> KvStore {
    let config = StoreConfig::default();
    KvStore::open(&dir.path().join("store.db"), &config, 2).expect("store opens")
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    let mut value = serde_json::Map::new();
    value.insert("status".to_owned(), serde_json::json!("ok"));
    store.set("alpha", value.clone(), None).await.expect("set succeeds");

    let fetched = store.get("alpha").await.expect("get succeeds").expect("value present");
    assert_eq!(fetched, value);
}

#[tokio::test]
async fn missing_key_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    let fetched = store.get("missing").await.expect("get succeeds");
    assert!(fetched.is_none());
}

#[tokio::test]
async fn update_preserves_created_at() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    store.set("beta", serde_json::Map::new(), None).await.expect("initial set");
    let first = store.list_all().await.expect("list succeeds");
    let created_at = first[0].created_at;

    store.set("beta", serde_json::Map::new(), None).await.expect("second set");
    let second = store.list_all().await.expect("list succeeds");

    assert_eq!(second[0].created_at, created_at);
    assert!(second[0].updated_at >= created_at);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    store.set("gamma", serde_json::Map::new(), None).await.expect("set succeeds");
    store.delete("gamma").await.expect("first delete succeeds");
    store.delete("gamma").await.expect("second delete is a no-op, not an error");

    assert!(store.get("gamma").await.expect("get succeeds").is_none());
}

#[tokio::test]
async fn list_keys_filters_by_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    store.set("pattern:failure:1", serde_json::Map::new(), None).await.expect("set 1");
    store.set("pattern:failure:2", serde_json::Map::new(), None).await.expect("set 2");
    store.set("other:entry", serde_json::Map::new(), None).await.expect("set 3");

    let keys = store.list_keys("pattern:failure:").await.expect("list succeeds");
    assert_eq!(keys, vec!["pattern:failure:1".to_owned(), "pattern:failure:2".to_owned()]);
}

#[tokio::test]
async fn empty_key_is_rejected_without_touching_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir);

    let err = store.set("   ", serde_json::Map::new(), None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::Empty { field: "key" })));
}
