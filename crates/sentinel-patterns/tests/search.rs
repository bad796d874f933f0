// crates/sentinel-patterns/tests/search.rs
// Integration tests for `PatternStore` search and ranking behavior.

use sentinel_config::StoreConfig;
use sentinel_patterns::PatternStore;
use sentinel_store::KvStore;

async fn open_pattern_store(dir: &tempfile::TempDir) -> PatternStore {
    let config = StoreConfig::default();
    let store = KvStore::open(&dir.path().join("patterns.db"), &config, 2).expect("store opens");
    PatternStore::new(store)
}

#[tokio::test]
async fn stored_pattern_is_found_by_type_and_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let patterns = open_pattern_store(&dir).await;

    patterns
        .store_pattern("failure", "critical_error", "NullPointerException in auth", 0.85, None, 1)
        .await
        .expect("store succeeds");

    let found = patterns
        .search_patterns(Some("failure"), Some("critical_error"), None, None)
        .await
        .expect("search succeeds");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "NullPointerException in auth");
}

#[tokio::test]
async fn results_are_ordered_by_confidence_descending() {
    let dir = tempfile::tempdir().expect("tempdir");
    let patterns = open_pattern_store(&dir).await;

    patterns.store_pattern("opportunity", "code_duplication", "low confidence hit", 0.72, None, 1).await.expect("store 1");
    patterns.store_pattern("opportunity", "code_duplication", "high confidence hit", 0.95, None, 1).await.expect("store 2");

    let found = patterns.get_top_patterns(10).await.expect("get_top_patterns succeeds");
    assert_eq!(found[0].content, "high confidence hit");
    assert_eq!(found[1].content, "low confidence hit");
}

#[tokio::test]
async fn query_filters_by_case_insensitive_substring() {
    let dir = tempfile::tempdir().expect("tempdir");
    let patterns = open_pattern_store(&dir).await;

    patterns.store_pattern("failure", "flaky_test", "Timeout waiting for RESPONSE", 0.8, None, 1).await.expect("store");

    let found = patterns.search_patterns(None, None, Some("response"), None).await.expect("search succeeds");
    assert_eq!(found.len(), 1);

    let missed = patterns.search_patterns(None, None, Some("nonexistent"), None).await.expect("search succeeds");
    assert!(missed.is_empty());
}

#[tokio::test]
async fn min_confidence_floor_excludes_lower_scores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let patterns = open_pattern_store(&dir).await;

    patterns.store_pattern("failure", "critical_error", "low", 0.71, None, 1).await.expect("store 1");
    patterns.store_pattern("failure", "critical_error", "high", 0.9, None, 1).await.expect("store 2");

    let found = patterns.search_patterns(None, None, None, Some(0.8)).await.expect("search succeeds");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "high");
}

#[tokio::test]
async fn stats_count_only_pattern_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StoreConfig::default();
    let store = KvStore::open(&dir.path().join("patterns.db"), &config, 2).expect("store opens");
    store.set("not_a_pattern", serde_json::Map::new(), None).await.expect("set succeeds");
    let patterns = PatternStore::new(store);

    patterns.store_pattern("failure", "critical_error", "evidence", 0.8, None, 1).await.expect("store succeeds");

    let stats = patterns.get_stats().await.expect("stats succeed");
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.total_patterns, 1);
}

#[tokio::test]
async fn rejects_confidence_out_of_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let patterns = open_pattern_store(&dir).await;

    let err = patterns.store_pattern("failure", "critical_error", "bad", 1.5, None, 1).await;
    assert!(err.is_err());
}
