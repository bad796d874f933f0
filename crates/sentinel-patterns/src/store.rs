// crates/sentinel-patterns/src/store.rs
// ============================================================================
// Module: PatternStore
// Description: Pattern-shaped queries, layered over `sentinel_store::KvStore`.
// Purpose: Avoid a second schema by keeping patterns as rows in the generic
//          K/V store under a fixed key convention, recognized by the
//          presence of a `pattern_type` field in their value map.
// Dependencies: sentinel-core, sentinel-store, serde_json, time, tracing
// ============================================================================

use sentinel_core::PatternRecord;
use sentinel_core::ValidationError;
use sentinel_store::KvStore;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::PatternStoreError;
use crate::stats::ConnectionState;
use crate::stats::PatternStoreStats;

/// Pattern-shaped queries layered over the K/V store.
///
/// Every pattern record is a plain [`KvStore`] entry written under the key
/// `"<pattern_type>:<pattern_name>:<iso_timestamp>"`, with `pattern_type`
/// and `pattern_name` echoed into the entry's value so `search_patterns`
/// can recognize and filter pattern rows without a second table.
pub struct PatternStore {
    store: KvStore,
}

impl PatternStore {
    /// Wraps an already-open [`KvStore`] as a pattern store.
    #[must_use]
    pub const fn new(store: KvStore) -> Self {
        Self { store }
    }

    /// Writes a new pattern record, returning its generated key.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if `pattern_type`, `pattern_name`, or
    /// `content` is empty, or if `confidence` is outside `[0.0, 1.0]`.
    pub async fn store_pattern(
        &self,
        pattern_type: impl Into<String>,
        pattern_name: impl Into<String>,
        content: impl Into<String>,
        confidence: f64,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
        evidence_count: u32,
    ) -> Result<String, PatternStoreError> {
        let pattern_type = pattern_type.into();
        let pattern_name = pattern_name.into();
        let content = content.into();

        if pattern_type.trim().is_empty() {
            return Err(ValidationError::Empty { field: "pattern_type" }.into());
        }
        if pattern_name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "pattern_name" }.into());
        }
        if content.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" }.into());
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::OutOfRange {
                field: "confidence",
                bound: "within [0.0, 1.0]",
                actual: confidence.to_string(),
            }
            .into());
        }

        let timestamp = OffsetDateTime::now_utc();
        let timestamp_text = timestamp
            .format(&Rfc3339)
            .map_err(|err| ValidationError::OutOfRange {
                field: "timestamp",
                bound: "formattable as RFC 3339",
                actual: err.to_string(),
            })?;
        let key = format!("{pattern_type}:{pattern_name}:{timestamp_text}");

        let mut value = serde_json::Map::new();
        value.insert("pattern_type".to_owned(), serde_json::Value::String(pattern_type.clone()));
        value.insert("pattern_name".to_owned(), serde_json::Value::String(pattern_name.clone()));
        value.insert("content".to_owned(), serde_json::Value::String(content));
        value.insert("confidence".to_owned(), serde_json::json!(confidence));
        value.insert("evidence_count".to_owned(), serde_json::json!(evidence_count.max(1)));
        value.insert("timestamp".to_owned(), serde_json::Value::String(timestamp_text));
        value.insert("metadata".to_owned(), serde_json::Value::Object(metadata.unwrap_or_default()));

        let mut indexed_metadata = std::collections::BTreeMap::new();
        indexed_metadata.insert("pattern_type".to_owned(), pattern_type);
        indexed_metadata.insert("pattern_name".to_owned(), pattern_name);

        self.store.set(key.clone(), value, Some(indexed_metadata)).await?;
        Ok(key)
    }

    /// Searches pattern rows, applying each given filter, ordered by
    /// `confidence DESC, timestamp DESC`.
    ///
    /// # Errors
    /// Returns [`PatternStoreError::Store`] if the underlying scan fails.
    pub async fn search_patterns(
        &self,
        pattern_type: Option<&str>,
        pattern_name: Option<&str>,
        query: Option<&str>,
        min_confidence: Option<f64>,
    ) -> Result<Vec<PatternRecord>, PatternStoreError> {
        let entries = self.store.list_all().await?;
        let query_lower = query.map(str::to_lowercase);

        let mut records: Vec<PatternRecord> = entries
            .into_iter()
            .filter_map(|entry| decode_pattern(&entry.value))
            .filter(|record| pattern_type.is_none_or(|wanted| record.pattern_type == wanted))
            .filter(|record| pattern_name.is_none_or(|wanted| record.pattern_name == wanted))
            .filter(|record| {
                min_confidence.is_none_or(|floor| record.confidence >= floor)
            })
            .filter(|record| {
                query_lower.as_deref().is_none_or(|needle| {
                    record.content.to_lowercase().contains(needle)
                })
            })
            .collect();

        records.sort_by(|left, right| {
            right
                .confidence
                .partial_cmp(&left.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| right.timestamp.cmp(&left.timestamp))
        });

        Ok(records)
    }

    /// Convenience over [`PatternStore::search_patterns`]: the `limit`
    /// highest-confidence patterns across all types and names.
    ///
    /// # Errors
    /// Returns [`PatternStoreError::Store`] if the underlying scan fails.
    pub async fn get_top_patterns(&self, limit: usize) -> Result<Vec<PatternRecord>, PatternStoreError> {
        let mut records = self.search_patterns(None, None, None, None).await?;
        records.truncate(limit);
        Ok(records)
    }

    /// Returns row counts over the backing store.
    ///
    /// # Errors
    /// Returns [`PatternStoreError::Store`] if the underlying scan fails.
    pub async fn get_stats(&self) -> Result<PatternStoreStats, PatternStoreError> {
        let entries = self.store.list_all().await?;
        let total_entries = entries.len();
        let total_patterns = entries.iter().filter(|entry| decode_pattern(&entry.value).is_some()).count();
        Ok(PatternStoreStats {
            total_entries,
            total_patterns,
            connection_state: ConnectionState::Open,
        })
    }
}

/// Decodes a stored value as a [`PatternRecord`] if it looks like one
/// (carries a `pattern_type` field); non-pattern rows are silently skipped.
fn decode_pattern(value: &serde_json::Map<String, serde_json::Value>) -> Option<PatternRecord> {
    if !value.contains_key("pattern_type") {
        return None;
    }
    let pattern_type = value.get("pattern_type")?.as_str()?.to_owned();
    let pattern_name = value.get("pattern_name")?.as_str()?.to_owned();
    let content = value.get("content")?.as_str()?.to_owned();
    let confidence = value.get("confidence")?.as_f64()?;
    let evidence_count = value.get("evidence_count").and_then(serde_json::Value::as_u64).unwrap_or(1);
    let timestamp_text = value.get("timestamp")?.as_str()?;
    let timestamp = OffsetDateTime::parse(timestamp_text, &Rfc3339).ok()?;
    let metadata = value
        .get("metadata")
        .and_then(serde_json::Value::as_object)
        .cloned()
        .unwrap_or_default();

    Some(PatternRecord {
        pattern_type,
        pattern_name,
        content,
        confidence,
        evidence_count: u32::try_from(evidence_count).unwrap_or(u32::MAX),
        timestamp,
        metadata,
    })
}
