// crates/sentinel-router/src/similarity.rs
// ============================================================================
// Module: similarity
// Description: Scores a `RouterEvent` against a candidate `PatternRecord`.
// Purpose: Implement the four-factor similarity scoring and the
//          recency/usage confidence adjustment the pattern-match fast path
//          and the healing trigger's pattern lookup both rely on.
// Dependencies: sentinel-core, sentinel-config, time
// ============================================================================

use sentinel_config::SimilarityWeights;
use sentinel_core::PatternRecord;
use time::OffsetDateTime;

use crate::event::RouterEvent;

/// A scored candidate: the record, its weighted fast-path score, and its
/// recency/usage-adjusted confidence.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// The scored pattern.
    pub record: PatternRecord,
    /// `similarity(event, record) * record.confidence`, compared against
    /// the fast-path threshold.
    pub score: f64,
    /// [`confidence_for`]'s recency/usage-adjusted confidence.
    pub confidence: f64,
}

/// Scores every record in `candidates` against `event`, keeping only those
/// whose weighted score exceeds `threshold`, sorted highest score first.
#[must_use]
pub fn find_matches(event: &RouterEvent, candidates: &[PatternRecord], weights: &SimilarityWeights, threshold: f64) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = candidates
        .iter()
        .map(|record| PatternMatch {
            record: record.clone(),
            score: weighted_score(event, record, weights),
            confidence: confidence_for(record),
        })
        .filter(|candidate| candidate.score > threshold)
        .collect();

    matches.sort_by(|left, right| right.score.partial_cmp(&left.score).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

/// `similarity(event, record) * record.confidence`, the "weighted score"
/// the fast path's threshold check names.
#[must_use]
pub fn weighted_score(event: &RouterEvent, record: &PatternRecord, weights: &SimilarityWeights) -> f64 {
    similarity(event, record, weights) * record.confidence
}

/// Four-factor similarity between `event` and `record`, each factor capped
/// by its configured weight and the total capped at 1.0: an exact
/// `error_type` match, a file/language context match, Jaccard similarity
/// over word sets, and the record's own confidence standing in for a
/// historical success rate.
#[must_use]
pub fn similarity(event: &RouterEvent, record: &PatternRecord, weights: &SimilarityWeights) -> f64 {
    let mut score = 0.0;

    if let (Some(event_type), Some(pattern_type)) = (event.error_type.as_deref(), error_type_tag(record)) {
        if event_type == pattern_type {
            score += weights.exact_match;
        }
    }

    if similar_file_context(event, record) {
        score += weights.file_context;
    }

    score += weights.semantic * semantic_similarity(event, record);
    score += weights.success_rate * record.confidence;

    score.min(1.0)
}

/// Recency- and usage-adjusted confidence for a pattern, independent of
/// any particular event.
#[must_use]
pub fn confidence_for(record: &PatternRecord) -> f64 {
    let mut confidence = record.confidence;

    if record.evidence_count > 5 {
        confidence = (confidence * 1.1).min(1.0);
    } else if record.evidence_count <= 1 {
        confidence *= 0.8;
    }

    let days_since_used = (OffsetDateTime::now_utc() - record.timestamp).whole_days();
    if days_since_used < 7 {
        confidence = (confidence * 1.05).min(1.0);
    } else if days_since_used > 30 {
        confidence *= 0.95;
    }

    confidence
}

/// Reads the `error_type` tag a healed pattern's metadata carries, if any.
fn error_type_tag(record: &PatternRecord) -> Option<&str> {
    record.metadata.get("error_type").and_then(serde_json::Value::as_str)
}

/// Reads the pattern's `tags` array as a plain string slice set; patterns
/// WITNESS records carry `keywords_matched` instead, which doubles as a
/// tag source when `tags` is absent.
fn tags(record: &PatternRecord) -> Vec<&str> {
    let key = if record.metadata.contains_key("tags") { "tags" } else { "keywords_matched" };
    record
        .metadata
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|values| values.iter().filter_map(serde_json::Value::as_str).collect())
        .unwrap_or_default()
}

/// File/language-context match: a `test`-named source file needs a
/// `test`/`uses_test` tag, a `.rs` file needs a `rust`/`uses_edit` tag, and
/// a `.md` file needs a `markdown`/`documentation` tag.
fn similar_file_context(event: &RouterEvent, record: &PatternRecord) -> bool {
    let Some(file) = event.source_file.as_deref() else {
        return false;
    };
    let lower = file.to_lowercase();
    let pattern_tags = tags(record);

    if lower.contains("test") {
        pattern_tags.contains(&"test") || pattern_tags.contains(&"uses_test")
    } else if lower.ends_with(".rs") {
        pattern_tags.contains(&"rust") || pattern_tags.contains(&"uses_edit")
    } else if lower.ends_with(".md") {
        pattern_tags.contains(&"markdown") || pattern_tags.contains(&"documentation")
    } else {
        false
    }
}

/// Jaccard similarity over whitespace/punctuation-split word sets of the
/// event's message and metadata against the pattern's content and tags.
fn semantic_similarity(event: &RouterEvent, record: &PatternRecord) -> f64 {
    let metadata_text = serde_json::Value::Object(event.metadata.clone());
    let message = &event.message;
    let event_text = format!("{message} {metadata_text}");

    let tag_text = tags(record).join(" ");
    let content = &record.content;
    let pattern_text = format!("{content} {tag_text}");

    let event_words = words(&event_text);
    let pattern_words = words(&pattern_text);

    if event_words.is_empty() || pattern_words.is_empty() {
        return 0.0;
    }

    let intersection = event_words.intersection(&pattern_words).count();
    let union = event_words.union(&pattern_words).count();
    if union == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss, reason = "word-set sizes never approach f64's precision limit")]
        let ratio = intersection as f64 / union as f64;
        ratio
    }
}

/// Splits `text` into a lowercase set of alphanumeric "words".
fn words(text: &str) -> std::collections::HashSet<String> {
    text.to_lowercase().split(|ch: char| !ch.is_alphanumeric()).filter(|word| !word.is_empty()).map(ToOwned::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(error_type: &str, source_file: &str, message: &str) -> RouterEvent {
        RouterEvent::parse(&serde_json::json!({
            "event_type": "error_detected",
            "error_type": error_type,
            "source_file": source_file,
            "message": message
        }))
        .expect("parses")
    }

    fn record(error_type: &str, content: &str, confidence: f64, evidence_count: u32, tags: &[&str]) -> PatternRecord {
        let mut metadata = serde_json::Map::new();
        metadata.insert("error_type".to_owned(), serde_json::Value::String(error_type.to_owned()));
        metadata.insert("tags".to_owned(), serde_json::Value::Array(tags.iter().map(|tag| serde_json::Value::String((*tag).to_owned())).collect()));
        PatternRecord {
            pattern_type: "error_fix".to_owned(),
            pattern_name: error_type.to_owned(),
            content: content.to_owned(),
            confidence,
            evidence_count,
            timestamp: OffsetDateTime::now_utc(),
            metadata,
        }
    }

    #[test]
    fn exact_error_type_match_contributes_its_full_weight() {
        let weights = SimilarityWeights::default();
        let event = event("NullPointerException", "src/lib.rs", "boom");
        let matching = record("NullPointerException", "boom fix", 0.9, 3, &["rust"]);
        let mismatching = record("TimeoutError", "boom fix", 0.9, 3, &["rust"]);
        assert!(similarity(&event, &matching, &weights) > similarity(&event, &mismatching, &weights));
    }

    #[test]
    fn file_context_rewards_matching_tag() {
        let weights = SimilarityWeights::default();
        let event = event("E", "src/lib_test.rs", "boom");
        let tagged = record("E", "x", 0.5, 3, &["test"]);
        let untagged = record("E", "x", 0.5, 3, &["rust"]);
        assert!(similarity(&event, &tagged, &weights) > similarity(&event, &untagged, &weights));
    }

    #[test]
    fn confidence_boosts_frequently_and_recently_used_patterns() {
        let fresh = record("E", "x", 0.5, 8, &[]);
        assert!(confidence_for(&fresh) > 0.5);
    }

    #[test]
    fn confidence_discounts_barely_used_patterns() {
        let barely_used = record("E", "x", 0.5, 1, &[]);
        assert!(confidence_for(&barely_used) < 0.5);
    }

    #[test]
    fn find_matches_filters_by_threshold_and_sorts_descending() {
        let weights = SimilarityWeights::default();
        let event = event("E", "src/lib.rs", "boom");
        let strong = record("E", "boom", 0.9, 8, &["rust"]);
        let weak = record("Other", "unrelated", 0.1, 1, &[]);
        let matches = find_matches(&event, &[weak, strong.clone()], &weights, 0.1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.pattern_name, strong.pattern_name);
    }
}
