// crates/sentinel-witness/src/classify.rs
// ============================================================================
// Module: classify
// Description: Free functions implementing WITNESS's CLASSIFY and ENRICH
//              text-shaping rules.
// Purpose: Keep the event-loop body in `witness.rs` free of string-munging
//          detail.
// Dependencies: serde_json, sentinel-core
// ============================================================================

use sentinel_core::PatternMatch;
use sentinel_core::PatternType;
use sentinel_core::SourceId;
use sentinel_core::Urgency;
use serde_json::Value;

/// Standard keys probed, in order, for an event's human-readable text.
const TEXT_KEYS: [&str; 5] = ["message", "text", "content", "error", "description"];

/// Longest a `Signal::summary` may be, per `Signal`'s own invariant.
const SUMMARY_LIMIT: usize = 120;

/// Extracts the text WITNESS classifies, per the CLASSIFY step: the first
/// non-empty string found under [`TEXT_KEYS`], falling back to the whole
/// event serialized as JSON.
///
/// Returns `None` only when `payload` serializes to nothing usable (an
/// empty object has no probeable key but still serializes to `"{}"`, which
/// is accepted as text; only a `null` payload or a serialization failure
/// yields `None`).
#[must_use]
pub fn extract_text(payload: &Value) -> Option<String> {
    if let Some(object) = payload.as_object() {
        for key in TEXT_KEYS {
            let Some(value) = object.get(key) else { continue };
            if let Some(text) = value.as_str() {
                if !text.trim().is_empty() {
                    return Some(text.to_owned());
                }
            } else if !value.is_null() {
                return Some(value.to_string());
            }
        }
    }

    if payload.is_null() {
        return None;
    }
    let serialized = serde_json::to_string(payload).ok()?;
    (!serialized.trim().is_empty()).then_some(serialized)
}

/// Renders `pattern_name` (e.g. `"critical_error"`) as title case
/// (`"Critical Error"`) for the `Signal::summary` prefix.
#[must_use]
pub fn title_case(pattern_name: &str) -> String {
    pattern_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncates `summary` to at most [`SUMMARY_LIMIT`] UTF-8 characters,
/// replacing the tail with an ellipsis when truncation occurs.
#[must_use]
pub fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_LIMIT {
        return summary.to_owned();
    }
    let head: String = summary.chars().take(SUMMARY_LIMIT - 1).collect();
    format!("{head}\u{2026}")
}

/// Resolves a `Signal::source_id` from the originating event: `_message_id`
/// if present, else `id`, else the literal string `"unknown"`.
#[must_use]
pub fn extract_source_id(payload: &Value) -> SourceId {
    let Some(object) = payload.as_object() else {
        return SourceId::Text("unknown".to_owned());
    };
    object
        .get("_message_id")
        .or_else(|| object.get("id"))
        .and_then(value_to_source_id)
        .unwrap_or_else(|| SourceId::Text("unknown".to_owned()))
}

/// Converts a JSON scalar into a [`SourceId`], if it is a shape `SourceId`
/// can represent.
fn value_to_source_id(value: &Value) -> Option<SourceId> {
    match value {
        Value::String(text) => Some(SourceId::Text(text.clone())),
        Value::Number(number) => number.as_i64().map(SourceId::Numeric),
        _ => None,
    }
}

/// Derives a `Signal::priority` from a matched pattern, per the ENRICH
/// step's escalation table.
#[must_use]
pub fn derive_priority(pattern_match: &PatternMatch) -> Urgency {
    match pattern_match.pattern_type {
        PatternType::Failure => {
            if pattern_match.confidence >= 0.9 {
                Urgency::Critical
            } else if pattern_match.confidence >= 0.8 {
                Urgency::High
            } else {
                Urgency::Normal
            }
        }
        PatternType::Opportunity => {
            if pattern_match.pattern_name == "constitutional_violation" {
                Urgency::High
            } else {
                Urgency::Normal
            }
        }
        PatternType::UserIntent => Urgency::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_probes_keys_in_priority_order() {
        let payload = serde_json::json!({"description": "d", "message": "m"});
        assert_eq!(extract_text(&payload).as_deref(), Some("m"));
    }

    #[test]
    fn extract_text_falls_back_to_serialized_event() {
        let payload = serde_json::json!({"unrelated": 1});
        assert_eq!(extract_text(&payload).as_deref(), Some(r#"{"unrelated":1}"#));
    }

    #[test]
    fn extract_text_rejects_null_payload() {
        assert_eq!(extract_text(&Value::Null), None);
    }

    #[test]
    fn title_case_splits_on_underscore() {
        assert_eq!(title_case("critical_error"), "Critical Error");
        assert_eq!(title_case("flaky_test"), "Flaky Test");
    }

    #[test]
    fn truncate_summary_is_a_no_op_under_the_limit() {
        let short = "well within bounds";
        assert_eq!(truncate_summary(short), short);
    }

    #[test]
    fn truncate_summary_ellipsizes_at_the_boundary() {
        let long = "x".repeat(200);
        let truncated = truncate_summary(&long);
        assert_eq!(truncated.chars().count(), 120);
        assert!(truncated.ends_with('\u{2026}'));
    }

    #[test]
    fn extract_source_id_prefers_message_id_over_id() {
        let payload = serde_json::json!({"_message_id": 7, "id": "ignored"});
        assert_eq!(extract_source_id(&payload), SourceId::Numeric(7));
    }

    #[test]
    fn extract_source_id_falls_back_to_unknown() {
        let payload = serde_json::json!({"other": true});
        assert_eq!(extract_source_id(&payload), SourceId::Text("unknown".to_owned()));
    }

    fn matched(pattern_type: PatternType, pattern_name: &str, confidence: f64) -> PatternMatch {
        PatternMatch {
            pattern_type,
            pattern_name: pattern_name.to_owned(),
            confidence,
            keywords_matched: Vec::new(),
            base_score: pattern_type.base_confidence(),
            keyword_score: 0.0,
        }
    }

    #[test]
    fn derive_priority_escalates_failure_by_confidence() {
        assert_eq!(derive_priority(&matched(PatternType::Failure, "critical_error", 0.95)), Urgency::Critical);
        assert_eq!(derive_priority(&matched(PatternType::Failure, "critical_error", 0.85)), Urgency::High);
        assert_eq!(derive_priority(&matched(PatternType::Failure, "critical_error", 0.75)), Urgency::Normal);
    }

    #[test]
    fn derive_priority_escalates_only_constitutional_violation() {
        assert_eq!(
            derive_priority(&matched(PatternType::Opportunity, "constitutional_violation", 0.6)),
            Urgency::High
        );
        assert_eq!(derive_priority(&matched(PatternType::Opportunity, "duplication", 0.6)), Urgency::Normal);
    }

    #[test]
    fn derive_priority_user_intent_is_always_normal() {
        assert_eq!(derive_priority(&matched(PatternType::UserIntent, "feature_request", 0.9)), Urgency::Normal);
    }
}
