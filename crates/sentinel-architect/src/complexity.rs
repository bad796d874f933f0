// crates/sentinel-architect/src/complexity.rs
// ============================================================================
// Module: complexity
// Description: ARCHITECT's ASSESS COMPLEXITY and engine-selection rules.
// Purpose: Isolate the scoring formula from the loop body so its branches
//          can be unit-tested directly against constructed Signals.
// Dependencies: sentinel-core, serde_json
// ============================================================================

use sentinel_core::PatternRecord;
use sentinel_core::PatternType;
use sentinel_core::Signal;
use sentinel_core::Urgency;

/// Pattern names that always carry the highest base complexity bonus,
/// regardless of their `PatternType`.
const HIGH_COMPLEXITY_PATTERNS: [&str; 3] = ["constitutional_violation", "code_duplication", "missing_tests"];

/// Computes ARCHITECT's complexity score in `[0.0, 1.0]` for `signal`,
/// given the historical patterns gathered for it in step 3.
///
/// `historical`'s highest `evidence_count` stands in for the reference
/// implementation's `signal.evidence_count`, a field WITNESS never
/// populates on its own `Signal`s; using the gathered context instead
/// gives this branch an actual source of evidence rather than reading a
/// field that is always absent.
#[must_use]
pub fn assess(signal: &Signal, historical: &[PatternRecord]) -> f64 {
    let mut score = if HIGH_COMPLEXITY_PATTERNS.contains(&signal.pattern.as_str()) {
        0.3
    } else {
        match pattern_type_of(signal) {
            Some(PatternType::Failure) => 0.2,
            Some(PatternType::UserIntent) => 0.4,
            Some(PatternType::Opportunity) | None => 0.0,
        }
    };

    let keywords = matched_keywords(signal);
    if keywords.iter().any(|keyword| keyword.as_str() == "architecture") {
        score = score.max(0.7);
    }
    if keywords.iter().any(|keyword| keyword.as_str() == "refactor") {
        score += 0.2;
    }

    let serialized = serde_json::to_string(signal).unwrap_or_default().to_lowercase();
    if serialized.contains("multi-file") {
        score += 0.2;
    }
    if serialized.contains("system-wide") {
        score += 0.3;
    }

    let evidence_count = historical.iter().map(|record| record.evidence_count).max().unwrap_or(1);
    if evidence_count >= 5 {
        score += 0.1;
    }

    score.min(1.0)
}

/// Selects the reasoning-engine label for `signal` at `complexity`,
/// returning whether the selection counts as an escalation.
#[must_use]
pub fn select_engine(signal: &Signal, complexity: f64) -> (&'static str, bool) {
    match signal.priority {
        Urgency::Critical => ("gpt-5", true),
        Urgency::High if complexity > 0.7 => ("claude-4.1", true),
        Urgency::High | Urgency::Normal => ("codestral-22b", false),
    }
}

/// Reads back the `pattern_type` WITNESS recorded in `signal.data`.
fn pattern_type_of(signal: &Signal) -> Option<PatternType> {
    match signal.data.get("pattern_type")?.as_str()? {
        "failure" => Some(PatternType::Failure),
        "opportunity" => Some(PatternType::Opportunity),
        "user_intent" => Some(PatternType::UserIntent),
        _ => None,
    }
}

/// Reads back the keywords WITNESS matched, as recorded in `signal.data`.
fn matched_keywords(signal: &Signal) -> Vec<String> {
    signal
        .data
        .get("keywords_matched")
        .and_then(serde_json::Value::as_array)
        .map(|values| values.iter().filter_map(|value| value.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use sentinel_core::SignalSource;
    use time::OffsetDateTime;

    use super::*;

    fn sample(pattern: &str, pattern_type: &str, priority: Urgency, keywords: &[&str]) -> Signal {
        let mut data = serde_json::Map::new();
        data.insert("pattern_type".to_owned(), serde_json::Value::String(pattern_type.to_owned()));
        data.insert(
            "keywords_matched".to_owned(),
            serde_json::Value::Array(keywords.iter().map(|k| serde_json::Value::String((*k).to_owned())).collect()),
        );
        Signal {
            priority,
            source: SignalSource::Telemetry,
            pattern: pattern.to_owned(),
            confidence: 0.8,
            data,
            summary: "summary".to_owned(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            source_id: sentinel_core::SourceId::Text("evt".to_owned()),
            correlation_id: None,
        }
    }

    #[test]
    fn high_complexity_pattern_names_score_highest_base() {
        let signal = sample("constitutional_violation", "opportunity", Urgency::Normal, &[]);
        assert!((assess(&signal, &[]) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_and_user_intent_are_mutually_exclusive_with_the_pattern_bonus() {
        let failure = sample("critical_error", "failure", Urgency::Normal, &[]);
        assert!((assess(&failure, &[]) - 0.2).abs() < f64::EPSILON);

        let intent = sample("feature_request", "user_intent", Urgency::Normal, &[]);
        assert!((assess(&intent, &[]) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn architecture_keyword_raises_to_a_floor_not_additive() {
        let signal = sample("feature_request", "user_intent", Urgency::Normal, &["architecture"]);
        assert!((assess(&signal, &[]) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn score_clamps_at_one() {
        let signal = sample("constitutional_violation", "opportunity", Urgency::Normal, &["architecture", "refactor"]);
        assert!((assess(&signal, &[]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn select_engine_escalates_critical_and_complex_high() {
        let critical = sample("critical_error", "failure", Urgency::Critical, &[]);
        assert_eq!(select_engine(&critical, 0.2), ("gpt-5", true));

        let complex_high = sample("critical_error", "failure", Urgency::High, &[]);
        assert_eq!(select_engine(&complex_high, 0.8), ("claude-4.1", true));

        let simple_high = sample("critical_error", "failure", Urgency::High, &[]);
        assert_eq!(select_engine(&simple_high, 0.5), ("codestral-22b", false));
    }
}
