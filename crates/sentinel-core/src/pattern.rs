// crates/sentinel-core/src/pattern.rs
// ============================================================================
// Module: Pattern
// Description: The pattern type taxonomy, the transient detector output, and
//              the durable pattern record projected by the pattern store.
// Purpose: Give the detector, WITNESS, the pattern store, and ARCHITECT one
//          shared vocabulary for "a named, typed, confidence-scored record
//          of a recurring situation or fix".
// Dependencies: serde, serde_json, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// The three broad classes of pattern the detector recognizes.
///
/// # Invariants
/// - Exhaustive: every pattern name in the heuristics table belongs to
///   exactly one of these three types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Something broke: errors, regressions, flaky tests.
    Failure,
    /// Something could be improved: duplication, missing tests, violations.
    Opportunity,
    /// The user is expressing a need, request, or frustration.
    UserIntent,
}

impl PatternType {
    /// The detector's base confidence score for this pattern type, before
    /// any keyword or metadata bonus is applied.
    #[must_use]
    pub const fn base_confidence(self) -> f64 {
        match self {
            Self::Failure => 0.7,
            Self::Opportunity => 0.6,
            Self::UserIntent => 0.5,
        }
    }

    /// The lowercase wire name used as the `pattern_type` value stored by
    /// the pattern store and matched against in `search_patterns`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::Opportunity => "opportunity",
            Self::UserIntent => "user_intent",
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient output of the pattern detector; never persisted directly.
///
/// # Invariants
/// - `confidence` is in `[0.0, 1.0]`, capped by construction.
/// - `keywords_matched` preserves the heuristics table's iteration order so
///   identical inputs yield an identical match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Broad pattern class.
    pub pattern_type: PatternType,
    /// Specific pattern name, e.g. `"critical_error"`.
    pub pattern_name: String,
    /// Final confidence after base score, keyword score, and bonuses.
    pub confidence: f64,
    /// Keywords whose substring was found in the lowercased input text.
    pub keywords_matched: Vec<String>,
    /// The pattern type's base score, before keyword/metadata contributions.
    pub base_score: f64,
    /// Sum of matched keyword weights.
    pub keyword_score: f64,
}

/// A durable pattern record, as projected by the pattern store over the
/// generic K/V store.
///
/// # Invariants
/// - `confidence` is in `[0.0, 1.0]`.
/// - `evidence_count >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Broad pattern class.
    pub pattern_type: String,
    /// Specific pattern name.
    pub pattern_name: String,
    /// Free-text summary of the evidence, searched by `search_patterns`.
    pub content: String,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Number of times this pattern has been observed.
    pub evidence_count: u32,
    /// When this record was written.
    pub timestamp: OffsetDateTime,
    /// Additional structured metadata, e.g. matched keywords or scores.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
