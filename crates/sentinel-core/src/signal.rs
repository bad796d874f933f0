// crates/sentinel-core/src/signal.rs
// ============================================================================
// Module: Signal
// Description: The validated, classified event WITNESS publishes and
//              ARCHITECT consumes.
// Purpose: Replace an untyped dict payload with a single checked type so
//          `Signal` invariants are enforced at construction, not
//          re-derived by every consumer.
// Dependencies: serde, serde_json, time, sentinel-core::{ids, urgency}
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ids::CorrelationId;
use crate::ids::SourceId;
use crate::urgency::Urgency;

/// Which input stream a `Signal` originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// From the `telemetry_stream` queue.
    Telemetry,
    /// From the `personal_context_stream` queue.
    PersonalContext,
}

/// A validated, classified event, produced by WITNESS and consumed by
/// ARCHITECT.
///
/// # Invariants
/// - `confidence` is in `[0.7, 1.0]`.
/// - `summary` is at most 120 UTF-8 characters.
/// - The JSON-serialized form round-trips (enforced by `serde_json::Value`
///   as the `data` field type rather than an opaque blob).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Urgency derived from the pattern match that produced this signal.
    pub priority: Urgency,
    /// Which input stream this signal originated from.
    pub source: SignalSource,
    /// The pattern name the detector matched, e.g. `"critical_error"`.
    pub pattern: String,
    /// Confidence carried over from the pattern match, in `[0.7, 1.0]`.
    pub confidence: f64,
    /// Extracted metadata: pattern type, matched keywords, score
    /// components, plus any metadata carried on the originating event.
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Human-readable summary, truncated to at most 120 characters.
    pub summary: String,
    /// When this signal was enriched.
    pub timestamp: OffsetDateTime,
    /// Identifier of the originating event.
    pub source_id: SourceId,
    /// Workflow correlation tag, propagated from the originating event.
    pub correlation_id: Option<CorrelationId>,
}

impl Signal {
    /// Checks the invariants a `Signal` must satisfy before it may be
    /// published (the agent's SELF-VERIFY step).
    ///
    /// Returns `false` rather than an error type: verification failure is
    /// not propagated to the caller, it causes the agent to drop and log.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let confidence_in_range = (0.7..=1.0).contains(&self.confidence);
        let summary_in_bounds = self.summary.chars().count() <= 120;
        !self.pattern.is_empty() && confidence_in_range && summary_in_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(confidence: f64, summary: &str) -> Signal {
        Signal {
            priority: Urgency::Normal,
            source: SignalSource::Telemetry,
            pattern: "critical_error".to_owned(),
            confidence,
            data: serde_json::Map::new(),
            summary: summary.to_owned(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            source_id: SourceId::Text("evt-1".to_owned()),
            correlation_id: None,
        }
    }

    #[test]
    fn rejects_confidence_below_floor() {
        assert!(!sample(0.5, "short").is_valid());
    }

    #[test]
    fn rejects_summary_over_120_chars() {
        let long = "x".repeat(121);
        assert!(!sample(0.9, &long).is_valid());
    }

    #[test]
    fn accepts_boundary_values() {
        let exact = "x".repeat(120);
        assert!(sample(0.7, &exact).is_valid());
        assert!(sample(1.0, &exact).is_valid());
    }
}
