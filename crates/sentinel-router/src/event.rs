// crates/sentinel-router/src/event.rs
// ============================================================================
// Module: event
// Description: Parses a raw bus payload into the fields routing decisions
//              need.
// Purpose: Keep the loose JSON-shape probing isolated from the dispatch
//          tree in `router.rs`, the same division `sentinel-witness::classify`
//          draws for its own CLASSIFY step.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;

/// One of the five event types the dispatch tree recognizes by name;
/// anything else falls through to the unhandled branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `error_detected`: drives the healing trigger directly.
    ErrorDetected,
    /// `test_failure`: healed only if it also carries an `error_type`.
    TestFailure,
    /// `file_modified` or `file_created`: observed, never healed.
    FileChanged,
    /// `pattern_matched`: an upstream caller already flagged a pattern;
    /// re-resolved against the store without the fast-path threshold.
    PatternMatched,
    /// Anything else.
    Other,
}

impl EventKind {
    /// Classifies the raw `event_type` string.
    #[must_use]
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "error_detected" => Self::ErrorDetected,
            "test_failure" => Self::TestFailure,
            "file_modified" | "file_created" => Self::FileChanged,
            "pattern_matched" => Self::PatternMatched,
            _ => Self::Other,
        }
    }
}

/// A raw router-input event, parsed out of a bus [`serde_json::Value`]
/// payload.
#[derive(Debug, Clone)]
pub struct RouterEvent {
    /// The literal `event_type` field, kept for logging.
    pub event_type: String,
    /// The event's dispatch-tree classification.
    pub kind: EventKind,
    /// `error_type`, when present (drives cooldown keys and pattern lookup).
    pub error_type: Option<String>,
    /// `source_file`, falling back to `path`, when present.
    pub source_file: Option<String>,
    /// `line` or `line_number`, when present.
    pub line: Option<u32>,
    /// `message`, falling back to `text`, defaulting to the empty string.
    pub message: String,
    /// The full payload, kept for semantic similarity scoring and for
    /// echoing into telemetry.
    pub metadata: serde_json::Map<String, Value>,
}

impl RouterEvent {
    /// Parses `payload` into a [`RouterEvent`].
    ///
    /// Returns `None` if `payload` is not a JSON object or carries no
    /// `event_type` string; both are treated as malformed input rather
    /// than routed as [`EventKind::Other`].
    #[must_use]
    pub fn parse(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        let event_type = object.get("event_type")?.as_str()?.to_owned();
        let kind = EventKind::classify(&event_type);

        let error_type = string_field(object, "error_type");
        let source_file = string_field(object, "source_file").or_else(|| string_field(object, "path"));
        let line = object
            .get("line")
            .or_else(|| object.get("line_number"))
            .and_then(Value::as_u64)
            .map(|value| u32::try_from(value).unwrap_or(u32::MAX));
        let message = string_field(object, "message").or_else(|| string_field(object, "text")).unwrap_or_default();

        Some(Self {
            event_type,
            kind,
            error_type,
            source_file,
            line,
            message,
            metadata: object.clone(),
        })
    }

    /// The cooldown-map key: `"{error_type}:{source_file or unknown}"`.
    #[must_use]
    pub fn cooldown_key(&self) -> String {
        let error_type = self.error_type.as_deref().unwrap_or("unknown");
        let source_file = self.source_file.as_deref().unwrap_or("unknown");
        format!("{error_type}:{source_file}")
    }
}

/// Reads `key` off `object` as an owned, non-empty string.
fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    let text = object.get(key)?.as_str()?;
    (!text.trim().is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_error_detected_with_full_fields() {
        let payload = serde_json::json!({
            "event_type": "error_detected",
            "error_type": "NullPointerException",
            "source_file": "src/main.rs",
            "line": 42,
            "message": "boom"
        });
        let event = RouterEvent::parse(&payload).expect("parses");
        assert_eq!(event.kind, EventKind::ErrorDetected);
        assert_eq!(event.error_type.as_deref(), Some("NullPointerException"));
        assert_eq!(event.source_file.as_deref(), Some("src/main.rs"));
        assert_eq!(event.line, Some(42));
        assert_eq!(event.cooldown_key(), "NullPointerException:src/main.rs");
    }

    #[test]
    fn cooldown_key_falls_back_to_unknown() {
        let payload = serde_json::json!({"event_type": "error_detected"});
        let event = RouterEvent::parse(&payload).expect("parses");
        assert_eq!(event.cooldown_key(), "unknown:unknown");
    }

    #[test]
    fn unrecognized_event_type_is_other() {
        let payload = serde_json::json!({"event_type": "deploy_started"});
        let event = RouterEvent::parse(&payload).expect("parses");
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn missing_event_type_fails_to_parse() {
        let payload = serde_json::json!({"message": "no type here"});
        assert!(RouterEvent::parse(&payload).is_none());
    }

    #[test]
    fn path_is_accepted_in_place_of_source_file() {
        let payload = serde_json::json!({"event_type": "file_modified", "path": "src/lib.rs"});
        let event = RouterEvent::parse(&payload).expect("parses");
        assert_eq!(event.source_file.as_deref(), Some("src/lib.rs"));
    }
}
