// crates/sentinel-core/src/hitl.rs
// ============================================================================
// Module: HITL Question/Response
// Description: The durable question lifecycle shared by the HITL protocol
//              and its mirror messages on the bus.
// Purpose: Give `ask_async`/`wait_response`/`submit_response` one shared
//          question shape with the terminal-state invariants encoded in
//          the `HitlStatus` enum.
// Dependencies: serde, time, sentinel-core::ids
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ids::QuestionId;

/// Lifecycle state of a HITL question.
///
/// # Invariants
/// - Once `Answered` or `Expired`, the status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitlStatus {
    /// Awaiting a response; still before `expires_at`.
    Pending,
    /// Answered; terminal.
    Answered,
    /// Expired unanswered; terminal.
    Expired,
}

/// A human-in-the-loop question, persisted across restarts.
///
/// # Invariants
/// - `status = Answered` implies `response` and `answered_at` are `Some`.
/// - `status = Expired` implies `now >= expires_at` and `response` is
///   `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlQuestion {
    /// Unique identifier, generated as a UUIDv4 string.
    pub question_id: QuestionId,
    /// The question text shown to the human.
    pub question: String,
    /// Free-form string context accompanying the question.
    pub context: BTreeMap<String, String>,
    /// Suggested answers; empty means free-form.
    pub options: Vec<String>,
    /// How long this question may remain pending, in seconds.
    pub timeout_seconds: u64,
    /// When this question was asked.
    pub created_at: OffsetDateTime,
    /// `created_at + timeout_seconds`.
    pub expires_at: OffsetDateTime,
    /// Current lifecycle state.
    pub status: HitlStatus,
    /// The submitted answer, if any.
    pub response: Option<String>,
    /// When the answer was submitted, if it has been.
    pub answered_at: Option<OffsetDateTime>,
}

/// The response to a HITL question, delivered to a waiting caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlResponse {
    /// Identifier of the question this responds to.
    pub question_id: QuestionId,
    /// The submitted answer text.
    pub answer: String,
    /// When the answer was submitted.
    pub answered_at: OffsetDateTime,
}

impl HitlResponse {
    /// Parses this response as a yes/no approval, case-insensitively.
    ///
    /// `yes|y|true|1` is approval, anything else is a decline.
    #[must_use]
    pub fn is_approval(&self) -> bool {
        matches!(
            self.answer.trim().to_ascii_lowercase().as_str(),
            "yes" | "y" | "true" | "1"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(answer: &str) -> HitlResponse {
        HitlResponse {
            question_id: QuestionId::new("q-1"),
            answer: answer.to_owned(),
            answered_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn recognizes_affirmative_variants() {
        for answer in ["yes", "Y", "TRUE", "1", "  yes  "] {
            assert!(response(answer).is_approval(), "expected {answer} to approve");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for answer in ["no", "n", "false", "0", "maybe"] {
            assert!(!response(answer).is_approval(), "expected {answer} to decline");
        }
    }
}
