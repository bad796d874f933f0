// crates/sentinel-core/src/message.rs
// ============================================================================
// Module: Message
// Description: The durable envelope stored and delivered by the message bus.
// Purpose: Give bus rows, in-flight deliveries, and correlation lookups one
//          shared shape.
// Dependencies: serde, serde_json, time, sentinel-core::ids
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ids::CorrelationId;
use crate::ids::MessageId;

/// Lifecycle state of a durable message.
///
/// # Invariants
/// - `processed_at` on [`Message`] is set if and only if `status` is
///   [`MessageStatus::Processed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Durably stored, not yet acknowledged by any subscriber.
    Pending,
    /// Acknowledged; retained for audit and correlation lookups.
    Processed,
}

/// A durable row in the message bus.
///
/// # Invariants
/// - `(priority DESC, created_at ASC, id ASC)` is the canonical ordering
///   within a single `queue_name`.
/// - `processed_at` is `Some` exactly when `status` is
///   [`MessageStatus::Processed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Durable identifier, assigned on publish.
    pub id: MessageId,
    /// Name of the queue this message was published to.
    pub queue_name: String,
    /// Opaque structured payload, stored as JSON.
    pub payload: serde_json::Value,
    /// Signed priority; higher sorts first within the queue's backlog.
    pub priority: i64,
    /// Optional workflow correlation tag.
    pub correlation_id: Option<CorrelationId>,
    /// Timestamp this row was inserted.
    pub created_at: OffsetDateTime,
    /// Timestamp this row was acknowledged, if it has been.
    pub processed_at: Option<OffsetDateTime>,
    /// Current lifecycle state.
    pub status: MessageStatus,
}

impl Message {
    /// Returns `true` if this message has already been acknowledged.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(self.status, MessageStatus::Processed)
    }
}
