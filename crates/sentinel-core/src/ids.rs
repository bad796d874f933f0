// crates/sentinel-core/src/ids.rs
// ============================================================================
// Module: Sentinel Identifiers
// Description: Opaque identifiers shared across the message bus, stores, and
//              agents.
// Purpose: Give every cross-component reference a strongly typed, stable
//          wire form instead of passing raw strings or integers around.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers here are opaque and serialize as either a number or a string
//! on the wire, matching the shapes already used by the bus and stores. No
//! normalization is performed; callers own the content.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Durable message identifier, assigned by the bus on publish.
///
/// # Invariants
/// - Monotonically increasing within a single bus instance; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Creates a message identifier from a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque tag threading a logical workflow across queues.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Creates a new correlation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Durable key into the K/V store, shared by the generic store and the
/// pattern-store projection over it.
///
/// # Invariants
/// - Never empty; construction is rejected by the owning store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);

impl StoreKey {
    /// Creates a new store key without validating non-emptiness.
    ///
    /// Callers that need the non-empty invariant enforced should go through
    /// the store's `set` entry point, which validates before construction.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StoreKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StoreKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Unique identifier of a task node within an ARCHITECT plan DAG.
///
/// # Invariants
/// - Opaque UTF-8 string; conventionally `"<correlation_id>_code|test|merge"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new task identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Unique identifier of a HITL question.
///
/// # Invariants
/// - Generated as a UUIDv4 string by the owning protocol; opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates a new question identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QuestionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of the event that gave rise to a `Signal`.
///
/// Carried either as the bus's numeric `_message_id` or as a
/// caller-supplied string; both are valid and callers must not assume one
/// or the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    /// A caller-supplied opaque string identifier.
    Text(String),
    /// A bus-assigned numeric identifier.
    Numeric(i64),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => value.fmt(f),
            Self::Numeric(value) => value.fmt(f),
        }
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SourceId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}
