// crates/sentinel-router/src/error.rs
// ============================================================================
// Module: RouterError
// Description: The failure modes of the router's startup and per-event
//              paths.
// Purpose: Distinguish the startup failures that abort `run` from the
//          per-event routing/healing failures that are caught and logged.
// Dependencies: thiserror, sentinel-bus, sentinel-patterns
// ============================================================================

use thiserror::Error;

/// Failure returned by [`crate::Router`].
///
/// Only [`RouterError::Bus`] subscription failures at startup abort
/// [`crate::Router::run`]; every other variant is caught per event and
/// recorded in [`crate::RouterStats`] rather than propagated.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The message bus reported a failure subscribing, publishing, or
    /// acknowledging.
    #[error(transparent)]
    Bus(#[from] sentinel_bus::BusError),
    /// The pattern store reported a failure searching or recording evidence.
    #[error(transparent)]
    Pattern(#[from] sentinel_patterns::PatternStoreError),
    /// An event payload could not be deserialized or a result re-serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The event payload did not carry the fields routing requires.
    #[error("malformed event: {0}")]
    Malformed(String),
}
