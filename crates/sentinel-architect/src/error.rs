// crates/sentinel-architect/src/error.rs
// ============================================================================
// Module: ArchitectError
// Description: The failure modes of ARCHITECT's startup and per-signal
//              paths.
// Purpose: Distinguish the startup failures that abort `run` from the
//          per-signal plan failures caught and reported to telemetry.
// Dependencies: thiserror, sentinel-bus, sentinel-patterns
// ============================================================================

use thiserror::Error;

/// Failure returned by [`crate::Architect`].
///
/// Only [`ArchitectError::Bus`] subscription failures at startup abort
/// [`crate::Architect::run`]; every other variant is caught per signal,
/// reported to `telemetry_stream`, and the workspace scratch file is still
/// cleaned up.
#[derive(Debug, Error)]
pub enum ArchitectError {
    /// The message bus reported a failure subscribing, publishing, or
    /// acknowledging.
    #[error(transparent)]
    Bus(#[from] sentinel_bus::BusError),
    /// The pattern store reported a failure gathering historical context.
    #[error(transparent)]
    Pattern(#[from] sentinel_patterns::PatternStoreError),
    /// A `TaskSpec` or failure report could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The workspace scratch file could not be written, read, or deleted.
    #[error("workspace io failure: {0}")]
    Io(String),
    /// The generated task graph failed self-verification.
    #[error("plan verification failed: {0}")]
    Invalid(String),
}
