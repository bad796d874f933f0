// crates/sentinel-witness/src/error.rs
// ============================================================================
// Module: WitnessError
// Description: The failure modes of WITNESS's startup and per-event paths.
// Purpose: Distinguish the startup failures that abort `run` from the
//          per-event failures that are caught and logged instead.
// Dependencies: thiserror, sentinel-bus, sentinel-patterns
// ============================================================================

use thiserror::Error;

/// Failure returned by [`crate::Witness`].
///
/// Only [`WitnessError::Bus`] subscription failures at startup abort
/// [`crate::Witness::run`]; every other variant is surfaced per event, to a
/// caught-and-logged call site, never to `run`'s caller.
#[derive(Debug, Error)]
pub enum WitnessError {
    /// The message bus reported a failure subscribing, publishing, or
    /// reading pending counts.
    #[error(transparent)]
    Bus(#[from] sentinel_bus::BusError),
    /// The pattern store reported a failure persisting a matched pattern.
    #[error(transparent)]
    Pattern(#[from] sentinel_patterns::PatternStoreError),
    /// A `Signal` could not be serialized for publication.
    #[error("signal serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
