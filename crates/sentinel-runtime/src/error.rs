// crates/sentinel-runtime/src/error.rs
// ============================================================================
// Module: error
// Description: Failure opening the system at wiring time.
// Purpose: Wrap every collaborator's open-time error into one type so
//          `System::open` never returns a partially-open system.
// Dependencies: sentinel-bus, sentinel-hitl, sentinel-store, thiserror
// ============================================================================

use thiserror::Error;

/// Failure constructing a [`crate::System`].
#[derive(Debug, Error)]
pub enum SystemError {
    /// The K/V store could not be opened.
    #[error(transparent)]
    Store(#[from] sentinel_store::StoreError),
    /// The message bus could not be opened.
    #[error(transparent)]
    Bus(#[from] sentinel_bus::BusError),
    /// The HITL question table could not be opened.
    #[error(transparent)]
    Hitl(#[from] sentinel_hitl::HitlError),
    /// The data directory could not be created.
    #[error("data directory could not be prepared: {0}")]
    Io(String),
}
