// crates/sentinel-bus/src/error.rs
// ============================================================================
// Module: BusError
// Description: The failure modes of the message bus's public operations.
// Purpose: Give every public method in `MessageBus` a single result type.
// Dependencies: thiserror, sentinel-core
// ============================================================================

use sentinel_core::ValidationError;
use thiserror::Error;

/// Failure returned by a [`crate::MessageBus`] operation.
#[derive(Debug, Error)]
pub enum BusError {
    /// Rejected input; no row was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The database file or its parent directory could not be prepared.
    #[error("bus io failure: {0}")]
    Io(String),
    /// The underlying SQLite engine reported a failure.
    #[error("bus engine failure: {0}")]
    Db(String),
    /// A stored row could not be decoded back into a [`sentinel_core::Message`].
    #[error("corrupted row {id}: {reason}")]
    Corrupt {
        /// Id of the offending row.
        id: i64,
        /// Description of the decode failure.
        reason: String,
    },
    /// The bus's internal lock was poisoned by a prior panic.
    #[error("bus lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for BusError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Db(err.to_string())
    }
}
