// crates/sentinel-hitl/src/error.rs
// ============================================================================
// Module: HitlError
// Description: The failure modes of the HITL protocol's public operations.
// Purpose: Distinguish validation, storage, and waiter-specific failures
//          (timeout, unknown question) with one result type.
// Dependencies: thiserror, sentinel-core, sentinel-bus
// ============================================================================

use sentinel_core::ValidationError;
use thiserror::Error;

/// Failure returned by a [`crate::HitlProtocol`] operation.
#[derive(Debug, Error)]
pub enum HitlError {
    /// Rejected input; no row was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The database file or its parent directory could not be prepared.
    #[error("hitl io failure: {0}")]
    Io(String),
    /// The underlying SQLite engine reported a failure.
    #[error("hitl engine failure: {0}")]
    Db(String),
    /// A stored row could not be decoded back into a [`sentinel_core::HitlQuestion`].
    #[error("corrupted question {question_id}: {reason}")]
    Corrupt {
        /// Id of the offending row.
        question_id: String,
        /// Description of the decode failure.
        reason: String,
    },
    /// No question exists with the given id.
    #[error("no such question: {0}")]
    NotFound(String),
    /// `wait_response` elapsed its timeout before an answer arrived.
    #[error("timed out waiting for a response")]
    Timeout,
    /// The protocol's internal lock was poisoned by a prior panic.
    #[error("hitl lock poisoned")]
    Poisoned,
    /// Publishing the mirror message to the bus failed.
    #[error(transparent)]
    Bus(#[from] sentinel_bus::BusError),
}

impl From<rusqlite::Error> for HitlError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Db(err.to_string())
    }
}
