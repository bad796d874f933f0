// crates/sentinel-store/src/error.rs
// ============================================================================
// Module: StoreError
// Description: The failure modes of the K/V store's public operations.
// Purpose: Give every public method in `KvStore` a single result type; no
//          public operation panics on an I/O or validation failure.
// Dependencies: thiserror, sentinel-core
// ============================================================================

use sentinel_core::ValidationError;
use thiserror::Error;

/// Failure returned by a [`crate::KvStore`] operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected input; no side effect was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The database file or its parent directory could not be prepared.
    #[error("store io failure: {0}")]
    Io(String),
    /// The underlying SQLite engine reported a failure.
    #[error("store engine failure: {0}")]
    Db(String),
    /// A stored row could not be decoded back into its typed form.
    #[error("corrupted row for key {key}: {reason}")]
    Corrupt {
        /// Key of the offending row.
        key: String,
        /// Description of the decode failure.
        reason: String,
    },
    /// The store's internal lock was poisoned by a prior panic.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Db(err.to_string())
    }
}
