// crates/sentinel-patterns/src/error.rs
// ============================================================================
// Module: PatternStoreError
// Description: The failure modes of the pattern store's public operations.
// Purpose: Wrap the underlying K/V store's failures alongside validation
//          failures specific to pattern records.
// Dependencies: thiserror, sentinel-core, sentinel-store
// ============================================================================

use sentinel_core::ValidationError;
use sentinel_store::StoreError;
use thiserror::Error;

/// Failure returned by a [`crate::PatternStore`] operation.
#[derive(Debug, Error)]
pub enum PatternStoreError {
    /// Rejected input; no row was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The underlying K/V store reported a failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
