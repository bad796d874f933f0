// crates/sentinel-core/src/error.rs
// ============================================================================
// Module: Validation Error
// Description: The single input-validation error shared by the store, bus,
//              and HITL protocol.
// Purpose: Give every component the same `ValidationError` shape so callers
//          can match on it uniformly regardless of which crate raised it.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Rejected input that never reached a side-effecting operation.
///
/// Every owning crate's outer error type carries this via `#[from]`; a
/// `ValidationError` is always returned before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required string field was empty or all whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A value fell outside its documented bound.
    #[error("{field} must be {bound}, got {actual}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the allowed range.
        bound: &'static str,
        /// The rejected value, rendered for display.
        actual: String,
    },
    /// A payload was expected to be a structured mapping and was not.
    #[error("{field} must be a structured mapping")]
    NotAMapping {
        /// Name of the offending field.
        field: &'static str,
    },
}
