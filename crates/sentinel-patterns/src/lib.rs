// crates/sentinel-patterns/src/lib.rs
// ============================================================================
// Crate: sentinel-patterns
// Description: Pattern-shaped queries, layered over the K/V store.
// Purpose: Let the detector, WITNESS, ARCHITECT, and the router record and
//          recall recurring failures, opportunities, and fixes without a
//          second schema.
// Dependencies: sentinel-core, sentinel-store, serde_json, time, tracing
// ============================================================================

//! Pattern-shaped queries over the persistent K/V store.
//!
//! [`PatternStore`] recognizes a stored value as a pattern record purely by
//! the presence of a `pattern_type` field; every other row in the same
//! backing [`sentinel_store::KvStore`] is ignored by [`PatternStore::search_patterns`]
//! and [`PatternStore::get_stats`].

mod error;
mod stats;
mod store;

pub use error::PatternStoreError;
pub use stats::ConnectionState;
pub use stats::PatternStoreStats;
pub use store::PatternStore;
