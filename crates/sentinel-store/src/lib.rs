// crates/sentinel-store/src/lib.rs
// ============================================================================
// Crate: sentinel-store
// Description: The persistent K/V store.
// Purpose: Durable, concurrent-safe storage of opaque structured values with
//          metadata and timestamps, on a SQLite engine: validated config
//          in, a single writer connection, a round-robin pool of readers.
// Dependencies: rusqlite, serde_json, time, tokio, tracing, sentinel-config,
//               sentinel-core
// ============================================================================

//! Persistent, thread-safe keyed storage of opaque structured values.
//!
//! [`KvStore`] is the store every other Sentinel component is built on: the
//! pattern store is a keyed projection over it, and the message bus and HITL
//! protocol each keep their own tables in a store of this shape.

mod error;
mod store;

pub use error::StoreError;
pub use store::KvStore;
