// crates/sentinel-hitl/src/lib.rs
// ============================================================================
// Crate: sentinel-hitl
// Description: Async human-in-the-loop question/response protocol.
// Purpose: Durable, restart-safe ask/wait/respond/expire lifecycle mirrored
//          onto the message bus, for ARCHITECT and external callers.
// Dependencies: rusqlite, tokio, uuid, sentinel-bus, sentinel-config,
//               sentinel-core
// ============================================================================

//! Async human-in-the-loop (HITL) question/response protocol.
//!
//! [`HitlProtocol`] persists questions in their own table on the same
//! engine as the K/V store, mirrors them onto a bus queue for external
//! observers, and resolves `wait_response` through a one-shot waiter that
//! `submit_response` fires.

mod engine;
mod error;
mod protocol;
mod stats;
mod waiters;

pub use error::HitlError;
pub use protocol::HitlProtocol;
pub use stats::HitlStats;
