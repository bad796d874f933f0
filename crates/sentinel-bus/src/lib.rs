// crates/sentinel-bus/src/lib.rs
// ============================================================================
// Crate: sentinel-bus
// Description: Durable pub/sub message bus.
// Purpose: Priority-ordered, multi-subscriber, restart-durable queues for
//          every agent and the HITL protocol to communicate over.
// Dependencies: rusqlite, tokio, tokio-stream, tracing, sentinel-core,
//               sentinel-config
// ============================================================================

//! Durable, priority-ordered, multi-subscriber message bus.
//!
//! [`MessageBus`] owns a `messages` table (durable, at-least-once delivery)
//! and an in-process subscriber registry (live fan-out, best effort). A
//! [`Subscription`] is the chained stream of the durable backlog drain
//! followed by the live feed.

mod bus;
mod engine;
mod error;
mod registry;
mod stats;
mod subscription;

pub use bus::MessageBus;
pub use error::BusError;
pub use stats::BusStats;
pub use subscription::Subscription;
