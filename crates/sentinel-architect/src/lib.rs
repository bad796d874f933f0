// crates/sentinel-architect/src/lib.rs
// ============================================================================
// Crate: sentinel-architect
// Description: ARCHITECT, the cognition agent: plans a verified task
//              DAG from each Signal WITNESS publishes.
// Purpose: Turn a classified Signal into a reasoning-engine-escalated,
//          self-verified set of TaskSpecs, with a spec/ADR paper trail for
//          anything complex or architectural.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-patterns, serde_json, thiserror, time, tokio,
//               tokio-stream, tracing, uuid
// ============================================================================

//! ARCHITECT's 10-step per-signal planning loop.
//!
//! [`Architect::run`] drives LISTEN through RESET for each [`Signal`][sig]
//! published to its input queue: gathers historical pattern context,
//! assesses complexity, selects a reasoning engine, formulates a strategy
//! (optionally generating a spec and/or ADR), externalizes it to a
//! workspace scratch file, generates and self-verifies a 3-task plan, and
//! publishes it. Planning failures are reported to telemetry rather than
//! propagated; the originating message is always acknowledged.
//!
//! [sig]: sentinel_core::Signal

mod architect;
mod complexity;
mod documents;
mod error;
mod plan;
mod stats;

pub use architect::Architect;
pub use error::ArchitectError;
pub use stats::ArchitectStats;
