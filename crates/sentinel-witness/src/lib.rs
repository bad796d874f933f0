// crates/sentinel-witness/src/lib.rs
// ============================================================================
// Crate: sentinel-witness
// Description: WITNESS, the perception agent.
// Purpose: Classify raw events from two input queues into validated
//          `Signal`s on one output queue, recording matched patterns as it
//          goes.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-detector, sentinel-patterns, tokio, tokio-stream
// ============================================================================

//! The WITNESS perception agent.
//!
//! [`Witness::run`] subscribes to the telemetry and personal-context
//! streams concurrently, and for each event runs CLASSIFY (via
//! [`sentinel_detector::PatternDetector`]), VALIDATE, ENRICH, SELF-VERIFY,
//! PUBLISH, and PERSIST (via [`sentinel_patterns::PatternStore`]). Every
//! per-event failure is caught and logged; only a startup subscription
//! failure aborts the loop.

mod classify;
mod error;
mod stats;
mod witness;

pub use error::WitnessError;
pub use stats::WitnessStats;
pub use witness::Witness;
