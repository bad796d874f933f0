// crates/sentinel-router/src/lib.rs
// ============================================================================
// Crate: sentinel-router
// Description: The event router and healing trigger: an optional fast
//              path for error-like events that should be auto-healed.
// Purpose: Route raw bus events to a pattern-match fast path, a
//          type-dispatched handler, or an unhandled-event log line, and
//          drive autonomous healing with a cooldown against re-fire loops.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-patterns, async-trait, serde_json, thiserror, time,
//               tokio, tokio-stream, tracing
// ============================================================================

//! The event router and healing trigger.
//!
//! [`Router::route`] implements the three-step decision tree: a
//! pattern-match fast path (weighted score `similarity × confidence` above
//! a threshold), event-type dispatch for `error_detected`/`test_failure`/
//! `file_modified`/`file_created`/`pattern_matched`, and an unhandled-event
//! fallback. Error-shaped events are handed to the healing trigger, which
//! enforces a cooldown keyed by `(error_type, source_file)`, looks up a
//! known fix pattern, delegates the fix to an external [`HealingExecutor`],
//! and learns from the outcome.

mod error;
mod event;
mod executor;
mod healing;
mod router;
mod similarity;
mod stats;

pub use error::RouterError;
pub use event::EventKind;
pub use event::RouterEvent;
pub use executor::HealingExecutor;
pub use executor::NoopHealingExecutor;
pub use healing::HealingResult;
pub use router::RouteOutcome;
pub use router::Router;
pub use stats::RouterStats;
