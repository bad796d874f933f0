// crates/sentinel-witness/src/stats.rs
// ============================================================================
// Module: WitnessStats
// Description: Per-instance counters accumulated across the event loop.
// Purpose: Cheap operational visibility into how much WITNESS is dropping
//          versus publishing, broken down by input queue.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

/// Snapshot returned by [`crate::Witness::get_stats`].
///
/// WITNESS carries no state across events beyond these counters and the
/// detector's own occurrence history; this is the entirety of its memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WitnessStats {
    /// Events received from either input queue, across the instance's
    /// lifetime.
    pub events_seen: u64,
    /// Events that reached CLASSIFY or VALIDATE and were discarded:
    /// unextractable text, no pattern match, or a failed self-verify.
    pub events_dropped: u64,
    /// Signals successfully published to the output queue.
    pub signals_published: u64,
    /// `events_seen`, broken down by the originating queue name.
    pub by_queue: BTreeMap<String, u64>,
}
