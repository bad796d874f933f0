// crates/sentinel-router/src/stats.rs
// ============================================================================
// Module: RouterStats
// Description: Per-instance counters accumulated across the routing loop.
// Purpose: Cheap operational visibility into dispatch volume and healing
//          outcomes.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// Snapshot returned by [`crate::Router::get_stats`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouterStats {
    /// Events seen on the input queue.
    pub events_seen: u64,
    /// Events dispatched via the pattern-match fast path.
    pub pattern_dispatched: u64,
    /// Events dispatched to the healing trigger (`error_detected`, or a
    /// `test_failure` carrying an `error_type`).
    pub healing_attempted: u64,
    /// Healing attempts that succeeded.
    pub healing_succeeded: u64,
    /// Healing attempts skipped because the error's cooldown key was hot.
    pub healing_skipped_cooldown: u64,
    /// Healing attempts that ran but did not succeed.
    pub healing_failed: u64,
    /// `file_modified`/`file_created` events handled by the change branch.
    pub changes_observed: u64,
    /// Events that matched no pattern, type, or fallback branch.
    pub unhandled: u64,
}
