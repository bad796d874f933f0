// crates/sentinel-bus/src/stats.rs
// ============================================================================
// Module: BusStats
// Description: The summary returned by `get_stats`.
// Purpose: Give operators and tests one shape for bus-wide health, combining
//          durable row counts with the live in-process subscriber registry.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

/// Summary counters over the message bus's durable storage and live
/// subscriber registry.
#[derive(Debug, Clone, Serialize)]
pub struct BusStats {
    /// Total rows ever published, regardless of status.
    pub total_messages: usize,
    /// Row count per lifecycle status (`"pending"` / `"processed"`).
    pub by_status: BTreeMap<String, usize>,
    /// Row count per queue, broken down by status.
    pub by_queue: BTreeMap<String, BTreeMap<String, usize>>,
    /// Number of currently-live subscribers per queue.
    pub active_subscribers: BTreeMap<String, usize>,
}
