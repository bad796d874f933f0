// crates/sentinel-patterns/src/stats.rs
// ============================================================================
// Module: PatternStoreStats
// Description: The summary counters returned by `get_stats`.
// Purpose: Give callers a cheap health check over the underlying store
//          without forcing a full decode of every pattern record.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// Connection health as observed by the most recent `get_stats` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// The underlying store answered the probe query.
    Open,
}

/// Summary counters over the pattern store's backing K/V store.
#[derive(Debug, Clone, Serialize)]
pub struct PatternStoreStats {
    /// Total rows in the backing store, patterns and otherwise.
    pub total_entries: usize,
    /// Rows that decode as pattern records.
    pub total_patterns: usize,
    /// Health of the connection used to gather these counters.
    pub connection_state: ConnectionState,
}
