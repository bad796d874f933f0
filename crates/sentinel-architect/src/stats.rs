// crates/sentinel-architect/src/stats.rs
// ============================================================================
// Module: ArchitectStats
// Description: Per-instance counters accumulated across the planning loop.
// Purpose: Cheap operational visibility into plan volume, document
//          generation, and engine escalation.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// Snapshot returned by [`crate::Architect::get_stats`].
///
/// ARCHITECT carries no state across signals beyond these counters and the
/// workspace directory used as per-signal scratch space.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchitectStats {
    /// Signals that completed the 10-step cycle, whether or not planning
    /// succeeded.
    pub signals_processed: u64,
    /// Strategies for which a spec document was generated.
    pub specs_generated: u64,
    /// Strategies for which an ADR document was also generated.
    pub adrs_generated: u64,
    /// Total `TaskSpec`s produced across every plan.
    pub tasks_created: u64,
    /// Times engine selection escalated to `gpt-5` or `claude-4.1`.
    pub escalations: u64,
    /// Plans that failed self-verification or hit a storage/bus error.
    pub planning_failures: u64,
}
