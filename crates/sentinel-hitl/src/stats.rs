// crates/sentinel-hitl/src/stats.rs
// ============================================================================
// Module: HitlStats
// Description: Aggregate counters over the `hitl_questions` table.
// Purpose: Cheap operational visibility into the question backlog without
//          a separate metrics pipeline.
// Dependencies: serde
// ============================================================================

use serde::Serialize;

/// Snapshot returned by [`crate::HitlProtocol::get_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct HitlStats {
    /// Total rows in the table, across every status.
    pub total_questions: u64,
    /// Rows currently awaiting an answer.
    pub pending: u64,
    /// Rows that received a response before expiring.
    pub answered: u64,
    /// Rows whose `expires_at` passed with no response.
    pub expired: u64,
    /// `answered / (answered + expired)`, or `0.0` when neither has happened yet.
    pub acceptance_rate: f64,
}
