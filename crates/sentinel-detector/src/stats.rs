// crates/sentinel-detector/src/stats.rs
// ============================================================================
// Module: PatternStats
// Description: The summary returned by `PatternDetector::get_pattern_stats`.
// Purpose: Give callers a quick view of what this detector instance has
//          actually seen, for diagnostics and the adaptive-threshold story.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

/// Occurrence statistics accumulated by one [`crate::PatternDetector`] instance.
#[derive(Debug, Clone, Serialize)]
pub struct PatternStats {
    /// Sum of every pattern's occurrence count.
    pub total_detections: u32,
    /// Number of distinct pattern names ever detected.
    pub unique_patterns: usize,
    /// Occurrence count per pattern name.
    pub pattern_counts: BTreeMap<String, u32>,
    /// Up to 5 most-frequently-detected pattern names, highest count first.
    pub most_common: Vec<(String, u32)>,
}
