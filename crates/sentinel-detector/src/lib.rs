// crates/sentinel-detector/src/lib.rs
// ============================================================================
// Crate: sentinel-detector
// Description: Keyword-weighted pattern detection with adaptive thresholds
//              and pluggable custom detectors.
// Purpose: Classify free-form event text fast and deterministically,
//          without an LLM call, for WITNESS and the event router.
// Dependencies: sentinel-core, serde_json
// ============================================================================

//! Deterministic, keyword-weighted pattern detection.
//!
//! [`PatternDetector::detect`] is the single entry point: lowercase the
//! input, score it against the constant heuristics table, apply each
//! pattern's adaptive threshold, and return the best match if any clears
//! it. Custom detectors registered via
//! [`PatternDetector::register_detector`] are consulted by
//! [`PatternDetector::detect_with_custom`] alongside the built-ins.

mod detector;
mod heuristics;
mod stats;

pub use detector::CustomDetectorFn;
pub use detector::PatternDetector;
pub use stats::PatternStats;
