// crates/sentinel-detector/src/detector.rs
// ============================================================================
// Module: PatternDetector
// Description: Keyword-weighted pattern detection with per-instance
//              adaptive thresholds and pluggable custom detectors.
// Purpose: Classify free-form event text into a typed, confidence-scored
//          pattern without an LLM call, fast enough to run on every event.
// Dependencies: sentinel-core, serde_json
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;

use sentinel_core::PatternMatch;
use sentinel_core::PatternType;

use crate::heuristics::ADAPTIVE_THRESHOLDS;
use crate::heuristics::ADAPTIVE_THRESHOLD_FLOOR;
use crate::heuristics::HEURISTICS;
use crate::stats::PatternStats;

/// A custom detector function: `(text, metadata) -> Option<PatternMatch>`.
pub type CustomDetectorFn =
    dyn Fn(&str, Option<&serde_json::Map<String, serde_json::Value>>) -> Option<PatternMatch> + Send + Sync;

/// Keyword-weighted pattern detector with adaptive thresholds.
///
/// `detect` is side-effecting only in that a successful match increments
/// that pattern's occurrence counter, which may in turn relax the
/// threshold for later calls. Determinism holds per call, not across the
/// instance's lifetime.
pub struct PatternDetector {
    min_confidence: f64,
    pattern_history: Mutex<HashMap<String, u32>>,
    custom_detectors: Mutex<HashMap<String, Box<CustomDetectorFn>>>,
}

impl PatternDetector {
    /// Creates a detector with the given baseline `min_confidence`.
    #[must_use]
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence,
            pattern_history: Mutex::new(HashMap::new()),
            custom_detectors: Mutex::new(HashMap::new()),
        }
    }

    /// Detects the highest-confidence built-in pattern in `text`, or
    /// `None` if nothing clears the (possibly adaptively reduced)
    /// threshold.
    ///
    /// Empty or all-whitespace `text` always returns `None`.
    #[must_use]
    pub fn detect(
        &self,
        text: &str,
        metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Option<PatternMatch> {
        if text.trim().is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        let best = find_best_match(&lower, metadata)?;
        self.apply_adaptive_threshold(best)
    }

    /// Detects using both the built-in heuristics and every registered
    /// custom detector, returning the single highest-confidence match.
    #[must_use]
    pub fn detect_with_custom(
        &self,
        text: &str,
        metadata: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Option<PatternMatch> {
        let mut best = self.detect(text, metadata);
        let mut best_confidence = best.as_ref().map_or(0.0, |m| m.confidence);

        let custom_detectors = self.custom_detectors.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for detector in custom_detectors.values() {
            if let Some(candidate) = detector(text, metadata) {
                if candidate.confidence > best_confidence {
                    best_confidence = candidate.confidence;
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Registers (or replaces) a custom detector under `name`.
    pub fn register_detector(
        &self,
        name: impl Into<String>,
        detector: impl Fn(&str, Option<&serde_json::Map<String, serde_json::Value>>) -> Option<PatternMatch>
            + Send
            + Sync
            + 'static,
    ) {
        let mut custom_detectors = self.custom_detectors.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        custom_detectors.insert(name.into(), Box::new(detector));
    }

    /// Returns occurrence statistics accumulated so far by this instance.
    #[must_use]
    pub fn get_pattern_stats(&self) -> PatternStats {
        let history = self.pattern_history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let total_detections = history.values().sum();
        let pattern_counts: BTreeMap<String, u32> =
            history.iter().map(|(name, count)| (name.clone(), *count)).collect();

        let mut most_common: Vec<(String, u32)> = history.iter().map(|(name, count)| (name.clone(), *count)).collect();
        most_common.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
        most_common.truncate(5);

        PatternStats {
            total_detections,
            unique_patterns: history.len(),
            pattern_counts,
            most_common,
        }
    }

    /// Clears all accumulated occurrence history.
    pub fn reset_history(&self) {
        let mut history = self.pattern_history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        history.clear();
    }

    fn apply_adaptive_threshold(&self, candidate: PatternMatch) -> Option<PatternMatch> {
        let threshold = self.adaptive_threshold_for(&candidate.pattern_name);
        if candidate.confidence < threshold {
            return None;
        }
        let mut history = self.pattern_history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *history.entry(candidate.pattern_name.clone()).or_insert(0) += 1;
        Some(candidate)
    }

    fn adaptive_threshold_for(&self, pattern_name: &str) -> f64 {
        let Some(rule) = ADAPTIVE_THRESHOLDS.iter().find(|rule| rule.pattern_name == pattern_name) else {
            return self.min_confidence;
        };
        let history = self.pattern_history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let occurrences = history.get(pattern_name).copied().unwrap_or(0);
        if occurrences >= rule.min_occurrences {
            (self.min_confidence - rule.threshold_reduction).max(ADAPTIVE_THRESHOLD_FLOOR)
        } else {
            self.min_confidence
        }
    }
}

fn find_best_match(
    lower_text: &str,
    metadata: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Option<PatternMatch> {
    let mut best: Option<PatternMatch> = None;
    let mut best_confidence = 0.0_f64;

    for heuristic in HEURISTICS {
        let base_score = heuristic.pattern_type.base_confidence();
        let mut keyword_score = 0.0;
        let mut keywords_matched = Vec::new();
        for (keyword, weight) in heuristic.keywords {
            if lower_text.contains(keyword) {
                keyword_score += *weight;
                keywords_matched.push((*keyword).to_owned());
            }
        }

        let bonus = metadata.map_or(0.0, |metadata| metadata_bonus(heuristic.pattern_name, metadata));
        let confidence = (base_score + keyword_score + bonus).min(1.0);

        if confidence > best_confidence {
            best_confidence = confidence;
            best = Some(PatternMatch {
                pattern_type: heuristic.pattern_type,
                pattern_name: heuristic.pattern_name.to_owned(),
                confidence,
                keywords_matched,
                base_score,
                keyword_score,
            });
        }
    }

    best
}

fn metadata_bonus(pattern_name: &str, metadata: &serde_json::Map<String, serde_json::Value>) -> f64 {
    let mut bonus = 0.0;

    if let Some(error_type) = metadata.get("error_type").and_then(serde_json::Value::as_str) {
        let error_type = error_type.to_lowercase();
        if pattern_name == "critical_error" && matches!(error_type.as_str(), "fatal" | "modulenotfounderror") {
            bonus += 0.10;
        } else if pattern_name == "flaky_test" && error_type == "assertionerror" {
            bonus += 0.05;
        }
    }

    if let Some(file) = metadata.get("file").and_then(serde_json::Value::as_str) {
        if pattern_name == "missing_tests" && !file.to_lowercase().contains("test") {
            bonus += 0.05;
        }
    }

    if metadata.get("priority").and_then(serde_json::Value::as_str) == Some("CRITICAL") {
        bonus += 0.05;
    }

    bonus
}
