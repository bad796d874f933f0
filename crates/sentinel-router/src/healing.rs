// crates/sentinel-router/src/healing.rs
// ============================================================================
// Module: healing
// Description: The healing trigger's cooldown, pattern-lookup, and
//              learning helpers.
// Purpose: Keep the cooldown map's pure logic and the pattern-store
//          interactions testable apart from the dispatch loop in
//          `router.rs`.
// Dependencies: sentinel-core, sentinel-patterns, time
// ============================================================================

use std::collections::HashMap;

use sentinel_core::PatternRecord;
use sentinel_patterns::PatternStore;
use time::OffsetDateTime;

use crate::error::RouterError;
use crate::event::RouterEvent;
use crate::executor::HealingExecutor;

/// Pattern type recorded for learned error fixes.
const ERROR_FIX_TYPE: &str = "error_fix";

/// Confidence nudge applied to an applied pattern on a successful fix.
const SUCCESS_NUDGE: f64 = 0.05;

/// Confidence nudge applied to an applied pattern on a failed fix.
const FAILURE_NUDGE: f64 = 0.1;

/// Result of one healing attempt.
#[derive(Debug, Clone)]
pub struct HealingResult {
    /// Whether the fix was applied and verified.
    pub success: bool,
    /// Whether the attempt was skipped entirely (cooldown).
    pub skipped: bool,
    /// Human-readable reason, set on skip or failure.
    pub reason: Option<String>,
    /// The pattern key applied, if any; `None` on a generic attempt.
    pub pattern_used: Option<String>,
}

impl HealingResult {
    /// A skipped-for-cooldown result.
    #[must_use]
    pub fn cooldown() -> Self {
        Self {
            success: false,
            skipped: true,
            reason: Some("cooldown".to_owned()),
            pattern_used: None,
        }
    }
}

/// Whether `key`'s last healing attempt in `cooldown` is still within
/// `cooldown_minutes` of `now`.
#[must_use]
pub fn in_cooldown(cooldown: &HashMap<String, OffsetDateTime>, key: &str, cooldown_minutes: u64, now: OffsetDateTime) -> bool {
    let Some(last_attempt) = cooldown.get(key) else {
        return false;
    };
    let window = time::Duration::minutes(i64::try_from(cooldown_minutes).unwrap_or(i64::MAX));
    now - *last_attempt < window
}

/// Finds the highest-confidence `error_fix` pattern tagged with
/// `error_type`, if any.
///
/// # Errors
/// Returns [`RouterError::Pattern`] if the search itself fails.
pub async fn find_pattern_for_error(patterns: &PatternStore, error_type: &str) -> Result<Option<PatternRecord>, RouterError> {
    let candidates = patterns.search_patterns(Some(ERROR_FIX_TYPE), None, None, None).await?;
    Ok(candidates.into_iter().find(|candidate| candidate.metadata.get("error_type").and_then(serde_json::Value::as_str) == Some(error_type)))
}

/// Applies a known pattern to `event` via `executor`, then re-stores the
/// pattern with its confidence nudged toward the outcome (the append-only
/// store has no in-place update, so learning is a fresh evidence row).
///
/// # Errors
/// Returns [`RouterError::Pattern`] if recording the updated evidence fails.
pub async fn apply_pattern(
    executor: &dyn HealingExecutor,
    patterns: &PatternStore,
    pattern: &PatternRecord,
    event: &RouterEvent,
) -> Result<HealingResult, RouterError> {
    let success = fix_via_executor(executor, event).await;
    record_outcome(patterns, pattern, success).await?;

    Ok(HealingResult {
        success,
        skipped: false,
        reason: Some(if success { "pattern applied successfully".to_owned() } else { "pattern application failed".to_owned() }),
        pattern_used: Some(pattern.pattern_name.clone()),
    })
}

/// Attempts a fix with no known pattern to guide it; the outcome is not
/// learned from.
pub async fn attempt_generic_healing(executor: &dyn HealingExecutor, event: &RouterEvent) -> HealingResult {
    let success = fix_via_executor(executor, event).await;
    HealingResult {
        success,
        skipped: false,
        reason: Some(if success { "generic healing applied".to_owned() } else { "generic healing failed".to_owned() }),
        pattern_used: None,
    }
}

/// Delegates the actual fix to the external executor.
async fn fix_via_executor(executor: &dyn HealingExecutor, event: &RouterEvent) -> bool {
    let file = event.source_file.as_deref().unwrap_or("unknown");
    let line = event.line.unwrap_or(0);
    let error_type = event.error_type.as_deref().unwrap_or(&event.event_type);
    executor.fix(file, line, error_type, &event.message).await
}

/// Re-stores `pattern` with its confidence nudged toward `success` and its
/// evidence count incremented.
async fn record_outcome(patterns: &PatternStore, pattern: &PatternRecord, success: bool) -> Result<(), RouterError> {
    let nudge = if success { SUCCESS_NUDGE } else { -FAILURE_NUDGE };
    let confidence = (pattern.confidence + nudge).clamp(0.0, 1.0);
    patterns
        .store_pattern(
            pattern.pattern_type.clone(),
            pattern.pattern_name.clone(),
            pattern.content.clone(),
            confidence,
            Some(pattern.metadata.clone()),
            pattern.evidence_count + 1,
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_attempt_within_the_window_is_in_cooldown() {
        let mut cooldown = HashMap::new();
        let now = OffsetDateTime::now_utc();
        cooldown.insert("E:f".to_owned(), now);
        assert!(in_cooldown(&cooldown, "E:f", 5, now + time::Duration::minutes(2)));
    }

    #[test]
    fn an_attempt_past_the_window_is_not_in_cooldown() {
        let mut cooldown = HashMap::new();
        let now = OffsetDateTime::now_utc();
        cooldown.insert("E:f".to_owned(), now);
        assert!(!in_cooldown(&cooldown, "E:f", 5, now + time::Duration::minutes(6)));
    }

    #[test]
    fn an_unseen_key_is_never_in_cooldown() {
        let cooldown = HashMap::new();
        assert!(!in_cooldown(&cooldown, "E:f", 5, OffsetDateTime::now_utc()));
    }
}
