// crates/sentinel-architect/src/documents.rs
// ============================================================================
// Module: documents
// Description: Markdown templates for ARCHITECT's spec/ADR/strategy
//              scratch artifacts.
// Purpose: Keep the human-readable document text out of the loop body; none
//          of this is consumed downstream, only written for audit.
// Dependencies: sentinel-core, time
// ============================================================================

use sentinel_core::PatternRecord;
use sentinel_core::Signal;
use sentinel_core::Strategy;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Returns `true` if `signal` calls for an Architecture Decision Record in
/// addition to a spec: either WITNESS recorded `"architecture"` among its
/// matched keywords, or the pattern itself is `constitutional_violation`.
#[must_use]
pub fn is_architectural(signal: &Signal) -> bool {
    let keywords_mention_architecture = signal
        .data
        .get("keywords_matched")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|values| values.iter().any(|value| value.as_str() == Some("architecture")));
    keywords_mention_architecture || signal.pattern == "constitutional_violation"
}

/// Builds the formal specification document for a complex strategy.
#[must_use]
pub fn generate_spec(signal: &Signal, historical: &[PatternRecord], correlation_id: &str) -> String {
    let pattern_title = title_case(&signal.pattern);
    let context_message = signal.data.get("message").and_then(serde_json::Value::as_str).unwrap_or("No additional context");
    let historical_text = format_historical_patterns(historical);
    let created = today();

    format!(
        "# Spec: {pattern_title}\n\n\
         **ID**: spec-{correlation_id}\n\
         **Status**: Draft\n\
         **Created**: {created}\n\n\
         ## Goal\n\
         Address {pattern} pattern detected in the system.\n\n\
         ## Context\n\
         {context_message}\n\n\
         ## Non-Goals\n\
         - This spec does not cover unrelated patterns\n\
         - Performance optimization out of scope unless explicitly needed\n\n\
         ## Acceptance Criteria\n\
         - [ ] Implementation addresses root cause\n\
         - [ ] All generated tests pass\n\
         - [ ] Pattern no longer detected post-fix\n\n\
         ## Implementation Notes\n\
         Based on historical patterns:\n\
         {historical_text}\n\n\
         ## Related\n\
         - Pattern: {pattern}\n\
         - Source id: {source_id}\n",
        pattern = signal.pattern,
        source_id = signal.source_id,
    )
}

/// Builds an Architecture Decision Record for an architectural strategy.
#[must_use]
pub fn generate_adr(signal: &Signal) -> String {
    let pattern_title = title_case(&signal.pattern);
    let context_message = signal
        .data
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("Architectural decision required");
    let created = today();
    let article = infer_article(&signal.pattern);
    let success_rate = estimated_success_rate();

    format!(
        "# ADR: {pattern_title}\n\n\
         **Status**: Proposed\n\
         **Date**: {created}\n\
         **Context**: {context_message}\n\n\
         ## Decision\n\
         Implement a solution for the {pattern} pattern.\n\n\
         ## Rationale\n\
         - Addresses Article {article} of the governing design constraints\n\
         - Historical success rate of similar fixes: {success_rate}%\n\
         - Risk mitigation\n\n\
         ## Consequences\n\
         **Positive**:\n\
         - Improved system quality\n\
         - Reduced technical debt\n\n\
         **Negative**:\n\
         - Implementation time required\n\
         - Potential short-term complexity increase\n\n\
         ## Alternatives Considered\n\
         1. Do nothing - rejected\n\
         2. Minimal fix - rejected (technical debt accumulation)\n\
         3. Comprehensive solution - **selected**\n",
        pattern = signal.pattern,
    )
}

/// Builds the audit-only strategy scratch file content written in
/// EXTERNALIZE and deleted in RESET.
#[must_use]
pub fn build_strategy_content(correlation_id: &str, strategy: &Strategy) -> String {
    let mut content = format!(
        "# Strategy: {correlation_id}\n\n\
         ## Engine\n\
         {engine}\n\n\
         ## Complexity\n\
         {complexity:.2}\n\n\
         ## Decision\n\
         {decision}\n\n\
         ## Spec Generated\n\
         {spec_generated}\n\n\
         ## ADR Generated\n\
         {adr_generated}\n\n\
         ## Task Graph\n",
        engine = strategy.engine,
        complexity = strategy.complexity,
        decision = strategy.decision,
        spec_generated = if strategy.spec_content.is_some() { "Yes" } else { "No" },
        adr_generated = if strategy.adr_content.is_some() { "Yes" } else { "No" },
    );
    for task in &strategy.tasks {
        content.push_str(&format!("- {}: {:?} ({})\n", task.task_id, task.task_type, task.sub_agent));
        if !task.dependencies.is_empty() {
            let deps: Vec<String> = task.dependencies.iter().map(ToString::to_string).collect();
            content.push_str(&format!("  Dependencies: {}\n", deps.join(", ")));
        }
    }
    content
}

/// Formats up to 3 historical patterns for inclusion in a spec document.
fn format_historical_patterns(historical: &[PatternRecord]) -> String {
    if historical.is_empty() {
        return "No historical patterns found.".to_owned();
    }
    historical
        .iter()
        .take(3)
        .map(|record| format!("- {}: confidence={:.2}, seen={} times", record.pattern_name, record.confidence, record.evidence_count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `pattern_name` as title case for document headings.
fn title_case(pattern_name: &str) -> String {
    pattern_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| first.to_uppercase().collect::<String>() + chars.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Infers a governing-article label from the pattern name, purely for the
/// ADR's rationale section; carries no enforcement weight.
fn infer_article(pattern: &str) -> &'static str {
    if pattern.contains("test") {
        "II"
    } else if pattern.contains("context") {
        "I"
    } else if pattern.contains("learning") {
        "IV"
    } else {
        "V"
    }
}

/// Placeholder historical success-rate estimate until the pattern store
/// carries enough fix-outcome history to compute one per pattern.
const fn estimated_success_rate() -> u32 {
    85
}

/// Today's timestamp in RFC 3339, for document headers.
fn today() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "unknown-date".to_owned())
}
