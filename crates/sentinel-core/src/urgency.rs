// crates/sentinel-core/src/urgency.rs
// ============================================================================
// Module: Urgency
// Description: The three-level urgency enum shared by Signal and TaskSpec.
// Purpose: Give WITNESS and ARCHITECT a single typed priority vocabulary and
//          a single place that maps it onto the bus's raw integer priority.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// Urgency level carried by a `Signal` and propagated onto every `TaskSpec`
/// generated from it.
///
/// # Invariants
/// - Ordered `Critical > High > Normal`; the bus priority mapping in
///   [`Urgency::bus_priority`] is the sole authority for translating this
///   into the message bus's raw integer priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    /// Routine signal; no escalation.
    Normal,
    /// Elevated signal; escalates ARCHITECT's engine selection.
    High,
    /// Immediate attention; highest bus priority and engine escalation.
    Critical,
}

impl Urgency {
    /// Maps this urgency onto the bus's raw integer priority.
    ///
    /// `Critical` maps to 10, `High` to 5, `Normal` to 0.
    #[must_use]
    pub const fn bus_priority(self) -> i64 {
        match self {
            Self::Critical => 10,
            Self::High => 5,
            Self::Normal => 0,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Normal => "NORMAL",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::Urgency;

    #[test]
    fn bus_priority_matches_reference_mapping() {
        assert_eq!(Urgency::Critical.bus_priority(), 10);
        assert_eq!(Urgency::High.bus_priority(), 5);
        assert_eq!(Urgency::Normal.bus_priority(), 0);
    }

    #[test]
    fn ordering_is_critical_high_normal() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Normal);
    }
}
