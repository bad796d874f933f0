// crates/sentinel-detector/src/heuristics.rs
// ============================================================================
// Module: pattern heuristics table
// Description: The constant keyword-weight table and adaptive-threshold
//              table driving pattern detection.
// Purpose: Keep detection deterministic and reproducible by carrying fixed
//          keyword weights in one fixed iteration order.
// Dependencies: sentinel-core
// ============================================================================

use sentinel_core::PatternType;

/// One named pattern's keyword weights within a [`PatternType`].
pub(crate) struct Heuristic {
    pub(crate) pattern_type: PatternType,
    pub(crate) pattern_name: &'static str,
    pub(crate) keywords: &'static [(&'static str, f64)],
}

/// The full heuristics table, in the fixed order that makes `detect`
/// deterministic for identical inputs.
pub(crate) static HEURISTICS: &[Heuristic] = &[
    Heuristic {
        pattern_type: PatternType::Failure,
        pattern_name: "critical_error",
        keywords: &[
            ("fatal", 0.25),
            ("crash", 0.25),
            ("modulenotfounderror", 0.25),
            ("importerror", 0.20),
            ("systemexit", 0.20),
            ("exception", 0.10),
            ("traceback", 0.10),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Failure,
        pattern_name: "performance_regression",
        keywords: &[
            ("timeout", 0.25),
            ("duration_s", 0.15),
            ("exceeded limit", 0.20),
            ("slow", 0.15),
            ("performance", 0.15),
            ("regression", 0.20),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Failure,
        pattern_name: "flaky_test",
        keywords: &[
            ("test failed", 0.20),
            ("assertionerror", 0.15),
            ("intermittent", 0.20),
            ("sometimes passes", 0.20),
            ("flaky", 0.25),
            ("non-deterministic", 0.15),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Failure,
        pattern_name: "integration_failure",
        keywords: &[
            ("api error", 0.20),
            ("connection refused", 0.25),
            ("firebase", 0.15),
            ("openai", 0.15),
            ("401", 0.20),
            ("403", 0.20),
            ("500", 0.20),
            ("503", 0.15),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Opportunity,
        pattern_name: "constitutional_violation",
        keywords: &[
            ("dict[any", 0.30),
            ("no-verify", 0.25),
            ("> 50 lines", 0.20),
            ("bypass", 0.25),
            ("skip test", 0.25),
            ("# type: ignore", 0.15),
            ("try/catch", 0.10),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Opportunity,
        pattern_name: "code_duplication",
        keywords: &[
            ("similar code", 0.25),
            ("repeated logic", 0.25),
            ("copy-paste", 0.20),
            ("dry violation", 0.25),
            ("duplicate", 0.20),
            ("repetition", 0.15),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Opportunity,
        pattern_name: "missing_tests",
        keywords: &[
            ("no tests", 0.30),
            ("untested", 0.25),
            ("coverage low", 0.20),
            ("0% coverage", 0.30),
            ("missing test", 0.25),
            ("test gap", 0.20),
        ],
    },
    Heuristic {
        pattern_type: PatternType::Opportunity,
        pattern_name: "type_safety",
        keywords: &[
            ("any", 0.20),
            ("untyped", 0.20),
            ("missing type hints", 0.25),
            ("# type: ignore", 0.20),
            ("no type", 0.15),
            ("type error", 0.20),
        ],
    },
    Heuristic {
        pattern_type: PatternType::UserIntent,
        pattern_name: "recurring_topic",
        keywords: &[
            ("repeated", 0.30),
            ("again", 0.15),
            ("mentioned >3x", 0.30),
            ("keeps coming up", 0.25),
            ("frequently", 0.20),
        ],
    },
    Heuristic {
        pattern_type: PatternType::UserIntent,
        pattern_name: "feature_request",
        keywords: &[
            ("i need", 0.25),
            ("can we add", 0.25),
            ("please implement", 0.25),
            ("would like", 0.20),
            ("feature request", 0.30),
            ("new feature", 0.25),
        ],
    },
    Heuristic {
        pattern_type: PatternType::UserIntent,
        pattern_name: "workflow_bottleneck",
        keywords: &[
            ("i always manually", 0.25),
            ("this is tedious", 0.25),
            ("repetitive task", 0.25),
            ("slow process", 0.20),
            ("time-consuming", 0.20),
            ("automate", 0.20),
        ],
    },
    Heuristic {
        pattern_type: PatternType::UserIntent,
        pattern_name: "frustration_signal",
        keywords: &[
            ("why doesn't", 0.20),
            ("this should work", 0.20),
            ("confused", 0.20),
            ("unclear", 0.15),
            ("broken", 0.15),
            ("not working", 0.15),
            ("frustrated", 0.25),
        ],
    },
];

/// One pattern's adaptive-threshold reduction rule.
pub(crate) struct AdaptiveThreshold {
    pub(crate) pattern_name: &'static str,
    pub(crate) min_occurrences: u32,
    pub(crate) threshold_reduction: f64,
}

/// Patterns whose detection threshold relaxes once the detector has seen
/// them often enough in this instance's history.
pub(crate) static ADAPTIVE_THRESHOLDS: &[AdaptiveThreshold] = &[
    AdaptiveThreshold {
        pattern_name: "critical_error",
        min_occurrences: 3,
        threshold_reduction: 0.10,
    },
    AdaptiveThreshold {
        pattern_name: "flaky_test",
        min_occurrences: 2,
        threshold_reduction: 0.15,
    },
    AdaptiveThreshold {
        pattern_name: "constitutional_violation",
        min_occurrences: 1,
        threshold_reduction: 0.0,
    },
];

/// Floor below which no adaptive reduction may push the effective threshold.
pub(crate) const ADAPTIVE_THRESHOLD_FLOOR: f64 = 0.6;
