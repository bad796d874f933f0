// crates/sentinel-config/src/lib.rs
// ============================================================================
// Crate: sentinel-config
// Description: The single typed `SystemConfig` tree every Sentinel component
//              reads its tunables from.
// Purpose: Replace scattered constructor defaults and environment-variable
//          reads with one TOML-backed, eagerly validated configuration:
//          typed sections, `#[serde(default = "default_xxx")]` fields, and
//          `const fn` defaults that double as the zero-config baseline.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! Typed, validated configuration for every Sentinel component.
//!
//! [`SystemConfig::load`] reads an optional TOML file and layers it over
//! [`SystemConfig::default`]; any section or field the file omits keeps its
//! compiled-in default. Validation is eager: [`SystemConfig::load`]
//! never returns a config with an out-of-range field.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Failure loading or validating a [`SystemConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The config file's contents were not valid TOML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: Box<toml::de::Error>,
    },
    /// A loaded field was outside its documented bound.
    #[error("invalid config: {field} must be {reason}")]
    Invalid {
        /// Dotted path of the offending field, e.g. `"detector.min_confidence"`.
        field: &'static str,
        /// Human-readable description of the violated bound.
        reason: &'static str,
    },
}

const fn default_table_name() -> &'static str {
    "store"
}

const fn default_busy_timeout_ms() -> u32 {
    5_000
}

/// SQLite journal mode used by both the K/V store and the message bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead log; allows concurrent readers during a write.
    Wal,
    /// Classic rollback journal.
    Delete,
}

impl JournalMode {
    /// The SQLite `PRAGMA journal_mode` value for this mode.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

impl Default for JournalMode {
    fn default() -> Self {
        Self::Wal
    }
}

fn default_journal_mode() -> JournalMode {
    JournalMode::default()
}

/// Tunables for the persistent K/V store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the table the K/V store writes to.
    pub table_name: String,
    /// SQLite `busy_timeout` in milliseconds, applied on connection open.
    pub busy_timeout_ms: u32,
    /// SQLite journal mode.
    pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name().to_owned(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
        }
    }
}

const fn default_batch_size() -> usize {
    1_000
}

const fn default_mailbox_capacity() -> usize {
    100
}

/// Tunables for the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Default `batch_size` used by `subscribe` when the caller omits one.
    pub batch_size: usize,
    /// Per-subscriber bounded mailbox capacity.
    pub mailbox_capacity: usize,
    /// SQLite `busy_timeout` in milliseconds.
    pub busy_timeout_ms: u32,
    /// SQLite journal mode.
    pub journal_mode: JournalMode,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            mailbox_capacity: default_mailbox_capacity(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
        }
    }
}

const fn default_min_confidence() -> f64 {
    0.7
}

/// Tunables for the pattern detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Baseline minimum confidence before adaptive-threshold reduction.
    pub min_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

/// Tunables for the WITNESS agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessConfig {
    /// Input queue carrying system telemetry events.
    pub telemetry_queue: String,
    /// Input queue carrying user/context events.
    pub context_queue: String,
    /// Output queue receiving published `Signal`s.
    pub output_queue: String,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            telemetry_queue: "telemetry_stream".to_owned(),
            context_queue: "personal_context_stream".to_owned(),
            output_queue: "improvement_queue".to_owned(),
        }
    }
}

const fn default_min_complexity() -> f64 {
    0.7
}

/// Tunables for the ARCHITECT agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchitectConfig {
    /// Input queue carrying `Signal`s to plan.
    pub input_queue: String,
    /// Output queue receiving published `TaskSpec`s.
    pub output_queue: String,
    /// Queue failure reports are published to, at priority 10.
    pub telemetry_queue: String,
    /// Complexity threshold at or above which a spec document is generated.
    pub min_complexity: f64,
    /// Directory used for the per-signal strategy scratch file.
    pub workspace_dir: String,
}

impl Default for ArchitectConfig {
    fn default() -> Self {
        Self {
            input_queue: "improvement_queue".to_owned(),
            output_queue: "execution_queue".to_owned(),
            telemetry_queue: "telemetry_stream".to_owned(),
            min_complexity: default_min_complexity(),
            workspace_dir: ".sentinel-workspace".to_owned(),
        }
    }
}

const fn default_cooldown_minutes() -> u64 {
    5
}

const fn default_pattern_match_threshold() -> f64 {
    0.3
}

/// Weights for the router's similarity scoring; documented to sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Weight given to an exact error-type match.
    pub exact_match: f64,
    /// Weight given to a matching file/test context.
    pub file_context: f64,
    /// Weight given to Jaccard similarity over word sets.
    pub semantic: f64,
    /// Weight given to the candidate pattern's historical success rate.
    pub success_rate: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            exact_match: 0.4,
            file_context: 0.2,
            semantic: 0.2,
            success_rate: 0.2,
        }
    }
}

impl SimilarityWeights {
    /// Sum of all four weights; used for validation.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.exact_match + self.file_context + self.semantic + self.success_rate
    }
}

/// Tunables for the event router and healing trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Minutes a `(error_type, source_file)` pair stays in cooldown after a
    /// healing attempt.
    pub cooldown_minutes: u64,
    /// Minimum weighted pattern score to dispatch via the pattern-match
    /// fast path instead of by event type.
    pub pattern_match_threshold: f64,
    /// Weights for similarity scoring between an event and a candidate
    /// pattern.
    pub similarity_weights: SimilarityWeights,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: default_cooldown_minutes(),
            pattern_match_threshold: default_pattern_match_threshold(),
            similarity_weights: SimilarityWeights::default(),
        }
    }
}

const fn default_hitl_timeout_seconds() -> u64 {
    300
}

const fn default_max_questions_per_hour() -> u32 {
    10
}

/// Tunables for the HITL protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HitlConfig {
    /// Bus queue mirror questions are published to.
    pub queue_name: String,
    /// Default `timeout_seconds` when a caller does not specify one.
    pub default_timeout_seconds: u64,
    /// Advisory rate-limit hook; not enforced in the core.
    pub max_questions_per_hour: u32,
    /// Advisory quiet-hours window start (local hour, 0-23); enforcement is
    /// external.
    pub quiet_hours_start: Option<u8>,
    /// Advisory quiet-hours window end (local hour, 0-23); enforcement is
    /// external.
    pub quiet_hours_end: Option<u8>,
}

impl Default for HitlConfig {
    fn default() -> Self {
        Self {
            queue_name: "hitl_questions".to_owned(),
            default_timeout_seconds: default_hitl_timeout_seconds(),
            max_questions_per_hour: default_max_questions_per_hour(),
            quiet_hours_start: None,
            quiet_hours_end: None,
        }
    }
}

/// The complete, validated configuration tree for a Sentinel system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// K/V store tunables.
    pub store: StoreConfig,
    /// Message bus tunables.
    pub bus: BusConfig,
    /// Pattern detector tunables.
    pub detector: DetectorConfig,
    /// WITNESS agent tunables.
    pub witness: WitnessConfig,
    /// ARCHITECT agent tunables.
    pub architect: ArchitectConfig,
    /// Event router / healing trigger tunables.
    pub router: RouterConfig,
    /// HITL protocol tunables.
    pub hitl: HitlConfig,
}

impl SystemConfig {
    /// Loads configuration from `path` if given, layering it over
    /// [`SystemConfig::default`], then validates every bound.
    ///
    /// `path = None` returns `SystemConfig::default()` unchanged.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if `path` is given but unreadable,
    /// [`ConfigError::Parse`] if its contents are not valid TOML, or
    /// [`ConfigError::Invalid`] if a field violates its documented bound.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source: Box::new(source),
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates every numeric bound named throughout the component design.
    ///
    /// # Errors
    /// Returns the first [`ConfigError::Invalid`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.table_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.table_name",
                reason: "non-empty",
            });
        }
        if self.bus.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "bus.batch_size",
                reason: "greater than zero",
            });
        }
        if self.bus.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "bus.mailbox_capacity",
                reason: "greater than zero",
            });
        }
        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            return Err(ConfigError::Invalid {
                field: "detector.min_confidence",
                reason: "within [0.0, 1.0]",
            });
        }
        if !(0.0..=1.0).contains(&self.architect.min_complexity) {
            return Err(ConfigError::Invalid {
                field: "architect.min_complexity",
                reason: "within [0.0, 1.0]",
            });
        }
        if self.router.cooldown_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "router.cooldown_minutes",
                reason: "greater than zero",
            });
        }
        if !(0.0..=1.0).contains(&self.router.pattern_match_threshold) {
            return Err(ConfigError::Invalid {
                field: "router.pattern_match_threshold",
                reason: "within [0.0, 1.0]",
            });
        }
        if (self.router.similarity_weights.total() - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid {
                field: "router.similarity_weights",
                reason: "summing to 1.0",
            });
        }
        if self.hitl.default_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "hitl.default_timeout_seconds",
                reason: "greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        SystemConfig::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn load_none_equals_default() {
        let loaded = SystemConfig::load(None).expect("loading nothing never fails");
        assert_eq!(loaded.bus.mailbox_capacity, SystemConfig::default().bus.mailbox_capacity);
        assert_eq!(loaded.detector.min_confidence, SystemConfig::default().detector.min_confidence);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.toml");
        std::fs::write(&path, "[detector]\nmin_confidence = 0.8\n").expect("write config");

        let loaded = SystemConfig::load(Some(&path)).expect("valid config loads");
        assert!((loaded.detector.min_confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(loaded.bus.mailbox_capacity, SystemConfig::default().bus.mailbox_capacity);
        assert_eq!(loaded.hitl.default_timeout_seconds, SystemConfig::default().hitl.default_timeout_seconds);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut config = SystemConfig::default();
        config.detector.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_cooldown() {
        let mut config = SystemConfig::default();
        config.router.cooldown_minutes = 0;
        assert!(config.validate().is_err());
    }
}
