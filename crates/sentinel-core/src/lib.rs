// crates/sentinel-core/src/lib.rs
// ============================================================================
// Crate: sentinel-core
// Description: Shared domain types for the Sentinel learning-and-healing
//              platform: identifiers, the Message/StoreEntry/Pattern/Signal/
//              TaskSpec/HITL data model, and the shared validation error.
// Purpose: Give every other crate in the workspace one dependency-free
//          vocabulary, so storage, bus, detector, and agent crates never
//          redefine the same types against each other.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! Shared domain types for the Sentinel platform.
//!
//! This crate performs no I/O. It exists so that [`sentinel-store`],
//! [`sentinel-bus`], [`sentinel-detector`], [`sentinel-witness`],
//! [`sentinel-architect`], [`sentinel-router`], and [`sentinel-hitl`] share
//! one definition of `Message`, `StoreEntry`, `PatternMatch`, `Signal`,
//! `TaskSpec`, and `HitlQuestion` rather than each inventing their own.

pub mod error;
pub mod hitl;
pub mod ids;
pub mod message;
pub mod pattern;
pub mod signal;
pub mod store_entry;
pub mod task;
pub mod urgency;

pub use error::ValidationError;
pub use hitl::HitlQuestion;
pub use hitl::HitlResponse;
pub use hitl::HitlStatus;
pub use ids::CorrelationId;
pub use ids::MessageId;
pub use ids::QuestionId;
pub use ids::SourceId;
pub use ids::StoreKey;
pub use ids::TaskId;
pub use message::Message;
pub use message::MessageStatus;
pub use pattern::PatternMatch;
pub use pattern::PatternRecord;
pub use pattern::PatternType;
pub use signal::Signal;
pub use signal::SignalSource;
pub use store_entry::StoreEntry;
pub use task::Strategy;
pub use task::TaskSpec;
pub use task::TaskType;
pub use urgency::Urgency;
