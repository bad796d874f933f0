// crates/sentinel-runtime/src/lib.rs
// ============================================================================
// Crate: sentinel-runtime
// Description: The process-wide composition root.
// Purpose: Open the store, bus, and HITL protocol once, construct every
//          agent over shared references to them, and own their
//          spawn/shutdown lifecycle.
// Dependencies: sentinel-architect, sentinel-bus, sentinel-config,
//               sentinel-detector, sentinel-hitl, sentinel-patterns,
//               sentinel-router, sentinel-store, sentinel-witness, tokio,
//               tracing-subscriber
// ============================================================================

//! Process-wide wiring for a Sentinel system.
//!
//! [`System::open`] opens every durable handle exactly once; no agent
//! crate ever opens its own database file or reaches for a singleton.
//! [`System::spawn_agents`] starts the WITNESS and ARCHITECT loops (and,
//! given a healing executor, the event router) as `tokio` tasks, and
//! [`System::shutdown`] cancels and joins every one of them before the
//! durable handles are dropped.

mod error;
mod logging;
mod system;

pub use error::SystemError;
pub use logging::init_tracing;
pub use system::AgentHandles;
pub use system::System;
