// crates/sentinel-runtime/src/logging.rs
// ============================================================================
// Module: logging
// Description: Human-readable `tracing` output for binaries and tests.
// Purpose: Give callers a single opt-in subscriber installer; library
//          crates throughout the workspace emit `tracing` events but never
//          install a global subscriber themselves.
// Dependencies: tracing-subscriber
// ============================================================================

use tracing_subscriber::EnvFilter;

/// Installs a process-wide `tracing` subscriber that writes human-readable
/// lines to stderr, honoring `RUST_LOG` (defaulting to `info` when unset).
///
/// Idempotent: a second call is a no-op rather than a panic, so tests that
/// each want logging can call it freely.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
