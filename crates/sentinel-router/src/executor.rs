// crates/sentinel-router/src/executor.rs
// ============================================================================
// Module: executor
// Description: The external healing-executor seam the healing trigger
//              delegates actual file fixes to.
// Purpose: Keep file/git mutation out of this crate; a real executor lives
//          outside this workspace entirely.
// Dependencies: async-trait
// ============================================================================

use async_trait::async_trait;

/// Applies a fix for a detected error to a file on disk.
///
/// Implementations own the read-patch-verify-commit-or-rollback sequence;
/// the healing trigger only needs to know whether the attempt succeeded.
#[async_trait]
pub trait HealingExecutor: Send + Sync {
    /// Attempts to fix `error_type` at `file:line`, given the offending
    /// `snippet`. Returns whether the fix was applied and verified.
    async fn fix(&self, file: &str, line: u32, error_type: &str, snippet: &str) -> bool;
}

/// A [`HealingExecutor`] that never succeeds, for configurations with no
/// executor wired in.
///
/// # Invariants
/// - Always reports failure, never panics or touches the filesystem.
pub struct NoopHealingExecutor;

#[async_trait]
impl HealingExecutor for NoopHealingExecutor {
    async fn fix(&self, _file: &str, _line: u32, _error_type: &str, _snippet: &str) -> bool {
        false
    }
}
