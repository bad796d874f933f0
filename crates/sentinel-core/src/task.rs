// crates/sentinel-core/src/task.rs
// ============================================================================
// Module: TaskSpec
// Description: The unit of executable work produced by ARCHITECT, and the
//              internal Strategy it is derived from.
// Purpose: Give the plan DAG a typed shape so dependency-closure and
//          code/test pairing invariants can be checked mechanically.
// Dependencies: serde, serde_json, time, sentinel-core::{ids, urgency}
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ids::CorrelationId;
use crate::ids::TaskId;
use crate::urgency::Urgency;

/// The kind of work a `TaskSpec` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Produce or modify implementation code.
    CodeGeneration,
    /// Produce or modify tests covering a `CodeGeneration` sibling.
    TestGeneration,
    /// Merge the outputs of a code/test pair once both succeed.
    Merge,
}

impl TaskType {
    /// The sub-agent name conventionally responsible for this task type.
    #[must_use]
    pub const fn default_sub_agent(self) -> &'static str {
        match self {
            Self::CodeGeneration => "CodeWriter",
            Self::TestGeneration => "TestArchitect",
            Self::Merge => "ReleaseManager",
        }
    }
}

/// A unit of executable work, published by ARCHITECT onto `execution_queue`
/// and consumed by an external executor.
///
/// # Invariants
/// - `sub_agent` is never empty.
/// - `dependencies` never names `task_id` itself (no self-dependency).
/// - Enforced at the plan level, not per task: every `CodeGeneration` task
///   has at least one `TestGeneration` sibling in the same plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique identifier within the plan, conventionally
    /// `"<correlation_id>_code|test|merge"`.
    pub task_id: TaskId,
    /// Workflow correlation tag shared by every task in the plan.
    pub correlation_id: CorrelationId,
    /// Urgency carried forward from the originating `Signal`.
    pub priority: Urgency,
    /// What kind of work this task describes.
    pub task_type: TaskType,
    /// Name of the sub-agent responsible for executing this task.
    pub sub_agent: String,
    /// Task details: the strategy's decision text and any generated
    /// spec/ADR content.
    pub spec: serde_json::Map<String, serde_json::Value>,
    /// Task ids that must complete before this task may run.
    pub dependencies: Vec<TaskId>,
    /// When this task was generated.
    pub timestamp: OffsetDateTime,
}

/// ARCHITECT's internal planning result, before task-graph generation.
#[derive(Debug, Clone)]
pub struct Strategy {
    /// Urgency carried forward from the originating `Signal`.
    pub priority: Urgency,
    /// Computed complexity score in `[0.0, 1.0]`.
    pub complexity: f64,
    /// Selected reasoning-engine label, e.g. `"gpt-5"`.
    pub engine: &'static str,
    /// Short decision string describing what was planned.
    pub decision: String,
    /// Generated spec document, if complexity warranted one.
    pub spec_content: Option<String>,
    /// Generated ADR document, if the signal was judged architectural.
    pub adr_content: Option<String>,
    /// The task graph generated from this strategy.
    pub tasks: Vec<TaskSpec>,
}
