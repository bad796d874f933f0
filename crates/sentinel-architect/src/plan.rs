// crates/sentinel-architect/src/plan.rs
// ============================================================================
// Module: plan
// Description: GENERATE TASK GRAPH and SELF-VERIFY: turns a Strategy into a
//              verified 3-task DAG.
// Purpose: Keep task-graph shape and the code/test pairing check testable
//          in isolation from the bus and pattern store.
// Dependencies: sentinel-core
// ============================================================================

use sentinel_core::CorrelationId;
use sentinel_core::TaskId;
use sentinel_core::TaskSpec;
use sentinel_core::TaskType;
use sentinel_core::Urgency;
use time::OffsetDateTime;

use crate::error::ArchitectError;

/// Generates the fixed 3-task plan for a strategy: a `CodeGeneration` task,
/// a `TestGeneration` task, and a `Merge` task depending on both.
#[must_use]
pub fn generate_task_graph(
    correlation_id: &CorrelationId,
    priority: Urgency,
    decision: &str,
    spec_content: Option<&str>,
    adr_content: Option<&str>,
) -> Vec<TaskSpec> {
    let code_id = TaskId::new(format!("{correlation_id}_code"));
    let test_id = TaskId::new(format!("{correlation_id}_test"));
    let merge_id = TaskId::new(format!("{correlation_id}_merge"));
    let timestamp = OffsetDateTime::now_utc();

    let mut code_spec = serde_json::Map::new();
    code_spec.insert("decision".to_owned(), serde_json::Value::String(decision.to_owned()));
    if let Some(spec) = spec_content {
        code_spec.insert("spec".to_owned(), serde_json::Value::String(spec.to_owned()));
    }
    if let Some(adr) = adr_content {
        code_spec.insert("adr".to_owned(), serde_json::Value::String(adr.to_owned()));
    }

    let mut test_spec = serde_json::Map::new();
    test_spec.insert("decision".to_owned(), serde_json::Value::String(decision.to_owned()));
    test_spec.insert("covers".to_owned(), serde_json::Value::String(code_id.as_str().to_owned()));

    let mut merge_spec = serde_json::Map::new();
    merge_spec.insert("decision".to_owned(), serde_json::Value::String(decision.to_owned()));

    vec![
        TaskSpec {
            task_id: code_id.clone(),
            correlation_id: correlation_id.clone(),
            priority,
            task_type: TaskType::CodeGeneration,
            sub_agent: TaskType::CodeGeneration.default_sub_agent().to_owned(),
            spec: code_spec,
            dependencies: Vec::new(),
            timestamp,
        },
        TaskSpec {
            task_id: test_id.clone(),
            correlation_id: correlation_id.clone(),
            priority,
            task_type: TaskType::TestGeneration,
            sub_agent: TaskType::TestGeneration.default_sub_agent().to_owned(),
            spec: test_spec,
            dependencies: vec![code_id.clone()],
            timestamp,
        },
        TaskSpec {
            task_id: merge_id,
            correlation_id: correlation_id.clone(),
            priority,
            task_type: TaskType::Merge,
            sub_agent: TaskType::Merge.default_sub_agent().to_owned(),
            spec: merge_spec,
            dependencies: vec![code_id, test_id],
            timestamp,
        },
    ]
}

/// Self-verifies a generated plan before publication.
///
/// # Errors
/// Returns [`ArchitectError::Invalid`] if the plan is empty, any task has
/// an empty `sub_agent`, any `CodeGeneration` task lacks a `TestGeneration`
/// sibling, any dependency names a task not in the plan, or any task
/// depends on itself.
pub fn verify_plan(tasks: &[TaskSpec]) -> Result<(), ArchitectError> {
    if tasks.is_empty() {
        return Err(ArchitectError::Invalid("plan has no tasks".to_owned()));
    }

    let known_ids: std::collections::HashSet<&TaskId> = tasks.iter().map(|task| &task.task_id).collect();

    for task in tasks {
        if task.sub_agent.trim().is_empty() {
            return Err(ArchitectError::Invalid(format!("task {} has an empty sub_agent", task.task_id)));
        }
        for dependency in &task.dependencies {
            if dependency == &task.task_id {
                return Err(ArchitectError::Invalid(format!("task {} depends on itself", task.task_id)));
            }
            if !known_ids.contains(dependency) {
                return Err(ArchitectError::Invalid(format!("task {} depends on unknown task {dependency}", task.task_id)));
            }
        }
    }

    let has_test_sibling = |code_id: &TaskId| {
        tasks
            .iter()
            .any(|candidate| candidate.task_type == TaskType::TestGeneration && candidate.dependencies.contains(code_id))
    };
    for task in tasks.iter().filter(|task| task.task_type == TaskType::CodeGeneration) {
        if !has_test_sibling(&task.task_id) {
            return Err(ArchitectError::Invalid(format!("code generation task {} has no test generation sibling", task.task_id)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_exactly_three_tasks_with_merge_depending_on_both() {
        let correlation_id = CorrelationId::new("corr-1");
        let tasks = generate_task_graph(&correlation_id, Urgency::Normal, "decision text", None, None);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].task_id.as_str(), "corr-1_code");
        assert_eq!(tasks[1].task_id.as_str(), "corr-1_test");
        assert_eq!(tasks[2].task_id.as_str(), "corr-1_merge");
        assert_eq!(tasks[2].dependencies.len(), 2);
        assert!(verify_plan(&tasks).is_ok());
    }

    #[test]
    fn rejects_empty_plan() {
        assert!(verify_plan(&[]).is_err());
    }

    #[test]
    fn rejects_self_dependency() {
        let correlation_id = CorrelationId::new("corr-2");
        let mut tasks = generate_task_graph(&correlation_id, Urgency::Normal, "decision", None, None);
        let self_id = tasks[0].task_id.clone();
        tasks[0].dependencies.push(self_id);
        assert!(verify_plan(&tasks).is_err());
    }

    #[test]
    fn rejects_code_task_with_no_test_sibling() {
        let correlation_id = CorrelationId::new("corr-3");
        let mut tasks = generate_task_graph(&correlation_id, Urgency::Normal, "decision", None, None);
        tasks.retain(|task| task.task_type != TaskType::TestGeneration);
        assert!(verify_plan(&tasks).is_err());
    }

    #[test]
    fn rejects_dangling_dependency() {
        let correlation_id = CorrelationId::new("corr-4");
        let mut tasks = generate_task_graph(&correlation_id, Urgency::Normal, "decision", None, None);
        tasks[1].dependencies.push(TaskId::new("nonexistent"));
        assert!(verify_plan(&tasks).is_err());
    }
}
