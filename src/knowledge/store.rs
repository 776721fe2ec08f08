use std::collections::HashMap;

use super::types::{StepInfo, TaskDefinition};

/// Read-only lookup the response generator renders from, keyed by
/// (task id, step id). Assumed static for the lifetime of a session.
pub trait TaskKnowledge: Send + Sync {
    fn step(&self, task_id: &str, step_id: u32) -> Option<StepInfo>;
    fn total_steps(&self, task_id: &str) -> Option<u32>;
}

/// In-memory implementation backed by a map of authored task definitions.
/// Steps are addressed by their 1-based position within the task.
pub struct InMemoryKnowledge {
    tasks: HashMap<String, TaskDefinition>,
}

impl InMemoryKnowledge {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub fn register(&mut self, task: TaskDefinition) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    pub fn with_task(mut self, task: TaskDefinition) -> Self {
        self.register(task);
        self
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskDefinition> {
        self.tasks.get(task_id)
    }
}

impl Default for InMemoryKnowledge {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskKnowledge for InMemoryKnowledge {
    fn step(&self, task_id: &str, step_id: u32) -> Option<StepInfo> {
        self.tasks
            .get(task_id)?
            .steps
            .iter()
            .find(|s| s.position == step_id)
            .cloned()
    }

    fn total_steps(&self, task_id: &str) -> Option<u32> {
        self.tasks.get(task_id).map(|t| t.total_steps())
    }
}
