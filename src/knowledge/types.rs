use serde::{Deserialize, Serialize};

/// Metadata for one step of a task, as authored in the task library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInfo {
    pub title: String,
    pub description: String,
    /// Tools/ingredients the user should have at hand for this step.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub safety_notes: Option<String>,
    /// Rough expected duration, purely informational.
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// 1-based ordinal of this step within its task.
    pub position: u32,
}

/// A complete authored task: ordered steps under one task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub task_id: String,
    pub title: String,
    pub steps: Vec<StepInfo>,
}

impl TaskDefinition {
    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }
}
