use crate::kernel::state::StateSnapshot;
use crate::knowledge::TaskKnowledge;

use super::classifier::QueryIntent;

/// Uniform reply for every intent while the whiteboard is still empty.
pub const NO_ACTIVE_TASK: &str =
    "I haven't locked onto a task yet. Give me a moment to watch what you're doing, then ask again.";

/// Reply when the whiteboard names a step the knowledge base doesn't know.
pub const DETAILS_UNAVAILABLE: &str =
    "I can tell which step you're on, but I don't have the details for it right now.";

/// Guidance for queries the classifier couldn't place.
pub const UNKNOWN_GUIDANCE: &str = "I can answer things like \"what step am I on\", \
     \"what's next\", \"what do I need\", \"how far along am I\", or \"help\".";

/// Pure formatting: (intent, snapshot, knowledge) -> answer text.
///
/// Operates only on the already-copied snapshot and the read-only
/// knowledge lookup. Never blocks, never touches the whiteboard lock,
/// never fails: every miss degrades to a fixed message.
pub fn render(intent: QueryIntent, snap: &StateSnapshot, knowledge: &dyn TaskKnowledge) -> String {
    let step_ref = match &snap.step {
        Some(step) => step,
        None => return NO_ACTIVE_TASK.to_string(),
    };

    match intent {
        QueryIntent::CurrentStep => match knowledge.step(&step_ref.task_id, step_ref.step_id) {
            Some(info) => format!(
                "You are on step {}: {}. {}",
                step_ref.step_id, info.title, info.description
            ),
            None => DETAILS_UNAVAILABLE.to_string(),
        },

        QueryIntent::NextStep => match knowledge.step(&step_ref.task_id, step_ref.step_id + 1) {
            Some(next) => format!("Next up is step {}: {}.", step_ref.step_id + 1, next.title),
            None => "This is the final step. Once it's done, you're finished.".to_string(),
        },

        QueryIntent::RequiredTools => match knowledge.step(&step_ref.task_id, step_ref.step_id) {
            Some(info) if info.tools.is_empty() => {
                "No special tools are needed for this step.".to_string()
            }
            Some(info) => format!("For this step you need: {}.", info.tools.join(", ")),
            None => DETAILS_UNAVAILABLE.to_string(),
        },

        QueryIntent::CompletionStatus => {
            match knowledge.total_steps(&step_ref.task_id) {
                Some(total) if step_ref.step_id >= total => {
                    "You're on the last step. Finish it and you're done.".to_string()
                }
                Some(total) => format!(
                    "Not yet. You've finished {} of {} steps and are working on step {}.",
                    step_ref.step_id.saturating_sub(1),
                    total,
                    step_ref.step_id
                ),
                None => DETAILS_UNAVAILABLE.to_string(),
            }
        }

        QueryIntent::ProgressOverview => match knowledge.total_steps(&step_ref.task_id) {
            Some(total) if total > 0 => {
                let pct = (step_ref.step_id as f32 / total as f32 * 100.0).round() as u32;
                format!(
                    "You're on step {} of {}, about {}% of the way through.",
                    step_ref.step_id, total, pct
                )
            }
            _ => DETAILS_UNAVAILABLE.to_string(),
        },

        QueryIntent::Help => match knowledge.step(&step_ref.task_id, step_ref.step_id) {
            Some(info) => {
                let mut answer = info.description.clone();
                if let Some(notes) = &info.safety_notes {
                    answer.push_str(" Safety note: ");
                    answer.push_str(notes);
                }
                answer
            }
            None => DETAILS_UNAVAILABLE.to_string(),
        },

        QueryIntent::Unknown => UNKNOWN_GUIDANCE.to_string(),
    }
}
