use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Identity of a single step inside a known task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRef {
    pub task_id: String,
    pub step_id: u32,
}

impl StepRef {
    pub fn new(task_id: &str, step_id: u32) -> Self {
        Self {
            task_id: task_id.to_string(),
            step_id,
        }
    }
}

/// Best candidate step handed over by the semantic matcher, together with
/// the similarity score it computed. The engine never recomputes similarity;
/// it only applies trust policy on top of this.
#[derive(Debug, Clone)]
pub struct StepMatch {
    pub step: StepRef,
    pub score: f32,
}

/// Discretized trust bucket derived from a continuous similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceTier {
    /// Pure mapping: score -> tier. Thresholds come from config so the
    /// boundaries stay testable.
    pub fn from_score(score: f32, cfg: &EngineConfig) -> Self {
        if score >= cfg.high_threshold {
            ConfidenceTier::High
        } else if score >= cfg.medium_threshold {
            ConfidenceTier::Medium
        } else if score >= cfg.low_threshold {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::None
        }
    }

    /// LOW and NONE are the "the scene no longer matches anything we
    /// trust" buckets. They share policy everywhere.
    pub fn is_low(&self) -> bool {
        matches!(self, ConfidenceTier::Low | ConfidenceTier::None)
    }
}

/// One processed observation. Created once by the observation path,
/// appended to the sliding window, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    /// Instant the observation was processed (not captured).
    pub at: Instant,
    /// Scene-description text as received. May be empty or garbled; it is
    /// recorded verbatim for diagnostics and escalation context.
    pub raw_text: String,
    /// Best candidate step, if the matcher produced one.
    pub matched: Option<StepRef>,
    /// Similarity score in [0, 1] as supplied by the matcher.
    pub similarity: f32,
    pub tier: ConfidenceTier,
    /// Whether this record caused a whiteboard update.
    pub accepted: bool,
}
