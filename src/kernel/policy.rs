use std::time::Instant;

use crate::config::EngineConfig;

use super::observation::{ConfidenceTier, StepRef};
use super::state::Whiteboard;

/// Outcome of evaluating one observation against the whiteboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The matcher produced no candidate at all.
    NoMatch,
    /// LOW/NONE tier: a single noisy frame never moves the state.
    LowConfidence,
    /// MEDIUM tier contradicting a HIGH state accepted moments ago.
    GuardedByRecentHigh,
}

/// Conservative acceptance policy over match results.
///
/// The rules, top to bottom:
/// - HIGH always replaces the whiteboard.
/// - MEDIUM replaces it unless a HIGH state for a *different* step was
///   accepted within the guard window. MEDIUM for the *same* step always
///   refreshes tier and timestamp.
/// - LOW/NONE never mutate the believed step; they only advance the
///   low streak that the staleness evaluator watches.
pub struct UpdatePolicy {
    cfg: EngineConfig,
}

impl UpdatePolicy {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    /// Pure decision: (new match, current state, now) -> Accept | Reject.
    /// Does not mutate anything; the caller applies the matching delta.
    pub fn evaluate(
        &self,
        tier: ConfidenceTier,
        candidate: Option<&StepRef>,
        board: &Whiteboard,
        now: Instant,
    ) -> Decision {
        let step = match candidate {
            Some(step) => step,
            None => return Decision::Reject(RejectReason::NoMatch),
        };

        match tier {
            ConfidenceTier::High => Decision::Accept,
            ConfidenceTier::Medium => {
                if self.guarded_by_recent_high(step, board, now) {
                    Decision::Reject(RejectReason::GuardedByRecentHigh)
                } else {
                    Decision::Accept
                }
            }
            ConfidenceTier::Low | ConfidenceTier::None => {
                Decision::Reject(RejectReason::LowConfidence)
            }
        }
    }

    /// A fresh HIGH-tier state may not be overturned by one MEDIUM frame
    /// pointing at a different step.
    fn guarded_by_recent_high(&self, step: &StepRef, board: &Whiteboard, now: Instant) -> bool {
        if board.tier() != ConfidenceTier::High {
            return false;
        }
        let same_step = board.step().map(|s| s == step).unwrap_or(false);
        if same_step {
            return false;
        }
        match board.updated_at() {
            Some(at) => now.saturating_duration_since(at) < self.cfg.high_guard_window,
            None => false,
        }
    }
}
