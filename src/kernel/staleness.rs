use std::time::Instant;

use serde::Serialize;

use crate::config::EngineConfig;

use super::history::ObservationHistory;
use super::observation::ConfidenceTier;
use super::state::Whiteboard;

/// Why the cached state may or may not be trusted for an instant answer.
/// Carries the first rule that tripped so the escalation decision is
/// visible in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustVerdict {
    /// Cached state is fresh and confirmed; answer from it.
    Trusted,
    /// Nothing was ever accepted this session.
    EmptyState,
    /// The newest observation (accepted or not) was LOW/NONE tier.
    RecentLowConfidence,
    /// Enough consecutive low reads that the scene has genuinely moved on.
    SceneShifted,
    /// State outlived its TTL without a HIGH-tier re-confirmation.
    Expired,
}

impl TrustVerdict {
    pub fn requires_fallback(&self) -> bool {
        !matches!(self, TrustVerdict::Trusted)
    }
}

/// Trust policy over already-held data. Pure arithmetic, no I/O; runs
/// under the read lock in well under a millisecond.
///
/// A TTL alone would be wrong in both directions: a user can legitimately
/// linger on one step for minutes (state stays valid), while three low
/// reads in two seconds mean the scene changed even though the TTL is
/// nowhere near expiry. The rules below encode exactly that.
pub struct StalenessEvaluator {
    cfg: EngineConfig,
}

impl StalenessEvaluator {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn assess(
        &self,
        board: &Whiteboard,
        history: &ObservationHistory,
        now: Instant,
    ) -> TrustVerdict {
        // Rule: nothing accepted yet -> nothing to answer from.
        if board.is_empty() {
            return TrustVerdict::EmptyState;
        }

        // Rule: sustained low run, even with a recent accepted state.
        // Checked before the single-frame rule so a full streak reports as
        // a scene shift, not as one noisy read.
        if history.consecutive_low_streak() >= self.cfg.low_streak_threshold {
            return TrustVerdict::SceneShifted;
        }

        // Rule: the very latest read failed to recognize the scene.
        let latest_tier = history.latest().map(|r| r.tier);
        if latest_tier.map(|t| t.is_low()).unwrap_or(false) {
            return TrustVerdict::RecentLowConfidence;
        }

        // Rule: TTL, waived when the latest observation re-confirms at HIGH.
        if let Some(updated_at) = board.updated_at() {
            let age = now.saturating_duration_since(updated_at);
            let reconfirmed = latest_tier == Some(ConfidenceTier::High);
            if age > self.cfg.state_ttl && !reconfirmed {
                return TrustVerdict::Expired;
            }
        }

        TrustVerdict::Trusted
    }
}
