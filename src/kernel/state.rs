use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use super::observation::{ConfidenceTier, StepRef};

/// Strict state delta. This is the ONLY way the whiteboard mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    /// An observation cleared the acceptance policy; the cell is replaced
    /// wholesale and the low streak resets.
    Accepted {
        step: StepRef,
        tier: ConfidenceTier,
        at: Instant,
    },
    /// A LOW/NONE-tier observation was rejected; the streak advances but
    /// the believed step stays put.
    LowObserved,
    /// Begin a fresh session: empty cell, new session id.
    Reset,
}

/// The whiteboard: the single cell holding the task/step the system
/// currently believes is active.
///
/// Written only by the observation path through `reduce`; the query path
/// copies out a [`StateSnapshot`] and never holds a reference into the
/// live cell.
#[derive(Debug)]
pub struct Whiteboard {
    session_id: Uuid,
    step: Option<StepRef>,
    tier: ConfidenceTier,
    updated_at: Option<Instant>,
    consecutive_low: u32,
    /// Monotonic version, incremented on every reduction.
    pub version: u64,
}

impl Whiteboard {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            step: None,
            tier: ConfidenceTier::None,
            updated_at: None,
            consecutive_low: 0,
            version: 0,
        }
    }

    /// True until the first accepted observation of the session.
    pub fn is_empty(&self) -> bool {
        self.step.is_none()
    }

    pub fn step(&self) -> Option<&StepRef> {
        self.step.as_ref()
    }

    pub fn tier(&self) -> ConfidenceTier {
        self.tier
    }

    pub fn updated_at(&self) -> Option<Instant> {
        self.updated_at
    }

    pub fn consecutive_low(&self) -> u32 {
        self.consecutive_low
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Pure reduction: State + Delta -> Mutated State.
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::Accepted { step, tier, at } => {
                self.step = Some(step);
                self.tier = tier;
                self.updated_at = Some(at);
                self.consecutive_low = 0;
            }
            StateDelta::LowObserved => {
                self.consecutive_low = self.consecutive_low.saturating_add(1);
            }
            StateDelta::Reset => {
                self.session_id = Uuid::new_v4();
                self.step = None;
                self.tier = ConfidenceTier::None;
                self.updated_at = None;
                self.consecutive_low = 0;
            }
        }
    }

    /// Copy out the small, fixed-size view the query path works on.
    /// `now` is passed in so age is computed once, under the lock.
    pub fn snapshot(&self, now: Instant) -> StateSnapshot {
        StateSnapshot {
            session_id: self.session_id,
            step: self.step.clone(),
            tier: self.tier,
            version: self.version,
            age_ms: self
                .updated_at
                .map(|at| now.saturating_duration_since(at).as_millis() as u64),
            consecutive_low: self.consecutive_low,
        }
    }
}

impl Default for Whiteboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the whiteboard, safe to format and serialize without
/// touching the lock again.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub session_id: Uuid,
    pub step: Option<StepRef>,
    pub tier: ConfidenceTier,
    pub version: u64,
    /// Milliseconds since the last accepted update; `None` before the
    /// first acceptance.
    pub age_ms: Option<u64>,
    pub consecutive_low: u32,
}

impl StateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.step.is_none()
    }
}
