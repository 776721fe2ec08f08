use std::time::Duration;

/// All tunable knobs of the tracking engine in one place.
/// Thresholds live here so boundary behavior can be tested against named
/// values instead of magic numbers scattered through the policy code.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Similarity at or above this maps to `ConfidenceTier::High`.
    pub high_threshold: f32,

    /// Similarity at or above this (but below high) maps to `Medium`.
    pub medium_threshold: f32,

    /// Similarity at or above this (but below medium) maps to `Low`.
    /// Anything below is `None`.
    pub low_threshold: f32,

    /// Capacity of the sliding observation window. Oldest records are
    /// evicted FIFO once this fills.
    pub history_capacity: usize,

    /// A MEDIUM match for a *different* step cannot overturn a HIGH state
    /// accepted more recently than this.
    pub high_guard_window: Duration,

    /// This many consecutive LOW/NONE observations mark the scene as
    /// having genuinely moved on.
    pub low_streak_threshold: u32,

    /// Accepted state older than this is suspect unless the latest
    /// observation re-confirms it at HIGH tier.
    pub state_ttl: Duration,

    /// Classifications below this confidence are routed to the slow path.
    pub classifier_floor: f32,

    /// Hard ceiling on a single escalation round-trip.
    pub fallback_timeout: Duration,

    /// Observation text longer than this is treated as garbled (NONE tier).
    pub max_observation_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.65,
            medium_threshold: 0.40,
            low_threshold: 0.20,
            history_capacity: 50,
            high_guard_window: Duration::from_secs(3),
            low_streak_threshold: 3,
            state_ttl: Duration::from_secs(15),
            classifier_floor: 0.5,
            fallback_timeout: Duration::from_secs(4),
            max_observation_len: 4096,
        }
    }
}
