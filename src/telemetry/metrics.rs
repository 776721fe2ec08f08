use std::collections::VecDeque;

use serde::Serialize;

use crate::engine::AnswerSource;
use crate::kernel::observation::ConfidenceTier;

use super::event::TelemetryEvent;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub observations: ObservationStats,
    pub queries: QueryStats,
    pub session_resets: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservationStats {
    pub evaluated: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub none: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryStats {
    pub served_from_cache: u64,
    pub escalated: u64,
    pub fallback_failures: u64,
    pub avg_cache_latency_ms: f64,
}

/// Pure aggregation over the raw event ring.
pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    let mut cache_latency_total: u64 = 0;

    for event in events {
        match event {
            TelemetryEvent::ObservationEvaluated { tier, accepted } => {
                snap.observations.evaluated += 1;
                if *accepted {
                    snap.observations.accepted += 1;
                } else {
                    snap.observations.rejected += 1;
                }
                match tier {
                    ConfidenceTier::High => snap.observations.high += 1,
                    ConfidenceTier::Medium => snap.observations.medium += 1,
                    ConfidenceTier::Low => snap.observations.low += 1,
                    ConfidenceTier::None => snap.observations.none += 1,
                }
            }
            TelemetryEvent::QueryAnswered {
                source, latency_ms, ..
            } => match source {
                AnswerSource::Cache => {
                    snap.queries.served_from_cache += 1;
                    cache_latency_total += latency_ms;
                }
                AnswerSource::Fallback => snap.queries.escalated += 1,
                AnswerSource::FallbackFailed => {
                    snap.queries.escalated += 1;
                    snap.queries.fallback_failures += 1;
                }
            },
            TelemetryEvent::SessionReset => snap.session_resets += 1,
        }
    }

    if snap.queries.served_from_cache > 0 {
        snap.queries.avg_cache_latency_ms =
            cache_latency_total as f64 / snap.queries.served_from_cache as f64;
    }

    snap
}
