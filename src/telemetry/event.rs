use crate::engine::AnswerSource;
use crate::kernel::observation::ConfidenceTier;
use crate::query::classifier::QueryIntent;

/// Facts about engine behavior worth counting. Recorded on the hot paths,
/// aggregated lazily by `metrics::compute_snapshot`.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    ObservationEvaluated {
        tier: ConfidenceTier,
        accepted: bool,
    },
    QueryAnswered {
        intent: QueryIntent,
        source: AnswerSource,
        latency_ms: u64,
    },
    SessionReset,
}
