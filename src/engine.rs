use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::kernel::history::ObservationHistory;
use crate::kernel::observation::{ConfidenceTier, ObservationRecord, StepRef};
use crate::kernel::policy::{Decision, UpdatePolicy};
use crate::kernel::staleness::StalenessEvaluator;
use crate::kernel::state::{StateDelta, StateSnapshot, Whiteboard};
use crate::knowledge::TaskKnowledge;
use crate::query::classifier::{classify, QueryIntent};
use crate::query::gate::{EscalationGate, RouteDecision};
use crate::query::responder;
use crate::services::fallback::FallbackResponder;
use crate::services::matcher::SemanticMatcher;
use crate::telemetry::{TelemetryEvent, TelemetryRecorder, TelemetrySnapshot};

/// How an answer was produced, surfaced to callers and log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Cache,
    Fallback,
    FallbackFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub source: AnswerSource,
    pub intent: QueryIntent,
    pub latency_ms: u64,
}

/// Safe reply when the slow path itself is down.
pub const FALLBACK_APOLOGY: &str =
    "Sorry, I couldn't take a fresh look just now. Give me a moment and ask again.";

/// Whiteboard and history live under ONE lock: the observation path swaps
/// state and appends in a single write section, so readers always see the
/// two in agreement.
struct Board {
    state: Whiteboard,
    history: ObservationHistory,
}

/// The state-tracking and instant-response engine.
///
/// Two logical actors drive it concurrently: the observation loop (single
/// writer, one observation at a time) and the query loop (many readers).
/// The writer holds the lock only for evaluate/reduce/append; readers only
/// long enough to copy a snapshot. Nothing holds the lock across an await.
pub struct Engine {
    config: EngineConfig,
    board: RwLock<Board>,
    policy: UpdatePolicy,
    staleness: StalenessEvaluator,
    gate: EscalationGate,
    knowledge: Arc<dyn TaskKnowledge>,
    matcher: Arc<dyn SemanticMatcher>,
    fallback: Arc<dyn FallbackResponder>,
    telemetry: Mutex<TelemetryRecorder>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        matcher: Arc<dyn SemanticMatcher>,
        knowledge: Arc<dyn TaskKnowledge>,
        fallback: Arc<dyn FallbackResponder>,
    ) -> Self {
        Self {
            board: RwLock::new(Board {
                state: Whiteboard::new(),
                history: ObservationHistory::new(config.history_capacity),
            }),
            policy: UpdatePolicy::new(config.clone()),
            staleness: StalenessEvaluator::new(config.clone()),
            gate: EscalationGate::new(config.clone()),
            knowledge,
            matcher,
            fallback,
            telemetry: Mutex::new(TelemetryRecorder::new()),
            config,
        }
    }

    /// Feed one scene observation through match -> policy -> whiteboard.
    ///
    /// Never fails: garbled text and matcher errors degrade to a NONE-tier
    /// rejection that is still recorded in history. The matcher is awaited
    /// BEFORE the write lock is taken.
    pub async fn process_observation(&self, raw_text: &str) {
        let candidate = if !self.is_plausible_observation(raw_text) {
            debug!("Observation rejected before matching (empty or oversized)");
            None
        } else {
            match self.matcher.best_match(raw_text).await {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!("Matcher failed, treating as no-match: {}", e);
                    None
                }
            }
        };

        let now = Instant::now();
        let (step, score) = match candidate {
            Some(m) => (Some(m.step), m.score),
            None => (None, 0.0),
        };
        let tier = if step.is_some() {
            ConfidenceTier::from_score(score, &self.config)
        } else {
            ConfidenceTier::None
        };

        let (decision, accepted) = {
            let mut board = self.board.write().unwrap_or_else(|e| e.into_inner());

            let decision = self.policy.evaluate(tier, step.as_ref(), &board.state, now);
            let accepted = decision == Decision::Accept;

            match (&decision, &step) {
                (Decision::Accept, Some(step)) => {
                    board.state.reduce(StateDelta::Accepted {
                        step: step.clone(),
                        tier,
                        at: now,
                    });
                }
                _ if tier.is_low() => {
                    board.state.reduce(StateDelta::LowObserved);
                }
                _ => {}
            }

            board.history.append(ObservationRecord {
                at: now,
                raw_text: raw_text.to_string(),
                matched: step.clone(),
                similarity: score,
                tier,
                accepted,
            });

            (decision, accepted)
        };

        match (&decision, &step) {
            (Decision::Accept, Some(step)) => {
                info!(
                    "Accepted {:?} observation: task={} step={} (score {:.2})",
                    tier, step.task_id, step.step_id, score
                );
            }
            (Decision::Reject(reason), _) => {
                debug!("Rejected observation ({:?}, tier {:?})", reason, tier);
            }
            _ => {}
        }

        self.record(TelemetryEvent::ObservationEvaluated { tier, accepted });
    }

    /// Answer a user query: classify, decide trust, then serve from the
    /// snapshot or escalate to the slow path. Exactly one of the two
    /// branches runs; escalation happens with no lock held.
    pub async fn handle_query(&self, query_text: &str) -> QueryResponse {
        let started = Instant::now();

        let classification = classify(query_text);

        // Copy everything the rest of the query needs in one short read
        // section: snapshot, trust verdict, and escalation context.
        let (verdict, snapshot, recent_context) = {
            let board = self.board.read().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            (
                self.staleness.assess(&board.state, &board.history, now),
                board.state.snapshot(now),
                board
                    .history
                    .latest()
                    .filter(|r| !r.raw_text.is_empty())
                    .map(|r| r.raw_text.clone()),
            )
        };

        let (answer, source) = match self.gate.route(&classification, verdict) {
            RouteDecision::Serve => {
                let answer =
                    responder::render(classification.intent, &snapshot, self.knowledge.as_ref());
                (answer, AnswerSource::Cache)
            }
            RouteDecision::Escalate(reason) => {
                info!("Escalating query to slow path ({:?})", reason);
                self.escalate(query_text, recent_context.as_deref(), snapshot.is_empty())
                    .await
            }
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        self.record(TelemetryEvent::QueryAnswered {
            intent: classification.intent,
            source,
            latency_ms,
        });

        QueryResponse {
            answer,
            source,
            intent: classification.intent,
            latency_ms,
        }
    }

    /// Slow path: hand the raw query (plus the most recent scene text) to
    /// the fallback collaborator under a hard deadline. Failure or timeout
    /// degrades to a safe message; the whiteboard is never touched.
    async fn escalate(
        &self,
        query_text: &str,
        context: Option<&str>,
        state_is_empty: bool,
    ) -> (String, AnswerSource) {
        // Degraded reply when the slow path is down: before the first
        // acceptance there is nothing to apologize about, only no state.
        let degraded = if state_is_empty {
            responder::NO_ACTIVE_TASK
        } else {
            FALLBACK_APOLOGY
        };

        let call = self.fallback.answer(query_text, context);
        match tokio::time::timeout(self.config.fallback_timeout, call).await {
            Ok(Ok(answer)) => (answer, AnswerSource::Fallback),
            Ok(Err(e)) => {
                warn!("Fallback failed: {}", e);
                (degraded.to_string(), AnswerSource::FallbackFailed)
            }
            Err(_) => {
                warn!(
                    "Fallback timed out after {:?}",
                    self.config.fallback_timeout
                );
                (degraded.to_string(), AnswerSource::FallbackFailed)
            }
        }
    }

    /// Diagnostic read-only view of the whiteboard.
    pub fn state_snapshot(&self) -> StateSnapshot {
        let board = self.board.read().unwrap_or_else(|e| e.into_inner());
        board.state.snapshot(Instant::now())
    }

    /// Drop all tracked state and start a new task session.
    pub fn reset_session(&self) {
        {
            let mut board = self.board.write().unwrap_or_else(|e| e.into_inner());
            board.state.reduce(StateDelta::Reset);
            board.history.clear();
            info!("Session reset; new session {}", board.state.session_id());
        }
        self.record(TelemetryEvent::SessionReset);
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Non-empty, not oversized. Content beyond that is the matcher's
    /// problem; garbled text simply won't match anything.
    fn is_plausible_observation(&self, raw_text: &str) -> bool {
        !raw_text.trim().is_empty() && raw_text.len() <= self.config.max_observation_len
    }

    /// Convenience for callers that only want the believed step.
    pub fn current_step(&self) -> Option<StepRef> {
        self.state_snapshot().step
    }

    fn record(&self, event: TelemetryEvent) {
        self.telemetry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(event);
    }
}
