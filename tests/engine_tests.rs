use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use compass::config::EngineConfig;
use compass::engine::{AnswerSource, Engine, FALLBACK_APOLOGY};
use compass::kernel::observation::{StepMatch, StepRef};
use compass::knowledge::{InMemoryKnowledge, StepInfo, TaskDefinition};
use compass::query::classifier::QueryIntent;
use compass::query::responder::NO_ACTIVE_TASK;
use compass::services::fallback::{FallbackError, FallbackResponder};
use compass::services::matcher::{MatchError, SemanticMatcher};

/// Pops one pre-scripted match result per observation.
struct ScriptedMatcher {
    script: Mutex<VecDeque<Option<StepMatch>>>,
}

impl ScriptedMatcher {
    fn new(results: Vec<Option<StepMatch>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
        }
    }
}

#[async_trait]
impl SemanticMatcher for ScriptedMatcher {
    async fn best_match(&self, _text: &str) -> Result<Option<StepMatch>, MatchError> {
        Ok(self.script.lock().unwrap().pop_front().flatten())
    }
}

/// Counts invocations; optionally fails every call.
struct CountingFallback {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingFallback {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackResponder for CountingFallback {
    async fn answer(
        &self,
        _query: &str,
        _recent_context: Option<&str>,
    ) -> Result<String, FallbackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(FallbackError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        } else {
            Ok("Fresh look: you appear to be grinding beans.".to_string())
        }
    }
}

fn coffee_knowledge() -> InMemoryKnowledge {
    let step = |position, title: &str, description: &str| StepInfo {
        title: title.to_string(),
        description: description.to_string(),
        tools: vec!["kettle".to_string()],
        safety_notes: None,
        duration_secs: None,
        position,
    };

    InMemoryKnowledge::new().with_task(TaskDefinition {
        task_id: "coffee".to_string(),
        title: "Pour-Over Coffee".to_string(),
        steps: vec![
            step(1, "Gather Equipment", "Set out kettle, grinder, and beans."),
            step(2, "Grind the Beans", "Grind to medium-fine."),
            step(3, "Brew", "Pour hot water over the grounds."),
        ],
    })
}

fn matched(step_id: u32, score: f32) -> Option<StepMatch> {
    Some(StepMatch {
        step: StepRef::new("coffee", step_id),
        score,
    })
}

fn build_engine(
    config: EngineConfig,
    script: Vec<Option<StepMatch>>,
    fallback: Arc<CountingFallback>,
) -> Engine {
    Engine::new(
        config,
        Arc::new(ScriptedMatcher::new(script)),
        Arc::new(coffee_knowledge()),
        fallback,
    )
}

#[tokio::test]
async fn test_cache_hit_flow() {
    // 1. A confident observation is accepted
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![matched(1, 0.82)],
        fallback.clone(),
    );

    engine.process_observation("I see coffee beans and a grinder").await;

    let snap = engine.state_snapshot();
    assert_eq!(snap.step, Some(StepRef::new("coffee", 1)));

    // 2. The query is answered instantly from the whiteboard
    let response = engine.handle_query("What step am I on?").await;
    assert_eq!(response.source, AnswerSource::Cache);
    assert_eq!(response.intent, QueryIntent::CurrentStep);
    assert!(
        response.answer.contains("You are on step 1: Gather Equipment"),
        "Got: {}",
        response.answer
    );

    // 3. The slow path was never touched
    assert_eq!(fallback.calls(), 0, "Cache hit must not invoke fallback");

    // 4. Telemetry saw both events
    let telemetry = engine.telemetry();
    assert_eq!(telemetry.observations.evaluated, 1);
    assert_eq!(telemetry.observations.accepted, 1);
    assert_eq!(telemetry.queries.served_from_cache, 1);
}

#[tokio::test]
async fn test_low_streak_escalates_despite_fresh_state() {
    // Accepted state is seconds old, but three unrecognizable reads in a
    // row mean the scene moved on: the next query must escalate.
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![
            matched(1, 0.82),
            matched(1, 0.10),
            matched(1, 0.10),
            matched(1, 0.10),
        ],
        fallback.clone(),
    );

    engine.process_observation("beans and grinder on the counter").await;
    for _ in 0..3 {
        engine.process_observation("blurry, nothing recognizable").await;
    }

    // State itself never moved
    let snap = engine.state_snapshot();
    assert_eq!(snap.step, Some(StepRef::new("coffee", 1)));
    assert_eq!(snap.consecutive_low, 3);

    let response = engine.handle_query("What step am I on?").await;
    assert_eq!(response.source, AnswerSource::Fallback);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_empty_state_never_panics() {
    // Never-initialized state: every intent routes to the slow path, and
    // with the slow path down the caller still gets the uniform
    // "no active task" message.
    let fallback = Arc::new(CountingFallback::new(true));
    let engine = build_engine(EngineConfig::default(), vec![], fallback.clone());

    for query in [
        "what step am I on",
        "what's next",
        "what do I need",
        "am I done",
        "how far along am I",
        "help",
        "gibberish query text",
    ] {
        let response = engine.handle_query(query).await;
        assert_eq!(response.source, AnswerSource::FallbackFailed, "Query {:?}", query);
        assert_eq!(response.answer, NO_ACTIVE_TASK, "Query {:?}", query);
    }
}

#[tokio::test]
async fn test_fallback_failure_yields_apology() {
    // Populated but untrusted state + failing collaborator -> apology,
    // and the whiteboard is left untouched.
    let fallback = Arc::new(CountingFallback::new(true));
    let engine = build_engine(
        EngineConfig::default(),
        vec![
            matched(2, 0.82),
            matched(2, 0.05),
            matched(2, 0.05),
            matched(2, 0.05),
        ],
        fallback.clone(),
    );

    engine.process_observation("pouring beans into the grinder").await;
    for _ in 0..3 {
        engine.process_observation("lens covered").await;
    }

    let version_before = engine.state_snapshot().version;
    let response = engine.handle_query("where am I?").await;

    assert_eq!(response.source, AnswerSource::FallbackFailed);
    assert_eq!(response.answer, FALLBACK_APOLOGY);
    assert!(fallback.calls() >= 1);

    let snap = engine.state_snapshot();
    assert_eq!(snap.step, Some(StepRef::new("coffee", 2)), "State unchanged");
    assert_eq!(snap.version, version_before, "Query path never writes");
}

#[tokio::test]
async fn test_garbled_observation_is_contained() {
    // Empty and oversized text never reach the matcher and never crash
    // the loop; they count as NONE-tier rejections.
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![matched(1, 0.9)],
        fallback.clone(),
    );

    engine.process_observation("").await;
    engine.process_observation(&"x".repeat(10_000)).await;
    engine.process_observation("beans and grinder laid out").await;

    let telemetry = engine.telemetry();
    assert_eq!(telemetry.observations.evaluated, 3);
    assert_eq!(telemetry.observations.accepted, 1);
    assert_eq!(telemetry.observations.none, 2);

    let snap = engine.state_snapshot();
    assert_eq!(snap.step, Some(StepRef::new("coffee", 1)));
}

#[tokio::test]
async fn test_ttl_expiry_escalates() {
    // Short TTL for the test: HIGH accept, then a guarded MEDIUM read so
    // the latest tier is no longer HIGH. Inside the TTL the query is
    // served; past it, it escalates.
    let config = EngineConfig {
        state_ttl: Duration::from_millis(200),
        ..EngineConfig::default()
    };
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        config,
        vec![matched(1, 0.9), matched(2, 0.5)],
        fallback.clone(),
    );

    engine.process_observation("beans and grinder on the counter").await;
    engine.process_observation("maybe grinding now, hard to tell").await;

    let fresh = engine.handle_query("what step am I on").await;
    assert_eq!(fresh.source, AnswerSource::Cache, "Inside TTL");

    tokio::time::sleep(Duration::from_millis(300)).await;

    let stale = engine.handle_query("what step am I on").await;
    assert_eq!(stale.source, AnswerSource::Fallback, "Past TTL");
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_medium_does_not_overturn_fresh_high() {
    // End-to-end check of the guard: MEDIUM for another step right after
    // a HIGH acceptance is rejected, so the cached answer still names the
    // original step.
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![matched(1, 0.9), matched(3, 0.5)],
        fallback.clone(),
    );

    engine.process_observation("beans and grinder on the counter").await;
    engine.process_observation("possibly brewing already?").await;

    let snap = engine.state_snapshot();
    assert_eq!(
        snap.step,
        Some(StepRef::new("coffee", 1)),
        "Guard must hold the HIGH state"
    );

    let response = engine.handle_query("what step am I on").await;
    assert_eq!(response.source, AnswerSource::Cache);
    assert!(response.answer.contains("step 1"), "Got: {}", response.answer);
}

#[tokio::test]
async fn test_unknown_intent_escalates() {
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![matched(1, 0.9)],
        fallback.clone(),
    );

    engine.process_observation("beans and grinder on the counter").await;

    let response = engine.handle_query("could you hum a tune?").await;
    assert_eq!(response.intent, QueryIntent::Unknown);
    assert_eq!(response.source, AnswerSource::Fallback);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_reset_session_starts_empty() {
    let fallback = Arc::new(CountingFallback::new(false));
    let engine = build_engine(
        EngineConfig::default(),
        vec![matched(2, 0.9)],
        fallback.clone(),
    );

    engine.process_observation("grinding the beans").await;
    assert!(!engine.state_snapshot().is_empty());

    engine.reset_session();

    let snap = engine.state_snapshot();
    assert!(snap.is_empty(), "Reset must empty the whiteboard");

    // Next query has nothing cached to serve
    let response = engine.handle_query("what step am I on").await;
    assert_eq!(response.source, AnswerSource::Fallback);
}

#[tokio::test]
async fn test_concurrent_queries_while_observing() {
    // Readers and the writer share the board; a burst of concurrent
    // queries during active observation must neither deadlock nor panic.
    let fallback = Arc::new(CountingFallback::new(false));
    let mut script = vec![matched(1, 0.9)];
    script.extend((0..20).map(|_| matched(1, 0.9)));
    let engine = Arc::new(build_engine(EngineConfig::default(), script, fallback));

    engine.process_observation("beans and grinder on the counter").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                let response = engine.handle_query("what step am I on").await;
                assert_eq!(response.source, AnswerSource::Cache);
            }
        }));
    }
    for _ in 0..20 {
        engine.process_observation("still at the counter with the beans").await;
    }

    for handle in handles {
        handle.await.expect("query task must not panic");
    }
}
