use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use compass::config::EngineConfig;
use compass::engine::{AnswerSource, Engine};
use compass::kernel::observation::{StepMatch, StepRef};
use compass::knowledge::{InMemoryKnowledge, StepInfo, TaskDefinition};
use compass::services::fallback::{FallbackError, FallbackResponder, HttpVlmFallback};
use compass::services::matcher::{MatchError, SemanticMatcher};

// Demo harness: a scripted kitchen session against the coffee task.
// The matcher and fallback below stand in for the real embedding and
// VLM collaborators so the engine can be watched end to end.

/// Keyword-overlap matcher. Scores each step by the fraction of its cue
/// words present in the observation text and returns the best one.
struct KeywordMatcher {
    entries: Vec<(Vec<&'static str>, StepRef)>,
}

#[async_trait]
impl SemanticMatcher for KeywordMatcher {
    async fn best_match(&self, text: &str) -> Result<Option<StepMatch>, MatchError> {
        let lowered = text.to_lowercase();

        let best = self
            .entries
            .iter()
            .map(|(cues, step)| {
                let hits = cues.iter().filter(|c| lowered.contains(**c)).count();
                let score = hits as f32 / cues.len() as f32;
                (score, step)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        Ok(best.filter(|(score, _)| *score > 0.0).map(|(score, step)| {
            StepMatch {
                step: step.clone(),
                score,
            }
        }))
    }
}

/// Canned slow path: pretends to re-query the VLM, with a realistic delay.
struct CannedFallback;

#[async_trait]
impl FallbackResponder for CannedFallback {
    async fn answer(
        &self,
        _query: &str,
        recent_context: Option<&str>,
    ) -> Result<String, FallbackError> {
        tokio::time::sleep(Duration::from_millis(600)).await;
        Ok(match recent_context {
            Some(context) => format!(
                "Taking a fresh look... the last thing I saw was \"{}\". \
                 Let me line that up with your task and get back on track.",
                context
            ),
            None => "Taking a fresh look at the scene now.".to_string(),
        })
    }
}

fn coffee_task() -> TaskDefinition {
    let step = |position, title: &str, description: &str, tools: &[&str], safety: Option<&str>| {
        StepInfo {
            title: title.to_string(),
            description: description.to_string(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            safety_notes: safety.map(|s| s.to_string()),
            duration_secs: None,
            position,
        }
    };

    TaskDefinition {
        task_id: "coffee".to_string(),
        title: "Pour-Over Coffee".to_string(),
        steps: vec![
            step(
                1,
                "Gather Equipment",
                "Set out the kettle, grinder, scale, filter, and fresh beans.",
                &["kettle", "burr grinder", "scale", "paper filter", "coffee beans"],
                None,
            ),
            step(
                2,
                "Grind the Beans",
                "Grind 20 grams of beans to a medium-fine consistency.",
                &["burr grinder", "scale"],
                None,
            ),
            step(
                3,
                "Heat the Water",
                "Bring the kettle to about 95 degrees Celsius.",
                &["kettle"],
                Some("Keep the handle dry; escaping steam can scald."),
            ),
            step(
                4,
                "Bloom and Pour",
                "Wet the grounds, wait thirty seconds, then pour in slow circles.",
                &["kettle", "dripper", "timer"],
                Some("Pour away from your hand holding the dripper."),
            ),
            step(
                5,
                "Serve",
                "Remove the dripper, swirl the carafe, and pour a cup.",
                &["carafe", "cup"],
                None,
            ),
        ],
    }
}

fn demo_matcher() -> KeywordMatcher {
    let entries = vec![
        (
            vec!["counter", "laying out", "beans", "grinder", "kettle"],
            StepRef::new("coffee", 1),
        ),
        (
            vec!["pouring beans", "grinder", "grinding", "grounds"],
            StepRef::new("coffee", 2),
        ),
        (
            vec!["water", "kettle", "steam", "heating"],
            StepRef::new("coffee", 3),
        ),
        (
            vec!["pour", "bloom", "circles", "dripper", "filter"],
            StepRef::new("coffee", 4),
        ),
        (
            vec!["cup", "carafe", "serving", "drinking"],
            StepRef::new("coffee", 5),
        ),
    ];
    KeywordMatcher { entries }
}

/// (observation text, query to fire right after it, if any)
const SCRIPT: &[(&str, Option<&str>)] = &[
    (
        "a person laying out a kettle, grinder and a bag of coffee beans on the counter",
        None,
    ),
    (
        "kettle, scale and beans laid out neatly on the kitchen counter, grinder nearby",
        Some("What step am I on?"),
    ),
    ("", None), // dropped frame
    (
        "hands pouring beans into the grinder, grinding, grounds collecting below",
        Some("what do I need for this?"),
    ),
    (
        "steam rising as water is heating in the kettle",
        Some("how far along am I?"),
    ),
    (
        "the kettle is heating, steam visible",
        Some("what's next"),
    ),
    ("blurry motion, nothing recognizable", None),
    ("dark frame, lens covered", None),
    (
        "still too blurry to tell",
        Some("where am I?"), // three low reads in a row: this one escalates
    ),
    (
        "slow circular pour over the bloom, dripper on the scale",
        Some("could you hum a tune?"), // unknown intent: escalates
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("Compass engine booting...");

    // Point COMPASS_VLM_URL at a live completion endpoint to exercise the
    // real slow path; otherwise the canned one stands in.
    let fallback: Arc<dyn FallbackResponder> = match std::env::var("COMPASS_VLM_URL") {
        Ok(url) => Arc::new(HttpVlmFallback::new(&url, Duration::from_secs(3))),
        Err(_) => Arc::new(CannedFallback),
    };

    let engine = Arc::new(Engine::new(
        EngineConfig::default(),
        Arc::new(demo_matcher()),
        Arc::new(InMemoryKnowledge::new().with_task(coffee_task())),
        fallback,
    ));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        });
    }

    info!("Compass active. Press Ctrl+C to stop.");

    let mut cadence = tokio::time::interval(Duration::from_millis(800));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    for (observation, query) in SCRIPT {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = cadence.tick() => {}
        }

        println!("[SCENE] {}", observation);
        engine.process_observation(observation).await;

        if let Some(query) = query {
            println!("[ASK] {}", query);
            let response = engine.handle_query(query).await;
            let tag = match response.source {
                AnswerSource::Cache => "cache",
                AnswerSource::Fallback => "fallback",
                AnswerSource::FallbackFailed => "fallback-failed",
            };
            println!("[{} | {}ms] {}", tag, response.latency_ms, response.answer);
        }
    }

    let telemetry = engine.telemetry();
    println!(
        "[TELEMETRY] {}",
        serde_json::to_string_pretty(&telemetry)?
    );

    Ok(())
}
