use serde::Serialize;

/// The fixed set of question shapes the instant path understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    CurrentStep,
    NextStep,
    RequiredTools,
    CompletionStatus,
    ProgressOverview,
    Help,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub intent: QueryIntent,
    /// How well the winning rule fits, in [0, 1]. Unknown carries 0.
    pub confidence: f32,
}

/// One row of the rule table: any pattern substring-matching the lowered
/// query text claims the intent.
struct IntentRule {
    intent: QueryIntent,
    confidence: f32,
    patterns: &'static [&'static str],
}

/// Ordered top-down, most specific first; the first matching rule wins.
/// Multi-word phrasings sit above the single-keyword catch-alls so that
/// "what do i need" lands on tools, not on a generic "what" rule.
const RULES: &[IntentRule] = &[
    IntentRule {
        intent: QueryIntent::CurrentStep,
        confidence: 0.9,
        patterns: &[
            "what step",
            "where am i",
            "which step",
            "current step",
            "what am i doing",
        ],
    },
    IntentRule {
        intent: QueryIntent::NextStep,
        confidence: 0.9,
        patterns: &[
            "next step",
            "what's next",
            "whats next",
            "what is next",
            "what comes after",
            "after this",
        ],
    },
    IntentRule {
        intent: QueryIntent::RequiredTools,
        confidence: 0.85,
        patterns: &[
            "what do i need",
            "what tools",
            "tools",
            "equipment",
            "supplies",
        ],
    },
    IntentRule {
        intent: QueryIntent::CompletionStatus,
        confidence: 0.85,
        patterns: &["am i done", "am i finished", "is it done", "finished"],
    },
    IntentRule {
        intent: QueryIntent::ProgressOverview,
        confidence: 0.85,
        patterns: &[
            "progress",
            "how far",
            "how much longer",
            "how much is left",
            "how many steps",
        ],
    },
    IntentRule {
        intent: QueryIntent::Help,
        confidence: 0.8,
        patterns: &["help", "how do i", "stuck", "what should i do"],
    },
    // Single-keyword catch-alls, deliberately last and lower-confidence.
    IntentRule {
        intent: QueryIntent::NextStep,
        confidence: 0.6,
        patterns: &["next", "then"],
    },
    IntentRule {
        intent: QueryIntent::RequiredTools,
        confidence: 0.5,
        patterns: &["need"],
    },
    IntentRule {
        intent: QueryIntent::CompletionStatus,
        confidence: 0.5,
        patterns: &["done"],
    },
];

/// Deterministic, side-effect-free classification. One lowercase pass,
/// then a top-down scan of the rule table; no match -> Unknown at 0.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();

    for rule in RULES {
        if rule.patterns.iter().any(|p| lowered.contains(p)) {
            return Classification {
                intent: rule.intent,
                confidence: rule.confidence,
            };
        }
    }

    Classification {
        intent: QueryIntent::Unknown,
        confidence: 0.0,
    }
}
