use async_trait::async_trait;
use thiserror::Error;

use crate::kernel::observation::StepMatch;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("matcher unavailable: {0}")]
    Unavailable(String),
}

/// The embedding/similarity collaborator. Given raw scene text, it ranks
/// the known task steps and hands back the best candidate with its score.
///
/// The engine treats the score as ground truth. Errors and "no match"
/// both degrade to a NONE-tier observation; neither stops the loop.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    async fn best_match(&self, text: &str) -> Result<Option<StepMatch>, MatchError>;
}
