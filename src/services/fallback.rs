use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("fallback transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("fallback server returned {0}")]
    Status(reqwest::StatusCode),
}

/// The slow, authoritative path: re-asks the vision-language model with
/// the user's question plus whatever recent scene context we hold.
/// May fail or time out; the engine owns the deadline.
#[async_trait]
pub trait FallbackResponder: Send + Sync {
    async fn answer(
        &self,
        query: &str,
        recent_context: Option<&str>,
    ) -> Result<String, FallbackError>;
}

#[derive(Serialize)]
struct VlmRequest<'a> {
    prompt: String,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Deserialize)]
struct VlmResponse {
    content: String,
}

/// HTTP client for a VLM completion endpoint.
pub struct HttpVlmFallback {
    client: Client,
    base_url: String,
}

impl HttpVlmFallback {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(request_timeout) // Hard timeout at the network level
                .build()
                .unwrap_or_default(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl FallbackResponder for HttpVlmFallback {
    async fn answer(
        &self,
        query: &str,
        recent_context: Option<&str>,
    ) -> Result<String, FallbackError> {
        let system_prompt = "You are guiding someone through a hands-on task. \
             Look at the scene fresh and answer their question briefly and concretely.";

        let prompt = match recent_context {
            Some(context) => format!(
                "System: {}\nLast observed scene: {}\nUser: {}\nAssistant:",
                system_prompt, context, query
            ),
            None => format!("System: {}\nUser: {}\nAssistant:", system_prompt, query),
        };

        let body = VlmRequest {
            prompt,
            stream: false, // One-shot only
            n_predict: 128,
            temperature: 0.4,
            context: recent_context,
        };

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FallbackError::Status(response.status()));
        }

        let parsed: VlmResponse = response.json().await?;
        Ok(parsed.content.trim().to_string())
    }
}
