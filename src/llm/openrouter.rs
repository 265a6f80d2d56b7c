//! OpenRouter-compatible chat-completion client.
//!
//! Works against any OpenAI-style `/chat/completions` endpoint; the default
//! base URL targets OpenRouter. Failures are returned to the generator,
//! which handles fallback to the next candidate model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GENERATION_TIMEOUT_SECS;
use crate::error::{QuerionError, Result};
use crate::llm::types::Message;
use crate::llm::CompletionClient;

/// Referer and title advertised to OpenRouter for request attribution.
const APP_REFERER: &str = "https://querion.app";
const APP_TITLE: &str = "Querion";

/// Sampling temperature. Low, since SQL generation wants determinism.
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenRouterClient {
    /// Creates a client for the given endpoint.
    ///
    /// A trailing slash on `base_url` is tolerated.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GENERATION_TIMEOUT_SECS))
            .build()
            .map_err(|e| QuerionError::generation(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            client,
        })
    }

    /// Extracts the provider's error message from a failure body, falling
    /// back to the raw body when it is not the expected JSON shape.
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
            return parsed.error.message;
        }
        format!("HTTP {status}: {body}")
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        let request = CompletionRequest {
            model,
            messages,
            temperature: TEMPERATURE,
        };

        debug!(model, "Sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuerionError::generation(format!("Request to model {model} timed out"))
                } else {
                    QuerionError::generation(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuerionError::generation(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(QuerionError::generation(Self::error_message(status, &body)));
        }

        let completion: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| QuerionError::generation(format!("Failed to parse response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(QuerionError::generation(format!(
                "Model {model} returned empty content"
            )));
        }

        Ok(content)
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
