//! SQL generation with sequential model fallback.
//!
//! Candidate models are tried in order until one yields a parseable
//! completion. A model that errors, returns empty content, or returns
//! garbage is skipped; only full exhaustion is an error.

use crate::db::SchemaSummary;
use crate::error::{QuerionError, Result};
use crate::llm::parser::parse_completion;
use crate::llm::prompt::build_messages;
use crate::llm::types::GeneratedQuery;
use crate::llm::CompletionClient;
use tracing::{debug, info, warn};

/// Free-tier candidate models, tried in order.
pub const DEFAULT_MODELS: [&str; 6] = [
    "google/gemini-2.0-flash-exp:free",
    "google/gemini-flash-1.5:free",
    "google/gemini-flash-1.5-8b:free",
    "meta-llama/llama-3.3-70b-instruct:free",
    "meta-llama/llama-3.1-8b-instruct:free",
    "qwen/qwen-2.5-72b-instruct:free",
];

/// Shown when generation is skipped because no API key is configured.
const MISSING_KEY_EXPLANATION: &str =
    "LLM API Key is missing or invalid. Please configure a valid API key to generate queries.";

pub struct SqlGenerator {
    client: Box<dyn CompletionClient>,
    models: Vec<String>,
    has_api_key: bool,
}

impl SqlGenerator {
    /// Creates a generator over the given client.
    ///
    /// `model_override` replaces the default candidate list with a single
    /// model (no fallback).
    pub fn new(
        client: Box<dyn CompletionClient>,
        model_override: Option<String>,
        has_api_key: bool,
    ) -> Self {
        Self {
            client,
            models: candidate_models(model_override),
            has_api_key,
        }
    }

    /// The models this generator will try, in order.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Converts a question into SQL against the given schema.
    ///
    /// Short-circuits without a network call when no API key is configured
    /// or the schema is empty or failed to fetch; those outcomes carry an
    /// explanation but no SQL.
    pub async fn generate(
        &self,
        schema: &SchemaSummary,
        question: &str,
    ) -> Result<GeneratedQuery> {
        if !self.has_api_key {
            return Ok(GeneratedQuery::explanation_only(MISSING_KEY_EXPLANATION));
        }

        if schema.is_unusable() {
            return Ok(GeneratedQuery::explanation_only(schema.render()));
        }

        let schema_text = schema.render();
        info!("Generating SQL for prompt: \"{question}\"");
        debug!(
            "Schema snippet: {}...",
            schema_text.chars().take(200).collect::<String>()
        );

        let messages = build_messages(&schema_text, question);
        let mut last_error: Option<QuerionError> = None;

        for model in &self.models {
            debug!("Attempting model: {model}");
            match self.client.complete(model, &messages).await {
                Ok(content) => match parse_completion(&content) {
                    Ok(generated) => return Ok(generated),
                    Err(e) => {
                        warn!("Model {model} returned invalid format, trying next: {e}");
                        last_error = Some(e);
                    }
                },
                Err(e) => {
                    warn!("Model {model} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "All models failed".to_string());
        Err(QuerionError::generation(format!(
            "Failed to generate SQL from AI: {detail}"
        )))
    }
}

/// Resolves the candidate model list.
pub fn candidate_models(model_override: Option<String>) -> Vec<String> {
    match model_override {
        Some(model) => vec![model],
        None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
    }
}
