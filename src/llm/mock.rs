//! Scripted completion client for tests.

use crate::error::{QuerionError, Result};
use crate::llm::types::Message;
use crate::llm::CompletionClient;
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns queued responses in order and records which models were tried.
#[derive(Default)]
pub struct MockCompletionClient {
    responses: Mutex<Vec<Result<String>>>,
    calls: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful completion.
    pub fn push_content(&self, content: impl Into<String>) {
        self.responses.lock().unwrap().push(Ok(content.into()));
    }

    /// Queues a failed attempt.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push(Err(QuerionError::generation(message.into())));
    }

    /// Models that were asked for a completion, in call order.
    pub fn models_tried(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, model: &str, _messages: &[Message]) -> Result<String> {
        self.calls.lock().unwrap().push(model.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(QuerionError::generation("No scripted response"));
        }
        responses.remove(0)
    }
}
