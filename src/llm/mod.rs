//! SQL generation via chat-completion providers.
//!
//! The [`CompletionClient`] trait abstracts the HTTP provider so the
//! generator and pipeline can be tested with a scripted client.

pub mod generator;
pub mod mock;
pub mod openrouter;
pub mod parser;
pub mod prompt;
pub mod types;

pub use generator::{SqlGenerator, DEFAULT_MODELS};
pub use mock::MockCompletionClient;
pub use openrouter::OpenRouterClient;
pub use parser::parse_completion;
pub use prompt::build_messages;
pub use types::{GeneratedQuery, Message, Role};

use crate::error::Result;
use async_trait::async_trait;

/// A chat-completion backend.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the messages to the given model and returns the raw completion
    /// text. An empty completion is an error.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String>;
}
