use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// One message of the conversation history sent to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Interface for a stateless language model.
/// Stateless means the LLM doesn't store memory, system prompts, or user
/// messages; the caller supplies the full history on every call.
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Generate a chat completion asynchronously.
    /// Returns a stream of response tokens.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, anyhow::Error>>, anyhow::Error>;
}
