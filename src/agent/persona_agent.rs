use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::agent::stateless_llm::{ChatMessage, StatelessLLMInterface};

/// Agent with basic chat memory: keeps the full message history in a list
/// and sends it to the model backend on every turn, together with the fixed
/// persona prompt as the system instruction.
pub struct PersonaAgent {
    memory: Vec<ChatMessage>,
    llm: Arc<dyn StatelessLLMInterface>,
    system: String,
}

impl PersonaAgent {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>, system: String) -> Self {
        debug!("PersonaAgent system prompt: '''{}'''", system);
        info!("PersonaAgent initialized.");
        Self {
            memory: Vec::new(),
            llm,
            system,
        }
    }

    /// Run one chat turn. Tokens are forwarded to `sender` as they arrive
    /// (display only); the completed response is returned and appended to
    /// memory. A stream error aborts the turn before memory is updated with
    /// an assistant message.
    pub async fn chat(
        &mut self,
        user_input: &str,
        sender: &UnboundedSender<String>,
    ) -> anyhow::Result<String> {
        self.memory.push(ChatMessage::new("user", user_input));

        let mut token_stream = self
            .llm
            .chat_completion(&self.memory, Some(&self.system))
            .await?;

        let mut response = String::new();
        while let Some(token) = token_stream.next().await {
            let token = token?;
            let _ = sender.send(
                serde_json::json!({
                    "type": "token",
                    "text": token
                })
                .to_string(),
            );
            response.push_str(&token);
        }

        self.memory.push(ChatMessage::new("assistant", &response));
        Ok(response)
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use tokio::sync::mpsc;

    use super::*;

    struct ScriptedLLM {
        tokens: Vec<&'static str>,
    }

    #[async_trait]
    impl StatelessLLMInterface for ScriptedLLM {
        async fn chat_completion(
            &self,
            _messages: &[ChatMessage],
            _system: Option<&str>,
        ) -> Result<BoxStream<'static, Result<String, anyhow::Error>>, anyhow::Error> {
            let tokens: Vec<Result<String, anyhow::Error>> =
                self.tokens.iter().map(|t| Ok(t.to_string())).collect();
            Ok(Box::pin(futures::stream::iter(tokens)))
        }
    }

    #[tokio::test]
    async fn chat_collects_tokens_and_updates_memory() {
        let llm = Arc::new(ScriptedLLM {
            tokens: vec!["Sure, ", "here ", "it ", "is"],
        });
        let mut agent = PersonaAgent::new(llm, "persona".into());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let response = agent.chat("Show me your college", &tx).await.unwrap();
        assert_eq!(response, "Sure, here it is");
        // user + assistant
        assert_eq!(agent.memory_len(), 2);

        drop(tx);
        let mut streamed = String::new();
        while let Some(raw) = rx.recv().await {
            let event: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(event["type"], "token");
            streamed.push_str(event["text"].as_str().unwrap());
        }
        assert_eq!(streamed, "Sure, here it is");
    }
}
