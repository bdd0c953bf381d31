use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::stateless_llm_interface::{ChatMessage, StatelessLLMInterface};

/// Ollama LLM implementation, streaming tokens from the native `/api/chat`
/// NDJSON endpoint.
pub struct OllamaLLM {
    client: Client,
    model: String,
    base_url: String,
    temperature: f32,
    /// Seconds the backend keeps the model loaded after the request.
    keep_alive: f32,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    keep_alive: f32,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaLLM {
    pub fn new(model: String, base_url: String, temperature: f32, keep_alive: f32) -> Self {
        info!("Initialized OllamaLLM: model={}, base_url={}", model, base_url);
        Self {
            client: Client::new(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
            keep_alive,
        }
    }

    fn parse_line(line: &str) -> Option<Result<String, anyhow::Error>> {
        match serde_json::from_str::<OllamaChatChunk>(line) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    return Some(Err(anyhow!("Ollama error: {}", error)));
                }
                if chunk.done {
                    return None;
                }
                let content = chunk.message.map(|m| m.content).unwrap_or_default();
                if content.is_empty() {
                    None
                } else {
                    Some(Ok(content))
                }
            }
            Err(e) => Some(Err(anyhow!("Invalid chunk from Ollama: {}", e))),
        }
    }
}

#[async_trait]
impl StatelessLLMInterface for OllamaLLM {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String, anyhow::Error>>, anyhow::Error> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(sys) = system {
            request_messages.push(ChatMessage::new("system", sys));
        }
        request_messages.extend(messages.iter().cloned());

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: request_messages,
            stream: true,
            keep_alive: self.keep_alive,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama returned {}: {}", status, detail));
        }

        // NDJSON chunks can arrive split across network reads; buffer until
        // a full line is available.
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from))
            .scan(String::new(), |buffer, chunk| {
                let tokens: Vec<Result<String, anyhow::Error>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        let mut out = Vec::new();
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim().to_string();
                            buffer.drain(..=pos);
                            if line.is_empty() {
                                continue;
                            }
                            if let Some(token) = Self::parse_line(&line) {
                                out.push(token);
                            }
                        }
                        out
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(tokens)))
            })
            .flatten();

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::OllamaLLM;

    #[test]
    fn parse_line_extracts_content() {
        let line = r#"{"message":{"role":"assistant","content":"Hello"},"done":false}"#;
        let token = OllamaLLM::parse_line(line).unwrap().unwrap();
        assert_eq!(token, "Hello");
    }

    #[test]
    fn parse_line_skips_done_marker() {
        let line = r#"{"done":true,"total_duration":100}"#;
        assert!(OllamaLLM::parse_line(line).is_none());
    }

    #[test]
    fn parse_line_surfaces_backend_error() {
        let line = r#"{"error":"model not found"}"#;
        let err = OllamaLLM::parse_line(line).unwrap().unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn parse_line_rejects_garbage() {
        assert!(OllamaLLM::parse_line("not json").unwrap().is_err());
    }
}
