use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::agent::stateless_llm::{OllamaLLM, StatelessLLMInterface};
use crate::config::LLMConfig;

/// Factory for creating stateless LLM instances from configuration.
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    pub fn create_llm(config: &LLMConfig) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM provider: {}", config.provider);

        match config.provider.as_str() {
            "ollama" => Ok(Arc::new(OllamaLLM::new(
                config.model.clone(),
                config.base_url.clone(),
                config.temperature,
                config.keep_alive,
            ))),
            other => Err(anyhow::anyhow!("Unsupported LLM provider: {}", other)),
        }
    }
}
