use std::collections::BTreeMap;
use std::fs;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub system_config: SystemConfig,
    pub character_config: CharacterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_image_output_dir")]
    pub image_output_dir: String,
    #[serde(default)]
    pub llm_config: LLMConfig,
    #[serde(default)]
    pub image_backend_config: ImageBackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Seconds the backend keeps the model loaded between requests.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBackendConfig {
    #[serde(default = "default_image_api_base")]
    pub api_base: String,
    #[serde(default = "default_image_engine")]
    pub engine: String,
}

/// Character configuration: identity, persona prompt and the seed visual
/// facts for the consistency subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub conf_name: String,
    pub conf_uid: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default = "default_human_name")]
    pub human_name: String,
    pub persona_prompt: String,
    #[serde(default)]
    pub character_traits: BTreeMap<String, String>,
    #[serde(default)]
    pub locations: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_image_output_dir() -> String {
    "generated_images".to_string()
}

fn default_llm_provider() -> String {
    "ollama".to_string()
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "tinyllama".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_keep_alive() -> f32 {
    300.0
}

fn default_image_api_base() -> String {
    "https://api.stability.ai".to_string()
}

fn default_image_engine() -> String {
    "stable-diffusion-v1-6".to_string()
}

fn default_human_name() -> String {
    "Human".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        // Determine file type by extension.
        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") || path_lower.ends_with(".jsonld") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.character_config.validate()?;
        Ok(config)
    }
}

impl CharacterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.persona_prompt.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "persona_prompt cannot be empty. Please provide a persona prompt."
            ));
        }
        Ok(())
    }

    /// The name shown for the character, falling back to the config name.
    pub fn display_name(&self) -> &str {
        if self.character_name.is_empty() {
            &self.conf_name
        } else {
            &self.character_name
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            image_output_dir: default_image_output_dir(),
            llm_config: LLMConfig::default(),
            image_backend_config: ImageBackendConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            keep_alive: default_keep_alive(),
        }
    }
}

impl Default for ImageBackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_image_api_base(),
            engine: default_image_engine(),
        }
    }
}
