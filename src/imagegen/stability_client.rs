use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::interface::{Artifact, ArtifactKind, GenerationParams, ImageBackendInterface};
use super::GenerateError;

/// Environment variable carrying the API credential.
pub const STABILITY_KEY_VAR: &str = "STABILITY_KEY";

/// Stability AI text-to-image client.
pub struct StabilityClient {
    client: Client,
    api_base: String,
    engine: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    width: u32,
    height: u32,
    samples: u32,
    seed: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    artifacts: Vec<ArtifactPayload>,
}

#[derive(Debug, Deserialize)]
struct ArtifactPayload {
    #[serde(default)]
    base64: String,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

impl StabilityClient {
    pub fn new(api_base: String, engine: String, api_key: Option<String>) -> Self {
        info!(
            "Initialized StabilityClient: api_base={}, engine={}",
            api_base, engine
        );
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            engine,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Build a client with the credential taken from `STABILITY_KEY`.
    pub fn from_env(api_base: String, engine: String) -> Self {
        Self::new(api_base, engine, std::env::var(STABILITY_KEY_VAR).ok())
    }
}

#[async_trait]
impl ImageBackendInterface for StabilityClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<Artifact>, GenerateError> {
        // Short-circuit before any network traffic.
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerateError::MissingCredential);
        };

        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.api_base, self.engine
        );
        let body = GenerationRequest {
            text_prompts: vec![TextPrompt { text: prompt }],
            cfg_scale: params.cfg_scale,
            width: params.width,
            height: params.height,
            samples: params.samples,
            seed: params.seed,
            steps: params.steps,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerateError::BackendStatus { status, detail });
        }

        let payload: GenerationResponse = response.json().await?;
        debug!("Image backend returned {} artifact(s)", payload.artifacts.len());

        let mut artifacts = Vec::with_capacity(payload.artifacts.len());
        for artifact in payload.artifacts {
            let kind = match artifact.finish_reason.as_deref() {
                Some("CONTENT_FILTERED") => ArtifactKind::Other,
                _ => ArtifactKind::Image,
            };
            let bytes = BASE64.decode(artifact.base64.as_bytes())?;
            artifacts.push(Artifact { kind, bytes });
        }
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let client = StabilityClient::new(
            "https://api.stability.ai".into(),
            "stable-diffusion-v1-6".into(),
            None,
        );
        let result = client
            .generate("a red brick college", &GenerationParams::default())
            .await;
        assert!(matches!(result, Err(GenerateError::MissingCredential)));
    }

    #[tokio::test]
    async fn blank_credential_counts_as_missing() {
        let client = StabilityClient::new(
            "https://api.stability.ai".into(),
            "stable-diffusion-v1-6".into(),
            Some("   ".into()),
        );
        let result = client
            .generate("a red brick college", &GenerationParams::default())
            .await;
        assert!(matches!(result, Err(GenerateError::MissingCredential)));
    }
}
