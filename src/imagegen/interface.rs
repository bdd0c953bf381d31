use async_trait::async_trait;

use super::GenerateError;

/// Fixed generation parameters sent with every request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub seed: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 123,
            steps: 30,
            cfg_scale: 7.0,
            width: 512,
            height: 512,
            samples: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    /// Non-image payloads (filtered or otherwise unusable output).
    Other,
}

/// One payload returned by the image backend.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

/// Interface for an image-generation backend. Implementations must detect a
/// missing credential before performing any network call.
#[async_trait]
pub trait ImageBackendInterface: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<Artifact>, GenerateError>;
}
