use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use crate::consistency::{build_prompt, image_key, ContextSnapshot, ContextStore};

use super::interface::{ArtifactKind, GenerationParams, ImageBackendInterface};
use super::GenerateError;

fn is_safe_filename(filename: &str) -> bool {
    if filename.is_empty() || filename.len() > 255 || filename.contains("..") {
        return false;
    }
    let pattern = Regex::new(r"^[^/\\]+$").unwrap();
    pattern.is_match(filename)
}

/// Drives one image generation end to end: final prompt, backend call,
/// context store record, PNG on disk.
pub struct ImageGenerator {
    backend: Arc<dyn ImageBackendInterface>,
    params: GenerationParams,
    output_dir: PathBuf,
}

impl ImageGenerator {
    pub fn new(
        backend: Arc<dyn ImageBackendInterface>,
        params: GenerationParams,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            params,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate an image for `prompt` using the resolved `context`. On
    /// success the store gains an `ImageRecord` keyed by the normalized
    /// prompt, holding the original resolved context (not re-merged), and
    /// the image bytes land at `<output_dir>/<key>.png`.
    pub async fn generate_image(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
        store: &mut ContextStore,
    ) -> Result<PathBuf, GenerateError> {
        let detailed_prompt = build_prompt(prompt, context);
        info!("Final image prompt: {}", detailed_prompt);

        let artifacts = self.backend.generate(&detailed_prompt, &self.params).await?;

        // Only the first image artifact counts; extra samples are ignored.
        let artifact = artifacts
            .into_iter()
            .find(|artifact| artifact.kind == ArtifactKind::Image)
            .ok_or(GenerateError::NoArtifact)?;

        let key = image_key(prompt);
        if !is_safe_filename(&key) {
            return Err(GenerateError::InvalidKey(key));
        }

        store.record_generation(key.clone(), context.clone());

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.png", key));
        fs::write(&path, &artifact.bytes)?;
        debug!("Wrote generated image to {:?}", path);

        Ok(path)
    }
}
