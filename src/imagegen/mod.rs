//! Image backend invocation: the backend seam, the Stability client and the
//! generation pipeline that records consistency context and persists images.

pub mod generator;
pub mod interface;
pub mod stability_client;

use thiserror::Error;

pub use generator::ImageGenerator;
pub use interface::{Artifact, ArtifactKind, GenerationParams, ImageBackendInterface};
pub use stability_client::StabilityClient;

/// Everything that can go wrong on the image path. All variants collapse to
/// the same user-visible behavior: text-only response plus an apology.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("STABILITY_KEY is not set; image generation is unavailable")]
    MissingCredential,

    #[error("image backend request failed")]
    Backend(#[from] reqwest::Error),

    #[error("image backend rejected the request ({status}): {detail}")]
    BackendStatus {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("image backend returned no usable image artifact")]
    NoArtifact,

    #[error("could not decode image artifact")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to persist generated image")]
    Io(#[from] std::io::Error),

    #[error("prompt produced an unusable image key: {0:?}")]
    InvalidKey(String),
}
