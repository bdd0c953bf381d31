use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed visual facts about the character, loaded once at startup from the
/// character configuration. Never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    #[serde(default)]
    pub character_traits: BTreeMap<String, String>,
    /// Location name -> feature name -> description.
    #[serde(default)]
    pub locations: BTreeMap<String, BTreeMap<String, String>>,
}

/// The merged set of visual facts relevant to one image request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    #[serde(default)]
    pub character_traits: BTreeMap<String, String>,
    #[serde(default)]
    pub locations: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub generated_images: BTreeMap<String, ImageRecord>,
}

impl ContextSnapshot {
    /// Override this snapshot's fields with `other`'s, wholesale per field.
    /// Later merges win on collision.
    pub fn merge_from(&mut self, other: &ContextSnapshot) {
        self.character_traits = other.character_traits.clone();
        self.locations = other.locations.clone();
        self.generated_images = other.generated_images.clone();
    }
}

/// One successful image generation: the derived key and the context the
/// image's prompt was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub key: String,
    pub context: ContextSnapshot,
}

/// Per-session memory of the persona profile plus the log of prior
/// generations. Exclusively owned by one session loop.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    profile: PersonaProfile,
    generated_images: BTreeMap<String, ImageRecord>,
}

impl ContextStore {
    pub fn new(profile: PersonaProfile) -> Self {
        Self {
            profile,
            generated_images: BTreeMap::new(),
        }
    }

    pub fn profile(&self) -> &PersonaProfile {
        &self.profile
    }

    /// Full copy of the store: traits, locations and every image record.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            character_traits: self.profile.character_traits.clone(),
            locations: self.profile.locations.clone(),
            generated_images: self.generated_images.clone(),
        }
    }

    /// Store the context used for a finished generation. A later generation
    /// with the same key overwrites the earlier record.
    pub fn record_generation(&mut self, key: String, context: ContextSnapshot) {
        let record = ImageRecord {
            key: key.clone(),
            context,
        };
        self.generated_images.insert(key, record);
    }

    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.generated_images.values()
    }

    pub fn record_count(&self) -> usize {
        self.generated_images.len()
    }
}

/// Derive the deterministic image key for a prompt: whitespace-normalized,
/// words joined by underscores.
pub fn image_key(prompt: &str) -> String {
    prompt.split_whitespace().collect::<Vec<_>>().join("_")
}
