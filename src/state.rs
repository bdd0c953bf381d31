use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::{PersonaAgent, StatelessLLMFactory, StatelessLLMInterface};
use crate::config::Config;
use crate::consistency::{ContextStore, PersonaProfile};
use crate::conversations::types::Transcript;
use crate::imagegen::{GenerationParams, ImageGenerator, StabilityClient};

/// Everything a session owns: its agent memory, consistency store and
/// transcript. Single writer per session.
pub struct Session {
    pub session_uid: String,
    pub agent: PersonaAgent,
    pub store: ContextStore,
    pub transcript: Transcript,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn StatelessLLMInterface>,
    pub generator: Arc<ImageGenerator>,
    pub sessions: Arc<DashMap<String, Arc<RwLock<Session>>>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = StatelessLLMFactory::create_llm(&config.system_config.llm_config)?;

        let image_config = &config.system_config.image_backend_config;
        let backend = Arc::new(StabilityClient::from_env(
            image_config.api_base.clone(),
            image_config.engine.clone(),
        ));
        let generator = Arc::new(ImageGenerator::new(
            backend,
            GenerationParams::default(),
            config.system_config.image_output_dir.clone(),
        ));

        Ok(Self {
            config,
            llm,
            generator,
            sessions: Arc::new(DashMap::new()),
        })
    }

    /// Create a fresh session with its own context store and transcript,
    /// seeded from the configured persona.
    pub fn create_session(&self) -> Arc<RwLock<Session>> {
        let character = &self.config.character_config;
        let profile = PersonaProfile {
            character_traits: character.character_traits.clone(),
            locations: character.locations.clone(),
        };

        let session_uid = Uuid::new_v4().to_string();
        let session = Session {
            session_uid: session_uid.clone(),
            agent: PersonaAgent::new(self.llm.clone(), character.persona_prompt.clone()),
            store: ContextStore::new(profile),
            transcript: Transcript::default(),
        };

        let handle = Arc::new(RwLock::new(session));
        self.sessions.insert(session_uid, handle.clone());
        handle
    }

    pub fn remove_session(&self, session_uid: &str) {
        self.sessions.remove(session_uid);
    }
}
