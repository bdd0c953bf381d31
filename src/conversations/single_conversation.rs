use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::consistency::{resolve_context, should_generate_image};
use crate::state::{AppState, Session};

/// Fixed suffix appended to the response when the image path fails.
pub const APOLOGY_SUFFIX: &str =
    "\n\nI apologize, but I couldn't generate the image you requested.";

/// Process one conversation turn: user turn in, model response (streamed),
/// optional image generation, assistant turn out.
///
/// A model-backend failure aborts the turn with an error; image-path
/// failures are absorbed into a text-only assistant turn with an apology.
pub async fn process_single_conversation(
    state: &AppState,
    session: &mut Session,
    user_input: &str,
    sender: &UnboundedSender<String>,
) -> anyhow::Result<()> {
    info!("Processing turn for session {}", session.session_uid);

    let _ = sender.send(
        serde_json::json!({
            "type": "control",
            "text": "conversation-chain-start"
        })
        .to_string(),
    );

    session.transcript.push_user(user_input);

    let response = session.agent.chat(user_input, sender).await?;

    if !should_generate_image(user_input, &response) {
        session.transcript.push_assistant(&response, None);
        send_chain_end(sender);
        return Ok(());
    }

    info!("Image generation triggered");
    let context = resolve_context(&session.store, user_input);

    match state
        .generator
        .generate_image(user_input, &context, &mut session.store)
        .await
    {
        Ok(path) => {
            let path = path.display().to_string();
            info!("Image generated successfully: {}", path);
            session
                .transcript
                .push_assistant(&response, Some(path.clone()));
            let _ = sender.send(
                serde_json::json!({
                    "type": "image",
                    "path": path
                })
                .to_string(),
            );
        }
        Err(e) => {
            warn!("Image generation failed: {}", e);
            let _ = sender.send(
                serde_json::json!({
                    "type": "full-text",
                    "text": APOLOGY_SUFFIX
                })
                .to_string(),
            );
            let apologetic = format!("{}{}", response, APOLOGY_SUFFIX);
            session.transcript.push_assistant(&apologetic, None);
        }
    }

    send_chain_end(sender);
    Ok(())
}

fn send_chain_end(sender: &UnboundedSender<String>) {
    let _ = sender.send(
        serde_json::json!({
            "type": "control",
            "text": "conversation-chain-end"
        })
        .to_string(),
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use dashmap::DashMap;
    use futures::stream::BoxStream;
    use tokio::sync::mpsc;

    use super::*;
    use crate::agent::{ChatMessage, StatelessLLMInterface};
    use crate::config::{CharacterConfig, Config, SystemConfig};
    use crate::conversations::types::ROLE_ASSISTANT;
    use crate::imagegen::{
        Artifact, ArtifactKind, GenerateError, GenerationParams, ImageBackendInterface,
        ImageGenerator,
    };

    struct ScriptedLLM {
        tokens: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl StatelessLLMInterface for ScriptedLLM {
        async fn chat_completion(
            &self,
            _messages: &[ChatMessage],
            _system: Option<&str>,
        ) -> Result<BoxStream<'static, Result<String, anyhow::Error>>, anyhow::Error> {
            if self.fail {
                return Err(anyhow::anyhow!("model backend unreachable"));
            }
            let tokens: Vec<Result<String, anyhow::Error>> =
                self.tokens.iter().map(|t| Ok(t.to_string())).collect();
            Ok(Box::pin(futures::stream::iter(tokens)))
        }
    }

    struct FakeBackend {
        succeed: bool,
    }

    #[async_trait]
    impl ImageBackendInterface for FakeBackend {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<Vec<Artifact>, GenerateError> {
            if self.succeed {
                Ok(vec![Artifact {
                    kind: ArtifactKind::Image,
                    bytes: vec![0x89, 0x50, 0x4e, 0x47],
                }])
            } else {
                Err(GenerateError::MissingCredential)
            }
        }
    }

    fn test_config() -> Config {
        Config {
            system_config: SystemConfig::default(),
            character_config: CharacterConfig {
                conf_name: "rancho".into(),
                conf_uid: "rancho-001".into(),
                character_name: "Rancho".into(),
                human_name: "Human".into(),
                persona_prompt: "You are Rancho.".into(),
                character_traits: BTreeMap::new(),
                locations: BTreeMap::new(),
            },
        }
    }

    fn test_state(
        llm: ScriptedLLM,
        backend: FakeBackend,
        output_dir: &std::path::Path,
    ) -> AppState {
        AppState {
            config: test_config(),
            llm: Arc::new(llm),
            generator: Arc::new(ImageGenerator::new(
                Arc::new(backend),
                GenerationParams::default(),
                output_dir,
            )),
            sessions: Arc::new(DashMap::new()),
        }
    }

    async fn collect_events(mut rx: mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Some(raw) = rx.recv().await {
            events.push(serde_json::from_str(&raw).unwrap());
        }
        events
    }

    #[tokio::test]
    async fn visual_turn_generates_image_and_records_context() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            ScriptedLLM {
                tokens: vec!["Sure, ", "here ", "it ", "is"],
                fail: false,
            },
            FakeBackend { succeed: true },
            dir.path(),
        );
        let session = state.create_session();
        let mut session = session.write().await;
        let (tx, rx) = mpsc::unbounded_channel();

        process_single_conversation(&state, &mut session, "Show me your college", &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(session.transcript.len(), 2);
        let last = session.transcript.last().unwrap();
        assert_eq!(last.role, ROLE_ASSISTANT);
        assert_eq!(last.content, "Sure, here it is");
        assert!(last
            .image_path
            .as_deref()
            .unwrap()
            .ends_with("Show_me_your_college.png"));

        assert_eq!(session.store.record_count(), 1);
        assert_eq!(
            session.store.records().next().unwrap().key,
            "Show_me_your_college"
        );

        let events = collect_events(rx).await;
        assert_eq!(events.first().unwrap()["text"], "conversation-chain-start");
        assert!(events.iter().any(|e| e["type"] == "token"));
        assert!(events.iter().any(|e| e["type"] == "image"));
        assert_eq!(events.last().unwrap()["text"], "conversation-chain-end");
    }

    #[tokio::test]
    async fn non_visual_turn_skips_image_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            ScriptedLLM {
                tokens: vec!["Recursion is when a function calls itself."],
                fail: false,
            },
            FakeBackend { succeed: true },
            dir.path(),
        );
        let session = state.create_session();
        let mut session = session.write().await;
        let (tx, rx) = mpsc::unbounded_channel();

        process_single_conversation(&state, &mut session, "what is recursion", &tx)
            .await
            .unwrap();
        drop(tx);

        let last = session.transcript.last().unwrap();
        assert!(last.image_path.is_none());
        assert_eq!(session.store.record_count(), 0);

        let events = collect_events(rx).await;
        assert!(events.iter().all(|e| e["type"] != "image"));
    }

    #[tokio::test]
    async fn image_failure_appends_apology_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            ScriptedLLM {
                tokens: vec!["Sure!"],
                fail: false,
            },
            FakeBackend { succeed: false },
            dir.path(),
        );
        let session = state.create_session();
        let mut session = session.write().await;
        let (tx, rx) = mpsc::unbounded_channel();

        process_single_conversation(&state, &mut session, "Show me your college", &tx)
            .await
            .unwrap();
        drop(tx);

        let last = session.transcript.last().unwrap();
        assert!(last.image_path.is_none());
        assert_eq!(last.content, format!("Sure!{}", APOLOGY_SUFFIX));
        assert_eq!(session.store.record_count(), 0);

        let events = collect_events(rx).await;
        assert!(events.iter().all(|e| e["type"] != "image"));
        assert!(events
            .iter()
            .any(|e| e["type"] == "full-text" && e["text"] == APOLOGY_SUFFIX));
    }

    #[tokio::test]
    async fn model_failure_aborts_turn_before_assistant_reply() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            ScriptedLLM {
                tokens: vec![],
                fail: true,
            },
            FakeBackend { succeed: true },
            dir.path(),
        );
        let session = state.create_session();
        let mut session = session.write().await;
        let (tx, _rx) = mpsc::unbounded_channel();

        let result =
            process_single_conversation(&state, &mut session, "Show me your college", &tx).await;
        assert!(result.is_err());

        // The user turn stands; no assistant turn was appended.
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.store.record_count(), 0);
    }
}
