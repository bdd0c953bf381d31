use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// One turn of the conversation, possibly carrying a generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub timestamp: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Strictly append-only, ordered sequence of turns. Lives and dies with the
/// session.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    fn push(&mut self, role: &str, content: &str, image_path: Option<String>) {
        self.turns.push(Turn {
            role: role.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            content: content.to_string(),
            image_path,
        });
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(ROLE_USER, content, None);
    }

    pub fn push_assistant(&mut self, content: &str, image_path: Option<String>) {
        self.push(ROLE_ASSISTANT, content, image_path);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
