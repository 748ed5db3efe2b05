#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::ChatMessage;
use super::Role;

pub const PLACEHOLDER_TITLE: &str = "New chat";

const TITLE_MAX_CHARS: usize = 50;

/// One multi-turn conversation thread. Field names mirror the shape stored in
/// the durable `local` partition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_url: String,
}

impl ChatSession {
    pub fn new(source_url: &str) -> ChatSession {
        let now = Utc::now();
        return ChatSession {
            id: ChatSession::create_id(),
            title: PLACEHOLDER_TITLE.to_string(),
            messages: vec![],
            created_at: now,
            updated_at: now,
            source_url: source_url.to_string(),
        };
    }

    /// Epoch milliseconds plus a random suffix, unique for all practical
    /// purposes within a single run.
    pub fn create_id() -> String {
        let suffix = Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();

        return format!("{}-{suffix}", Utc::now().timestamp_millis());
    }

    /// Appends a message, refreshes `updated_at`, and derives the title from
    /// the first user message while the placeholder title is still in place.
    pub fn push(&mut self, message: ChatMessage) {
        if self.title == PLACEHOLDER_TITLE && message.role == Role::User {
            self.title = ChatSession::derive_title(&message.content);
        }

        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Empties the transcript and resets the title without touching the id,
    /// so the session slot survives a "clear chat".
    pub fn reset(&mut self) {
        self.messages.clear();
        self.title = PLACEHOLDER_TITLE.to_string();
        self.updated_at = Utc::now();
    }

    fn derive_title(content: &str) -> String {
        let trimmed = content.trim();
        if trimmed.chars().count() <= TITLE_MAX_CHARS {
            return trimmed.to_string();
        }

        let truncated = trimmed.chars().take(TITLE_MAX_CHARS).collect::<String>();
        return format!("{truncated}...");
    }
}
