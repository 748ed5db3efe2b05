#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

/// One turn in a chat transcript. Messages are immutable once appended to a
/// session, with the single exception of the in-progress assistant message,
/// which grows through [`ChatMessage::append`] until its stream ends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> ChatMessage {
        return ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        };
    }

    pub fn append(&mut self, fragment: &str) {
        self.content += fragment;
    }
}
