use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ChatDelta;
use super::ChatError;

/// One turn of conversation history in the shape chat completion endpoints
/// expect in their request body.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

impl ContextMessage {
    pub fn new(role: &str, content: &str) -> ContextMessage {
        return ContextMessage {
            role: role.to_string(),
            content: content.to_string(),
        };
    }
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend is reachable and configured.
    async fn health_check(&self) -> Result<()>;

    /// Lists the model names the backend can serve.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Streams a completion for `context`, emitting a [`ChatDelta`] through
    /// `tx` for every non-empty text fragment, and returns the accumulated
    /// final text. The whole context, including the newest user turn, must
    /// already be present in `context`.
    ///
    /// Cancelling `cancel` releases the read loop promptly; the partial text
    /// travels back inside the error.
    async fn stream_completion(
        &self,
        context: Vec<ContextMessage>,
        tx: &mpsc::UnboundedSender<ChatDelta>,
        cancel: CancellationToken,
    ) -> Result<String, ChatError>;
}
