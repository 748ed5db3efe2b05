use thiserror::Error;

/// Failure taxonomy for the chat core. Parse failures on individual stream
/// frames are recovered in place and never become a `ChatError`.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The endpoint rejected the request before any streaming began.
    #[error("chat endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport failed after streaming started. `partial` carries the
    /// best-effort text accumulated before the failure.
    #[error("stream interrupted: {reason}")]
    Interrupted { partial: String, reason: String },

    /// The in-flight request was aborted through its cancellation handle.
    #[error("request canceled")]
    Canceled { partial: String },

    /// Durable storage read/write failed. Never surfaced to the user; the
    /// in-memory registry stays authoritative for the rest of the run.
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("a completion request is already in flight")]
    InFlight,
}

impl ChatError {
    /// Text accumulated before the failure, when any exists.
    pub fn partial(&self) -> Option<&str> {
        match self {
            ChatError::Interrupted { partial, .. } | ChatError::Canceled { partial } => {
                if partial.is_empty() {
                    return None;
                }
                return Some(partial);
            }
            _ => return None,
        }
    }
}
