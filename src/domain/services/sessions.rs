#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::models::ChatError;
use crate::domain::models::ChatMessage;
use crate::domain::models::ChatSession;
use crate::domain::models::ContextMessage;
use crate::domain::models::Role;
use crate::infrastructure::storage::KvStore;
use crate::infrastructure::storage::Partition;

const SESSIONS_KEY: &str = "chatSessions";
const CURRENT_KEY: &str = "currentChatSession";

/// The model is sent at most this many trailing messages as history, keeping
/// the request payload bounded. The on-screen transcript is never trimmed.
pub const AI_CONTEXT_LIMIT: usize = 20;

/// Owns the session registry and the current-session pointer, and is the only
/// writer of either. Every mutation ends with an awaited persist; persistence
/// failures are logged and the in-memory state stays authoritative for the
/// rest of the run.
pub struct SessionStore<S: KvStore> {
    storage: S,
    sessions: HashMap<String, ChatSession>,
    current: Option<String>,
    source_url: String,
    persist_lock: Mutex<()>,
}

impl<S: KvStore> SessionStore<S> {
    pub fn new(storage: S, source_url: &str) -> SessionStore<S> {
        return SessionStore {
            storage,
            sessions: HashMap::new(),
            current: None,
            source_url: source_url.to_string(),
            persist_lock: Mutex::new(()),
        };
    }

    /// Hydrates the registry from storage, replacing the in-memory state
    /// wholesale rather than merging.
    pub async fn load(&mut self) -> Result<(), ChatError> {
        let sessions_payload = self.storage.get(Partition::Local, SESSIONS_KEY).await?;
        let current_payload = self.storage.get(Partition::Local, CURRENT_KEY).await?;

        self.sessions.clear();
        self.current = None;

        if let Some(payload) = sessions_payload {
            let sessions = serde_json::from_str::<Vec<ChatSession>>(&payload)
                .map_err(|err| return ChatError::Storage(err.to_string()))?;
            for session in sessions {
                self.sessions.insert(session.id.to_string(), session);
            }
        }

        if let Some(payload) = current_payload {
            let id = serde_json::from_str::<Option<String>>(&payload)
                .map_err(|err| return ChatError::Storage(err.to_string()))?;
            // A dangling pointer is treated as no active session.
            if let Some(id) = id {
                if self.sessions.contains_key(&id) {
                    self.current = Some(id);
                }
            }
        }

        return Ok(());
    }

    /// Persists the whole registry plus the current-session pointer.
    /// Serialized through a lock so overlapping saves cannot interleave.
    pub async fn save(&self) -> Result<(), ChatError> {
        let _guard = self.persist_lock.lock().await;

        let sessions = self.sessions.values().collect::<Vec<&ChatSession>>();
        let sessions_payload = serde_json::to_string(&sessions)
            .map_err(|err| return ChatError::Storage(err.to_string()))?;
        let current_payload = serde_json::to_string(&self.current)
            .map_err(|err| return ChatError::Storage(err.to_string()))?;

        self.storage
            .set(Partition::Local, SESSIONS_KEY, &sessions_payload)
            .await?;
        self.storage
            .set(Partition::Local, CURRENT_KEY, &current_payload)
            .await?;

        return Ok(());
    }

    /// Idempotent: reuses the current session when one exists, otherwise
    /// creates one.
    pub async fn init_session(&mut self) -> String {
        if let Some(id) = &self.current {
            if self.sessions.contains_key(id) {
                return id.to_string();
            }
        }

        return self.create_session().await;
    }

    /// Always creates a brand-new session and makes it current.
    pub async fn create_session(&mut self) -> String {
        let session = ChatSession::new(&self.source_url);
        let id = session.id.to_string();

        self.sessions.insert(id.to_string(), session);
        self.current = Some(id.to_string());
        self.persist_or_log().await;

        return id;
    }

    /// Appends a message to the current session, creating one on demand.
    /// Storage failures are logged only; the appended message stays in memory
    /// regardless.
    pub async fn add_message(&mut self, role: Role, content: &str) {
        let id = self.init_session().await;

        if let Some(session) = self.sessions.get_mut(&id) {
            session.push(ChatMessage::new(role, content));
        }

        self.persist_or_log().await;
    }

    /// Makes `id` the current session if it exists; persists the pointer on
    /// success.
    pub async fn switch_session(&mut self, id: &str) -> bool {
        if !self.sessions.contains_key(id) {
            return false;
        }

        self.current = Some(id.to_string());
        self.persist_or_log().await;

        return true;
    }

    /// Empties the current session's transcript and resets its title, keeping
    /// the session and its id in place.
    pub async fn clear_session(&mut self) {
        let Some(id) = self.current.clone() else {
            return;
        };

        if let Some(session) = self.sessions.get_mut(&id) {
            session.reset();
        }

        self.persist_or_log().await;
    }

    /// All sessions, most recently updated first.
    pub fn list_sessions(&self) -> Vec<&ChatSession> {
        let mut sessions = self.sessions.values().collect::<Vec<&ChatSession>>();
        sessions.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));

        return sessions;
    }

    /// The unabridged transcript of the current session, for rendering.
    pub fn chat_context(&self) -> &[ChatMessage] {
        if let Some(session) = self.current_session() {
            return &session.messages;
        }

        return &[];
    }

    /// The trailing [`AI_CONTEXT_LIMIT`] messages of the current session in
    /// wire format, for the completion request.
    pub fn ai_context(&self) -> Vec<ContextMessage> {
        let messages = self.chat_context();
        let skip = messages.len().saturating_sub(AI_CONTEXT_LIMIT);

        return messages
            .iter()
            .skip(skip)
            .map(|msg| return ContextMessage::new(msg.role.as_str(), &msg.content))
            .collect();
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        return self
            .current
            .as_ref()
            .and_then(|id| return self.sessions.get(id));
    }

    pub fn current_id(&self) -> Option<&str> {
        return self.current.as_deref();
    }

    async fn persist_or_log(&self) {
        if let Err(err) = self.save().await {
            tracing::error!(error = %err, "failed to persist chat sessions");
        }
    }
}
