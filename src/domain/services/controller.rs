#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::markdown;
use super::SessionStore;
use crate::domain::models::Backend;
use crate::domain::models::ChatDelta;
use crate::domain::models::ChatError;
use crate::domain::models::ChatMessage;
use crate::domain::models::Role;
use crate::infrastructure::storage::KvStore;

/// Where rendered chat bubbles land. This is the stand-in for the host page
/// container: the terminal front-end implements it, tests substitute a
/// recording fake. The view only ever receives rendered HTML fragments; it
/// never touches session state.
pub trait ChatView {
    /// Mounts a new bubble and returns a handle used for later updates.
    fn append_bubble(&mut self, role: Role, html: &str) -> usize;

    /// Replaces a bubble's content. `typing` marks an in-progress response.
    fn update_bubble(&mut self, handle: usize, html: &str, typing: bool);

    /// Enables or disables the text input control.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Unmounts all bubbles, ahead of re-rendering a transcript.
    fn clear(&mut self);
}

/// Wires the session store, the streaming backend, and the markdown renderer
/// into a message-bubble view. The controller is the single owner of the
/// in-flight request; the store is the single writer of session state.
pub struct ChatController<B: Backend, S: KvStore, V: ChatView> {
    backend: B,
    store: SessionStore<S>,
    view: V,
    in_flight: Option<CancellationToken>,
}

impl<B: Backend, S: KvStore, V: ChatView> ChatController<B, S, V> {
    pub fn new(backend: B, store: SessionStore<S>, view: V) -> ChatController<B, S, V> {
        return ChatController {
            backend,
            store,
            view,
            in_flight: None,
        };
    }

    /// Hydrates the store and renders the current transcript. A failed
    /// hydrate is logged and the controller starts from an empty registry.
    pub async fn open(&mut self) {
        if let Err(err) = self.store.load().await {
            tracing::error!(error = %err, "failed to hydrate chat sessions");
        }

        self.store.init_session().await;
        self.render_transcript();
    }

    /// Sends a user prompt and streams the reply into a placeholder bubble.
    ///
    /// Empty prompts are rejected before any network call, and a second send
    /// while one is in flight is rejected programmatically rather than
    /// relying on the disabled input control. On failure the error text is
    /// rendered and persisted as the assistant turn, so the failure stays
    /// visible when the session reloads. The input control is re-enabled on
    /// every path.
    pub async fn send(&mut self, text: &str) -> Result<(), ChatError> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if self.in_flight.is_some() {
            return Err(ChatError::InFlight);
        }

        self.view.set_input_enabled(false);

        self.store.init_session().await;
        self.store.add_message(Role::User, prompt).await;
        self.view.append_bubble(Role::User, &markdown::render(prompt));

        // The context already carries the new user turn.
        let context = self.store.ai_context();

        let bubble = self.view.append_bubble(Role::Assistant, "");
        self.view.update_bubble(bubble, "", true);

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());

        // The draft grows fragment by fragment and only becomes part of the
        // session once the stream settles.
        let mut draft = ChatMessage::new(Role::Assistant, "");

        let (tx, mut rx) = mpsc::unbounded_channel::<ChatDelta>();
        let request = self.backend.stream_completion(context, &tx, cancel);
        tokio::pin!(request);

        let outcome = loop {
            tokio::select! {
                delta = rx.recv() => {
                    if let Some(delta) = delta {
                        draft.append(&delta.fragment);
                        self.view
                            .update_bubble(bubble, &markdown::render(&draft.content), true);
                    }
                }
                res = &mut request => {
                    break res;
                }
            }
        };

        // Deltas that raced with completion are still rendered in order.
        while let Ok(delta) = rx.try_recv() {
            draft.append(&delta.fragment);
            self.view
                .update_bubble(bubble, &markdown::render(&draft.content), true);
        }

        let result = match outcome {
            Ok(text) => {
                self.store.add_message(Role::Assistant, &text).await;
                self.view
                    .update_bubble(bubble, &markdown::render(&text), false);
                Ok(())
            }
            Err(err) => {
                let transcript = failure_transcript(&err);
                self.store.add_message(Role::Assistant, &transcript).await;
                self.view
                    .update_bubble(bubble, &markdown::render(&transcript), false);
                Err(err)
            }
        };

        self.in_flight = None;
        self.view.set_input_enabled(true);

        return result;
    }

    /// Aborts any in-flight stream and starts a fresh session.
    pub async fn new_chat(&mut self) -> String {
        self.cancel();
        let id = self.store.create_session().await;
        self.render_transcript();

        return id;
    }

    /// Switches to an existing session and re-renders its transcript.
    pub async fn switch(&mut self, id: &str) -> bool {
        if !self.store.switch_session(id).await {
            return false;
        }

        self.cancel();
        self.render_transcript();

        return true;
    }

    /// Empties the current session's transcript, keeping the session.
    pub async fn clear_chat(&mut self) {
        self.store.clear_session().await;
        self.render_transcript();
    }

    /// Releases an in-flight read loop, if any. Called when the user
    /// navigates away or starts a new chat.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn store(&self) -> &SessionStore<S> {
        return &self.store;
    }

    pub fn view(&self) -> &V {
        return &self.view;
    }

    fn render_transcript(&mut self) {
        self.view.clear();
        // The store is read-only from here: bubbles are derived state.
        for msg in self.store.chat_context().to_vec() {
            self.view
                .append_bubble(msg.role, &markdown::render(&msg.content));
        }
    }
}

fn failure_transcript(err: &ChatError) -> String {
    let note = format!("Something went wrong while answering: {err}");
    if let Some(partial) = err.partial() {
        return format!("{partial}\n\n{note}");
    }

    return note;
}
