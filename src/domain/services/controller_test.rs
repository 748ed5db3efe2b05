use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ChatController;
use super::ChatView;
use super::SessionStore;
use crate::domain::models::Backend;
use crate::domain::models::ChatDelta;
use crate::domain::models::ChatError;
use crate::domain::models::ContextMessage;
use crate::domain::models::Role;
use crate::infrastructure::storage::MemoryStore;

enum ScriptedFailure {
    Http { status: u16, body: String },
    Interrupted { reason: String },
}

/// Backend double that replays a fixed list of fragments, then either
/// completes or fails the way the script says.
struct ScriptedBackend {
    fragments: Vec<&'static str>,
    failure: Option<ScriptedFailure>,
}

impl ScriptedBackend {
    fn completing(fragments: Vec<&'static str>) -> ScriptedBackend {
        return ScriptedBackend {
            fragments,
            failure: None,
        };
    }

    fn failing(fragments: Vec<&'static str>, failure: ScriptedFailure) -> ScriptedBackend {
        return ScriptedBackend {
            fragments,
            failure: Some(failure),
        };
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        return Ok(vec![]);
    }

    async fn stream_completion(
        &self,
        _context: Vec<ContextMessage>,
        tx: &mpsc::UnboundedSender<ChatDelta>,
        _cancel: CancellationToken,
    ) -> Result<String, ChatError> {
        let mut accumulated = String::new();
        for fragment in &self.fragments {
            accumulated += fragment;
            let delta = ChatDelta {
                fragment: fragment.to_string(),
                accumulated: accumulated.to_string(),
            };
            tx.send(delta).unwrap();
        }

        match &self.failure {
            None => return Ok(accumulated),
            Some(ScriptedFailure::Http { status, body }) => {
                return Err(ChatError::Http {
                    status: *status,
                    body: body.to_string(),
                });
            }
            Some(ScriptedFailure::Interrupted { reason }) => {
                return Err(ChatError::Interrupted {
                    partial: accumulated,
                    reason: reason.to_string(),
                });
            }
        }
    }
}

#[derive(Default)]
struct RecordingView {
    bubbles: Vec<(Role, String)>,
    updates: Vec<(usize, String, bool)>,
    input_toggles: Vec<bool>,
    clears: usize,
}

impl ChatView for RecordingView {
    fn append_bubble(&mut self, role: Role, html: &str) -> usize {
        self.bubbles.push((role, html.to_string()));
        return self.bubbles.len() - 1;
    }

    fn update_bubble(&mut self, handle: usize, html: &str, typing: bool) {
        self.updates.push((handle, html.to_string(), typing));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_toggles.push(enabled);
    }

    fn clear(&mut self) {
        self.bubbles.clear();
        self.clears += 1;
    }
}

fn controller(
    backend: ScriptedBackend,
) -> ChatController<ScriptedBackend, MemoryStore, RecordingView> {
    let store = SessionStore::new(MemoryStore::default(), "https://example.com");
    return ChatController::new(backend, store, RecordingView::default());
}

#[tokio::test]
async fn it_streams_a_reply_into_the_placeholder_bubble() {
    let mut controller = controller(ScriptedBackend::completing(vec!["Hi", " there"]));

    controller.send("Hello").await.unwrap();

    let transcript = controller.store().chat_context();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[0].content, "Hello");
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[1].content, "Hi there");

    let view = controller.view();
    assert_eq!(view.bubbles.len(), 2);
    assert_eq!(view.bubbles[0], (Role::User, "<p>Hello</p>".to_string()));
    assert_eq!(view.bubbles[1].0, Role::Assistant);

    assert_eq!(
        view.updates,
        vec![
            (1, "".to_string(), true),
            (1, "<p>Hi</p>".to_string(), true),
            (1, "<p>Hi there</p>".to_string(), true),
            (1, "<p>Hi there</p>".to_string(), false),
        ]
    );

    assert_eq!(view.input_toggles, vec![false, true]);
}

#[tokio::test]
async fn it_rejects_empty_prompts_before_any_work() {
    let mut controller = controller(ScriptedBackend::completing(vec!["unused"]));

    let res = controller.send("   ").await;

    assert!(matches!(res, Err(ChatError::EmptyPrompt)));
    assert!(controller.store().chat_context().is_empty());
    assert!(controller.view().bubbles.is_empty());
    assert!(controller.view().input_toggles.is_empty());
}

#[tokio::test]
async fn it_rejects_a_second_send_while_one_is_in_flight() {
    let mut controller = controller(ScriptedBackend::completing(vec!["unused"]));
    controller.in_flight = Some(CancellationToken::new());

    let res = controller.send("Hello").await;

    assert!(matches!(res, Err(ChatError::InFlight)));
    assert!(controller.store().chat_context().is_empty());
    assert!(controller.view().bubbles.is_empty());
    assert!(controller.view().input_toggles.is_empty());
}

#[tokio::test]
async fn it_cancels_the_in_flight_stream_on_new_chat_and_switch() {
    let mut controller = controller(ScriptedBackend::completing(vec!["Hi"]));
    controller.send("Hello").await.unwrap();
    let first = controller.store().current_id().unwrap().to_string();

    let token = CancellationToken::new();
    controller.in_flight = Some(token.clone());
    controller.new_chat().await;
    assert!(token.is_cancelled());
    assert!(controller.in_flight.is_none());

    let token = CancellationToken::new();
    controller.in_flight = Some(token.clone());
    assert!(controller.switch(&first).await);
    assert!(token.is_cancelled());
    assert!(controller.in_flight.is_none());
}

#[tokio::test]
async fn it_persists_http_failures_as_the_assistant_turn() {
    let mut controller = controller(ScriptedBackend::failing(
        vec![],
        ScriptedFailure::Http {
            status: 500,
            body: "server error".to_string(),
        },
    ));

    let res = controller.send("Hello").await;
    assert!(matches!(res, Err(ChatError::Http { status: 500, .. })));

    let transcript = controller.store().chat_context();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(
        transcript[1].content,
        "Something went wrong while answering: chat endpoint returned HTTP 500: server error"
    );

    // The failure bubble is finalized and the input comes back.
    let view = controller.view();
    let last_update = view.updates.last().unwrap();
    assert!(!last_update.2);
    assert_eq!(view.input_toggles, vec![false, true]);
}

#[tokio::test]
async fn it_keeps_partial_output_when_the_stream_drops() {
    let mut controller = controller(ScriptedBackend::failing(
        vec!["Hi"],
        ScriptedFailure::Interrupted {
            reason: "connection reset".to_string(),
        },
    ));

    let res = controller.send("Hello").await;
    assert!(matches!(res, Err(ChatError::Interrupted { .. })));

    let transcript = controller.store().chat_context();
    assert_eq!(
        transcript[1].content,
        "Hi\n\nSomething went wrong while answering: stream interrupted: connection reset"
    );
}

#[tokio::test]
async fn it_starts_a_fresh_session_on_new_chat() {
    let mut controller = controller(ScriptedBackend::completing(vec!["Hi"]));
    controller.send("Hello").await.unwrap();
    let first = controller.store().current_id().unwrap().to_string();

    let second = controller.new_chat().await;

    assert_ne!(first, second);
    assert!(controller.store().chat_context().is_empty());
    assert!(controller.view().bubbles.is_empty());
    assert_eq!(controller.view().clears, 1);
}

#[tokio::test]
async fn it_rehydrates_and_renders_on_open() {
    let storage = MemoryStore::default();
    let mut seed = SessionStore::new(storage.clone(), "https://example.com");
    seed.add_message(Role::User, "Hello").await;
    seed.add_message(Role::Assistant, "Hi there").await;

    let store = SessionStore::new(storage, "https://example.com");
    let mut controller = ChatController::new(
        ScriptedBackend::completing(vec![]),
        store,
        RecordingView::default(),
    );
    controller.open().await;

    let view = controller.view();
    assert_eq!(view.bubbles.len(), 2);
    assert_eq!(view.bubbles[0], (Role::User, "<p>Hello</p>".to_string()));
    assert_eq!(
        view.bubbles[1],
        (Role::Assistant, "<p>Hi there</p>".to_string())
    );
}

#[tokio::test]
async fn it_switches_sessions_and_rerenders() {
    let mut controller = controller(ScriptedBackend::completing(vec!["Hi"]));
    controller.send("First topic").await.unwrap();
    let first = controller.store().current_id().unwrap().to_string();

    controller.new_chat().await;
    controller.send("Second topic").await.unwrap();

    assert!(controller.switch(&first).await);
    assert_eq!(controller.store().current_id(), Some(first.as_str()));

    let view = controller.view();
    assert_eq!(view.bubbles.len(), 2);
    assert_eq!(
        view.bubbles[0],
        (Role::User, "<p>First topic</p>".to_string())
    );

    assert!(!controller.switch("missing").await);
}

#[tokio::test]
async fn it_clears_the_transcript_in_place() {
    let mut controller = controller(ScriptedBackend::completing(vec!["Hi"]));
    controller.send("Hello").await.unwrap();
    let id = controller.store().current_id().unwrap().to_string();

    controller.clear_chat().await;

    assert_eq!(controller.store().current_id(), Some(id.as_str()));
    assert!(controller.store().chat_context().is_empty());
    assert!(controller.view().bubbles.is_empty());
}
