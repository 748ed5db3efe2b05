use super::ChatMessage;
use super::ChatSession;
use super::Role;
use super::PLACEHOLDER_TITLE;

#[test]
fn it_executes_new() {
    let session = ChatSession::new("https://example.com/article");
    assert_eq!(session.title, PLACEHOLDER_TITLE);
    assert_eq!(session.source_url, "https://example.com/article");
    assert!(session.messages.is_empty());
    assert_eq!(session.created_at, session.updated_at);
}

#[test]
fn it_creates_ids_with_millis_and_suffix() {
    let id = ChatSession::create_id();
    let (millis, suffix) = id.split_once('-').unwrap();
    assert!(millis.parse::<i64>().is_ok());
    assert!(!suffix.is_empty());

    let other = ChatSession::create_id();
    assert_ne!(id, other);
}

#[test]
fn it_titles_from_first_user_message() {
    let mut session = ChatSession::new("");
    session.push(ChatMessage::new(Role::User, "Summarize this page"));
    session.push(ChatMessage::new(Role::User, "And then translate it"));

    assert_eq!(session.title, "Summarize this page");
}

#[test]
fn it_truncates_long_titles() {
    let mut session = ChatSession::new("");
    let prompt = "a".repeat(80);
    session.push(ChatMessage::new(Role::User, &prompt));

    assert_eq!(session.title, format!("{}...", "a".repeat(50)));
}

#[test]
fn it_keeps_placeholder_title_for_assistant_messages() {
    let mut session = ChatSession::new("");
    session.push(ChatMessage::new(Role::Assistant, "Hello! How can I help?"));

    assert_eq!(session.title, PLACEHOLDER_TITLE);
}

#[test]
fn it_refreshes_updated_at_on_push() {
    let mut session = ChatSession::new("");
    let before = session.updated_at;
    session.push(ChatMessage::new(Role::User, "Hi"));

    assert!(session.updated_at >= before);
}

#[test]
fn it_executes_reset() {
    let mut session = ChatSession::new("");
    session.push(ChatMessage::new(Role::User, "Summarize this page"));
    let id = session.id.to_string();

    session.reset();

    assert!(session.messages.is_empty());
    assert_eq!(session.title, PLACEHOLDER_TITLE);
    assert_eq!(session.id, id);
}

#[test]
fn it_retitles_after_reset() {
    let mut session = ChatSession::new("");
    session.push(ChatMessage::new(Role::User, "First topic"));
    session.reset();
    session.push(ChatMessage::new(Role::User, "Second topic"));

    assert_eq!(session.title, "Second topic");
}
