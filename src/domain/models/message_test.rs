use super::ChatMessage;
use super::Role;

#[test]
fn it_executes_new() {
    let msg = ChatMessage::new(Role::User, "Hi there!");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hi there!".to_string());
}

#[test]
fn it_executes_append() {
    let mut msg = ChatMessage::new(Role::Assistant, "Hi");
    msg.append(" there");
    msg.append("!");
    assert_eq!(msg.content, "Hi there!");
}

#[test]
fn it_serializes_roles_in_wire_format() {
    let user = serde_json::to_string(&Role::User).unwrap();
    let assistant = serde_json::to_string(&Role::Assistant).unwrap();
    assert_eq!(user, "\"user\"");
    assert_eq!(assistant, "\"assistant\"");
}
