//! Tests for chat context formatting.

use memory_core::{Message, Turn};
use prompt::{chat_messages, format_turn_lines, ChatMessage, MessageRole, SECTION_RECENT, SECTION_SUMMARY};

fn turn(q: &str, a: &str) -> Turn {
    Turn::new(Message::user(q), Message::new("agent", a))
}

#[test]
fn question_only_when_no_context() {
    let msgs = chat_messages(None, None, &[], "What is AI?");
    assert_eq!(msgs, vec![ChatMessage::user("What is AI?")]);
}

#[test]
fn system_then_context_then_question() {
    let recent = [turn("What do dogs eat?", "Dog food.")];
    let msgs = chat_messages(Some("Be brief."), Some("Talked about pets."), &recent, "And cats?");

    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[0].role, MessageRole::System);
    assert_eq!(msgs[1].role, MessageRole::User);
    let context = &msgs[1].content;
    assert!(context.starts_with(SECTION_SUMMARY));
    assert!(context.contains("Talked about pets."));
    assert!(context.contains(SECTION_RECENT));
    assert!(context.contains("user: What do dogs eat?"));
    assert!(context.contains("agent: Dog food."));
    assert_eq!(msgs[2].content, "And cats?");
}

#[test]
fn blank_summary_is_ignored() {
    let msgs = chat_messages(None, Some("  "), &[], "hi");
    assert_eq!(msgs.len(), 1);
}

#[test]
fn turn_lines_keep_order() {
    let lines = format_turn_lines(&[turn("1", "2"), turn("3", "4")]);
    assert_eq!(lines, vec!["user: 1", "agent: 2", "user: 3", "agent: 4"]);
}

#[test]
fn chat_message_constructors() {
    assert_eq!(ChatMessage::system("s").role, MessageRole::System);
    assert_eq!(ChatMessage::assistant("a").role, MessageRole::Assistant);
    let json = serde_json::to_value(ChatMessage::user("u")).unwrap();
    assert_eq!(json["role"], "user");
}
