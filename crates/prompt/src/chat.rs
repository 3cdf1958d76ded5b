//! Chat context formatting for the interactive loop.

use memory_core::Turn;

use crate::ChatMessage;

/// Default system instruction for interactive chat.
pub const DEFAULT_CHAT_SYSTEM_MESSAGE: &str = "\
You are a helpful AI assistant. Provide clear, concise, and friendly responses to user questions.

You will receive relevant conversation history as context before each user message. \
Use this context to provide more informed and contextual responses.

If the user asks what you were talking about, provide an overview and summary in your own words.

Keep responses relatively short, no more than 50 words.";

/// Section title for the stored thread summary.
pub const SECTION_SUMMARY: &str = "Previous conversation summary:";

/// Section title for the buffered recent turns.
pub const SECTION_RECENT: &str = "Conversation (recent):";

/// One `"{role}: {content}"` line per message, oldest turn first.
pub fn format_turn_lines(turns: &[Turn]) -> Vec<String> {
    turns
        .iter()
        .flat_map(|turn| turn.messages().iter())
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect()
}

/// Builds the messages for one chat round.
///
/// Order: optional System → optional User(context block: summary, then recent turns) →
/// User(current input). The context block is omitted when both summary and turns are empty.
pub fn chat_messages(
    system_message: Option<&str>,
    summary: Option<&str>,
    recent: &[Turn],
    current_input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::new();

    if let Some(msg) = system_message {
        messages.push(ChatMessage::system(msg));
    }

    let mut context_block = String::new();
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        context_block.push_str(SECTION_SUMMARY);
        context_block.push('\n');
        context_block.push_str(summary);
        context_block.push_str("\n\n");
    }
    let lines = format_turn_lines(recent);
    if !lines.is_empty() {
        context_block.push_str(SECTION_RECENT);
        context_block.push('\n');
        for line in &lines {
            context_block.push_str(line);
            context_block.push('\n');
        }
    }
    if !context_block.is_empty() {
        messages.push(ChatMessage::user(context_block.trim_end().to_string()));
    }

    messages.push(ChatMessage::user(current_input));
    messages
}
