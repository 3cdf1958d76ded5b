//! # Prompt
//!
//! Builds the message lists sent to chat-completion models.
//!
//! - [`summary_messages`]: the fixed summarization instruction plus a JSON transcript of
//!   the turns to summarize.
//! - [`chat_messages`]: system instruction, a context block (stored thread summary and
//!   recent turns) and the current user input, for interactive chat.
//!
//! ## External interactions
//!
//! - **AI models**: output is sent to OpenAI-compatible chat completion APIs.

use serde::{Deserialize, Serialize};

mod chat;
mod summary;

pub use chat::{
    chat_messages, format_turn_lines, DEFAULT_CHAT_SYSTEM_MESSAGE, SECTION_RECENT,
    SECTION_SUMMARY,
};
pub use summary::{
    format_transcript, summary_messages, summary_request, MAX_SUMMARY_FACTS, SUMMARY_INSTRUCTION,
    SUMMARY_REQUEST_PREFIX,
};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
