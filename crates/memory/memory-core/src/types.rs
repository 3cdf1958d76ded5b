//! # Core Types
//!
//! Data model shared by the write buffer, the document store and the retrieval layer.
//!
//! ## Turn
//!
//! Exactly two messages (one from each side of the conversation). The two-message
//! invariant is enforced at construction: [`Turn::try_from`] rejects any other length.
//!
//! ## Documents
//!
//! - [`MemoryDocument`]: one persisted turn (`type: "memory"`)
//! - [`SummaryDocument`]: one thread summary (`type: "summary"`)
//! - [`StoredDocument`]: either of the above, discriminated by `type`
//!
//! Documents are partitioned by `thread_id`.

use chrono::{DateTime, Utc};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{MemoryError, Result};

pub const MEMORY_DOCUMENT_TYPE: &str = "memory";
pub const SUMMARY_DOCUMENT_TYPE: &str = "summary";

/// A single chat message. `token_count` is bookkeeping added at write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            token_count: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    pub fn with_token_count(mut self, token_count: u32) -> Self {
        self.token_count = Some(token_count);
        self
    }

    /// Copy of the message with bookkeeping fields removed.
    pub fn stripped(&self) -> Self {
        Self {
            role: self.role.clone(),
            content: self.content.clone(),
            token_count: None,
        }
    }
}

/// One conversation turn: exactly two messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Turn {
    messages: [Message; 2],
}

impl Turn {
    pub fn new(first: Message, second: Message) -> Self {
        Self {
            messages: [first, second],
        }
    }

    pub fn messages(&self) -> &[Message; 2] {
        &self.messages
    }

    pub fn first(&self) -> &Message {
        &self.messages[0]
    }

    pub fn second(&self) -> &Message {
        &self.messages[1]
    }

    /// Contents of both messages joined by a single space (the text that gets embedded).
    pub fn joined_content(&self) -> String {
        format!("{} {}", self.messages[0].content, self.messages[1].content)
    }

    /// Returns a copy with `token_count` set on each message by `count`.
    pub fn with_token_counts(&self, count: impl Fn(&str) -> u32) -> Self {
        let [a, b] = &self.messages;
        Self::new(
            a.clone().with_token_count(count(&a.content)),
            b.clone().with_token_count(count(&b.content)),
        )
    }

    /// Returns a copy without token counts.
    pub fn stripped(&self) -> Self {
        Self::new(self.messages[0].stripped(), self.messages[1].stripped())
    }
}

impl TryFrom<Vec<Message>> for Turn {
    type Error = MemoryError;

    fn try_from(messages: Vec<Message>) -> Result<Self> {
        let len = messages.len();
        let messages: [Message; 2] = messages.try_into().map_err(|_| {
            MemoryError::Validation(format!(
                "a turn must contain exactly 2 messages, got {}",
                len
            ))
        })?;
        Ok(Self { messages })
    }
}

impl From<Turn> for Vec<Message> {
    fn from(turn: Turn) -> Self {
        turn.messages.into()
    }
}

/// Identifies one buffered conversation: owner plus thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    user_id: String,
    thread_id: String,
}

impl ThreadKey {
    /// Both identifiers must be non-empty.
    pub fn new(user_id: impl Into<String>, thread_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let thread_id = thread_id.into();
        if user_id.trim().is_empty() {
            return Err(MemoryError::Validation("user_id is required".to_string()));
        }
        if thread_id.trim().is_empty() {
            return Err(MemoryError::Validation("thread_id is required".to_string()));
        }
        Ok(Self { user_id, thread_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

/// A persisted turn. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryDocument {
    pub id: String,
    pub user_id: String,
    pub thread_id: String,
    pub messages: Turn,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryDocument {
    /// JSON body as written to the store, including the `type` discriminator.
    pub fn to_document(&self) -> Result<Value> {
        with_type(serde_json::to_value(self)?, MEMORY_DOCUMENT_TYPE)
    }
}

/// LLM-generated summary of one thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryDocument {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub summary: String,
    pub facts: Vec<String>,
    pub token_count: u32,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl SummaryDocument {
    pub fn to_document(&self) -> Result<Value> {
        with_type(serde_json::to_value(self)?, SUMMARY_DOCUMENT_TYPE)
    }

    /// Text that gets embedded for similarity search: summary followed by the facts.
    pub fn embedding_text(summary: &str, facts: &[String]) -> String {
        format!("{} {}", summary, facts.join(" "))
    }
}

fn with_type(mut value: Value, kind: &str) -> Result<Value> {
    match value.as_object_mut() {
        Some(map) => {
            map.insert("type".to_string(), Value::String(kind.to_string()));
            Ok(value)
        }
        None => Err(MemoryError::Serialization(
            "document did not serialize to a JSON object".to_string(),
        )),
    }
}

/// Any document read back by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredDocument {
    Memory(MemoryDocument),
    Summary(SummaryDocument),
}

impl StoredDocument {
    pub fn id(&self) -> &str {
        match self {
            StoredDocument::Memory(d) => &d.id,
            StoredDocument::Summary(d) => &d.id,
        }
    }

    pub fn thread_id(&self) -> &str {
        match self {
            StoredDocument::Memory(d) => &d.thread_id,
            StoredDocument::Summary(d) => &d.thread_id,
        }
    }
}

/// Optional details attached to a retrieved turn.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TurnMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

/// A turn returned by a retrieval query.
///
/// Serializes as `[message, message]`, or `[message, message, metadata]` when
/// metadata is present.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedTurn {
    pub turn: Turn,
    pub metadata: Option<TurnMetadata>,
}

impl Serialize for RetrievedTurn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.metadata.is_some());
        let mut seq = serializer.serialize_seq(Some(len))?;
        for message in self.turn.messages() {
            seq.serialize_element(message)?;
        }
        if let Some(metadata) = &self.metadata {
            seq.serialize_element(metadata)?;
        }
        seq.end()
    }
}

/// Bookkeeping fields of a summary, returned only on detailed reads.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryDetails {
    pub thread_id: String,
    pub user_id: String,
    pub token_count: u32,
    pub last_updated: String,
}

/// The latest summary of a thread as returned by retrieval.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreadSummary {
    pub summary: String,
    pub facts: Vec<String>,
    #[serde(flatten)]
    pub details: Option<SummaryDetails>,
}

/// RFC 3339 UTC timestamps with fixed microsecond precision, so stored strings sort chronologically.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
