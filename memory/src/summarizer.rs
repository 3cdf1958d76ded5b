//! Thread summarization through the completion service.

use chrono::Utc;
use embedding::EmbeddingService;
use llm_client::{CompletionOptions, LlmClient};
use memory_core::{count_tokens, MemoryError, Result, SummaryDocument, Turn};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Sampling temperature for summaries.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
/// Facts kept per summary.
pub const MAX_FACTS: usize = prompt::MAX_SUMMARY_FACTS;

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: Option<String>,
    #[serde(default)]
    facts: Vec<String>,
}

/// Produces [`SummaryDocument`]s from turns. Never writes; callers decide storage.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingService>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { llm, embedder }
    }

    /// Summarizes `turns`. With `persist`, the summary and facts are embedded so the
    /// stored summary is searchable; an embedding failure then fails the call.
    #[instrument(skip(self, turns), fields(turns = turns.len()))]
    pub async fn summarize(
        &self,
        turns: &[Turn],
        thread_id: &str,
        user_id: &str,
        persist: bool,
    ) -> Result<SummaryDocument> {
        if turns.is_empty() {
            return Err(MemoryError::Validation("no turns to summarize".to_string()));
        }

        let messages = prompt::summary_messages(turns)?;
        let options = CompletionOptions::default()
            .with_temperature(SUMMARY_TEMPERATURE)
            .json();
        info!(thread_id = %thread_id, "step: summarizer completion request");
        let reply = self
            .llm
            .complete(messages, &options)
            .await
            .map_err(|e| MemoryError::Completion(format!("{:#}", e)))?;

        let (summary, facts) = parse_reply(&reply)?;
        let token_count = count_tokens(&summary);

        let embedding = if persist {
            let text = SummaryDocument::embedding_text(&summary, &facts);
            let vector = self
                .embedder
                .embed(&text)
                .await
                .map_err(|e| MemoryError::Embedding(format!("{:#}", e)))?;
            Some(vector)
        } else {
            None
        };

        info!(
            thread_id = %thread_id,
            facts = facts.len(),
            token_count,
            embedded = embedding.is_some(),
            "step: summarizer done"
        );
        Ok(SummaryDocument {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            summary,
            facts,
            token_count,
            last_updated: Utc::now(),
            embedding,
        })
    }
}

/// Parses `{"summary": ..., "facts": [...]}`. Keeps at most [`MAX_FACTS`] facts.
fn parse_reply(reply: &str) -> Result<(String, Vec<String>)> {
    let parsed: SummaryReply = serde_json::from_str(reply.trim())
        .map_err(|e| MemoryError::MalformedResponse(format!("summary reply is not JSON: {}", e)))?;
    let summary = parsed
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| MemoryError::MalformedResponse("summary reply has no summary".to_string()))?;
    let mut facts: Vec<String> = parsed
        .facts
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if facts.is_empty() {
        return Err(MemoryError::MalformedResponse(
            "summary reply has no facts".to_string(),
        ));
    }
    if facts.len() > MAX_FACTS {
        warn!(facts = facts.len(), "summary reply has too many facts, truncating");
        facts.truncate(MAX_FACTS);
    }
    Ok((summary, facts))
}
