//! Persistence adapter: turns and summaries into documents.

use async_trait::async_trait;
use chrono::Utc;
use embedding::EmbeddingService;
use memory_buffer::TurnSink;
use memory_core::{
    count_tokens, DocumentStore, MemoryDocument, MemoryError, QuerySpec, Result, SummaryDocument,
    ThreadKey, Turn,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Writes and deletes documents. Embeds turns on write when an embedder is configured.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn DocumentStore>,
    embedder: Option<Arc<dyn EmbeddingService>>,
}

impl Persistence {
    /// `embedder = None` stores turns without vectors.
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Option<Arc<dyn EmbeddingService>>) -> Self {
        Self { store, embedder }
    }

    /// Stores one turn. Missing ids are generated; the document lands in the partition of
    /// its thread.
    #[instrument(skip(self, turn))]
    pub async fn store_turn(
        &self,
        turn: &Turn,
        user_id: Option<&str>,
        thread_id: Option<&str>,
    ) -> Result<MemoryDocument> {
        let user_id = user_id
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let thread_id = thread_id
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let embedding = match &self.embedder {
            Some(embedder) => match embedder.embed(&turn.joined_content()).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, thread_id = %thread_id, "turn embedding failed, storing without vector");
                    None
                }
            },
            None => None,
        };

        let document = MemoryDocument {
            id: Uuid::new_v4().to_string(),
            user_id,
            thread_id,
            messages: turn.with_token_counts(count_tokens),
            timestamp: Utc::now(),
            embedding,
        };

        self.store
            .create(document.to_document()?, &document.thread_id)
            .await?;
        info!(
            id = %document.id,
            user_id = %document.user_id,
            thread_id = %document.thread_id,
            embedded = document.embedding.is_some(),
            "step: memory turn stored"
        );
        Ok(document)
    }

    #[instrument(skip(self, summary), fields(thread_id = %summary.thread_id))]
    pub async fn store_summary(&self, summary: &SummaryDocument) -> Result<SummaryDocument> {
        self.store
            .create(summary.to_document()?, &summary.thread_id)
            .await?;
        info!(id = %summary.id, facts = summary.facts.len(), "step: memory summary stored");
        Ok(summary.clone())
    }

    /// Deletes a document by id. Its partition is looked up first.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let query = QuerySpec::new("SELECT * FROM c WHERE c.id = @item_id").with_param("@item_id", id);
        let found = self.store.query(&query, None).await?;
        let thread_id = found
            .first()
            .and_then(|doc| doc.get("thread_id"))
            .and_then(Value::as_str)
            .ok_or_else(|| MemoryError::NotFound(format!("document {}", id)))?;

        self.store.delete(id, thread_id).await?;
        info!(id = %id, thread_id = %thread_id, "step: memory document deleted");
        Ok(())
    }
}

#[async_trait]
impl TurnSink for Persistence {
    async fn persist(&self, key: &ThreadKey, turn: &Turn) -> Result<()> {
        self.store_turn(turn, Some(key.user_id()), Some(key.thread_id()))
            .await
            .map(|_| ())
    }
}
