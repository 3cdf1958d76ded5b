//! [`ConversationMemory`]: one handle over persistence, retrieval and summarization.

use embedding::EmbeddingService;
use llm_client::{LlmClient, OpenAILlmClient};
use memory_buffer::{FlushReport, LocalBuffer};
use memory_core::{
    DocumentStore, MemoryDocument, MemoryError, Message, Result, RetrievedTurn, StoredDocument,
    SummaryDocument, ThreadKey, ThreadSummary, Turn,
};
use memory_cosmos::CosmosDocumentStore;
use openai_embedding::OpenAIEmbedding;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::MemoryConfig;
use crate::persistence::Persistence;
use crate::retrieval::{MemoryFilter, Retrieval, SearchOptions};
use crate::summarizer::Summarizer;

/// Conversation memory backed by a document store, an embedding service and an LLM.
///
/// The write buffer is owned by the caller and passed to [`ConversationMemory::flush`].
#[derive(Clone)]
pub struct ConversationMemory {
    persistence: Persistence,
    retrieval: Retrieval,
    summarizer: Summarizer,
    embedder: Arc<dyn EmbeddingService>,
    llm: Arc<dyn LlmClient>,
}

impl ConversationMemory {
    /// Wires the given services. Turns are embedded on write only when `embed_on_write`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmClient>,
        embed_on_write: bool,
    ) -> Self {
        let write_embedder = embed_on_write.then(|| embedder.clone());
        Self {
            persistence: Persistence::new(store.clone(), write_embedder),
            retrieval: Retrieval::new(store),
            summarizer: Summarizer::new(llm.clone(), embedder.clone()),
            embedder,
            llm,
        }
    }

    /// Builds the Cosmos DB store, the embedding client and the completion client.
    pub fn from_config(config: &MemoryConfig) -> Result<Self> {
        let store = CosmosDocumentStore::new(config.cosmos.clone())?;
        let embedder = OpenAIEmbedding::from_config(&config.embedding);
        let llm = OpenAILlmClient::from_config(&config.llm);
        info!(
            database = %config.cosmos.database,
            container = %config.cosmos.container,
            completions_model = %llm.model(),
            embedding_model = %embedder.model(),
            embed_on_write = config.embed_on_write(),
            "step: conversation memory connected"
        );
        Ok(Self::new(
            Arc::new(store),
            Arc::new(embedder),
            Arc::new(llm),
            config.embed_on_write(),
        ))
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn retrieval(&self) -> &Retrieval {
        &self.retrieval
    }

    /// The completion client, for callers that chat on top of the memory.
    pub fn llm(&self) -> Arc<dyn LlmClient> {
        self.llm.clone()
    }

    /// Validates and stores one turn directly, bypassing the buffer.
    pub async fn remember(
        &self,
        messages: Vec<Message>,
        user_id: Option<&str>,
        thread_id: Option<&str>,
    ) -> Result<MemoryDocument> {
        let turn = Turn::try_from(messages)?;
        self.persistence.store_turn(&turn, user_id, thread_id).await
    }

    /// Writes the pending turns of `key` from `buffer`.
    pub async fn flush(&self, buffer: &mut LocalBuffer, key: &ThreadKey) -> FlushReport {
        buffer.flush(key, &self.persistence).await
    }

    /// Embeds `query` and returns the nearest turns.
    #[instrument(skip(self, query))]
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &MemoryFilter,
        options: SearchOptions,
    ) -> Result<Vec<RetrievedTurn>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| MemoryError::Embedding(format!("{:#}", e)))?;
        self.retrieval.search(&embedding, k, filter, options).await
    }

    pub async fn recent(
        &self,
        k: usize,
        filter: &MemoryFilter,
        detailed: bool,
    ) -> Result<Vec<RetrievedTurn>> {
        self.retrieval.recent(k, filter, detailed).await
    }

    pub async fn all_for_user(&self, user_id: &str, detailed: bool) -> Result<Vec<RetrievedTurn>> {
        self.retrieval.by_user(user_id, detailed).await
    }

    pub async fn all_for_thread(
        &self,
        thread_id: &str,
        detailed: bool,
    ) -> Result<Vec<RetrievedTurn>> {
        self.retrieval.by_thread(thread_id, detailed).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        self.retrieval.by_id(id).await
    }

    pub async fn summary(&self, thread_id: &str, detailed: bool) -> Result<Option<ThreadSummary>> {
        self.retrieval.summary_for_thread(thread_id, detailed).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.persistence.delete(id).await
    }

    /// Summarizes caller-held turns; with `persist` the summary is embedded and stored.
    pub async fn summarize_turns(
        &self,
        turns: &[Turn],
        thread_id: &str,
        user_id: &str,
        persist: bool,
    ) -> Result<SummaryDocument> {
        let summary = self
            .summarizer
            .summarize(turns, thread_id, user_id, persist)
            .await?;
        if persist {
            self.persistence.store_summary(&summary).await?;
        }
        Ok(summary)
    }

    /// Summarizes every stored turn of a thread. The owner is the user of the oldest
    /// turn, or the thread id when none is recorded.
    #[instrument(skip(self))]
    pub async fn summarize_thread(&self, thread_id: &str, persist: bool) -> Result<SummaryDocument> {
        let turns: Vec<Turn> = self
            .retrieval
            .by_thread(thread_id, false)
            .await?
            .into_iter()
            .map(|t| t.turn)
            .collect();
        if turns.is_empty() {
            return Err(MemoryError::NotFound(format!(
                "no memories for thread {}",
                thread_id
            )));
        }
        let user_id = self
            .retrieval
            .first_user_of_thread(thread_id)
            .await?
            .unwrap_or_else(|| thread_id.to_string());
        self.summarize_turns(&turns, thread_id, &user_id, persist)
            .await
    }
}
