//! Shared test doubles for memory integration tests.
//!
//! MockStore records every call and answers queries from a queue of canned results;
//! MockEmbedding and MockLlm return fixed values and can be told to fail.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use embedding::EmbeddingService;
use llm_client::{CompletionOptions, LlmClient};
use memory::{ConversationMemory, DocumentStore, MemoryError, QuerySpec, Result};
use prompt::ChatMessage;
use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MockStore {
    pub created: Mutex<Vec<(Value, String)>>,
    pub queries: Mutex<Vec<(QuerySpec, Option<String>)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    responses: Mutex<VecDeque<Vec<Value>>>,
    fail_creates_containing: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates whose body mentions `needle` fail with a store error.
    pub fn failing_creates_containing(needle: &str) -> Self {
        Self {
            fail_creates_containing: Some(needle.to_string()),
            ..Self::default()
        }
    }

    /// Queues the result of the next query. Unqueued queries return no rows.
    pub async fn respond(&self, rows: Vec<Value>) {
        self.responses.lock().await.push_back(rows);
    }

    pub async fn last_query(&self) -> (QuerySpec, Option<String>) {
        self.queries
            .lock()
            .await
            .last()
            .cloned()
            .expect("no query recorded")
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn create(&self, document: Value, partition_key: &str) -> Result<Value> {
        if let Some(needle) = &self.fail_creates_containing {
            if document.to_string().contains(needle.as_str()) {
                return Err(MemoryError::Store("create rejected".to_string()));
            }
        }
        self.created
            .lock()
            .await
            .push((document.clone(), partition_key.to_string()));
        Ok(document)
    }

    async fn query(&self, query: &QuerySpec, partition_key: Option<&str>) -> Result<Vec<Value>> {
        self.queries
            .lock()
            .await
            .push((query.clone(), partition_key.map(str::to_string)));
        Ok(self.responses.lock().await.pop_front().unwrap_or_default())
    }

    async fn delete(&self, id: &str, partition_key: &str) -> Result<()> {
        self.deleted
            .lock()
            .await
            .push((id.to_string(), partition_key.to_string()));
        Ok(())
    }
}

pub struct MockEmbedding {
    pub dimensions: usize,
    pub fail: bool,
    pub inputs: Mutex<Vec<String>>,
}

impl MockEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: false,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(4)
        }
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.inputs.lock().await.push(text.to_string());
        if self.fail {
            return Err(anyhow!("embedding service unavailable"));
        }
        Ok(vec![0.5; self.dimensions])
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

pub struct MockLlm {
    reply: String,
    pub calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
}

impl MockLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> anyhow::Result<String> {
        self.calls.lock().await.push((messages, options.clone()));
        Ok(self.reply.clone())
    }
}

pub const SUMMARY_REPLY: &str =
    r#"{"summary": "User asked about Rust lifetimes.", "facts": ["user learns Rust", "lifetimes confuse user"]}"#;

pub struct Harness {
    pub store: Arc<MockStore>,
    pub embedder: Arc<MockEmbedding>,
    pub llm: Arc<MockLlm>,
    pub memory: ConversationMemory,
}

pub fn harness_with(store: MockStore, embedder: MockEmbedding, llm: MockLlm, embed_on_write: bool) -> Harness {
    let store = Arc::new(store);
    let embedder = Arc::new(embedder);
    let llm = Arc::new(llm);
    let memory = ConversationMemory::new(store.clone(), embedder.clone(), llm.clone(), embed_on_write);
    Harness {
        store,
        embedder,
        llm,
        memory,
    }
}

pub fn harness() -> Harness {
    harness_with(MockStore::new(), MockEmbedding::new(4), MockLlm::replying(SUMMARY_REPLY), true)
}
