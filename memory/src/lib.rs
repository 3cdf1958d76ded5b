//! # Memory Crate
//!
//! Conversation memory over a document database. Chat turns are stored as documents in
//! Azure Cosmos DB, retrieved by recency, vector similarity, owner/thread or id, and
//! condensed into per-thread summaries by an LLM.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memory::{ConversationMemory, LocalBuffer, MemoryConfig, MemoryFilter, Message, ThreadKey};
//!
//! async fn example() -> memory::Result<()> {
//!     let memory = ConversationMemory::from_config(&MemoryConfig::from_env()?)?;
//!     let key = ThreadKey::new("user-1", "thread-1")?;
//!
//!     let mut buffer = LocalBuffer::new();
//!     buffer.push(&key, vec![Message::user("Hi"), Message::assistant("Hello!")])?;
//!     memory.flush(&mut buffer, &key).await;
//!
//!     let recent = memory.recent(10, &MemoryFilter::thread("thread-1"), false).await?;
//!     println!("{}", serde_json::to_string_pretty(&recent)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Environment configuration
//! - [`persistence`] - Turn/summary writes and deletes
//! - [`retrieval`] - Parameterized queries and result reshaping
//! - [`summarizer`] - LLM thread summaries
//!
//! ## External Interactions
//!
//! - **Cosmos DB**: via `memory-cosmos` (`DocumentStore`)
//! - **Embedding services**: via the `embedding` crate trait
//! - **Chat completion**: via the `llm-client` crate trait

pub mod config;
mod conversation;
pub mod persistence;
pub mod retrieval;
pub mod summarizer;

pub use config::MemoryConfig;
pub use conversation::ConversationMemory;
pub use persistence::Persistence;
pub use retrieval::{MemoryFilter, Retrieval, SearchOptions};
pub use summarizer::Summarizer;

pub use memory_buffer::{CommitPolicy, FlushReport, LocalBuffer, TurnSink};
pub use memory_core::*;
