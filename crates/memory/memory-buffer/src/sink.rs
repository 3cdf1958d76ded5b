//! Downstream target of a buffer flush.

use async_trait::async_trait;
use memory_core::{Result, ThreadKey, Turn};

/// Receives buffered turns during [`crate::LocalBuffer::flush`], one call per pending turn.
#[async_trait]
pub trait TurnSink: Send + Sync {
    async fn persist(&self, key: &ThreadKey, turn: &Turn) -> Result<()>;
}
