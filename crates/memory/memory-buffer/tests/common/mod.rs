//! Shared test utilities for memory-buffer integration tests.
//!
//! Provides RecordingSink (TurnSink) that records every persisted turn and can be
//! told to fail on chosen calls.

use std::collections::HashSet;

use async_trait::async_trait;
use memory_buffer::TurnSink;
use memory_core::{MemoryError, Message, Result, ThreadKey, Turn};
use tokio::sync::Mutex;

/// Records persisted turns. Calls whose 0-based position is in `fail_on` return a store error.
pub struct RecordingSink {
    calls: Mutex<usize>,
    fail_on: HashSet<usize>,
    pub written: Mutex<Vec<(ThreadKey, Turn)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            calls: Mutex::new(0),
            fail_on: calls.iter().copied().collect(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub async fn written_contents(&self) -> Vec<String> {
        self.written
            .lock()
            .await
            .iter()
            .map(|(_, t)| t.first().content.clone())
            .collect()
    }
}

#[async_trait]
impl TurnSink for RecordingSink {
    async fn persist(&self, key: &ThreadKey, turn: &Turn) -> Result<()> {
        let mut calls = self.calls.lock().await;
        let call = *calls;
        *calls += 1;
        if self.fail_on.contains(&call) {
            return Err(MemoryError::Store("simulated write failure".to_string()));
        }
        self.written.lock().await.push((key.clone(), turn.clone()));
        Ok(())
    }
}

pub fn turn(n: usize) -> Vec<Message> {
    vec![
        Message::user(format!("question {}", n)),
        Message::assistant(format!("answer {}", n)),
    ]
}
