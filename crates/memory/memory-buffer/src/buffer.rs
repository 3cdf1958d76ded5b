//! Keyed turn buffer with per-thread committed offsets.

use std::collections::HashMap;

use memory_core::{Message, MemoryError, Result, ThreadKey, Turn};
use tracing::{debug, info, warn};

use crate::sink::TurnSink;

/// Where the committed offset lands after a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// `offset = max(len - 1, 0)`: the newest turn stays pending and is written again
    /// by the next flush.
    #[default]
    RetainLast,
    /// `offset = len`: every flushed turn counts as committed.
    All,
}

/// Outcome of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Turns handed to the sink.
    pub attempted: usize,
    /// Turns the sink accepted.
    pub persisted: usize,
    /// Buffer indices whose write failed. They are still covered by the new offset.
    pub failed: Vec<usize>,
    /// Offset after the flush.
    pub committed_offset: usize,
}

#[derive(Debug, Clone, Default)]
struct ThreadBuffer {
    turns: Vec<Turn>,
    committed: usize,
}

/// Client-side buffer of conversation turns: `user_id -> thread_id -> turns`.
#[derive(Debug, Clone, Default)]
pub struct LocalBuffer {
    users: HashMap<String, HashMap<String, ThreadBuffer>>,
    policy: CommitPolicy,
}

impl LocalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CommitPolicy) -> Self {
        Self {
            users: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    fn thread(&self, key: &ThreadKey) -> Option<&ThreadBuffer> {
        self.users.get(key.user_id())?.get(key.thread_id())
    }

    fn thread_mut(&mut self, key: &ThreadKey) -> Option<&mut ThreadBuffer> {
        self.users.get_mut(key.user_id())?.get_mut(key.thread_id())
    }

    /// Validates `messages` as a turn and appends it. On error the buffer is unchanged.
    pub fn push(&mut self, key: &ThreadKey, messages: Vec<Message>) -> Result<()> {
        let turn = Turn::try_from(messages)?;
        self.push_turn(key, turn);
        Ok(())
    }

    /// Appends a turn, creating the thread buffer (offset 0) on first use.
    pub fn push_turn(&mut self, key: &ThreadKey, turn: Turn) {
        let thread = self
            .users
            .entry(key.user_id().to_string())
            .or_default()
            .entry(key.thread_id().to_string())
            .or_default();
        thread.turns.push(turn);
        debug!(
            user_id = %key.user_id(),
            thread_id = %key.thread_id(),
            len = thread.turns.len(),
            "turn buffered"
        );
    }

    /// The last `k` turns (all when `k` is `None`). Unknown keys yield an empty slice.
    pub fn peek(&self, key: &ThreadKey, k: Option<usize>) -> &[Turn] {
        let Some(thread) = self.thread(key) else {
            return &[];
        };
        let len = thread.turns.len();
        let take = k.map_or(len, |k| k.min(len));
        &thread.turns[len - take..]
    }

    /// Removes and returns the newest turn and clamps the offset to the shorter list.
    ///
    /// Under [`CommitPolicy::RetainLast`] the offset never points past the last remaining
    /// entry, so that entry stays pending. Under [`CommitPolicy::All`] it is only clamped to
    /// the new length: turns already written are never marked pending again.
    pub fn pop(&mut self, key: &ThreadKey) -> Option<Turn> {
        let policy = self.policy;
        let thread = self.thread_mut(key)?;
        let turn = thread.turns.pop()?;
        let new_len = thread.turns.len();
        let limit = match policy {
            CommitPolicy::RetainLast => new_len.saturating_sub(1),
            CommitPolicy::All => new_len,
        };
        thread.committed = thread.committed.min(limit);
        Some(turn)
    }

    /// Clears by scope:
    ///
    /// | user | thread | effect |
    /// |------|--------|--------|
    /// | None | None | whole buffer |
    /// | Some | None | every thread of the user |
    /// | Some | Some | that thread (user entry dropped once empty) |
    /// | None | Some | validation error |
    pub fn clear(&mut self, user_id: Option<&str>, thread_id: Option<&str>) -> Result<()> {
        match (user_id, thread_id) {
            (None, None) => self.users.clear(),
            (Some(user), None) => {
                self.users.remove(user);
            }
            (Some(user), Some(thread)) => {
                if let Some(threads) = self.users.get_mut(user) {
                    threads.remove(thread);
                    if threads.is_empty() {
                        self.users.remove(user);
                    }
                }
            }
            (None, Some(_)) => {
                return Err(MemoryError::Validation(
                    "cannot clear a thread_id without its user_id".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Writes every pending turn through `sink`, in order, then advances the offset
    /// according to the buffer's [`CommitPolicy`].
    ///
    /// A failed write is logged and skipped; it is not retried and does not stop the
    /// flush. The offset still advances past it, so check [`FlushReport::failed`].
    pub async fn flush<S>(&mut self, key: &ThreadKey, sink: &S) -> FlushReport
    where
        S: TurnSink + ?Sized,
    {
        let Some(thread) = self.thread(key) else {
            info!(
                user_id = %key.user_id(),
                thread_id = %key.thread_id(),
                "no local buffer for key, nothing to flush"
            );
            return FlushReport::default();
        };

        let start = thread.committed;
        let len = thread.turns.len();
        let mut report = FlushReport::default();

        info!(
            user_id = %key.user_id(),
            thread_id = %key.thread_id(),
            pending = len - start,
            "step: flushing local buffer"
        );

        for (index, turn) in thread.turns.iter().enumerate().skip(start) {
            report.attempted += 1;
            match sink.persist(key, turn).await {
                Ok(()) => report.persisted += 1,
                Err(e) => {
                    warn!(
                        user_id = %key.user_id(),
                        thread_id = %key.thread_id(),
                        index,
                        error = %e,
                        "buffered turn write failed, skipping"
                    );
                    report.failed.push(index);
                }
            }
        }

        let committed = match self.policy {
            CommitPolicy::RetainLast => len.saturating_sub(1),
            CommitPolicy::All => len,
        };
        if let Some(thread) = self.thread_mut(key) {
            thread.committed = committed;
        }
        report.committed_offset = committed;

        info!(
            attempted = report.attempted,
            persisted = report.persisted,
            failed = report.failed.len(),
            committed_offset = committed,
            "step: local buffer flush done"
        );
        report
    }

    /// Current committed offset, `None` for unknown keys.
    pub fn committed_offset(&self, key: &ThreadKey) -> Option<usize> {
        self.thread(key).map(|t| t.committed)
    }

    /// Turns at or after the committed offset.
    pub fn pending(&self, key: &ThreadKey) -> &[Turn] {
        match self.thread(key) {
            Some(thread) => &thread.turns[thread.committed..],
            None => &[],
        }
    }

    pub fn len(&self, key: &ThreadKey) -> usize {
        self.thread(key).map_or(0, |t| t.turns.len())
    }

    /// True when no key holds a buffer.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, key: &ThreadKey) -> bool {
        self.thread(key).is_some()
    }
}
