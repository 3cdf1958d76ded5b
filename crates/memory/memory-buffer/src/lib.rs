//! # Memory Buffer
//!
//! Accumulates conversation turns client-side and tracks which of them have been
//! written downstream, so a caller does not block on the network for every turn.
//!
//! ## Model
//!
//! Buffers are keyed by [`ThreadKey`] (user + thread). Each key owns an ordered list of
//! turns and a committed offset:
//!
//! - entries at index `< committed_offset` are presumed persisted
//! - entries at index `>= committed_offset` are pending
//! - `0 <= committed_offset <= len` always holds
//!
//! The offset only moves forward through [`LocalBuffer::flush`] and is pulled back by
//! [`LocalBuffer::pop`]. Nothing here is persisted; a buffer lives as long as its owner.
//!
//! ## Example
//!
//! ```rust
//! use memory_buffer::LocalBuffer;
//! use memory_core::{Message, ThreadKey};
//!
//! let mut buffer = LocalBuffer::new();
//! let key = ThreadKey::new("user-1", "thread-1").unwrap();
//! buffer
//!     .push(&key, vec![Message::user("hi"), Message::assistant("hello")])
//!     .unwrap();
//! assert_eq!(buffer.peek(&key, Some(1)).len(), 1);
//! ```

mod buffer;
mod sink;


pub use buffer::{CommitPolicy, FlushReport, LocalBuffer};
pub use sink::TurnSink;
