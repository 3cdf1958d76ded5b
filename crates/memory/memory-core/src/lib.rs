//! # Memory Core
//!
//! Core types and traits for conversation memory.
//! Used by `memory-buffer`, `memory-cosmos` and the `memory` facade.
//!
//! ## Modules
//!
//! - [`types`] - Message, Turn, ThreadKey, memory/summary documents, retrieval views
//! - [`store`] - DocumentStore trait and parameterized QuerySpec
//! - [`error`] - MemoryError and the crate Result alias
//! - [`tokens`] - cl100k token counting

pub mod error;
pub mod store;
pub mod tokens;
pub mod types;

pub use error::{MemoryError, Result};
pub use store::*;
pub use tokens::{count_tokens, estimate_tokens};
pub use types::*;
