//! Memory error types.
//!
//! Shared by the buffer, the document store implementations and the `memory` facade,
//! so callers can tell a validation problem from a missing document or a failed remote call.

use thiserror::Error;

/// Errors that can occur in memory operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// Required configuration is missing or unparsable. Raised before any network call.
    #[error("Config error: {0}")]
    Config(String),
    /// Malformed input (turn shape, missing identifiers, bad arguments).
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Document database request failed.
    #[error("Store error: {0}")]
    Store(String),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Completion error: {0}")]
    Completion(String),
    /// The completion service answered with something that is not the expected JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        MemoryError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
