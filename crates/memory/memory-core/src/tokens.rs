//! Token counting.
//!
//! Counts use the `cl100k_base` BPE so stored counts match what OpenAI chat models see.
//! The encoder is built once per process.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use tracing::warn;

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!(error = %e, "cl100k_base encoder unavailable, falling back to estimate");
                None
            }
        })
        .as_ref()
}

/// Number of `cl100k_base` tokens in `text`. Empty text has zero tokens.
pub fn count_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    match encoder() {
        Some(bpe) => bpe.encode_ordinary(text).len() as u32,
        None => estimate_tokens(text) as u32,
    }
}

/// Rough estimate: 1 token ≈ 4 characters, rounded up, minimum 1.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() as f64) / 4.0).ceil().max(1.0) as usize
}
