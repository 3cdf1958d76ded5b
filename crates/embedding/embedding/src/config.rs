//! Embedding configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

/// Output dimensionality requested from the embedding model unless overridden.
pub const DEFAULT_EMBEDDING_DIMENSIONS: u32 = 512;

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    fn model(&self) -> &str;
    fn dimensions(&self) -> u32;
    fn api_key(&self) -> &str;
    /// OpenAI-compatible endpoint; `None` means the public OpenAI API.
    fn base_url(&self) -> Option<&str>;
    /// Whether turns are embedded when they are written.
    fn embed_on_write(&self) -> bool;
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvEmbeddingConfig {
    pub embedding_model: String,
    pub embedding_dimensions: u32,
    pub api_key: String,
    pub base_url: Option<String>,
    pub vector_index: bool,
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn model(&self) -> &str {
        &self.embedding_model
    }
    fn dimensions(&self) -> u32 {
        self.embedding_dimensions
    }
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|s| !s.is_empty())
    }
    fn embed_on_write(&self) -> bool {
        self.vector_index
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables.
    ///
    /// AZURE_OPENAI_EMBEDDING_MODEL is required. AZURE_OPENAI_API_KEY falls back to
    /// OPENAI_API_KEY. AZURE_OPENAI_EMBEDDING_DIMENSIONS defaults to 512 and
    /// AZURE_VECTOR_INDEX to true.
    pub fn from_env() -> Result<Self> {
        let embedding_model = env::var("AZURE_OPENAI_EMBEDDING_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("AZURE_OPENAI_EMBEDDING_MODEL not set")?;
        let embedding_dimensions = match env::var("AZURE_OPENAI_EMBEDDING_DIMENSIONS") {
            Ok(raw) => raw.trim().parse().with_context(|| {
                format!("AZURE_OPENAI_EMBEDDING_DIMENSIONS is not a positive integer: {}", raw)
            })?,
            Err(_) => DEFAULT_EMBEDDING_DIMENSIONS,
        };
        let api_key = env::var("AZURE_OPENAI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let base_url = env::var("AZURE_OPENAI_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let vector_index = env::var("AZURE_VECTOR_INDEX")
            .map(|s| parse_flag(&s))
            .unwrap_or(true);
        Ok(Self {
            embedding_model,
            embedding_dimensions,
            api_key,
            base_url,
            vector_index,
        })
    }

    /// Validate config (a zero dimension can never be requested).
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dimensions == 0 {
            anyhow::bail!("AZURE_OPENAI_EMBEDDING_DIMENSIONS must be greater than 0");
        }
        Ok(())
    }
}

/// `true`, `1` and `yes` (any case) are on; everything else is off.
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
