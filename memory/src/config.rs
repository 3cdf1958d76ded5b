//! Combined configuration for the memory facade.

use embedding::EnvEmbeddingConfig;
use llm_client::EnvLlmConfig;
use memory_core::{MemoryError, Result};
use memory_cosmos::CosmosConfig;

/// Everything [`crate::ConversationMemory::from_config`] needs to connect.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub cosmos: CosmosConfig,
    pub embedding: EnvEmbeddingConfig,
    pub llm: EnvLlmConfig,
}

impl MemoryConfig {
    /// Loads all sections from environment variables.
    ///
    /// Fails with [`MemoryError::Config`] on the first missing or unparsable value,
    /// before any client is built.
    pub fn from_env() -> Result<Self> {
        let cosmos = CosmosConfig::from_env()?;
        let embedding = EnvEmbeddingConfig::from_env().map_err(config_error)?;
        embedding.validate().map_err(config_error)?;
        let llm = EnvLlmConfig::from_env().map_err(config_error)?;
        if llm.base_url.is_none() {
            return Err(MemoryError::Config("AZURE_OPENAI_ENDPOINT not set".to_string()));
        }
        Ok(Self {
            cosmos,
            embedding,
            llm,
        })
    }

    /// Whether turns are embedded when written (`AZURE_VECTOR_INDEX`).
    pub fn embed_on_write(&self) -> bool {
        self.embedding.vector_index
    }
}

fn config_error(e: anyhow::Error) -> MemoryError {
    MemoryError::Config(format!("{:#}", e))
}
