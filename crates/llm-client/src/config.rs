//! LLM configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    /// `None` means the public OpenAI API.
    fn base_url(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn system_prompt(&self) -> Option<&str>;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub completions_model: String,
    pub system_prompt: Option<String>,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
    fn model(&self) -> &str {
        &self.completions_model
    }
    fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    ///
    /// AZURE_OPENAI_COMPLETIONS_MODEL is required. AZURE_OPENAI_API_KEY falls back to
    /// OPENAI_API_KEY; AZURE_OPENAI_ENDPOINT is the OpenAI-compatible base URL.
    /// LLM_SYSTEM_PROMPT optionally overrides the chat system message.
    pub fn from_env() -> Result<Self> {
        let completions_model = env::var("AZURE_OPENAI_COMPLETIONS_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("AZURE_OPENAI_COMPLETIONS_MODEL not set")?;
        let api_key = env::var("AZURE_OPENAI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .context("AZURE_OPENAI_API_KEY (or OPENAI_API_KEY) not set")?;
        let base_url = env::var("AZURE_OPENAI_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            api_key,
            base_url,
            completions_model,
            system_prompt,
        })
    }
}
