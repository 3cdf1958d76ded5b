//! [`LlmClient`] backed by openai-client; optionally prepends a system message.

use anyhow::Result;
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};
use tracing::instrument;

use super::{chat_message_to_openai, CompletionOptions, LlmClient, LlmConfig};

/// LlmClient implementation over [`openai_client::OpenAIClient`].
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAILlmClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model,
            system_prompt: None,
        }
    }

    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model,
            system_prompt: None,
        }
    }

    /// Builds the client from an [`LlmConfig`]; the public OpenAI API when no base URL is set.
    pub fn from_config(config: &dyn LlmConfig) -> Self {
        let client = match config.base_url() {
            Some(url) => Self::with_base_url(
                config.api_key().to_string(),
                url.to_string(),
                config.model().to_string(),
            ),
            None => Self::new(config.api_key().to_string(), config.model().to_string()),
        };
        client.with_system_prompt_opt(config.system_prompt().map(str::to_string))
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// System message prepended when the caller's messages carry none.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_system_prompt_opt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages, options), fields(model = %self.model))]
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String> {
        let has_system = messages.iter().any(|m| m.role == MessageRole::System);
        let mut openai_messages = Vec::with_capacity(messages.len() + 1);
        if let (false, Some(system)) = (has_system, self.system_prompt.as_deref()) {
            openai_messages.push(chat_message_to_openai(&ChatMessage::system(system))?);
        }
        for msg in &messages {
            openai_messages.push(chat_message_to_openai(msg)?);
        }
        self.client
            .chat_completion(&self.model, openai_messages, options)
            .await
    }
}
