//! # OpenAI Embedding Service
//!
//! Implementation of the `EmbeddingService` trait over any OpenAI-compatible embeddings
//! endpoint (OpenAI, Azure OpenAI v1 endpoints, local gateways).
//!
//! ## Dimensions
//!
//! `text-embedding-3-*` models accept a `dimensions` parameter that shortens the output
//! vector. The vector index of the memory container is built for a fixed size, so the
//! service always sends the configured dimensionality when one is set.
//!
//! ## Example
//!
//! ```rust,no_run
//! use openai_embedding::OpenAIEmbedding;
//! use embedding::EmbeddingService;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let service = OpenAIEmbedding::new("sk-...".to_string(), "text-embedding-3-small".to_string())
//!         .with_dimensions(512);
//!     let embedding = service.embed("Hello world").await?;
//!     assert_eq!(embedding.len(), 512);
//!     Ok(())
//! }
//! ```

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService};
use tracing::{debug, info, instrument, warn};

/// Default timeout for a single embed request (connect + request + response).
const EMBED_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
/// Batch requests carry a larger payload.
const EMBED_BATCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
const LOG_PREVIEW_LEN: usize = 200;

/// OpenAI embedding service. Holds the async-openai client, model name and output size.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAIEmbedding {
    /// Creates a service against the public OpenAI API.
    ///
    /// An empty `api_key` falls back to the OPENAI_API_KEY environment variable.
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// Creates a service against an OpenAI-compatible endpoint when `base_url` is `Some`.
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let api_key = if api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            api_key
        };

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url.trim_end_matches('/'));
        }

        Self {
            client: Client::with_config(openai_config),
            model,
            dimensions: None,
        }
    }

    /// Builds the service from an [`EmbeddingConfig`] (model, key, endpoint, dimensions).
    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        Self::new_with_base_url(
            config.api_key().to_string(),
            config.model().to_string(),
            config.base_url(),
        )
        .with_dimensions(config.dimensions())
    }

    /// Requests vectors of `dimensions` length.
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Returns the embedding model name (for tests and diagnostics).
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> Option<u32> {
        self.dimensions
    }

    async fn request(
        &self,
        inputs: Vec<&str>,
        timeout: std::time::Duration,
    ) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(self.model.clone()).input(inputs);
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build()?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(timeout, embeddings.create(request)).await {
            Ok(Ok(r)) => {
                debug!("OpenAI embed response received");
                r
            }
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI embed request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "OpenAI embed request timed out");
                return Err(anyhow::anyhow!(
                    "OpenAI embed request timed out after {} seconds",
                    timeout.as_secs()
                ));
            }
        };

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    /// Embeds one text. Fails if the response carries no vector.
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        info!(
            model = %self.model,
            dimensions = ?self.dimensions,
            text_preview = %preview(text),
            "step: embedding OpenAI embed request"
        );

        let embedding = match self.request(vec![text], EMBED_TIMEOUT).await?.into_iter().next() {
            Some(v) => v,
            None => {
                warn!("OpenAI embed response has no embedding data");
                return Err(anyhow::anyhow!("No embedding in response"));
            }
        };

        info!(dimension = embedding.len(), "step: embedding OpenAI embed done");
        Ok(embedding)
    }

    /// Embeds several texts in one request; output order matches input order.
    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            debug!("OpenAI embed_batch empty input, skipping");
            return Ok(vec![]);
        }

        info!(
            model = %self.model,
            batch_size = texts.len(),
            "step: embedding OpenAI embed_batch request"
        );

        let inputs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let embeddings = self.request(inputs, EMBED_BATCH_TIMEOUT).await?;

        if embeddings.len() != texts.len() {
            warn!(
                expected = texts.len(),
                got = embeddings.len(),
                "OpenAI embed_batch response count mismatch"
            );
            return Err(anyhow::anyhow!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            ));
        }

        info!(count = embeddings.len(), "step: embedding OpenAI embed_batch done");
        Ok(embeddings)
    }
}
