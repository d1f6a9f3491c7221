//! Embedding provider backed by a Text Embeddings Inference endpoint.
//!
//! [TEI](https://github.com/huggingface/text-embeddings-inference) serves
//! sentence-transformer models (the default here is `all-MiniLM-L6-v2`)
//! behind a small HTTP API; this provider calls its `/embed` route.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default embedding model served by the endpoint.
const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// The dimensionality of `all-MiniLM-L6-v2` embeddings.
const DEFAULT_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] backed by a Text Embeddings Inference server.
///
/// # Configuration
///
/// - `base_url` – endpoint root, e.g. `http://localhost:8080`.
/// - `model` – defaults to `all-MiniLM-L6-v2`; must match the model the
///   server actually hosts, since it becomes the store's model identifier.
/// - `dimensions` – defaults to 384; override for other models.
///
/// # Example
///
/// ```rust,ignore
/// use vaidya_rag::tei::TeiEmbeddingProvider;
///
/// let provider = TeiEmbeddingProvider::new("http://localhost:8080")?;
/// let embedding = provider.embed("burning sensation after meals").await?;
/// ```
pub struct TeiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl TeiEmbeddingProvider {
    /// Create a new provider for the given endpoint root.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "TEI".into(),
                message: "endpoint URL must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a provider from the configured endpoint and model identifier.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(config.embedding_endpoint.clone())?.with_model(config.embedding_model.clone()))
    }

    /// Set the model identifier reported by this provider.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensionality (for models other than the default).
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

// ── TEI API request/response types ─────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: Vec<&'a str>,
    truncate: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for TeiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "TEI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: "TEI".into(),
            message: "endpoint returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "TEI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbedRequest { inputs: texts.to_vec(), truncate: true };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "TEI", error = %e, "request failed");
                RagError::EmbeddingError {
                    provider: "TEI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);

            error!(provider = "TEI", %status, "endpoint error");
            return Err(RagError::EmbeddingError {
                provider: "TEI".into(),
                message: format!("endpoint returned {status}: {detail}"),
            });
        }

        let embeddings: Vec<Vec<f32>> = response.json().await.map_err(|e| {
            error!(provider = "TEI", error = %e, "failed to parse response");
            RagError::EmbeddingError {
                provider: "TEI".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
