//! Configuration for the RAG subsystem.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Immutable configuration for the RAG subsystem.
///
/// Constructed through [`RagConfig::builder()`], which validates parameter
/// consistency before any component is built. Components receive the config
/// by reference at construction; there is no process-wide settings state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Identifier of the embedding model used to build and query the index.
    pub embedding_model: String,
    /// Base URL of the embedding inference endpoint.
    pub embedding_endpoint: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of top results returned by retrieval.
    pub top_k_retrieval: usize,
    /// Directory where the vector index is persisted.
    pub vector_store_path: PathBuf,
    /// File extensions (without the dot) accepted by the document loader.
    pub supported_formats: Vec<String>,
    /// Files larger than this are skipped by the document loader.
    pub max_file_size_mb: u64,
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone)]
pub struct RagConfigBuilder {
    embedding_model: Option<String>,
    embedding_endpoint: String,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k_retrieval: usize,
    vector_store_path: PathBuf,
    supported_formats: Vec<String>,
    max_file_size_mb: u64,
}

impl Default for RagConfigBuilder {
    fn default() -> Self {
        Self {
            embedding_model: None,
            embedding_endpoint: "http://localhost:8080".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k_retrieval: 5,
            vector_store_path: PathBuf::from("./data/vector_store"),
            supported_formats: vec!["pdf".to_string(), "docx".to_string(), "txt".to_string()],
            max_file_size_mb: 50,
        }
    }
}

impl RagConfigBuilder {
    /// Set the embedding model identifier. Required.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Set the base URL of the embedding inference endpoint.
    pub fn embedding_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.embedding_endpoint = endpoint.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap;
        self
    }

    /// Set the default number of top results returned by retrieval.
    pub fn top_k_retrieval(mut self, k: usize) -> Self {
        self.top_k_retrieval = k;
        self
    }

    /// Set the directory where the vector index is persisted.
    pub fn vector_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vector_store_path = path.into();
        self
    }

    /// Set the file extensions accepted by the document loader.
    pub fn supported_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum file size in megabytes accepted by the loader.
    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.max_file_size_mb = mb;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `embedding_model` is missing or empty
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k_retrieval == 0`
    pub fn build(self) -> Result<RagConfig> {
        let embedding_model = match self.embedding_model {
            Some(model) if !model.trim().is_empty() => model,
            _ => {
                return Err(RagError::ConfigError(
                    "embedding_model identifier is required".to_string(),
                ));
            }
        };
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k_retrieval == 0 {
            return Err(RagError::ConfigError(
                "top_k_retrieval must be greater than zero".to_string(),
            ));
        }

        Ok(RagConfig {
            embedding_model,
            embedding_endpoint: self.embedding_endpoint,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            top_k_retrieval: self.top_k_retrieval,
            vector_store_path: self.vector_store_path,
            supported_formats: self.supported_formats,
            max_file_size_mb: self.max_file_size_mb,
        })
    }
}
