//! Ingestion pipeline: load → chunk → embed → index → persist.
//!
//! [`IngestionPipeline`] runs the stages sequentially for a corpus
//! directory; each stage completes before the next begins. Construct one via
//! [`IngestionPipeline::builder()`].
//!
//! # Example
//!
//! ```rust,ignore
//! use vaidya_rag::{IngestionPipeline, RagConfig, VectorStore};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config.clone())
//!     .vector_store(store.clone())
//!     .build()?;
//!
//! let report = pipeline.rebuild(Path::new("./data/raw")).await?;
//! println!("indexed {} chunks", report.chunks_indexed);
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::TextChunker;
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;
use crate::vectorstore::VectorStore;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Number of documents loaded from the corpus directory.
    pub documents_loaded: usize,
    /// Number of chunks produced from those documents.
    pub chunks_created: usize,
    /// Number of chunks embedded and indexed.
    pub chunks_indexed: usize,
    /// Whether the index was persisted to disk.
    pub persisted: bool,
}

/// Orchestrates the ingestion stages against a [`VectorStore`].
pub struct IngestionPipeline {
    loader: DocumentLoader,
    chunker: TextChunker,
    store: Arc<VectorStore>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// The vector store this pipeline feeds.
    pub fn vector_store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Load, chunk, and index every supported document under `corpus_dir`.
    ///
    /// An empty corpus yields a zeroed report, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] when indexing fails (the store
    /// logs the underlying cause).
    pub async fn ingest_directory(&self, corpus_dir: &Path) -> Result<IngestionReport> {
        let documents = self.loader.load_documents_from_directory(corpus_dir);
        if documents.is_empty() {
            warn!(directory = %corpus_dir.display(), "no documents to ingest");
            return Ok(IngestionReport {
                documents_loaded: 0,
                chunks_created: 0,
                chunks_indexed: 0,
                persisted: false,
            });
        }

        let chunks = self.chunker.chunk_documents(&documents);
        let documents_loaded = documents.len();
        drop(documents);

        if chunks.is_empty() {
            warn!(documents_loaded, "documents yielded no chunks");
            return Ok(IngestionReport {
                documents_loaded,
                chunks_created: 0,
                chunks_indexed: 0,
                persisted: false,
            });
        }

        if !self.store.add_documents(&chunks).await {
            return Err(RagError::PipelineError(format!(
                "failed to index {} chunks from {}",
                chunks.len(),
                corpus_dir.display()
            )));
        }

        info!(documents_loaded, chunks_indexed = chunks.len(), "ingestion completed");
        Ok(IngestionReport {
            documents_loaded,
            chunks_created: chunks.len(),
            chunks_indexed: chunks.len(),
            persisted: false,
        })
    }

    /// Rebuild the index from scratch: clear, ingest, persist.
    ///
    /// A persistence failure is logged and reported through
    /// `IngestionReport::persisted` rather than failing the rebuild — the
    /// in-memory index remains usable.
    pub async fn rebuild(&self, corpus_dir: &Path) -> Result<IngestionReport> {
        self.store.clear().await;
        let mut report = self.ingest_directory(corpus_dir).await?;

        if report.chunks_indexed > 0 {
            report.persisted = self.store.save().await;
            if !report.persisted {
                error!("rebuilt index could not be persisted");
            }
        }
        Ok(report)
    }

    /// Make the store ready to answer queries: load the persisted index if
    /// one exists, otherwise rebuild from `corpus_dir`.
    pub async fn ensure_ready(&self, corpus_dir: &Path) -> Result<()> {
        if self.store.exists() && self.store.load().await {
            info!("vector store loaded from disk");
            return Ok(());
        }

        info!(directory = %corpus_dir.display(), "no usable persisted store, rebuilding");
        let report = self.rebuild(corpus_dir).await?;
        if report.chunks_indexed == 0 {
            warn!("store is ready but empty; retrieval will return no context");
        }
        Ok(())
    }
}

/// Builder for constructing an [`IngestionPipeline`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RagConfig>,
    store: Option<Arc<VectorStore>>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the vector store the pipeline feeds.
    pub fn vector_store(mut self, store: Arc<VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`IngestionPipeline`], validating that all required fields
    /// are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        Ok(IngestionPipeline {
            loader: DocumentLoader::new(&config),
            chunker: TextChunker::new(&config),
            store,
        })
    }
}
