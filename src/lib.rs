//! Retrieval-Augmented Generation core for an Ayurvedic health assistant.
//!
//! This crate covers the retrieval side of a health-symptom question
//! answering system:
//! - Loading a corpus of PDF, DOCX, and plain-text documents
//! - Splitting documents into overlapping, size-bounded chunks
//! - Generating embeddings with batching and failure isolation
//! - Indexing chunk vectors with exact cosine nearest-neighbor search and
//!   save/load persistence
//! - Assembling ranked, filtered context strings for the prompt layer
//!
//! The generative model, prompt templates, and user interfaces are external
//! collaborators: retrieval feeds generation, never the other way around.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vaidya_rag::{
//!     IngestionPipeline, RagConfig, Retriever, TeiEmbeddingProvider, VectorStore,
//! };
//!
//! let config = RagConfig::builder()
//!     .embedding_model("all-MiniLM-L6-v2")
//!     .build()?;
//! let provider = Arc::new(TeiEmbeddingProvider::from_config(&config)?);
//! let store = Arc::new(VectorStore::new(&config, provider));
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config.clone())
//!     .vector_store(store.clone())
//!     .build()?;
//! pipeline.ensure_ready(std::path::Path::new("./data/raw")).await?;
//!
//! let retriever = Retriever::new(store);
//! let context = retriever.get_relevant_context("dry skin and anxiety", None).await;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod tei;
pub mod vectorstore;

pub use chunking::TextChunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, ChunkMetadata, ChunkStatistics, CorpusStatistics, Document, DocumentMetadata,
    ModelInfo, RetrievalResult, RetrievalStatistics, SearchResult, SourceType, StoreStatistics,
};
pub use embedding::{cosine_similarity, EmbeddingManager, EmbeddingProvider};
pub use error::{RagError, Result};
pub use loader::DocumentLoader;
pub use pipeline::{IngestionPipeline, IngestionPipelineBuilder, IngestionReport};
pub use retriever::{Retriever, CONTEXT_ERROR, NO_CONTEXT_FOUND};
pub use tei::TeiEmbeddingProvider;
pub use vectorstore::VectorStore;
