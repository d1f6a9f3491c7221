//! Shared fixtures for integration tests: deterministic, network-free
//! embedding providers and chunk builders.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use vaidya_rag::{
    Chunk, ChunkMetadata, EmbeddingProvider, RagConfig, RagError, Result, SourceType,
};

/// Dimensionality of the test embeddings.
pub const DIMENSION: usize = 16;

/// Deterministic embedding provider: projects character bigrams into a
/// fixed-size count vector. Identical text always embeds identically, so an
/// exact-content query scores 1.0 against its own chunk.
pub struct HashEmbeddingProvider {
    model: String,
}

impl HashEmbeddingProvider {
    pub fn new() -> Self {
        Self { model: "hash-test-embedder".to_string() }
    }

    pub fn with_model(model: &str) -> Self {
        Self { model: model.to_string() }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMENSION];
        let bytes = text.as_bytes();
        for window in bytes.windows(2) {
            let bucket = (window[0] as usize * 31 + window[1] as usize) % DIMENSION;
            vector[bucket] += 1.0;
        }
        if let [single] = bytes {
            vector[*single as usize % DIMENSION] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider that can be switched into a failing state mid-test, to exercise
/// failure paths after a store has been populated.
pub struct FlakyEmbeddingProvider {
    inner: HashEmbeddingProvider,
    failing: AtomicBool,
}

impl FlakyEmbeddingProvider {
    pub fn new() -> Self {
        Self { inner: HashEmbeddingProvider::new(), failing: AtomicBool::new(false) }
    }

    /// Make every subsequent embedding call fail.
    pub fn arm(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Restore normal operation.
    pub fn disarm(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingError {
                provider: self.inner.model.clone(),
                message: "embedding service unavailable".to_string(),
            });
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build a config whose store path points into a test directory.
pub fn test_config(store_path: &std::path::Path) -> RagConfig {
    RagConfig::builder()
        .embedding_model("hash-test-embedder")
        .vector_store_path(store_path)
        .build()
        .unwrap()
}

/// Build a chunk the way the chunker would, with a named source file.
pub fn chunk(source: &str, index: usize, total: usize, content: &str) -> Chunk {
    Chunk {
        id: format!("{source}_chunk_{index}"),
        content: content.to_string(),
        metadata: ChunkMetadata {
            source_file: Some(source.to_string()),
            file_path: Some(format!("/corpus/{source}")),
            source_type: Some(SourceType::Text),
            chunk_index: index,
            total_chunks: total,
            title: Some(source.trim_end_matches(".txt").to_string()),
            num_pages: None,
            num_paragraphs: None,
        },
    }
}
