//! Embedding provider trait and the embedding manager built on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::document::ModelInfo;
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it. Output is
/// deterministic for identical input and has a fixed dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the identifier of the embedding model.
    fn model_name(&self) -> &str;
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]`, or 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Manages embedding generation for one fixed model.
///
/// The dimensionality and model identifier are fetched from the provider once
/// at construction and cached; every vector produced by one manager instance
/// shares that dimensionality.
pub struct EmbeddingManager {
    provider: Arc<dyn EmbeddingProvider>,
    model_name: String,
    dimension: usize,
}

impl EmbeddingManager {
    /// Create a manager over the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let model_name = provider.model_name().to_string();
        let dimension = provider.dimensions();
        debug!(model = %model_name, dimension, "initialized embedding manager");
        Self { provider, model_name, dimension }
    }

    /// The cached embedding dimensionality.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The cached embedding model identifier.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Identity of the model behind this manager.
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: self.model_name.clone(),
            embedding_dimension: self.dimension,
        }
    }

    /// Generate an embedding for a single text.
    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        self.provider.embed(text).await
    }

    /// Generate embeddings for a list of texts, propagating any failure.
    pub async fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.provider.embed_batch(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingError {
                provider: self.model_name.clone(),
                message: format!(
                    "provider returned {} embeddings for {} inputs",
                    embeddings.len(),
                    texts.len()
                ),
            });
        }
        Ok(embeddings)
    }

    /// Generate embeddings in fixed-size batches.
    ///
    /// A failed batch is replaced by zero-vectors of the cached
    /// dimensionality instead of aborting the run; callers can detect the
    /// all-zero sentinel. The output order matches the input order.
    pub async fn batch_generate_embeddings(
        &self,
        texts: &[&str],
        batch_size: usize,
    ) -> Vec<Vec<f32>> {
        let batch_size = batch_size.max(1);
        let total_batches = texts.len().div_ceil(batch_size);
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for (number, batch) in texts.chunks(batch_size).enumerate() {
            match self.generate_embeddings(batch).await {
                Ok(embeddings) => {
                    debug!(batch = number + 1, total_batches, "embedded batch");
                    all_embeddings.extend(embeddings);
                }
                Err(e) => {
                    error!(batch = number + 1, total_batches, error = %e, "batch embedding failed, substituting zero-vectors");
                    all_embeddings.extend(
                        std::iter::repeat_with(|| vec![0.0; self.dimension]).take(batch.len()),
                    );
                }
            }
        }
        all_embeddings
    }

    /// Cosine similarity between two embeddings, in `[-1, 1]`.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    /// Rank candidate embeddings by similarity to a query embedding.
    ///
    /// Returns `(index, score)` pairs in descending score order, lower index
    /// winning ties, truncated to `top_k`.
    pub fn find_most_similar(
        &self,
        query: &[f32],
        candidates: &[Vec<f32>],
        top_k: usize,
    ) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| (index, cosine_similarity(query, candidate)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic provider for tests; embeds by character statistics.
    struct StubProvider {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(RagError::EmbeddingError {
                    provider: "stub".to_string(),
                    message: "unavailable".to_string(),
                });
            }
            let mut vector = vec![0.0f32; 4];
            for (index, byte) in text.bytes().enumerate() {
                vector[index % 4] += f32::from(byte) / 255.0;
            }
            Ok(vector)
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn manager(fail: bool) -> EmbeddingManager {
        EmbeddingManager::new(Arc::new(StubProvider { fail }))
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn find_most_similar_breaks_ties_by_lower_index() {
        let manager = manager(false);
        let candidates = vec![
            vec![0.0, 1.0],
            vec![2.0, 0.0],
            vec![1.0, 0.0],
        ];
        let ranked = manager.find_most_similar(&[1.0, 0.0], &candidates, 10);
        // Candidates 1 and 2 both score 1.0; index 1 must come first.
        assert_eq!(ranked.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2, 0]);

        let top = manager.find_most_similar(&[1.0, 0.0], &candidates, 2);
        assert_eq!(top.len(), 2);
    }

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let manager = manager(false);
        let a = manager.generate_embedding("vata imbalance symptoms").await.unwrap();
        let b = manager.generate_embedding("vata imbalance symptoms").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), manager.dimension());
    }

    #[tokio::test]
    async fn failed_batches_become_zero_vectors() {
        let manager = manager(true);
        let texts = ["one", "two", "three"];
        let embeddings = manager.batch_generate_embeddings(&texts, 2).await;
        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 4);
            assert!(embedding.iter().all(|value| *value == 0.0));
        }
    }

    #[tokio::test]
    async fn batch_generation_preserves_order() {
        let manager = manager(false);
        let texts = ["alpha", "beta", "gamma", "delta", "epsilon"];
        let batched = manager.batch_generate_embeddings(&texts, 2).await;
        let direct = manager.generate_embeddings(&texts).await.unwrap();
        assert_eq!(batched, direct);
    }
}
