//! Retrieval orchestration: ranked, filtered, formatted context for the
//! prompt layer.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{RetrievalResult, RetrievalStatistics, SearchResult, StoreStatistics};
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Context string returned when retrieval finds nothing.
pub const NO_CONTEXT_FOUND: &str = "No relevant context found.";

/// Context string returned when retrieval itself fails. Distinct from
/// [`NO_CONTEXT_FOUND`] so the prompt layer can tell the two apart.
pub const CONTEXT_ERROR: &str = "Error retrieving context.";

/// Turns vector-store hits into ranked, filtered, human-readable context.
pub struct Retriever {
    store: Arc<VectorStore>,
}

impl Retriever {
    /// Create a retriever over the given store.
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Retrieve ranked results for a query, or an error when the search
    /// path truly fails (as opposed to finding nothing).
    pub async fn try_retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievalResult>> {
        let results = self.store.try_search(query, top_k).await?;
        let reshaped: Vec<RetrievalResult> = results.into_iter().map(reshape).collect();
        info!(result_count = reshaped.len(), "retrieved documents");
        Ok(reshaped)
    }

    /// Graceful retrieval: failures are logged and reported as no results.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Vec<RetrievalResult> {
        match self.try_retrieve(query, top_k).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                Vec::new()
            }
        }
    }

    /// Render retrieval results as a context string for the prompt layer.
    ///
    /// Each result becomes a numbered block in best-first order:
    ///
    /// ```text
    /// Document 1 (Source: vata_guide.txt, Relevance: 0.812):
    /// <content>
    /// ```
    ///
    /// Returns [`NO_CONTEXT_FOUND`] when nothing is retrieved and
    /// [`CONTEXT_ERROR`] when retrieval fails.
    pub async fn get_relevant_context(&self, query: &str, top_k: Option<usize>) -> String {
        let results = match self.try_retrieve(query, top_k).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "failed to build retrieval context");
                return CONTEXT_ERROR.to_string();
            }
        };
        if results.is_empty() {
            return NO_CONTEXT_FOUND.to_string();
        }

        let blocks: Vec<String> = results
            .iter()
            .enumerate()
            .map(|(position, result)| {
                format!(
                    "Document {} (Source: {}, Relevance: {:.3}):\n{}\n",
                    position + 1,
                    result.source,
                    result.score,
                    result.content
                )
            })
            .collect();
        blocks.join("\n")
    }

    /// Retrieve with a minimum-score filter and an optional case-insensitive
    /// substring filter on the source name. Relative order is preserved.
    pub async fn retrieve_with_filters(
        &self,
        query: &str,
        source_filter: Option<&str>,
        min_score: f32,
        top_k: Option<usize>,
    ) -> Vec<RetrievalResult> {
        let results = self.retrieve(query, top_k).await;
        let before = results.len();

        let source_filter = source_filter.map(str::to_lowercase);
        let filtered: Vec<RetrievalResult> = results
            .into_iter()
            .filter(|result| result.score >= min_score)
            .filter(|result| {
                source_filter
                    .as_deref()
                    .is_none_or(|needle| result.source.to_lowercase().contains(needle))
            })
            .collect();

        info!(before, after = filtered.len(), "filtered retrieval results");
        filtered
    }

    /// Whether the retriever can answer queries: the underlying store holds
    /// a non-empty index.
    pub async fn is_initialized(&self) -> bool {
        self.store.get_document_count().await > 0
    }

    /// Score and source statistics for one retrieval run. All-zero/empty
    /// when nothing is retrieved.
    pub async fn get_retrieval_statistics(&self, query: &str) -> RetrievalStatistics {
        let results = self.retrieve(query, None).await;
        if results.is_empty() {
            return RetrievalStatistics {
                total_results: 0,
                average_score: 0.0,
                score_range: (0.0, 0.0),
                sources: Vec::new(),
                unique_sources: 0,
            };
        }

        let scores: Vec<f32> = results.iter().map(|result| result.score).collect();
        let mut sources: Vec<String> = Vec::new();
        for result in &results {
            if !sources.contains(&result.source) {
                sources.push(result.source.clone());
            }
        }

        let minimum = scores.iter().copied().fold(f32::INFINITY, f32::min);
        let maximum = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let unique_sources = sources.len();

        RetrievalStatistics {
            total_results: results.len(),
            average_score: scores.iter().sum::<f32>() / scores.len() as f32,
            score_range: (minimum, maximum),
            sources,
            unique_sources,
        }
    }

    /// Statistics for the underlying vector store.
    pub async fn vector_store_info(&self) -> StoreStatistics {
        self.store.get_statistics().await
    }
}

fn reshape(result: SearchResult) -> RetrievalResult {
    let source = result
        .metadata
        .source_file
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    RetrievalResult {
        content: result.content,
        metadata: result.metadata,
        score: result.similarity_score,
        source,
    }
}
