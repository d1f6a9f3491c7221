//! Vector store: embedding-backed index with similarity search and
//! persistence.
//!
//! [`VectorStore`] owns the index exclusively. Entries are appended during
//! [`add_documents`](VectorStore::add_documents) and never updated or
//! deleted; the whole index can be cleared or reloaded wholesale. A
//! `tokio::sync::RwLock` serializes writers while letting searches run
//! concurrently.
//!
//! The read paths degrade gracefully: searching an empty store returns an
//! empty list, a failed add returns `false`, and a corrupt persisted state
//! fails a `load` without touching the in-memory index.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{Chunk, ChunkMetadata, SearchResult, StoreStatistics};
use crate::embedding::{cosine_similarity, EmbeddingManager, EmbeddingProvider};
use crate::error::{RagError, Result};

const MANIFEST_FILE: &str = "manifest.json";
const INDEX_FILE: &str = "index.json";
const PAYLOAD_FILE: &str = "payload.json";

/// Parallel arrays forming the index: entry `i` is
/// `(embeddings[i], contents[i], metadatas[i])`.
#[derive(Debug, Default)]
struct VectorIndex {
    embeddings: Vec<Vec<f32>>,
    contents: Vec<String>,
    metadatas: Vec<ChunkMetadata>,
}

impl VectorIndex {
    fn len(&self) -> usize {
        self.embeddings.len()
    }
}

/// Identity and shape of a persisted store.
#[derive(Debug, Serialize, Deserialize)]
struct StoreManifest {
    model: String,
    dimension: usize,
    total_documents: usize,
}

/// Persisted chunk payload, parallel to the persisted embeddings.
#[derive(Debug, Serialize, Deserialize)]
struct StorePayload {
    contents: Vec<String>,
    metadatas: Vec<ChunkMetadata>,
}

/// Stores chunk embeddings with their payload and answers nearest-neighbor
/// queries by cosine similarity.
pub struct VectorStore {
    embedding_manager: EmbeddingManager,
    store_path: PathBuf,
    default_top_k: usize,
    index: RwLock<Option<VectorIndex>>,
}

impl VectorStore {
    /// Create an empty store over the given embedding provider.
    pub fn new(config: &RagConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        info!(store_path = %config.vector_store_path.display(), "initialized vector store");
        Self {
            embedding_manager: EmbeddingManager::new(provider),
            store_path: config.vector_store_path.clone(),
            default_top_k: config.top_k_retrieval,
            index: RwLock::new(None),
        }
    }

    /// The embedding manager behind this store.
    pub fn embedding_manager(&self) -> &EmbeddingManager {
        &self.embedding_manager
    }

    /// Embed and index a batch of chunks.
    ///
    /// The first successful call creates the index; subsequent calls append.
    /// Returns `false` — leaving the store in its prior state — when the
    /// batch is empty or embedding fails; the cause is logged.
    pub async fn add_documents(&self, chunks: &[Chunk]) -> bool {
        if chunks.is_empty() {
            warn!("no chunks provided to add to vector store");
            return false;
        }

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.content.as_str()).collect();
        info!(chunk_count = texts.len(), "generating embeddings for chunk batch");
        let embeddings = match self.embedding_manager.generate_embeddings(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                error!(error = %e, "embedding failed, vector store unchanged");
                return false;
            }
        };

        let mut guard = self.index.write().await;
        let index = guard.get_or_insert_with(VectorIndex::default);
        let created = index.len() == 0;
        index.embeddings.extend(embeddings);
        index.contents.extend(chunks.iter().map(|chunk| chunk.content.clone()));
        index.metadatas.extend(chunks.iter().map(|chunk| chunk.metadata.clone()));

        if created {
            info!(entry_count = index.len(), "created new vector index");
        } else {
            info!(added = chunks.len(), entry_count = index.len(), "appended to vector index");
        }
        true
    }

    /// Search for the chunks most similar to `query`.
    ///
    /// Distinguishes true failure (`Err`, e.g. the embedding service is
    /// unreachable) from an empty store (`Ok` with an empty list). Results
    /// are ordered by descending similarity, lower insertion index winning
    /// ties, truncated to `top_k` (the configured default when `None`).
    pub async fn try_search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let guard = self.index.read().await;
        let Some(index) = guard.as_ref().filter(|index| index.len() > 0) else {
            warn!("vector store is empty, returning no results");
            return Ok(Vec::new());
        };

        let query_embedding = self.embedding_manager.generate_embedding(query).await?;

        let top_k = top_k.unwrap_or(self.default_top_k);
        let mut scored: Vec<(usize, f32)> = index
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| {
                (position, cosine_similarity(&query_embedding, embedding))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        let results: Vec<SearchResult> = scored
            .into_iter()
            .map(|(position, similarity_score)| SearchResult {
                content: index.contents[position].clone(),
                metadata: index.metadatas[position].clone(),
                similarity_score,
            })
            .collect();

        info!(result_count = results.len(), "vector search completed");
        Ok(results)
    }

    /// Graceful search: any failure is logged and reported as no results.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Vec<SearchResult> {
        match self.try_search(query, top_k).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "vector search failed");
                Vec::new()
            }
        }
    }

    /// Persist the index to the configured store path.
    pub async fn save(&self) -> bool {
        self.save_to(&self.store_path).await
    }

    /// Persist the index to `directory` as a manifest plus parallel
    /// embedding/payload files. Returns `false` (logged) when the store is
    /// empty or writing fails.
    pub async fn save_to(&self, directory: &Path) -> bool {
        let guard = self.index.read().await;
        let Some(index) = guard.as_ref() else {
            warn!("no vector index to save");
            return false;
        };

        match self.write_state(directory, index) {
            Ok(()) => {
                info!(directory = %directory.display(), entry_count = index.len(), "saved vector store");
                true
            }
            Err(e) => {
                error!(directory = %directory.display(), error = %e, "failed to save vector store");
                false
            }
        }
    }

    fn write_state(&self, directory: &Path, index: &VectorIndex) -> Result<()> {
        let io = |e: std::io::Error| RagError::StoreError(e.to_string());
        let json = |e: serde_json::Error| RagError::StoreError(e.to_string());

        fs::create_dir_all(directory).map_err(io)?;

        let manifest = StoreManifest {
            model: self.embedding_manager.model_name().to_string(),
            dimension: self.embedding_manager.dimension(),
            total_documents: index.len(),
        };
        let manifest_file = fs::File::create(directory.join(MANIFEST_FILE)).map_err(io)?;
        serde_json::to_writer_pretty(BufWriter::new(manifest_file), &manifest).map_err(json)?;

        let index_file = fs::File::create(directory.join(INDEX_FILE)).map_err(io)?;
        serde_json::to_writer(BufWriter::new(index_file), &index.embeddings).map_err(json)?;

        let payload = StorePayload {
            contents: index.contents.clone(),
            metadatas: index.metadatas.clone(),
        };
        let payload_file = fs::File::create(directory.join(PAYLOAD_FILE)).map_err(io)?;
        serde_json::to_writer(BufWriter::new(payload_file), &payload).map_err(json)?;

        Ok(())
    }

    /// Restore the index from the configured store path.
    pub async fn load(&self) -> bool {
        self.load_from(&self.store_path).await
    }

    /// Restore the index from `directory`.
    ///
    /// Returns `false` (logged) when the directory is missing, the persisted
    /// state is corrupt, or the persisted model identifier does not match
    /// the live embedding model. The in-memory index is only replaced on a
    /// fully successful load.
    pub async fn load_from(&self, directory: &Path) -> bool {
        match self.read_state(directory) {
            Ok(index) => {
                let entry_count = index.len();
                *self.index.write().await = Some(index);
                info!(directory = %directory.display(), entry_count, "loaded vector store");
                true
            }
            Err(e) => {
                error!(directory = %directory.display(), error = %e, "failed to load vector store");
                false
            }
        }
    }

    fn read_state(&self, directory: &Path) -> Result<VectorIndex> {
        let io = |e: std::io::Error| RagError::StoreError(e.to_string());
        let json = |e: serde_json::Error| RagError::StoreError(e.to_string());

        let manifest_path = directory.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(RagError::StoreError(format!(
                "no persisted store at {}",
                directory.display()
            )));
        }

        let manifest_file = fs::File::open(manifest_path).map_err(io)?;
        let manifest: StoreManifest =
            serde_json::from_reader(BufReader::new(manifest_file)).map_err(json)?;
        if manifest.model != self.embedding_manager.model_name() {
            return Err(RagError::StoreError(format!(
                "persisted store was built with model '{}' but this store uses '{}'",
                manifest.model,
                self.embedding_manager.model_name()
            )));
        }
        if manifest.dimension != self.embedding_manager.dimension() {
            return Err(RagError::StoreError(format!(
                "persisted dimension {} does not match model dimension {}",
                manifest.dimension,
                self.embedding_manager.dimension()
            )));
        }

        let index_file = fs::File::open(directory.join(INDEX_FILE)).map_err(io)?;
        let embeddings: Vec<Vec<f32>> =
            serde_json::from_reader(BufReader::new(index_file)).map_err(json)?;

        let payload_file = fs::File::open(directory.join(PAYLOAD_FILE)).map_err(io)?;
        let payload: StorePayload =
            serde_json::from_reader(BufReader::new(payload_file)).map_err(json)?;

        if embeddings.len() != payload.contents.len()
            || embeddings.len() != payload.metadatas.len()
            || embeddings.len() != manifest.total_documents
        {
            return Err(RagError::StoreError(
                "persisted index and payload lengths do not agree".to_string(),
            ));
        }

        Ok(VectorIndex {
            embeddings,
            contents: payload.contents,
            metadatas: payload.metadatas,
        })
    }

    /// Statistics describing this store.
    pub async fn get_statistics(&self) -> StoreStatistics {
        let guard = self.index.read().await;
        StoreStatistics {
            total_documents: guard.as_ref().map_or(0, VectorIndex::len),
            embedding_dimension: self.embedding_manager.dimension(),
            model_info: self.embedding_manager.model_info(),
            store_path: self.store_path.clone(),
        }
    }

    /// Whether a persisted store is present at the configured path.
    pub fn exists(&self) -> bool {
        self.store_path.join(MANIFEST_FILE).is_file()
    }

    /// Drop the in-memory index. Persisted state is untouched.
    pub async fn clear(&self) {
        *self.index.write().await = None;
        info!("cleared vector store");
    }

    /// Number of entries currently indexed.
    pub async fn get_document_count(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, VectorIndex::len)
    }
}
