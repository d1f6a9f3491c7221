//! Data types for documents, chunks, and retrieval results.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The format family of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Page-oriented documents (PDF).
    Pdf,
    /// Paragraph-oriented documents (DOCX).
    Docx,
    /// Plain text.
    Text,
}

impl SourceType {
    /// Map a lowercase file extension to a source type.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    /// The canonical name used in statistics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "text",
        }
    }
}

/// Metadata captured when a source document is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document title, derived from the file stem.
    pub title: String,
    /// Page count for page-oriented formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<usize>,
    /// Paragraph count for paragraph-oriented formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_paragraphs: Option<usize>,
}

/// A loaded source document.
///
/// Immutable once created; owned by the ingestion pipeline and discarded
/// after chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full path of the source file.
    pub file_path: PathBuf,
    /// File name of the source file.
    pub file_name: String,
    /// Format family of the source file.
    pub source_type: SourceType,
    /// Extracted text content, trimmed of leading/trailing whitespace.
    pub content: String,
    /// Document-level metadata.
    pub metadata: DocumentMetadata,
}

/// Metadata attached to every chunk.
///
/// The `Option` fields are absent for chunks produced from free text via
/// [`TextChunker::chunk_text`](crate::chunking::TextChunker::chunk_text),
/// which has no backing file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Full path of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Format family of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Position of this chunk within its source, contiguous from 0.
    pub chunk_index: usize,
    /// Final number of chunks produced from the same source.
    pub total_chunks: usize,
    /// Title inherited from the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page count inherited from page-oriented sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<usize>,
    /// Paragraph count inherited from paragraph-oriented sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_paragraphs: Option<usize>,
}

/// A bounded-length slice of a source document's text, the atomic unit of
/// indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier, `{source}_chunk_{ordinal}`.
    pub id: String,
    /// Non-empty trimmed text content.
    pub content: String,
    /// Chunk-level metadata.
    pub metadata: ChunkMetadata,
}

/// A raw vector-store hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The stored chunk text.
    pub content: String,
    /// The stored chunk metadata.
    pub metadata: ChunkMetadata,
    /// Cosine similarity to the query, higher is more relevant.
    pub similarity_score: f32,
}

/// A retrieval hit reshaped for the prompt layer.
///
/// Constructed fresh per query; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The retrieved chunk text.
    pub content: String,
    /// The retrieved chunk metadata.
    pub metadata: ChunkMetadata,
    /// Cosine similarity to the query, higher is more relevant.
    pub score: f32,
    /// Source file name, or `"unknown"` for chunks without one.
    pub source: String,
}

/// Identity of the embedding model behind a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Embedding model identifier.
    pub model_name: String,
    /// Dimensionality of the vectors the model produces.
    pub embedding_dimension: usize,
}

/// Statistics over a loaded document corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    /// Number of loaded documents.
    pub total_documents: usize,
    /// Sum of content lengths across documents.
    pub total_content_length: usize,
    /// Document counts per source type.
    pub file_types: BTreeMap<String, usize>,
    /// Mean content length, 0.0 for an empty corpus.
    pub average_content_length: f64,
}

/// Statistics over a chunk list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkStatistics {
    /// Number of chunks.
    pub total_chunks: usize,
    /// Sum of content lengths across chunks.
    pub total_content_length: usize,
    /// Mean chunk length, 0.0 for an empty list.
    pub average_chunk_length: f64,
    /// Number of distinct source files represented.
    pub unique_source_files: usize,
}

/// Statistics describing a vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStatistics {
    /// Number of indexed entries.
    pub total_documents: usize,
    /// Dimensionality of stored vectors.
    pub embedding_dimension: usize,
    /// The embedding model behind the store.
    pub model_info: ModelInfo,
    /// Directory the store persists to.
    pub store_path: PathBuf,
}

/// Statistics describing one retrieval run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStatistics {
    /// Number of results returned.
    pub total_results: usize,
    /// Mean score, 0.0 when there are no results.
    pub average_score: f32,
    /// Minimum and maximum score, (0.0, 0.0) when there are no results.
    pub score_range: (f32, f32),
    /// Distinct source names, in first-seen order.
    pub sources: Vec<String>,
    /// Number of distinct source names.
    pub unique_sources: usize,
}
