//! Recursive boundary-seeking text chunking.
//!
//! [`TextChunker`] splits document text into overlapping chunks bounded by
//! `chunk_size`. Splitting tries semantic boundaries in order — paragraph
//! breaks, line breaks, sentence enders, spaces — and falls back to hard
//! character windows, which is what guarantees the size bound. Consecutive
//! chunks share up to `chunk_overlap` characters; the overlap is exact in
//! boundary-free regions and approximate across semantic-boundary
//! transitions.

use std::collections::{BTreeSet, VecDeque};

use tracing::info;

use crate::config::RagConfig;
use crate::document::{Chunk, ChunkMetadata, ChunkStatistics, Document, DocumentMetadata};

/// Boundary strategies tried in order before the character fallback.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits document text into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker from the configured `chunk_size` / `chunk_overlap`.
    pub fn new(config: &RagConfig) -> Self {
        Self::with_limits(config.chunk_size, config.chunk_overlap)
    }

    /// Create a chunker with explicit limits. `chunk_overlap` must be less
    /// than `chunk_size`.
    pub fn with_limits(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Split raw text into chunk strings without attaching metadata.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only input. Every
    /// returned string is at most `chunk_size` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let pieces = split_recursive(text, self.chunk_size, self.chunk_overlap, SEPARATORS);
        merge_pieces(pieces, self.chunk_size, self.chunk_overlap)
    }

    /// Split a document into chunks with inherited metadata.
    ///
    /// Empty or whitespace-only chunks are dropped, `chunk_index` is
    /// reassigned densely after dropping, and `total_chunks` reflects the
    /// final count.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let pieces = self.split_text(&document.content);
        let kept: Vec<&str> =
            pieces.iter().map(|piece| piece.trim()).filter(|piece| !piece.is_empty()).collect();
        let total = kept.len();

        kept.into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                id: format!("{}_chunk_{index}", document.file_name),
                content: content.to_string(),
                metadata: ChunkMetadata {
                    source_file: Some(document.file_name.clone()),
                    file_path: Some(document.file_path.display().to_string()),
                    source_type: Some(document.source_type),
                    chunk_index: index,
                    total_chunks: total,
                    title: Some(document.metadata.title.clone()),
                    num_pages: document.metadata.num_pages,
                    num_paragraphs: document.metadata.num_paragraphs,
                },
            })
            .collect()
    }

    /// Split a batch of documents into chunks.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.chunk_document(document));
        }
        info!(
            chunk_count = chunks.len(),
            document_count = documents.len(),
            "chunked document batch"
        );
        chunks
    }

    /// Split free text into chunks, optionally inheriting document metadata.
    ///
    /// Chunk ids take the `text_chunk_{ordinal}` form and carry no source
    /// file information.
    pub fn chunk_text(&self, text: &str, metadata: Option<&DocumentMetadata>) -> Vec<Chunk> {
        let pieces = self.split_text(text);
        let kept: Vec<&str> =
            pieces.iter().map(|piece| piece.trim()).filter(|piece| !piece.is_empty()).collect();
        let total = kept.len();

        kept.into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                id: format!("text_chunk_{index}"),
                content: content.to_string(),
                metadata: ChunkMetadata {
                    source_file: None,
                    file_path: None,
                    source_type: None,
                    chunk_index: index,
                    total_chunks: total,
                    title: metadata.map(|m| m.title.clone()),
                    num_pages: metadata.and_then(|m| m.num_pages),
                    num_paragraphs: metadata.and_then(|m| m.num_paragraphs),
                },
            })
            .collect()
    }

    /// Keep only chunks whose content length is within `[min_length, max_length]`.
    pub fn filter_chunks_by_length(
        &self,
        chunks: Vec<Chunk>,
        min_length: usize,
        max_length: Option<usize>,
    ) -> Vec<Chunk> {
        let before = chunks.len();
        let filtered: Vec<Chunk> = chunks
            .into_iter()
            .filter(|chunk| {
                let length = chunk.content.len();
                length >= min_length && max_length.is_none_or(|max| length <= max)
            })
            .collect();
        info!(before, after = filtered.len(), "filtered chunks by length");
        filtered
    }

    /// Merge chunks shorter than `min_length` into their successor from the
    /// same source document. Chunks are never merged across source
    /// boundaries.
    pub fn merge_small_chunks(&self, chunks: Vec<Chunk>, min_length: usize) -> Vec<Chunk> {
        let before = chunks.len();
        let mut iter = chunks.into_iter();
        let Some(mut current) = iter.next() else {
            return Vec::new();
        };

        let mut merged = Vec::new();
        for chunk in iter {
            if current.content.len() < min_length
                && chunk.metadata.source_file == current.metadata.source_file
            {
                current.content.push_str("\n\n");
                current.content.push_str(&chunk.content);
                current.metadata.total_chunks = chunk.metadata.total_chunks;
            } else {
                merged.push(current);
                current = chunk;
            }
        }
        merged.push(current);

        info!(before, after = merged.len(), "merged small chunks");
        merged
    }

    /// Summarize a chunk list.
    pub fn chunk_statistics(&self, chunks: &[Chunk]) -> ChunkStatistics {
        let total_content_length: usize = chunks.iter().map(|chunk| chunk.content.len()).sum();
        let sources: BTreeSet<&str> = chunks
            .iter()
            .filter_map(|chunk| chunk.metadata.source_file.as_deref())
            .collect();
        let average_chunk_length = if chunks.is_empty() {
            0.0
        } else {
            total_content_length as f64 / chunks.len() as f64
        };

        ChunkStatistics {
            total_chunks: chunks.len(),
            total_content_length,
            average_chunk_length,
            unique_source_files: sources.len(),
        }
    }
}

/// Split `text` into pieces no longer than `chunk_size`, trying each
/// separator in order and recursing into finer separators for oversized
/// segments. Separators stay attached to the preceding piece, so
/// concatenating the pieces reproduces the input.
fn split_recursive(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let segments = split_keeping_separator(text, separator);
    if segments.len() <= 1 {
        return split_recursive(text, chunk_size, chunk_overlap, remaining);
    }

    let mut pieces = Vec::new();
    for segment in segments {
        if segment.len() <= chunk_size {
            pieces.push(segment.to_string());
        } else {
            pieces.extend(split_recursive(segment, chunk_size, chunk_overlap, remaining));
        }
    }
    pieces
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    while let Some(position) = text[start..].find(separator) {
        let end = start + position + separator.len();
        segments.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// Hard character-window fallback: windows of `chunk_size` advancing by
/// `chunk_size - chunk_overlap`, snapped to char boundaries. This is the
/// splitter that enforces the size bound when no separator applies.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    // chunk_overlap < chunk_size is enforced at config build, so step >= 1.
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // chunk_size smaller than one character; take the whole char.
            end = (start + chunk_size).min(text.len());
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        let mut next = start + step;
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }
    chunks
}

/// Greedily merge pieces into chunks bounded by `chunk_size`, retaining a
/// tail of up to `chunk_overlap` characters of prior pieces at each chunk
/// boundary.
fn merge_pieces(pieces: Vec<String>, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();
    let mut window_len = 0usize;

    for piece in pieces {
        let piece_len = piece.len();
        if window_len + piece_len > chunk_size && !window.is_empty() {
            chunks.push(window.iter().map(String::as_str).collect());
            while window_len > chunk_overlap
                || (window_len + piece_len > chunk_size && window_len > 0)
            {
                match window.pop_front() {
                    Some(front) => window_len -= front.len(),
                    None => break,
                }
            }
        }
        window_len += piece_len;
        window.push_back(piece);
    }
    if !window.is_empty() {
        chunks.push(window.iter().map(String::as_str).collect());
    }
    chunks
}
