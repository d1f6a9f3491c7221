//! Document loading from a filesystem corpus.
//!
//! [`DocumentLoader`] walks a directory tree and turns supported files into
//! uniform [`Document`] records: PDF pages are concatenated with page-boundary
//! markers, DOCX paragraphs are concatenated with newlines, plain text is
//! read verbatim. One bad file never aborts the batch.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::document::{CorpusStatistics, Document, DocumentMetadata, SourceType};
use crate::error::{RagError, Result};

/// Loads documents of supported formats from a directory tree.
pub struct DocumentLoader {
    supported_formats: Vec<String>,
    max_file_size_bytes: u64,
}

impl DocumentLoader {
    /// Create a loader from the configured format list and size cap.
    pub fn new(config: &RagConfig) -> Self {
        Self {
            supported_formats: config
                .supported_formats
                .iter()
                .map(|format| format.to_ascii_lowercase())
                .collect(),
            max_file_size_bytes: config.max_file_size_mb * 1024 * 1024,
        }
    }

    /// Load all supported documents under `directory`, recursively.
    ///
    /// Files that are unsupported, oversized, or fail to parse are skipped
    /// with a log entry; the rest of the batch continues. Results are in
    /// sorted path order. A missing directory yields an empty batch.
    pub fn load_documents_from_directory(&self, directory: &Path) -> Vec<Document> {
        if !directory.is_dir() {
            warn!(directory = %directory.display(), "document directory does not exist");
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(directory)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            if !self.is_supported_format(&path) {
                warn!(path = %path.display(), "skipping unsupported format");
                continue;
            }
            match self.load_document(&path) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to load document");
                }
            }
        }

        info!(count = documents.len(), directory = %directory.display(), "loaded documents");
        documents
    }

    /// Load a single document.
    ///
    /// Returns `Ok(None)` for oversized, unsupported, or empty files (logged,
    /// not an error); `Err` when reading or parsing fails.
    pub fn load_document(&self, path: &Path) -> Result<Option<Document>> {
        let size = fs::metadata(path)
            .map_err(|e| document_error(path, format!("cannot stat file: {e}")))?
            .len();
        if size > self.max_file_size_bytes {
            warn!(
                path = %path.display(),
                size_mb = size as f64 / (1024.0 * 1024.0),
                "file too large, skipping"
            );
            return Ok(None);
        }

        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase())
            .unwrap_or_default();
        let Some(source_type) = SourceType::from_extension(&extension) else {
            warn!(path = %path.display(), extension = %extension, "unsupported file format");
            return Ok(None);
        };

        let document = match source_type {
            SourceType::Pdf => self.load_pdf(path)?,
            SourceType::Docx => self.load_docx(path)?,
            SourceType::Text => self.load_txt(path)?,
        };

        if document.content.is_empty() {
            debug!(path = %path.display(), "document has no extractable text");
            return Ok(None);
        }
        Ok(Some(document))
    }

    /// Summarize a loaded corpus.
    pub fn corpus_statistics(&self, documents: &[Document]) -> CorpusStatistics {
        let total_content_length: usize =
            documents.iter().map(|document| document.content.len()).sum();
        let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            *file_types.entry(document.source_type.as_str().to_string()).or_default() += 1;
        }
        let average_content_length = if documents.is_empty() {
            0.0
        } else {
            total_content_length as f64 / documents.len() as f64
        };

        CorpusStatistics {
            total_documents: documents.len(),
            total_content_length,
            file_types,
            average_content_length,
        }
    }

    fn is_supported_format(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                let extension = extension.to_ascii_lowercase();
                self.supported_formats.iter().any(|supported| *supported == extension)
            })
    }

    /// Load a page-oriented PDF, joining non-empty pages with page markers.
    fn load_pdf(&self, path: &Path) -> Result<Document> {
        let pdf = lopdf::Document::load(path)
            .map_err(|e| document_error(path, format!("cannot parse PDF: {e}")))?;
        let pages = pdf.get_pages();
        let num_pages = pages.len();

        let mut content = String::new();
        for &page_number in pages.keys() {
            let page_text = match pdf.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), page = page_number, error = %e, "failed to extract page text");
                    continue;
                }
            };
            if !page_text.trim().is_empty() {
                content.push_str(&format!("\n--- Page {page_number} ---\n{page_text}\n"));
            }
        }

        Ok(self.build_document(
            path,
            SourceType::Pdf,
            content,
            DocumentMetadata {
                title: title_of(path),
                num_pages: Some(num_pages),
                num_paragraphs: None,
            },
        ))
    }

    /// Load a paragraph-oriented DOCX, joining non-empty paragraphs with
    /// newlines. DOCX is a zip archive; the text lives in
    /// `word/document.xml`.
    fn load_docx(&self, path: &Path) -> Result<Document> {
        let file = fs::File::open(path)
            .map_err(|e| document_error(path, format!("cannot open file: {e}")))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| document_error(path, format!("cannot open DOCX archive: {e}")))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| document_error(path, format!("missing document body: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| document_error(path, format!("cannot read document body: {e}")))?;

        let (content, num_paragraphs) = extract_docx_paragraphs(&xml)
            .map_err(|message| document_error(path, message))?;

        Ok(self.build_document(
            path,
            SourceType::Docx,
            content,
            DocumentMetadata {
                title: title_of(path),
                num_pages: None,
                num_paragraphs: Some(num_paragraphs),
            },
        ))
    }

    /// Load a plain-text file verbatim.
    fn load_txt(&self, path: &Path) -> Result<Document> {
        let content = fs::read_to_string(path)
            .map_err(|e| document_error(path, format!("cannot read file: {e}")))?;

        Ok(self.build_document(
            path,
            SourceType::Text,
            content,
            DocumentMetadata { title: title_of(path), num_pages: None, num_paragraphs: None },
        ))
    }

    fn build_document(
        &self,
        path: &Path,
        source_type: SourceType,
        content: String,
        metadata: DocumentMetadata,
    ) -> Document {
        Document {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_type,
            content: content.trim().to_string(),
            metadata,
        }
    }
}

fn document_error(path: &Path, message: String) -> RagError {
    RagError::DocumentError { path: path.display().to_string(), message }
}

fn title_of(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Pull paragraph text out of a DOCX `word/document.xml` body.
///
/// Returns the newline-joined non-empty paragraphs and the total paragraph
/// count (including empty ones).
fn extract_docx_paragraphs(xml: &str) -> std::result::Result<(String, usize), String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut total_paragraphs = 0usize;
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.name().as_ref() {
                b"w:p" => {
                    total_paragraphs += 1;
                    current.clear();
                }
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(current.trim().to_string());
                    }
                }
                b"w:t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run => {
                let unescaped =
                    text.unescape().map_err(|e| format!("malformed document XML: {e}"))?;
                current.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed document XML: {e}")),
        }
    }

    Ok((paragraphs.join("\n"), total_paragraphs))
}
