//! Extraction orchestration: page range validation, backend extraction,
//! normalization and chunking.

use log::{debug, warn};
use serde::Serialize;
use std::path::Path;

use crate::document::DocumentBackend;
use crate::error::{PagevoiceError, Result};
use crate::text::{self, DEFAULT_CHUNK_WORDS, TextChunk};

/// A 1-based inclusive page range within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start_page: usize,
    pub end_page: usize,
    pub total_pages: usize,
}

impl PageRange {
    pub fn new(start_page: usize, end_page: usize, total_pages: usize) -> Self {
        Self {
            start_page,
            end_page,
            total_pages,
        }
    }

    /// Number of pages covered by the range.
    pub fn len(&self) -> usize {
        if self.end_page < self.start_page {
            0
        } else {
            self.end_page - self.start_page + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of an extraction request.
///
/// Callers must check `success` before reading `full_text` or `chunks`:
/// on failure those are empty and `error_message` explains why.
///
/// `chunks` holds the words of `full_text` in order, each chunk's words
/// joined by single spaces. Single newlines in `full_text` (after page
/// markers) do not survive chunking, so joining the chunk texts matches
/// `full_text` word for word but not byte for byte.
#[derive(Debug, Default, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub error_message: String,
    pub full_text: String,
    pub chunks: Vec<TextChunk>,
    pub page_range: PageRange,
    pub is_chunked: bool,
    #[serde(skip)]
    error: Option<PagevoiceError>,
}

impl ExtractionResult {
    /// Build a failed result from an error.
    pub fn failure(error: PagevoiceError) -> Self {
        Self {
            error_message: error.to_string(),
            error: Some(error),
            ..Self::default()
        }
    }

    /// The typed error of a failed result.
    pub fn error(&self) -> Option<&PagevoiceError> {
        self.error.as_ref()
    }

    /// Total words across all chunks.
    pub fn word_count(&self) -> usize {
        self.chunks.iter().map(|c| c.word_count).sum()
    }

    /// Chunk texts, in playback order.
    pub fn chunk_texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }
}

impl From<Result<ExtractionResult>> for ExtractionResult {
    fn from(result: Result<ExtractionResult>) -> Self {
        result.unwrap_or_else(Self::failure)
    }
}

/// Turns document pages into normalized, chunked text.
pub struct Extractor<D> {
    backend: D,
    chunk_threshold: usize,
}

impl<D: DocumentBackend> Extractor<D> {
    /// Create an extractor with the default chunk threshold.
    pub fn new(backend: D) -> Self {
        Self {
            backend,
            chunk_threshold: DEFAULT_CHUNK_WORDS,
        }
    }

    /// Set the word count above which text is chunked (also the chunk size).
    pub fn with_chunk_threshold(mut self, words: usize) -> Self {
        self.chunk_threshold = words.max(1);
        self
    }

    pub fn chunk_threshold(&self) -> usize {
        self.chunk_threshold
    }

    pub fn backend(&self) -> &D {
        &self.backend
    }

    /// Extract every page of a document.
    pub fn extract_all(&self, path: &Path) -> ExtractionResult {
        self.try_extract_all(path).into()
    }

    /// Extract pages `start..=end`, clamped to the document.
    pub fn extract_range(&self, path: &Path, start: usize, end: usize) -> ExtractionResult {
        self.try_extract_range(path, start, end).into()
    }

    /// Like [`Extractor::extract_all`], returning the error instead of a failed result.
    pub fn try_extract_all(&self, path: &Path) -> Result<ExtractionResult> {
        if !path.exists() {
            return Err(PagevoiceError::InvalidDocument(format!(
                "File does not exist or cannot be opened: {}",
                path.display()
            )));
        }

        let total = self.page_count(path)?;
        self.try_extract_range(path, 1, total)
    }

    /// Like [`Extractor::extract_range`], returning the error instead of a failed result.
    pub fn try_extract_range(
        &self,
        path: &Path,
        start: usize,
        end: usize,
    ) -> Result<ExtractionResult> {
        let total = self.page_count(path)?;

        let start = start.max(1);
        let end = end.min(total);
        if start > end {
            return Err(PagevoiceError::InvalidRange { start, end, total });
        }

        let raw = match self.backend.extract_pages(path, start, end) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "{} extraction failed for {}: {}",
                    self.backend.name(),
                    path.display(),
                    e
                );
                String::new()
            }
        };

        let full_text = text::normalize(&raw);
        if full_text.is_empty() {
            return Err(PagevoiceError::EmptyExtraction { start, end });
        }

        let word_count = text::word_count(&full_text);
        let is_chunked = word_count > self.chunk_threshold;
        let chunks = if is_chunked {
            text::chunk(&full_text, self.chunk_threshold)
        } else {
            vec![TextChunk {
                text: full_text.clone(),
                word_count,
            }]
        };

        debug!(
            "Extracted pages {}-{} of {}: {} words in {} chunk(s)",
            start,
            end,
            total,
            word_count,
            chunks.len()
        );

        Ok(ExtractionResult {
            success: true,
            error_message: String::new(),
            full_text,
            chunks,
            page_range: PageRange::new(start, end, total),
            is_chunked,
            error: None,
        })
    }

    fn page_count(&self, path: &Path) -> Result<usize> {
        let count = self.backend.page_count(path).map_err(|e| {
            PagevoiceError::InvalidDocument(format!("Could not determine page count: {}", e))
        })?;

        if count == 0 {
            return Err(PagevoiceError::InvalidDocument(
                "Could not determine page count or document is invalid".to_string(),
            ));
        }

        Ok(count)
    }
}
