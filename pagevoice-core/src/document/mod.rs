//! Document backends: page counting and page-range text extraction.

mod pdftotext;
mod plain_text;

pub use pdftotext::PdftotextBackend;
pub use plain_text::PlainTextBackend;

use std::path::Path;
use std::str::FromStr;

use crate::error::{PagevoiceError, Result};

/// Page separator used by `pdftotext` and plain text page dumps.
pub const FORM_FEED: char = '\u{c}';

/// Trait for document backends
pub trait DocumentBackend: Send + Sync {
    /// Number of pages in the document. `0` means unknown or invalid.
    fn page_count(&self, path: &Path) -> Result<usize>;

    /// Text of pages `start..=end` (1-based), each preceded by a page marker.
    ///
    /// An empty string means nothing could be extracted.
    fn extract_pages(&self, path: &Path, start: usize, end: usize) -> Result<String>;

    /// Backend name for display
    fn name(&self) -> &'static str;
}

impl<T: DocumentBackend + ?Sized> DocumentBackend for Box<T> {
    fn page_count(&self, path: &Path) -> Result<usize> {
        (**self).page_count(path)
    }

    fn extract_pages(&self, path: &Path, start: usize, end: usize) -> Result<String> {
        (**self).extract_pages(path, start, end)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Supported document backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentBackendKind {
    /// Pick by file extension
    #[default]
    Auto,
    PlainText,
    Pdftotext,
}

impl FromStr for DocumentBackendKind {
    type Err = PagevoiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "text" | "plain" | "plain-text" | "txt" => Ok(Self::PlainText),
            "pdftotext" | "poppler" | "pdf" => Ok(Self::Pdftotext),
            _ => Err(PagevoiceError::Config(format!(
                "Unknown document backend: {}",
                s
            ))),
        }
    }
}

impl DocumentBackendKind {
    /// Resolve `Auto` against a document path.
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Auto => {
                let is_pdf = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
                if is_pdf {
                    Self::Pdftotext
                } else {
                    Self::PlainText
                }
            }
            other => other,
        }
    }
}

/// Create a document backend for the given document.
pub fn create_document_backend(
    kind: DocumentBackendKind,
    path: &Path,
) -> Result<Box<dyn DocumentBackend>> {
    match kind.resolve(path) {
        DocumentBackendKind::PlainText => Ok(Box::new(PlainTextBackend::new())),
        DocumentBackendKind::Pdftotext => Ok(Box::new(PdftotextBackend::new()?)),
        DocumentBackendKind::Auto => unreachable!("resolve never returns Auto"),
    }
}

/// Join page texts with `--- Page N ---` markers.
///
/// Pages without any text are left out entirely.
pub fn join_pages<'a>(pages: impl IntoIterator<Item = (usize, &'a str)>) -> String {
    let mut full_text = String::new();

    for (number, text) in pages {
        if text.trim().is_empty() {
            continue;
        }
        full_text.push_str(&format!("--- Page {} ---\n", number));
        full_text.push_str(text);
        full_text.push_str("\n\n");
    }

    full_text
}

/// Split form-feed separated output into pages.
///
/// A single trailing form feed (as `pdftotext` emits after the last page)
/// does not start an extra page.
pub fn split_pages(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = text.strip_suffix(FORM_FEED).unwrap_or(text);
    text.split(FORM_FEED).collect()
}
