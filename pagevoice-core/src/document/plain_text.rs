//! Plain text documents whose pages are separated by form feeds.

use log::debug;
use std::fs;
use std::path::Path;

use super::{DocumentBackend, join_pages, split_pages};
use crate::error::Result;

/// Document backend over UTF-8 text files.
///
/// Each form feed starts a new page, which is the layout `pdftotext`
/// produces. A file without form feeds is a single page.
#[derive(Debug, Default, Clone)]
pub struct PlainTextBackend;

impl PlainTextBackend {
    pub fn new() -> Self {
        Self
    }

    fn read(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl DocumentBackend for PlainTextBackend {
    fn page_count(&self, path: &Path) -> Result<usize> {
        let content = self.read(path)?;
        Ok(split_pages(&content).len())
    }

    fn extract_pages(&self, path: &Path, start: usize, end: usize) -> Result<String> {
        let content = self.read(path)?;
        let pages = split_pages(&content);
        debug!(
            "{}: extracting pages {}-{} of {}",
            path.display(),
            start,
            end,
            pages.len()
        );

        let selected = pages
            .iter()
            .enumerate()
            .map(|(i, text)| (i + 1, *text))
            .filter(|(number, _)| *number >= start && *number <= end);

        Ok(join_pages(selected))
    }

    fn name(&self) -> &'static str {
        "plain text"
    }
}
