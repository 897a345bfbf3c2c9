//! PDF documents through the poppler command-line tools.
//!
//! Uses `pdfinfo` for the page count and `pdftotext` for extraction.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{DocumentBackend, join_pages, split_pages};
use crate::error::{PagevoiceError, Result};

/// Document backend that shells out to `pdfinfo` and `pdftotext`.
pub struct PdftotextBackend {
    pdfinfo: PathBuf,
    pdftotext: PathBuf,
}

impl PdftotextBackend {
    /// Locate the poppler tools in PATH.
    ///
    /// Returns an error if either tool is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self {
            pdfinfo: locate_tool("pdfinfo")?,
            pdftotext: locate_tool("pdftotext")?,
        })
    }

    /// Use tools at explicit paths.
    pub fn with_tools(pdfinfo: impl Into<PathBuf>, pdftotext: impl Into<PathBuf>) -> Self {
        Self {
            pdfinfo: pdfinfo.into(),
            pdftotext: pdftotext.into(),
        }
    }
}

impl DocumentBackend for PdftotextBackend {
    fn page_count(&self, path: &Path) -> Result<usize> {
        let output = Command::new(&self.pdfinfo).arg(path).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pdfinfo failed for {}: {}", path.display(), stderr.trim());
            return Ok(0);
        }

        Ok(parse_page_count(&String::from_utf8_lossy(&output.stdout)).unwrap_or(0))
    }

    fn extract_pages(&self, path: &Path, start: usize, end: usize) -> Result<String> {
        debug!("pdftotext -f {} -l {} {}", start, end, path.display());

        let output = Command::new(&self.pdftotext)
            .args(["-enc", "UTF-8", "-f", &start.to_string(), "-l", &end.to_string()])
            .arg(path)
            .arg("-")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pdftotext failed for {}: {}", path.display(), stderr.trim());
            return Ok(String::new());
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text)
            .into_iter()
            .enumerate()
            .map(|(i, page)| (start + i, page));

        Ok(join_pages(pages))
    }

    fn name(&self) -> &'static str {
        "pdftotext"
    }
}

fn locate_tool(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| {
        PagevoiceError::UnsupportedPlatform(format!(
            "{} not found. Install poppler-utils to read PDF files",
            tool
        ))
    })
}

/// Read the `Pages:` line of `pdfinfo` output.
fn parse_page_count(info: &str) -> Option<usize> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Paper\nProducer:       pdfTeX\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: nothing\n"), None);
        assert_eq!(parse_page_count("Pages: many\n"), None);
    }

    #[test]
    fn test_missing_tool_reports_error() {
        let backend = PdftotextBackend::with_tools(
            "/nonexistent/pdfinfo",
            "/nonexistent/pdftotext",
        );
        assert!(backend.page_count(Path::new("doc.pdf")).is_err());
    }

    #[test]
    fn test_uninstalled_tool_is_unsupported() {
        let err = locate_tool("pagevoice-no-such-pdftool").unwrap_err();
        match err {
            PagevoiceError::UnsupportedPlatform(msg) => {
                assert!(msg.contains("pagevoice-no-such-pdftool"));
                assert!(msg.contains("poppler-utils"));
            }
            other => panic!("expected UnsupportedPlatform, got {:?}", other),
        }
    }
}
