use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagevoiceError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid page range: {start}-{end} (document has {total} pages)")]
    InvalidRange {
        start: usize,
        end: usize,
        total: usize,
    },

    #[error("No text could be extracted from pages {start}-{end}")]
    EmptyExtraction { start: usize, end: usize },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PagevoiceError>;
