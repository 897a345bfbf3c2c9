//! Text processing for speech: normalization and word-bounded chunking.

pub mod chunker;
pub mod normalizer;

use serde::{Deserialize, Serialize};

pub use chunker::{DEFAULT_CHUNK_WORDS, chunk};
pub use normalizer::normalize;

/// A word-bounded slice of normalized text, spoken as one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Words separated by single spaces
    pub text: String,
    /// Number of whitespace-delimited words in `text`
    pub word_count: usize,
}

impl TextChunk {
    /// Create a chunk from text, counting its words.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = word_count(&text);
        Self { text, word_count }
    }
}

impl From<String> for TextChunk {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for TextChunk {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Count whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
