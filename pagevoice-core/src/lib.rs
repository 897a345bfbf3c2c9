//! Document-to-speech library for the pagevoice workspace
//!
//! Provides:
//! - Page-range text extraction from PDF and plain-text documents
//! - Speech normalization of math notation and whitespace
//! - Word-bounded chunking of long texts
//! - A playback controller that sequences chunks through a speech backend

pub mod document;
pub mod error;
pub mod extract;
pub mod playback;
pub mod speech;
pub mod text;

pub use document::{DocumentBackend, DocumentBackendKind, create_document_backend};
pub use error::{PagevoiceError, Result};
pub use extract::{ExtractionResult, Extractor, PageRange};
pub use playback::{PlaybackController, SpeechState};
pub use speech::{
    EventReceiver, EventSink, SpeechBackend, SpeechBackendKind, SpeechEvent, SpeechSettings, Voice,
    create_speech_backend, event_channel,
};
pub use text::{TextChunk, chunk, normalize};
