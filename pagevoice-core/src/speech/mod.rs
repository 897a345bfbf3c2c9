//! Speech backend trait, settings, voices and the backend event channel.

mod espeak;
pub mod mock;

pub use espeak::EspeakBackend;
pub use mock::{BackendCall, MockSpeechBackend};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::error::{PagevoiceError, Result};

/// Speech parameters as normalized fractions.
///
/// Backends map these onto their native ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Speaking rate (0.0-1.0, default 0.5)
    pub rate: f32,
    /// Pitch multiplier (0.0-2.0, default 1.0)
    pub pitch: f32,
    /// Volume (0.0-1.0, default 1.0)
    pub volume: f32,
    /// Backend-owned voice identifier, `None` for the backend default
    pub voice_id: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 0.5,
            pitch: 1.0,
            volume: 1.0,
            voice_id: None,
        }
    }
}

impl SpeechSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch.clamp(0.0, 2.0);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }
}

/// A voice offered by a speech backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub language: String,
    pub is_default: bool,
}

/// Notification from a speech backend about the current utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeechEvent {
    /// The utterance started playing
    Started,
    /// Position within the utterance
    Progress {
        fraction: f32,
        word_index: usize,
        total_words: usize,
    },
    /// The utterance finished playing
    Finished,
}

/// Sending half of the backend event channel.
///
/// Cheap to clone; backends move clones into their worker threads.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SpeechEvent>,
}

impl EventSink {
    /// Deliver an event. Events sent after the receiver is gone are dropped.
    pub fn emit(&self, event: SpeechEvent) {
        let _ = self.tx.send(event);
    }
}

/// Receiving half of the backend event channel, owned by the controller.
pub type EventReceiver = mpsc::UnboundedReceiver<SpeechEvent>;

/// Create a backend event channel.
pub fn event_channel() -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

/// Trait for speech synthesis backends
///
/// `speak` returns as soon as the utterance is accepted. An accepted
/// utterance later produces, through the backend's [`EventSink`], at most one
/// `Started`, any number of `Progress` events with non-decreasing positions,
/// and exactly one `Finished`. After `stop` returns, the stopped utterance
/// produces no further events.
pub trait SpeechBackend: Send {
    /// Start speaking `text`. Returns whether the utterance was accepted.
    fn speak(&mut self, text: &str) -> bool;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    fn set_settings(&mut self, settings: &SpeechSettings);

    /// Voices this backend can speak with
    fn voices(&self) -> Vec<Voice>;

    /// Select a voice by id. Returns whether the voice exists.
    fn set_voice(&mut self, voice_id: &str) -> bool;

    fn current_voice(&self) -> Option<Voice>;

    /// Prepare the backend for use.
    fn initialize(&mut self) -> bool {
        true
    }

    /// Release backend resources.
    fn cleanup(&mut self) {}

    /// Backend name for display
    fn name(&self) -> &'static str;
}

impl<T: SpeechBackend + ?Sized> SpeechBackend for Box<T> {
    fn speak(&mut self, text: &str) -> bool {
        (**self).speak(text)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn set_settings(&mut self, settings: &SpeechSettings) {
        (**self).set_settings(settings)
    }

    fn voices(&self) -> Vec<Voice> {
        (**self).voices()
    }

    fn set_voice(&mut self, voice_id: &str) -> bool {
        (**self).set_voice(voice_id)
    }

    fn current_voice(&self) -> Option<Voice> {
        (**self).current_voice()
    }

    fn initialize(&mut self) -> bool {
        (**self).initialize()
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Supported speech backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechBackendKind {
    #[default]
    Espeak,
    /// Completes every utterance immediately without producing audio
    Silent,
}

impl FromStr for SpeechBackendKind {
    type Err = PagevoiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "espeak" | "espeak-ng" => Ok(Self::Espeak),
            "silent" | "mock" | "none" => Ok(Self::Silent),
            _ => Err(PagevoiceError::Config(format!("Unknown speech backend: {}", s))),
        }
    }
}

/// Create a speech backend that reports through `sink`.
pub fn create_speech_backend(
    kind: SpeechBackendKind,
    sink: EventSink,
) -> Result<Box<dyn SpeechBackend>> {
    match kind {
        SpeechBackendKind::Espeak => Ok(Box::new(EspeakBackend::new(sink)?)),
        SpeechBackendKind::Silent => Ok(Box::new(MockSpeechBackend::auto_completing(sink))),
    }
}
