//! Mock speech backend for testing
//!
//! Records every call and emits backend events on demand, so playback can
//! be driven deterministically without an audio device.

use super::{EventSink, SpeechBackend, SpeechEvent, SpeechSettings, Voice};

/// A call made against the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Speak(String),
    Pause,
    Resume,
    Stop,
    SetSettings(SpeechSettings),
    SetVoice(String),
}

/// A mock backend for testing playback sequencing
pub struct MockSpeechBackend {
    sink: EventSink,
    calls: Vec<BackendCall>,
    /// Number of upcoming `speak` calls to reject
    reject_count: usize,
    /// Emit Started/Progress/Finished as soon as an utterance is accepted
    auto_complete: bool,
    voices: Vec<Voice>,
    current_voice: String,
}

impl MockSpeechBackend {
    /// Create a backend that accepts everything and emits only what the test asks for.
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            calls: Vec::new(),
            reject_count: 0,
            auto_complete: false,
            voices: default_voices(),
            current_voice: "mock-en".to_string(),
        }
    }

    /// Create a backend that finishes every utterance immediately.
    pub fn auto_completing(sink: EventSink) -> Self {
        Self {
            auto_complete: true,
            ..Self::new(sink)
        }
    }

    /// Reject the next `n` calls to `speak`.
    pub fn reject_next(&mut self, n: usize) {
        self.reject_count = n;
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Speak(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn emit_started(&self) {
        self.sink.emit(SpeechEvent::Started);
    }

    pub fn emit_progress(&self, fraction: f32, word_index: usize, total_words: usize) {
        self.sink.emit(SpeechEvent::Progress {
            fraction,
            word_index,
            total_words,
        });
    }

    pub fn emit_finished(&self) {
        self.sink.emit(SpeechEvent::Finished);
    }
}

impl SpeechBackend for MockSpeechBackend {
    fn speak(&mut self, text: &str) -> bool {
        self.calls.push(BackendCall::Speak(text.to_string()));

        if self.reject_count > 0 {
            self.reject_count -= 1;
            return false;
        }

        if self.auto_complete {
            let total_words = text.split_whitespace().count();
            self.emit_started();
            self.emit_progress(1.0, total_words, total_words);
            self.emit_finished();
        }

        true
    }

    fn pause(&mut self) {
        self.calls.push(BackendCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.push(BackendCall::Resume);
    }

    fn stop(&mut self) {
        self.calls.push(BackendCall::Stop);
    }

    fn set_settings(&mut self, settings: &SpeechSettings) {
        self.calls.push(BackendCall::SetSettings(settings.clone()));
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn set_voice(&mut self, voice_id: &str) -> bool {
        self.calls.push(BackendCall::SetVoice(voice_id.to_string()));
        if self.voices.iter().any(|v| v.id == voice_id) {
            self.current_voice = voice_id.to_string();
            true
        } else {
            false
        }
    }

    fn current_voice(&self) -> Option<Voice> {
        self.voices
            .iter()
            .find(|v| v.id == self.current_voice)
            .cloned()
    }

    fn name(&self) -> &'static str {
        if self.auto_complete { "silent" } else { "mock" }
    }
}

fn default_voices() -> Vec<Voice> {
    vec![
        Voice {
            id: "mock-en".to_string(),
            name: "Mock English".to_string(),
            language: "en".to_string(),
            is_default: true,
        },
        Voice {
            id: "mock-fr".to_string(),
            name: "Mock French".to_string(),
            language: "fr".to_string(),
            is_default: false,
        },
    ]
}
