//! Playback controller.
//!
//! [`PlaybackController`] owns one speech backend and the receiving end of
//! its event channel. Control calls and backend events both go through the
//! transition table in [`machine`]; the controller only performs the
//! resulting actions and fires the registered callbacks.

pub mod machine;

pub use machine::SpeechState;

use log::{debug, info, warn};
use std::collections::VecDeque;

use crate::speech::{EventReceiver, SpeechBackend, SpeechEvent, SpeechSettings, Voice};
use crate::text::{TextChunk, normalize};
use machine::{Action, Input, Machine, Notification};

type Callback = Box<dyn FnMut() + Send>;
type ProgressCallback = Box<dyn FnMut(f32, usize, usize) + Send>;

/// Registered observers. Each slot holds at most one callback.
#[derive(Default)]
struct Callbacks {
    started: Option<Callback>,
    finished: Option<Callback>,
    paused: Option<Callback>,
    resumed: Option<Callback>,
    progress: Option<ProgressCallback>,
}

impl Callbacks {
    fn fire(&mut self, notification: Notification) {
        match notification {
            Notification::Started => call(&mut self.started),
            Notification::Finished => call(&mut self.finished),
            Notification::Paused => call(&mut self.paused),
            Notification::Resumed => call(&mut self.resumed),
            Notification::Progress {
                fraction,
                word_index,
                total_words,
            } => {
                if let Some(cb) = self.progress.as_mut() {
                    cb(fraction, word_index, total_words);
                }
            }
        }
    }
}

fn call(slot: &mut Option<Callback>) {
    if let Some(cb) = slot.as_mut() {
        cb();
    }
}

/// Speaks text and chunk sequences through a [`SpeechBackend`].
///
/// Backend events are applied when the owner pumps them with
/// [`pump`](Self::pump), [`next_event`](Self::next_event) or
/// [`run_until_stopped`](Self::run_until_stopped), so every callback runs
/// on the owner's task.
pub struct PlaybackController<B: SpeechBackend> {
    backend: B,
    events: EventReceiver,
    machine: Machine,
    settings: SpeechSettings,
    callbacks: Callbacks,
}

impl<B: SpeechBackend> PlaybackController<B> {
    /// Create a controller for a backend built around `events`' sink.
    pub fn new(backend: B, events: EventReceiver) -> Self {
        Self {
            backend,
            events,
            machine: Machine::default(),
            settings: SpeechSettings::default(),
            callbacks: Callbacks::default(),
        }
    }

    pub fn initialize(&mut self) -> bool {
        self.backend.initialize()
    }

    /// Stop playback and release backend resources.
    pub fn cleanup(&mut self) {
        self.stop();
        self.backend.cleanup();
    }

    /// Speak one piece of text.
    ///
    /// The text is normalized first. Returns false if nothing is left to
    /// speak or the backend rejects it.
    pub fn speak(&mut self, text: &str) -> bool {
        let text = normalize(text);
        if text.is_empty() {
            debug!("Nothing to speak after normalization");
            return false;
        }
        self.apply(Input::Begin {
            chunks: vec![TextChunk::new(text)],
            start: 0,
        }) == Some(true)
    }

    /// Speak `chunks` in order, starting at `start_chunk`.
    ///
    /// Chunks are normalized like [`speak`](Self::speak) text; chunks with
    /// nothing left to speak are skipped. Returns false if `chunks` is
    /// empty, `start_chunk` is out of bounds, no chunk from `start_chunk`
    /// on has text, or the backend rejects the first chunk. The finished
    /// callback fires once, after the last chunk.
    pub fn speak_chunked(&mut self, chunks: Vec<TextChunk>, start_chunk: usize) -> bool {
        if start_chunk >= chunks.len() {
            warn!(
                "Cannot start at chunk {} of {}",
                start_chunk + 1,
                chunks.len()
            );
            return false;
        }

        let given = chunks.len();
        let mut start = 0;
        let mut speakable = Vec::with_capacity(given);
        for (index, chunk) in chunks.into_iter().enumerate() {
            let text = normalize(&chunk.text);
            if text.is_empty() {
                debug!("Skipping chunk {} with nothing to speak", index + 1);
                continue;
            }
            if index < start_chunk {
                start += 1;
            }
            speakable.push(TextChunk::new(text));
        }

        if start >= speakable.len() {
            warn!(
                "Nothing to speak from chunk {} of {}",
                start_chunk + 1,
                given
            );
            return false;
        }

        info!(
            "Speaking {} chunks starting at chunk {}",
            speakable.len(),
            start + 1
        );
        self.apply(Input::Begin {
            chunks: speakable,
            start,
        }) == Some(true)
    }

    pub fn pause(&mut self) {
        self.apply(Input::Pause);
    }

    pub fn resume(&mut self) {
        self.apply(Input::Resume);
    }

    /// Stop playback and end the session. Fires no callback.
    pub fn stop(&mut self) {
        self.apply(Input::Stop);
    }

    /// Apply one backend event.
    pub fn dispatch(&mut self, event: SpeechEvent) {
        let input = match event {
            SpeechEvent::Started => Input::Started,
            SpeechEvent::Progress {
                fraction,
                word_index,
                total_words,
            } => Input::Progress {
                fraction,
                word_index,
                total_words,
            },
            SpeechEvent::Finished => Input::Finished,
        };
        self.apply(input);
    }

    /// Apply every event already waiting in the channel. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next backend event and apply it.
    ///
    /// Returns false once the backend side of the channel is gone.
    /// Cancel-safe: an event is either fully applied or left in the channel.
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Apply backend events until playback stops.
    pub async fn run_until_stopped(&mut self) {
        while self.state() != SpeechState::Stopped {
            if !self.next_event().await {
                warn!("Speech backend went away during playback");
                self.stop();
                break;
            }
        }
    }

    pub fn state(&self) -> SpeechState {
        self.machine.state()
    }

    pub fn is_speaking(&self) -> bool {
        self.state() == SpeechState::Speaking
    }

    pub fn is_paused(&self) -> bool {
        self.state() == SpeechState::Paused
    }

    /// Progress within the current chunk, as last reported by the backend.
    pub fn progress(&self) -> f32 {
        self.machine.progress()
    }

    /// Progress across all chunks of the session.
    pub fn overall_progress(&self) -> f32 {
        self.machine.overall_progress()
    }

    pub fn current_word_index(&self) -> usize {
        self.machine.current_word_index()
    }

    pub fn total_words(&self) -> usize {
        self.machine.total_words()
    }

    pub fn current_chunk_index(&self) -> usize {
        self.machine.current_chunk()
    }

    /// Number of chunks in the session (0 when stopped).
    pub fn chunk_count(&self) -> usize {
        self.machine.chunks().len()
    }

    pub fn set_settings(&mut self, settings: SpeechSettings) {
        self.backend.set_settings(&settings);
        self.settings = settings;
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    pub fn available_voices(&self) -> Vec<Voice> {
        self.backend.voices()
    }

    /// Select a voice. The stored settings only change if the backend
    /// accepts it.
    pub fn set_voice(&mut self, voice_id: &str) -> bool {
        if !self.backend.set_voice(voice_id) {
            warn!("Unknown voice: {}", voice_id);
            return false;
        }
        self.settings.voice_id = Some(voice_id.to_string());
        true
    }

    pub fn current_voice(&self) -> Option<Voice> {
        self.backend.current_voice()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn on_started(&mut self, cb: impl FnMut() + Send + 'static) {
        self.callbacks.started = Some(Box::new(cb));
    }

    pub fn on_finished(&mut self, cb: impl FnMut() + Send + 'static) {
        self.callbacks.finished = Some(Box::new(cb));
    }

    pub fn on_paused(&mut self, cb: impl FnMut() + Send + 'static) {
        self.callbacks.paused = Some(Box::new(cb));
    }

    pub fn on_resumed(&mut self, cb: impl FnMut() + Send + 'static) {
        self.callbacks.resumed = Some(Box::new(cb));
    }

    /// Register the progress callback, called with
    /// `(fraction, word_index, total_words)` for the current chunk.
    pub fn on_progress(&mut self, cb: impl FnMut(f32, usize, usize) + Send + 'static) {
        self.callbacks.progress = Some(Box::new(cb));
    }

    /// Run an input and every input its actions feed back.
    ///
    /// Returns whether the last utterance handed to the backend was
    /// accepted, or `None` if nothing was uttered.
    fn apply(&mut self, input: Input) -> Option<bool> {
        let mut inputs = VecDeque::from([input]);
        let mut uttered = None;

        while let Some(input) = inputs.pop_front() {
            let (machine, actions) = machine::step(std::mem::take(&mut self.machine), input);
            self.machine = machine;

            for action in actions {
                match action {
                    Action::Halt => {
                        self.backend.stop();
                        self.discard_pending_events();
                    }
                    Action::Utter(text) => {
                        let accepted = !text.is_empty() && self.backend.speak(&text);
                        if accepted {
                            debug!(
                                "Chunk {}/{} accepted by {}",
                                self.machine.current_chunk() + 1,
                                self.machine.chunks().len(),
                                self.backend.name()
                            );
                        } else {
                            warn!(
                                "{} rejected chunk {}/{}",
                                self.backend.name(),
                                self.machine.current_chunk() + 1,
                                self.machine.chunks().len()
                            );
                        }
                        uttered = Some(accepted);
                        inputs.push_back(if accepted {
                            Input::Accepted
                        } else {
                            Input::Rejected
                        });
                    }
                    Action::PauseBackend => self.backend.pause(),
                    Action::ResumeBackend => self.backend.resume(),
                    Action::Notify(notification) => {
                        if notification == Notification::Finished {
                            info!("Playback finished");
                        }
                        self.callbacks.fire(notification);
                    }
                }
            }
        }

        uttered
    }

    /// Drop events the stopped utterance queued before `stop` returned.
    fn discard_pending_events(&mut self) {
        let mut discarded = 0;
        while self.events.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} events from the stopped utterance", discarded);
        }
    }
}

impl<B: SpeechBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
