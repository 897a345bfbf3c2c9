//! Playback transition table.
//!
//! [`step`] is a pure function from the current [`Machine`] and an
//! [`Input`] to the next machine and the [`Action`]s the controller must
//! carry out. It never touches a backend, so every transition can be
//! tested on its own.

use serde::{Deserialize, Serialize};

use crate::text::TextChunk;

/// Playback state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeechState {
    #[default]
    Stopped,
    Speaking,
    Paused,
}

/// State and session data owned by one controller.
///
/// The session fields are reset whenever the state becomes `Stopped`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Machine {
    state: SpeechState,
    chunks: Vec<TextChunk>,
    current_chunk: usize,
    progress: f32,
    current_word_index: usize,
    total_words: usize,
}

/// Everything that can drive a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Start a new session at `start` (control)
    Begin { chunks: Vec<TextChunk>, start: usize },
    /// The backend accepted the last utterance
    Accepted,
    /// The backend rejected the last utterance
    Rejected,
    Pause,
    Resume,
    Stop,
    /// The backend reported the current utterance started
    Started,
    /// The backend reported progress within the current utterance
    Progress {
        fraction: f32,
        word_index: usize,
        total_words: usize,
    },
    /// The backend reported the current utterance finished
    Finished,
}

/// Side effects requested by a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Stop the backend and discard events of the stopped utterance
    Halt,
    /// Hand text to the backend, then feed back `Accepted` or `Rejected`
    Utter(String),
    PauseBackend,
    ResumeBackend,
    Notify(Notification),
}

/// Callback to fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    Started,
    Finished,
    Paused,
    Resumed,
    Progress {
        fraction: f32,
        word_index: usize,
        total_words: usize,
    },
}

impl Machine {
    pub fn state(&self) -> SpeechState {
        self.state
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn current_chunk(&self) -> usize {
        self.current_chunk
    }

    /// Progress within the current chunk (0.0-1.0).
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn current_word_index(&self) -> usize {
        self.current_word_index
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Progress across the whole session (0.0-1.0).
    ///
    /// Counts the words of every chunk before the current one plus the
    /// reported word position inside the current chunk.
    pub fn overall_progress(&self) -> f32 {
        let session_words: usize = self.chunks.iter().map(|c| c.word_count).sum();
        if session_words == 0 {
            return 0.0;
        }

        let done: usize = self.chunks[..self.current_chunk]
            .iter()
            .map(|c| c.word_count)
            .sum();
        let in_chunk = self
            .current_word_index
            .min(self.chunks[self.current_chunk].word_count);

        ((done + in_chunk) as f32 / session_words as f32).clamp(0.0, 1.0)
    }

    fn has_next_chunk(&self) -> bool {
        self.current_chunk + 1 < self.chunks.len()
    }

    fn reset_progress(&mut self) {
        self.progress = 0.0;
        self.current_word_index = 0;
        self.total_words = 0;
    }
}

/// Compute the next machine and the actions for one input.
pub fn step(machine: Machine, input: Input) -> (Machine, Vec<Action>) {
    use SpeechState::*;

    match (machine.state, input) {
        (state, Input::Begin { chunks, start }) => {
            let Some(first) = chunks.get(start) else {
                return (machine, Vec::new());
            };

            let mut actions = Vec::new();
            if state != Stopped {
                actions.push(Action::Halt);
            }
            actions.push(Action::Utter(first.text.clone()));

            let next = Machine {
                state: Stopped,
                chunks,
                current_chunk: start,
                ..Machine::default()
            };
            (next, actions)
        }

        (_, Input::Accepted) if machine.chunks.is_empty() => (machine, Vec::new()),
        // Chunk advanced while paused: hold the new utterance too
        (Paused, Input::Accepted) => (machine, vec![Action::PauseBackend]),
        (_, Input::Accepted) => (
            Machine {
                state: Speaking,
                ..machine
            },
            Vec::new(),
        ),

        // A rejected first utterance just fails the request; a rejected
        // follow-up chunk ends the session like a normal finish would.
        (Stopped, Input::Rejected) => (Machine::default(), Vec::new()),
        (_, Input::Rejected) => (
            Machine::default(),
            vec![Action::Notify(Notification::Finished)],
        ),

        (Speaking, Input::Pause) => (
            Machine {
                state: Paused,
                ..machine
            },
            vec![
                Action::PauseBackend,
                Action::Notify(Notification::Paused),
            ],
        ),
        (_, Input::Pause) => (machine, Vec::new()),

        (Paused, Input::Resume) => (
            Machine {
                state: Speaking,
                ..machine
            },
            vec![
                Action::ResumeBackend,
                Action::Notify(Notification::Resumed),
            ],
        ),
        (_, Input::Resume) => (machine, Vec::new()),

        (Stopped, Input::Stop) => (Machine::default(), Vec::new()),
        (_, Input::Stop) => (Machine::default(), vec![Action::Halt]),

        // Events of an utterance that is no longer current
        (Stopped, Input::Started | Input::Progress { .. } | Input::Finished) => {
            (machine, Vec::new())
        }

        (Paused, Input::Started) => (machine, vec![Action::Notify(Notification::Started)]),
        (_, Input::Started) => (
            Machine {
                state: Speaking,
                ..machine
            },
            vec![Action::Notify(Notification::Started)],
        ),

        (
            _,
            Input::Progress {
                fraction,
                word_index,
                total_words,
            },
        ) => (
            Machine {
                progress: fraction,
                current_word_index: word_index,
                total_words,
                ..machine
            },
            vec![Action::Notify(Notification::Progress {
                fraction,
                word_index,
                total_words,
            })],
        ),

        (_, Input::Finished) if machine.has_next_chunk() => {
            let mut next = machine;
            next.current_chunk += 1;
            next.reset_progress();
            let text = next.chunks[next.current_chunk].text.clone();
            (next, vec![Action::Utter(text)])
        }
        (_, Input::Finished) => (
            Machine::default(),
            vec![Action::Notify(Notification::Finished)],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts.iter().map(|t| TextChunk::new(*t)).collect()
    }

    /// Feed inputs in order, accepting every utterance.
    fn run(inputs: Vec<Input>) -> (Machine, Vec<Action>) {
        let mut machine = Machine::default();
        let mut all = Vec::new();
        for input in inputs {
            let (next, actions) = step(machine, input);
            machine = next;
            let uttered = actions.iter().any(|a| matches!(a, Action::Utter(_)));
            all.extend(actions);
            if uttered {
                let (next, actions) = step(machine, Input::Accepted);
                machine = next;
                all.extend(actions);
            }
        }
        (machine, all)
    }

    fn speaking(texts: &[&str], start: usize) -> Machine {
        run(vec![Input::Begin {
            chunks: chunks(texts),
            start,
        }])
        .0
    }

    #[test]
    fn test_begin_utters_start_chunk() {
        let (machine, actions) = step(
            Machine::default(),
            Input::Begin {
                chunks: chunks(&["a b", "c d"]),
                start: 1,
            },
        );
        assert_eq!(actions, vec![Action::Utter("c d".to_string())]);
        assert_eq!(machine.state(), SpeechState::Stopped);
        assert_eq!(machine.current_chunk(), 1);

        let (machine, actions) = step(machine, Input::Accepted);
        assert!(actions.is_empty());
        assert_eq!(machine.state(), SpeechState::Speaking);
    }

    #[test]
    fn test_begin_out_of_bounds_is_ignored() {
        let (machine, actions) = step(
            Machine::default(),
            Input::Begin {
                chunks: chunks(&["a"]),
                start: 1,
            },
        );
        assert_eq!(machine, Machine::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_begin_while_speaking_halts_first() {
        let machine = speaking(&["old"], 0);
        let (_, actions) = step(
            machine,
            Input::Begin {
                chunks: chunks(&["new"]),
                start: 0,
            },
        );
        assert_eq!(
            actions,
            vec![Action::Halt, Action::Utter("new".to_string())]
        );
    }

    #[test]
    fn test_rejected_first_utterance_clears_session() {
        let (machine, _) = step(
            Machine::default(),
            Input::Begin {
                chunks: chunks(&["a"]),
                start: 0,
            },
        );
        let (machine, actions) = step(machine, Input::Rejected);
        assert_eq!(machine, Machine::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_three_chunks_finish_once() {
        let (machine, actions) = run(vec![
            Input::Begin {
                chunks: chunks(&["c0", "c1", "c2"]),
                start: 0,
            },
            Input::Finished,
            Input::Finished,
            Input::Finished,
        ]);

        let utterances: Vec<&Action> = actions
            .iter()
            .filter(|a| matches!(a, Action::Utter(_)))
            .collect();
        let finishes = actions
            .iter()
            .filter(|a| **a == Action::Notify(Notification::Finished))
            .count();

        assert_eq!(utterances.len(), 3);
        assert_eq!(finishes, 1);
        assert_eq!(actions.last(), Some(&Action::Notify(Notification::Finished)));
        assert_eq!(machine, Machine::default());
    }

    #[test]
    fn test_pause_resume() {
        let machine = speaking(&["a"], 0);
        let (machine, actions) = step(machine, Input::Pause);
        assert_eq!(machine.state(), SpeechState::Paused);
        assert_eq!(
            actions,
            vec![Action::PauseBackend, Action::Notify(Notification::Paused)]
        );

        let (machine, actions) = step(machine, Input::Pause);
        assert_eq!(machine.state(), SpeechState::Paused);
        assert!(actions.is_empty());

        let (machine, actions) = step(machine, Input::Resume);
        assert_eq!(machine.state(), SpeechState::Speaking);
        assert_eq!(
            actions,
            vec![Action::ResumeBackend, Action::Notify(Notification::Resumed)]
        );
    }

    #[test]
    fn test_pause_and_resume_while_stopped_are_noops() {
        for input in [Input::Pause, Input::Resume, Input::Stop] {
            let (machine, actions) = step(Machine::default(), input);
            assert_eq!(machine, Machine::default());
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn test_stop_from_paused_halts_and_clears() {
        let (machine, _) = step(speaking(&["a", "b"], 0), Input::Pause);
        let (machine, actions) = step(machine, Input::Stop);
        assert_eq!(actions, vec![Action::Halt]);
        assert_eq!(machine, Machine::default());
    }

    #[test]
    fn test_stale_events_ignored_when_stopped() {
        for input in [
            Input::Started,
            Input::Finished,
            Input::Progress {
                fraction: 0.5,
                word_index: 1,
                total_words: 2,
            },
        ] {
            let (machine, actions) = step(Machine::default(), input);
            assert_eq!(machine, Machine::default());
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn test_started_keeps_pause() {
        let (machine, _) = step(speaking(&["a"], 0), Input::Pause);
        let (machine, actions) = step(machine, Input::Started);
        assert_eq!(machine.state(), SpeechState::Paused);
        assert_eq!(actions, vec![Action::Notify(Notification::Started)]);
    }

    #[test]
    fn test_progress_is_per_chunk() {
        let machine = speaking(&["a b c d", "e f g h"], 0);
        let (machine, _) = step(
            machine,
            Input::Progress {
                fraction: 0.5,
                word_index: 2,
                total_words: 4,
            },
        );
        assert_eq!(machine.progress(), 0.5);
        assert_eq!(machine.overall_progress(), 0.25);

        let (machine, _) = step(machine, Input::Finished);
        let (machine, _) = step(machine, Input::Accepted);
        let (machine, _) = step(
            machine,
            Input::Progress {
                fraction: 0.25,
                word_index: 1,
                total_words: 4,
            },
        );
        assert_eq!(machine.current_chunk(), 1);
        assert_eq!(machine.progress(), 0.25);
        assert_eq!(machine.overall_progress(), 0.625);
    }

    #[test]
    fn test_advance_while_paused_stays_paused() {
        let (machine, _) = step(speaking(&["a", "b"], 0), Input::Pause);
        let (machine, actions) = step(machine, Input::Finished);
        assert_eq!(actions, vec![Action::Utter("b".to_string())]);
        let (machine, actions) = step(machine, Input::Accepted);
        assert_eq!(machine.state(), SpeechState::Paused);
        assert_eq!(actions, vec![Action::PauseBackend]);
    }

    #[test]
    fn test_rejected_follow_up_chunk_finishes() {
        let machine = speaking(&["a", "b"], 0);
        let (machine, actions) = step(machine, Input::Finished);
        assert_eq!(actions, vec![Action::Utter("b".to_string())]);
        let (machine, actions) = step(machine, Input::Rejected);
        assert_eq!(machine, Machine::default());
        assert_eq!(actions, vec![Action::Notify(Notification::Finished)]);
    }
}
