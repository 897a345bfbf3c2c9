//! eSpeak NG speech backend.
//!
//! Runs one `espeak-ng` process per utterance. A watcher thread polls the
//! process and reports completion through the event sink.
//!
//! espeak-ng gives no word callbacks on the command line, so the `Progress`
//! events sent while speaking are estimates from elapsed speaking time and
//! the configured words per minute. The final `Progress` is exact.

use log::{debug, warn};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::{EventSink, SpeechBackend, SpeechEvent, SpeechSettings, Voice};
use crate::error::{PagevoiceError, Result};

/// Words per minute at rate 0.0 and 1.0.
const MIN_WPM: f32 = 80.0;
const MAX_WPM: f32 = 450.0;

/// How often the watcher checks whether the process exited.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const DEFAULT_VOICE: &str = "en";

const BINARY: &str = "espeak-ng";

/// A running utterance shared with its watcher thread.
struct Utterance {
    child: Child,
    /// Set by `stop`; the watcher emits nothing once set
    cancelled: bool,
    clock: SpeakingClock,
}

/// Time spent speaking, excluding pauses.
#[derive(Debug, Clone, Copy)]
struct SpeakingClock {
    started: Instant,
    paused_at: Option<Instant>,
    paused_for: Duration,
}

impl SpeakingClock {
    fn start(now: Instant) -> Self {
        Self {
            started: now,
            paused_at: None,
            paused_for: Duration::ZERO,
        }
    }

    fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    fn resume(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            self.paused_for += now.saturating_duration_since(at);
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(self.started)
            .saturating_sub(self.paused_for)
    }
}

/// Speech backend driving the `espeak-ng` command-line synthesizer.
pub struct EspeakBackend {
    binary: PathBuf,
    sink: EventSink,
    settings: SpeechSettings,
    current: Option<Arc<Mutex<Utterance>>>,
}

impl EspeakBackend {
    /// Locate `espeak-ng` in PATH.
    ///
    /// Returns an error if it is not installed.
    pub fn new(sink: EventSink) -> Result<Self> {
        let binary = locate(BINARY)?;
        Ok(Self::with_binary(binary, sink))
    }

    /// Use an `espeak-ng` binary at an explicit path.
    pub fn with_binary(binary: impl Into<PathBuf>, sink: EventSink) -> Self {
        Self {
            binary: binary.into(),
            sink,
            settings: SpeechSettings::default(),
            current: None,
        }
    }

    fn voice_id(&self) -> &str {
        self.settings.voice_id.as_deref().unwrap_or(DEFAULT_VOICE)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-s", &words_per_minute(self.settings.rate).to_string()])
            .args(["-p", &espeak_pitch(self.settings.pitch).to_string()])
            .args(["-a", &espeak_amplitude(self.settings.volume).to_string()])
            .args(["-v", self.voice_id()])
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// Signal the running process, if any.
    /// Returns whether the signal was delivered.
    #[cfg(unix)]
    fn signal(&self, signal: &str) -> bool {
        let Some(utterance) = &self.current else {
            return false;
        };
        let Ok(mut guard) = utterance.lock() else {
            return false;
        };
        let pid = guard.child.id().to_string();
        match Command::new("kill").args([signal, &pid]).status() {
            Ok(status) if status.success() => {
                let now = Instant::now();
                if signal == "-STOP" {
                    guard.clock.pause(now);
                } else {
                    guard.clock.resume(now);
                }
                true
            }
            Ok(status) => {
                warn!("kill {} {} exited with {}", signal, pid, status);
                false
            }
            Err(e) => {
                warn!("Failed to send {} to espeak-ng ({}): {}", signal, pid, e);
                false
            }
        }
    }

    #[cfg(not(unix))]
    fn signal(&self, signal: &str) -> bool {
        debug!("espeak-ng pause/resume ({}) is not supported on this platform", signal);
        false
    }
}

impl SpeechBackend for EspeakBackend {
    fn speak(&mut self, text: &str) -> bool {
        self.stop();

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start espeak-ng: {}", e);
                return false;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                warn!("Failed to send text to espeak-ng: {}", e);
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
            // stdin is closed on drop so espeak-ng sees end of input
        }

        debug!("espeak-ng started (pid {})", child.id());
        let total_words = text.split_whitespace().count();
        let utterance = Arc::new(Mutex::new(Utterance {
            child,
            cancelled: false,
            clock: SpeakingClock::start(Instant::now()),
        }));
        self.current = Some(Arc::clone(&utterance));
        self.sink.emit(SpeechEvent::Started);

        let sink = self.sink.clone();
        let wpm = words_per_minute(self.settings.rate);
        thread::spawn(move || watch(utterance, sink, total_words, wpm));

        true
    }

    fn pause(&mut self) {
        if !self.signal("-STOP") {
            debug!("espeak-ng pause had no effect");
        }
    }

    fn resume(&mut self) {
        if !self.signal("-CONT") {
            debug!("espeak-ng resume had no effect");
        }
    }

    fn stop(&mut self) {
        let Some(utterance) = self.current.take() else {
            return;
        };
        let Ok(mut guard) = utterance.lock() else {
            return;
        };
        guard.cancelled = true;
        // A stopped (SIGSTOP) process must be continued before it can exit
        #[cfg(unix)]
        {
            let pid = guard.child.id().to_string();
            let _ = Command::new("kill").args(["-CONT", &pid]).status();
        }
        let _ = guard.child.kill();
        let _ = guard.child.wait();
    }

    fn set_settings(&mut self, settings: &SpeechSettings) {
        self.settings = settings.clone();
    }

    fn voices(&self) -> Vec<Voice> {
        let output = match Command::new(&self.binary).arg("--voices").output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!(
                    "espeak-ng --voices failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to run espeak-ng --voices: {}", e);
                return Vec::new();
            }
        };

        parse_voices(&String::from_utf8_lossy(&output.stdout))
    }

    fn set_voice(&mut self, voice_id: &str) -> bool {
        if !self.voices().iter().any(|v| v.id == voice_id) {
            return false;
        }
        self.settings.voice_id = Some(voice_id.to_string());
        true
    }

    fn current_voice(&self) -> Option<Voice> {
        let id = self.voice_id();
        self.voices().into_iter().find(|v| v.id == id)
    }

    fn cleanup(&mut self) {
        self.stop();
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}

impl Drop for EspeakBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

fn locate(binary: &str) -> Result<PathBuf> {
    which::which(binary).map_err(|_| {
        PagevoiceError::UnsupportedPlatform(format!(
            "{} not found. Install espeak-ng to enable speech",
            binary
        ))
    })
}

/// Wait for the process to exit, reporting estimated progress meanwhile,
/// then report the end of the utterance.
fn watch(utterance: Arc<Mutex<Utterance>>, sink: EventSink, total_words: usize, wpm: u32) {
    let mut reported = 0;
    loop {
        {
            let Ok(mut guard) = utterance.lock() else {
                return;
            };
            if guard.cancelled {
                return;
            }
            match guard.child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        warn!("espeak-ng exited with {}", status);
                    }
                    // Emitted under the lock so `stop` cannot slip in between
                    sink.emit(SpeechEvent::Progress {
                        fraction: 1.0,
                        word_index: total_words,
                        total_words,
                    });
                    sink.emit(SpeechEvent::Finished);
                    return;
                }
                Ok(None) => {
                    let estimate =
                        estimated_words(guard.clock.elapsed(Instant::now()), wpm).min(total_words);
                    if estimate > reported {
                        reported = estimate;
                        sink.emit(SpeechEvent::Progress {
                            fraction: estimate as f32 / total_words as f32,
                            word_index: estimate,
                            total_words,
                        });
                    }
                }
                Err(e) => {
                    warn!("Failed to poll espeak-ng: {}", e);
                    sink.emit(SpeechEvent::Finished);
                    return;
                }
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Map rate 0.0-1.0 onto espeak's words per minute.
fn words_per_minute(rate: f32) -> u32 {
    (MIN_WPM + rate.clamp(0.0, 1.0) * (MAX_WPM - MIN_WPM)).round() as u32
}

/// Estimated words spoken after `elapsed` at `wpm` words per minute.
fn estimated_words(elapsed: Duration, wpm: u32) -> usize {
    (elapsed.as_secs_f64() * f64::from(wpm) / 60.0) as usize
}

/// Map pitch multiplier 0.0-2.0 onto espeak's 0-99 (50 is normal).
fn espeak_pitch(pitch: f32) -> u32 {
    (pitch.clamp(0.0, 2.0) * 50.0).round().min(99.0) as u32
}

/// Map volume 0.0-1.0 onto espeak's amplitude 0-200.
fn espeak_amplitude(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 200.0).round() as u32
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en              --/M      English            gmw/en               (en 2)
/// ```
fn parse_voices(table: &str) -> Vec<Voice> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(Voice {
                id: language.to_string(),
                name: name.replace('_', " "),
                language: language.to_string(),
                is_default: language == DEFAULT_VOICE,
            })
        })
        .collect()
}
