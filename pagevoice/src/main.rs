//! pagevoice - Read PDF and text documents aloud

mod config;
mod pages;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PagevoiceConfig;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use pagevoice_core::{
    ExtractionResult, Extractor, PlaybackController, SpeechBackend, SpeechState,
    create_document_backend, create_speech_backend, event_channel,
};
use pages::{PageSpan, parse_page_span};
use std::path::{Path, PathBuf};

type Controller = PlaybackController<Box<dyn SpeechBackend>>;

#[derive(Parser, Debug)]
#[command(name = "pagevoice")]
#[command(about = "Extract text from PDF and text documents and read it aloud", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    /// Enable informational output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the normalized text of a document
    Extract {
        /// Path to the document
        file: PathBuf,

        /// Pages to extract (e.g. "5", "2-7", "3-", "-4")
        #[arg(long, value_parser = parse_page_span)]
        pages: Option<PageSpan>,

        /// Print the full extraction result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read a document aloud
    Speak {
        /// Path to the document
        file: PathBuf,

        /// Pages to read (e.g. "5", "2-7", "3-", "-4")
        #[arg(long, value_parser = parse_page_span)]
        pages: Option<PageSpan>,

        /// Chunk to start from (1-based)
        #[arg(long, default_value_t = 1)]
        start_chunk: usize,

        #[command(flatten)]
        voice: VoiceArgs,
    },
    /// Speak the given text
    Say {
        /// Text to speak
        #[arg(required = true)]
        text: Vec<String>,

        #[command(flatten)]
        voice: VoiceArgs,
    },
    /// List available voices
    Voices,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides of the configured speech settings
#[derive(clap::Args, Debug)]
struct VoiceArgs {
    /// Speaking rate (0.0-1.0)
    #[arg(long)]
    rate: Option<f32>,

    /// Volume (0.0-1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Pitch multiplier (0.0-2.0)
    #[arg(long)]
    pitch: Option<f32>,

    /// Voice id (see `pagevoice voices`)
    #[arg(long)]
    voice: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default speaking rate
    SetRate {
        /// Value (0.0-1.0)
        value: f32,
    },
    /// Set default volume
    SetVolume {
        /// Value (0.0-1.0)
        value: f32,
    },
    /// Set default pitch
    SetPitch {
        /// Value (0.0-2.0)
        value: f32,
    },
    /// Set default voice
    SetVoice {
        /// Voice id
        voice: String,
    },
    /// Set the word count above which documents are split into chunks
    SetChunkWords {
        /// Words per chunk
        value: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match args.command {
        Commands::Extract { file, pages, json } => handle_extract(&file, pages, json),
        Commands::Speak {
            file,
            pages,
            start_chunk,
            voice,
        } => handle_speak(&file, pages, start_chunk, &voice).await,
        Commands::Say { text, voice } => handle_say(&text.join(" "), &voice).await,
        Commands::Voices => handle_voices(),
        Commands::Config { action } => handle_config_command(&action),
    }
}

fn handle_extract(file: &Path, pages: Option<PageSpan>, json: bool) -> Result<()> {
    let config = PagevoiceConfig::load().context("Failed to load configuration")?;
    let result = extract(&config, file, pages)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    if !result.success {
        anyhow::bail!("{}", result.error_message);
    }
    if !json {
        println!("{}", result.full_text);
    }

    eprintln!(
        "Pages {}-{} of {}, {} words",
        result.page_range.start_page,
        result.page_range.end_page,
        result.page_range.total_pages,
        result.word_count()
    );
    Ok(())
}

async fn handle_speak(
    file: &Path,
    pages: Option<PageSpan>,
    start_chunk: usize,
    voice: &VoiceArgs,
) -> Result<()> {
    let config = PagevoiceConfig::load().context("Failed to load configuration")?;

    eprintln!("Extracting: {}", file.display());
    let result = extract(&config, file, pages)?;
    if !result.success {
        anyhow::bail!("{}", result.error_message);
    }

    let chunk_count = result.chunks.len();
    eprintln!(
        "Pages {}-{} of {}, {} words in {} chunk(s)",
        result.page_range.start_page,
        result.page_range.end_page,
        result.page_range.total_pages,
        result.word_count(),
        chunk_count
    );

    if start_chunk == 0 || start_chunk > chunk_count {
        anyhow::bail!(
            "Start chunk must be between 1 and {} (got {})",
            chunk_count,
            start_chunk
        );
    }

    let mut controller = open_controller(&config, voice)?;

    let pb = ProgressBar::new(chunk_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    pb.set_position((start_chunk - 1) as u64);

    let progress_bar = pb.clone();
    controller.on_progress(move |fraction, _, _| {
        progress_bar.set_message(format!("{:.0}%", fraction * 100.0));
    });

    if !controller.speak_chunked(result.chunks, start_chunk - 1) {
        pb.abandon();
        anyhow::bail!("Speech backend rejected the text");
    }

    let completed = play(&mut controller, Some(&pb)).await;
    if completed {
        pb.finish_with_message("done");
    } else {
        pb.abandon_with_message("stopped");
    }
    controller.cleanup();
    Ok(())
}

async fn handle_say(text: &str, voice: &VoiceArgs) -> Result<()> {
    let config = PagevoiceConfig::load().context("Failed to load configuration")?;
    let mut controller = open_controller(&config, voice)?;

    if !controller.speak(text) {
        anyhow::bail!("Nothing to speak");
    }
    play(&mut controller, None).await;
    controller.cleanup();
    Ok(())
}

fn handle_voices() -> Result<()> {
    let config = PagevoiceConfig::load().context("Failed to load configuration")?;
    let (sink, _events) = event_channel();
    let backend = create_speech_backend(config.speech_backend_kind()?, sink)
        .context("Failed to start speech backend")?;

    let voices = backend.voices();
    if voices.is_empty() {
        eprintln!("No voices reported by {}", backend.name());
        return Ok(());
    }

    for voice in voices {
        let marker = if voice.is_default { "*" } else { " " };
        println!("{} {:<16} {:<10} {}", marker, voice.id, voice.language, voice.name);
    }
    Ok(())
}

/// Run an extraction request with the configured document backend.
fn extract(
    config: &PagevoiceConfig,
    file: &Path,
    pages: Option<PageSpan>,
) -> Result<ExtractionResult> {
    let backend = create_document_backend(config.document_backend_kind()?, file)
        .context("Failed to open document backend")?;
    debug!("Using {} document backend", backend.name());

    let extractor = Extractor::new(backend).with_chunk_threshold(config.chunk_words);
    Ok(match pages {
        Some(span) => extractor.extract_range(file, span.start, span.end),
        None => extractor.extract_all(file),
    })
}

/// Create and configure a playback controller for the configured backend.
fn open_controller(config: &PagevoiceConfig, overrides: &VoiceArgs) -> Result<Controller> {
    let (sink, events) = event_channel();
    let backend = create_speech_backend(config.speech_backend_kind()?, sink)
        .context("Failed to start speech backend")?;
    info!("Using {} speech backend", backend.name());

    let mut controller = PlaybackController::new(backend, events);
    if !controller.initialize() {
        anyhow::bail!("Speech backend failed to initialize");
    }

    let mut settings = config.speech_settings();
    if let Some(rate) = overrides.rate {
        settings = settings.with_rate(rate);
    }
    if let Some(volume) = overrides.volume {
        settings = settings.with_volume(volume);
    }
    if let Some(pitch) = overrides.pitch {
        settings = settings.with_pitch(pitch);
    }
    controller.set_settings(settings);

    if let Some(voice) = overrides.voice.as_deref().or(config.voice.as_deref()) {
        if !controller.set_voice(voice) {
            anyhow::bail!("Unknown voice '{}'. Run 'pagevoice voices' for a list.", voice);
        }
    }

    Ok(controller)
}

/// Apply backend events until playback ends or Ctrl-C is pressed.
///
/// Returns false if playback was interrupted.
async fn play(controller: &mut Controller, pb: Option<&ProgressBar>) -> bool {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while controller.state() != SpeechState::Stopped {
        tokio::select! {
            more = controller.next_event() => {
                if !more {
                    controller.stop();
                    return false;
                }
                if let Some(pb) = pb {
                    if controller.state() != SpeechState::Stopped {
                        pb.set_position(controller.current_chunk_index() as u64);
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping playback");
                controller.stop();
                return false;
            }
        }
    }

    if let Some(pb) = pb {
        pb.set_position(pb.length().unwrap_or_default());
    }
    true
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PagevoiceConfig::load()?;
            println!("Configuration file: {:?}", PagevoiceConfig::config_path());
            println!();
            println!("rate = {}", config.rate);
            println!("pitch = {}", config.pitch);
            println!("volume = {}", config.volume);
            if let Some(voice) = &config.voice {
                println!("voice = \"{}\"", voice);
            } else {
                println!("voice = (backend default)");
            }
            println!("chunk_words = {}", config.chunk_words);
            println!("speech_backend = \"{}\"", config.speech_backend);
            println!("document_backend = \"{}\"", config.document_backend);
        }
        ConfigAction::SetRate { value } => {
            let mut config = PagevoiceConfig::load()?;
            config.rate = value.clamp(0.0, 1.0);
            config.save()?;
            println!("Default rate set to: {}", config.rate);
        }
        ConfigAction::SetVolume { value } => {
            let mut config = PagevoiceConfig::load()?;
            config.volume = value.clamp(0.0, 1.0);
            config.save()?;
            println!("Default volume set to: {}", config.volume);
        }
        ConfigAction::SetPitch { value } => {
            let mut config = PagevoiceConfig::load()?;
            config.pitch = value.clamp(0.0, 2.0);
            config.save()?;
            println!("Default pitch set to: {}", config.pitch);
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = PagevoiceConfig::load()?;
            config.voice = Some(voice.clone());
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetChunkWords { value } => {
            let mut config = PagevoiceConfig::load()?;
            config.chunk_words = (*value).max(1);
            config.save()?;
            println!("Chunk size set to: {} words", config.chunk_words);
        }
    }
    Ok(())
}
