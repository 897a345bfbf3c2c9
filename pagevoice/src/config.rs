//! pagevoice configuration management.

use anyhow::{Context, Result};
use pagevoice_core::{DocumentBackendKind, SpeechBackendKind, SpeechSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_RATE: f32 = 0.5;
const DEFAULT_PITCH: f32 = 1.0;
const DEFAULT_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagevoiceConfig {
    /// Speaking rate (0.0-1.0)
    #[serde(default = "default_rate")]
    pub rate: f32,

    /// Pitch multiplier (0.0-2.0)
    #[serde(default = "default_pitch")]
    pub pitch: f32,

    /// Volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Voice id. None means the backend default.
    #[serde(default)]
    pub voice: Option<String>,

    /// Extracted texts above this many words are split into chunks
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,

    /// Speech backend (espeak, silent)
    #[serde(default = "default_speech_backend")]
    pub speech_backend: String,

    /// Document backend (auto, text, pdftotext)
    #[serde(default = "default_document_backend")]
    pub document_backend: String,
}

fn default_rate() -> f32 {
    DEFAULT_RATE
}

fn default_pitch() -> f32 {
    DEFAULT_PITCH
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_chunk_words() -> usize {
    pagevoice_core::text::DEFAULT_CHUNK_WORDS
}

fn default_speech_backend() -> String {
    "espeak".to_string()
}

fn default_document_backend() -> String {
    "auto".to_string()
}

impl Default for PagevoiceConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            pitch: default_pitch(),
            volume: default_volume(),
            voice: None,
            chunk_words: default_chunk_words(),
            speech_backend: default_speech_backend(),
            document_backend: default_document_backend(),
        }
    }
}

impl PagevoiceConfig {
    /// Get the config file path: <config dir>/pagevoice/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagevoice")
            .join("config.toml")
    }

    /// Load config from the default path, returning default if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: PagevoiceConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Speech settings from the stored values, clamped to their ranges.
    pub fn speech_settings(&self) -> SpeechSettings {
        let settings = SpeechSettings::new()
            .with_rate(self.rate)
            .with_pitch(self.pitch)
            .with_volume(self.volume);
        match &self.voice {
            Some(voice) => settings.with_voice(voice.clone()),
            None => settings,
        }
    }

    pub fn speech_backend_kind(&self) -> Result<SpeechBackendKind> {
        Ok(self.speech_backend.parse()?)
    }

    pub fn document_backend_kind(&self) -> Result<DocumentBackendKind> {
        Ok(self.document_backend.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PagevoiceConfig::default();
        assert_eq!(config.rate, 0.5);
        assert_eq!(config.pitch, 1.0);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.chunk_words, 10_000);
        assert_eq!(config.speech_backend, "espeak");
        assert_eq!(config.document_backend, "auto");
        assert!(config.voice.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = PagevoiceConfig::config_path();
        assert!(path.ends_with("pagevoice/config.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
rate = 0.7
volume = 0.4
voice = "en-us"
chunk_words = 500
speech_backend = "silent"
"#;
        let config: PagevoiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rate, 0.7);
        assert_eq!(config.volume, 0.4);
        assert_eq!(config.pitch, 1.0);
        assert_eq!(config.voice.as_deref(), Some("en-us"));
        assert_eq!(config.chunk_words, 500);
        assert_eq!(config.speech_backend_kind().unwrap(), SpeechBackendKind::Silent);
        assert_eq!(config.document_backend_kind().unwrap(), DocumentBackendKind::Auto);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: PagevoiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate, 0.5);
        assert_eq!(config.chunk_words, 10_000);
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        let config = PagevoiceConfig {
            speech_backend: "sapi".to_string(),
            ..PagevoiceConfig::default()
        };
        assert!(config.speech_backend_kind().is_err());
    }

    #[test]
    fn test_speech_settings_clamp() {
        let config = PagevoiceConfig {
            rate: 4.0,
            voice: Some("fr".to_string()),
            ..PagevoiceConfig::default()
        };
        let settings = config.speech_settings();
        assert_eq!(settings.rate, 1.0);
        assert_eq!(settings.voice_id.as_deref(), Some("fr"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(PagevoiceConfig::load_from(&path).unwrap().rate, 0.5);

        let config = PagevoiceConfig {
            pitch: 1.5,
            voice: Some("de".to_string()),
            ..PagevoiceConfig::default()
        };
        config.save_to(&path).unwrap();

        let loaded = PagevoiceConfig::load_from(&path).unwrap();
        assert_eq!(loaded.pitch, 1.5);
        assert_eq!(loaded.voice.as_deref(), Some("de"));
    }
}
