//! Configuration settings for gapfill.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub paths: PathSettings,
    pub matching: MatchingSettings,
    pub gaps: GapSettings,
    pub locator: LocatorSettings,
    pub repair: RepairSettings,
    pub transcription: TranscriptionSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary audio clips.
    pub temp_dir: String,
    /// Log level when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/gapfill".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Transcript and audio directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Base-pass (fast model) transcripts.
    pub base_dir: String,
    /// Accurate-pass (large model) transcripts, rewritten by repairs.
    pub large_dir: String,
    /// Source audio, one file per video.
    pub audio_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: "test_data/transcripts".to_string(),
            large_dir: "test_data/transcripts_large".to_string(),
            audio_dir: "test_data/audio".to_string(),
        }
    }
}

/// Coverage heuristics thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Base texts shorter than this (in characters) are always covered.
    pub min_text_chars: usize,
    /// Words must be longer than this to count for reverse word coverage.
    pub reverse_min_word_chars: usize,
    /// Fraction of long base words that must appear in one accurate segment.
    pub reverse_word_threshold: f64,
    /// Words must be longer than this to count for word-set overlap.
    pub set_min_word_chars: usize,
    /// Fraction of the base word set shared with one accurate segment.
    pub word_set_threshold: f64,
    /// Phrase length for the cross-segment phrase search.
    pub phrase_words: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_text_chars: 10,
            reverse_min_word_chars: 3,
            reverse_word_threshold: 0.7,
            set_min_word_chars: 2,
            word_set_threshold: 0.8,
            phrase_words: 3,
        }
    }
}

/// Gap merging and filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapSettings {
    pub merge_tolerance_seconds: f64,
    pub min_gap_seconds: f64,
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            merge_tolerance_seconds: 2.0,
            min_gap_seconds: 5.0,
        }
    }
}

/// Chapter file pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    /// Declared ranges whose endpoints differ by at most this much agree.
    pub range_tolerance_seconds: f64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            range_tolerance_seconds: 5.0,
        }
    }
}

/// Gap repair settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairSettings {
    /// Language passed to the transcriber.
    pub language: String,
    /// Audio file extensions tried in order.
    pub audio_extensions: Vec<String>,
    /// Time slack when testing two segments for overlap.
    pub overlap_tolerance_seconds: f64,
    /// Shared-word fraction above which an overlapping segment is a duplicate.
    pub duplicate_word_overlap: f64,
    /// Number of leading words compared by the duplicate test.
    pub duplicate_prefix_words: usize,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            audio_extensions: ["mp3", "m4a", "webm", "opus"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            overlap_tolerance_seconds: 2.0,
            duplicate_word_overlap: 0.5,
            duplicate_prefix_words: 10,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GapfillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gapfill")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    pub fn base_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.base_dir)
    }

    pub fn large_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.large_dir)
    }

    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.audio_dir)
    }
}
