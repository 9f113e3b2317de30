//! Error types for gapfill.

use thiserror::Error;

/// Library-level error type for gapfill operations.
#[derive(Error, Debug)]
pub enum GapfillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Base model transcript not found for chapter {0}")]
    BaseTranscriptNotFound(u32),

    #[error("Large model transcript not found for chapter {0}")]
    LargeTranscriptNotFound(u32),

    #[error("Failed to parse {side} model transcript: {file}")]
    ParseFailed { side: &'static str, file: String },

    #[error("{0} directory not found: {1}")]
    DirectoryNotFound(&'static str, String),

    #[error("Audio file not found for video {0}")]
    AudioNotFound(String),

    #[error("Audio clipping failed: {0}")]
    Clip(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for gapfill operations.
pub type Result<T> = std::result::Result<T, GapfillError>;
