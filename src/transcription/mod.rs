//! Transcription module for gapfill.
//!
//! Re-transcribes short audio clips using OpenAI Whisper.

mod models;
mod whisper;

pub use models::{Transcript, TranscriptSegment};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;

    /// Transcribe an audio file with a specific language hint.
    async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcript>;
}
