//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A transcription result for one audio file.
///
/// Segment times are relative to the start of the transcribed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Stem of the audio file this transcript came from.
    pub source: String,
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (concatenated segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(source: String, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments
            .last()
            .map(|s| s.end_seconds)
            .unwrap_or(0.0);

        Self {
            source,
            segments,
            full_text,
            duration_seconds,
        }
    }

    /// Segments that carry any text.
    pub fn non_empty_segments(&self) -> impl Iterator<Item = &TranscriptSegment> {
        self.segments.iter().filter(|s| !s.text.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.non_empty_segments().next().is_none()
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}
