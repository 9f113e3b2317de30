//! Timestamped transcript files.
//!
//! A transcript file is a short header (chapter, video, declared time range,
//! model, separator) followed by one `[MM:SS] text` line per segment.
//! This module parses those files, models them as documents that can be
//! rewritten in place, and checks rewritten content for anomalies.

mod document;
mod parser;
mod validator;

pub use document::TranscriptDocument;
pub use parser::{
    infer_end_times, parse_segments, parse_transcript, parse_transcript_file, read_declared_range,
    split_header, TimeRange,
};
pub use validator::{find_anomalies, Anomaly, AnomalyKind};

use serde::{Deserialize, Serialize};

/// One utterance-level unit from a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds, relative to the chapter start.
    pub start_seconds: f64,
    /// End time in seconds (inferred for parsed files).
    pub end_seconds: f64,
    /// Spoken text.
    pub text: String,
    /// The `MM:SS` label as printed in the file, without brackets.
    pub timestamp_label: String,
}

impl Segment {
    /// Create a segment whose label is derived from its start time.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            timestamp_label: format_mmss(start_seconds),
            start_seconds,
            end_seconds,
            text,
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Render as a transcript body line.
    pub fn to_line(&self) -> String {
        format!("[{}] {}", self.timestamp_label, self.text)
    }
}

/// Format seconds as `MM:SS`; minutes are not wrapped into hours.
pub fn format_mmss(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Truncate to at most `max_chars` characters (not bytes).
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The last `max_chars` characters of `text`.
pub fn last_chars(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max_chars)).collect()
}
