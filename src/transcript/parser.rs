//! Two-phase transcript parsing: header extraction, then segment extraction.

use super::Segment;
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Header lines start with one of these labels.
const HEADER_KEYWORDS: &[&str] = &["Chapter", "Video", "Time", "Model"];

/// Only this many leading lines are searched for the declared time range.
const HEADER_SCAN_LINES: usize = 10;

/// A following segment closer than this bounds the current segment's end.
const NEIGHBOR_WINDOW_SECONDS: f64 = 15.0;

/// Longest end estimate for a segment that has a following segment.
const MAX_SEGMENT_SECONDS: f64 = 8.0;

/// Longest end estimate for the final segment.
const MAX_LAST_SEGMENT_SECONDS: f64 = 10.0;

/// Speaking rate used to estimate segment duration from word count.
const WORDS_PER_SECOND: f64 = 2.5;

fn segment_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[(\d{2,}):(\d{2})\]\s*(.*)$").expect("Invalid regex"))
}

fn time_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Time:\s*(\d{2,}):(\d{2})\s*-\s*(\d{2,}):(\d{2})").expect("Invalid regex")
    })
}

/// Time range declared in a transcript header (`Time: MM:SS - MM:SS`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Both endpoints lie within `tolerance` seconds of `other`'s.
    pub fn matches(&self, other: &TimeRange, tolerance: f64) -> bool {
        (self.start - other.start).abs() <= tolerance && (self.end - other.end).abs() <= tolerance
    }

    /// Parse a `Time: MM:SS - MM:SS` fragment anywhere in `line`.
    pub fn from_header_line(line: &str) -> Option<Self> {
        let caps = time_range_regex().captures(line)?;
        let field = |i: usize| caps[i].parse::<f64>().ok();
        Some(Self {
            start: field(1)? * 60.0 + field(2)?,
            end: field(3)? * 60.0 + field(4)?,
        })
    }
}

fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.chars().all(|c| c == '=')
        || HEADER_KEYWORDS.iter().any(|k| line.starts_with(k))
}

/// Split leading header lines from the transcript body.
///
/// Header lines are the labelled lines, separator lines made of `=`, and
/// blank lines that precede the first content line.
pub fn split_header<'a>(lines: &'a [&'a str]) -> (&'a [&'a str], &'a [&'a str]) {
    let body_start = lines
        .iter()
        .position(|line| !is_header_line(line))
        .unwrap_or(lines.len());
    lines.split_at(body_start)
}

/// Extract segments from transcript body lines.
///
/// Lines that are not `[MM:SS] text` are ignored. End times are inferred
/// with [`infer_end_times`].
pub fn parse_segments(lines: &[&str]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = lines
        .iter()
        .filter_map(|line| {
            let caps = segment_line_regex().captures(line.trim_end())?;
            let minutes: f64 = caps[1].parse().ok()?;
            let seconds: f64 = caps[2].parse().ok()?;
            let start = minutes * 60.0 + seconds;
            Some(Segment {
                start_seconds: start,
                end_seconds: start,
                text: caps[3].trim().to_string(),
                timestamp_label: format!("{}:{}", &caps[1], &caps[2]),
            })
        })
        .collect();

    infer_end_times(&mut segments);
    segments
}

/// Fill in `end_seconds` for segments whose files only carry start times.
///
/// A segment followed closely by another ends at the next start (at most
/// 8 seconds later). Otherwise the end is estimated from the word count,
/// capped at 8 seconds, or 10 seconds for the final segment.
pub fn infer_end_times(segments: &mut [Segment]) {
    let starts: Vec<f64> = segments.iter().map(|s| s.start_seconds).collect();

    for (i, segment) in segments.iter_mut().enumerate() {
        let start = segment.start_seconds;
        let estimated = segment.text.split_whitespace().count() as f64 / WORDS_PER_SECOND;

        let end = match starts.get(i + 1) {
            Some(&next_start) if next_start - start < NEIGHBOR_WINDOW_SECONDS => {
                next_start.min(start + MAX_SEGMENT_SECONDS)
            }
            Some(_) => start + estimated.min(MAX_SEGMENT_SECONDS),
            None => start + estimated.min(MAX_LAST_SEGMENT_SECONDS),
        };

        segment.end_seconds = end.max(start);
    }
}

/// Parse transcript text (header and body) into segments.
pub fn parse_transcript(content: &str) -> Vec<Segment> {
    let lines: Vec<&str> = content.lines().collect();
    let (_, body) = split_header(&lines);
    parse_segments(body)
}

/// Parse a transcript file into segments.
///
/// A missing file yields an empty list; only real read failures are errors.
pub fn parse_transcript_file(path: &Path) -> Result<Vec<Segment>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_transcript(&content))
}

/// Read the declared time range from the first lines of a transcript file.
pub fn read_declared_range(path: &Path) -> Result<Option<TimeRange>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .take(HEADER_SCAN_LINES)
        .find_map(TimeRange::from_header_line))
}
