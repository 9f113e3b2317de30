//! Checks for corrupted content in rewritten transcripts.
//!
//! Speech-to-text engines occasionally hallucinate long runs of zeros or emit
//! mixed-encoding garbage next to Hangul text. These are flagged for review.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Longest line excerpt kept in an anomaly record.
const PREVIEW_CHARS: usize = 100;

/// Kind of suspicious content found on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ConsecutiveZeros,
    BrokenChars,
    SuspiciousNumbers,
    LongZeroSequence,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::ConsecutiveZeros => write!(f, "consecutive_zeros"),
            AnomalyKind::BrokenChars => write!(f, "broken_chars"),
            AnomalyKind::SuspiciousNumbers => write!(f, "suspicious_numbers"),
            AnomalyKind::LongZeroSequence => write!(f, "long_zero_sequence"),
        }
    }
}

/// A suspicious line in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// 1-based line number.
    pub line: usize,
    pub kind: AnomalyKind,
    pub preview: String,
}

struct Patterns {
    zeros: Regex,
    thousands: Regex,
    broken: Regex,
    suspicious: Regex,
    long_zeros: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        zeros: Regex::new(r"\d+\s+00\s+00\s+00|0{4,}|0\s+0\s+0\s+0\s+0\s+0").expect("Invalid regex"),
        thousands: Regex::new(r"\d{1,3}[,\s]\d{3}").expect("Invalid regex"),
        broken: Regex::new(r#"[가-힣].*[^\x00-\x7F가-힣\s.,!?;:"'()\[\]{}]"#).expect("Invalid regex"),
        suspicious: Regex::new(r"\d{2,}\s+00\s+00\s+00\s+00|\d+\s+0{3,}\s+\d+").expect("Invalid regex"),
        long_zeros: Regex::new(r"0\s+0\s+0\s+0\s+0\s+0\s+0\s+0").expect("Invalid regex"),
    })
}

fn is_header(line: &str) -> bool {
    ["Chapter", "Video", "Time", "Model"]
        .iter()
        .any(|k| line.starts_with(k))
        || line.trim().starts_with('=')
}

/// Scan transcript text for anomalous lines.
pub fn find_anomalies(text: &str) -> Vec<Anomaly> {
    let p = patterns();
    let mut anomalies = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || is_header(line) {
            continue;
        }

        let mut flag = |kind| {
            anomalies.push(Anomaly {
                line: idx + 1,
                kind,
                preview: super::take_chars(stripped, PREVIEW_CHARS),
            })
        };

        if p.zeros.is_match(stripped) && !p.thousands.is_match(stripped) {
            flag(AnomalyKind::ConsecutiveZeros);
        }
        if p.broken.is_match(stripped) {
            flag(AnomalyKind::BrokenChars);
        }
        if p.suspicious.is_match(stripped) {
            flag(AnomalyKind::SuspiciousNumbers);
        }
        if p.long_zeros.is_match(stripped) {
            flag(AnomalyKind::LongZeroSequence);
        }
    }

    anomalies
}
