//! Comparison and repair reports.
//!
//! The console summary truncates gap text for a quick overview; the detailed
//! report (text or JSON) keeps everything.

use crate::error::{GapfillError, Result};
use crate::gaps::MissingSegment;
use crate::locator::{ChapterFilePair, MatchKind};
use crate::repair::{RepairOutcome, RepairReport};
use crate::transcript::{format_mmss, last_chars, take_chars};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;
const SUMMARY_TEXT_CHARS: usize = 150;
const SUMMARY_CONTEXT_CHARS: usize = 50;

/// Outcome of comparing one chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterResult {
    pub video_id: String,
    pub chapter_num: u32,
    pub base_file: Option<PathBuf>,
    pub large_file: Option<PathBuf>,
    pub base_segments_count: usize,
    pub large_segments_count: usize,
    pub missing_segments: Vec<MissingSegment>,
    pub total_missing_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    pub error: Option<String>,
    /// Set when the file pair was matched despite disagreeing time ranges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ChapterResult {
    /// A chapter that could not be compared.
    pub fn failed(video_id: &str, chapter_num: u32, error: &GapfillError) -> Self {
        Self {
            video_id: video_id.to_string(),
            chapter_num,
            base_file: None,
            large_file: None,
            base_segments_count: 0,
            large_segments_count: 0,
            missing_segments: Vec::new(),
            total_missing_duration: 0.0,
            match_kind: None,
            error: Some(error.to_string()),
            warning: None,
        }
    }

    /// A completed comparison.
    pub fn compared(
        pair: &ChapterFilePair,
        base_segments_count: usize,
        large_segments_count: usize,
        missing_segments: Vec<MissingSegment>,
    ) -> Self {
        let warning = match &pair.match_kind {
            MatchKind::MismatchedChapterNumber { base, large } => Some(format!(
                "time ranges differ (base {}-{}, large {}-{}); matched by chapter number",
                format_mmss(base.start),
                format_mmss(base.end),
                format_mmss(large.start),
                format_mmss(large.end)
            )),
            _ => None,
        };

        Self {
            video_id: pair.video_id.clone(),
            chapter_num: pair.chapter_num,
            base_file: Some(pair.base_file.clone()),
            large_file: Some(pair.large_file.clone()),
            base_segments_count,
            large_segments_count,
            total_missing_duration: missing_segments.iter().map(|g| g.duration).sum(),
            missing_segments,
            match_kind: Some(pair.match_kind.clone()),
            error: None,
            warning,
        }
    }

    pub fn has_gaps(&self) -> bool {
        self.error.is_none() && !self.missing_segments.is_empty()
    }

    fn label(&self) -> String {
        format!("{} Chapter {}", self.video_id, self.chapter_num)
    }
}

/// Aggregate figures over a batch of chapters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub chapters_with_gaps: usize,
    pub total_missing_duration: f64,
}

impl Totals {
    pub fn from_results(results: &[ChapterResult]) -> Self {
        results
            .iter()
            .filter(|r| r.has_gaps())
            .fold(Totals { chapters_with_gaps: 0, total_missing_duration: 0.0 }, |acc, r| Totals {
                chapters_with_gaps: acc.chapters_with_gaps + 1,
                total_missing_duration: acc.total_missing_duration + r.total_missing_duration,
            })
    }
}

/// Detailed report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}. Use text or json.", s)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn span(gap: &MissingSegment) -> String {
    format!(
        "{} - {} ({:.1}s)",
        format_mmss(gap.start_seconds),
        format_mmss(gap.end_seconds),
        gap.duration
    )
}

fn display_name(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Console summary of a comparison batch.
pub fn render_summary(results: &[ChapterResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule('=')));
    out.push_str("TRANSCRIPT COMPARISON SUMMARY\n");
    out.push_str(&format!("{}\n", rule('=')));
    out.push('\n');

    for result in results {
        if let Some(error) = &result.error {
            out.push_str(&format!("⚠️  {}: {}\n", result.label(), error));
            continue;
        }

        if result.missing_segments.is_empty() {
            out.push_str(&format!("✓ {}: No gaps found\n", result.label()));
        } else {
            out.push_str(&format!(
                "❌ {}: {} gap(s) found\n",
                result.label(),
                result.missing_segments.len()
            ));
            for gap in &result.missing_segments {
                out.push_str(&format!("   Gap: {}\n", span(gap)));
                out.push_str(&format!(
                    "   Missing text: {}...\n",
                    take_chars(&gap.base_text, SUMMARY_TEXT_CHARS)
                ));
                if let Some(before) = &gap.context_before {
                    out.push_str(&format!("   Before: ...{}\n", last_chars(before, SUMMARY_CONTEXT_CHARS)));
                }
                if let Some(after) = &gap.context_after {
                    out.push_str(&format!("   After: {}...\n", take_chars(after, SUMMARY_CONTEXT_CHARS)));
                }
                out.push('\n');
            }
        }

        if let Some(warning) = &result.warning {
            out.push_str(&format!("   Warning: {}\n", warning));
        }
    }

    let totals = Totals::from_results(results);
    out.push('\n');
    out.push_str(&format!("{}\n", rule('=')));
    out.push_str(&format!("Total chapters with gaps: {}\n", totals.chapters_with_gaps));
    out.push_str(&format!(
        "Total missing duration: {} ({:.1}s)\n",
        format_mmss(totals.total_missing_duration),
        totals.total_missing_duration
    ));
    out.push_str(&rule('='));
    out
}

/// Full plain-text report with untruncated gap text and context.
pub fn render_detailed_text(results: &[ChapterResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule('=')));
    out.push_str("DETAILED TRANSCRIPT COMPARISON REPORT\n");
    out.push_str(&format!("{}\n", rule('=')));
    out.push('\n');

    for result in results {
        out.push_str(&format!("Video ID: {}\n", result.video_id));
        out.push_str(&format!("Chapter: {}\n", result.chapter_num));

        if let Some(error) = &result.error {
            out.push_str(&format!("Error: {}\n", error));
            out.push('\n');
            continue;
        }

        out.push_str(&format!("Base file: {}\n", display_name(&result.base_file)));
        out.push_str(&format!("Large file: {}\n", display_name(&result.large_file)));
        out.push_str(&format!("Base segments: {}\n", result.base_segments_count));
        out.push_str(&format!("Large segments: {}\n", result.large_segments_count));
        if let Some(warning) = &result.warning {
            out.push_str(&format!("Warning: {}\n", warning));
        }
        out.push('\n');

        if result.missing_segments.is_empty() {
            out.push_str("No missing segments found.\n");
        } else {
            out.push_str(&format!("MISSING SEGMENTS ({}):\n", result.missing_segments.len()));
            out.push_str(&format!("{}\n", rule('-')));

            for gap in &result.missing_segments {
                out.push('\n');
                out.push_str(&format!("Time: {}\n", span(gap)));
                out.push_str(&format!("Missing text: {}\n", gap.base_text));
                if let Some(before) = &gap.context_before {
                    out.push('\n');
                    out.push_str("Context before:\n");
                    out.push_str(&format!("{}\n", before));
                }
                if let Some(after) = &gap.context_after {
                    out.push('\n');
                    out.push_str("Context after:\n");
                    out.push_str(&format!("{}\n", after));
                }
                out.push('\n');
                out.push_str(&format!("{}\n", rule('-')));
            }
        }

        out.push('\n');
        out.push_str(&format!("{}\n", rule('=')));
        out.push('\n');
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    chapters: &'a [ChapterResult],
    chapters_with_gaps: usize,
    total_missing_duration: f64,
}

/// Machine-readable report.
pub fn render_json(results: &[ChapterResult], generated_at: DateTime<Utc>) -> Result<String> {
    let totals = Totals::from_results(results);
    let report = JsonReport {
        generated_at,
        chapters: results,
        chapters_with_gaps: totals.chapters_with_gaps,
        total_missing_duration: totals.total_missing_duration,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write the detailed report to `path`.
pub fn write_detailed_report(results: &[ChapterResult], path: &Path, format: ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Text => render_detailed_text(results),
        ReportFormat::Json => render_json(results, Utc::now())?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// A chapter's repair attempt as shown in the repair summary.
#[derive(Debug, Clone)]
pub enum RepairEntry {
    Attempted(RepairReport),
    /// The chapter could not be attempted (e.g. no audio).
    Skipped {
        video_id: String,
        chapter_num: u32,
        error: String,
    },
}

impl RepairEntry {
    pub fn is_fixed(&self) -> bool {
        matches!(self, RepairEntry::Attempted(r) if r.outcome.is_fixed())
    }
}

/// Per-chapter outcome lines and the fixed-chapter count.
pub fn render_repair_summary(entries: &[RepairEntry]) -> String {
    let mut out = String::new();

    for entry in entries {
        match entry {
            RepairEntry::Skipped { video_id, chapter_num, error } => {
                out.push_str(&format!("✗ {} Chapter {}: {}\n", video_id, chapter_num, error));
            }
            RepairEntry::Attempted(report) => {
                let label = format!("{} Chapter {}", report.video_id, report.chapter_num);
                match &report.outcome {
                    RepairOutcome::Fixed { added, anomalies } => {
                        out.push_str(&format!("✓ {}: added {} segment(s)\n", label, added));
                        if !anomalies.is_empty() {
                            out.push_str(&format!(
                                "  ⚠️  {} anomal{} detected, please review:\n",
                                anomalies.len(),
                                if anomalies.len() == 1 { "y" } else { "ies" }
                            ));
                            for anomaly in anomalies {
                                out.push_str(&format!(
                                    "     line {} [{}]: {}\n",
                                    anomaly.line, anomaly.kind, anomaly.preview
                                ));
                            }
                        }
                    }
                    RepairOutcome::NoNewSegments => {
                        out.push_str(&format!("✗ {}: no new segments (all content already present)\n", label));
                    }
                    RepairOutcome::TranscriptionFailed => {
                        out.push_str(&format!("✗ {}: transcription failed\n", label));
                    }
                    RepairOutcome::NothingToRepair => {
                        out.push_str(&format!("- {}: nothing to repair\n", label));
                    }
                }
            }
        }
    }

    let fixed = entries.iter().filter(|e| e.is_fixed()).count();
    out.push_str(&format!("{}\n", rule('=')));
    out.push_str(&format!("Fixed {} chapter(s)\n", fixed));
    out.push_str(&rule('='));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Anomaly, AnomalyKind, TimeRange};

    fn gap(start: f64, end: f64, text: &str) -> MissingSegment {
        MissingSegment {
            start_seconds: start,
            end_seconds: end,
            duration: end - start,
            base_text: text.to_string(),
            context_before: Some(format!("{} before", "b".repeat(80))),
            context_after: Some(format!("after {}", "a".repeat(80))),
        }
    }

    fn pair(kind: MatchKind) -> ChapterFilePair {
        ChapterFilePair {
            video_id: "vid".to_string(),
            chapter_num: 3,
            base_file: PathBuf::from("/data/base/vid_chapter3_pay.txt"),
            large_file: PathBuf::from("/data/large/vid_chapter3_pay.txt"),
            match_kind: kind,
        }
    }

    fn results() -> Vec<ChapterResult> {
        vec![
            ChapterResult::compared(&pair(MatchKind::ChapterNumber), 12, 10, vec![]),
            ChapterResult::compared(
                &pair(MatchKind::ChapterNumber),
                20,
                15,
                vec![gap(30.0, 38.0, &"x".repeat(200)), gap(90.0, 96.5, "short")],
            ),
            ChapterResult::failed("vid", 4, &GapfillError::LargeTranscriptNotFound(4)),
        ]
    }

    #[test]
    fn test_totals_skip_errors() {
        let totals = Totals::from_results(&results());
        assert_eq!(totals.chapters_with_gaps, 1);
        assert_eq!(totals.total_missing_duration, 14.5);
    }

    #[test]
    fn test_summary_lines() {
        let summary = render_summary(&results());
        assert!(summary.contains("✓ vid Chapter 3: No gaps found"));
        assert!(summary.contains("❌ vid Chapter 3: 2 gap(s) found"));
        assert!(summary.contains("   Gap: 00:30 - 00:38 (8.0s)"));
        assert!(summary.contains(&format!("   Missing text: {}...", "x".repeat(150))));
        assert!(!summary.contains(&"x".repeat(151)));
        assert!(summary.contains(&format!("   Before: ...{} before", "b".repeat(43))));
        assert!(summary.contains(&format!("   After: after {}...", "a".repeat(44))));
        assert!(summary.contains("⚠️  vid Chapter 4: Large model transcript not found for chapter 4"));
        assert!(summary.contains("Total chapters with gaps: 1"));
        assert!(summary.contains("Total missing duration: 00:14 (14.5s)"));
    }

    #[test]
    fn test_detailed_text_is_untruncated() {
        let text = render_detailed_text(&results());
        assert!(text.contains(&format!("Missing text: {}", "x".repeat(200))));
        assert!(text.contains("Base file: vid_chapter3_pay.txt"));
        assert!(text.contains("MISSING SEGMENTS (2):"));
        assert!(text.contains("No missing segments found."));
        assert!(text.contains("Error: Large model transcript not found for chapter 4"));
        assert!(text.contains(&format!("Context before:\n{} before", "b".repeat(80))));
    }

    #[test]
    fn test_mismatch_warning() {
        let result = ChapterResult::compared(
            &pair(MatchKind::MismatchedChapterNumber {
                base: TimeRange::new(120.0, 240.0),
                large: TimeRange::new(240.0, 360.0),
            }),
            5,
            5,
            vec![],
        );
        assert_eq!(
            result.warning.as_deref(),
            Some("time ranges differ (base 02:00-04:00, large 04:00-06:00); matched by chapter number")
        );
        assert!(render_summary(&[result]).contains("   Warning: time ranges differ"));
    }

    #[test]
    fn test_json_report() {
        let generated_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = render_json(&results(), generated_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["generated_at"], "2024-05-01T12:00:00Z");
        assert_eq!(value["chapters_with_gaps"], 1);
        assert_eq!(value["total_missing_duration"], 14.5);
        assert_eq!(value["chapters"].as_array().unwrap().len(), 3);
        assert_eq!(value["chapters"][1]["missing_segments"][1]["base_text"], "short");
        assert_eq!(value["chapters"][1]["match_kind"]["kind"], "chapter_number");
        assert!(value["chapters"][2]["error"].is_string());
    }

    #[test]
    fn test_write_detailed_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("gaps.json");
        write_detailed_report(&results(), &path, ReportFormat::Json).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["chapters_with_gaps"], 1);
    }

    #[test]
    fn test_report_format_parse() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_repair_summary() {
        let fixed = RepairReport {
            video_id: "vid".to_string(),
            chapter_num: 1,
            large_file: PathBuf::from("vid_chapter1.txt"),
            gaps: vec![],
            outcome: RepairOutcome::Fixed {
                added: 2,
                anomalies: vec![Anomaly {
                    line: 9,
                    kind: AnomalyKind::LongZeroSequence,
                    preview: "[00:30] 0 0 0 0 0 0 0 0".to_string(),
                }],
            },
        };
        let dupes = RepairReport {
            chapter_num: 2,
            outcome: RepairOutcome::NoNewSegments,
            ..fixed.clone()
        };
        let entries = vec![
            RepairEntry::Attempted(fixed),
            RepairEntry::Attempted(dupes),
            RepairEntry::Skipped {
                video_id: "vid".to_string(),
                chapter_num: 3,
                error: "Audio file not found for video vid".to_string(),
            },
        ];

        let summary = render_repair_summary(&entries);
        assert!(summary.contains("✓ vid Chapter 1: added 2 segment(s)"));
        assert!(summary.contains("1 anomaly detected"));
        assert!(summary.contains("line 9 [long_zero_sequence]"));
        assert!(summary.contains("✗ vid Chapter 2: no new segments"));
        assert!(summary.contains("✗ vid Chapter 3: Audio file not found for video vid"));
        assert!(summary.contains("Fixed 1 chapter(s)"));
    }
}
