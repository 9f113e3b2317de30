//! Gap repair: re-transcribe missing spans and splice them into the
//! accurate-pass transcript.
//!
//! For each gap the source audio is clipped at the gap's absolute position,
//! the clip is transcribed, and every returned sub-segment that does not
//! duplicate existing content is added. The transcript file is rewritten
//! once per chapter, atomically, and then checked for anomalies.

use crate::audio::{locate_audio_file, AudioClipper};
use crate::config::RepairSettings;
use crate::error::{GapfillError, Result};
use crate::gaps::MissingSegment;
use crate::transcript::{find_anomalies, format_mmss, Anomaly, Segment, TranscriptDocument};
use crate::transcription::Transcriber;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Decides whether a segment repeats one already in the transcript.
///
/// Two segments are duplicates when their time ranges overlap (with some
/// slack) and most of the candidate's leading words also lead the other.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateTest {
    pub overlap_tolerance_seconds: f64,
    pub word_overlap: f64,
    pub prefix_words: usize,
}

impl DuplicateTest {
    pub fn from_settings(settings: &RepairSettings) -> Self {
        Self {
            overlap_tolerance_seconds: settings.overlap_tolerance_seconds,
            word_overlap: settings.duplicate_word_overlap,
            prefix_words: settings.duplicate_prefix_words,
        }
    }

    pub fn is_duplicate(&self, candidate: &Segment, existing: &Segment) -> bool {
        if !segments_overlap(candidate, existing, self.overlap_tolerance_seconds) {
            return false;
        }

        let new_words = prefix_word_set(&candidate.text, self.prefix_words);
        if new_words.is_empty() {
            return false;
        }
        let old_words = prefix_word_set(&existing.text, self.prefix_words);
        let shared = new_words.intersection(&old_words).count();

        shared as f64 / new_words.len() as f64 > self.word_overlap
    }

    /// Whether `candidate` duplicates any of `existing`.
    pub fn duplicates_any<'a>(&self, candidate: &Segment, existing: impl IntoIterator<Item = &'a Segment>) -> bool {
        existing.into_iter().any(|seg| self.is_duplicate(candidate, seg))
    }
}

impl Default for DuplicateTest {
    fn default() -> Self {
        Self::from_settings(&RepairSettings::default())
    }
}

/// Time ranges overlap once each is widened by `tolerance` seconds.
pub fn segments_overlap(a: &Segment, b: &Segment, tolerance: f64) -> bool {
    !(a.end_seconds + tolerance < b.start_seconds || b.end_seconds + tolerance < a.start_seconds)
}

fn prefix_word_set(text: &str, count: usize) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .take(count)
        .map(str::to_string)
        .collect()
}

/// What happened to a single gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GapStatus {
    /// The transcript already contains the gap's text.
    AlreadyCovered,
    ClipFailed { reason: String },
    TranscriptionFailed { reason: String },
    /// Transcribed; `accepted` new segments kept, `duplicates` dropped.
    Transcribed { accepted: usize, duplicates: usize },
}

impl GapStatus {
    fn produced_transcription(&self) -> bool {
        matches!(self, GapStatus::AlreadyCovered | GapStatus::Transcribed { .. })
    }
}

/// A gap and what repair did with it.
#[derive(Debug, Clone, Serialize)]
pub struct GapRepair {
    pub start_seconds: f64,
    pub end_seconds: f64,
    #[serde(flatten)]
    pub status: GapStatus,
}

/// Result of repairing one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The transcript was rewritten with `added` new segments.
    Fixed { added: usize, anomalies: Vec<Anomaly> },
    /// Every gap was already covered or every new segment was a duplicate.
    NoNewSegments,
    /// No gap could be clipped and transcribed.
    TranscriptionFailed,
    NothingToRepair,
}

impl RepairOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, RepairOutcome::Fixed { .. })
    }
}

/// Per-chapter repair record.
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub video_id: String,
    pub chapter_num: u32,
    pub large_file: PathBuf,
    pub gaps: Vec<GapRepair>,
    pub outcome: RepairOutcome,
}

/// Re-transcribes gaps and splices the results into transcript files.
pub struct RepairPipeline {
    transcriber: Arc<dyn Transcriber>,
    clipper: Arc<dyn AudioClipper>,
    audio_dir: PathBuf,
    language: String,
    audio_extensions: Vec<String>,
    duplicates: DuplicateTest,
}

impl RepairPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        clipper: Arc<dyn AudioClipper>,
        audio_dir: PathBuf,
        settings: &RepairSettings,
    ) -> Self {
        Self {
            transcriber,
            clipper,
            audio_dir,
            language: settings.language.clone(),
            audio_extensions: settings.audio_extensions.clone(),
            duplicates: DuplicateTest::from_settings(settings),
        }
    }

    /// Override the transcription language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Repair one chapter's accurate-pass transcript.
    ///
    /// Fails only when the chapter cannot be attempted at all (no audio, or
    /// the transcript cannot be read or rewritten). Per-gap failures are
    /// recorded in the report.
    #[instrument(skip(self, large_file, gaps), fields(gap_count = gaps.len()))]
    pub async fn repair_chapter(
        &self,
        video_id: &str,
        chapter_num: u32,
        large_file: &Path,
        gaps: &[MissingSegment],
    ) -> Result<RepairReport> {
        let report = |gaps: Vec<GapRepair>, outcome: RepairOutcome| RepairReport {
            video_id: video_id.to_string(),
            chapter_num,
            large_file: large_file.to_path_buf(),
            gaps,
            outcome,
        };

        if gaps.is_empty() {
            return Ok(report(Vec::new(), RepairOutcome::NothingToRepair));
        }

        let audio_path = locate_audio_file(&self.audio_dir, video_id, &self.audio_extensions)
            .ok_or_else(|| GapfillError::AudioNotFound(video_id.to_string()))?;

        let mut document = TranscriptDocument::load(large_file)?;
        let chapter_start = document.declared_range().map(|r| r.start).unwrap_or(0.0);
        debug!("Chapter starts at {:.0}s, audio {}", chapter_start, audio_path.display());

        let mut accepted: Vec<Segment> = Vec::new();
        let mut results = Vec::with_capacity(gaps.len());

        for gap in gaps {
            let status = self
                .repair_gap(&audio_path, chapter_start, gap, &document.segments, &mut accepted)
                .await;
            results.push(GapRepair {
                start_seconds: gap.start_seconds,
                end_seconds: gap.end_seconds,
                status,
            });
        }

        if accepted.is_empty() {
            let outcome = if results.iter().any(|r| r.status.produced_transcription()) {
                warn!("No new segments for {} chapter {}: all content already present", video_id, chapter_num);
                RepairOutcome::NoNewSegments
            } else {
                error!("No gap of {} chapter {} could be transcribed", video_id, chapter_num);
                RepairOutcome::TranscriptionFailed
            };
            return Ok(report(results, outcome));
        }

        let added = accepted.len();
        document.splice(accepted);
        let content = document.write_atomic(large_file)?;
        info!("Added {} segment(s) to {}", added, large_file.display());

        let anomalies = find_anomalies(&content);
        for anomaly in &anomalies {
            warn!(
                "Anomaly ({}) at line {} of {}: {}",
                anomaly.kind,
                anomaly.line,
                large_file.display(),
                anomaly.preview
            );
        }

        Ok(report(results, RepairOutcome::Fixed { added, anomalies }))
    }

    async fn repair_gap(
        &self,
        audio_path: &Path,
        chapter_start: f64,
        gap: &MissingSegment,
        existing: &[Segment],
        accepted: &mut Vec<Segment>,
    ) -> GapStatus {
        let gap_segment = Segment::new(gap.start_seconds, gap.end_seconds, gap.base_text.clone());
        if self.duplicates.duplicates_any(&gap_segment, existing) {
            info!(
                "Skipping gap {}-{}: already covered",
                format_mmss(gap.start_seconds),
                format_mmss(gap.end_seconds)
            );
            return GapStatus::AlreadyCovered;
        }

        let abs_start = chapter_start + gap.start_seconds;
        let abs_end = chapter_start + gap.end_seconds;
        let span = format!("{}-{}", format_mmss(abs_start), format_mmss(abs_end));

        let clip = match self.clipper.clip(audio_path, abs_start, abs_end).await {
            Ok(clip) => clip,
            Err(e) => {
                error!("Failed to clip audio for {}: {}", span, e);
                return GapStatus::ClipFailed { reason: e.to_string() };
            }
        };

        let transcript = match self
            .transcriber
            .transcribe_with_language(&clip, &self.language)
            .await
        {
            Ok(t) if !t.is_empty() => t,
            Ok(_) => {
                error!("Empty transcription for {}", span);
                return GapStatus::TranscriptionFailed {
                    reason: "empty transcription".to_string(),
                };
            }
            Err(e) => {
                error!("Failed to transcribe {}: {}", span, e);
                return GapStatus::TranscriptionFailed { reason: e.to_string() };
            }
        };

        let mut taken = 0;
        let mut duplicates = 0;
        for sub in transcript.non_empty_segments() {
            let candidate = Segment::new(
                gap.start_seconds + sub.start_seconds,
                gap.start_seconds + sub.end_seconds,
                sub.text.trim().to_string(),
            );

            if self
                .duplicates
                .duplicates_any(&candidate, existing.iter().chain(accepted.iter()))
            {
                debug!("Dropping duplicate segment at {}", candidate.timestamp_label);
                duplicates += 1;
            } else {
                accepted.push(candidate);
                taken += 1;
            }
        }

        debug!("Gap {}: {} new, {} duplicate", span, taken, duplicates);
        GapStatus::Transcribed {
            accepted: taken,
            duplicates,
        }
    }
}
