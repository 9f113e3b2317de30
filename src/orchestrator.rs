//! Pipeline orchestrator for gapfill.
//!
//! Drives locate, parse, match and aggregate for each selected chapter, and
//! the optional repair pass over chapters that have gaps.

use crate::audio::FfmpegClipper;
use crate::config::Settings;
use crate::coverage::CoverageMatcher;
use crate::error::{GapfillError, Result};
use crate::gaps::{find_gaps, GapAggregator};
use crate::locator::Locator;
use crate::repair::RepairPipeline;
use crate::report::{ChapterResult, RepairEntry};
use crate::transcript::parse_transcript_file;
use crate::transcription::WhisperTranscriber;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Which chapters to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every chapter of every video present in both directories.
    All,
    /// One video; all of its shared chapters unless `chapter` is given.
    Video { video_id: String, chapter: Option<u32> },
}

/// The main orchestrator for the comparison pipeline.
pub struct Orchestrator {
    settings: Settings,
    locator: Locator,
    matcher: CoverageMatcher,
    aggregator: GapAggregator,
}

impl Orchestrator {
    /// Create an orchestrator from settings (paths already overridden).
    pub fn new(settings: Settings) -> Self {
        let locator = Locator::new(
            settings.base_dir(),
            settings.large_dir(),
            settings.locator.range_tolerance_seconds,
        );
        let matcher = CoverageMatcher::from_settings(&settings.matching);
        let aggregator = GapAggregator::from_settings(&settings.gaps);

        Self {
            settings,
            locator,
            matcher,
            aggregator,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Fail if either transcript directory is missing.
    pub fn check_directories(&self) -> Result<()> {
        let check = |label: &'static str, dir: &Path| {
            if dir.is_dir() {
                Ok(())
            } else {
                Err(GapfillError::DirectoryNotFound(label, dir.display().to_string()))
            }
        };
        check("Base", self.locator.base_dir())?;
        check("Large", self.locator.large_dir())
    }

    /// Resolve a selection to `(video_id, chapter_num)` targets.
    pub fn select_targets(&self, selection: &Selection) -> Result<Vec<(String, u32)>> {
        match selection {
            Selection::All => {
                let mut targets = Vec::new();
                for video_id in self.locator.find_all_video_ids()? {
                    for chapter in self.locator.find_chapter_numbers(&video_id)? {
                        targets.push((video_id.clone(), chapter));
                    }
                }
                Ok(targets)
            }
            Selection::Video {
                video_id,
                chapter: Some(chapter),
            } => Ok(vec![(video_id.clone(), *chapter)]),
            Selection::Video {
                video_id,
                chapter: None,
            } => Ok(self
                .locator
                .find_chapter_numbers(video_id)?
                .into_iter()
                .map(|c| (video_id.clone(), c))
                .collect()),
        }
    }

    /// Compare one chapter. Errors are recorded in the result.
    #[instrument(skip(self))]
    pub fn compare_chapter(&self, video_id: &str, chapter_num: u32) -> ChapterResult {
        match self.try_compare_chapter(video_id, chapter_num) {
            Ok(result) => result,
            Err(e) => {
                warn!("{} chapter {}: {}", video_id, chapter_num, e);
                ChapterResult::failed(video_id, chapter_num, &e)
            }
        }
    }

    fn try_compare_chapter(&self, video_id: &str, chapter_num: u32) -> Result<ChapterResult> {
        let pair = self.locator.locate(video_id, chapter_num)?;

        let parse = |side: &'static str, path: &Path| -> Result<_> {
            let segments = parse_transcript_file(path)?;
            if segments.is_empty() {
                return Err(GapfillError::ParseFailed {
                    side,
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                });
            }
            Ok(segments)
        };

        let base = parse("base", &pair.base_file)?;
        let large = parse("large", &pair.large_file)?;

        let gaps = find_gaps(&base, &large, &self.matcher, &self.aggregator);
        debug!(
            "{} chapter {}: {} base, {} large segments, {} gap(s)",
            video_id,
            chapter_num,
            base.len(),
            large.len(),
            gaps.len()
        );

        Ok(ChapterResult::compared(&pair, base.len(), large.len(), gaps))
    }

    /// Compare each target in order.
    pub fn compare_all(&self, targets: &[(String, u32)]) -> Vec<ChapterResult> {
        targets
            .iter()
            .map(|(video_id, chapter)| self.compare_chapter(video_id, *chapter))
            .collect()
    }

    /// Build the production repair pipeline (Whisper and ffmpeg).
    pub fn repair_pipeline(&self) -> Result<RepairPipeline> {
        let transcriber = WhisperTranscriber::with_model(&self.settings.transcription.model)?;
        let clipper = FfmpegClipper::new(self.settings.temp_dir());

        Ok(RepairPipeline::new(
            Arc::new(transcriber),
            Arc::new(clipper),
            self.settings.audio_dir(),
            &self.settings.repair,
        ))
    }

    /// Repair every chapter with gaps, one at a time.
    pub async fn repair(&self, results: &[ChapterResult], pipeline: &RepairPipeline) -> Vec<RepairEntry> {
        let mut entries = Vec::new();

        for result in results.iter().filter(|r| r.has_gaps()) {
            let Some(large_file) = &result.large_file else {
                continue;
            };

            info!(
                "Fixing {} chapter {}: {} gap(s)",
                result.video_id,
                result.chapter_num,
                result.missing_segments.len()
            );

            let entry = match pipeline
                .repair_chapter(
                    &result.video_id,
                    result.chapter_num,
                    large_file,
                    &result.missing_segments,
                )
                .await
            {
                Ok(report) => RepairEntry::Attempted(report),
                Err(e) => {
                    warn!("Skipping {} chapter {}: {}", result.video_id, result.chapter_num, e);
                    RepairEntry::Skipped {
                        video_id: result.video_id.clone(),
                        chapter_num: result.chapter_num,
                        error: e.to_string(),
                    }
                }
            };
            entries.push(entry);
        }

        entries
    }
}
