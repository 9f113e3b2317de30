//! Locating base/accurate transcript file pairs for a chapter.
//!
//! Transcript files are named `{video_id}_chapter{N}_{title}.txt`. Formatted
//! variants (`*_formatted.txt`) are ignored. Chapter numbering sometimes
//! drifts between the two passes, so the declared time ranges in the file
//! headers are used to confirm or correct a chapter-number match.

use crate::error::{GapfillError, Result};
use crate::transcript::{read_declared_range, TimeRange};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FORMATTED_SUFFIX: &str = "_formatted.txt";
const CHAPTER_MARKER: &str = "_chapter";

/// How the accurate-pass file of a pair was selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Same chapter number, declared ranges agree.
    ChapterNumber,
    /// Chapter numbers disagreed; matched on declared time range instead.
    TimeRange,
    /// No file matched the base range; the chapter-number match is used anyway.
    MismatchedChapterNumber { base: TimeRange, large: TimeRange },
}

/// A resolved base/accurate transcript pair for one chapter.
#[derive(Debug, Clone)]
pub struct ChapterFilePair {
    pub video_id: String,
    pub chapter_num: u32,
    pub base_file: PathBuf,
    pub large_file: PathBuf,
    pub match_kind: MatchKind,
}

/// Finds transcript file pairs within a base and an accurate directory.
#[derive(Debug, Clone)]
pub struct Locator {
    base_dir: PathBuf,
    large_dir: PathBuf,
    range_tolerance_seconds: f64,
}

impl Locator {
    pub fn new(base_dir: PathBuf, large_dir: PathBuf, range_tolerance_seconds: f64) -> Self {
        Self {
            base_dir,
            large_dir,
            range_tolerance_seconds,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn large_dir(&self) -> &Path {
        &self.large_dir
    }

    /// Resolve the file pair for `(video_id, chapter_num)`.
    pub fn locate(&self, video_id: &str, chapter_num: u32) -> Result<ChapterFilePair> {
        let chapter_prefix = format!("{}{}{}_", video_id, CHAPTER_MARKER, chapter_num);

        let base_file = transcript_files(&self.base_dir, &chapter_prefix)?
            .into_iter()
            .next()
            .ok_or(GapfillError::BaseTranscriptNotFound(chapter_num))?;
        let base_range = declared_or_zero(&base_file)?;

        let by_chapter = transcript_files(&self.large_dir, &chapter_prefix)?
            .into_iter()
            .next();

        let pair = |large_file: PathBuf, match_kind: MatchKind| ChapterFilePair {
            video_id: video_id.to_string(),
            chapter_num,
            base_file: base_file.clone(),
            large_file,
            match_kind,
        };

        let mut chapter_range = None;
        if let Some(large_file) = &by_chapter {
            let large_range = declared_or_zero(large_file)?;
            if base_range.matches(&large_range, self.range_tolerance_seconds) {
                return Ok(pair(large_file.clone(), MatchKind::ChapterNumber));
            }
            warn!(
                "Chapter {} time mismatch for {}: base {:.0}-{:.0}s, large {:.0}-{:.0}s; searching by time range",
                chapter_num, video_id, base_range.start, base_range.end, large_range.start, large_range.end
            );
            chapter_range = Some(large_range);
        }

        let video_prefix = format!("{}{}", video_id, CHAPTER_MARKER);
        for candidate in transcript_files(&self.large_dir, &video_prefix)? {
            let range = declared_or_zero(&candidate)?;
            if base_range.matches(&range, self.range_tolerance_seconds) {
                debug!("Matched chapter {} by time range: {}", chapter_num, candidate.display());
                return Ok(pair(candidate, MatchKind::TimeRange));
            }
        }

        match (by_chapter, chapter_range) {
            (Some(large_file), Some(large)) => Ok(pair(
                large_file,
                MatchKind::MismatchedChapterNumber {
                    base: base_range,
                    large,
                },
            )),
            _ => Err(GapfillError::LargeTranscriptNotFound(chapter_num)),
        }
    }

    /// Video IDs with transcripts in both directories, sorted.
    pub fn find_all_video_ids(&self) -> Result<Vec<String>> {
        let ids = |dir: &Path| -> Result<BTreeSet<String>> {
            Ok(transcript_files(dir, "")?
                .iter()
                .filter_map(|p| file_name(p))
                .filter_map(|name| name.split_once(CHAPTER_MARKER).map(|(id, _)| id.to_string()))
                .collect())
        };

        let base = ids(&self.base_dir)?;
        let large = ids(&self.large_dir)?;
        Ok(base.intersection(&large).cloned().collect())
    }

    /// Chapter numbers of `video_id` present in both directories, sorted.
    pub fn find_chapter_numbers(&self, video_id: &str) -> Result<Vec<u32>> {
        let pattern = Regex::new(&format!(r"^{}_chapter(\d+)_", regex::escape(video_id)))
            .map_err(|e| GapfillError::InvalidInput(e.to_string()))?;
        let prefix = format!("{}{}", video_id, CHAPTER_MARKER);

        let chapters = |dir: &Path| -> Result<BTreeSet<u32>> {
            Ok(transcript_files(dir, &prefix)?
                .iter()
                .filter_map(|p| file_name(p))
                .filter_map(|name| pattern.captures(name)?.get(1)?.as_str().parse().ok())
                .collect())
        };

        let base = chapters(&self.base_dir)?;
        let large = chapters(&self.large_dir)?;
        Ok(base.intersection(&large).copied().collect())
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn declared_or_zero(path: &Path) -> Result<TimeRange> {
    Ok(read_declared_range(path)?.unwrap_or_default())
}

/// Unformatted `.txt` transcripts in `dir` whose names start with `prefix`
/// and contain a chapter marker, sorted by file name.
fn transcript_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            file_name(p).is_some_and(|name| {
                name.starts_with(prefix)
                    && name.contains(CHAPTER_MARKER)
                    && name.ends_with(".txt")
                    && !name.ends_with(FORMATTED_SUFFIX)
            })
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, range: &str) {
        let content = format!(
            "Chapter 1: Test\nVideo: Test\nTime: {}\nModel: base\n=====\n\n[00:00] some text here\n",
            range
        );
        std::fs::write(dir.join(name), content).unwrap();
    }

    struct Dirs {
        _root: tempfile::TempDir,
        base: PathBuf,
        large: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("base");
        let large = root.path().join("large");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::create_dir_all(&large).unwrap();
        Dirs { _root: root, base, large }
    }

    fn locator(d: &Dirs) -> Locator {
        Locator::new(d.base.clone(), d.large.clone(), 5.0)
    }

    #[test]
    fn test_chapter_number_match() {
        let d = dirs();
        write(&d.base, "abc_chapter1_intro.txt", "00:00 - 02:00");
        write(&d.base, "abc_chapter1_intro_formatted.txt", "00:00 - 02:00");
        write(&d.large, "abc_chapter1_intro.txt", "00:03 - 02:04");

        let pair = locator(&d).locate("abc", 1).unwrap();
        assert_eq!(pair.match_kind, MatchKind::ChapterNumber);
        assert!(pair.base_file.ends_with("abc_chapter1_intro.txt"));
    }

    #[test]
    fn test_chapter_prefix_does_not_match_longer_number() {
        let d = dirs();
        write(&d.base, "abc_chapter12_later.txt", "00:00 - 02:00");
        write(&d.large, "abc_chapter12_later.txt", "00:00 - 02:00");

        let err = locator(&d).locate("abc", 1).unwrap_err();
        assert!(matches!(err, GapfillError::BaseTranscriptNotFound(1)));
    }

    #[test]
    fn test_rematch_by_time_range() {
        let d = dirs();
        write(&d.base, "abc_chapter2_order.txt", "02:00 - 04:00");
        write(&d.large, "abc_chapter2_pay.txt", "04:00 - 06:00");
        write(&d.large, "abc_chapter3_order.txt", "02:01 - 03:58");

        let pair = locator(&d).locate("abc", 2).unwrap();
        assert_eq!(pair.match_kind, MatchKind::TimeRange);
        assert!(pair.large_file.ends_with("abc_chapter3_order.txt"));
    }

    #[test]
    fn test_mismatch_falls_back_to_chapter_number() {
        let d = dirs();
        write(&d.base, "abc_chapter2_order.txt", "02:00 - 04:00");
        write(&d.large, "abc_chapter2_pay.txt", "04:00 - 06:00");

        let pair = locator(&d).locate("abc", 2).unwrap();
        assert!(matches!(pair.match_kind, MatchKind::MismatchedChapterNumber { .. }));
        assert!(pair.large_file.ends_with("abc_chapter2_pay.txt"));
    }

    #[test]
    fn test_range_search_ignores_other_videos() {
        let d = dirs();
        write(&d.base, "abc_chapter2_order.txt", "02:00 - 04:00");
        write(&d.large, "xyz_chapter5_other.txt", "02:00 - 04:00");

        let err = locator(&d).locate("abc", 2).unwrap_err();
        assert!(matches!(err, GapfillError::LargeTranscriptNotFound(2)));
    }

    #[test]
    fn test_missing_sides_are_distinct() {
        let d = dirs();
        write(&d.large, "abc_chapter1_intro.txt", "00:00 - 02:00");
        let err = locator(&d).locate("abc", 1).unwrap_err();
        assert_eq!(err.to_string(), "Base model transcript not found for chapter 1");

        write(&d.base, "abc_chapter4_end.txt", "09:00 - 10:00");
        let err = locator(&d).locate("abc", 4).unwrap_err();
        assert_eq!(err.to_string(), "Large model transcript not found for chapter 4");
    }

    #[test]
    fn test_find_video_ids_and_chapters() {
        let d = dirs();
        write(&d.base, "abc_chapter1_a.txt", "00:00 - 01:00");
        write(&d.base, "abc_chapter2_b.txt", "01:00 - 02:00");
        write(&d.base, "abc_chapter3_c.txt", "02:00 - 03:00");
        write(&d.base, "onlybase_chapter1_a.txt", "00:00 - 01:00");
        write(&d.large, "abc_chapter1_a.txt", "00:00 - 01:00");
        write(&d.large, "abc_chapter3_c.txt", "02:00 - 03:00");
        write(&d.large, "abc_chapter2_b_formatted.txt", "01:00 - 02:00");
        std::fs::write(d.large.join("notes.txt"), "x").unwrap();

        let loc = locator(&d);
        assert_eq!(loc.find_all_video_ids().unwrap(), vec!["abc".to_string()]);
        assert_eq!(loc.find_chapter_numbers("abc").unwrap(), vec![1, 3]);
    }
}
