//! Coverage matching between a base-pass and an accurate-pass transcript.
//!
//! A base segment is *covered* when its content can be found in the accurate
//! pass. Timestamps of the two passes drift and wording differs slightly, so
//! coverage is decided by an ordered chain of fuzzy text heuristics; the
//! first strategy that reports a match wins.

mod strategies;

pub use strategies::{CrossSegmentPhrase, ReverseWordCoverage, SubstringContainment, WordSetOverlap};

use crate::config::MatchingSettings;
use crate::transcript::Segment;

/// Accurate-pass text, lower-cased once and shared by all strategies.
#[derive(Debug, Clone)]
pub struct AccurateText {
    /// Lower-cased text of each accurate segment.
    pub segments: Vec<String>,
    /// All segment texts joined with single spaces.
    pub combined: String,
}

impl AccurateText {
    pub fn new(texts: impl IntoIterator<Item = String>) -> Self {
        let segments: Vec<String> = texts.into_iter().map(|t| t.to_lowercase()).collect();
        let combined = segments.join(" ");
        Self { segments, combined }
    }

    pub fn from_segments(segments: &[Segment]) -> Self {
        Self::new(segments.iter().map(|s| s.text.clone()))
    }
}

/// A single coverage heuristic.
pub trait CoverageStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether `base` (lower-cased, trimmed) is covered by the accurate text.
    fn covers(&self, base: &str, accurate: &AccurateText) -> bool;
}

/// Outcome of checking one base segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Too short to judge; treated as covered.
    Trivial,
    /// Covered according to the named strategy.
    Covered(&'static str),
    Uncovered,
}

impl Coverage {
    pub fn is_covered(&self) -> bool {
        !matches!(self, Coverage::Uncovered)
    }
}

/// Ordered chain of coverage strategies.
pub struct CoverageMatcher {
    strategies: Vec<Box<dyn CoverageStrategy>>,
    min_text_chars: usize,
}

impl CoverageMatcher {
    /// Build the default chain: substring, reverse word coverage, word-set
    /// overlap, cross-segment phrase.
    pub fn from_settings(settings: &MatchingSettings) -> Self {
        Self {
            strategies: vec![
                Box::new(SubstringContainment),
                Box::new(ReverseWordCoverage {
                    min_word_chars: settings.reverse_min_word_chars,
                    threshold: settings.reverse_word_threshold,
                }),
                Box::new(WordSetOverlap {
                    min_word_chars: settings.set_min_word_chars,
                    threshold: settings.word_set_threshold,
                }),
                Box::new(CrossSegmentPhrase {
                    phrase_words: settings.phrase_words,
                }),
            ],
            min_text_chars: settings.min_text_chars,
        }
    }

    /// Build a matcher from an explicit strategy list.
    pub fn with_strategies(strategies: Vec<Box<dyn CoverageStrategy>>, min_text_chars: usize) -> Self {
        Self {
            strategies,
            min_text_chars,
        }
    }

    /// Check a single base text against the accurate pass.
    pub fn check(&self, base_text: &str, accurate: &AccurateText) -> Coverage {
        let base = base_text.to_lowercase();
        let base = base.trim();

        if base.chars().count() < self.min_text_chars {
            return Coverage::Trivial;
        }

        self.strategies
            .iter()
            .find(|s| s.covers(base, accurate))
            .map(|s| Coverage::Covered(s.name()))
            .unwrap_or(Coverage::Uncovered)
    }

    /// Indices of base segments not covered by the accurate pass.
    pub fn uncovered_indices(&self, base: &[Segment], accurate: &[Segment]) -> Vec<usize> {
        let accurate = AccurateText::from_segments(accurate);
        base.iter()
            .enumerate()
            .filter(|(_, seg)| !self.check(&seg.text, &accurate).is_covered())
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for CoverageMatcher {
    fn default() -> Self {
        Self::from_settings(&MatchingSettings::default())
    }
}
