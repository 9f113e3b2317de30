//! Individual coverage heuristics.

use super::{AccurateText, CoverageStrategy};
use std::collections::HashSet;

/// Words of `text` longer than `min_chars` characters.
fn long_words(text: &str, min_chars: usize) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(move |w| w.chars().count() > min_chars)
}

/// Base text appears verbatim inside one accurate segment.
pub struct SubstringContainment;

impl CoverageStrategy for SubstringContainment {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn covers(&self, base: &str, accurate: &AccurateText) -> bool {
        accurate.segments.iter().any(|seg| seg.contains(base))
    }
}

/// Most of the base text's longer words occur inside one accurate segment.
///
/// Words are matched as substrings, so inflections and attached
/// punctuation still count.
pub struct ReverseWordCoverage {
    pub min_word_chars: usize,
    pub threshold: f64,
}

impl CoverageStrategy for ReverseWordCoverage {
    fn name(&self) -> &'static str {
        "reverse_word_coverage"
    }

    fn covers(&self, base: &str, accurate: &AccurateText) -> bool {
        let words: Vec<&str> = long_words(base, self.min_word_chars).collect();
        if words.is_empty() {
            return false;
        }

        accurate.segments.iter().any(|seg| {
            let found = words.iter().filter(|w| seg.contains(*w)).count();
            found as f64 / words.len() as f64 >= self.threshold
        })
    }
}

/// The base text's word set largely overlaps one accurate segment's word set.
pub struct WordSetOverlap {
    pub min_word_chars: usize,
    pub threshold: f64,
}

impl CoverageStrategy for WordSetOverlap {
    fn name(&self) -> &'static str {
        "word_set_overlap"
    }

    fn covers(&self, base: &str, accurate: &AccurateText) -> bool {
        let base_set: HashSet<&str> = long_words(base, self.min_word_chars).collect();
        if base_set.is_empty() {
            return false;
        }

        accurate.segments.iter().any(|seg| {
            let seg_set: HashSet<&str> = long_words(seg, self.min_word_chars).collect();
            let common = base_set.intersection(&seg_set).count();
            common as f64 / base_set.len() as f64 >= self.threshold
        })
    }
}

/// Some short phrase of the base text appears in the joined accurate text.
///
/// Catches content the accurate pass split across segment boundaries.
pub struct CrossSegmentPhrase {
    pub phrase_words: usize,
}

impl CoverageStrategy for CrossSegmentPhrase {
    fn name(&self) -> &'static str {
        "cross_segment_phrase"
    }

    fn covers(&self, base: &str, accurate: &AccurateText) -> bool {
        let words: Vec<&str> = base.split_whitespace().collect();
        if self.phrase_words == 0 || words.len() < self.phrase_words {
            return false;
        }

        words
            .windows(self.phrase_words)
            .any(|phrase| accurate.combined.contains(&phrase.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accurate(texts: &[&str]) -> AccurateText {
        AccurateText::new(texts.iter().map(|t| t.to_string()))
    }

    #[test]
    fn test_substring() {
        let acc = accurate(&["so hello world this is a test of the system"]);
        assert!(SubstringContainment.covers("hello world", &acc));
        assert!(!SubstringContainment.covers("goodbye world", &acc));
    }

    #[test]
    fn test_reverse_word_coverage_threshold() {
        let strategy = ReverseWordCoverage { min_word_chars: 3, threshold: 0.7 };
        let acc = accurate(&["hello world this is a test"]);
        // hello, world, test found; system missing: 3/4 = 0.75.
        assert!(strategy.covers("hello world this is a test of the system", &acc));
        // hello found; goodbye, friend, system missing: 1/4.
        assert!(!strategy.covers("hello goodbye friend system", &acc));
    }

    #[test]
    fn test_reverse_word_coverage_matches_substrings() {
        let strategy = ReverseWordCoverage { min_word_chars: 3, threshold: 0.7 };
        let acc = accurate(&["the weather's lovely today"]);
        assert!(strategy.covers("weather lovely today", &acc));
    }

    #[test]
    fn test_reverse_word_coverage_needs_long_words() {
        let strategy = ReverseWordCoverage { min_word_chars: 3, threshold: 0.7 };
        let acc = accurate(&["a b c"]);
        assert!(!strategy.covers("a an the of", &acc));
    }

    #[test]
    fn test_word_set_overlap() {
        let strategy = WordSetOverlap { min_word_chars: 2, threshold: 0.8 };
        let acc = accurate(&["you can pay by card or cash here"]);
        // pay, card, cash, here: 4/5 with "now" missing.
        assert!(strategy.covers("pay card cash here now", &acc));
        assert!(!strategy.covers("pay card cash now later", &acc));
    }

    #[test]
    fn test_word_set_overlap_is_whole_word() {
        let strategy = WordSetOverlap { min_word_chars: 2, threshold: 0.8 };
        let acc = accurate(&["the weather's lovely today"]);
        assert!(!strategy.covers("weather lovely", &acc));
    }

    #[test]
    fn test_cross_segment_phrase() {
        let strategy = CrossSegmentPhrase { phrase_words: 3 };
        let acc = accurate(&["could you tell me", "where the station is"]);
        assert!(strategy.covers("please tell me where it is", &acc));
        assert!(!strategy.covers("tell us where", &acc));
        assert!(!strategy.covers("tell me", &acc));
    }
}
