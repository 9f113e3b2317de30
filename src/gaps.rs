//! Gap aggregation: uncovered base segments become merged, filtered gaps.

use crate::config::GapSettings;
use crate::coverage::CoverageMatcher;
use crate::transcript::{take_chars, Segment};
use serde::{Deserialize, Serialize};

/// Neighbouring text kept on each side of a gap for review.
const CONTEXT_CHARS: usize = 100;

/// A span of the base pass missing from the accurate pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub duration: f64,
    /// Base-pass text of the span; merged gaps are joined with spaces.
    pub base_text: String,
    pub context_before: Option<String>,
    pub context_after: Option<String>,
}

impl MissingSegment {
    /// Provisional gap for the uncovered base segment at `index`.
    pub fn from_base_segment(base: &[Segment], index: usize) -> Self {
        let seg = &base[index];
        let context = |i: usize| base.get(i).map(|s| take_chars(&s.text, CONTEXT_CHARS));

        Self {
            start_seconds: seg.start_seconds,
            end_seconds: seg.end_seconds,
            duration: seg.end_seconds - seg.start_seconds,
            base_text: seg.text.clone(),
            context_before: index.checked_sub(1).and_then(context),
            context_after: context(index + 1),
        }
    }

    fn absorb(&mut self, next: &MissingSegment) {
        self.end_seconds = self.end_seconds.max(next.end_seconds);
        self.duration = self.end_seconds - self.start_seconds;
        self.base_text.push(' ');
        self.base_text.push_str(&next.base_text);
        self.context_after = next.context_after.clone();
    }
}

/// Merges adjacent gaps and drops short ones.
#[derive(Debug, Clone, Copy)]
pub struct GapAggregator {
    /// A gap starting within this many seconds of the current gap's end is merged.
    pub merge_tolerance_seconds: f64,
    /// Merged gaps shorter than this are discarded.
    pub min_gap_seconds: f64,
}

impl GapAggregator {
    pub fn new(merge_tolerance_seconds: f64, min_gap_seconds: f64) -> Self {
        Self {
            merge_tolerance_seconds,
            min_gap_seconds,
        }
    }

    pub fn from_settings(settings: &GapSettings) -> Self {
        Self::new(settings.merge_tolerance_seconds, settings.min_gap_seconds)
    }

    /// Merge provisional gaps in input order, then apply the duration filter.
    pub fn aggregate(&self, provisional: &[MissingSegment]) -> Vec<MissingSegment> {
        let mut merged: Vec<MissingSegment> = Vec::new();

        for gap in provisional {
            match merged.last_mut() {
                Some(current)
                    if gap.start_seconds <= current.end_seconds + self.merge_tolerance_seconds =>
                {
                    current.absorb(gap);
                }
                _ => merged.push(gap.clone()),
            }
        }

        merged
            .into_iter()
            .filter(|g| g.duration >= self.min_gap_seconds)
            .collect()
    }
}

impl Default for GapAggregator {
    fn default() -> Self {
        Self::from_settings(&GapSettings::default())
    }
}

/// Find gaps where the base pass has content the accurate pass lacks.
pub fn find_gaps(
    base: &[Segment],
    accurate: &[Segment],
    matcher: &CoverageMatcher,
    aggregator: &GapAggregator,
) -> Vec<MissingSegment> {
    if base.is_empty() {
        return Vec::new();
    }

    let provisional: Vec<MissingSegment> = matcher
        .uncovered_indices(base, accurate)
        .into_iter()
        .map(|i| MissingSegment::from_base_segment(base, i))
        .collect();

    aggregator.aggregate(&provisional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::parse_transcript;

    fn gap(start: f64, end: f64, text: &str) -> MissingSegment {
        MissingSegment {
            start_seconds: start,
            end_seconds: end,
            duration: end - start,
            base_text: text.to_string(),
            context_before: Some(format!("before {}", text)),
            context_after: Some(format!("after {}", text)),
        }
    }

    #[test]
    fn test_adjacent_gaps_merge() {
        let aggregator = GapAggregator::new(2.0, 5.0);
        let gaps = aggregator.aggregate(&[gap(30.0, 33.0, "first"), gap(34.0, 38.0, "second")]);

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_seconds, 30.0);
        assert_eq!(gaps[0].end_seconds, 38.0);
        assert_eq!(gaps[0].duration, 8.0);
        assert_eq!(gaps[0].base_text, "first second");
        assert_eq!(gaps[0].context_before.as_deref(), Some("before first"));
        assert_eq!(gaps[0].context_after.as_deref(), Some("after second"));
    }

    #[test]
    fn test_merge_boundary_is_inclusive() {
        let aggregator = GapAggregator::new(2.0, 0.0);
        assert_eq!(aggregator.aggregate(&[gap(0.0, 3.0, "a"), gap(5.0, 9.0, "b")]).len(), 1);
        assert_eq!(aggregator.aggregate(&[gap(0.0, 3.0, "a"), gap(5.5, 9.0, "b")]).len(), 2);
    }

    #[test]
    fn test_merge_keeps_later_end() {
        let aggregator = GapAggregator::new(2.0, 0.0);
        let gaps = aggregator.aggregate(&[gap(0.0, 10.0, "long"), gap(4.0, 6.0, "inner")]);
        assert_eq!(gaps[0].end_seconds, 10.0);
        assert_eq!(gaps[0].duration, 10.0);
    }

    #[test]
    fn test_min_gap_filter() {
        let single = [gap(20.0, 23.0, "three seconds")];
        assert!(GapAggregator::new(2.0, 5.0).aggregate(&single).is_empty());
        assert_eq!(GapAggregator::new(2.0, 2.0).aggregate(&single).len(), 1);
    }

    #[test]
    fn test_filter_applies_after_merge() {
        let aggregator = GapAggregator::new(2.0, 5.0);
        let gaps = aggregator.aggregate(&[gap(0.0, 3.0, "a"), gap(4.0, 7.0, "b"), gap(50.0, 52.0, "c")]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].base_text, "a b");
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let aggregator = GapAggregator::default();
        let input = vec![
            gap(30.0, 33.0, "x"),
            gap(34.0, 38.0, "y"),
            gap(60.0, 61.0, "z"),
            gap(90.0, 99.0, "w"),
        ];
        let first = aggregator.aggregate(&input);
        let second = aggregator.aggregate(&input);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].start_seconds <= w[1].start_seconds));
    }

    #[test]
    fn test_context_from_neighbours() {
        let base = vec![
            Segment::new(0.0, 5.0, "a".repeat(150)),
            Segment::new(5.0, 10.0, "middle".to_string()),
        ];
        let first = MissingSegment::from_base_segment(&base, 0);
        assert!(first.context_before.is_none());
        assert_eq!(first.context_after.as_deref(), Some("middle"));

        let second = MissingSegment::from_base_segment(&base, 1);
        assert_eq!(second.context_before.map(|c| c.len()), Some(100));
        assert!(second.context_after.is_none());
    }

    #[test]
    fn test_scenario_trailing_segment() {
        let base = parse_transcript(
            "[00:10] hello world this is a test of the system\n[00:20] goodbye now friend\n",
        );
        let accurate = parse_transcript("[00:10] hello world this is a test\n");
        let matcher = CoverageMatcher::default();

        // Three words at 2.5 words/s gives a 1.2s gap, below the 5s default.
        let gaps = find_gaps(&base, &accurate, &matcher, &GapAggregator::default());
        assert!(gaps.is_empty());

        let gaps = find_gaps(&base, &accurate, &matcher, &GapAggregator::new(2.0, 1.0));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_seconds, 20.0);
        assert!((gaps[0].end_seconds - 21.2).abs() < 1e-9);
        assert_eq!(gaps[0].base_text, "goodbye now friend");
        assert_eq!(
            gaps[0].context_before.as_deref(),
            Some("hello world this is a test of the system")
        );
    }

    #[test]
    fn test_empty_base() {
        let gaps = find_gaps(&[], &[], &CoverageMatcher::default(), &GapAggregator::default());
        assert!(gaps.is_empty());
    }
}
