// Skip interval bookkeeping for one opened media
use std::collections::HashSet;

use skip_times::{SkipInterval, SkipKind};

use super::state::{SkipMarker, VisibleSkip};

/// Result of checking the skip intervals against a position
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SkipEvaluation {
    /// Auto-skip target, if an interval was just auto-skipped
    pub seek_to: Option<f64>,
    pub visible: Vec<VisibleSkip>,
}

#[derive(Debug, Default)]
pub struct SkipController {
    intervals: Vec<SkipInterval>,
    /// Intervals auto-skipped since the media was opened
    auto_skipped: HashSet<usize>,
    /// Intervals manually skipped in the current visible window
    manual_skipped: HashSet<usize>,
    voted: bool,
}

impl SkipController {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn load(&mut self, intervals: Vec<SkipInterval>) {
        self.intervals = intervals;
        self.auto_skipped.clear();
        self.manual_skipped.clear();
    }

    pub fn intervals(&self) -> &[SkipInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn evaluate(
        &mut self,
        position: f64,
        auto_skip: impl Fn(SkipKind) -> bool,
    ) -> SkipEvaluation {
        let mut evaluation = SkipEvaluation::default();
        for (index, interval) in self.intervals.iter().enumerate() {
            if !interval.contains(position) {
                // leaving the window re-arms the manual skip
                self.manual_skipped.remove(&index);
                continue;
            }

            if evaluation.seek_to.is_none()
                && auto_skip(interval.kind)
                && self.auto_skipped.insert(index)
            {
                evaluation.seek_to = Some(interval.end_seconds);
                continue;
            }

            if !self.manual_skipped.contains(&index) {
                evaluation.visible.push(VisibleSkip {
                    index,
                    kind: interval.kind,
                });
            }
        }
        evaluation
    }

    /// Seek target for a manual skip, offered only inside the interval and
    /// once per visible window.
    pub fn manual_skip(&mut self, index: usize, position: f64) -> Option<f64> {
        let interval = self.intervals.get(index)?;
        if !interval.contains(position) || !self.manual_skipped.insert(index) {
            return None;
        }
        Some(interval.end_seconds)
    }

    pub fn markers(&self, duration: f64) -> Vec<SkipMarker> {
        if !(duration.is_finite() && duration > 0.0) {
            return Vec::new();
        }
        self.intervals
            .iter()
            .map(|interval| SkipMarker {
                kind: interval.kind,
                start_fraction: (interval.start_seconds / duration).clamp(0.0, 1.0),
                end_fraction: (interval.end_seconds / duration).clamp(0.0, 1.0),
            })
            .collect()
    }

    pub fn can_vote(&self) -> bool {
        !self.voted && !self.intervals.is_empty()
    }

    /// Skip ids to vote on. Returns `None` once a vote was taken.
    pub fn take_vote(&mut self) -> Option<Vec<String>> {
        if !self.can_vote() {
            return None;
        }
        self.voted = true;
        Some(self.intervals.iter().map(|i| i.skip_id.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::interval;

    fn controller() -> SkipController {
        let mut skips = SkipController::default();
        skips.load(vec![
            interval(SkipKind::Intro, 30.0, 90.0, "op"),
            interval(SkipKind::Outro, 1300.0, 1390.0, "ed"),
        ]);
        skips
    }

    #[test]
    fn test_auto_skip_once_even_after_seeking_back() {
        let mut skips = controller();
        let eval = skips.evaluate(40.0, |kind| kind == SkipKind::Intro);
        assert_eq!(eval.seek_to, Some(90.0));
        assert!(eval.visible.is_empty());

        let eval = skips.evaluate(35.0, |kind| kind == SkipKind::Intro);
        assert_eq!(eval.seek_to, None);
        assert_eq!(
            eval.visible,
            vec![VisibleSkip {
                index: 0,
                kind: SkipKind::Intro
            }]
        );
    }

    #[test]
    fn test_auto_skip_respects_kind_flag() {
        let mut skips = controller();
        let eval = skips.evaluate(40.0, |kind| kind == SkipKind::Outro);
        assert_eq!(eval.seek_to, None);
        assert_eq!(eval.visible.len(), 1);

        let eval = skips.evaluate(1310.0, |kind| kind == SkipKind::Outro);
        assert_eq!(eval.seek_to, Some(1390.0));
    }

    #[test]
    fn test_manual_skip_inside_window_only() {
        let mut skips = controller();
        assert_eq!(skips.manual_skip(0, 10.0), None);
        assert_eq!(skips.manual_skip(0, 30.0), Some(90.0));
        assert_eq!(skips.manual_skip(0, 31.0), None);
        assert_eq!(skips.manual_skip(5, 31.0), None);
    }

    #[test]
    fn test_manual_skip_rearmed_after_leaving_window() {
        let mut skips = controller();
        assert_eq!(skips.manual_skip(0, 45.0), Some(90.0));
        assert!(skips.evaluate(50.0, |_| false).visible.is_empty());

        skips.evaluate(95.0, |_| false);
        assert_eq!(skips.evaluate(50.0, |_| false).visible.len(), 1);
        assert_eq!(skips.manual_skip(0, 50.0), Some(90.0));
    }

    #[test]
    fn test_markers_as_fractions() {
        let skips = controller();
        let markers = skips.markers(1400.0);
        assert_eq!(markers.len(), 2);
        assert!((markers[0].start_fraction - 30.0 / 1400.0).abs() < 1e-9);
        assert!(skips.markers(f64::NAN).is_empty());
    }

    #[test]
    fn test_vote_taken_once() {
        let mut skips = controller();
        assert_eq!(
            skips.take_vote(),
            Some(vec!["op".to_string(), "ed".to_string()])
        );
        assert_eq!(skips.take_vote(), None);

        skips.reset();
        assert_eq!(skips.take_vote(), None);
    }
}
