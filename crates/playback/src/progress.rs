// Watch progress tracking
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::media::ClockSnapshot;

/// Metadata attached to every record of the opened media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressContext {
    pub source_id: String,
    pub title: String,
    pub episode_number: u32,
    pub poster: Option<String>,
    pub provider: Option<String>,
}

/// Continue-watching entry, keyed by `source_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub source_id: String,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// Dense ticks observed since the media was opened
    pub saved_at_tick: u64,
    pub saved_at: DateTime<Utc>,
    pub title: String,
    pub episode_number: u32,
    pub poster: Option<String>,
    pub provider: Option<String>,
}

impl ProgressRecord {
    pub fn progress(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn remaining_seconds(&self) -> f64 {
        (self.duration_seconds - self.position_seconds).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub record: ProgressRecord,
    /// The episode just crossed the completion threshold
    pub completion_due: bool,
}

/// Turns dense ticks into progress records and latches the completion push.
#[derive(Debug)]
pub struct ProgressTracker {
    context: Option<ProgressContext>,
    completion_threshold: f64,
    ticks: u64,
    completion_sent: bool,
}

impl ProgressTracker {
    pub fn new(completion_threshold_seconds: f64) -> Self {
        Self {
            context: None,
            completion_threshold: completion_threshold_seconds,
            ticks: 0,
            completion_sent: false,
        }
    }

    /// Start tracking newly opened media. Clears the completion latch.
    pub fn reset(&mut self, context: ProgressContext) {
        self.context = Some(context);
        self.ticks = 0;
        self.completion_sent = false;
    }

    pub fn clear(&mut self) {
        self.context = None;
        self.ticks = 0;
        self.completion_sent = false;
    }

    pub fn completion_sent(&self) -> bool {
        self.completion_sent
    }

    pub fn on_tick(
        &mut self,
        snapshot: &ClockSnapshot,
        completion_enabled: bool,
    ) -> Option<ProgressUpdate> {
        let context = self.context.as_ref()?;
        if !snapshot.is_playing {
            return None;
        }
        let Some(remaining) = snapshot.remaining() else {
            trace!(
                "Duration unavailable ({}), skipping progress tick",
                snapshot.duration
            );
            return None;
        };
        self.ticks += 1;

        let record = ProgressRecord {
            source_id: context.source_id.clone(),
            position_seconds: snapshot.position.clamp(0.0, snapshot.duration),
            duration_seconds: snapshot.duration,
            saved_at_tick: self.ticks,
            saved_at: Utc::now(),
            title: context.title.clone(),
            episode_number: context.episode_number,
            poster: context.poster.clone(),
            provider: context.provider.clone(),
        };

        let completion_due =
            completion_enabled && !self.completion_sent && remaining < self.completion_threshold;
        if completion_due {
            self.completion_sent = true;
            debug!(
                "{} has {:.0}s remaining, marking episode {} as watched",
                context.source_id, remaining, context.episode_number
            );
        }

        Some(ProgressUpdate {
            record,
            completion_due,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ProgressContext {
        ProgressContext {
            source_id: "show-ep3".to_string(),
            title: "Show".to_string(),
            episode_number: 3,
            poster: None,
            provider: Some("ExampleSite".to_string()),
        }
    }

    fn playing(position: f64, duration: f64) -> ClockSnapshot {
        ClockSnapshot {
            position,
            duration,
            rate: 1.0,
            is_playing: true,
        }
    }

    #[test]
    fn test_record_progress_in_unit_range() {
        let mut tracker = ProgressTracker::new(120.0);
        tracker.reset(context());

        let update = tracker.on_tick(&playing(300.0, 1200.0), false).unwrap();
        assert_eq!(update.record.progress(), 0.25);
        assert_eq!(update.record.remaining_seconds(), 900.0);
        assert_eq!(update.record.saved_at_tick, 1);
        assert!(!update.completion_due);

        let update = tracker.on_tick(&playing(1250.0, 1200.0), false).unwrap();
        assert_eq!(update.record.progress(), 1.0);
        assert_eq!(update.record.saved_at_tick, 2);
    }

    #[test]
    fn test_non_finite_duration_skipped() {
        let mut tracker = ProgressTracker::new(120.0);
        tracker.reset(context());

        assert!(tracker.on_tick(&playing(10.0, f64::NAN), true).is_none());
        assert!(tracker.on_tick(&playing(10.0, f64::INFINITY), true).is_none());
        assert!(tracker.on_tick(&playing(10.0, 0.0), true).is_none());
    }

    #[test]
    fn test_paused_or_unopened_skipped() {
        let mut tracker = ProgressTracker::new(120.0);
        assert!(tracker.on_tick(&playing(10.0, 100.0), true).is_none());

        tracker.reset(context());
        let paused = ClockSnapshot {
            is_playing: false,
            rate: 0.0,
            ..playing(10.0, 100.0)
        };
        assert!(tracker.on_tick(&paused, true).is_none());
    }

    #[test]
    fn test_completion_fires_once() {
        let mut tracker = ProgressTracker::new(120.0);
        tracker.reset(context());

        assert!(!tracker.on_tick(&playing(1000.0, 1200.0), true).unwrap().completion_due);
        assert!(tracker.on_tick(&playing(1100.0, 1200.0), true).unwrap().completion_due);
        assert!(!tracker.on_tick(&playing(1150.0, 1200.0), true).unwrap().completion_due);

        tracker.reset(context());
        assert!(tracker.on_tick(&playing(1150.0, 1200.0), true).unwrap().completion_due);
    }

    #[test]
    fn test_completion_respects_flag() {
        let mut tracker = ProgressTracker::new(120.0);
        tracker.reset(context());

        assert!(!tracker.on_tick(&playing(1150.0, 1200.0), false).unwrap().completion_due);
        assert!(!tracker.completion_sent());
    }
}
