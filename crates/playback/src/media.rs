// Media primitive abstraction
//
// The platform player is owned elsewhere; the session only ever talks to it
// through this trait and learns about its clock by sampling.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;
use url::Url;

/// Resolves once a freshly loaded item can start playing.
///
/// The sender is dropped without a value when loading fails.
pub type ReadySignal = oneshot::Receiver<()>;

/// Handle for a tick observation registered with the primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationToken(pub u64);

pub trait MediaPlayer: Send + Sync {
    /// Replace the current item with `url`.
    fn load(&self, url: &Url) -> ReadySignal;

    fn play(&self);

    fn pause(&self);

    fn seek(&self, seconds: f64);

    fn set_rate(&self, rate: f32);

    /// Current rate; `0.0` while paused.
    fn rate(&self) -> f32;

    fn current_position(&self) -> f64;

    /// Item duration. NaN or infinite while unknown.
    fn duration(&self) -> f64;

    /// Register a periodic time observation. Every token must be released.
    fn observe_ticks(&self, interval: Duration) -> ObservationToken;

    fn release_observation(&self, token: ObservationToken);

    /// Returns whether picture-in-picture became active.
    fn enter_picture_in_picture(&self) -> bool;

    fn exit_picture_in_picture(&self);
}

/// One observed reading of the media clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSnapshot {
    pub position: f64,
    pub duration: f64,
    pub rate: f32,
    pub is_playing: bool,
}

impl Default for ClockSnapshot {
    fn default() -> Self {
        Self {
            position: 0.0,
            duration: f64::NAN,
            rate: 0.0,
            is_playing: false,
        }
    }
}

impl ClockSnapshot {
    pub fn sample(player: &dyn MediaPlayer) -> Self {
        let rate = player.rate();
        Self {
            position: player.current_position(),
            duration: player.duration(),
            rate,
            is_playing: rate != 0.0,
        }
    }

    pub fn has_known_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Fraction played in `[0, 1]`, `None` while the duration is unknown.
    pub fn progress(&self) -> Option<f64> {
        self.has_known_duration()
            .then(|| (self.position / self.duration).clamp(0.0, 1.0))
    }

    pub fn remaining(&self) -> Option<f64> {
        self.has_known_duration()
            .then(|| (self.duration - self.position).max(0.0))
    }
}

/// Owns an observation token and releases it when dropped.
pub struct ObservationGuard {
    player: Arc<dyn MediaPlayer>,
    token: Option<ObservationToken>,
}

impl ObservationGuard {
    pub fn acquire(player: Arc<dyn MediaPlayer>, interval: Duration) -> Self {
        let token = player.observe_ticks(interval);
        trace!("Registered clock observation {:?}", token);
        Self {
            player,
            token: Some(token),
        }
    }

    pub fn token(&self) -> Option<ObservationToken> {
        self.token
    }

    pub fn player(&self) -> &Arc<dyn MediaPlayer> {
        &self.player
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(token) = self.token.take() {
            self.player.release_observation(token);
            trace!("Released clock observation {:?}", token);
        }
    }
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for ObservationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationGuard")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlayer;

    #[test]
    fn test_snapshot_progress() {
        let snapshot = ClockSnapshot {
            position: 30.0,
            duration: 120.0,
            rate: 1.0,
            is_playing: true,
        };
        assert_eq!(snapshot.progress(), Some(0.25));
        assert_eq!(snapshot.remaining(), Some(90.0));
    }

    #[test]
    fn test_snapshot_unknown_duration() {
        let snapshot = ClockSnapshot {
            duration: f64::INFINITY,
            ..ClockSnapshot::default()
        };
        assert_eq!(snapshot.progress(), None);
        assert_eq!(ClockSnapshot::default().remaining(), None);
    }

    #[test]
    fn test_progress_clamped_past_end() {
        let snapshot = ClockSnapshot {
            position: 130.0,
            duration: 120.0,
            rate: 1.0,
            is_playing: true,
        };
        assert_eq!(snapshot.progress(), Some(1.0));
        assert_eq!(snapshot.remaining(), Some(0.0));
    }

    #[test]
    fn test_guard_releases_once() {
        let player = Arc::new(FakePlayer::new());
        let guard = ObservationGuard::acquire(player.clone(), Duration::from_millis(500));
        assert_eq!(player.active_observations(), 1);

        guard.release();
        assert_eq!(player.active_observations(), 0);
        assert_eq!(player.released_observations(), 1);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let player = Arc::new(FakePlayer::new());
        {
            let _guard = ObservationGuard::acquire(player.clone(), Duration::from_secs(1));
            assert_eq!(player.active_observations(), 1);
        }
        assert_eq!(player.active_observations(), 0);
    }
}
