// Simulated media primitive driven by the tokio clock
use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;
use playback_engine::{MediaPlayer, ObservationToken, ReadySignal};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

#[derive(Debug)]
struct ClockState {
    source: Option<Url>,
    /// Media position when the clock was last re-anchored
    base_position: f64,
    anchored_at: Instant,
    rate: f32,
    picture_in_picture: bool,
    next_token: u64,
    observations: HashSet<u64>,
}

impl ClockState {
    fn position(&self, duration: f64, time_scale: f64) -> f64 {
        if self.source.is_none() {
            return 0.0;
        }
        let elapsed = self.anchored_at.elapsed().as_secs_f64();
        let position = self.base_position + elapsed * f64::from(self.rate) * time_scale;
        position.clamp(0.0, duration)
    }

    fn reanchor(&mut self, position: f64) {
        self.base_position = position;
        self.anchored_at = Instant::now();
    }
}

/// Media player whose position advances with the tokio clock.
///
/// `time_scale` media seconds elapse per clock second at rate 1.0, so a full
/// episode can be replayed in a short run. Loads complete immediately.
#[derive(Debug)]
pub struct SimulatedPlayer {
    duration: f64,
    time_scale: f64,
    state: Mutex<ClockState>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64, time_scale: f64) -> Self {
        Self {
            duration,
            time_scale: time_scale.max(f64::EPSILON),
            state: Mutex::new(ClockState {
                source: None,
                base_position: 0.0,
                anchored_at: Instant::now(),
                rate: 0.0,
                picture_in_picture: false,
                next_token: 0,
                observations: HashSet::new(),
            }),
        }
    }

    /// The clock reached the end of the media while playing.
    pub fn at_end(&self) -> bool {
        let state = self.state.lock();
        state.rate > 0.0 && state.position(self.duration, self.time_scale) >= self.duration
    }

    pub fn source(&self) -> Option<Url> {
        self.state.lock().source.clone()
    }

    pub fn active_observations(&self) -> usize {
        self.state.lock().observations.len()
    }

    /// Wall-clock time until the media ends at the current rate.
    pub fn time_to_end(&self) -> Option<Duration> {
        let state = self.state.lock();
        if state.rate <= 0.0 || state.source.is_none() {
            return None;
        }
        let remaining = self.duration - state.position(self.duration, self.time_scale);
        let per_second = f64::from(state.rate) * self.time_scale;
        Some(Duration::from_secs_f64((remaining / per_second).max(0.0)))
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn load(&self, url: &Url) -> ReadySignal {
        let mut state = self.state.lock();
        debug!("Loading simulated source {}", url);
        state.source = Some(url.clone());
        state.rate = 0.0;
        state.reanchor(0.0);

        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        rx
    }

    fn play(&self) {
        let mut state = self.state.lock();
        let position = state.position(self.duration, self.time_scale);
        state.reanchor(position);
        if state.rate == 0.0 {
            state.rate = 1.0;
        }
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        let position = state.position(self.duration, self.time_scale);
        state.reanchor(position);
        state.rate = 0.0;
    }

    fn seek(&self, seconds: f64) {
        let mut state = self.state.lock();
        trace!("Simulated seek to {:.1}", seconds);
        state.reanchor(seconds.clamp(0.0, self.duration));
    }

    fn set_rate(&self, rate: f32) {
        let mut state = self.state.lock();
        let position = state.position(self.duration, self.time_scale);
        state.reanchor(position);
        state.rate = rate;
    }

    fn rate(&self) -> f32 {
        self.state.lock().rate
    }

    fn current_position(&self) -> f64 {
        self.state.lock().position(self.duration, self.time_scale)
    }

    fn duration(&self) -> f64 {
        if self.state.lock().source.is_some() {
            self.duration
        } else {
            f64::NAN
        }
    }

    fn observe_ticks(&self, _interval: Duration) -> ObservationToken {
        let mut state = self.state.lock();
        state.next_token += 1;
        let token = state.next_token;
        state.observations.insert(token);
        ObservationToken(token)
    }

    fn release_observation(&self, token: ObservationToken) {
        self.state.lock().observations.remove(&token.0);
    }

    fn enter_picture_in_picture(&self) -> bool {
        self.state.lock().picture_in_picture = true;
        true
    }

    fn exit_picture_in_picture(&self) {
        self.state.lock().picture_in_picture = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(duration: f64, time_scale: f64) -> SimulatedPlayer {
        let player = SimulatedPlayer::new(duration, time_scale);
        let url = Url::parse("https://media.example.org/a.mp4").unwrap();
        let _ = player.load(&url);
        player
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_only_while_playing() {
        let player = loaded(600.0, 10.0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.current_position(), 0.0);

        player.play();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(player.current_position(), 30.0);

        player.pause();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(player.current_position(), 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_and_seek() {
        let player = loaded(600.0, 1.0);
        player.play();
        player.set_rate(2.0);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.current_position(), 10.0);

        player.seek(100.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(player.current_position(), 102.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_detection() {
        let player = loaded(100.0, 10.0);
        player.play();
        assert_eq!(player.time_to_end(), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(player.current_position(), 100.0);
        assert!(player.at_end());
    }

    #[test]
    fn test_duration_unknown_without_source() {
        let player = SimulatedPlayer::new(100.0, 1.0);
        assert!(player.duration().is_nan());
        assert!(player.source().is_none());
    }

    #[test]
    fn test_observations_tracked() {
        let player = SimulatedPlayer::new(100.0, 1.0);
        let a = player.observe_ticks(Duration::from_millis(500));
        let _b = player.observe_ticks(Duration::from_secs(1));
        assert_eq!(player.active_observations(), 2);
        player.release_observation(a);
        assert_eq!(player.active_observations(), 1);
    }
}
