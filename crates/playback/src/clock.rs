// Clock observation
//
// Samples the media primitive on two periods and forwards the readings to the
// session channel. A tick kind that is still being handled is skipped rather
// than queued.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::Generation;
use crate::media::{ClockSnapshot, MediaPlayer, ObservationGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// Coarse tick for labels and the progress bar
    Display,
    /// Dense tick for progress persistence
    Persist,
}

/// Marks a tick kind as in flight until dropped.
#[derive(Debug)]
struct TickPermit(Arc<AtomicBool>);

impl Drop for TickPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A clock reading delivered to the session.
///
/// Another tick of the same kind is only emitted after this one is dropped.
#[derive(Debug)]
pub struct Tick {
    pub kind: TickKind,
    pub generation: Generation,
    pub snapshot: ClockSnapshot,
    _permit: TickPermit,
}

/// Periodic sampler bound to one generation. Dropping it stops sampling and
/// releases the primitive's observation token.
#[derive(Debug)]
pub struct ClockObserver {
    generation: Generation,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ClockObserver {
    pub fn spawn<E>(
        player: Arc<dyn MediaPlayer>,
        display_period: Duration,
        persist_period: Duration,
        generation: Generation,
        tx: mpsc::Sender<E>,
    ) -> Self
    where
        E: From<Tick> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let guard = ObservationGuard::acquire(player, display_period.min(persist_period));

        let handle = tokio::spawn(async move {
            let display_busy = Arc::new(AtomicBool::new(false));
            let persist_busy = Arc::new(AtomicBool::new(false));

            let mut display = tokio::time::interval(display_period);
            display.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut persist = tokio::time::interval(persist_period);
            persist.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(%generation, "Clock observer started");
            loop {
                let (kind, busy) = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = display.tick() => (TickKind::Display, &display_busy),
                    _ = persist.tick() => (TickKind::Persist, &persist_busy),
                };

                if busy.swap(true, Ordering::AcqRel) {
                    trace!(?kind, "Previous tick still in flight, skipping");
                    continue;
                }

                let tick = Tick {
                    kind,
                    generation,
                    snapshot: ClockSnapshot::sample(guard.player().as_ref()),
                    _permit: TickPermit(busy.clone()),
                };
                match tx.try_send(E::from(tick)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        trace!(?kind, "Session queue full, dropping tick");
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }

            guard.release();
            debug!(%generation, "Clock observer stopped");
        });

        Self {
            generation,
            token,
            handle,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for ClockObserver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlayer;

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut mpsc::Receiver<Tick>) -> Vec<Tick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_tick_is_skipped() {
        let player = Arc::new(FakePlayer::new());
        player.set_duration(100.0);
        let (tx, mut rx) = mpsc::channel::<Tick>(8);
        let observer = ClockObserver::spawn(
            player.clone(),
            Duration::from_millis(500),
            Duration::from_secs(1),
            Generation::default(),
            tx,
        );
        settle().await;

        let mut first = drain(&mut rx);
        assert_eq!(first.len(), 2);
        let held = first
            .iter()
            .position(|t| t.kind == TickKind::Display)
            .map(|i| first.remove(i));
        assert!(held.is_some());
        drop(first);

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        let kinds: Vec<_> = drain(&mut rx).iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TickKind::Persist]);

        drop(held);
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        let kinds: Vec<_> = drain(&mut rx).iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TickKind::Display]);

        drop(observer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_observation() {
        let player = Arc::new(FakePlayer::new());
        let (tx, _rx) = mpsc::channel::<Tick>(8);
        let observer = ClockObserver::spawn(
            player.clone(),
            Duration::from_millis(500),
            Duration::from_secs(1),
            Generation::default(),
            tx,
        );
        assert_eq!(player.active_observations(), 1);

        drop(observer);
        settle().await;
        assert_eq!(player.active_observations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_stops_observer() {
        let player = Arc::new(FakePlayer::new());
        let (tx, rx) = mpsc::channel::<Tick>(8);
        drop(rx);
        let observer = ClockObserver::spawn(
            player.clone(),
            Duration::from_millis(500),
            Duration::from_secs(1),
            Generation::default(),
            tx,
        );
        settle().await;

        assert!(!observer.is_running());
        assert_eq!(player.active_observations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_carry_snapshot() {
        let player = Arc::new(FakePlayer::new());
        player.set_duration(200.0);
        player.set_position(50.0);
        player.set_rate(1.0);
        let (tx, mut rx) = mpsc::channel::<Tick>(8);
        let _observer = ClockObserver::spawn(
            player.clone(),
            Duration::from_millis(500),
            Duration::from_secs(1),
            Generation::default(),
            tx,
        );
        settle().await;

        let tick = rx.try_recv().unwrap();
        assert_eq!(tick.snapshot.position, 50.0);
        assert!(tick.snapshot.is_playing);
        assert_eq!(tick.snapshot.progress(), Some(0.25));
    }
}
