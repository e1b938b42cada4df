// Single-owner restartable timers
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A named timer slot holding at most one scheduled task.
///
/// Starting the slot again cancels the previous task, so there is never more
/// than one timer per purpose. Dropping the slot cancels it.
#[derive(Debug)]
pub struct TimerSlot {
    name: &'static str,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl TimerSlot {
    pub fn new(name: &'static str) -> Self {
        Self { name, task: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }

    /// Deliver `event` once after `delay`.
    pub fn start_once<E>(&mut self, delay: Duration, tx: mpsc::Sender<E>, event: E)
    where
        E: Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let cancel = token.clone();
        let name = self.name;
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!("Timer {} cancelled", name);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    if tx.send(event).await.is_err() {
                        trace!("Timer {} fired after its receiver closed", name);
                    }
                }
            }
        });
        self.task = Some((token, handle));
    }

    /// Deliver an event built by `make` every `period`, first after one period.
    pub fn start_repeating<E, F>(&mut self, period: Duration, tx: mpsc::Sender<E>, make: F)
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let cancel = token.clone();
        let name = self.name;
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        trace!("Timer {} cancelled", name);
                        break;
                    }
                    _ = interval.tick() => {
                        if tx.send(make()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.task = Some((token, handle));
    }

    pub fn cancel(&mut self) {
        if let Some((token, _handle)) = self.task.take() {
            token.cancel();
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
