// src/session/countdown.rs

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time::{self, MissedTickBehavior},
};

/// Recurring timer owned by a session.
///
/// A background task fires every `interval` and queues a tick; the owner pulls
/// ticks with [`Countdown::tick`]. The task is aborted by [`Countdown::cancel`]
/// and on drop, so no ticker outlives its session.
#[derive(Debug)]
pub struct Countdown {
    interval: Duration,
    ticks: mpsc::Receiver<()>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Spawns the ticker. The first tick arrives one full `interval` after start.
    /// Must be called from within a tokio runtime.
    pub fn start(interval: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            let mut timer = time::interval_at(time::Instant::now() + interval, interval);
            // Late ticks are delivered in a burst so the count matches wall-clock time.
            timer.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                timer.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Self {
            interval,
            ticks,
            task: Some(task),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next tick. Never resolves once cancelled.
    pub async fn tick(&mut self) {
        if self.task.is_none() {
            return std::future::pending().await;
        }
        if self.ticks.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Stops the ticker. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.ticks.close();
            tracing::debug!("Countdown cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Handle to observe the ticker task independently of this value's lifetime.
    pub fn abort_handle(&self) -> Option<AbortHandle> {
        self.task.as_ref().map(|task| task.abort_handle())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    async fn wait_finished(handle: &AbortHandle) {
        for _ in 0..100 {
            if handle.is_finished() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_fixed_interval() {
        let start = Instant::now();
        let mut countdown = Countdown::start(Duration::from_secs(1));

        countdown.tick().await;
        countdown.tick().await;
        countdown.tick().await;

        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_cancel() {
        let mut countdown = Countdown::start(Duration::from_secs(1));
        countdown.tick().await;

        let handle = countdown.abort_handle().unwrap();
        countdown.cancel();
        countdown.cancel();

        let next = time::timeout(Duration::from_secs(10), countdown.tick()).await;
        assert!(next.is_err(), "cancelled countdown must not tick");

        wait_finished(&handle).await;
        assert!(handle.is_finished());
        assert!(!countdown.is_running());
        assert!(countdown.abort_handle().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_ticker_task() {
        let countdown = Countdown::start(Duration::from_millis(250));
        let handle = countdown.abort_handle().unwrap();
        assert!(!handle.is_finished());

        drop(countdown);

        wait_finished(&handle).await;
        assert!(handle.is_finished());
    }
}
