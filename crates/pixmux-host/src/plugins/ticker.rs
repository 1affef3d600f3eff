//! Cancellable periodic background task.
//!
//! Plugins that update on their own schedule (the clock every second, the
//! slideshow every few seconds) start a ticker in `activated` and stop it in
//! `deactivated` and `teardown`.  The engine does not track these tasks, so
//! forgetting to stop one keeps redraw requests flowing for an invisible
//! plugin.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Owns at most one running periodic task.
#[derive(Debug, Default)]
pub struct Ticker {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `on_tick` every `period`, first after one full period.
    ///
    /// The task ends when `on_tick` returns `false`.  A ticker that is already
    /// running is replaced.  A zero period starts nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if period.is_zero() {
            return;
        }
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });
        if let Some(previous) = self.slot().replace(task) {
            previous.abort();
        }
    }

    /// Aborts the running task.  Returns whether one was running.
    pub fn stop(&self) -> bool {
        match self.slot().take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        // A poisoned slot still holds a valid handle.
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting(ticks: &Arc<AtomicU32>) -> impl FnMut() -> bool + Send + 'static {
        let ticks = Arc::clone(ticks);
        move || {
            ticks.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_ticker_fires_repeatedly_until_stopped() {
        // Arrange
        let ticker = Ticker::new();
        let ticks = Arc::new(AtomicU32::new(0));

        // Act
        ticker.start(Duration::from_millis(10), counting(&ticks));
        tokio::time::sleep(Duration::from_millis(80)).await;
        let stopped = ticker.stop();
        let at_stop = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Assert
        assert!(stopped);
        assert!(at_stop >= 2, "only {at_stop} ticks");
        assert_eq!(ticks.load(Ordering::SeqCst), at_stop);
        assert!(!ticker.is_running());
    }

    #[tokio::test]
    async fn test_ticker_ends_when_callback_returns_false() {
        let ticker = Ticker::new();
        ticker.start(Duration::from_millis(5), || false);

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!ticker.is_running());
    }

    #[tokio::test]
    async fn test_zero_period_starts_nothing() {
        let ticker = Ticker::new();
        ticker.start(Duration::ZERO, || true);
        assert!(!ticker.is_running());
        assert!(!ticker.stop());
    }
}
