//! One-shot delayed redirect, cancelled when its owner goes away.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fires once after a delay. Dropping the timer cancels it.
#[derive(Debug)]
pub struct RedirectTimer {
    task: Option<JoinHandle<()>>,
    fired_rx: Option<oneshot::Receiver<()>>,
}

impl RedirectTimer {
    /// Starts the countdown on the current tokio runtime.
    pub fn schedule(delay: Duration) -> Self {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(());
        });
        debug!(delay_ms = %delay.as_millis(), "Redirect scheduled");
        Self {
            task: Some(task),
            fired_rx: Some(rx),
        }
    }

    /// `true` until the timer has fired or been cancelled.
    pub fn is_active(&self) -> bool {
        self.fired_rx.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Redirect cancelled");
        }
        self.fired_rx = None;
    }

    /// Resolves `true` when the delay elapses, `false` if cancelled or
    /// already consumed. Safe to drop mid-await and poll again later.
    pub async fn fired(&mut self) -> bool {
        let Some(rx) = self.fired_rx.as_mut() else {
            return false;
        };
        let fired = rx.await.is_ok();
        self.fired_rx = None;
        self.task = None;
        fired
    }
}

impl Drop for RedirectTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let mut timer = RedirectTimer::schedule(Duration::from_secs(2));
        assert!(timer.is_active());

        let early = tokio::time::timeout(Duration::from_millis(1_500), timer.fired()).await;
        assert!(early.is_err(), "must not fire before the delay");

        assert!(timer.fired().await);
        assert!(!timer.is_active());
        assert!(!timer.fired().await, "fires only once");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let mut timer = RedirectTimer::schedule(Duration::from_millis(10));
        timer.cancel();
        assert!(!timer.is_active());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!timer.fired().await);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_countdown() {
        let timer = RedirectTimer::schedule(Duration::from_millis(10));
        let task = timer.task.as_ref().map(|t| t.abort_handle()).expect("task");
        drop(timer);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(task.is_finished());
    }
}
