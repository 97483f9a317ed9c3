use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

/// Cancellable one-shot decay tick. Each arm bumps the generation so a tick
/// that was already in flight when it got superseded is recognised as stale.
pub struct TickTimer {
    tx: mpsc::UnboundedSender<u64>,
    generation: u64,
    interval: Duration,
    pending: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn new(tx: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            tx,
            generation: 0,
            interval: Duration::ZERO,
            pending: None,
        }
    }

    /// Fires once after `delay`; zero means as soon as possible.
    pub fn arm(&mut self, delay: Duration) {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.interval = delay;

        let tx = self.tx.clone();
        let generation = self.generation;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(generation);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.interval = Duration::ZERO;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Interval of the pending tick in milliseconds, 0 when dormant.
    pub fn interval_ms(&self) -> u64 {
        self.interval.as_millis().try_into().unwrap_or(u64::MAX)
    }

    /// Accepts a fired generation if it is the one currently armed.
    pub fn claim(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        self.pending = None;
        self.interval = Duration::ZERO;
        true
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
