use std::time::Duration;

use tokio::time::Instant;

/// Bounds how often progress text is pushed to the chat: only on every
/// `every`-th follower and only once `interval` has passed since the last push.
#[derive(Debug)]
pub struct ProgressThrottle {
    every: usize,
    interval: Duration,
    last_update: Instant,
}

impl ProgressThrottle {
    pub fn new(every: usize, interval: Duration) -> Self {
        Self { every: every.max(1), interval, last_update: Instant::now() }
    }

    /// Returns `true` when an update for follower `index` should be sent and
    /// records it as sent.
    pub fn should_report(&mut self, index: usize) -> bool {
        if index % self.every != 0 {
            return false;
        }

        let now = Instant::now();
        if now.duration_since(self.last_update) <= self.interval {
            return false;
        }

        self.last_update = now;
        true
    }
}
