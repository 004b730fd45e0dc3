use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Minimum-interval request spacing.
///
/// [`Pacer::ready`] returns once `min_interval` has passed since the previous
/// `ready` or [`Pacer::mark`]; the first call returns immediately.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Time left before the next request may go out.
    pub fn needed_wait(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => (last + self.min_interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub async fn ready(&mut self) {
        let wait = self.needed_wait(Instant::now());
        if !wait.is_zero() {
            sleep_until(Instant::now() + wait).await;
        }
        self.mark();
    }

    /// Record that a request just went out.
    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }
}
