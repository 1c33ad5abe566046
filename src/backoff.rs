//! Adaptive reconnect delay.
//!
//! The delay is adjusted once per connection attempt, based on how long the
//! previous attempt lived:
//!
//! - lived at least as long as the current delay: halve it, floored at `min`
//! - died sooner: add `min`, capped at `max`
//!
//! The wait handed out is the new delay minus the time already spent in the
//! attempt, so a long-lived session reconnects immediately while a server
//! that keeps refusing us is retried less and less often.

use std::time::Duration;

use tokio::time::Instant;

/// Reconnect delay calculator. Owned by one reconnect loop.
#[derive(Clone, Debug)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    delay: Duration,
    last: Instant,
}

impl Backoff {
    /// Start at `min`. A `max` below `min` is raised to `min`.
    ///
    /// A zero `min` keeps the delay at zero forever;
    /// [`Config::validate`](crate::Config::validate) rejects it.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            delay: min,
            last: Instant::now(),
        }
    }

    /// Record the start of a connection attempt.
    pub fn attempt(&mut self) {
        self.last = Instant::now();
    }

    /// Adjust the delay for the attempt that just ended and return how long
    /// to wait before the next one.
    pub fn next_delay(&mut self) -> Duration {
        self.advance(self.last.elapsed())
    }

    /// Like [`next_delay`](Self::next_delay), with the attempt's lifetime given explicitly.
    pub fn advance(&mut self, elapsed: Duration) -> Duration {
        if elapsed >= self.delay {
            self.delay = (self.delay / 2).max(self.min);
        } else {
            self.delay = (self.delay + self.min).min(self.max);
        }
        self.delay.saturating_sub(elapsed)
    }

    /// The current delay, before subtracting elapsed time.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MIN_DELAY,
            crate::config::DEFAULT_MAX_DELAY,
        )
    }
}
