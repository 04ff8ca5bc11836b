//! Time source the sequencer waits on.

use std::time::{Duration, Instant};

/// Monotonic clock. `now` is measured from an arbitrary fixed origin and is
/// the same time base sensor snapshots are stamped with.
pub trait Clock {
    fn now(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);

    /// Sleep until `deadline`; returns immediately if it already passed.
    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            self.sleep(deadline - now);
        }
    }
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
