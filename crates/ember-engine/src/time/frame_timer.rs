use std::time::{Duration, Instant};

/// Fixed-interval deadline tracker.
///
/// Stands in for a toolkit timer (`QTimer`-style) on event loops that only offer
/// "wake me at instant X". When the host falls behind, missed ticks are dropped
/// rather than replayed in a burst.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: Duration,
    deadline: Instant,
}

impl FrameTimer {
    /// Creates a timer whose first tick is due one interval after `now`.
    ///
    /// A zero interval is bumped to 1 ms so the host never spins.
    pub fn new(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            deadline: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Instant at which the next tick is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Consumes the pending tick and schedules the next one strictly after `now`.
    pub fn advance(&mut self, now: Instant) {
        while self.deadline <= now {
            self.deadline += self.interval;
        }
    }
}
