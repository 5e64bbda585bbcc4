use std::time::Instant;

/// Animation clock for the render loop.
///
/// The start timestamp is captured when the render loop begins and never moves;
/// everything is reported as seconds since then.
#[derive(Debug, Copy, Clone)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }

    /// Seconds elapsed between the start and `now`.
    ///
    /// Timestamps earlier than the start read as zero.
    pub fn elapsed_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }
}
