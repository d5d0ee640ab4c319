use std::time::{Duration, Instant};

enum ClockSource {
    Wall { start: Instant },
    Manual { now: Duration },
}

/// Monotonic scene clock. Elapsed time is measured from scene start and is the single
/// source of truth for the timeline, tweens and ambient motion.
pub struct Time {
    source: ClockSource,
    last: Duration,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self {
            source: ClockSource::Wall { start: Instant::now() },
            last: Duration::ZERO,
            delta: Duration::ZERO,
        }
    }

    /// Clock that only moves when [`Time::advance`] is called.
    pub fn manual() -> Self {
        Self { source: ClockSource::Manual { now: Duration::ZERO }, last: Duration::ZERO, delta: Duration::ZERO }
    }

    /// Moves a manual clock forward. Negative or non-finite steps are ignored; wall clocks
    /// ignore this call entirely.
    pub fn advance(&mut self, seconds: f32) {
        if let ClockSource::Manual { now } = &mut self.source {
            if seconds.is_finite() && seconds > 0.0 {
                *now += Duration::from_secs_f32(seconds);
            }
        }
    }

    pub fn tick(&mut self) {
        let now = match &self.source {
            ClockSource::Wall { start } => start.elapsed(),
            ClockSource::Manual { now } => *now,
        };
        // Never step backwards.
        let now = now.max(self.last);
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
