use std::time::Instant;

/// Source of scheduler ticks (microseconds).
pub trait Clock: Send + Sync {
    fn now_ticks(&self) -> u64;
}

/// Monotonic clock counting from its creation.
///
/// Ticks start at 1: 0 is reserved as the "stopped" sentinel of a frame scheduler.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ticks(&self) -> u64 {
        let micros = u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX - 1);
        micros + 1
    }
}
