//! Frames-per-second measurement

use std::time::{Duration, Instant};

/// Length of one measurement window
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Counts frame arrivals and emits one FPS sample per elapsed window
#[derive(Debug, Clone)]
pub struct RateTracker {
    count: u64,
    window_start: Instant,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Tracker whose first window opens at `start`
    pub fn starting_at(start: Instant) -> Self {
        Self {
            count: 0,
            window_start: start,
        }
    }

    /// Record one frame now
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_at(Instant::now())
    }

    /// Record one frame at `now`
    ///
    /// Once at least a full window has elapsed, returns
    /// `count * 1000 / elapsed_ms` (truncating) and opens a new window. The
    /// divisor is never zero since nothing is computed before 1000 ms.
    pub fn tick_at(&mut self, now: Instant) -> Option<u32> {
        self.count += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_millis() as u64;
        let fps = self.count * 1000 / elapsed_ms;
        self.count = 0;
        self.window_start = now;
        Some(fps.min(u32::MAX as u64) as u32)
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}
