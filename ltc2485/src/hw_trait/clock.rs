//! Monotonic clock abstraction.
//!
//! Conversion timing is tracked in wrapping `u32` milliseconds so that a
//! free-running hardware tick counter can back the trait directly.

use async_trait::async_trait;
use tokio::time::{self, Duration, Instant};

/// Millisecond clock with a cooperative sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary epoch. Non-decreasing, wraps at
    /// `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Yield for at least `ms` milliseconds.
    async fn delay_ms(&mut self, ms: u32);

    /// Milliseconds elapsed since `since`, tolerant of counter wraparound.
    fn elapsed_since(&self, since: u32) -> u32 {
        self.now_ms().wrapping_sub(since)
    }
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the intended wraparound.
        self.origin.elapsed().as_millis() as u32
    }

    async fn delay_ms(&mut self, ms: u32) {
        time::sleep(Duration::from_millis(ms as u64)).await;
    }
}
