//! Monotonic millisecond clock behind a trait, so timers can run on
//! deterministic time in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic millisecond tick source. Ticks start near zero and never go
/// backwards within one clock instance.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock: milliseconds elapsed since the clock was created.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock over a shared atomic counter.
///
/// Clones share the counter, so a test (or a periodic tick source) can advance
/// time while the supervisor reads it. A single `AtomicU64` read cannot tear.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    ticks: Arc<AtomicU64>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.ticks.fetch_add(ms, Ordering::Relaxed);
    }

    /// Set the counter to an absolute tick value.
    pub fn set(&self, ms: u64) {
        self.ticks.store(ms, Ordering::Relaxed);
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}
