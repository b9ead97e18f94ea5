//! Host time adapter.
//!
//! - [`SystemClock`] implements the [`Clock`] port on `std::time::Instant`
//!   (monotonic, immune to wall-clock steps).
//! - [`StdDelay`] implements `embedded_hal::delay::DelayNs` with
//!   `thread::sleep`. Linux sleeps are a lower bound, which is all the
//!   trigger pulse and servo holds need.

use core::time::Duration;
use std::thread;
use std::time::Instant;

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Monotonic clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Blocking delay provider for drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
