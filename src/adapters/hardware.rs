//! Hardware adapter: bridges the drivers to the domain port traits.
//!
//! Owns the range finder and the dispenser and exposes them together as one
//! `RangeFinder + Feeder` handle, so the service can borrow both through a
//! single `&mut` without splitting the hardware.

use crate::app::ports::{Feeder, RangeFinder, Sweep};
use crate::config::FeederConfig;
use crate::error::ActuatorError;
use crate::sensors::DistanceReading;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R, F> {
    range: R,
    feeder: F,
}

impl<R: RangeFinder, F: Feeder> HardwareAdapter<R, F> {
    pub fn new(range: R, feeder: F) -> Self {
        Self { range, feeder }
    }

    pub fn range_finder(&mut self) -> &mut R {
        &mut self.range
    }

    pub fn feeder(&mut self) -> &mut F {
        &mut self.feeder
    }
}

// ── RangeFinder implementation ────────────────────────────────

impl<R: RangeFinder, F: Feeder> RangeFinder for HardwareAdapter<R, F> {
    fn measure(&mut self) -> DistanceReading {
        self.range.measure()
    }
}

// ── Feeder implementation ─────────────────────────────────────

impl<R: RangeFinder, F: Feeder> Feeder for HardwareAdapter<R, F> {
    fn dispense(&mut self) -> Result<(), ActuatorError> {
        self.feeder.dispense()
    }

    fn sweep(&mut self, sweep: Sweep) -> Result<(), ActuatorError> {
        self.feeder.sweep(sweep)
    }

    fn recalibrate(&mut self, config: &FeederConfig) {
        self.feeder.recalibrate(config);
    }

    fn all_stop(&mut self) {
        self.feeder.all_stop();
    }
}
