//! Inbound commands to the application service.
//!
//! These represent operator actions (CLI subcommands, a future control
//! socket) that the [`FeederService`](super::service::FeederService)
//! interprets outside the automatic detection loop.

use crate::config::FeederConfig;
use crate::sensors::DistanceReading;
use crate::vision::ClassificationResult;

use super::events::DispenseEvent;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Run one dispense cycle now. Counts against the food level but does
    /// not start the cooldown.
    DispenseNow,

    /// Take a single distance reading.
    MeasureDistance,

    /// Capture and classify one frame without dispensing.
    Snapshot,

    /// Hot-swap configuration (validated first; the colour profile is
    /// re-resolved, servo and capture settings are pushed to the hardware).
    UpdateConfig(FeederConfig),

    /// Drive the servo by hand to tune its duties and hold. Never touches
    /// the food level or the cooldown.
    Calibrate(CalibrationStep),
}

/// One manual servo action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// Single sweep at the open duty.
    Open,
    /// Single sweep at the close duty.
    Close,
    /// Neutral, then no signal.
    Stop,
}

/// Successful command results.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// The dispense attempt, successful or not.
    Dispensed(DispenseEvent),
    Distance(DistanceReading),
    Classified(ClassificationResult),
    ConfigApplied,
    Calibrated(CalibrationStep),
}
