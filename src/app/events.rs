//! Outbound application events.
//!
//! The [`FeederService`](super::service::FeederService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: render a status line, POST a report,
//! record them in a test.

use core::time::Duration;

use serde::Serialize;

use super::commands::CalibrationStep;
use crate::error::{ActuatorError, CaptureError, ClassifyError};
use crate::fsm::StateId;
use crate::sensors::DistanceReading;
use crate::vision::{ClassificationResult, TargetColor};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries initial state and active profile).
    Started { state: StateId, color: TargetColor },

    /// The configured colour name was unknown; `used` is the fallback.
    ProfileFallback { requested: String, used: TargetColor },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// One distance poll.
    Distance(DistanceReading),

    /// An object is present but the last feed was too recent.
    CoolingDown { remaining: Duration },

    /// The still capture produced no frame.
    CaptureFailed(CaptureError),

    /// A frame was measured against the active profile.
    Classified {
        result: ClassificationResult,
        threshold_pct: f32,
    },

    /// A frame could not be measured.
    ClassifyFailed(ClassifyError),

    /// A dispense cycle finished (successfully or not).
    Dispensed(DispenseEvent),

    /// A manual servo calibration step completed.
    Calibrated(CalibrationStep),

    /// Outbound status report for remote observers.
    Report(StatusReport),

    /// The loop exited and the dispenser was parked.
    Stopped,
}

// ───────────────────────────────────────────────────────────────
// DispenseEvent
// ───────────────────────────────────────────────────────────────

/// Record of one dispense attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispenseEvent {
    pub success: bool,
    /// Monotonic time of the trigger (or of the command, for manual feeds).
    pub at: Duration,
    /// Coverage that justified the feed; `None` for manual feeds.
    pub classification: Option<ClassificationResult>,
    /// Food level after this attempt.
    pub food_level_pct: f32,
    pub fault: Option<ActuatorError>,
}

impl DispenseEvent {
    pub fn succeeded(
        at: Duration,
        classification: Option<ClassificationResult>,
        food_level_pct: f32,
    ) -> Self {
        Self {
            success: true,
            at,
            classification,
            food_level_pct,
            fault: None,
        }
    }

    pub fn failed(
        at: Duration,
        classification: Option<ClassificationResult>,
        food_level_pct: f32,
        fault: ActuatorError,
    ) -> Self {
        Self {
            success: false,
            at,
            classification,
            food_level_pct,
            fault: Some(fault),
        }
    }

    pub fn is_manual(&self) -> bool {
        self.classification.is_none()
    }
}

// ───────────────────────────────────────────────────────────────
// StatusReport
// ───────────────────────────────────────────────────────────────

/// Body of the outbound HTTP status report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub food_level_pct: f32,
    pub fed: bool,
    pub next_feed_in_secs: u64,
}

impl StatusReport {
    pub fn new(food_level_pct: f32, fed: bool, cooldown_remaining: Option<Duration>) -> Self {
        Self {
            food_level_pct,
            fed,
            next_feed_in_secs: cooldown_remaining.map_or(0, whole_secs_ceil),
        }
    }
}

/// Round a duration up to whole seconds.
pub fn whole_secs_ceil(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

// ───────────────────────────────────────────────────────────────
// StatusSnapshot
// ───────────────────────────────────────────────────────────────

/// Point-in-time view of the loop for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub state: StateId,
    pub color: TargetColor,
    pub last_distance: DistanceReading,
    pub cooldown_remaining: Option<Duration>,
    pub food_level_pct: f32,
    pub dispense_count: u32,
    /// Most recent dispense attempts, oldest first.
    pub recent: Vec<DispenseEvent>,
}
