//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to. The service fills in the inputs for the current iteration
//! (time, distance, capture/classify/dispense results), ticks the FSM, and
//! reads back the [`CycleOutcome`]. Think of it as the "blackboard" in a
//! blackboard architecture.

use core::time::Duration;

use crate::app::events::DispenseEvent;
use crate::config::FeederConfig;
use crate::error::{ActuatorError, CaptureError, ClassifyError};
use crate::sensors::DistanceReading;
use crate::vision::{CapturedFrame, ClassificationResult};

// ---------------------------------------------------------------------------
// Cooldown
// ---------------------------------------------------------------------------

/// Timestamp of the last trigger that led to a successful dispense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooldown {
    last_trigger: Option<Duration>,
}

impl Cooldown {
    pub fn last_trigger(&self) -> Option<Duration> {
        self.last_trigger
    }

    /// Time left before another feed is allowed, or `None` if eligible.
    ///
    /// Still cooling while `now - last <= cycle`.
    pub fn remaining(&self, now: Duration, cycle: Duration) -> Option<Duration> {
        let last = self.last_trigger?;
        let elapsed = now.saturating_sub(last);
        if elapsed <= cycle {
            Some(cycle - elapsed)
        } else {
            None
        }
    }

    pub fn mark(&mut self, at: Duration) {
        self.last_trigger = Some(at);
    }
}

// ---------------------------------------------------------------------------
// Food level
// ---------------------------------------------------------------------------

/// Estimated food remaining, in percent. Never replenished in-process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodLevel(f32);

impl FoodLevel {
    pub const FULL: Self = Self(100.0);

    pub fn pct(self) -> f32 {
        self.0
    }

    /// Subtract one dispense worth of food, flooring at zero.
    pub fn consume(&mut self, step_pct: f32) {
        self.0 = (self.0 - step_pct).max(0.0);
    }

    pub fn is_empty(self) -> bool {
        self.0 <= 0.0
    }
}

impl Default for FoodLevel {
    fn default() -> Self {
        Self::FULL
    }
}

// ---------------------------------------------------------------------------
// Gate + outcome
// ---------------------------------------------------------------------------

/// Result of the Idle-state gate check for the current poll.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gate {
    /// No valid distance this poll.
    #[default]
    NoReading,
    /// Valid reading, nothing within detection distance.
    Clear,
    /// Object present but a feed happened too recently.
    CoolingDown { remaining: Duration },
    /// Object present and eligible: the loop is engaged.
    Engaged,
}

/// What one pass through the detection loop amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoReading,
    Clear { distance_cm: f32 },
    CoolingDown { remaining: Duration },
    CaptureFailed(CaptureError),
    ClassifyFailed(ClassifyError),
    NoMatch(ClassificationResult),
    Dispensed(DispenseEvent),
    DispenseFailed(DispenseEvent),
    /// Cancellation arrived mid-cycle; nothing further was attempted.
    Cancelled,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Clock reading for the current poll.
    pub now: Duration,

    // -- Configuration --
    pub config: FeederConfig,

    // -- Inputs for the current cycle (written by the service) --
    pub distance: DistanceReading,
    pub frame: Option<CapturedFrame>,
    pub capture_error: Option<CaptureError>,
    pub classification: Option<ClassificationResult>,
    pub classify_error: Option<ClassifyError>,
    pub dispense_result: Option<Result<(), ActuatorError>>,

    // -- Cycle bookkeeping (written by handlers) --
    pub gate: Gate,
    /// When the current engagement started.
    pub triggered_at: Option<Duration>,
    /// Final verdict, set by whichever state ends the cycle.
    pub outcome: Option<CycleOutcome>,

    // -- Persistent loop state --
    pub cooldown: Cooldown,
    pub food: FoodLevel,
    /// Successful dispenses since startup.
    pub dispense_count: u32,
}

impl FsmContext {
    pub fn new(config: FeederConfig) -> Self {
        Self {
            now: Duration::ZERO,
            config,
            distance: DistanceReading::NoReading,
            frame: None,
            capture_error: None,
            classification: None,
            classify_error: None,
            dispense_result: None,
            gate: Gate::NoReading,
            triggered_at: None,
            outcome: None,
            cooldown: Cooldown::default(),
            food: FoodLevel::FULL,
            dispense_count: 0,
        }
    }

    pub fn cycle(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.cycle_secs))
    }

    /// Cooldown left at the current poll time.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.cooldown.remaining(self.now, self.cycle())
    }

    /// Drop per-cycle scratch before a new engagement.
    pub fn clear_cycle(&mut self) {
        self.frame = None;
        self.capture_error = None;
        self.classification = None;
        self.classify_error = None;
        self.dispense_result = None;
        self.outcome = None;
    }
}
