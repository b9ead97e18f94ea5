//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (distance sensor, dispenser, camera, clock, event sinks,
//! config storage) implement these traits. The
//! [`FeederService`](super::service::FeederService) consumes them via
//! generics, so the domain core never touches hardware directly and tests
//! can substitute simulations with the same capability set.

use core::time::Duration;

use crate::config::FeederConfig;
use crate::error::{ActuatorError, CaptureError};
use crate::sensors::DistanceReading;
use crate::vision::CapturedFrame;

// ───────────────────────────────────────────────────────────────
// Range finder port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain a distance.
pub trait RangeFinder {
    /// Take one measurement. Faults surface as [`DistanceReading::NoReading`],
    /// never as errors.
    fn measure(&mut self) -> DistanceReading;
}

// ───────────────────────────────────────────────────────────────
// Feeder port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// One half of a dispense cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Open,
    Close,
}

/// Write-side port: the domain calls this to run the dispensing mechanism.
pub trait Feeder {
    /// Run one full open + close cycle. Blocks until the mechanism is back
    /// at rest. The actuator is stopped on return whether or not it failed.
    fn dispense(&mut self) -> Result<(), ActuatorError>;

    /// Run a single sweep and park. Same stop guarantee as `dispense`.
    fn sweep(&mut self, sweep: Sweep) -> Result<(), ActuatorError>;

    /// Adopt the duty and timing values of `config` from the next
    /// actuation on.
    fn recalibrate(&mut self, config: &FeederConfig);

    /// Force the actuator into its stopped, zero-signal state.
    fn all_stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Camera port
// ───────────────────────────────────────────────────────────────

/// Produces one still frame per call. No retries at this layer.
pub trait Camera {
    fn capture(&mut self) -> Result<CapturedFrame, CaptureError>;

    /// Adopt the capture settings of `config` from the next frame on.
    fn reconfigure(&mut self, config: &FeederConfig);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus blocking sleep.
///
/// Tests use a simulated clock whose `sleep` simply advances `now`.
pub trait Clock {
    /// Time since an arbitrary fixed epoch (monotonic).
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / reporting)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (console log, HTTP
/// status endpoint, test recorder). Implementations must not block.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Fan an event out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// An absent sink (e.g. reporting disabled) drops everything.
impl<T: EventSink> EventSink for Option<T> {
    fn emit(&mut self, event: &super::events::AppEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`FeederConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<FeederConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &FeederConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("config I/O error"),
        }
    }
}
