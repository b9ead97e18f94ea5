//! Unified error types for the feeder controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be threaded through the FSM context and dispense events
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The distance sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A servo command failed.
    Actuator(ActuatorError),
    /// The still-capture utility did not yield a frame.
    Capture(CaptureError),
    /// A frame could not be classified.
    Classify(ClassifyError),
    /// The status report could not be delivered.
    Report(ReportError),
    /// Hardware line acquisition failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Capture(e) => write!(f, "capture: {e}"),
            Self::Classify(e) => write!(f, "classify: {e}"),
            Self::Report(e) => write!(f, "report: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Driving the trigger line failed.
    GpioWriteFailed,
    /// Sampling the echo line failed.
    GpioReadFailed,
    /// The echo line never rose after the trigger pulse.
    EchoStartTimeout,
    /// The echo line never fell.
    EchoEndTimeout,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "trigger write failed"),
            Self::GpioReadFailed => write!(f, "echo read failed"),
            Self::EchoStartTimeout => write!(f, "echo start timed out"),
            Self::EchoEndTimeout => write!(f, "echo end timed out"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Duty cycle outside 0–100 %.
    InvalidDuty,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::InvalidDuty => write!(f, "duty cycle out of range"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Capture errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// The capture utility is not installed / not on PATH.
    ToolNotFound,
    /// The capture utility could not be started.
    SpawnFailed,
    /// The capture utility exited unsuccessfully (exit code if any).
    ExitStatus(Option<i32>),
    /// The capture utility did not finish within the timeout.
    Timeout,
    /// The output file was missing or could not be decoded.
    DecodeFailed,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound => write!(f, "capture tool not found"),
            Self::SpawnFailed => write!(f, "capture tool failed to start"),
            Self::ExitStatus(Some(code)) => write!(f, "capture tool exited with {code}"),
            Self::ExitStatus(None) => write!(f, "capture tool killed by signal"),
            Self::Timeout => write!(f, "capture timed out"),
            Self::DecodeFailed => write!(f, "image decode failed"),
        }
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Self::Capture(e)
    }
}

// ---------------------------------------------------------------------------
// Classification errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
    /// The frame has zero pixels.
    EmptyFrame,
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFrame => write!(f, "frame has no pixels"),
        }
    }
}

impl From<ClassifyError> for Error {
    fn from(e: ClassifyError) -> Self {
        Self::Classify(e)
    }
}

// ---------------------------------------------------------------------------
// Reporting errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// The report queue is full; the report was dropped.
    QueueFull,
    /// The worker thread has gone away.
    WorkerGone,
    /// Network / transport failure.
    Transport,
    /// The endpoint answered with a non-2xx status.
    Status(u16),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "report queue full"),
            Self::WorkerGone => write!(f, "report worker stopped"),
            Self::Transport => write!(f, "transport error"),
            Self::Status(code) => write!(f, "endpoint returned HTTP {code}"),
        }
    }
}

impl From<ReportError> for Error {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
