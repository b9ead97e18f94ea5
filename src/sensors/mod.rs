//! Sensor subsystem: the ultrasonic distance driver and its reading type.
//!
//! A [`DistanceReading`] is either a plausible distance in centimetres or
//! `NoReading`. Anything outside the plausibility window is discarded, not
//! clamped: a 1 cm echo is noise and a 500 cm echo is past the sensor's
//! ceiling, and neither should ever be acted upon.

pub mod ultrasonic;

/// Readings at or below this are treated as noise (cm).
pub const MIN_PLAUSIBLE_CM: f32 = 2.0;
/// Readings at or above this exceed the sensor ceiling (cm).
pub const MAX_PLAUSIBLE_CM: f32 = 400.0;

/// Result of one distance measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DistanceReading {
    /// Plausible distance in centimetres (two-decimal precision).
    Cm(f32),
    /// Timeout, line fault, or implausible value.
    #[default]
    NoReading,
}

impl DistanceReading {
    /// Filter a raw distance through the plausibility window.
    pub fn from_raw_cm(cm: f32) -> Self {
        if cm > MIN_PLAUSIBLE_CM && cm < MAX_PLAUSIBLE_CM {
            Self::Cm((cm * 100.0).round() / 100.0)
        } else {
            Self::NoReading
        }
    }

    /// The distance, if valid.
    pub fn cm(self) -> Option<f32> {
        match self {
            Self::Cm(cm) => Some(cm),
            Self::NoReading => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Self::Cm(_))
    }

    /// True if the reading is valid and strictly closer than `threshold_cm`.
    pub fn is_within(self, threshold_cm: f32) -> bool {
        self.cm().is_some_and(|cm| cm < threshold_cm)
    }
}

impl core::fmt::Display for DistanceReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Cm(cm) => write!(f, "{:.2} cm", cm),
            Self::NoReading => write!(f, "no reading"),
        }
    }
}
