//! System configuration parameters
//!
//! All tunable parameters for the feeder controller. Values come from the
//! JSON config file (see [`crate::adapters::config_file`]) and may be
//! overridden from the command line before the loop starts.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Accepted cooldown range in seconds.
pub const CYCLE_SECS_MIN: u32 = 10;
pub const CYCLE_SECS_MAX: u32 = 3600;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    // --- Detection ---
    /// Target colour profile name (unknown names fall back to brown).
    pub target_color: String,
    /// Minimum seconds between two successful feeds.
    pub cycle_secs: u32,
    /// An object closer than this (cm) triggers a capture.
    pub detection_distance_cm: f32,
    /// Coverage (%) at or above which the frame counts as a match.
    pub color_match_threshold_pct: f32,
    /// Sleep between polls (milliseconds).
    pub poll_interval_ms: u32,

    // --- Food estimate ---
    /// Food level decrement (%) per successful dispense.
    pub food_step_pct: f32,

    // --- Servo calibration ---
    /// Neutral duty cycle (%), servo stopped.
    pub servo_stop_duty_pct: f32,
    /// Opening duty cycle (%).
    pub servo_open_duty_pct: f32,
    /// Closing duty cycle (%), opposite direction to opening.
    pub servo_close_duty_pct: f32,
    /// Seconds held in each direction.
    pub rotation_secs: f32,

    // --- Capture ---
    /// Still-capture utility.
    pub capture_program: String,
    /// Working directory for the captured file.
    pub capture_dir: String,
    pub capture_width: u32,
    pub capture_height: u32,
    /// Hard upper bound on one capture (seconds).
    pub capture_timeout_secs: u32,

    // --- Reporting ---
    /// Status endpoint; `None` disables HTTP reporting.
    pub report_url: Option<String>,
    /// Heartbeat report interval (seconds, 0 = only on feeds).
    pub report_interval_secs: u32,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // Detection
            target_color: String::from("brown"),
            cycle_secs: 60,
            detection_distance_cm: 50.0,
            color_match_threshold_pct: 10.0,
            poll_interval_ms: 500,

            // Food
            food_step_pct: 5.0,

            // Servo: 7.5 % neutral, ±0.5 % for a slow symmetric turn
            servo_stop_duty_pct: 7.5,
            servo_open_duty_pct: 7.0,
            servo_close_duty_pct: 8.0,
            rotation_secs: 1.0,

            // Capture
            capture_program: String::from("rpicam-still"),
            capture_dir: String::from("captured_images"),
            capture_width: 640,
            capture_height: 480,
            capture_timeout_secs: 5,

            // Reporting
            report_url: None,
            report_interval_secs: 0,
        }
    }
}

impl FeederConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(CYCLE_SECS_MIN..=CYCLE_SECS_MAX).contains(&self.cycle_secs) {
            return Err(ConfigError::ValidationFailed(
                "cycle_secs must be within 10..=3600",
            ));
        }
        if !(self.detection_distance_cm > 0.0 && self.detection_distance_cm <= 400.0) {
            return Err(ConfigError::ValidationFailed(
                "detection_distance_cm must be within (0, 400]",
            ));
        }
        if !(0.0..=100.0).contains(&self.color_match_threshold_pct) {
            return Err(ConfigError::ValidationFailed(
                "color_match_threshold_pct must be within 0..=100",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if !(self.food_step_pct > 0.0 && self.food_step_pct <= 100.0) {
            return Err(ConfigError::ValidationFailed(
                "food_step_pct must be within (0, 100]",
            ));
        }
        for duty in [
            self.servo_stop_duty_pct,
            self.servo_open_duty_pct,
            self.servo_close_duty_pct,
        ] {
            if !(0.0..=100.0).contains(&duty) {
                return Err(ConfigError::ValidationFailed(
                    "servo duty cycles must be within 0..=100",
                ));
            }
        }
        if !(self.rotation_secs > 0.0 && self.rotation_secs <= 10.0) {
            return Err(ConfigError::ValidationFailed(
                "rotation_secs must be within (0, 10]",
            ));
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(ConfigError::ValidationFailed(
                "capture resolution must be non-zero",
            ));
        }
        if self.capture_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "capture_timeout_secs must be > 0",
            ));
        }
        Ok(())
    }
}
