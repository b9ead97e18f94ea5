//! GPIO pin assignments for the feeder board (BCM numbering).
//!
//! Single source of truth: every adapter references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Dispenser servo (continuous rotation)
// ---------------------------------------------------------------------------

/// Software-PWM output driving the servo signal line.
pub const SERVO_GPIO: u8 = 4;
/// Servo PWM frame rate.
pub const SERVO_PWM_HZ: f64 = 50.0;

// ---------------------------------------------------------------------------
// Ultrasonic distance sensor (HC-SR04)
// ---------------------------------------------------------------------------

/// Digital output: trigger pulse, idles LOW.
pub const TRIGGER_GPIO: u8 = 17;
/// Digital input (pull-down): echo, HIGH for the round-trip time.
pub const ECHO_GPIO: u8 = 27;
