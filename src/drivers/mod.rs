//! Actuator drivers.

pub mod dispenser;
pub mod servo;

pub use dispenser::{DispenseTiming, Dispenser};
pub use servo::ContinuousServo;
