//! Application core: pure domain logic, no direct I/O.
//!
//! This module contains the business rules for the feeder: detection loop
//! orchestration, cooldown and food bookkeeping, and operator commands.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod cancel;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
