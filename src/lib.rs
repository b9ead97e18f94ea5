//! Colour-gated feeder controller library.
//!
//! Exposes the domain core, drivers and host adapters for the binary and
//! for integration testing. Raspberry Pi GPIO bindings live behind the
//! `rpi` feature; everything else runs on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod sensors;
pub mod vision;
