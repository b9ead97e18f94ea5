//! Colour classification of captured frames.
//!
//! ```text
//!  CapturedFrame (RGB) ──▶ HSV ──▶ per-range masks ──OR──▶ combined mask
//!                                                             │
//!                                    close(5×5) ─▶ open(5×5) ◀┘
//!                                                             │
//!                                        coverage % = set / total × 100
//! ```
//!
//! Everything here is pure and deterministic; the classifier holds no
//! state between calls.

pub mod classifier;
pub mod frame;
pub mod hsv;
pub mod mask;
pub mod profile;

pub use classifier::{ClassificationResult, ColorClassifier};
pub use frame::CapturedFrame;
pub use profile::{ColorProfile, HsvRange, TargetColor};
