//! Fuzz target: `ColorClassifier::classify`
//!
//! Interprets the input as `[width, colour, rgb...]` and checks that
//! classification never panics on any frame shape or pixel content.
//!
//! Invariants checked:
//! - Coverage stays within 0–100 %
//! - Matched pixels never exceed the frame size
//!
//! cargo fuzz run fuzz_classifier

#![no_main]

use libfuzzer_sys::fuzz_target;
use feeder::vision::{CapturedFrame, ColorClassifier, ColorProfile, TargetColor};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let width = u32::from(data[0] % 32) + 1;
    let color = TargetColor::ALL[data[1] as usize % TargetColor::ALL.len()];
    let pixels = &data[2..];

    let row = width as usize * 3;
    let height = (pixels.len() / row) as u32;
    if height == 0 {
        return;
    }
    let used = row * height as usize;
    let Some(frame) = CapturedFrame::from_rgb(width, height, pixels[..used].to_vec()) else {
        return;
    };

    let result = ColorClassifier::new()
        .classify(frame, &ColorProfile::of(color))
        .expect("non-empty frame classifies");
    assert!((0.0..=100.0).contains(&result.coverage_pct));
    assert!(result.matched_pixels <= result.total_pixels);
});
