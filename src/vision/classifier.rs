//! Dominant-colour coverage classifier.

use crate::error::ClassifyError;

use super::frame::CapturedFrame;
use super::hsv::{Hsv, rgb_to_hsv};
use super::mask::{CLEANUP_RADIUS, Mask};
use super::profile::ColorProfile;

/// Fraction of a frame matching a profile after noise cleanup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    /// Coverage in percent, 0–100.
    pub coverage_pct: f32,
    /// Set pixels in the cleaned mask.
    pub matched_pixels: usize,
    pub total_pixels: usize,
}

impl ClassificationResult {
    fn from_counts(matched_pixels: usize, total_pixels: usize) -> Self {
        Self {
            coverage_pct: (matched_pixels as f64 / total_pixels as f64 * 100.0) as f32,
            matched_pixels,
            total_pixels,
        }
    }

    pub fn meets(&self, threshold_pct: f32) -> bool {
        self.coverage_pct >= threshold_pct
    }
}

/// Stateless classifier; one instance can be reused for any profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorClassifier {
    radius: usize,
}

impl ColorClassifier {
    /// Classifier with the standard 5×5 cleanup neighbourhood.
    pub fn new() -> Self {
        Self {
            radius: CLEANUP_RADIUS,
        }
    }

    /// Consume `frame` and measure how much of it matches `profile`.
    pub fn classify(
        &self,
        frame: CapturedFrame,
        profile: &ColorProfile,
    ) -> Result<ClassificationResult, ClassifyError> {
        let mask = self.mask(&frame, profile)?;
        Ok(ClassificationResult::from_counts(
            mask.count(),
            frame.pixel_count(),
        ))
    }

    /// The cleaned, combined mask for `frame` (union of every range,
    /// closed then opened).
    pub fn mask(&self, frame: &CapturedFrame, profile: &ColorProfile) -> Result<Mask, ClassifyError> {
        if frame.pixel_count() == 0 {
            return Err(ClassifyError::EmptyFrame);
        }
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let hsv: Vec<Hsv> = frame.pixels().map(rgb_to_hsv).collect();

        let mut combined = Mask::empty(w, h);
        for range in profile.ranges() {
            combined.union_with(&Mask::in_range(&hsv, w, h, range));
        }

        Ok(combined.close(self.radius).open(self.radius))
    }
}
