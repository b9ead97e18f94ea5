//! Immutable RGB frame handed from the camera to the classifier.

use image::{Rgb, RgbImage};

/// One captured still, RGB channel order, row-major.
///
/// Produced by a [`Camera`](crate::app::ports::Camera), moved into the
/// classifier exactly once, then dropped.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    image: RgbImage,
}

impl CapturedFrame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Wrap a raw RGB buffer. `None` if the buffer length does not match
    /// `width × height × 3`.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Self::new)
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        Self::new(RgbImage::from_fn(width, height, |x, y| Rgb(f(x, y))))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.image.pixels().map(|p| p.0)
    }
}
