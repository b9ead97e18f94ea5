//! Binary masks and rectangular morphology.
//!
//! Erosion and dilation use a square `(2r+1)×(2r+1)` neighbourhood.
//! Neighbours outside the frame are ignored, so the frame border neither
//! grows nor eats into a region. A square kernel is separable: a horizontal
//! pass followed by a vertical pass gives the same result as the full 2-D
//! window.

use super::hsv::Hsv;
use super::profile::HsvRange;

/// Kernel radius for the 5×5 noise-cleanup neighbourhood.
pub const CLEANUP_RADIUS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    /// All-clear mask.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    /// Pixels of `hsv` (row-major, `width × height`) inside `range`.
    pub fn in_range(hsv: &[Hsv], width: usize, height: usize, range: &HsvRange) -> Self {
        debug_assert_eq!(hsv.len(), width * height);
        Self {
            width,
            height,
            bits: hsv.iter().map(|&px| range.contains(px)).collect(),
        }
    }

    /// Build from a predicate over coordinates.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self { width, height, bits }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Logical OR in place. Both masks must share dimensions.
    pub fn union_with(&mut self, other: &Mask) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, &b) in self.bits.iter_mut().zip(&other.bits) {
            *a |= b;
        }
    }

    pub fn dilate(&self, radius: usize) -> Self {
        self.morph(radius, |window| window.iter().any(|&b| b))
    }

    pub fn erode(&self, radius: usize) -> Self {
        self.morph(radius, |window| window.iter().all(|&b| b))
    }

    /// Dilate then erode: fills small gaps and holes.
    pub fn close(&self, radius: usize) -> Self {
        self.dilate(radius).erode(radius)
    }

    /// Erode then dilate: removes specks smaller than the kernel.
    pub fn open(&self, radius: usize) -> Self {
        self.erode(radius).dilate(radius)
    }

    fn morph(&self, radius: usize, op: impl Fn(&[bool]) -> bool) -> Self {
        if radius == 0 || self.bits.is_empty() {
            return self.clone();
        }
        let (w, h) = (self.width, self.height);

        // Horizontal pass.
        let mut rows = vec![false; w * h];
        for y in 0..h {
            let row = &self.bits[y * w..(y + 1) * w];
            for x in 0..w {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(w - 1);
                rows[y * w + x] = op(&row[lo..=hi]);
            }
        }

        // Vertical pass.
        let mut out = vec![false; w * h];
        let mut column = Vec::with_capacity(2 * radius + 1);
        for x in 0..w {
            for y in 0..h {
                let lo = y.saturating_sub(radius);
                let hi = (y + radius).min(h - 1);
                column.clear();
                column.extend((lo..=hi).map(|yy| rows[yy * w + x]));
                out[y * w + x] = op(&column);
            }
        }

        Self {
            width: w,
            height: h,
            bits: out,
        }
    }
}
