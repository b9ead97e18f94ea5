//! RGB → HSV conversion, 8-bit convention.
//!
//! Hue is halved to fit a byte (0–179), saturation and value span 0–255.
//! This matches the range tables in [`super::profile`], which were tuned
//! against the same convention.

/// One pixel in 8-bit HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    /// Hue, 0–179 (degrees / 2).
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Convert one RGB pixel.
///
/// Ties between channels resolve red → green → blue, so pure grey
/// (`diff == 0`) has hue 0.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { (255 * diff + v / 2) / v };

    let h = if diff == 0 {
        0
    } else {
        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        // Round half up, then wrap: -0.5 becomes 0, not 179.
        let h = (sector as f32 * 30.0 / diff as f32 + 0.5).floor() as i32;
        if h < 0 { h + 180 } else { h }
    };

    Hsv::new(h.clamp(0, 179) as u8, s as u8, v as u8)
}
