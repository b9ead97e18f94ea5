//! Static colour profile table.
//!
//! Each [`TargetColor`] maps to one or more inclusive HSV range pairs.
//! Multiple ranges cover hue wrap-around (red sits at both ends of the hue
//! circle) or broad natural variation (brown fur under mixed light). The
//! pixel matches a profile if it falls inside *any* of its ranges.

use core::fmt;

use super::hsv::Hsv;

/// Inclusive lower/upper HSV bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub const fn new(lower: (u8, u8, u8), upper: (u8, u8, u8)) -> Self {
        Self {
            lower: Hsv::new(lower.0, lower.1, lower.2),
            upper: Hsv::new(upper.0, upper.1, upper.2),
        }
    }

    pub fn contains(&self, px: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&px.h)
            && (self.lower.s..=self.upper.s).contains(&px.s)
            && (self.lower.v..=self.upper.v).contains(&px.v)
    }
}

// ---------------------------------------------------------------------------
// Range tables
// ---------------------------------------------------------------------------

const BROWN: &[HsvRange] = &[
    HsvRange::new((10, 50, 50), (20, 255, 200)),
    HsvRange::new((5, 40, 40), (15, 200, 150)),
    HsvRange::new((8, 60, 30), (22, 255, 180)),
    HsvRange::new((15, 30, 30), (25, 200, 200)),
];

const BLACK: &[HsvRange] = &[
    HsvRange::new((0, 0, 0), (180, 255, 30)),
    HsvRange::new((0, 0, 0), (180, 30, 50)),
];

const WHITE: &[HsvRange] = &[
    HsvRange::new((0, 0, 200), (180, 30, 255)),
    HsvRange::new((0, 0, 150), (180, 20, 255)),
];

const GRAY: &[HsvRange] = &[HsvRange::new((0, 0, 50), (180, 30, 150))];

const ORANGE: &[HsvRange] = &[
    HsvRange::new((5, 100, 100), (15, 255, 255)),
    HsvRange::new((10, 100, 100), (20, 255, 255)),
];

const YELLOW: &[HsvRange] = &[
    HsvRange::new((20, 100, 100), (30, 255, 255)),
    HsvRange::new((25, 50, 50), (35, 255, 255)),
];

const RED: &[HsvRange] = &[
    HsvRange::new((0, 100, 100), (10, 255, 255)),
    HsvRange::new((170, 100, 100), (180, 255, 255)),
];

const GREEN: &[HsvRange] = &[
    HsvRange::new((40, 50, 50), (80, 255, 255)),
    HsvRange::new((35, 40, 40), (85, 255, 200)),
];

const BLUE: &[HsvRange] = &[
    HsvRange::new((100, 50, 50), (130, 255, 255)),
    HsvRange::new((90, 50, 50), (140, 255, 255)),
];

const TAN: &[HsvRange] = &[
    HsvRange::new((15, 20, 50), (25, 100, 200)),
    HsvRange::new((10, 15, 60), (20, 60, 180)),
];

// ---------------------------------------------------------------------------
// TargetColor
// ---------------------------------------------------------------------------

/// Every colour the feeder can be tuned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetColor {
    #[default]
    Brown,
    Black,
    White,
    Gray,
    Orange,
    Yellow,
    Red,
    Green,
    Blue,
    Tan,
}

impl TargetColor {
    pub const ALL: [TargetColor; 10] = [
        Self::Brown,
        Self::Black,
        Self::White,
        Self::Gray,
        Self::Orange,
        Self::Yellow,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Tan,
    ];

    /// Case-insensitive lookup. `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Brown => "brown",
            Self::Black => "black",
            Self::White => "white",
            Self::Gray => "gray",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Tan => "tan",
        }
    }

    pub const fn ranges(self) -> &'static [HsvRange] {
        match self {
            Self::Brown => BROWN,
            Self::Black => BLACK,
            Self::White => WHITE,
            Self::Gray => GRAY,
            Self::Orange => ORANGE,
            Self::Yellow => YELLOW,
            Self::Red => RED,
            Self::Green => GREEN,
            Self::Blue => BLUE,
            Self::Tan => TAN,
        }
    }
}

impl fmt::Display for TargetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ColorProfile
// ---------------------------------------------------------------------------

/// A named, non-empty set of HSV ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorProfile {
    color: TargetColor,
    ranges: &'static [HsvRange],
}

impl ColorProfile {
    pub const fn of(color: TargetColor) -> Self {
        Self {
            color,
            ranges: color.ranges(),
        }
    }

    /// Resolve a configured name. Unknown names yield the default profile;
    /// the second element is `true` when that fallback happened.
    pub fn resolve(name: &str) -> (Self, bool) {
        match TargetColor::from_name(name) {
            Some(color) => (Self::of(color), false),
            None => (Self::of(TargetColor::default()), true),
        }
    }

    /// Profile built from an explicit range list (never empty).
    /// Used to test subsets of a colour's table.
    pub fn custom(color: TargetColor, ranges: &'static [HsvRange]) -> Option<Self> {
        (!ranges.is_empty()).then_some(Self { color, ranges })
    }

    pub fn color(&self) -> TargetColor {
        self.color
    }

    pub fn ranges(&self) -> &'static [HsvRange] {
        self.ranges
    }

    /// True if `px` lies within any range.
    pub fn matches(&self, px: Hsv) -> bool {
        self.ranges.iter().any(|r| r.contains(px))
    }
}

impl Default for ColorProfile {
    fn default() -> Self {
        Self::of(TargetColor::default())
    }
}
