//! Colors and color-application scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    /// Red component.
    pub r: f64,
    /// Green component.
    pub g: f64,
    /// Blue component.
    pub b: f64,
}

impl Rgb {
    /// The fallback color for shapes with no color anywhere in the document.
    pub const MID_GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

    /// Create a new color.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::MID_GRAY
    }
}

impl From<[f64; 3]> for Rgb {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.r, self.g, self.b)
    }
}

/// The scope a color is applied at, as in XCAF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorType {
    /// Applies to the whole shape.
    Generic,
    /// Applies to faces.
    Surface,
    /// Applies to edges.
    Curve,
}

impl ColorType {
    /// All scopes, in kernel numbering order.
    pub const ALL: [ColorType; 3] = [ColorType::Generic, ColorType::Surface, ColorType::Curve];
}

impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorType::Generic => "generic",
            ColorType::Surface => "surface",
            ColorType::Curve => "curve",
        };
        f.write_str(name)
    }
}
