//! Color handling for geodeck charts
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Besides CSS parsing it offers the interpolation used by
//! color scales and animated fills, and a stable CSS serialization for SVG output.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{AlphaColor, DynamicColor, Srgb};

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a string
    /// This will parse CSS color strings such as "#ff0000", "rgba(255, 0, 0, .5)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodeck_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let faint = Color::new("rgba(255,255,255,.35)").unwrap();
    /// assert!(faint.alpha() < 0.5);
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Creates a color from straight (non-premultiplied) sRGB components in `0.0..=1.0`.
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        let srgb = AlphaColor::<Srgb>::new([
            r.clamp(0.0, 1.0),
            g.clamp(0.0, 1.0),
            b.clamp(0.0, 1.0),
            a.clamp(0.0, 1.0),
        ]);
        Self {
            color: DynamicColor::from_alpha_color(srgb),
        }
    }

    /// Creates a new color with the specified alpha (transparency) value.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodeck_core::color::Color;
    ///
    /// let red = Color::new("red").unwrap();
    /// let semi_transparent_red = red.with_alpha(0.5);
    /// assert_eq!(semi_transparent_red.alpha(), 0.5);
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }

    /// Returns the straight sRGB components `[r, g, b, a]` in `0.0..=1.0`.
    pub fn to_srgb(self) -> [f32; 4] {
        self.color.to_alpha_color::<Srgb>().components
    }

    /// Returns the color quantized to 8-bit sRGB channels `[r, g, b, a]`.
    pub fn to_rgba8(self) -> [u8; 4] {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        [rgba.r, rgba.g, rgba.b, rgba.a]
    }

    /// Interpolates between `self` and `other` in straight sRGB space.
    ///
    /// `t` is clamped to `0.0..=1.0`; `t == 0.0` returns `self` and `t == 1.0`
    /// returns `other` unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodeck_core::color::Color;
    ///
    /// let black = Color::new("#000000").unwrap();
    /// let white = Color::new("#ffffff").unwrap();
    /// assert_eq!(black.lerp(white, 0.5).to_rgba8(), [128, 128, 128, 255]);
    /// ```
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }

        let from = self.to_srgb();
        let to = other.to_srgb();
        let mix = |i: usize| from[i] + (to[i] - from[i]) * t;
        Self::from_srgb(mix(0), mix(1), mix(2), mix(3))
    }

    /// Serializes the color for SVG attributes.
    ///
    /// Opaque colors become `#rrggbb`; translucent ones become
    /// `rgba(r, g, b, a)` with the alpha rounded to three decimals.
    pub fn to_css(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == u8::MAX {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            let alpha = (self.alpha().clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
            format!("rgba({r}, {g}, {b}, {alpha})")
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::from_srgb(0.0, 0.0, 0.0, 1.0)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_css())
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Color::new(&raw).map_err(serde::de::Error::custom)
    }
}
