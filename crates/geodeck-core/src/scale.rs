//! Scales mapping data values to visual values.
//!
//! # Overview
//!
//! - [`ColorScale`]: piecewise-linear mapping from an ascending numeric domain to colors
//! - [`SqrtScale`]: square-root scale from a numeric domain to a numeric range
//! - [`AreaRadiusScale`]: radius scale whose circle *area* is proportional to the value
//! - [`ColorRamp`]: continuous sequential color schemes sampled on `0.0..=1.0`

use std::{f32::consts::PI, str::FromStr};

use thiserror::Error;

use crate::color::Color;

/// Errors raised when constructing a scale from configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScaleError {
    #[error("scale needs at least two stops, got {0}")]
    TooFewStops(usize),

    #[error("scale domain has {domain} values but range has {range}")]
    LengthMismatch { domain: usize, range: usize },

    #[error("scale domain must be ascending, found {prev} before {next}")]
    Unsorted { prev: f32, next: f32 },

    #[error("{0}")]
    InvalidColor(String),
}

/// A piecewise-linear color scale.
///
/// Values below the first domain stop map to the first color and values above
/// the last stop map to the last color. A value equal to a stop returns that
/// stop's color exactly; values in between are interpolated in sRGB.
///
/// # Examples
///
/// ```
/// use geodeck_core::{color::Color, scale::ColorScale};
///
/// let scale = ColorScale::from_css(&[0.0, 1.0], &["#000000", "#ffffff"]).unwrap();
/// assert_eq!(scale.apply(1.0), Color::new("#ffffff").unwrap());
/// assert_eq!(scale.apply(0.5).to_rgba8(), [128, 128, 128, 255]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    domain: Vec<f32>,
    range: Vec<Color>,
}

impl ColorScale {
    /// Creates a color scale from matching domain and range stops.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError`] when fewer than two stops are given, the lengths
    /// differ, or the domain is not ascending.
    pub fn new(domain: Vec<f32>, range: Vec<Color>) -> Result<Self, ScaleError> {
        if domain.len() != range.len() {
            return Err(ScaleError::LengthMismatch {
                domain: domain.len(),
                range: range.len(),
            });
        }
        if domain.len() < 2 {
            return Err(ScaleError::TooFewStops(domain.len()));
        }
        if let Some(pair) = domain.windows(2).find(|pair| !(pair[0] <= pair[1])) {
            return Err(ScaleError::Unsorted {
                prev: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { domain, range })
    }

    /// Creates a color scale parsing the range from CSS color strings.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::InvalidColor`] for unparsable colors, or any error
    /// of [`ColorScale::new`].
    pub fn from_css<S: AsRef<str>>(domain: &[f32], range: &[S]) -> Result<Self, ScaleError> {
        let colors = range
            .iter()
            .map(|c| Color::new(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ScaleError::InvalidColor)?;
        Self::new(domain.to_vec(), colors)
    }

    /// Returns the domain stops
    pub fn domain(&self) -> &[f32] {
        &self.domain
    }

    /// Returns the color stops
    pub fn range(&self) -> &[Color] {
        &self.range
    }

    /// Maps a value to its color.
    pub fn apply(&self, value: f32) -> Color {
        let last = self.domain.len() - 1;
        if value.is_nan() || value <= self.domain[0] {
            return self.range[0];
        }
        if value >= self.domain[last] {
            return self.range[last];
        }

        // First stop strictly greater than the value; the segment starts one before it.
        let upper = self.domain.partition_point(|stop| *stop <= value);
        let lower = upper - 1;
        let (d0, d1) = (self.domain[lower], self.domain[upper]);
        if value == d0 {
            return self.range[lower];
        }
        let t = (value - d0) / (d1 - d0);
        self.range[lower].lerp(self.range[upper], t)
    }
}

/// A square-root scale: `sqrt` is applied to the domain before a linear map.
///
/// Like its d3 counterpart this scale does not clamp.
///
/// # Examples
///
/// ```
/// use geodeck_core::scale::SqrtScale;
///
/// let scale = SqrtScale::new([0.0, 10_000.0], [6.0, 72.0]);
/// assert_eq!(scale.apply(0.0), 6.0);
/// assert_eq!(scale.apply(2_500.0), 39.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain: [f32; 2],
    range: [f32; 2],
}

impl SqrtScale {
    /// Creates a new square-root scale
    pub fn new(domain: [f32; 2], range: [f32; 2]) -> Self {
        Self { domain, range }
    }

    /// Maps a value through the scale.
    pub fn apply(&self, value: f32) -> f32 {
        let s = |v: f32| v.signum() * v.abs().sqrt();
        let (a, b) = (s(self.domain[0]), s(self.domain[1]));
        let t = if b - a == 0.0 {
            0.5
        } else {
            (s(value) - a) / (b - a)
        };
        self.range[0] + (self.range[1] - self.range[0]) * t
    }
}

/// Maps a non-negative magnitude to a circle radius so that circle area is
/// proportional to the magnitude.
///
/// `radius(v) = max(min, max_radius * sqrt(v / max_value))`, so the largest
/// magnitude receives the largest radius, zero receives the minimum radius and
/// the mapping is monotonically non-decreasing.
///
/// # Examples
///
/// ```
/// use geodeck_core::scale::AreaRadiusScale;
///
/// let scale = AreaRadiusScale::new(5000.0, [6.0, 58.0]);
/// assert_eq!(scale.apply(5000.0), 58.0);
/// assert_eq!(scale.apply(0.0), 6.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaRadiusScale {
    max_value: f32,
    range: [f32; 2],
}

impl AreaRadiusScale {
    /// Creates a scale for magnitudes in `[0, max_value]` and radii in `range`.
    pub fn new(max_value: f32, range: [f32; 2]) -> Self {
        Self { max_value, range }
    }

    /// Returns the output radius range
    pub fn range(&self) -> [f32; 2] {
        self.range
    }

    /// Maps a magnitude to a radius.
    pub fn apply(&self, value: f32) -> f32 {
        let [min, max] = self.range;
        if !(self.max_value > 0.0) || !(value > 0.0) {
            return min;
        }
        let ratio = (value / self.max_value).min(1.0);
        (max * ratio.sqrt()).max(min)
    }
}

/// Continuous sequential color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRamp {
    /// Rainbow-warm half: cubehelix from purple through red to yellow-green.
    Warm,
    /// Perceptually uniform dark blue to yellow scheme.
    Plasma,
}

const PLASMA_STOPS: [[u8; 3]; 9] = [
    [0x0d, 0x08, 0x87],
    [0x4c, 0x02, 0xa1],
    [0x7e, 0x03, 0xa8],
    [0xa9, 0x23, 0x95],
    [0xcc, 0x47, 0x78],
    [0xe6, 0x6c, 0x5c],
    [0xf8, 0x95, 0x40],
    [0xfd, 0xc3, 0x28],
    [0xf0, 0xf9, 0x21],
];

impl ColorRamp {
    /// Samples the ramp at `t`, clamped to `0.0..=1.0`.
    pub fn sample(self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Warm => cubehelix(-100.0 + 180.0 * t, 0.75 + 0.75 * t, 0.35 + 0.45 * t),
            Self::Plasma => {
                let scaled = t * (PLASMA_STOPS.len() - 1) as f32;
                let i = (scaled.floor() as usize).min(PLASMA_STOPS.len() - 2);
                let local = scaled - i as f32;
                let channel = |c: usize| {
                    let a = f32::from(PLASMA_STOPS[i][c]);
                    let b = f32::from(PLASMA_STOPS[i + 1][c]);
                    (a + (b - a) * local) / 255.0
                };
                Color::from_srgb(channel(0), channel(1), channel(2), 1.0)
            }
        }
    }
}

impl FromStr for ColorRamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warm" => Ok(Self::Warm),
            "plasma" => Ok(Self::Plasma),
            _ => Err(format!(
                "invalid color ramp `{s}`, valid values: warm, plasma"
            )),
        }
    }
}

/// Converts a cubehelix color (hue in degrees) to sRGB.
fn cubehelix(hue: f32, saturation: f32, lightness: f32) -> Color {
    const A: f32 = -0.14861;
    const B: f32 = 1.78277;
    const C: f32 = -0.29227;
    const D: f32 = -0.90649;
    const E: f32 = 1.97294;

    let h = (hue + 120.0) * PI / 180.0;
    let l = lightness;
    let a = saturation * l * (1.0 - l);
    let (sin_h, cos_h) = h.sin_cos();

    Color::from_srgb(
        l + a * (A * cos_h + B * sin_h),
        l + a * (C * cos_h + D * sin_h),
        l + a * (E * cos_h),
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    #[test]
    fn test_color_scale_rejects_bad_stops() {
        let black = Color::new("black").unwrap();
        assert_eq!(
            ColorScale::new(vec![0.0], vec![black]),
            Err(ScaleError::TooFewStops(1))
        );
        assert!(matches!(
            ColorScale::new(vec![0.0, 1.0], vec![black]),
            Err(ScaleError::LengthMismatch { .. })
        ));
        assert!(matches!(
            ColorScale::new(vec![1.0, 0.0], vec![black, black]),
            Err(ScaleError::Unsorted { .. })
        ));
        assert!(matches!(
            ColorScale::from_css(&[0.0, 1.0], &["black", "nope"]),
            Err(ScaleError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_color_scale_three_stops() {
        let scale =
            ColorScale::from_css(&[0.0, 0.5, 1.0], &["#3aa0ff", "#f0e68c", "#e34a33"]).unwrap();

        assert_eq!(scale.apply(0.5), Color::new("#f0e68c").unwrap());
        assert_eq!(scale.apply(-3.0), Color::new("#3aa0ff").unwrap());
        assert_eq!(scale.apply(9.0), Color::new("#e34a33").unwrap());

        let mid = scale.apply(0.75).to_rgba8();
        let a = Color::new("#f0e68c").unwrap().to_rgba8();
        let b = Color::new("#e34a33").unwrap().to_rgba8();
        for c in 0..3 {
            let expected = (f32::from(a[c]) + f32::from(b[c])) / 2.0;
            assert!((f32::from(mid[c]) - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn test_color_scale_nan_maps_to_first() {
        let scale = ColorScale::from_css(&[0.0, 1.0], &["#000000", "#ffffff"]).unwrap();
        assert_eq!(scale.apply(f32::NAN), Color::new("#000000").unwrap());
    }

    #[test]
    fn test_sqrt_scale() {
        let scale = SqrtScale::new([0.0, 10_000.0], [6.0, 72.0]);
        assert!(approx_eq!(f32, scale.apply(100.0), 12.6, epsilon = 1e-4));
        assert!(approx_eq!(f32, scale.apply(10_000.0), 72.0));
    }

    #[test]
    fn test_sqrt_scale_degenerate_domain() {
        let scale = SqrtScale::new([4.0, 4.0], [0.0, 10.0]);
        assert!(approx_eq!(f32, scale.apply(4.0), 5.0));
    }

    #[test]
    fn test_area_radius_scale() {
        let scale = AreaRadiusScale::new(5000.0, [6.0, 58.0]);
        let expected = 58.0 * (2600.0_f32 / 5000.0).sqrt();
        assert!(approx_eq!(f32, scale.apply(2600.0), expected, epsilon = 1e-4));
    }

    #[test]
    fn test_area_radius_scale_without_data() {
        let scale = AreaRadiusScale::new(0.0, [6.0, 36.0]);
        assert_eq!(scale.apply(10.0), 6.0);
    }

    #[test]
    fn test_warm_ramp_endpoints() {
        // cubehelix(-100, .75, .35) and cubehelix(80, 1.5, .8)
        assert_eq!(ColorRamp::Warm.sample(0.0).to_rgba8(), [110, 64, 170, 255]);
        assert_eq!(ColorRamp::Warm.sample(1.0).to_rgba8(), [175, 240, 91, 255]);
    }

    #[test]
    fn test_plasma_ramp_endpoints() {
        assert_eq!(ColorRamp::Plasma.sample(0.0).to_css(), "#0d0887");
        assert_eq!(ColorRamp::Plasma.sample(1.0).to_css(), "#f0f921");
    }

    #[test]
    fn test_color_ramp_from_str() {
        assert_eq!("warm".parse::<ColorRamp>(), Ok(ColorRamp::Warm));
        assert!("viridis".parse::<ColorRamp>().is_err());
    }

    proptest! {
        #[test]
        fn prop_area_radius_monotonic(a in 0.0f32..1e6, b in 0.0f32..1e6, max in 1.0f32..1e6) {
            let scale = AreaRadiusScale::new(max, [4.0, 40.0]);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale.apply(lo) <= scale.apply(hi));
            prop_assert!(scale.apply(hi) <= 40.0);
            prop_assert!(scale.apply(lo) >= 4.0);
        }

        #[test]
        fn prop_color_scale_stays_within_channel_bounds(v in -2.0f32..3.0) {
            let scale = ColorScale::from_css(&[0.0, 1.0], &["#102030", "#203040"]).unwrap();
            let [r, g, b, _] = scale.apply(v).to_rgba8();
            prop_assert!((0x10..=0x20).contains(&r));
            prop_assert!((0x20..=0x30).contains(&g));
            prop_assert!((0x30..=0x40).contains(&b));
        }
    }
}
