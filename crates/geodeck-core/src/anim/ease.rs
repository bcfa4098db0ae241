//! Easing curves.

use std::{f32::consts::FRAC_PI_2, str::FromStr};

use serde::Deserialize;

/// A named easing curve mapping linear progress `t ∈ [0, 1]` to eased progress.
///
/// # Examples
///
/// ```
/// use geodeck_core::anim::Ease;
///
/// let ease: Ease = "cubic".parse().unwrap();
/// assert_eq!(ease, Ease::CubicOut);
/// assert_eq!(ease.apply(0.0), 0.0);
/// assert_eq!(ease.apply(1.0), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Ease {
    Linear,
    QuadOut,
    CubicIn,
    #[default]
    CubicOut,
    CubicInOut,
    SineOut,
    ExpOut,
    BackOut,
}

impl Ease {
    /// Applies the curve. Input is clamped to `[0, 1]`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadOut => t * (2.0 - t),
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
            Self::SineOut => (t * FRAC_PI_2).sin(),
            Self::ExpOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - (2.0_f32.powf(-10.0 * t) - 0.000_976_562_5) * 1.000_977_5
                }
            }
            Self::BackOut => {
                const OVERSHOOT: f32 = 1.701_58;
                let u = t - 1.0;
                u * u * ((OVERSHOOT + 1.0) * u + OVERSHOOT) + 1.0
            }
        }
    }
}

impl FromStr for Ease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "quad" | "quadOut" => Ok(Self::QuadOut),
            "cubic" | "cubicOut" => Ok(Self::CubicOut),
            "cubicIn" => Ok(Self::CubicIn),
            "cubicInOut" => Ok(Self::CubicInOut),
            "sine" | "sineOut" => Ok(Self::SineOut),
            "exp" | "expOut" => Ok(Self::ExpOut),
            "back" | "backOut" => Ok(Self::BackOut),
            _ => Err(format!(
                "invalid ease `{s}`, valid values: linear, quad, cubic, cubicIn, cubicOut, cubicInOut, sine, exp, back"
            )),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
