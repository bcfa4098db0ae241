//! Application configuration for geodeck rendering.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources such as the CLI's TOML file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`TimingConfig`] - Global animation speed and frame length.
//! - [`ThemeConfig`] - Theme colors that layers fall back to.
//! - [`ViewportConfig`] - Viewport height and intersection support.
//!
//! # Example
//!
//! ```
//! # use geodeck::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.timing().dur(900.0), 1440.0);
//! assert!(config.theme().ink().is_ok());
//! ```

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use geodeck_core::color::Color;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Animation timing section.
    #[serde(default)]
    timing: TimingConfig,

    /// Theme colors section.
    #[serde(default)]
    theme: ThemeConfig,

    /// Viewport section.
    #[serde(default)]
    viewport: ViewportConfig,

    /// Boundary data URL to local file path overrides.
    #[serde(default)]
    sources: IndexMap<String, PathBuf>,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        timing: TimingConfig,
        theme: ThemeConfig,
        viewport: ViewportConfig,
        sources: IndexMap<String, PathBuf>,
    ) -> Self {
        Self {
            timing,
            theme,
            viewport,
            sources,
        }
    }

    /// Returns the timing configuration.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns the theme configuration.
    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }

    /// Returns the viewport configuration.
    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Returns the boundary source overrides.
    pub fn sources(&self) -> &IndexMap<String, PathBuf> {
        &self.sources
    }

    /// Adds or replaces a boundary source override.
    pub fn with_source(mut self, url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.sources.insert(url.into(), path.into());
        self
    }

    /// Replaces the timing section.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Replaces the viewport section.
    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }
}

/// Global animation timing.
///
/// Every layer duration and the reveal fade are multiplied by `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_speed")]
    speed: f64,

    #[serde(default = "TimingConfig::default_frame_ms")]
    frame_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            speed: Self::default_speed(),
            frame_ms: Self::default_frame_ms(),
        }
    }
}

impl TimingConfig {
    /// Creates a timing configuration.
    ///
    /// # Arguments
    ///
    /// * `speed` - Duration multiplier; values `<= 0` fall back to the default.
    /// * `frame_ms` - Frame length of the stage clock; values `<= 0` fall back to the default.
    pub fn new(speed: f64, frame_ms: f64) -> Self {
        Self {
            speed: if speed > 0.0 {
                speed
            } else {
                Self::default_speed()
            },
            frame_ms: if frame_ms > 0.0 {
                frame_ms
            } else {
                Self::default_frame_ms()
            },
        }
    }

    fn default_speed() -> f64 {
        1.6
    }

    fn default_frame_ms() -> f64 {
        16.0
    }

    /// Returns the duration multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Returns the stage frame length in milliseconds.
    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Scales a nominal duration by the global speed.
    pub fn dur(&self, ms: f64) -> f64 {
        ms * self.speed
    }
}

/// Theme colors.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "ThemeConfig::default_ink")]
    ink: String,

    #[serde(default = "ThemeConfig::default_brand")]
    brand: String,

    #[serde(default = "ThemeConfig::default_background")]
    background: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            ink: Self::default_ink(),
            brand: Self::default_brand(),
            background: Self::default_background(),
        }
    }
}

impl ThemeConfig {
    fn default_ink() -> String {
        "#e6e9ef".to_string()
    }

    fn default_brand() -> String {
        "#7bdff2".to_string()
    }

    fn default_background() -> String {
        "#0f1115".to_string()
    }

    /// Returns the text and outline color.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn ink(&self) -> Result<Color, String> {
        Color::new(&self.ink).map_err(|err| format!("Invalid ink color in config: {err}"))
    }

    /// Returns the accent color used for hub markers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn brand(&self) -> Result<Color, String> {
        Color::new(&self.brand).map_err(|err| format!("Invalid brand color in config: {err}"))
    }

    /// Returns the page background color.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background(&self) -> Result<Color, String> {
        Color::new(&self.background)
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

/// Viewport used for scroll-driven reveals.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_height")]
    height: f32,

    #[serde(default = "ViewportConfig::default_supports_intersection")]
    supports_intersection: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            height: Self::default_height(),
            supports_intersection: Self::default_supports_intersection(),
        }
    }
}

impl ViewportConfig {
    /// Creates a viewport configuration.
    pub fn new(height: f32, supports_intersection: bool) -> Self {
        Self {
            height,
            supports_intersection,
        }
    }

    fn default_height() -> f32 {
        900.0
    }

    fn default_supports_intersection() -> bool {
        true
    }

    /// Returns the viewport height (one scene is one viewport tall).
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns whether intersection observation is available.
    pub fn supports_intersection(&self) -> bool {
        self.supports_intersection
    }
}
