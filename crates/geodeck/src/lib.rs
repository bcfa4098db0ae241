//! Geodeck - scroll-driven, animated geo charts composed from declarative layers.
//!
//! A chart is described by a [`chart_config::GeoChartConfig`]: a projection,
//! a basemap of boundary regions and any number of data layers (choropleth,
//! bubbles, flow arcs, hex density, plumes, rings). Charts are drawn into a
//! retained scene on a [`stage::Stage`], stay invisible until their slide
//! scrolls into view, fade in and then run their layers' entrance animations.
//!
//! Decks of slides are presented by [`deck::Presenter`]; [`DeckRenderer`]
//! renders one slide of a deck to SVG at a point in time.

pub mod cache;
pub mod chart_config;
pub mod config;
pub mod deck;
pub mod geo;
pub mod layers;
pub mod legacy;
pub mod path;
pub mod projection;
pub mod record;
pub mod registry;
pub mod reveal;
pub mod source;
pub mod stage;
pub mod template;
pub mod tooltip;
pub mod topology;

mod error;

pub use geodeck_core::{anim, color, draw, geometry, scale};

pub use error::{FetchError, GeoError};

use std::{path::PathBuf, rc::Rc};

use log::{debug, info};

use config::AppConfig;
use deck::{DeckConfig, Presenter};
use registry::GEO_CHART_TYPES;
use source::FileSource;
use tooltip::NoopTooltip;

/// Renders deck slides to SVG snapshots.
///
/// Boundary data is read from local files: URLs listed in the
/// configuration's `[sources]` table map to their paths, and anything else
/// that is not `http(s)` is read as a path relative to the base directory.
///
/// # Examples
///
/// ```rust,no_run
/// use geodeck::{DeckRenderer, config::AppConfig, deck::DeckConfig};
///
/// let deck = DeckConfig::from_json(r#"{"slides": [
///     {"id": "map", "type": "geo", "props": {"basemap": {"url": "states.json"}}}
/// ]}"#).expect("Failed to parse deck");
///
/// let svg = DeckRenderer::new(AppConfig::default())
///     .render_svg(&deck, None, 4000.0)
///     .expect("Failed to render");
/// println!("{svg}");
/// ```
#[derive(Debug, Default)]
pub struct DeckRenderer {
    config: AppConfig,
    base_dir: Option<PathBuf>,
}

impl DeckRenderer {
    /// Creates a renderer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            base_dir: None,
        }
    }

    /// Resolves relative boundary paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Renders one slide as it looks `at_ms` after it scrolled into view.
    ///
    /// Without a slide id, the first slide with a geo chart is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] if the slide does not exist or the deck
    /// has no geo slide, and the slide's build error if its chart failed.
    pub fn render_svg(&self, deck: &DeckConfig, slide: Option<&str>, at_ms: f64) -> Result<String, GeoError> {
        let id = match slide {
            Some(id) => deck
                .slide(id)
                .map(|slide| slide.id.clone())
                .ok_or_else(|| GeoError::Config(format!("slide `{id}` not found")))?,
            None => deck
                .slides
                .iter()
                .find(|slide| {
                    slide
                        .chart()
                        .is_some_and(|chart| GEO_CHART_TYPES.contains(&chart.kind.as_str()))
                })
                .map(|slide| slide.id.clone())
                .ok_or_else(|| GeoError::Config("deck has no geo slide".to_string()))?,
        };
        info!(slide = id.as_str(), at_ms; "Rendering slide");

        let mut source = FileSource::new(self.config.sources().clone());
        if let Some(dir) = &self.base_dir {
            source = source.with_base_dir(dir.clone());
        }
        let mut presenter = Presenter::new(self.config.clone(), Rc::new(source), Rc::new(NoopTooltip));
        presenter.load(deck)?;
        presenter.scroll_to_slide(&id)?;
        presenter.advance(at_ms);

        if let Some((_, err)) = presenter
            .take_failures()
            .into_iter()
            .find(|(failed, _)| *failed == id)
        {
            return Err(err);
        }
        let document = presenter.export_slide(&id)?;
        debug!(slide = id.as_str(); "Slide exported");
        Ok(document.to_string())
    }
}
