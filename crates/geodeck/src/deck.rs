//! Scroll-driven slide deck presenter.
//!
//! A deck is a vertical stack of slides, each occupying one viewport height.
//! [`Presenter`] lays the slides out on a [`Stage`], watches each slide's
//! visibility and builds its chart through the [`ChartRegistry`] the first
//! time at least [`BUILD_THRESHOLD`] of the slide is visible. Builds run on a
//! local executor driven by the presenter, so boundary fetches of several
//! charts proceed concurrently while all drawing stays single-threaded.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use geodeck::{
//!     config::AppConfig, deck::{DeckConfig, Presenter}, source::MemorySource,
//!     tooltip::NoopTooltip,
//! };
//!
//! let deck = DeckConfig::from_json(r#"{"slides": [{"id": "intro", "type": "text"}]}"#).unwrap();
//! let mut presenter = Presenter::new(
//!     AppConfig::default(),
//!     Rc::new(MemorySource::new()),
//!     Rc::new(NoopTooltip),
//! );
//! presenter.load(&deck).unwrap();
//! assert!(presenter.is_built("intro"));
//! ```

use std::{
    cell::{Ref, RefCell},
    collections::{HashSet, VecDeque},
    fmt,
    rc::Rc,
};

use futures::{
    executor::{LocalPool, LocalSpawner},
    task::LocalSpawnExt,
};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    cache::TopologyCache,
    config::AppConfig,
    error::GeoError,
    registry::{ChartContext, ChartRegistry, ChartRequest},
    source::BoundarySource,
    stage::Stage,
    tooltip::TooltipSink,
};

/// Visible fraction of a slide that triggers its build.
pub const BUILD_THRESHOLD: f32 = 0.85;

/// A deck definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub slides: Vec<SlideConfig>,
}

impl DeckConfig {
    /// Parses a deck from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Json`] if the text is not a valid deck.
    pub fn from_json(text: &str) -> Result<Self, GeoError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the slide with the given id.
    pub fn slide(&self, id: &str) -> Option<&SlideConfig> {
        self.slides.iter().find(|slide| slide.id == id)
    }
}

/// A slide's figure in nested form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub fig_sel: Option<String>,
    #[serde(default)]
    pub props: Value,
}

/// One slide.
///
/// The figure is given either flat (`type`, `figSel`, `props` on the slide)
/// or nested under `figure`; the nested form wins when both are present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideConfig {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub fig_sel: Option<String>,
    #[serde(default)]
    pub props: Value,
    #[serde(default)]
    pub figure: Option<FigureConfig>,
}

impl SlideConfig {
    /// Returns the chart this slide builds, if any.
    ///
    /// The container defaults to `#<id>-fig`.
    pub fn chart(&self) -> Option<ChartRequest> {
        let (kind, fig_sel, props) = match &self.figure {
            Some(figure) => (&figure.kind, &figure.fig_sel, &figure.props),
            None => (self.kind.as_ref()?, &self.fig_sel, &self.props),
        };
        let container = fig_sel
            .clone()
            .unwrap_or_else(|| format!("#{}-fig", self.id));
        Some(ChartRequest::new(kind.clone(), container, props.clone()))
    }
}

/// Presents a deck: lays out slides, builds charts on view, drives time.
pub struct Presenter {
    ctx: ChartContext,
    registry: ChartRegistry,
    pool: LocalPool,
    spawner: LocalSpawner,
    charts: Vec<(String, Option<ChartRequest>)>,
    queue: Rc<RefCell<VecDeque<String>>>,
    built: HashSet<String>,
    failures: Rc<RefCell<Vec<(String, GeoError)>>>,
}

impl Presenter {
    /// Creates a presenter with the default chart registry.
    pub fn new(
        settings: AppConfig,
        source: Rc<dyn BoundarySource>,
        tooltip: Rc<dyn TooltipSink>,
    ) -> Self {
        Self::with_registry(settings, source, tooltip, ChartRegistry::with_defaults())
    }

    /// Creates a presenter building charts through `registry`.
    pub fn with_registry(
        settings: AppConfig,
        source: Rc<dyn BoundarySource>,
        tooltip: Rc<dyn TooltipSink>,
        registry: ChartRegistry,
    ) -> Self {
        let stage = Stage::new(*settings.timing(), *settings.viewport());
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            ctx: ChartContext {
                stage: Rc::new(RefCell::new(stage)),
                topologies: TopologyCache::new(source),
                tooltip,
                settings: Rc::new(settings),
            },
            registry,
            pool,
            spawner,
            charts: Vec::new(),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            built: HashSet::new(),
            failures: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns the shared chart context.
    pub fn context(&self) -> &ChartContext {
        &self.ctx
    }

    /// Returns the stage.
    pub fn stage(&self) -> Ref<'_, Stage> {
        self.ctx.stage.borrow()
    }

    /// Lays out the deck's slides and arms their build watches.
    ///
    /// Slides already visible enough are built right away. Without
    /// intersection support every slide is built immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] if two slides share an id or a figure
    /// container.
    pub fn load(&mut self, deck: &DeckConfig) -> Result<(), GeoError> {
        let supports_intersection = self.ctx.settings.viewport().supports_intersection();
        {
            let mut stage = self.ctx.stage.borrow_mut();
            for slide in &deck.slides {
                if self.charts.iter().any(|(id, _)| *id == slide.id) {
                    return Err(GeoError::Config(format!("duplicate slide id `{}`", slide.id)));
                }
                stage.add_scene(slide.id.as_str());
                let chart = slide.chart();
                if let Some(request) = &chart {
                    if stage.has_container(&request.container) {
                        return Err(GeoError::Config(format!(
                            "duplicate figure container `{}`",
                            request.container
                        )));
                    }
                    stage.add_container(request.container.as_str(), &slide.id)?;
                }
                self.charts.push((slide.id.clone(), chart));

                if supports_intersection {
                    let queue = Rc::clone(&self.queue);
                    let id = slide.id.clone();
                    stage.watch_intersection(slide.id.as_str(), BUILD_THRESHOLD, move |_| {
                        queue.borrow_mut().push_back(id);
                    });
                } else {
                    self.queue.borrow_mut().push_back(slide.id.clone());
                }
            }
            info!(slides = deck.slides.len(), supports_intersection; "Deck loaded");

            let scroll_y = stage.scroll_y();
            stage.scroll_to(scroll_y);
        }
        self.flush();
        Ok(())
    }

    /// Scrolls to an offset and builds slides that came into view.
    pub fn scroll_to(&mut self, y: f32) {
        self.ctx.stage.borrow_mut().scroll_to(y);
        self.flush();
    }

    /// Scrolls so that a slide fills the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] if the slide does not exist.
    pub fn scroll_to_slide(&mut self, id: &str) -> Result<(), GeoError> {
        self.ctx.stage.borrow_mut().scroll_to_scene(id)?;
        self.flush();
        Ok(())
    }

    /// Advances the clock by `ms`, building slides between frames.
    pub fn advance(&mut self, ms: f64) {
        let frame = self.ctx.settings.timing().frame_ms();
        let mut remaining = ms.max(0.0);
        while remaining > 0.0 {
            let step = remaining.min(frame);
            self.ctx.stage.borrow_mut().advance(step);
            self.flush();
            remaining -= step;
        }
    }

    /// Sets the document-hidden flag.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.ctx.stage.borrow_mut().set_hidden(hidden);
    }

    /// Returns `true` once a slide's build has been started.
    pub fn is_built(&self, id: &str) -> bool {
        self.built.contains(id)
    }

    /// Takes the build failures recorded so far, by slide id.
    pub fn take_failures(&mut self) -> Vec<(String, GeoError)> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }

    /// Exports a slide's chart as a standalone SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Config`] for an unknown slide,
    /// [`GeoError::Export`] for a slide without a chart and the stage's
    /// export error if the chart was never mounted.
    pub fn export_slide(&self, id: &str) -> Result<svg::Document, GeoError> {
        let (_, chart) = self
            .charts
            .iter()
            .find(|(slide, _)| slide == id)
            .ok_or_else(|| GeoError::Config(format!("slide `{id}` not found")))?;
        let request = chart
            .as_ref()
            .ok_or_else(|| GeoError::Export(format!("slide `{id}` has no chart")))?;
        self.ctx.stage.borrow().export_chart(&request.container)
    }

    /// Starts queued builds and runs the executor until it stalls.
    fn flush(&mut self) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(id) = next else {
                break;
            };
            if !self.built.insert(id.clone()) {
                continue;
            }
            let request = self
                .charts
                .iter()
                .find(|(slide, _)| *slide == id)
                .and_then(|(_, chart)| chart.clone());
            let Some(request) = request else {
                debug!(slide = id.as_str(); "Slide has no chart");
                continue;
            };
            let Some(builder) = self.registry.resolve(&request.kind) else {
                warn!(slide = id.as_str(), kind = request.kind.as_str(); "Unknown chart type, skipping");
                continue;
            };

            debug!(slide = id.as_str(), kind = request.kind.as_str(); "Building slide");
            let build = builder.build(&self.ctx, request);
            let failures = Rc::clone(&self.failures);
            let spawned = self.spawner.spawn_local(async move {
                if let Err(err) = build.await {
                    warn!(slide = id.as_str(), err:%; "Chart build failed");
                    failures.borrow_mut().push((id, err));
                }
            });
            if let Err(err) = spawned {
                warn!(err:%; "Failed to spawn chart build");
            }
        }
        self.pool.run_until_stalled();
    }
}

impl fmt::Debug for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter")
            .field("registry", &self.registry)
            .field("slides", &self.charts.len())
            .field("built", &self.built.len())
            .finish_non_exhaustive()
    }
}
