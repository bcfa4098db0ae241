//! Layer renderers of the geo chart.
//!
//! Each renderer draws its initial state into the chart root and returns a
//! [`LayerBuild`] whose finalize closure animates that state to its final
//! values. Finalize closures run only after the chart has faded in, in
//! [`LayerKind`] order.
//!
//! # Overview
//!
//! - [`choropleth`]: region fills driven by per-region values
//! - [`bubbles`]: magnitude-sized point bubbles with labels and tooltips
//! - [`flow`]: bundled arcs with marching dashes between named nodes
//! - [`hexgrid`]: hex-binned density field
//! - [`plumes`]: radial gradient plumes with dashed outlines
//! - [`rings`]: dashed rings marching around points

pub mod bubbles;
pub mod choropleth;
pub mod flow;
pub mod hexgrid;
pub mod plumes;
pub mod rings;

use std::{fmt, rc::Rc};

use log::trace;

use geodeck_core::{color::Color, geometry::Point};

use crate::{
    config::TimingConfig,
    error::GeoError,
    projection::Projection,
    stage::{ChartMount, Stage},
    tooltip::TooltipSink,
};

/// Layer identity. The derived order is the finalize order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Choropleth,
    Bubbles,
    Flow,
    Hexgrid,
    Plumes,
    Rings,
}

impl LayerKind {
    /// Returns the configuration key of this layer.
    pub fn name(self) -> &'static str {
        match self {
            Self::Choropleth => "choropleth",
            Self::Bubbles => "bubbles",
            Self::Flow => "flow",
            Self::Hexgrid => "hexgrid",
            Self::Plumes => "plumes",
            Self::Rings => "rings",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entrance animation of a layer, run once after the reveal fade.
pub type Finalize = Box<dyn FnOnce(&mut Stage) -> Result<(), GeoError>>;

/// A drawn layer and its pending entrance animation.
pub struct LayerBuild {
    pub kind: LayerKind,
    pub finalize: Finalize,
}

impl LayerBuild {
    /// Pairs a layer kind with its finalize closure.
    pub fn new(
        kind: LayerKind,
        finalize: impl FnOnce(&mut Stage) -> Result<(), GeoError> + 'static,
    ) -> Self {
        Self {
            kind,
            finalize: Box::new(finalize),
        }
    }
}

impl fmt::Debug for LayerBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBuild")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Resolved theme colors layers fall back to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub ink: Color,
    pub brand: Color,
}

/// Everything a layer renderer draws with.
pub struct DrawContext<'a> {
    pub stage: &'a mut Stage,
    pub mount: ChartMount,
    /// Stable identifier of the chart, used for document-unique ids.
    pub chart_id: String,
    pub projection: Rc<dyn Projection>,
    pub theme: Theme,
    pub timing: TimingConfig,
    pub tooltip: Rc<dyn TooltipSink>,
}

impl DrawContext<'_> {
    /// Projects a coordinate, skipping non-finite input and unprojectable
    /// output.
    pub fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        if !lon.is_finite() || !lat.is_finite() {
            trace!(lon, lat; "Skipping non-finite coordinate");
            return None;
        }
        let point = self.projection.project(lon, lat);
        if point.is_none() {
            trace!(lon, lat; "Skipping unprojectable coordinate");
        }
        point.filter(|p| p.is_finite())
    }
}

impl fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawContext")
            .field("mount", &self.mount)
            .field("chart_id", &self.chart_id)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
