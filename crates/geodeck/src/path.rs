//! Path generation for projected geometry.

use std::{fmt, rc::Rc};

use geodeck_core::draw::PathData;

use crate::{projection::Projection, topology::Geometry};

/// Turns sphere outlines and polygon geometries into SVG path data through a
/// projection.
#[derive(Clone)]
pub struct GeoPath {
    projection: Rc<dyn Projection>,
}

impl GeoPath {
    /// Creates a path generator bound to `projection`.
    pub fn new(projection: Rc<dyn Projection>) -> Self {
        Self { projection }
    }

    /// Returns the underlying projection.
    pub fn projection(&self) -> &Rc<dyn Projection> {
        &self.projection
    }

    /// Path of the projected sphere outline.
    pub fn sphere(&self) -> PathData {
        self.projection
            .outline()
            .iter()
            .fold(PathData::new(), |path, ring| path.ring(ring))
    }

    /// Path of a polygonal geometry. Empty if nothing is projectable.
    pub fn geometry(&self, geometry: &Geometry) -> PathData {
        geometry
            .rings()
            .flat_map(|ring| self.projection.project_ring(ring))
            .fold(PathData::new(), |path, piece| path.ring(&piece))
    }
}

impl fmt::Debug for GeoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoPath").finish_non_exhaustive()
    }
}
