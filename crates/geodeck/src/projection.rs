//! Map projections fit to an output size.
//!
//! A [`Projection`] maps a longitude/latitude pair in degrees to screen
//! coordinates, or to `None` when the location cannot be projected (for
//! example a point outside every inset of [`AlbersUsa`]). Callers drop
//! unprojectable points instead of drawing them at undefined positions.
//!
//! # Overview
//!
//! - [`AlbersUsa`]: composite conic equal-area projection of the lower 48
//!   states with Alaska and Hawaii insets.
//! - [`Equirectangular`]: plate carrée over the whole sphere.
//! - [`ProjectionSpec`]: a named projection or a caller-supplied factory.

use std::{f64::consts::PI, fmt, rc::Rc};

use geodeck_core::geometry::{Bounds, Point, Size};

const EPSILON: f64 = 1e-6;

/// A projection from geographic to screen coordinates.
pub trait Projection {
    /// Projects `(lon, lat)` in degrees. Returns `None` if unprojectable.
    fn project(&self, lon: f64, lat: f64) -> Option<Point>;

    /// Projects a polygon ring given as `[lon, lat]` positions.
    ///
    /// A ring may come back as several pieces (one per inset it falls into)
    /// or none at all. Every returned piece has at least three points and is
    /// open: the closing point is not repeated.
    fn project_ring(&self, ring: &[[f64; 2]]) -> Vec<Vec<Point>> {
        let mut points: Vec<Point> = ring
            .iter()
            .filter_map(|[lon, lat]| self.project(*lon, *lat))
            .collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            Vec::new()
        } else {
            vec![points]
        }
    }

    /// Returns the outline of the projected sphere as closed rings.
    fn outline(&self) -> Vec<Vec<Point>>;
}

/// Factory building a projection for an output size.
pub type ProjectionFactory = Rc<dyn Fn(Size) -> Rc<dyn Projection>>;

/// Selects the projection of a chart.
#[derive(Clone, Default)]
pub enum ProjectionSpec {
    /// Composite USA projection (the default).
    #[default]
    AlbersUsa,
    /// Whole-world plate carrée.
    Equirectangular,
    /// A caller-supplied factory.
    Custom(ProjectionFactory),
}

impl ProjectionSpec {
    /// Creates a custom projection spec from a factory closure.
    pub fn custom(factory: impl Fn(Size) -> Rc<dyn Projection> + 'static) -> Self {
        Self::Custom(Rc::new(factory))
    }

    /// Builds the projection fit to `size`.
    pub fn build(&self, size: Size) -> Rc<dyn Projection> {
        match self {
            Self::AlbersUsa => Rc::new(AlbersUsa::fit(size)),
            Self::Equirectangular => Rc::new(Equirectangular::fit(size)),
            Self::Custom(factory) => factory(size),
        }
    }
}

impl fmt::Debug for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlbersUsa => f.write_str("AlbersUsa"),
            Self::Equirectangular => f.write_str("Equirectangular"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl TryFrom<String> for ProjectionSpec {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        match name.as_str() {
            "albers-usa" | "albersUsa" => Ok(Self::AlbersUsa),
            "equirectangular" => Ok(Self::Equirectangular),
            _ => Err(format!(
                "unknown projection `{name}`, valid values: albers-usa, equirectangular"
            )),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ProjectionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::try_from(name).map_err(serde::de::Error::custom)
    }
}

/// Conic equal-area projection with a rotation, center, scale and translate.
#[derive(Debug, Clone, Copy)]
struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate: f64,
    k: f64,
    dx: f64,
    dy: f64,
}

impl ConicEqualArea {
    /// All angles in degrees.
    fn new(parallels: [f64; 2], rotate: f64, center: [f64; 2], k: f64, translate: [f64; 2]) -> Self {
        let sy0 = parallels[0].to_radians().sin();
        let n = (sy0 + parallels[1].to_radians().sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;

        let mut projection = Self {
            n,
            c,
            r0,
            rotate: rotate.to_radians(),
            k,
            dx: 0.0,
            dy: 0.0,
        };
        let (cx, cy) = projection.raw(center[0].to_radians(), center[1].to_radians());
        projection.dx = translate[0] - k * cx;
        projection.dy = translate[1] + k * cy;
        projection
    }

    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let r = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
        let angle = lambda * self.n;
        (r * angle.sin(), self.r0 - r * angle.cos())
    }

    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let mut lambda = lon.to_radians() + self.rotate;
        if lambda > PI {
            lambda -= 2.0 * PI;
        } else if lambda < -PI {
            lambda += 2.0 * PI;
        }
        let (x, y) = self.raw(lambda, lat.to_radians());
        let point = (self.dx + self.k * x, self.dy - self.k * y);
        (point.0.is_finite() && point.1.is_finite()).then_some(point)
    }
}

/// One inset of the composite projection: a conic projection and its clip extent.
#[derive(Debug, Clone, Copy)]
struct Inset {
    projection: ConicEqualArea,
    clip: [[f64; 2]; 2],
}

impl Inset {
    fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.clip[0][0] && x <= self.clip[1][0] && y >= self.clip[0][1] && y <= self.clip[1][1]
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(
            Point::new(self.clip[0][0] as f32, self.clip[0][1] as f32),
            Point::new(self.clip[1][0] as f32, self.clip[1][1] as f32),
        )
    }
}

/// Composite conic equal-area projection of the United States.
///
/// The lower 48 states, Alaska (at 0.35 scale) and Hawaii each use their own
/// conic projection and clip extent. A point is projected by the first inset
/// whose extent contains it, trying the lower 48, then Alaska, then Hawaii.
///
/// # Examples
///
/// ```
/// use geodeck::projection::{AlbersUsa, Projection};
/// use geodeck_core::geometry::Size;
///
/// let projection = AlbersUsa::fit(Size::new(1200.0, 720.0));
/// assert!(projection.project(-98.5, 39.5).is_some());
/// assert!(projection.project(0.0, 51.5).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AlbersUsa {
    scale: f64,
    translate: [f64; 2],
    insets: [Inset; 3],
}

impl AlbersUsa {
    /// Creates the projection with an explicit scale and translate.
    pub fn new(k: f64, translate: [f64; 2]) -> Self {
        let [x, y] = translate;

        let lower48 = Inset {
            projection: ConicEqualArea::new([29.5, 45.5], 96.0, [-0.6, 38.7], k, [x, y]),
            clip: [[x - 0.455 * k, y - 0.238 * k], [x + 0.455 * k, y + 0.238 * k]],
        };
        let alaska = Inset {
            projection: ConicEqualArea::new(
                [55.0, 65.0],
                154.0,
                [-2.0, 58.5],
                0.35 * k,
                [x - 0.307 * k, y + 0.201 * k],
            ),
            clip: [
                [x - 0.425 * k + EPSILON, y + 0.120 * k + EPSILON],
                [x - 0.214 * k - EPSILON, y + 0.234 * k - EPSILON],
            ],
        };
        let hawaii = Inset {
            projection: ConicEqualArea::new(
                [8.0, 18.0],
                157.0,
                [-3.0, 19.9],
                k,
                [x - 0.205 * k, y + 0.212 * k],
            ),
            clip: [
                [x - 0.214 * k + EPSILON, y + 0.166 * k + EPSILON],
                [x - 0.115 * k - EPSILON, y + 0.234 * k - EPSILON],
            ],
        };

        Self {
            scale: k,
            translate,
            insets: [lower48, alaska, hawaii],
        }
    }

    /// Fits the projection's full extent to `size`, centered.
    pub fn fit(size: Size) -> Self {
        let width = f64::from(size.width());
        let height = f64::from(size.height());
        let k = (width / 0.91).min(height / 0.476);
        Self::new(k, [width / 2.0, height / 2.0])
    }

    /// Returns the scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the translate (the screen position of the lower-48 center).
    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }
}

impl Projection for AlbersUsa {
    fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        self.insets.iter().find_map(|inset| {
            inset
                .projection
                .project(lon, lat)
                .filter(|p| inset.contains(*p))
                .map(|(x, y)| Point::new(x as f32, y as f32))
        })
    }

    fn project_ring(&self, ring: &[[f64; 2]]) -> Vec<Vec<Point>> {
        self.insets
            .iter()
            .filter_map(|inset| {
                let projected: Vec<Point> = ring
                    .iter()
                    .filter_map(|[lon, lat]| inset.projection.project(*lon, *lat))
                    .map(|(x, y)| Point::new(x as f32, y as f32))
                    .collect();
                let clipped = inset.bounds().clip_polygon(&projected);
                (clipped.len() >= 3).then_some(clipped)
            })
            .collect()
    }

    fn outline(&self) -> Vec<Vec<Point>> {
        self.insets
            .iter()
            .map(|inset| inset.bounds().corners().to_vec())
            .collect()
    }
}

/// Equirectangular (plate carrée) projection of the whole sphere.
#[derive(Debug, Clone, Copy)]
pub struct Equirectangular {
    k: f64,
    translate: [f64; 2],
}

impl Equirectangular {
    /// Creates the projection with an explicit scale and translate.
    pub fn new(k: f64, translate: [f64; 2]) -> Self {
        Self { k, translate }
    }

    /// Fits the whole sphere to `size`, centered.
    pub fn fit(size: Size) -> Self {
        let width = f64::from(size.width());
        let height = f64::from(size.height());
        let k = (width / (2.0 * PI)).min(height / PI);
        Self::new(k, [width / 2.0, height / 2.0])
    }

    /// Returns the scale.
    pub fn scale(&self) -> f64 {
        self.k
    }
}

impl Projection for Equirectangular {
    fn project(&self, lon: f64, lat: f64) -> Option<Point> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        let mut lambda = lon.to_radians();
        if lambda > PI {
            lambda -= 2.0 * PI;
        } else if lambda < -PI {
            lambda += 2.0 * PI;
        }
        let x = self.translate[0] + self.k * lambda;
        let y = self.translate[1] - self.k * lat.to_radians();
        Some(Point::new(x as f32, y as f32))
    }

    fn outline(&self) -> Vec<Vec<Point>> {
        let half_w = self.k * PI;
        let half_h = self.k * PI / 2.0;
        let [x, y] = self.translate;
        let bounds = Bounds::new(
            Point::new((x - half_w) as f32, (y - half_h) as f32),
            Point::new((x + half_w) as f32, (y + half_h) as f32),
        );
        vec![bounds.corners().to_vec()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_albers_fit_scale() {
        let projection = AlbersUsa::fit(Size::new(1200.0, 720.0));
        // 1200 / 0.91 < 720 / 0.476
        assert!(approx_eq!(f64, projection.scale(), 1200.0 / 0.91, epsilon = 1e-9));
        assert_eq!(projection.translate(), [600.0, 360.0]);
    }

    #[test]
    fn test_albers_center_maps_to_translate() {
        // Rotating by 96 degrees puts (-96.6, 38.7) at the lower-48 center.
        let projection = AlbersUsa::fit(Size::new(960.0, 600.0));
        let p = projection.project(-96.6, 38.7).unwrap();
        assert!(approx_eq!(f32, p.x(), 480.0, epsilon = 0.01));
        assert!(approx_eq!(f32, p.y(), 300.0, epsilon = 0.01));
    }

    #[test]
    fn test_albers_matches_reference_scale() {
        // Standard 975x610 frame uses scale 1300 and translate (487.5, 305).
        let projection = AlbersUsa::new(1300.0, [487.5, 305.0]);
        let dc = projection.project(-77.0369, 38.9072).unwrap();
        assert!(dc.x() > 800.0 && dc.x() < 840.0, "x = {}", dc.x());
        assert!(dc.y() > 240.0 && dc.y() < 270.0, "y = {}", dc.y());
    }

    #[test]
    fn test_albers_insets() {
        let projection = AlbersUsa::fit(Size::new(960.0, 600.0));
        let k = projection.scale() as f32;

        let anchorage = projection.project(-149.9, 61.2).unwrap();
        assert!(anchorage.x() < 480.0 - 0.214 * k);
        assert!(anchorage.y() > 300.0 + 0.120 * k);

        let honolulu = projection.project(-157.86, 21.31).unwrap();
        assert!(honolulu.x() > 480.0 - 0.214 * k && honolulu.x() < 480.0 - 0.115 * k);
        assert!(honolulu.y() > 300.0 + 0.166 * k);
    }

    #[test]
    fn test_albers_unprojectable() {
        let projection = AlbersUsa::fit(Size::new(960.0, 600.0));
        assert!(projection.project(2.35, 48.85).is_none());
        assert!(projection.project(f64::NAN, 40.0).is_none());
    }

    #[test]
    fn test_albers_outline_has_three_insets() {
        let projection = AlbersUsa::fit(Size::new(960.0, 600.0));
        let outline = projection.outline();
        assert_eq!(outline.len(), 3);
        assert!(outline.iter().all(|ring| ring.len() == 4));
    }

    #[test]
    fn test_albers_ring_is_clipped_to_inset() {
        let projection = AlbersUsa::fit(Size::new(960.0, 600.0));
        let ring = [[-100.0, 35.0], [-95.0, 35.0], [-95.0, 40.0], [-100.0, 40.0], [-100.0, 35.0]];
        let pieces = projection.project_ring(&ring);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].len(), 4);
    }

    #[test]
    fn test_equirectangular() {
        let projection = Equirectangular::fit(Size::new(720.0, 360.0));
        let center = projection.project(0.0, 0.0).unwrap();
        assert_eq!((center.x(), center.y()), (360.0, 180.0));

        let corner = projection.project(180.0, 90.0).unwrap();
        assert!(approx_eq!(f32, corner.x(), 720.0, epsilon = 0.01));
        assert!(approx_eq!(f32, corner.y(), 0.0, epsilon = 0.01));
        assert!(projection.project(0.0, 91.0).is_none());
    }

    #[test]
    fn test_spec_from_name() {
        assert!(matches!(
            ProjectionSpec::try_from("albers-usa".to_string()),
            Ok(ProjectionSpec::AlbersUsa)
        ));
        assert!(matches!(
            ProjectionSpec::try_from("equirectangular".to_string()),
            Ok(ProjectionSpec::Equirectangular)
        ));
        assert!(ProjectionSpec::try_from("mercator".to_string()).is_err());
    }

    #[test]
    fn test_custom_factory_receives_size() {
        let spec = ProjectionSpec::custom(|size| Rc::new(Equirectangular::fit(size)));
        let projection = spec.build(Size::new(360.0, 180.0));
        let p = projection.project(0.0, 0.0).unwrap();
        assert_eq!((p.x(), p.y()), (180.0, 90.0));
    }
}
