//! SVG path data construction.

use std::fmt::Write as _;

use crate::geometry::Point;

/// Formats a number for SVG output with at most three decimals.
///
/// # Examples
///
/// ```
/// use geodeck_core::draw::format_number;
///
/// assert_eq!(format_number(4.6), "4.6");
/// assert_eq!(format_number(12.34567), "12.346");
/// assert_eq!(format_number(-0.0001), "0");
/// ```
pub fn format_number(value: f32) -> String {
    let rounded = (f64::from(value) * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Builder for the `d` attribute of an SVG path.
///
/// # Examples
///
/// ```
/// use geodeck_core::{draw::PathData, geometry::Point};
///
/// let d = PathData::new()
///     .move_to(Point::new(0.0, 0.0))
///     .line_to(Point::new(10.0, 0.0))
///     .close()
///     .to_string();
/// assert_eq!(d, "M0,0L10,0Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    commands: String,
}

impl PathData {
    /// Creates empty path data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when no command has been added.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Starts a new subpath.
    pub fn move_to(self, p: Point) -> Self {
        self.command('M', &[p])
    }

    /// Draws a straight segment.
    pub fn line_to(self, p: Point) -> Self {
        self.command('L', &[p])
    }

    /// Draws a cubic Bézier segment.
    pub fn cubic_to(self, c1: Point, c2: Point, p: Point) -> Self {
        self.command('C', &[c1, c2, p])
    }

    /// Closes the current subpath.
    pub fn close(mut self) -> Self {
        self.commands.push('Z');
        self
    }

    /// Appends a closed polygon ring. Rings with fewer than three points are skipped.
    pub fn ring(self, points: &[Point]) -> Self {
        if points.len() < 3 {
            return self;
        }
        let mut data = self.move_to(points[0]);
        for p in &points[1..] {
            data = data.line_to(*p);
        }
        data.close()
    }

    /// Appends an open polyline through `points`.
    pub fn polyline(self, points: &[Point]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return self;
        };
        let mut data = self.move_to(*first);
        for p in rest {
            data = data.line_to(*p);
        }
        data
    }

    /// Appends a bundled B-spline through `points`.
    ///
    /// Interior points are first straightened toward the chord between the
    /// endpoints by `1 - beta`, then a uniform cubic B-spline is drawn that
    /// starts at the first point and ends at the last one. With `beta == 1`
    /// this is a plain basis spline; with `beta == 0` it is a straight line.
    pub fn bundle(self, points: &[Point], beta: f32) -> Self {
        let n = points.len();
        if n < 3 {
            return self.polyline(points);
        }

        let beta = beta.clamp(0.0, 1.0);
        let first = points[0];
        let delta = points[n - 1].sub_point(first);
        let straightened: Vec<Point> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let on_chord = first.add_point(delta.scale(i as f32 / (n - 1) as f32));
                p.scale(beta).add_point(on_chord.scale(1.0 - beta))
            })
            .collect();

        self.basis(&straightened)
    }

    fn basis(self, points: &[Point]) -> Self {
        let blend = |a: Point, b: Point, wa: f32, wb: f32, total: f32| {
            a.scale(wa).add_point(b.scale(wb)).scale(1.0 / total)
        };

        let mut data = self.move_to(points[0]);
        data = data.line_to(blend(points[0], points[1], 5.0, 1.0, 6.0));
        for window in points.windows(3) {
            let (p0, p1, p2) = (window[0], window[1], window[2]);
            data = data.cubic_to(
                blend(p0, p1, 2.0, 1.0, 3.0),
                blend(p0, p1, 1.0, 2.0, 3.0),
                p0.add_point(p1.scale(4.0)).add_point(p2).scale(1.0 / 6.0),
            );
        }

        let n = points.len();
        let (p0, p1) = (points[n - 2], points[n - 1]);
        data = data.cubic_to(
            blend(p0, p1, 2.0, 1.0, 3.0),
            blend(p0, p1, 1.0, 2.0, 3.0),
            blend(p0, p1, 1.0, 5.0, 6.0),
        );
        data.line_to(p1)
    }

    fn command(mut self, op: char, points: &[Point]) -> Self {
        self.commands.push(op);
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                self.commands.push(',');
            }
            let _ = write!(
                self.commands,
                "{},{}",
                format_number(p.x()),
                format_number(p.y())
            );
        }
        self
    }
}

impl std::fmt::Display for PathData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(60.0), "60");
        assert_eq!(format_number(0.95), "0.95");
        assert_eq!(format_number(-3.5), "-3.5");
    }

    #[test]
    fn test_ring_skips_degenerate() {
        let d = PathData::new().ring(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(d.is_empty());
    }

    #[test]
    fn test_ring_closes() {
        let d = PathData::new().ring(&[
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
        ]);
        assert_eq!(d.to_string(), "M0,0L4,0L4,4Z");
    }

    #[test]
    fn test_bundle_endpoints() {
        let a = Point::new(0.0, 0.0);
        let c = Point::new(6.0, 6.0);
        let b = Point::new(12.0, 0.0);
        let d = PathData::new().bundle(&[a, c, b], 0.8).to_string();

        assert!(d.starts_with("M0,0L"));
        assert!(d.ends_with("L12,0"));
        assert_eq!(d.matches('C').count(), 2);
    }

    #[test]
    fn test_bundle_beta_zero_is_straight() {
        let d = PathData::new()
            .bundle(
                &[
                    Point::new(0.0, 0.0),
                    Point::new(6.0, 6.0),
                    Point::new(12.0, 0.0),
                ],
                0.0,
            )
            .to_string();
        assert_eq!(d, "M0,0L1,0C2,0,4,0,6,0C8,0,10,0,11,0L12,0");
    }

    #[test]
    fn test_bundle_two_points_is_line() {
        let d = PathData::new()
            .bundle(&[Point::new(0.0, 0.0), Point::new(3.0, 4.0)], 0.8)
            .to_string();
        assert_eq!(d, "M0,0L3,4");
    }
}
