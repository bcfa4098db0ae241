//! Geometric primitives for chart drawing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in screen space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle used for clip extents
//!
//! # Coordinate System
//!
//! Geodeck uses the SVG coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```

/// A 2D point in screen space.
///
/// # Examples
///
/// ```
/// # use geodeck_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the vector rotated a quarter turn, `(-y, x)`.
    pub fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Returns `true` when both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of a drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    /// Creates a new size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height
    pub fn height(self) -> f32 {
        self.height
    }
}

/// An axis-aligned rectangle defined by its minimum and maximum corners.
///
/// # Examples
///
/// ```
/// # use geodeck_core::geometry::{Bounds, Point};
/// let bounds = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 5.0));
/// assert!(bounds.contains(Point::new(10.0, 5.0)));
/// assert!(!bounds.contains(Point::new(10.1, 5.0)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    /// Creates bounds from two corners, normalizing their order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Returns the top-left corner
    pub fn min(self) -> Point {
        self.min
    }

    /// Returns the bottom-right corner
    pub fn max(self) -> Point {
        self.max
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    /// Returns `true` if the point lies inside or on the edge of the bounds.
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Returns the four corners in clockwise order starting at the top-left.
    pub fn corners(self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    /// Clips a closed polygon to these bounds (Sutherland–Hodgman).
    ///
    /// The input ring may repeat its first point at the end; the output is
    /// open (the closing edge is implicit). An empty vector is returned when
    /// the polygon lies entirely outside.
    pub fn clip_polygon(self, ring: &[Point]) -> Vec<Point> {
        let mut output: Vec<Point> = ring.to_vec();
        if output.len() > 1 && output.first() == output.last() {
            output.pop();
        }

        let edges: [(fn(Point, Bounds) -> bool, fn(Point, Point, Bounds) -> Point); 4] = [
            (
                |p, b| p.x >= b.min.x,
                |a, c, b| intersect_vertical(a, c, b.min.x),
            ),
            (
                |p, b| p.x <= b.max.x,
                |a, c, b| intersect_vertical(a, c, b.max.x),
            ),
            (
                |p, b| p.y >= b.min.y,
                |a, c, b| intersect_horizontal(a, c, b.min.y),
            ),
            (
                |p, b| p.y <= b.max.y,
                |a, c, b| intersect_horizontal(a, c, b.max.y),
            ),
        ];

        for (inside, intersect) in edges {
            if output.is_empty() {
                break;
            }
            let input = std::mem::take(&mut output);
            let mut prev = input[input.len() - 1];
            for &current in &input {
                let cur_in = inside(current, self);
                let prev_in = inside(prev, self);
                if cur_in {
                    if !prev_in {
                        output.push(intersect(prev, current, self));
                    }
                    output.push(current);
                } else if prev_in {
                    output.push(intersect(prev, current, self));
                }
                prev = current;
            }
        }

        output
    }
}

fn intersect_vertical(a: Point, b: Point, x: f32) -> Point {
    let t = (x - a.x) / (b.x - a.x);
    Point::new(x, a.y + (b.y - a.y) * t)
}

fn intersect_horizontal(a: Point, b: Point, y: f32) -> Point {
    let t = (y - a.y) / (b.y - a.y);
    Point::new(a.x + (b.x - a.x) * t, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!(approx_eq!(f32, a.distance(b), 5.0));
    }

    #[test]
    fn test_point_perpendicular() {
        let p = Point::new(2.0, 1.0).perpendicular();
        assert_eq!(p, Point::new(-1.0, 2.0));
    }

    #[test]
    fn test_bounds_normalizes_corners() {
        let b = Bounds::new(Point::new(10.0, 8.0), Point::new(2.0, 4.0));
        assert_eq!(b.min(), Point::new(2.0, 4.0));
        assert_eq!(b.max(), Point::new(10.0, 8.0));
        assert!(approx_eq!(f32, b.width(), 8.0));
        assert!(approx_eq!(f32, b.height(), 4.0));
    }

    #[test]
    fn test_clip_polygon_inside_is_unchanged() {
        let b = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let ring = [
            Point::new(1.0, 1.0),
            Point::new(5.0, 1.0),
            Point::new(5.0, 5.0),
            Point::new(1.0, 1.0),
        ];
        let clipped = b.clip_polygon(&ring);
        assert_eq!(clipped.len(), 3);
    }

    #[test]
    fn test_clip_polygon_outside_is_empty() {
        let b = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let ring = [
            Point::new(20.0, 20.0),
            Point::new(30.0, 20.0),
            Point::new(30.0, 30.0),
        ];
        assert!(b.clip_polygon(&ring).is_empty());
    }

    #[test]
    fn test_clip_polygon_straddling() {
        let b = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let ring = [
            Point::new(-5.0, 2.0),
            Point::new(5.0, 2.0),
            Point::new(5.0, 8.0),
            Point::new(-5.0, 8.0),
        ];
        let clipped = b.clip_polygon(&ring);

        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| b.contains(*p)));
        assert!(clipped.iter().any(|p| approx_eq!(f32, p.x(), 0.0)));
    }
}
