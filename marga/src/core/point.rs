//! Point and coordinate types for the configuration-space lattice.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Grid cell coordinates (integer cell indices).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column index (axis 1)
    pub x: i64,
    /// Row index (axis 2)
    pub y: i64,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Get the 4 cardinal neighbors (N, E, S, W)
    #[inline]
    pub fn neighbors_4(&self) -> [GridCoord; 4] {
        [
            GridCoord::new(self.x, self.y + 1), // North
            GridCoord::new(self.x + 1, self.y), // East
            GridCoord::new(self.x, self.y - 1), // South
            GridCoord::new(self.x - 1, self.y), // West
        ]
    }
}

/// Point in lattice coordinates (cell units, f64).
///
/// Cell `(i, j)` covers `[i, i+1] x [j, j+1]`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero point (origin)
    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Dot product, treating both points as vectors
    #[inline]
    pub fn dot(&self, other: Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component)
    #[inline]
    pub fn cross(&self, other: Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Vector length
    #[inline]
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    #[inline]
    pub fn normalized(&self) -> Option<Point2D> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(Point2D::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Rotate by +90 degrees
    #[inline]
    pub fn perp(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    /// Linear interpolation towards `other`
    #[inline]
    pub fn lerp(&self, other: Point2D, t: f64) -> Point2D {
        Point2D::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Grid cell containing this point
    #[inline]
    pub fn cell(&self) -> GridCoord {
        GridCoord::new(self.x.floor() as i64, self.y.floor() as i64)
    }

    /// True if both coordinates are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Point2D::new(p[0], p[1])
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Point2D::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Point2D::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    #[inline]
    fn mul(self, s: f64) -> Self {
        Point2D::new(self.x * s, self.y * s)
    }
}

impl Neg for Point2D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Point2D::new(-self.x, -self.y)
    }
}

/// Distance from `p` to the closed segment `a`-`b`.
pub fn point_segment_distance(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Angle between two direction vectors in `[0, pi]`.
pub fn turning_angle(d1: Point2D, d2: Point2D) -> f64 {
    let cross = d1.cross(d2);
    let dot = d1.dot(d2);
    cross.atan2(dot).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_ops() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_relative_eq!(a.distance(b), 5.0);
        assert_eq!(b - a, Point2D::new(3.0, 4.0));
        assert_eq!(a + b, Point2D::new(5.0, 8.0));
        assert_relative_eq!(a.cross(b), -2.0);
        assert_eq!(a.perp(), Point2D::new(-2.0, 1.0));
    }

    #[test]
    fn test_cell_of_point() {
        assert_eq!(Point2D::new(2.7, 0.1).cell(), GridCoord::new(2, 0));
        assert_eq!(Point2D::new(-0.2, 3.0).cell(), GridCoord::new(-1, 3));
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(10.0, 0.0);
        assert_relative_eq!(point_segment_distance(Point2D::new(5.0, 3.0), a, b), 3.0);
        assert_relative_eq!(point_segment_distance(Point2D::new(-3.0, 4.0), a, b), 5.0);
        assert_relative_eq!(point_segment_distance(Point2D::new(1.0, 1.0), a, a), 2f64.sqrt());
    }

    #[test]
    fn test_turning_angle() {
        let east = Point2D::new(1.0, 0.0);
        let north = Point2D::new(0.0, 1.0);
        assert_relative_eq!(turning_angle(east, east), 0.0);
        assert_relative_eq!(turning_angle(east, north), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(turning_angle(east, -east), std::f64::consts::PI);
    }
}
