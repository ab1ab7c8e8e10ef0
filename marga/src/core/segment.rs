//! Line segment type.

use serde::{Deserialize, Serialize};

use super::point::{Point2D, point_segment_distance};

/// A line segment between two lattice points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment {
    #[inline]
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Vector from start to end.
    #[inline]
    pub fn delta(&self) -> Point2D {
        self.end - self.start
    }

    #[inline]
    pub fn midpoint(&self) -> Point2D {
        self.start.lerp(self.end, 0.5)
    }

    /// Distance from `p` to the closed segment.
    #[inline]
    pub fn distance_to_point(&self, p: Point2D) -> f64 {
        point_segment_distance(p, self.start, self.end)
    }

    /// Projection parameter of `p` onto the segment line (0 at start, 1 at end).
    #[inline]
    pub fn project(&self, p: Point2D) -> f64 {
        let d = self.delta();
        let len_sq = d.dot(d);
        if len_sq <= f64::EPSILON {
            0.0
        } else {
            (p - self.start).dot(d) / len_sq
        }
    }

    /// Same segment regardless of direction.
    pub fn same_as(&self, other: &Segment) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }

    /// Reversed copy.
    #[inline]
    pub fn reversed(&self) -> Segment {
        Segment::new(self.end, self.start)
    }
}
