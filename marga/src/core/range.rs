//! Angle ranges and the lattice/angle mapping.
//!
//! ```text
//!   angle2
//!     ^      cell (i, j) covers [i, i+1] x [j, j+1] in lattice units
//!     |      and is classified at its lower-left corner:
//!     |
//!     |      angle1 = begin1 + x * step1
//!     |      angle2 = begin2 + y * step2
//!     +------------------------------> angle1
//! ```

use serde::{Deserialize, Serialize};

use super::point::Point2D;
use crate::error::ConfigSpaceError;

/// Relative tolerance for `(end - begin) / step` being integral.
const RANGE_TOLERANCE: f64 = 1e-6;

/// One configuration-space axis (radians).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub begin: f64,
    pub end: f64,
    pub step: f64,
}

impl AngleRange {
    /// Create a new range (radians).
    pub fn new(begin: f64, end: f64, step: f64) -> Self {
        Self { begin, end, step }
    }

    /// Create a range from values given in degrees.
    pub fn from_degrees(begin: f64, end: f64, step: f64) -> Self {
        Self::new(begin.to_radians(), end.to_radians(), step.to_radians())
    }

    /// Number of cells along this axis.
    ///
    /// `axis` is only used for error reporting.
    pub fn cell_count(&self, axis: usize) -> Result<usize, ConfigSpaceError> {
        let fail = |reason: String| ConfigSpaceError::DegenerateRange { axis, reason };

        if !(self.begin.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(fail("non-finite bound or step".into()));
        }
        if self.step <= 0.0 {
            return Err(fail(format!("step {} is not positive", self.step)));
        }
        if self.end <= self.begin {
            return Err(fail(format!(
                "end {} does not exceed begin {}",
                self.end, self.begin
            )));
        }

        let ratio = (self.end - self.begin) / self.step;
        let count = ratio.round();
        if count < 1.0 || (ratio - count).abs() > RANGE_TOLERANCE * ratio.max(1.0) {
            return Err(fail(format!(
                "span {} is not a whole multiple of step {}",
                self.end - self.begin,
                self.step
            )));
        }
        Ok(count as usize)
    }

    /// Angle at lattice coordinate `x`.
    #[inline]
    pub fn angle_at(&self, x: f64) -> f64 {
        self.begin + x * self.step
    }

    /// Lattice coordinate of `angle`.
    #[inline]
    pub fn lattice_at(&self, angle: f64) -> f64 {
        (angle - self.begin) / self.step
    }
}

/// Mapping between lattice coordinates and the two angle axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleMapping {
    pub axis1: AngleRange,
    pub axis2: AngleRange,
    /// Cells along axis 1
    pub width: usize,
    /// Cells along axis 2
    pub height: usize,
}

impl AngleMapping {
    /// Validate both ranges and derive the grid extent.
    pub fn new(axis1: AngleRange, axis2: AngleRange) -> Result<Self, ConfigSpaceError> {
        let width = axis1.cell_count(1)?;
        let height = axis2.cell_count(2)?;
        Ok(Self {
            axis1,
            axis2,
            width,
            height,
        })
    }

    /// Angle pair at a lattice point.
    #[inline]
    pub fn to_angles(&self, p: Point2D) -> [f64; 2] {
        [self.axis1.angle_at(p.x), self.axis2.angle_at(p.y)]
    }

    /// Lattice point of an angle pair.
    #[inline]
    pub fn to_lattice(&self, angles: [f64; 2]) -> Point2D {
        Point2D::new(
            self.axis1.lattice_at(angles[0]),
            self.axis2.lattice_at(angles[1]),
        )
    }

    /// Angle pair at which cell `(i, j)` is classified.
    #[inline]
    pub fn cell_angles(&self, i: usize, j: usize) -> [f64; 2] {
        [self.axis1.angle_at(i as f64), self.axis2.angle_at(j as f64)]
    }

    /// True if the lattice point lies inside the grid extent (border included).
    #[inline]
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width as f64 && p.y <= self.height as f64
    }

    /// Angle-space length of a lattice vector.
    #[inline]
    pub fn angle_length(&self, d: Point2D) -> f64 {
        let a = d.x * self.axis1.step;
        let b = d.y * self.axis2.step;
        (a * a + b * b).sqrt()
    }

    /// Area of one cell in angle units.
    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.axis1.step * self.axis2.step
    }

    /// Geometric mean of the two steps; converts lattice clearances to angles.
    #[inline]
    pub fn mean_step(&self) -> f64 {
        (self.axis1.step * self.axis2.step).sqrt()
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_total(&self) -> usize {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_count_exact() {
        let r = AngleRange::from_degrees(-4.0, 184.0, 2.0);
        assert_eq!(r.cell_count(1).unwrap(), 94);
        let r = AngleRange::from_degrees(-188.0, 188.0, 2.0);
        assert_eq!(r.cell_count(2).unwrap(), 188);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert!(AngleRange::new(0.0, 1.0, 0.0).cell_count(1).is_err());
        assert!(AngleRange::new(1.0, 1.0, 0.1).cell_count(1).is_err());
        assert!(AngleRange::new(2.0, 1.0, 0.1).cell_count(1).is_err());
        assert!(AngleRange::new(0.0, 1.0, 0.3).cell_count(1).is_err());
        assert!(AngleRange::new(0.0, f64::NAN, 0.1).cell_count(1).is_err());
    }

    #[test]
    fn test_degenerate_range_names_axis() {
        let err = AngleMapping::new(
            AngleRange::new(0.0, 1.0, 0.25),
            AngleRange::new(0.0, 1.0, -0.25),
        )
        .unwrap_err();
        match err {
            ConfigSpaceError::DegenerateRange { axis, .. } => assert_eq!(axis, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_mapping_round_trip() {
        let m = AngleMapping::new(
            AngleRange::new(-1.0, 1.0, 0.5),
            AngleRange::new(0.0, 3.0, 0.25),
        )
        .unwrap();
        assert_eq!((m.width, m.height), (4, 12));
        assert_eq!(m.cell_angles(2, 4), [0.0, 1.0]);
        let p = m.to_lattice([0.25, 2.0]);
        assert_relative_eq!(p.x, 2.5);
        assert_relative_eq!(p.y, 8.0);
        assert_relative_eq!(m.angle_length(Point2D::new(2.0, 0.0)), 1.0);
        assert_relative_eq!(m.cell_area(), 0.125);
    }
}
