//! Segment regions.
//!
//! Each traced contour becomes a closed polygon of straight segments. Runs of
//! collinear unit edges are merged, which bounds the number of sites handed
//! to the Voronoi stage.
//!
//! The `inverted` flag follows from the orientation fixed by the tracer:
//! obstacle outlines come out counter-clockwise, while a clockwise polygon
//! encloses free space and has the obstacle outside it (a free pocket inside
//! an obstacle, e.g. the inner rim of a wall band running around the whole
//! grid border).

mod config;
pub mod polygon;

pub use config::RegionConfig;

use log::{debug, trace};

use crate::contour::ContourSet;
use crate::core::{AngleMapping, OccupancyMask, Point2D, Segment};
use crate::error::{PlannerError, Result, Stage};

/// Polygon of obstacle boundary segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    vertices: Vec<Point2D>,
    inverted: bool,
    touches_border: bool,
    signed_area: f64,
}

impl Region {
    /// Build a region from an open vertex loop in lattice coordinates.
    pub fn from_vertices(vertices: Vec<Point2D>, touches_border: bool) -> Self {
        let signed_area = polygon::signed_area(&vertices);
        Self {
            vertices,
            inverted: signed_area < 0.0,
            touches_border,
            signed_area,
        }
    }

    /// Polygon corners (the last one connects back to the first).
    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Ordered boundary segments.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| Segment::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn segment_count(&self) -> usize {
        self.vertices.len()
    }

    /// True if the polygon encloses free space with the obstacle outside.
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn touches_border(&self) -> bool {
        self.touches_border
    }

    /// Signed area in cells.
    pub fn signed_area(&self) -> f64 {
        self.signed_area
    }

    /// Enclosed area in cells.
    pub fn area(&self) -> f64 {
        self.signed_area.abs()
    }

    pub fn contains_point(&self, p: Point2D) -> bool {
        polygon::contains_point(&self.vertices, p)
    }
}

/// Regions of one grid, with the grid context.
#[derive(Clone, Debug)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub mapping: AngleMapping,
    pub mask: OccupancyMask,
}

impl RegionSet {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total segment count over all regions.
    pub fn segment_count(&self) -> usize {
        self.regions.iter().map(Region::segment_count).sum()
    }

    /// Non-inverted area minus inverted area, in cells.
    pub fn net_area(&self) -> f64 {
        self.regions
            .iter()
            .map(|r| if r.inverted() { -r.area() } else { r.area() })
            .sum()
    }

    /// Net area in squared angle units.
    pub fn net_angle_area(&self) -> f64 {
        self.net_area() * self.mapping.cell_area()
    }

    /// Regions enclosing free space.
    pub fn inverted_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.inverted())
    }
}

/// Converts contours into segment regions.
#[derive(Clone, Debug, Default)]
pub struct RegionSimplifier {
    config: RegionConfig,
}

impl RegionSimplifier {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Simplify every contour into a region, preserving contour order.
    pub fn simplify(&self, contours: &ContourSet) -> Result<RegionSet> {
        let tolerance = self.config.simplify_tolerance.max(0.0);
        let mut regions = Vec::with_capacity(contours.len());

        for (idx, contour) in contours.contours.iter().enumerate() {
            let points = contour.points();
            let open: Vec<Point2D> = points[..points.len().saturating_sub(1)]
                .iter()
                .map(|c| Point2D::new(c.x as f64, c.y as f64))
                .collect();

            let vertices = polygon::simplify(&open, tolerance);
            if vertices.len() < 3 {
                return Err(PlannerError::geometry(
                    Stage::Region,
                    format!("contour {} has only {} vertices", idx, vertices.len()),
                ));
            }

            let region = Region::from_vertices(vertices, contour.touches_border());
            if region.area() <= f64::EPSILON {
                return Err(PlannerError::geometry(
                    Stage::Region,
                    format!("contour {} encloses no area", idx),
                ));
            }
            trace!(
                "[Region] #{}: {} segments (from {} edges), area {:.1}, inverted {}",
                idx,
                region.segment_count(),
                contour.edge_count(),
                region.signed_area(),
                region.inverted()
            );
            regions.push(region);
        }

        let set = RegionSet {
            regions,
            mapping: contours.mapping,
            mask: contours.mask.clone(),
        };
        debug!(
            "[Region] Simplified {} contours into {} segments ({} inverted regions)",
            set.len(),
            set.segment_count(),
            set.inverted_regions().count()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::ContourExtractor;
    use crate::core::{AngleRange, OccupancyMask};
    use crate::grid::ConfigSpaceGrid;
    use approx::assert_relative_eq;

    fn regions_for(
        width: usize,
        height: usize,
        config: RegionConfig,
        f: impl Fn(usize, usize) -> bool,
    ) -> (ConfigSpaceGrid, RegionSet) {
        let mapping = AngleMapping::new(
            AngleRange::new(0.0, width as f64 * 0.5, 0.5),
            AngleRange::new(0.0, height as f64 * 0.25, 0.25),
        )
        .unwrap();
        let grid =
            ConfigSpaceGrid::from_mask(mapping, OccupancyMask::from_fn(width, height, f)).unwrap();
        let contours = ContourExtractor::new().extract(&grid).unwrap();
        let regions = RegionSimplifier::new(config).simplify(&contours).unwrap();
        (grid, regions)
    }

    #[test]
    fn test_rectangle_becomes_four_segments() {
        let (_, set) = regions_for(10, 10, RegionConfig::default(), |i, j| {
            (2..7).contains(&i) && (3..5).contains(&j)
        });
        assert_eq!(set.len(), 1);
        assert_eq!(set.regions[0].segment_count(), 4);
        assert!(!set.regions[0].inverted());
        assert_relative_eq!(set.regions[0].area(), 10.0);
    }

    #[test]
    fn test_frame_obstacle_yields_inverted_region() {
        // Blocked ring along the whole border
        let (grid, set) = regions_for(12, 9, RegionConfig::default(), |i, j| {
            i == 0 || j == 0 || i == 11 || j == 8
        });
        assert_eq!(set.len(), 2);
        let inverted: Vec<&Region> = set.inverted_regions().collect();
        assert_eq!(inverted.len(), 1);
        assert!(!inverted[0].touches_border());
        assert_relative_eq!(inverted[0].area(), 70.0);
        assert!(inverted[0].contains_point(Point2D::new(5.5, 4.5)));
        assert_relative_eq!(set.net_area(), grid.blocked_count() as f64);
    }

    #[test]
    fn test_area_identity_in_angle_units() {
        let (grid, set) = regions_for(20, 16, RegionConfig::default(), |i, j| {
            let (x, y) = (i as f64 - 9.5, j as f64 - 7.5);
            (x * x + y * y < 30.0 && x * x + y * y > 6.0) || (i > 15 && j < 4)
        });
        let expected = grid.blocked_count() as f64 * grid.mapping().cell_area();
        assert_relative_eq!(set.net_angle_area(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_tolerance_keeps_area_close() {
        let f = |i: usize, j: usize| {
            let (x, y) = (i as f64 - 15.5, j as f64 - 15.5);
            x * x + y * y < 100.0
        };
        let (grid, exact) = regions_for(32, 32, RegionConfig::default(), f);
        let (_, coarse) =
            regions_for(32, 32, RegionConfig::new().with_simplify_tolerance(0.8), f);
        assert!(coarse.segment_count() < exact.segment_count());
        let blocked = grid.blocked_count() as f64;
        assert!((coarse.net_area() - blocked).abs() <= coarse.segment_count() as f64);
    }
}
