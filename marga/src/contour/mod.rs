//! Obstacle contour extraction.
//!
//! Traces the boundaries between blocked and free cells of a
//! [`ConfigSpaceGrid`] as closed lattice polygons. The grid resolution is the
//! geometric resolution: contour vertices are cell corners, no sub-cell
//! interpolation takes place.
//!
//! Orientation follows from keeping blocked cells on the left:
//! outer obstacle boundaries are counter-clockwise (positive area), free
//! holes inside an obstacle are clockwise (negative area).

mod boundary;

use log::{debug, trace};

use crate::core::{AngleMapping, GridCoord, OccupancyMask};
use crate::error::{PlannerError, Result, Stage};
use crate::grid::ConfigSpaceGrid;
use boundary::BoundaryEdges;

/// Closed boundary polygon on cell corners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    points: Vec<GridCoord>,
    touches_border: bool,
}

impl Contour {
    fn new(points: Vec<GridCoord>, width: usize, height: usize) -> Self {
        let (w, h) = (width as i64, height as i64);
        let touches_border = points
            .iter()
            .any(|p| p.x == 0 || p.y == 0 || p.x == w || p.y == h);
        Self {
            points,
            touches_border,
        }
    }

    /// Closed vertex loop (first point equals last).
    pub fn points(&self) -> &[GridCoord] {
        &self.points
    }

    /// Number of unit boundary edges.
    pub fn edge_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Whether the contour runs along the grid border anywhere.
    pub fn touches_border(&self) -> bool {
        self.touches_border
    }

    /// Signed area in cells (positive = counter-clockwise).
    pub fn signed_area(&self) -> f64 {
        let twice: i64 = self
            .points
            .windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum();
        twice as f64 / 2.0
    }
}

/// Contours of one grid, with the grid context they were traced from.
#[derive(Clone, Debug)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    pub mapping: AngleMapping,
    pub mask: OccupancyMask,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Traces obstacle boundaries of a configuration-space grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContourExtractor;

impl ContourExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all contours in lattice scan order.
    ///
    /// A grid that is entirely free or entirely blocked has no contours.
    pub fn extract(&self, grid: &ConfigSpaceGrid) -> Result<ContourSet> {
        let mask = grid.mask().clone();
        let mapping = *grid.mapping();
        let blocked = mask.blocked_count();

        if blocked == 0 || blocked == mapping.cell_total() {
            debug!(
                "[Contour] Uniform grid ({} blocked of {}): no contours",
                blocked,
                mapping.cell_total()
            );
            return Ok(ContourSet {
                contours: Vec::new(),
                mapping,
                mask,
            });
        }

        let mut edges = BoundaryEdges::collect(&mask);
        let mut contours = Vec::new();
        let mut cursor = 0;

        while let Some((idx, start, dir)) = edges.next_unused(cursor) {
            cursor = idx;
            let points = edges.trace(start, dir).ok_or_else(|| {
                PlannerError::geometry(
                    Stage::Contour,
                    format!("boundary starting at ({}, {}) does not close", start.x, start.y),
                )
            })?;
            let contour = Contour::new(points, mapping.width, mapping.height);
            trace!(
                "[Contour] #{}: {} edges, area {}, border {}",
                contours.len(),
                contour.edge_count(),
                contour.signed_area(),
                contour.touches_border()
            );
            contours.push(contour);
        }

        let traced: usize = contours.iter().map(Contour::edge_count).sum();
        if traced != edges.len() {
            return Err(PlannerError::geometry(
                Stage::Contour,
                format!("traced {} of {} boundary edges", traced, edges.len()),
            ));
        }

        debug!(
            "[Contour] Extracted {} contours ({} boundary edges)",
            contours.len(),
            traced
        );
        Ok(ContourSet {
            contours,
            mapping,
            mask,
        })
    }
}
