//! Configuration-space occupancy grid.
//!
//! The grid is the only stage that talks to the collision oracle. It is
//! immutable once built and consumed read-only by contour extraction.

mod builder;
mod config;
mod oracle;
mod progress;

pub use builder::GridBuilder;
pub use config::SweepConfig;
pub use oracle::{CollisionOracle, OracleError};
pub use progress::{LogProgress, ProgressObserver};

use crate::core::{AngleMapping, CellState, OccupancyMask};
use crate::error::{ConfigSpaceError, Result};

/// Dense free/blocked classification of a rectangular angle range.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigSpaceGrid {
    mapping: AngleMapping,
    mask: OccupancyMask,
}

impl ConfigSpaceGrid {
    pub(crate) fn new(mapping: AngleMapping, mask: OccupancyMask) -> Self {
        Self { mapping, mask }
    }

    /// Wrap a precomputed mask, e.g. one restored from disk.
    pub fn from_mask(mapping: AngleMapping, mask: OccupancyMask) -> Result<Self> {
        if mask.width() != mapping.width || mask.height() != mapping.height {
            return Err(ConfigSpaceError::DegenerateRange {
                axis: 0,
                reason: format!(
                    "mask is {}x{} but ranges give {}x{}",
                    mask.width(),
                    mask.height(),
                    mapping.width,
                    mapping.height
                ),
            }
            .into());
        }
        Ok(Self::new(mapping, mask))
    }

    #[inline]
    pub fn mapping(&self) -> &AngleMapping {
        &self.mapping
    }

    #[inline]
    pub fn mask(&self) -> &OccupancyMask {
        &self.mask
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.mapping.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.mapping.height
    }

    /// State of cell `(i, j)`; `None` outside the grid.
    #[inline]
    pub fn state(&self, i: usize, j: usize) -> Option<CellState> {
        self.mask.get(i, j)
    }

    pub fn blocked_count(&self) -> usize {
        self.mask.blocked_count()
    }

    pub fn free_count(&self) -> usize {
        self.mapping.cell_total() - self.blocked_count()
    }
}
