//! Parallel configuration-space sweep.
//!
//! Every cell is classified independently by the collision oracle. Rows of
//! the cell buffer are handed out as disjoint mutable chunks to a rayon
//! pool, so workers never share a cell; the only cross-thread mutable state
//! is the completed-cell counter. The counter lives behind a lock that is
//! held while the observer runs, so observers see strictly increasing counts.
//!
//! ```text
//!   row j = height-1  [ ][ ][ ][ ] ... [ ]   <- worker A
//!   ...
//!   row 1             [ ][ ][ ][ ] ... [ ]   <- worker B
//!   row 0             [ ][ ][ ][ ] ... [ ]   <- worker C
//! ```

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use rayon::prelude::*;

use super::ConfigSpaceGrid;
use super::config::SweepConfig;
use super::oracle::CollisionOracle;
use super::progress::ProgressObserver;
use crate::core::{AngleMapping, AngleRange, CellState, OccupancyMask};
use crate::error::{ConfigSpaceError, Result};

/// Builds a [`ConfigSpaceGrid`] by sweeping a collision oracle over two axes.
#[derive(Clone, Default)]
pub struct GridBuilder {
    config: SweepConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl GridBuilder {
    /// Create a builder with the given sweep configuration.
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach a progress observer, called after every completed row.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Classify every cell of `axis1 x axis2`.
    ///
    /// Fails without producing a grid if either range is degenerate or the
    /// oracle fails for any cell. When several cells fail, the failure with
    /// the lowest row (then column) index is reported.
    pub fn build<O>(&self, axis1: AngleRange, axis2: AngleRange, oracle: &O) -> Result<ConfigSpaceGrid>
    where
        O: CollisionOracle + ?Sized,
    {
        let mapping = AngleMapping::new(axis1, axis2)?;
        let width = mapping.width;
        let total = mapping.cell_total();
        let threads = self.config.effective_threads();

        debug!(
            "[Grid] Sweeping {}x{} configuration space on {} threads",
            mapping.width, mapping.height, threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ConfigSpaceError::ThreadPool(e.to_string()))?;

        let completed = Mutex::new(0usize);
        let mut cells = vec![CellState::Free; total];

        let outcomes: Vec<std::result::Result<(), ConfigSpaceError>> = pool.install(|| {
            cells
                .par_chunks_mut(width)
                .enumerate()
                .map(|(j, row)| {
                    for (i, cell) in row.iter_mut().enumerate() {
                        let [angle1, angle2] = mapping.cell_angles(i, j);
                        match oracle.is_colliding(angle1, angle2) {
                            Ok(true) => *cell = CellState::Blocked,
                            Ok(false) => {}
                            Err(e) => {
                                return Err(ConfigSpaceError::OracleFailed {
                                    i,
                                    j,
                                    angle1,
                                    angle2,
                                    message: e.0,
                                });
                            }
                        }
                    }

                    let mut done = completed.lock();
                    *done += row.len();
                    if let Some(observer) = &self.observer {
                        observer.on_progress(*done, total);
                    }
                    Ok(())
                })
                .collect()
        });

        // Rows come back in index order, so the first error is the lowest cell.
        for outcome in outcomes {
            outcome?;
        }

        let mask = OccupancyMask::from_cells(mapping.width, mapping.height, cells).ok_or_else(|| {
            ConfigSpaceError::DegenerateRange {
                axis: 0,
                reason: "cell buffer does not match grid extent".into(),
            }
        })?;
        let grid = ConfigSpaceGrid::new(mapping, mask);

        debug!(
            "[Grid] Configuration space done: {} of {} cells blocked",
            grid.blocked_count(),
            total
        );
        Ok(grid)
    }
}
