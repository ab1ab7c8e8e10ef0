//! Pipeline facade.
//!
//! Runs grid, contour, region and Voronoi stages in order and keeps every
//! artifact, so that further path queries reuse the same graph. Each stage is
//! also exposed on its own.

use std::sync::Arc;

use log::info;

use crate::config::PlannerConfig;
use crate::contour::{ContourExtractor, ContourSet};
use crate::error::Result;
use crate::grid::{CollisionOracle, ConfigSpaceGrid, GridBuilder, ProgressObserver};
use crate::path::{Path, PathFinder, SubdividedPath, subdivide};
use crate::region::{RegionSet, RegionSimplifier};
use crate::voronoi::{VoronoiBuilder, VoronoiGraph};

/// Intermediate results of one configuration space.
#[derive(Clone, Debug)]
pub struct PlannedSpace {
    pub grid: ConfigSpaceGrid,
    pub contours: ContourSet,
    pub regions: RegionSet,
    pub graph: VoronoiGraph,
}

/// Configuration-space path planner.
#[derive(Clone)]
pub struct Planner {
    config: PlannerConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Report sweep progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Classify the configured angle ranges with `oracle`.
    pub fn build_grid<O>(&self, oracle: &O) -> Result<ConfigSpaceGrid>
    where
        O: CollisionOracle + ?Sized,
    {
        self.config.validate()?;
        let mut builder = GridBuilder::new(self.config.sweep_config());
        if let Some(observer) = &self.observer {
            builder = builder.with_observer(Arc::clone(observer));
        }
        let (axis1, axis2) = self.config.grid.to_ranges();
        builder.build(axis1, axis2, oracle)
    }

    pub fn extract_contours(&self, grid: &ConfigSpaceGrid) -> Result<ContourSet> {
        ContourExtractor::new().extract(grid)
    }

    pub fn simplify_regions(&self, contours: &ContourSet) -> Result<RegionSet> {
        RegionSimplifier::new(self.config.region_config()).simplify(contours)
    }

    pub fn build_voronoi(&self, regions: &RegionSet) -> Result<VoronoiGraph> {
        VoronoiBuilder::new(self.config.voronoi_config()).build(regions)
    }

    /// Run every stage up to the Voronoi graph.
    pub fn prepare<O>(&self, oracle: &O) -> Result<PlannedSpace>
    where
        O: CollisionOracle + ?Sized,
    {
        let grid = self.build_grid(oracle)?;
        self.prepare_grid(grid)
    }

    /// Run the geometric stages on an existing grid.
    pub fn prepare_grid(&self, grid: ConfigSpaceGrid) -> Result<PlannedSpace> {
        let contours = self.extract_contours(&grid)?;
        let regions = self.simplify_regions(&contours)?;
        let graph = self.build_voronoi(&regions)?;
        info!(
            "[Planner] Configuration space: {} blocked cells, {} contours, {} regions, {} nodes, {} edges",
            grid.blocked_count(),
            contours.len(),
            regions.len(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(PlannedSpace {
            grid,
            contours,
            regions,
            graph,
        })
    }

    /// Path between two `[angle1, angle2]` configurations (radians).
    pub fn find_path(&self, graph: &VoronoiGraph, start: [f64; 2], target: [f64; 2]) -> Path {
        PathFinder::new(self.config.path_config()).find(graph, start, target)
    }

    /// [`Self::find_path`] followed by subdivision to the configured segment length.
    pub fn plan(&self, graph: &VoronoiGraph, start: [f64; 2], target: [f64; 2]) -> SubdividedPath {
        let path = self.find_path(graph, start, target);
        subdivide(&path, self.config.path_config().max_segment_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisSettings;

    fn small_config() -> PlannerConfig {
        let mut config = PlannerConfig::default();
        config.grid.axis1 = AxisSettings {
            begin: 0.0,
            end: 60.0,
            step: 2.0,
        };
        config.grid.axis2 = AxisSettings {
            begin: 0.0,
            end: 40.0,
            step: 2.0,
        };
        config
    }

    #[test]
    fn test_prepare_and_plan() {
        let planner = Planner::new(small_config());
        let oracle = |a1: f64, a2: f64| {
            let (x, y) = (a1.to_degrees(), a2.to_degrees());
            (x - 30.0).hypot(y - 20.0) < 8.0
        };
        let space = planner.prepare(&oracle).unwrap();
        assert!(space.grid.blocked_count() > 0);
        assert_eq!(space.contours.len(), 1);
        assert!(!space.graph.is_empty());

        let start = [4.0_f64.to_radians(), 4.0_f64.to_radians()];
        let target = [56.0_f64.to_radians(), 36.0_f64.to_radians()];
        let planned = planner.plan(&space.graph, start, target);
        assert!(planned.path.ok);
        assert_eq!(planned.path.vertices.first(), Some(&start));
        assert_eq!(planned.path.vertices.last(), Some(&target));
    }

    #[test]
    fn test_invalid_config_fails_before_sweep() {
        let mut config = small_config();
        config.voronoi.subsamples = 0;
        let oracle = |_: f64, _: f64| false;
        assert!(Planner::new(config).build_grid(&oracle).is_err());
    }
}
