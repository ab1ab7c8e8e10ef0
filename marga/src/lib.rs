//! # Marga: configuration-space path planning
//!
//! Collision-free motion paths for a triple-axis spectrometer. The planner
//! works in the 2D angular configuration space spanned by the
//! monochromator (or analyser) scattering angle `a2`/`a6` and the sample
//! scattering angle `a4`, and keeps the path as far from forbidden
//! configurations as possible.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marga::{Planner, PlannerConfig};
//! use marga::instrument::ShapeSpace;
//! use std::path::Path;
//!
//! let config = PlannerConfig::load(Path::new("configs/planner.yaml"))?;
//! let space = ShapeSpace::from_file(Path::new("configs/instrument.yaml"))?;
//!
//! let planner = Planner::new(config);
//! let prepared = planner.prepare(&space)?;
//! let planned = planner.plan(
//!     &prepared.graph,
//!     [80.0_f64.to_radians(), -60.0_f64.to_radians()],
//!     [80.0_f64.to_radians(), 60.0_f64.to_radians()],
//! );
//! println!("ok={} vertices={}", planned.path.ok, planned.path.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Coordinates
//!
//! Angles are radians at every API boundary and degrees in files. Geometry
//! between the grid and the path stage uses lattice coordinates: cell
//! `(i, j)` covers `[i, i+1] x [j, j+1]` and `angle = begin + x * step`.
//!
//! ## Data Flow
//!
//! ```text
//!   CollisionOracle
//!         │ is_colliding(a1, a2), parallel sweep
//!         ▼
//!   ┌──────────────────┐
//!   │ ConfigSpaceGrid  │  free / blocked cells
//!   └────────┬─────────┘
//!            │ boundary tracing
//!            ▼
//!   ┌──────────────────┐
//!   │   ContourSet     │  closed lattice polylines
//!   └────────┬─────────┘
//!            │ collinear merge
//!            ▼
//!   ┌──────────────────┐
//!   │    RegionSet     │  segment polygons, inverted flag
//!   └────────┬─────────┘
//!            │ segment-site Voronoi
//!            ▼
//!   ┌──────────────────┐
//!   │  VoronoiGraph    │  lines and parabolic arcs
//!   └────────┬─────────┘
//!            │ Dijkstra, subdivide
//!            ▼
//!          Path
//! ```
//!
//! ## Modules
//!
//! - [`core`]: points, segments, angle ranges, occupancy mask
//! - [`grid`]: collision oracle and parallel grid sweep
//! - [`contour`]: boundary tracing
//! - [`region`]: segment regions
//! - [`voronoi`]: segment-site Voronoi graph
//! - [`path`]: path search and post-processing
//! - [`config`]: YAML configuration
//! - [`instrument`]: instrument description and kinematics
//! - [`io`]: exporters

pub mod config;
pub mod contour;
pub mod core;
pub mod error;
pub mod grid;
pub mod instrument;
pub mod io;
pub mod path;
pub mod planner;
pub mod region;
pub mod voronoi;

pub use config::PlannerConfig;
pub use crate::core::{AngleMapping, AngleRange, CellState, OccupancyMask, Point2D, Segment};
pub use error::{
    ConfigError, ConfigSpaceError, KinematicsError, LoadError, PlannerError, Result, Stage,
};
pub use grid::{CollisionOracle, ConfigSpaceGrid, GridBuilder, OracleError, ProgressObserver};
pub use path::{Path, PathConfig, PathFinder, PathStatus, PathStrategy, SubdividedPath, subdivide};
pub use planner::{PlannedSpace, Planner};
pub use voronoi::{VoronoiBuilder, VoronoiConfig, VoronoiGraph};
