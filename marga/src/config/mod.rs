//! Unified configuration loading for Marga.
//!
//! Loads all planner settings from a single YAML file. Angles in the file
//! are degrees; the runtime structs use radians (angles) and cells (lattice
//! lengths).

mod defaults;
mod grid;
mod path;
mod planner;

pub use grid::{AxisSettings, GridSection};
pub use path::PathSection;
pub use planner::PlannerConfig;
