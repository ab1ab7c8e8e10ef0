//! Export of planner artifacts.
//!
//! - **Lines tool XML**: region segments for the external lines editor
//! - **Path text**: raw `a4 a2` columns or Nomad drive commands
//! - **Region YAML**: polygon corners in degrees
//! - **SVG**: occupancy, regions, Voronoi graph and path for inspection
//!
//! ```rust,ignore
//! use marga::io::{PathExporter, PathFormat, SvgConfig, SvgVisualizer};
//!
//! PathExporter::new(PathFormat::Nomad).save(&path, Path::new("path.cmd"))?;
//! SvgVisualizer::new(graph.mapping(), graph.mask(), SvgConfig::default())
//!     .with_graph(&graph)
//!     .with_path(&path)
//!     .save(Path::new("plan.svg"))?;
//! ```

mod lines_tool;
mod path_export;
mod plot;
mod region_export;

pub use lines_tool::{save_lines_tool, write_lines_tool};
pub use path_export::{PathExporter, PathFormat};
pub use plot::{SvgColorScheme, SvgConfig, SvgVisualizer};
pub use region_export::{RegionDocument, RegionRecord, save_regions};
