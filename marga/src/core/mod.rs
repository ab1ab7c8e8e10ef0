//! Core types: lattice points, angle ranges and the occupancy mask.

mod mask;
mod point;
mod range;
mod segment;

pub use mask::{CellState, OccupancyMask};
pub use point::{GridCoord, Point2D, point_segment_distance, turning_angle};
pub use range::{AngleMapping, AngleRange};
pub use segment::Segment;
