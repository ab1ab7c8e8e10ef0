//! Path search on the Voronoi graph.
//!
//! Start and target are attached to their nearest graph nodes reachable
//! through free space, the cheapest node sequence is found with Dijkstra's
//! algorithm and the edge polylines are concatenated into a path in angle
//! coordinates. The result is checked segment by segment against the
//! occupancy mask.

mod config;
mod dijkstra;
mod finder;
mod subdivide;

pub use config::{PathConfig, PathStrategy};
pub use dijkstra::{Arc, COST_TOLERANCE, DijkstraResult, DijkstraState, dijkstra};
pub use finder::PathFinder;
pub use subdivide::{remove_close_vertices, subdivide};

use serde::{Deserialize, Serialize};

/// Outcome of a path query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    /// Start and target connected through free space
    Found,
    /// Start lies in a blocked cell
    StartBlocked,
    /// Target lies in a blocked cell
    TargetBlocked,
    /// Start and target attach to disconnected graph components
    NoPath,
    /// Start or target outside the grid extent
    OutOfRange,
    /// The graph has no nodes
    EmptyGraph,
    /// The assembled path crosses a blocked cell
    Collision,
}

/// Path through the configuration space, vertices as `[angle1, angle2]` in radians.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// True only when `status` is [`PathStatus::Found`]
    pub ok: bool,
    pub status: PathStatus,
    pub vertices: Vec<[f64; 2]>,
}

impl Path {
    /// Path with the given vertices; `ok` follows from `status`.
    pub fn new(status: PathStatus, vertices: Vec<[f64; 2]>) -> Self {
        Self {
            ok: status == PathStatus::Found,
            status,
            vertices,
        }
    }

    /// Create a failed result without vertices.
    pub fn failed(status: PathStatus) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Total polyline length in radians.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| angle_distance(w[0], w[1]))
            .sum()
    }
}

/// Path whose segments are at most `max_segment_length` long.
#[derive(Clone, Debug, PartialEq)]
pub struct SubdividedPath {
    pub path: Path,
    pub max_segment_length: f64,
}

#[inline]
pub(crate) fn angle_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ok_follows_status() {
        assert!(Path::new(PathStatus::Found, vec![[0.0, 0.0]]).ok);
        assert!(!Path::new(PathStatus::StartBlocked, vec![[0.0, 0.0]]).ok);
        assert!(Path::failed(PathStatus::NoPath).is_empty());
    }

    #[test]
    fn test_length() {
        let path = Path::new(PathStatus::Found, vec![[0.0, 0.0], [3.0, 4.0], [3.0, 5.0]]);
        assert_relative_eq!(path.length(), 6.0);
    }
}
