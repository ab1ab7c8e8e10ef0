//! Voronoi graph types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::curve::EdgeCurve;
use super::index::SiteIndex;
use super::site::SiteSet;
use crate::core::{AngleMapping, OccupancyMask, Point2D};

/// How a node was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Exact vertex equidistant from three or more sites
    Vertex,
    /// Approximate vertex (least-squares or centroid placement)
    Fallback,
    /// Open end of a bisector chain
    End,
}

/// Graph node in lattice coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiNode {
    pub position: Point2D,
    /// Distance to the nearest site (cells).
    pub clearance: f64,
    /// Sites the node is equidistant from, ascending.
    pub sites: Vec<usize>,
    pub kind: NodeKind,
}

/// Graph edge: a piece of the bisector of two sites, or a connector.
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiEdge {
    pub from: usize,
    pub to: usize,
    /// Generating site pair, lower id first. For connectors, the sites
    /// nearest to the two ends.
    pub sites: (usize, usize),
    pub curve: EdgeCurve,
    /// Polyline from `from` to `to` in lattice coordinates.
    pub points: Vec<Point2D>,
    /// Polyline length in cells.
    pub length: f64,
    /// Smallest distance to the generating sites along the edge (cells).
    pub min_clearance: f64,
    /// Edge midpoint lies inside an inverted region.
    pub inside_inverted: bool,
    /// Free-space polyline joining two pieces of the diagram the sampling
    /// left apart; not equidistant from its sites.
    pub connector: bool,
}

impl VoronoiEdge {
    /// The endpoint opposite to `node`.
    pub fn other(&self, node: usize) -> usize {
        if self.from == node { self.to } else { self.from }
    }

    /// Polyline oriented to start at `node`.
    pub fn points_from(&self, node: usize) -> Vec<Point2D> {
        if self.from == node {
            self.points.clone()
        } else {
            self.points.iter().rev().copied().collect()
        }
    }
}

/// Segment-site Voronoi diagram of the free configuration space.
#[derive(Clone)]
pub struct VoronoiGraph {
    nodes: Vec<VoronoiNode>,
    edges: Vec<VoronoiEdge>,
    adjacency: Vec<Vec<usize>>,
    sites: SiteSet,
    index: SiteIndex,
    mapping: AngleMapping,
    mask: OccupancyMask,
}

impl VoronoiGraph {
    pub fn new(
        nodes: Vec<VoronoiNode>,
        edges: Vec<VoronoiEdge>,
        sites: SiteSet,
        mapping: AngleMapping,
        mask: OccupancyMask,
    ) -> Self {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (idx, edge) in edges.iter().enumerate() {
            adjacency[edge.from].push(idx);
            adjacency[edge.to].push(idx);
        }
        let index = SiteIndex::new(&sites);
        Self {
            nodes,
            edges,
            adjacency,
            sites,
            index,
            mapping,
            mask,
        }
    }

    /// Graph without nodes for a grid without free space.
    pub fn empty(sites: SiteSet, mapping: AngleMapping, mask: OccupancyMask) -> Self {
        Self::new(Vec::new(), Vec::new(), sites, mapping, mask)
    }

    pub fn nodes(&self) -> &[VoronoiNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> Option<&VoronoiNode> {
        self.nodes.get(idx)
    }

    pub fn edge(&self, idx: usize) -> Option<&VoronoiEdge> {
        self.edges.get(idx)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edge ids incident to `node`.
    pub fn incident_edges(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(neighbor, edge id)` pairs of `node`.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.incident_edges(node)
            .iter()
            .map(move |&e| (self.edges[e].other(node), e))
    }

    pub fn sites(&self) -> &SiteSet {
        &self.sites
    }

    pub fn site_index(&self) -> &SiteIndex {
        &self.index
    }

    pub fn mapping(&self) -> &AngleMapping {
        &self.mapping
    }

    pub fn mask(&self) -> &OccupancyMask {
        &self.mask
    }

    /// Distance from `p` to the nearest site (cells).
    pub fn clearance_at(&self, p: Point2D) -> f64 {
        self.index.nearest_distance(p)
    }

    /// Edge polyline length in angle units.
    pub fn edge_angle_length(&self, edge: usize) -> f64 {
        self.edges.get(edge).map_or(0.0, |e| {
            e.points
                .windows(2)
                .map(|w| self.mapping.angle_length(w[1] - w[0]))
                .sum()
        })
    }

    /// Number of connected components (isolated nodes count as components).
    pub fn component_count(&self) -> usize {
        let mut seen = vec![false; self.nodes.len()];
        let mut count = 0;
        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            count += 1;
            seen[start] = true;
            let mut stack = vec![start];
            while let Some(n) = stack.pop() {
                for (m, _) in self.neighbors(n) {
                    if !seen[m] {
                        seen[m] = true;
                        stack.push(m);
                    }
                }
            }
        }
        count
    }
}

impl fmt::Debug for VoronoiGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoronoiGraph")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("sites", &self.sites.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AngleRange;
    use approx::assert_relative_eq;

    fn node(x: f64, y: f64) -> VoronoiNode {
        VoronoiNode {
            position: Point2D::new(x, y),
            clearance: 1.0,
            sites: vec![0, 1, 2],
            kind: NodeKind::Vertex,
        }
    }

    fn edge(from: usize, to: usize, points: Vec<Point2D>) -> VoronoiEdge {
        VoronoiEdge {
            from,
            to,
            sites: (0, 1),
            curve: EdgeCurve::Line {
                origin: points[0],
                direction: Point2D::new(1.0, 0.0),
            },
            length: 0.0,
            min_clearance: 1.0,
            inside_inverted: false,
            connector: false,
            points,
        }
    }

    #[test]
    fn test_adjacency_and_lengths() {
        let mapping = AngleMapping::new(
            AngleRange::new(0.0, 10.0, 2.0),
            AngleRange::new(0.0, 5.0, 1.0),
        )
        .unwrap();
        let mask = OccupancyMask::from_fn(5, 5, |_, _| false);
        let nodes = vec![node(0.0, 0.0), node(3.0, 0.0), node(3.0, 4.0), node(4.0, 4.0)];
        let edges = vec![
            edge(0, 1, vec![Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0)]),
            edge(1, 2, vec![Point2D::new(3.0, 0.0), Point2D::new(3.0, 4.0)]),
        ];
        let graph = VoronoiGraph::new(nodes, edges, SiteSet::default(), mapping, mask);

        let around_1: Vec<(usize, usize)> = graph.neighbors(1).collect();
        assert_eq!(around_1, vec![(0, 0), (2, 1)]);
        assert_eq!(graph.component_count(), 2);
        // x steps are 2 units per cell
        assert_relative_eq!(graph.edge_angle_length(0), 6.0);
        assert_relative_eq!(graph.edge_angle_length(1), 4.0);
        assert_eq!(
            graph.edges()[1].points_from(2),
            vec![Point2D::new(3.0, 4.0), Point2D::new(3.0, 0.0)]
        );
    }
}
