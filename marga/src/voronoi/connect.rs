//! Joins graph pieces that share a component of the free space.
//!
//! The sample lattice can leave a chain end short of the vertex it belongs
//! to, which splits the graph although the free space around it is
//! connected. Within every free component the piece with the most nodes is
//! kept as the trunk and each other piece is joined to it along the shortest
//! chain of free cells, shortened by line of sight. A free component without
//! any node receives one isolated node at its most open cell, so every free
//! component owns exactly one graph component.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::curve::EdgeCurve;
use super::graph::{NodeKind, VoronoiEdge, VoronoiNode};
use super::index::SiteIndex;
use crate::core::{OccupancyMask, Point2D};
use crate::region::RegionSet;

/// Spacing of clearance samples along a connector (cells).
const CLEARANCE_STEP: f64 = 0.25;

/// Union-find over node ids.
struct Pieces {
    parent: Vec<usize>,
}

impl Pieces {
    fn new(n: usize, edges: &[VoronoiEdge]) -> Self {
        let mut pieces = Self {
            parent: (0..n).collect(),
        };
        for e in edges {
            pieces.union(e.from, e.to);
        }
        pieces
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Free cell a node belongs to: its own cell, else a free cell touching it.
fn node_cell(mask: &OccupancyMask, labels: &[Option<usize>], p: Point2D) -> Option<(usize, usize)> {
    let (i, j) = mask.cell_of(p)?;
    let w = mask.width();
    if labels[j * w + i].is_some() {
        return Some((i, j));
    }
    let mut best: Option<(f64, (usize, usize))> = None;
    for y in j.saturating_sub(1)..=(j + 1).min(mask.height() - 1) {
        for x in i.saturating_sub(1)..=(i + 1).min(w - 1) {
            if labels[y * w + x].is_none() {
                continue;
            }
            let d = OccupancyMask::cell_centre(x, y).distance(p);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, (x, y)));
            }
        }
    }
    best.map(|(_, cell)| cell)
}

/// Smallest site distance along a polyline, sampled every [`CLEARANCE_STEP`].
fn polyline_clearance(index: &SiteIndex, points: &[Point2D]) -> f64 {
    let mut clearance = points
        .first()
        .map_or(f64::INFINITY, |&p| index.nearest_distance(p));
    for w in points.windows(2) {
        let n = (w[0].distance(w[1]) / CLEARANCE_STEP).ceil().max(1.0) as usize;
        for k in 1..=n {
            let p = w[0].lerp(w[1], k as f64 / n as f64);
            clearance = clearance.min(index.nearest_distance(p));
        }
    }
    clearance
}

/// Stitches pieces of a raw diagram into one graph component per free component.
pub(super) struct Connector<'a> {
    mask: &'a OccupancyMask,
    index: &'a SiteIndex,
    regions: &'a RegionSet,
    eps: f64,
}

impl<'a> Connector<'a> {
    pub(super) fn new(
        mask: &'a OccupancyMask,
        index: &'a SiteIndex,
        regions: &'a RegionSet,
        eps: f64,
    ) -> Self {
        Self {
            mask,
            index,
            regions,
            eps,
        }
    }

    /// Add connectors and pocket nodes; returns the number of connectors.
    pub(super) fn connect(&self, nodes: &mut Vec<VoronoiNode>, edges: &mut Vec<VoronoiEdge>) -> usize {
        let (labels, count) = self.mask.free_components();
        let w = self.mask.width();

        let cells: Vec<Option<(usize, usize)>> = nodes
            .iter()
            .map(|n| node_cell(self.mask, &labels, n.position))
            .collect();
        let mut pieces = Pieces::new(nodes.len(), edges);

        // free component -> piece root -> member nodes
        let mut by_component: Vec<BTreeMap<usize, Vec<usize>>> = vec![BTreeMap::new(); count];
        for (node, cell) in cells.iter().enumerate() {
            let Some((i, j)) = *cell else {
                continue;
            };
            if let Some(component) = labels[j * w + i] {
                let root = pieces.find(node);
                by_component[component].entry(root).or_default().push(node);
            }
        }

        let mut connectors = 0;
        let mut pockets = 0;
        for (component, groups) in by_component.into_iter().enumerate() {
            if groups.is_empty() {
                if let Some(node) = self.pocket_node(&labels, component) {
                    nodes.push(node);
                    pockets += 1;
                }
                continue;
            }
            if groups.len() < 2 {
                continue;
            }
            connectors += self.join_pieces(nodes, edges, &cells, groups);
        }

        if connectors > 0 || pockets > 0 {
            debug!(
                "[Voronoi] Joined {} split pieces, added {} pocket nodes",
                connectors, pockets
            );
        }
        connectors
    }

    /// Join every piece of one free component to its largest piece.
    fn join_pieces(
        &self,
        nodes: &[VoronoiNode],
        edges: &mut Vec<VoronoiEdge>,
        cells: &[Option<(usize, usize)>],
        groups: BTreeMap<usize, Vec<usize>>,
    ) -> usize {
        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        let trunk = groups
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then(b.0.cmp(&a.0)))
            .map_or(0, |(k, _)| k);
        let mut joined = groups.swap_remove(trunk);

        // cell -> (piece, node) for nodes not yet joined
        let mut waiting: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
        for (piece, members) in groups.iter().enumerate() {
            for &node in members {
                if let Some(cell) = cells[node] {
                    waiting.entry(cell).or_default().push((piece, node));
                }
            }
        }

        let mut added = 0;
        let mut remaining = groups.len();
        while remaining > 0 {
            let sources: Vec<(usize, usize)> = joined.iter().filter_map(|&n| cells[n]).collect();
            let Some(chain) = self
                .mask
                .cell_path(&sources, |i, j| waiting.contains_key(&(i, j)))
            else {
                break;
            };
            let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
                break;
            };
            let Some(&(piece, to)) = waiting.get(&last).and_then(|v| v.first()) else {
                break;
            };
            let Some(from) = joined
                .iter()
                .copied()
                .filter(|&n| cells[n] == Some(first))
                .min_by(|&a, &b| {
                    let centre = OccupancyMask::cell_centre(first.0, first.1);
                    let da = nodes[a].position.distance(centre);
                    let db = nodes[b].position.distance(centre);
                    da.total_cmp(&db)
                })
            else {
                break;
            };

            let mut points = Vec::with_capacity(chain.len() + 2);
            points.push(nodes[from].position);
            points.extend(chain.iter().map(|&(i, j)| OccupancyMask::cell_centre(i, j)));
            points.push(nodes[to].position);
            points.dedup();
            let points = self.mask.shortcut(&points);
            edges.push(self.connector_edge(nodes, from, to, points));
            added += 1;

            let members = std::mem::take(&mut groups[piece]);
            for &node in &members {
                if let Some(cell) = cells[node] {
                    if let Some(list) = waiting.get_mut(&cell) {
                        list.retain(|&(p, _)| p != piece);
                        if list.is_empty() {
                            waiting.remove(&cell);
                        }
                    }
                }
            }
            joined.extend(members);
            remaining -= 1;
        }
        added
    }

    fn connector_edge(
        &self,
        nodes: &[VoronoiNode],
        from: usize,
        to: usize,
        points: Vec<Point2D>,
    ) -> VoronoiEdge {
        let (p, q) = (nodes[from].position, nodes[to].position);
        let site_of = |node: &VoronoiNode| {
            self.index
                .nearest(node.position)
                .map(|(id, _)| id)
                .or_else(|| node.sites.first().copied())
                .unwrap_or(0)
        };
        let (a, b) = (site_of(&nodes[from]), site_of(&nodes[to]));
        let length = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        let mid = super::builder::polyline_midpoint(&points);
        let inside_inverted = self.regions.inverted_regions().any(|r| r.contains_point(mid));
        VoronoiEdge {
            from,
            to,
            sites: (a.min(b), a.max(b)),
            curve: EdgeCurve::Line {
                origin: p,
                direction: (q - p).normalized().unwrap_or(Point2D::new(1.0, 0.0)),
            },
            min_clearance: polyline_clearance(self.index, &points),
            points,
            length,
            inside_inverted,
            connector: true,
        }
    }

    /// Isolated node at the most open cell of a free component without nodes.
    fn pocket_node(&self, labels: &[Option<usize>], component: usize) -> Option<VoronoiNode> {
        let w = self.mask.width();
        let mut best: Option<(f64, Point2D)> = None;
        for (idx, label) in labels.iter().enumerate() {
            if *label != Some(component) {
                continue;
            }
            let centre = OccupancyMask::cell_centre(idx % w, idx / w);
            let clearance = self.index.nearest_distance(centre);
            if best.is_none_or(|(c, _)| clearance > c) {
                best = Some((clearance, centre));
            }
        }
        let (clearance, position) = best?;
        let mut sites: Vec<usize> = self
            .index
            .nearest_within(position, self.eps)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        sites.sort_unstable();
        Some(VoronoiNode {
            position,
            clearance,
            sites,
            kind: NodeKind::Fallback,
        })
    }
}
