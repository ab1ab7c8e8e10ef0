//! Path finder over a Voronoi graph.
//!
//! Every segment of a returned path is checked against the occupancy mask;
//! a segment that clips a blocked cell is replaced by a detour through free
//! cells, and a path that still crosses one is reported as
//! [`PathStatus::Collision`].

use std::collections::HashMap;
use std::ops::Range;

use log::{debug, trace, warn};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::config::{PathConfig, PathStrategy};
use super::dijkstra::{Arc, DijkstraResult, dijkstra};
use super::subdivide::remove_close_vertices;
use super::{Path, PathStatus};
use crate::core::{AngleMapping, OccupancyMask, Point2D, Segment};
use crate::voronoi::VoronoiGraph;

type NodePoint = GeomWithData<[f64; 2], usize>;

/// Smallest clearance used as a divisor by [`PathStrategy::PenaliseWalls`] (cells).
const MIN_CLEARANCE: f64 = 1e-6;

/// Finds paths between angle pairs on a [`VoronoiGraph`].
#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    config: PathConfig,
}

impl PathFinder {
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Find a path from `start` to `target` (`[angle1, angle2]`, radians).
    ///
    /// Failures are reported through [`Path::ok`] and [`Path::status`]. A
    /// blocked start or target still yields the path from the nearest node,
    /// flagged as not ok. A free query joins the graph only through free
    /// space; when no node is reachable that way the result is
    /// [`PathStatus::NoPath`].
    pub fn find(&self, graph: &VoronoiGraph, start: [f64; 2], target: [f64; 2]) -> Path {
        let mapping = graph.mapping();
        let mask = graph.mask();
        let ps = mapping.to_lattice(start);
        let pt = mapping.to_lattice(target);

        if !(ps.is_finite() && mapping.contains(ps) && pt.is_finite() && mapping.contains(pt)) {
            debug!("[PathFinder] query outside grid: start={start:?} target={target:?}");
            return Path::failed(PathStatus::OutOfRange);
        }

        let status = if mask.state_at(ps).is_blocked() {
            PathStatus::StartBlocked
        } else if mask.state_at(pt).is_blocked() {
            PathStatus::TargetBlocked
        } else {
            PathStatus::Found
        };
        let failed = |reason: PathStatus| {
            Path::failed(if status == PathStatus::Found { reason } else { status })
        };

        if graph.is_empty() {
            debug!("[PathFinder] empty graph");
            return failed(PathStatus::EmptyGraph);
        }

        let tree = RTree::bulk_load(
            graph
                .nodes()
                .iter()
                .enumerate()
                .map(|(idx, n)| NodePoint::new(n.position.to_array(), idx))
                .collect(),
        );
        let (Some(entry), Some(exit)) = (self.attach(graph, &tree, ps), self.attach(graph, &tree, pt))
        else {
            debug!("[PathFinder] no graph node reachable through free space");
            return failed(PathStatus::NoPath);
        };
        trace!(
            "[PathFinder] attached start -> node {} ({} lead points), target -> node {} ({} lead points)",
            entry.node,
            entry.lead.len(),
            exit.node,
            exit.lead.len()
        );

        let arcs = self.arcs(graph);
        let heading = match entry.lead.as_slice() {
            [.., a, b] => angle_vector(mapping, *b - *a).normalized(),
            _ => None,
        };

        let Some(result) = dijkstra(&arcs, entry.node, exit.node, heading) else {
            debug!(
                "[PathFinder] nodes {} and {} are not connected",
                entry.node, exit.node
            );
            return failed(PathStatus::NoPath);
        };
        debug!(
            "[PathFinder] {} nodes, cost={:.4}, turning={:.3} rad",
            result.nodes.len(),
            result.cost,
            result.turning
        );

        let route = Route::collect(graph, &result);
        let mut lattice = self.assemble(mask, &route, &entry, &exit);
        lattice.dedup();

        let mut status = status;
        if status == PathStatus::Found {
            match detour_blocked(mask, &lattice) {
                Some(clear) => lattice = clear,
                None => {
                    warn!("[PathFinder] path cannot be kept in free cells");
                    status = PathStatus::Collision;
                }
            }
        }

        // Query angles are reported as given, not round-tripped through the lattice
        let mut vertices: Vec<[f64; 2]> = lattice.into_iter().map(|p| mapping.to_angles(p)).collect();
        if let Some(first) = vertices.first_mut() {
            *first = start;
        }
        if let Some(last) = vertices.last_mut() {
            *last = target;
        }
        let mut path = Path::new(status, vertices);
        if self.config.min_vertex_distance > 0.0 {
            path = remove_close_vertices(&path, self.config.min_vertex_distance);
        }
        if path.ok && !stays_free(graph, &path) {
            warn!("[PathFinder] path crosses a blocked cell");
            path = Path::new(PathStatus::Collision, path.vertices);
        }
        path
    }

    /// How a query point joins the graph.
    ///
    /// A blocked point takes the nearest node. A free point takes the first
    /// of the nearest candidates reachable along a straight free line, else
    /// the nearest node (by free cells) of its free component, reached along
    /// a line-of-sight shortened chain of cells. `None` when its free
    /// component holds no node.
    fn attach(&self, graph: &VoronoiGraph, tree: &RTree<NodePoint>, p: Point2D) -> Option<Attachment> {
        let mask = graph.mask();
        if mask.state_at(p).is_blocked() {
            let nearest = tree.nearest_neighbor(&p.to_array())?;
            return Some(Attachment::direct(p, nearest.data, Point2D::from(*nearest.geom())));
        }

        for candidate in tree
            .nearest_neighbor_iter(&p.to_array())
            .take(self.config.attach_candidates)
        {
            let q = Point2D::from(*candidate.geom());
            if mask.segment_is_free(p, q) {
                return Some(Attachment::direct(p, candidate.data, q));
            }
        }

        let mut by_cell: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (idx, node) in graph.nodes().iter().enumerate() {
            if let Some(cell) = mask.cell_of(node.position) {
                by_cell.entry(cell).or_default().push(idx);
            }
        }
        let origin = mask.cell_of(p)?;
        let chain = mask.cell_path(&[origin], |i, j| by_cell.contains_key(&(i, j)))?;
        let last = *chain.last()?;
        let node = by_cell.get(&last)?.iter().copied().min_by(|&a, &b| {
            let da = graph.nodes()[a].position.distance(p);
            let db = graph.nodes()[b].position.distance(p);
            da.total_cmp(&db)
        })?;

        let mut lead = Vec::with_capacity(chain.len() + 2);
        lead.push(p);
        lead.extend(chain.iter().map(|&(i, j)| OccupancyMask::cell_centre(i, j)));
        lead.push(graph.nodes()[node].position);
        lead.dedup();
        Some(Attachment {
            node,
            lead: mask.shortcut(&lead),
            direct: false,
        })
    }

    /// Lattice polyline from the start query to the target query.
    ///
    /// A query reaching its node in a straight line joins the route at the
    /// closest point of the first (or last) route edge instead, when that
    /// point is in sight.
    fn assemble(
        &self,
        mask: &OccupancyMask,
        route: &Route,
        entry: &Attachment,
        exit: &Attachment,
    ) -> Vec<Point2D> {
        let (ps, pt) = (entry.query(), exit.query());
        let points = &route.points;
        let segments = points.len().saturating_sub(1);

        let mut join = entry
            .direct
            .then(|| closest_on(points, 0..route.first_edge_end, ps))
            .flatten()
            .filter(|c| mask.segment_is_free(ps, c.point));
        let mut leave = exit
            .direct
            .then(|| closest_on(points, route.last_edge_start..segments, pt))
            .flatten()
            .filter(|c| mask.segment_is_free(c.point, pt));
        if let (Some(a), Some(b)) = (join, leave) {
            if (a.segment, a.t) > (b.segment, b.t) {
                join = None;
                leave = None;
            }
        }

        let mut lattice = Vec::with_capacity(points.len() + entry.lead.len() + exit.lead.len());
        let from = match join {
            Some(c) => {
                lattice.extend([ps, c.point]);
                c.segment + 1
            }
            None => {
                lattice.extend_from_slice(&entry.lead[..entry.lead.len().saturating_sub(1)]);
                0
            }
        };
        match leave {
            Some(c) => {
                if from <= c.segment {
                    lattice.extend_from_slice(&points[from..=c.segment]);
                }
                lattice.extend([c.point, pt]);
            }
            None => {
                if from < points.len() {
                    lattice.extend_from_slice(&points[from..]);
                }
                lattice.extend(exit.lead.iter().rev().skip(1));
            }
        }
        lattice
    }

    /// Edge weight under the configured strategy.
    fn weight(&self, graph: &VoronoiGraph, edge: usize) -> f64 {
        let e = &graph.edges()[edge];
        let length = graph.edge_angle_length(edge);
        let base = match self.config.strategy {
            PathStrategy::Shortest => length,
            PathStrategy::PenaliseWalls => {
                let clearance = graph.nodes()[e.from]
                    .clearance
                    .min(graph.nodes()[e.to].clearance)
                    .max(MIN_CLEARANCE);
                length / (clearance * graph.mapping().mean_step())
            }
        };
        if e.inside_inverted {
            base * self.config.inverted_region_weight
        } else {
            base
        }
    }

    /// Directed traversals of every edge, directions in angle units.
    fn arcs(&self, graph: &VoronoiGraph) -> Vec<Vec<Arc>> {
        let mapping = graph.mapping();
        (0..graph.node_count())
            .map(|node| {
                graph
                    .neighbors(node)
                    .map(|(to, edge)| {
                        let points = graph.edges()[edge].points_from(node);
                        let n = points.len();
                        let (depart, arrive) = if n >= 2 {
                            (points[1] - points[0], points[n - 1] - points[n - 2])
                        } else {
                            (Point2D::ZERO, Point2D::ZERO)
                        };
                        Arc {
                            to,
                            edge,
                            weight: self.weight(graph, edge),
                            depart: angle_vector(mapping, depart),
                            arrive: angle_vector(mapping, arrive),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Query point joined to a graph node.
struct Attachment {
    node: usize,
    /// Lattice points from the query to the node, both included.
    lead: Vec<Point2D>,
    /// The node is reached along one straight free segment.
    direct: bool,
}

impl Attachment {
    fn direct(p: Point2D, node: usize, position: Point2D) -> Self {
        Self {
            node,
            lead: vec![p, position],
            direct: true,
        }
    }

    fn query(&self) -> Point2D {
        self.lead.first().copied().unwrap_or(Point2D::ZERO)
    }
}

/// Node-to-node polyline of a Dijkstra result.
struct Route {
    points: Vec<Point2D>,
    /// Index of the point ending the first edge.
    first_edge_end: usize,
    /// Index of the point starting the last edge.
    last_edge_start: usize,
}

impl Route {
    fn collect(graph: &VoronoiGraph, result: &DijkstraResult) -> Self {
        let start = result
            .nodes
            .first()
            .map_or(Point2D::ZERO, |&n| graph.nodes()[n].position);
        let mut route = Self {
            points: vec![start],
            first_edge_end: 0,
            last_edge_start: 0,
        };
        let count = result.edges.len();
        for (k, (&node, &edge)) in result.nodes.iter().zip(&result.edges).enumerate() {
            if k + 1 == count {
                route.last_edge_start = route.points.len() - 1;
            }
            route
                .points
                .extend(graph.edges()[edge].points_from(node).into_iter().skip(1));
            if k == 0 {
                route.first_edge_end = route.points.len() - 1;
            }
        }
        route
    }
}

/// Point of a polyline closest to a query.
#[derive(Clone, Copy, Debug)]
struct Closest {
    /// Index of the segment `points[segment]..points[segment + 1]`
    segment: usize,
    /// Position along the segment, 0 to 1
    t: f64,
    point: Point2D,
}

/// Closest point to `p` over the segments starting at the indices in `segments`.
fn closest_on(points: &[Point2D], segments: Range<usize>, p: Point2D) -> Option<Closest> {
    let mut best: Option<(f64, Closest)> = None;
    for segment in segments {
        let (Some(&a), Some(&b)) = (points.get(segment), points.get(segment + 1)) else {
            break;
        };
        let t = Segment::new(a, b).project(p).clamp(0.0, 1.0);
        let point = a.lerp(b, t);
        let d = point.distance(p);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, Closest { segment, t, point }));
        }
    }
    best.map(|(_, c)| c)
}

/// Keep a polyline in free cells.
///
/// Interior vertices in blocked cells are dropped and every segment that
/// crosses a blocked cell is replaced by a detour through free cells. `None`
/// when an end point is blocked or no detour exists.
fn detour_blocked(mask: &OccupancyMask, points: &[Point2D]) -> Option<Vec<Point2D>> {
    let (&first, &last) = (points.first()?, points.last()?);
    if mask.state_at(first).is_blocked() || mask.state_at(last).is_blocked() {
        return None;
    }
    let mut clear = vec![first];
    for (k, &b) in points.iter().enumerate().skip(1) {
        if k + 1 < points.len() && mask.state_at(b).is_blocked() {
            continue;
        }
        let a = *clear.last()?;
        if mask.segment_is_free(a, b) {
            clear.push(b);
            continue;
        }
        let (from, to) = (mask.cell_of(a)?, mask.cell_of(b)?);
        let chain = mask.cell_path(&[from], |i, j| (i, j) == to)?;
        let mut detour = Vec::with_capacity(chain.len() + 2);
        detour.push(a);
        detour.extend(chain.iter().map(|&(i, j)| OccupancyMask::cell_centre(i, j)));
        detour.push(b);
        detour.dedup();
        trace!(
            "[PathFinder] detour of {} cells around ({:.2}, {:.2}) -> ({:.2}, {:.2})",
            chain.len(),
            a.x,
            a.y,
            b.x,
            b.y
        );
        clear.extend(mask.shortcut(&detour).into_iter().skip(1));
    }
    clear.dedup();
    Some(clear)
}

/// Every path segment stays in free cells.
fn stays_free(graph: &VoronoiGraph, path: &Path) -> bool {
    let mapping = graph.mapping();
    path.vertices.windows(2).all(|w| {
        graph
            .mask()
            .segment_is_free(mapping.to_lattice(w[0]), mapping.to_lattice(w[1]))
    })
}

/// Lattice vector scaled to angle units.
fn angle_vector(mapping: &AngleMapping, d: Point2D) -> Point2D {
    Point2D::new(d.x * mapping.axis1.step, d.y * mapping.axis2.step)
}
