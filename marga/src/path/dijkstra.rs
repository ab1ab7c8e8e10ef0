//! Dijkstra's shortest path with a turning-angle tie-break.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{Point2D, turning_angle};

/// Costs closer than this are considered equal.
pub const COST_TOLERANCE: f64 = 1e-9;

/// Directed traversal of a graph edge.
#[derive(Clone, Copy, Debug)]
pub struct Arc {
    pub to: usize,
    /// Edge id in the graph
    pub edge: usize,
    pub weight: f64,
    /// Direction when leaving the source node
    pub depart: Point2D,
    /// Direction when reaching `to`
    pub arrive: Point2D,
}

/// State for Dijkstra's algorithm priority queue.
#[derive(Clone, Copy, Debug)]
pub struct DijkstraState {
    /// Accumulated weight
    pub cost: f64,
    /// Accumulated turning angle (radians)
    pub turning: f64,
    pub node: usize,
}

impl PartialEq for DijkstraState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DijkstraState {}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        if (self.cost - other.cost).abs() > COST_TOLERANCE {
            return other.cost.total_cmp(&self.cost);
        }
        other
            .turning
            .total_cmp(&self.turning)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a Dijkstra search.
#[derive(Clone, Debug)]
pub struct DijkstraResult {
    /// Node indices from start to goal.
    pub nodes: Vec<usize>,
    /// Edge ids between consecutive nodes.
    pub edges: Vec<usize>,
    pub cost: f64,
    pub turning: f64,
}

fn improves(cost: f64, turning: f64, best_cost: f64, best_turning: f64) -> bool {
    if cost < best_cost - COST_TOLERANCE {
        return true;
    }
    (cost - best_cost).abs() <= COST_TOLERANCE && turning < best_turning - COST_TOLERANCE
}

/// Find the cheapest path from `start` to `goal`.
///
/// # Arguments
/// * `arcs` - Adjacency list: arcs[i] = outgoing traversals of node i
/// * `heading` - Direction of travel on arrival at `start`, if any
///
/// Among paths of equal cost (within [`COST_TOLERANCE`]) the one with the
/// lowest accumulated turning angle wins, then the lowest node index.
pub fn dijkstra(
    arcs: &[Vec<Arc>],
    start: usize,
    goal: usize,
    heading: Option<Point2D>,
) -> Option<DijkstraResult> {
    let n = arcs.len();
    if n == 0 || start >= n || goal >= n {
        return None;
    }
    if start == goal {
        return Some(DijkstraResult {
            nodes: vec![start],
            edges: Vec::new(),
            cost: 0.0,
            turning: 0.0,
        });
    }

    let mut cost = vec![f64::INFINITY; n];
    let mut turning = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut arrival: Vec<Option<Point2D>> = vec![None; n];
    let mut done = vec![false; n];
    cost[start] = 0.0;
    turning[start] = 0.0;
    arrival[start] = heading;

    let mut heap = BinaryHeap::new();
    heap.push(DijkstraState {
        cost: 0.0,
        turning: 0.0,
        node: start,
    });

    while let Some(DijkstraState {
        cost: c,
        turning: t,
        node,
    }) = heap.pop()
    {
        // Skip stale entries
        if done[node] || c != cost[node] || t != turning[node] {
            continue;
        }
        done[node] = true;
        if node == goal {
            break;
        }

        for arc in &arcs[node] {
            if done[arc.to] {
                continue;
            }
            let turn = arrival[node].map_or(0.0, |h| turning_angle(h, arc.depart));
            let new_cost = c + arc.weight;
            let new_turning = t + turn;
            if improves(new_cost, new_turning, cost[arc.to], turning[arc.to]) {
                cost[arc.to] = new_cost;
                turning[arc.to] = new_turning;
                prev[arc.to] = Some((node, arc.edge));
                arrival[arc.to] = Some(arc.arrive);
                heap.push(DijkstraState {
                    cost: new_cost,
                    turning: new_turning,
                    node: arc.to,
                });
            }
        }
    }

    prev[goal]?;

    // Reconstruct path
    let mut nodes = vec![goal];
    let mut edges = Vec::new();
    let mut current = goal;
    while current != start {
        let (p, e) = prev[current]?;
        nodes.push(p);
        edges.push(e);
        current = p;
    }
    nodes.reverse();
    edges.reverse();

    Some(DijkstraResult {
        nodes,
        edges,
        cost: cost[goal],
        turning: turning[goal],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arc(to: usize, edge: usize, weight: f64, dir: (f64, f64)) -> Arc {
        let d = Point2D::new(dir.0, dir.1);
        Arc {
            to,
            edge,
            weight,
            depart: d,
            arrive: d,
        }
    }

    #[test]
    fn test_shortest_path() {
        // 0 -> 1 -> 3 costs 2, 0 -> 2 -> 3 costs 3
        let arcs = vec![
            vec![arc(1, 0, 1.0, (1.0, 0.0)), arc(2, 1, 1.0, (0.0, 1.0))],
            vec![arc(3, 2, 1.0, (0.0, 1.0))],
            vec![arc(3, 3, 2.0, (1.0, 0.0))],
            vec![],
        ];
        let result = dijkstra(&arcs, 0, 3, None).unwrap();
        assert_eq!(result.nodes, vec![0, 1, 3]);
        assert_eq!(result.edges, vec![0, 2]);
        assert_relative_eq!(result.cost, 2.0);
    }

    #[test]
    fn test_equal_cost_prefers_straight_route() {
        // Both routes cost 2; the upper one turns twice, the lower one not at all
        let arcs = vec![
            vec![arc(1, 0, 1.0, (1.0, 1.0)), arc(2, 1, 1.0, (1.0, 0.0))],
            vec![arc(3, 2, 1.0, (1.0, -1.0))],
            vec![arc(3, 3, 1.0, (1.0, 0.0))],
            vec![],
        ];
        let result = dijkstra(&arcs, 0, 3, Some(Point2D::new(1.0, 0.0))).unwrap();
        assert_eq!(result.nodes, vec![0, 2, 3]);
        assert_relative_eq!(result.turning, 0.0);
    }

    #[test]
    fn test_unreachable_goal() {
        let arcs = vec![vec![arc(1, 0, 1.0, (1.0, 0.0))], vec![], vec![]];
        assert!(dijkstra(&arcs, 0, 2, None).is_none());
        assert_eq!(dijkstra(&arcs, 1, 1, None).unwrap().nodes, vec![1]);
    }
}
