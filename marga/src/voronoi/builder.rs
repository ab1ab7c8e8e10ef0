//! Raster-guided construction of the segment Voronoi diagram.
//!
//! The topology is discovered on a sample lattice (every free cell carries
//! `subsamples²` samples labelled with their nearest site); the geometry is
//! exact: bisector crossings are located by bisection on the site distance
//! functions, vertices by solving the equidistance equations, and edge curves
//! are the analytic bisectors of their two sites.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace, warn};

use super::config::VoronoiConfig;
use super::connect::Connector;
use super::curve::EdgeCurve;
use super::graph::{NodeKind, VoronoiEdge, VoronoiGraph, VoronoiNode};
use super::index::SiteIndex;
use super::site::{Site, SiteSet};
use super::solve::{constraints_for, solve};
use crate::core::{CellState, OccupancyMask, Point2D};
use crate::error::Result;
use crate::region::RegionSet;

/// Sub-sample offset; keeps samples off cell borders and symmetry lines.
const SAMPLE_OFFSET: (f64, f64) = (0.0173, -0.0291);

const BISECTION_STEPS: usize = 50;

/// Search radius for dangling chain ends, in sample spacings.
const LOOSE_END_REACH: f64 = 4.0;

type Pair = (usize, usize);

fn ordered(a: usize, b: usize) -> Pair {
    (a.min(b), a.max(b))
}

/// Element of the intermediate bisector graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Item {
    Vertex(usize),
    Crossing(usize),
}

/// Bisector point on a sample link.
#[derive(Clone, Copy, Debug)]
struct Crossing {
    position: Point2D,
    pair: Pair,
}

/// Edge between two items, before node numbering.
struct PendingEdge {
    from: Item,
    to: Item,
    sites: Pair,
    curve: EdgeCurve,
    points: Vec<Point2D>,
    min_clearance: f64,
}

#[derive(Clone, Debug)]
struct RawVertex {
    position: Point2D,
    sites: BTreeSet<usize>,
    kind: NodeKind,
}

impl RawVertex {
    fn has_pair(&self, pair: Pair) -> bool {
        self.sites.contains(&pair.0) && self.sites.contains(&pair.1)
    }

    fn shared_sites(&self, other: &RawVertex) -> usize {
        self.sites.intersection(&other.sites).count()
    }
}

/// Builds a [`VoronoiGraph`] from segment regions.
#[derive(Clone, Debug, Default)]
pub struct VoronoiBuilder {
    config: VoronoiConfig,
}

impl VoronoiBuilder {
    pub fn new(config: VoronoiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VoronoiConfig {
        &self.config
    }

    /// Construct the diagram of the free space bounded by `regions` and the grid frame.
    pub fn build(&self, regions: &RegionSet) -> Result<VoronoiGraph> {
        self.config.validate()?;
        let mapping = regions.mapping;
        let mask = &regions.mask;

        if mask.blocked_count() == mask.cells().len() {
            debug!("[Voronoi] No free cells: empty graph");
            return Ok(VoronoiGraph::empty(SiteSet::default(), mapping, mask.clone()));
        }

        let sites = SiteSet::collect(regions, self.config.eps)?;
        if sites.is_empty() {
            return Ok(VoronoiGraph::empty(sites, mapping, mask.clone()));
        }

        let mut construction = Construction::new(&self.config, &sites, mask);
        construction.label_samples();
        construction.find_crossings();
        construction.process_squares();
        construction.link_loose_ends();
        let (mut nodes, mut edges) = construction.extract(regions);
        Connector::new(mask, &construction.index, regions, self.config.eps)
            .connect(&mut nodes, &mut edges);
        let (nodes, edges) = self.apply_safety_margin(nodes, edges);

        debug!(
            "[Voronoi] Graph: {} nodes, {} edges ({} parabolic)",
            nodes.len(),
            edges.len(),
            edges.iter().filter(|e| e.curve.is_parabola()).count()
        );
        Ok(VoronoiGraph::new(nodes, edges, sites, mapping, mask.clone()))
    }

    /// Drop edges closer to an obstacle than the margin, then nodes left without edges.
    ///
    /// Nodes that had no edges to begin with (pocket nodes) are kept when
    /// their clearance respects the margin.
    fn apply_safety_margin(
        &self,
        nodes: Vec<VoronoiNode>,
        mut edges: Vec<VoronoiEdge>,
    ) -> (Vec<VoronoiNode>, Vec<VoronoiEdge>) {
        let mut isolated = vec![true; nodes.len()];
        for e in &edges {
            isolated[e.from] = false;
            isolated[e.to] = false;
        }
        if self.config.use_safety_margin {
            for (keep, node) in isolated.iter_mut().zip(&nodes) {
                *keep &= node.clearance >= self.config.safety_margin;
            }
            let before = edges.len();
            edges.retain(|e| e.min_clearance >= self.config.safety_margin);
            debug!(
                "[Voronoi] Safety margin {:.3}: removed {} of {} edges",
                self.config.safety_margin,
                before - edges.len(),
                before
            );
        }
        compact(nodes, edges, isolated)
    }
}

/// Remove nodes without edges, except those flagged in `keep`, and renumber.
fn compact(
    nodes: Vec<VoronoiNode>,
    mut edges: Vec<VoronoiEdge>,
    keep: Vec<bool>,
) -> (Vec<VoronoiNode>, Vec<VoronoiEdge>) {
    let mut used = keep;
    for e in &edges {
        used[e.from] = true;
        used[e.to] = true;
    }
    let mut remap = vec![usize::MAX; nodes.len()];
    let mut kept = Vec::with_capacity(nodes.len());
    for (idx, node) in nodes.into_iter().enumerate() {
        if used[idx] {
            remap[idx] = kept.len();
            kept.push(node);
        }
    }
    for e in &mut edges {
        e.from = remap[e.from];
        e.to = remap[e.to];
    }
    (kept, edges)
}

/// Working state of one construction.
struct Construction<'a> {
    config: &'a VoronoiConfig,
    sites: &'a SiteSet,
    index: SiteIndex,
    mask: &'a OccupancyMask,
    /// Sample spacing in cells
    spacing: f64,
    nx: usize,
    ny: usize,
    labels: Vec<Option<usize>>,
    crossings: Vec<Crossing>,
    /// Crossing on each sample link (`2 * sample + 0` horizontal, `+ 1` vertical)
    link_crossing: Vec<Option<usize>>,
    vertices: Vec<RawVertex>,
    buckets: HashMap<(i64, i64), Vec<usize>>,
    adjacency: BTreeMap<Item, BTreeSet<Item>>,
    fallbacks: usize,
}

impl<'a> Construction<'a> {
    fn new(config: &'a VoronoiConfig, sites: &'a SiteSet, mask: &'a OccupancyMask) -> Self {
        let k = config.subsamples;
        let (nx, ny) = (mask.width() * k, mask.height() * k);
        Self {
            config,
            sites,
            index: SiteIndex::new(sites),
            mask,
            spacing: 1.0 / k as f64,
            nx,
            ny,
            labels: vec![None; nx * ny],
            crossings: Vec::new(),
            link_crossing: vec![None; 2 * nx * ny],
            vertices: Vec::new(),
            buckets: HashMap::new(),
            adjacency: BTreeMap::new(),
            fallbacks: 0,
        }
    }

    fn sample(&self, u: usize, v: usize) -> Point2D {
        Point2D::new(
            (u as f64 + 0.5 + SAMPLE_OFFSET.0) * self.spacing,
            (v as f64 + 0.5 + SAMPLE_OFFSET.1) * self.spacing,
        )
    }

    fn label(&self, u: usize, v: usize) -> Option<usize> {
        self.labels[v * self.nx + u]
    }

    fn site(&self, id: usize) -> Option<&'a Site> {
        self.sites.get(id)
    }

    fn horizontal_link(&self, u: usize, v: usize) -> usize {
        2 * (v * self.nx + u)
    }

    fn vertical_link(&self, u: usize, v: usize) -> usize {
        2 * (v * self.nx + u) + 1
    }

    fn label_samples(&mut self) {
        let mut labelled = 0usize;
        for v in 0..self.ny {
            for u in 0..self.nx {
                let p = self.sample(u, v);
                if self.mask.state_at(p) == CellState::Blocked {
                    continue;
                }
                let label = self.index.nearest(p).map(|(id, _)| id);
                labelled += usize::from(label.is_some());
                self.labels[v * self.nx + u] = label;
            }
        }
        debug!(
            "[Voronoi] Labelled {} samples ({} per cell axis)",
            labelled, self.config.subsamples
        );
    }

    fn find_crossings(&mut self) {
        for v in 0..self.ny {
            for u in 0..self.nx {
                let Some(a) = self.label(u, v) else {
                    continue;
                };
                if u + 1 < self.nx {
                    if let Some(b) = self.label(u + 1, v) {
                        let link = self.horizontal_link(u, v);
                        self.add_crossing(link, self.sample(u, v), self.sample(u + 1, v), a, b);
                    }
                }
                if v + 1 < self.ny {
                    if let Some(b) = self.label(u, v + 1) {
                        let link = self.vertical_link(u, v);
                        self.add_crossing(link, self.sample(u, v), self.sample(u, v + 1), a, b);
                    }
                }
            }
        }
        debug!("[Voronoi] Located {} bisector crossings", self.crossings.len());
    }

    fn add_crossing(&mut self, link: usize, pa: Point2D, pb: Point2D, a: usize, b: usize) {
        if a == b || self.sites.is_secondary_pair(a, b) {
            return;
        }
        if let Some(position) = self.bisect(pa, pb, a, b) {
            self.link_crossing[link] = Some(self.crossings.len());
            self.crossings.push(Crossing {
                position,
                pair: ordered(a, b),
            });
        }
    }

    /// Bisector point of sites `a` and `b` between samples labelled `a` and `b`.
    fn bisect(&self, pa: Point2D, pb: Point2D, a: usize, b: usize) -> Option<Point2D> {
        let (sa, sb) = (self.site(a)?, self.site(b)?);
        let f = |x: Point2D| sa.support_distance(x) - sb.support_distance(x);
        if f(pa) > 0.0 || f(pb) < 0.0 {
            return None;
        }
        let (mut lo, mut hi) = (pa, pb);
        for _ in 0..BISECTION_STEPS {
            let mid = lo.lerp(hi, 0.5);
            if f(mid) <= 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let x = lo.lerp(hi, 0.5);
        self.is_on_bisector(x, sa, sb).then_some(x)
    }

    /// `x` is equidistant from both sites and no other site is closer.
    fn is_on_bisector(&self, x: Point2D, sa: &Site, sb: &Site) -> bool {
        let eps = self.config.eps;
        let (da, db) = (sa.distance(x), sb.distance(x));
        da.is_finite()
            && db.is_finite()
            && (da - db).abs() <= eps
            && self.index.nearest_distance(x) >= da - eps
    }

    fn process_squares(&mut self) {
        for v in 0..self.ny.saturating_sub(1) {
            for u in 0..self.nx.saturating_sub(1) {
                let corners = [(u, v), (u + 1, v), (u + 1, v + 1), (u, v + 1)];
                let Some(labels) = corners
                    .iter()
                    .map(|&(x, y)| self.label(x, y))
                    .collect::<Option<Vec<usize>>>()
                else {
                    continue;
                };
                let distinct: BTreeSet<usize> = labels.into_iter().collect();
                if distinct.len() < 2 {
                    continue;
                }

                // Perimeter order: bottom, right, top, left
                let sides = [
                    self.horizontal_link(u, v),
                    self.vertical_link(u + 1, v),
                    self.horizontal_link(u, v + 1),
                    self.vertical_link(u, v),
                ];
                let crossings: Vec<usize> =
                    sides.iter().filter_map(|&l| self.link_crossing[l]).collect();

                if distinct.len() == 2 {
                    self.pair_crossings(&crossings);
                } else if !crossings.is_empty() {
                    self.place_vertices(u, v, &distinct, &crossings);
                }
            }
        }
        if self.fallbacks > 0 {
            warn!(
                "[Voronoi] {} vertices placed approximately (least-squares or centroid)",
                self.fallbacks
            );
        }
        debug!("[Voronoi] Placed {} vertices", self.vertices.len());
    }

    fn crossing_gap(&self, a: usize, b: usize) -> f64 {
        self.crossings[a].position.distance(self.crossings[b].position)
    }

    /// Join crossings of a square touched by one bisector only.
    fn pair_crossings(&mut self, c: &[usize]) {
        match c.len() {
            2 => self.link_crossings(c[0], c[1]),
            3 => {
                let pairs = [(c[0], c[1]), (c[1], c[2]), (c[0], c[2])];
                if let Some(&(a, b)) = pairs.iter().min_by(|x, y| {
                    self.crossing_gap(x.0, x.1).total_cmp(&self.crossing_gap(y.0, y.1))
                }) {
                    self.link_crossings(a, b);
                }
            }
            4 => {
                // Saddle: keep the shorter of the two pairings
                let first = self.crossing_gap(c[0], c[1]) + self.crossing_gap(c[2], c[3]);
                let second = self.crossing_gap(c[1], c[2]) + self.crossing_gap(c[3], c[0]);
                if first <= second {
                    self.link_crossings(c[0], c[1]);
                    self.link_crossings(c[2], c[3]);
                } else {
                    self.link_crossings(c[1], c[2]);
                    self.link_crossings(c[3], c[0]);
                }
            }
            _ => {}
        }
    }

    fn link_crossings(&mut self, a: usize, b: usize) {
        if self.crossings[a].pair == self.crossings[b].pair {
            self.link(Item::Crossing(a), Item::Crossing(b));
        }
    }

    fn link(&mut self, a: Item, b: Item) {
        if a != b {
            self.adjacency.entry(a).or_default().insert(b);
            self.adjacency.entry(b).or_default().insert(a);
        }
    }

    fn degree(&self, item: Item) -> usize {
        self.adjacency.get(&item).map_or(0, BTreeSet::len)
    }

    fn is_linked(&self, a: Item, b: Item) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Solve the vertices of a square where three or more sites meet.
    fn place_vertices(&mut self, u: usize, v: usize, distinct: &BTreeSet<usize>, crossings: &[usize]) {
        let guess = centroid(crossings.iter().map(|&c| self.crossings[c].position));
        let h = self.spacing;
        let (lo, hi) = (self.sample(u, v), self.sample(u + 1, v + 1));
        let ids: Vec<usize> = distinct.iter().copied().collect();

        let mut placed: Vec<usize> = Vec::new();
        for i in 0..ids.len() {
            for j in i + 1..ids.len() {
                for l in j + 1..ids.len() {
                    let triple = [ids[i], ids[j], ids[l]];
                    if let Some(x) = self.exact_vertex(&triple, guess, lo, hi, h) {
                        let id = self.insert_vertex(x, &triple, NodeKind::Vertex);
                        if !placed.contains(&id) {
                            placed.push(id);
                        }
                    }
                }
            }
        }

        if placed.is_empty() {
            let x = self.fallback_vertex(&ids, guess, lo, hi, h);
            trace!("[Voronoi] Fallback vertex at ({:.3}, {:.3}) for sites {:?}", x.x, x.y, ids);
            self.fallbacks += 1;
            placed.push(self.insert_vertex(x, &ids, NodeKind::Fallback));
        }

        for &c in crossings {
            let crossing = self.crossings[c];
            let matching = placed
                .iter()
                .copied()
                .filter(|&id| self.vertices[id].has_pair(crossing.pair))
                .min_by(|&a, &b| {
                    let da = self.vertices[a].position.distance(crossing.position);
                    let db = self.vertices[b].position.distance(crossing.position);
                    da.total_cmp(&db)
                });
            let target = matching.or_else(|| {
                placed.iter().copied().min_by(|&a, &b| {
                    let da = self.vertices[a].position.distance(crossing.position);
                    let db = self.vertices[b].position.distance(crossing.position);
                    da.total_cmp(&db)
                })
            });
            if let Some(target) = target {
                self.link(Item::Crossing(c), Item::Vertex(target));
            }
        }

        for (k, &a) in placed.iter().enumerate() {
            for &b in &placed[k + 1..] {
                if self.vertices[a].shared_sites(&self.vertices[b]) >= 2 {
                    self.link(Item::Vertex(a), Item::Vertex(b));
                }
            }
        }
    }

    /// Exact vertex of three sites near the square spanned by `lo`..`hi`.
    fn exact_vertex(
        &self,
        triple: &[usize; 3],
        guess: Point2D,
        lo: Point2D,
        hi: Point2D,
        margin: f64,
    ) -> Option<Point2D> {
        let eps = self.config.eps;
        let sites: Vec<(usize, &Site)> = triple
            .iter()
            .map(|&id| self.site(id).map(|s| (id, s)))
            .collect::<Option<_>>()?;
        let solution = solve(&constraints_for(&sites, guess)?, guess)?;
        let (x, r) = (solution.position, solution.radius);

        let inside = x.x >= lo.x - margin
            && x.x <= hi.x + margin
            && x.y >= lo.y - margin
            && x.y <= hi.y + margin;
        let equidistant = sites.iter().all(|(_, s)| (s.distance(x) - r).abs() < eps);
        let valid = inside
            && r > eps
            && equidistant
            && self.index.nearest_distance(x) >= r - eps
            && self.mask.state_at(x) == CellState::Free;
        valid.then_some(x)
    }

    /// Least-squares vertex over all sites, else the crossing centroid.
    fn fallback_vertex(
        &self,
        ids: &[usize],
        guess: Point2D,
        lo: Point2D,
        hi: Point2D,
        h: f64,
    ) -> Point2D {
        let sites: Option<Vec<(usize, &Site)>> =
            ids.iter().map(|&id| self.site(id).map(|s| (id, s))).collect();
        let solved = sites
            .and_then(|s| constraints_for(&s, guess))
            .and_then(|c| solve(&c, guess))
            .map(|s| s.position)
            .filter(|x| {
                x.x >= lo.x - 2.0 * h
                    && x.x <= hi.x + 2.0 * h
                    && x.y >= lo.y - 2.0 * h
                    && x.y <= hi.y + 2.0 * h
                    && self.mask.state_at(*x) == CellState::Free
            });
        solved.unwrap_or(guess)
    }

    fn bucket(&self, p: Point2D) -> (i64, i64) {
        (
            (p.x / self.spacing).floor() as i64,
            (p.y / self.spacing).floor() as i64,
        )
    }

    /// Vertices within `radius` of `p`, nearest first.
    fn vertices_near(&self, p: Point2D, radius: f64) -> Vec<usize> {
        let reach = (radius / self.spacing).ceil() as i64 + 1;
        let (bx, by) = self.bucket(p);
        let mut found: Vec<(f64, usize)> = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(ids) = self.buckets.get(&(bx + dx, by + dy)) {
                    for &id in ids {
                        let d = self.vertices[id].position.distance(p);
                        if d <= radius {
                            found.push((d, id));
                        }
                    }
                }
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Insert a vertex, merging it into a close one that shares two sites.
    fn insert_vertex(&mut self, position: Point2D, sites: &[usize], kind: NodeKind) -> usize {
        let new_sites: BTreeSet<usize> = sites.iter().copied().collect();
        let merge_radius = self.spacing / 2.0;
        let existing = self
            .vertices_near(position, merge_radius)
            .into_iter()
            .find(|&id| self.vertices[id].sites.intersection(&new_sites).count() >= 2);

        if let Some(id) = existing {
            let vertex = &mut self.vertices[id];
            vertex.sites.extend(new_sites);
            if kind == NodeKind::Vertex && vertex.kind == NodeKind::Fallback {
                vertex.position = position;
                vertex.kind = NodeKind::Vertex;
            }
            return id;
        }

        let id = self.vertices.len();
        self.vertices.push(RawVertex {
            position,
            sites: new_sites,
            kind,
        });
        let key = self.bucket(position);
        self.buckets.entry(key).or_default().push(id);
        id
    }

    /// Close gaps the per-square pass leaves around vertices.
    fn link_loose_ends(&mut self) {
        let h = self.spacing;

        // Chain ends next to a vertex of their bisector
        for c in 0..self.crossings.len() {
            let item = Item::Crossing(c);
            if self.degree(item) > 1 {
                continue;
            }
            let crossing = self.crossings[c];
            let target = self
                .vertices_near(crossing.position, 1.5 * h)
                .into_iter()
                .find(|&id| {
                    self.vertices[id].has_pair(crossing.pair)
                        && !self.is_linked(item, Item::Vertex(id))
                });
            if let Some(id) = target {
                self.link(item, Item::Vertex(id));
            }
        }

        // Neighbouring vertices on a common bisector
        for a in 0..self.vertices.len() {
            let near = self.vertices_near(self.vertices[a].position, h);
            for b in near {
                if b > a && self.vertices[a].shared_sites(&self.vertices[b]) >= 2 {
                    self.link(Item::Vertex(a), Item::Vertex(b));
                }
            }
        }

        // Ends still dangling: a vertex of their bisector further out, in sight
        for c in 0..self.crossings.len() {
            let item = Item::Crossing(c);
            if self.degree(item) > 1 {
                continue;
            }
            let crossing = self.crossings[c];
            let target = self
                .vertices_near(crossing.position, LOOSE_END_REACH * h)
                .into_iter()
                .find(|&id| {
                    self.vertices[id].has_pair(crossing.pair)
                        && !self.chain_reaches(item, Item::Vertex(id))
                        && self
                            .mask
                            .segment_is_free(crossing.position, self.vertices[id].position)
                });
            if let Some(id) = target {
                self.link(item, Item::Vertex(id));
            }
        }

        // Remaining ends of the same bisector
        let mut ends: BTreeMap<Pair, Vec<usize>> = BTreeMap::new();
        for (c, crossing) in self.crossings.iter().enumerate() {
            if self.degree(Item::Crossing(c)) <= 1 {
                ends.entry(crossing.pair).or_default().push(c);
            }
        }
        for group in ends.values() {
            for (k, &a) in group.iter().enumerate() {
                if self.degree(Item::Crossing(a)) > 1 {
                    continue;
                }
                let partner = group[k + 1..]
                    .iter()
                    .copied()
                    .filter(|&b| {
                        self.degree(Item::Crossing(b)) <= 1
                            && !self.is_linked(Item::Crossing(a), Item::Crossing(b))
                            && self.crossing_gap(a, b) <= 1.5 * h
                    })
                    .min_by(|&x, &y| self.crossing_gap(a, x).total_cmp(&self.crossing_gap(a, y)));
                if let Some(b) = partner {
                    self.link(Item::Crossing(a), Item::Crossing(b));
                }
            }
        }
    }

    /// `target` lies on the chain running from the end `start`.
    fn chain_reaches(&self, start: Item, target: Item) -> bool {
        let (mut prev, mut cur) = (start, start);
        for _ in 0..=self.crossings.len() {
            let Some(next) = self.next_in_chain(cur, prev) else {
                return false;
            };
            if next == target {
                return true;
            }
            if matches!(next, Item::Vertex(_)) || self.degree(next) != 2 {
                return false;
            }
            prev = cur;
            cur = next;
        }
        false
    }

    fn position(&self, item: Item) -> Point2D {
        match item {
            Item::Vertex(v) => self.vertices[v].position,
            Item::Crossing(c) => self.crossings[c].position,
        }
    }

    /// Walk chains of degree-two crossings into edges.
    fn extract(&self, regions: &RegionSet) -> (Vec<VoronoiNode>, Vec<VoronoiEdge>) {
        let mut is_node: BTreeSet<Item> = self
            .adjacency
            .iter()
            .filter(|(item, nbrs)| match item {
                Item::Vertex(_) => !nbrs.is_empty(),
                Item::Crossing(_) => nbrs.len() != 2,
            })
            .map(|(item, _)| *item)
            .collect();

        let mut visited: BTreeSet<(Item, Item)> = BTreeSet::new();
        let mut chains: Vec<Vec<Item>> = Vec::new();
        let starts: Vec<Item> = is_node.iter().copied().collect();
        for start in starts {
            self.walk(start, &is_node, &mut visited, &mut chains);
        }

        // Closed loops without any node
        let limit = self.crossings.len() + 1;
        while let Some((a, b)) = self.first_unvisited(&visited) {
            let mut cycle = vec![a];
            let (mut prev, mut cur) = (a, b);
            while cur != a && cycle.len() <= limit {
                cycle.push(cur);
                let Some(next) = self.next_in_chain(cur, prev) else {
                    break;
                };
                prev = cur;
                cur = next;
            }
            let (first, middle) = (cycle[0], cycle[cycle.len() / 2]);
            is_node.insert(first);
            is_node.insert(middle);
            self.walk(first, &is_node, &mut visited, &mut chains);
            self.walk(middle, &is_node, &mut visited, &mut chains);
            if !visited.contains(&key(a, b)) {
                // Malformed loop; mark it so the scan terminates
                visited.insert(key(a, b));
            }
        }

        // Split loops that return to their start node
        let mut split = Vec::with_capacity(chains.len());
        for chain in chains {
            if chain.len() >= 4 && chain.first() == chain.last() {
                let mid = chain.len() / 2;
                split.push(chain[..=mid].to_vec());
                split.push(chain[mid..].to_vec());
            } else {
                split.push(chain);
            }
        }

        let mut node_ids: BTreeMap<Item, usize> = BTreeMap::new();
        let mut pending: Vec<PendingEdge> = Vec::new();
        for chain in &split {
            if let Some(edge) = self.chain_edge(chain) {
                node_ids.insert(edge.from, 0);
                node_ids.insert(edge.to, 0);
                pending.push(edge);
            }
        }

        let mut nodes = Vec::with_capacity(node_ids.len());
        for (item, id) in node_ids.iter_mut() {
            *id = nodes.len();
            nodes.push(self.node(*item));
        }

        let edges = pending
            .into_iter()
            .map(|edge| {
                let length = edge.points.windows(2).map(|w| w[0].distance(w[1])).sum();
                let mid = polyline_midpoint(&edge.points);
                let inside_inverted = regions.inverted_regions().any(|r| r.contains_point(mid));
                VoronoiEdge {
                    from: node_ids[&edge.from],
                    to: node_ids[&edge.to],
                    sites: edge.sites,
                    curve: edge.curve,
                    points: edge.points,
                    length,
                    min_clearance: edge.min_clearance,
                    inside_inverted,
                    connector: false,
                }
            })
            .collect();
        (nodes, edges)
    }

    fn next_in_chain(&self, cur: Item, prev: Item) -> Option<Item> {
        self.adjacency
            .get(&cur)?
            .iter()
            .copied()
            .find(|&n| n != prev)
    }

    fn first_unvisited(&self, visited: &BTreeSet<(Item, Item)>) -> Option<(Item, Item)> {
        self.adjacency.iter().find_map(|(&a, nbrs)| {
            nbrs.iter()
                .copied()
                .find(|&b| !visited.contains(&key(a, b)))
                .map(|b| (a, b))
        })
    }

    fn walk(
        &self,
        start: Item,
        is_node: &BTreeSet<Item>,
        visited: &mut BTreeSet<(Item, Item)>,
        chains: &mut Vec<Vec<Item>>,
    ) {
        let Some(neighbors) = self.adjacency.get(&start) else {
            return;
        };
        for &next in neighbors {
            if !visited.insert(key(start, next)) {
                continue;
            }
            let mut chain = vec![start, next];
            let (mut prev, mut cur) = (start, next);
            while !is_node.contains(&cur) {
                let Some(n) = self.next_in_chain(cur, prev) else {
                    break;
                };
                if !visited.insert(key(cur, n)) {
                    break;
                }
                chain.push(n);
                prev = cur;
                cur = n;
            }
            chains.push(chain);
        }
    }

    /// Site pair shared by a chain.
    fn chain_pair(&self, chain: &[Item]) -> Option<Pair> {
        if let Some(pair) = chain.iter().find_map(|item| match item {
            Item::Crossing(c) => Some(self.crossings[*c].pair),
            Item::Vertex(_) => None,
        }) {
            return Some(pair);
        }

        // Direct vertex link: best-fitting shared pair
        let (Item::Vertex(a), Item::Vertex(b)) = (*chain.first()?, *chain.last()?) else {
            return None;
        };
        let (va, vb) = (&self.vertices[a], &self.vertices[b]);
        let shared: Vec<usize> = va.sites.intersection(&vb.sites).copied().collect();
        let mut best: Option<(f64, Pair)> = None;
        for (k, &s) in shared.iter().enumerate() {
            for &t in &shared[k + 1..] {
                if self.sites.is_secondary_pair(s, t) {
                    continue;
                }
                let (ss, st) = (self.site(s)?, self.site(t)?);
                let residual = [va.position, vb.position]
                    .iter()
                    .map(|&p| (ss.support_distance(p) - st.support_distance(p)).abs())
                    .sum::<f64>();
                if best.is_none_or(|(r, _)| residual < r) {
                    best = Some((residual, (s, t)));
                }
            }
        }
        best.map(|(_, pair)| pair)
    }

    fn chain_edge(&self, chain: &[Item]) -> Option<PendingEdge> {
        let (first, last) = (*chain.first()?, *chain.last()?);
        if first == last {
            return None;
        }
        let (p, q) = (self.position(first), self.position(last));
        if p.distance(q) <= self.config.eps {
            return None;
        }
        let pair = self.chain_pair(chain)?;
        let (sa, sb) = (self.site(pair.0)?, self.site(pair.1)?);
        let curve = EdgeCurve::between(sa, sb, p.lerp(q, 0.5), self.config.eps);
        let points = curve.polyline(p, q, self.config.parabola_step);
        let min_clearance = curve.min_clearance(sa, sb, p, q);
        trace!(
            "[Voronoi] Edge ({:.3}, {:.3}) -> ({:.3}, {:.3}) sites {:?} via {} crossings",
            p.x,
            p.y,
            q.x,
            q.y,
            pair,
            chain.len().saturating_sub(2)
        );
        Some(PendingEdge {
            from: first,
            to: last,
            sites: pair,
            curve,
            points,
            min_clearance,
        })
    }

    fn node(&self, item: Item) -> VoronoiNode {
        let position = self.position(item);
        let (sites, kind) = match item {
            Item::Vertex(v) => (
                self.vertices[v].sites.iter().copied().collect(),
                self.vertices[v].kind,
            ),
            Item::Crossing(c) => {
                let pair = self.crossings[c].pair;
                (vec![pair.0, pair.1], NodeKind::End)
            }
        };
        VoronoiNode {
            position,
            clearance: self.index.nearest_distance(position),
            sites,
            kind,
        }
    }
}

fn key(a: Item, b: Item) -> (Item, Item) {
    if a <= b { (a, b) } else { (b, a) }
}

fn centroid(points: impl Iterator<Item = Point2D>) -> Point2D {
    let (mut sum, mut n) = (Point2D::ZERO, 0usize);
    for p in points {
        sum = sum + p;
        n += 1;
    }
    if n == 0 { sum } else { sum * (1.0 / n as f64) }
}

/// Point halfway along a polyline.
pub(super) fn polyline_midpoint(points: &[Point2D]) -> Point2D {
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = total / 2.0;
    for w in points.windows(2) {
        let d = w[0].distance(w[1]);
        if d >= remaining && d > 0.0 {
            return w[0].lerp(w[1], remaining / d);
        }
        remaining -= d;
    }
    points.first().copied().unwrap_or(Point2D::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::ContourExtractor;
    use crate::core::{AngleMapping, AngleRange};
    use crate::grid::ConfigSpaceGrid;
    use crate::region::RegionSimplifier;
    use approx::assert_relative_eq;

    fn regions_for(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> RegionSet {
        let mapping = AngleMapping::new(
            AngleRange::new(0.0, width as f64, 1.0),
            AngleRange::new(0.0, height as f64, 1.0),
        )
        .unwrap();
        let grid =
            ConfigSpaceGrid::from_mask(mapping, OccupancyMask::from_fn(width, height, f)).unwrap();
        let contours = ContourExtractor::new().extract(&grid).unwrap();
        RegionSimplifier::default().simplify(&contours).unwrap()
    }

    #[test]
    fn test_free_rectangle_medial_axis() {
        env_logger::try_init().ok();
        let regions = regions_for(20, 10, |_, _| false);
        let graph = VoronoiBuilder::default().build(&regions).unwrap();

        assert!(!graph.is_empty());
        assert_eq!(graph.component_count(), 1);

        // Two exact vertices at (5, 5) and (15, 5) joined by the midline
        let vertices: Vec<&VoronoiNode> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Vertex)
            .collect();
        assert_eq!(vertices.len(), 2);
        for v in &vertices {
            assert_relative_eq!(v.position.y, 5.0, epsilon = 1e-6);
            assert_relative_eq!(v.clearance, 5.0, epsilon = 1e-6);
        }
        let midline = graph
            .edges()
            .iter()
            .find(|e| {
                graph.nodes()[e.from].kind == NodeKind::Vertex
                    && graph.nodes()[e.to].kind == NodeKind::Vertex
            })
            .unwrap();
        assert_relative_eq!(midline.length, 10.0, epsilon = 1e-6);
        assert_relative_eq!(midline.min_clearance, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_all_blocked_gives_empty_graph() {
        let regions = regions_for(6, 6, |_, _| true);
        let graph = VoronoiBuilder::default().build(&regions).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_obstacle_corner_produces_parabola() {
        let regions = regions_for(24, 24, |i, j| (8..16).contains(&i) && (8..16).contains(&j));
        let graph = VoronoiBuilder::default().build(&regions).unwrap();
        assert!(graph.edges().iter().any(|e| e.curve.is_parabola()));
        assert_eq!(graph.component_count(), 1);
        for node in graph.nodes() {
            assert_eq!(graph.mask().state_at(node.position), CellState::Free);
        }
    }

    #[test]
    fn test_safety_margin_prunes_narrow_gap() {
        // Two blocks leaving a one-cell gap in the middle column
        let f = |i: usize, j: usize| (6..14).contains(&j) && (i < 9 || i > 9);
        let regions = regions_for(19, 20, f);
        let open = VoronoiBuilder::default().build(&regions).unwrap();
        let strict = VoronoiBuilder::new(VoronoiConfig::default().with_safety_margin(1.0))
            .build(&regions)
            .unwrap();

        assert!(open.edges().iter().any(|e| e.min_clearance < 1.0));
        assert!(strict.edges().iter().all(|e| e.min_clearance >= 1.0));
        assert!(strict.edge_count() < open.edge_count());
        assert!(strict.component_count() > open.component_count());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let regions = regions_for(4, 4, |_, _| false);
        let builder = VoronoiBuilder::new(VoronoiConfig::default().with_subsamples(1));
        assert!(builder.build(&regions).is_err());
    }
}
