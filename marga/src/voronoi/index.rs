//! Spatial index over Voronoi sites.
//!
//! Uses an R-tree so that nearest-site queries during sampling stay
//! logarithmic in the number of sites.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::site::{Site, SiteKind, SiteSet};
use crate::core::Point2D;

/// Distances closer than this count as an exact tie.
const TIE: f64 = 1e-12;

/// A site stored in the R-tree.
#[derive(Clone, Debug)]
pub struct IndexedSite {
    pub site: Site,
    /// Site id in the [`SiteSet`].
    pub id: usize,
}

impl RTreeObject for IndexedSite {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        match self.site.kind {
            SiteKind::Point(p) => AABB::from_point(p.to_array()),
            SiteKind::Segment { segment, .. } => {
                let (a, b) = (segment.start, segment.end);
                AABB::from_corners([a.x.min(b.x), a.y.min(b.y)], [a.x.max(b.x), a.y.max(b.y)])
            }
        }
    }
}

impl PointDistance for IndexedSite {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d = self.site.distance(Point2D::from(*point));
        d * d
    }

    fn contains_point(&self, _point: &[f64; 2]) -> bool {
        false
    }
}

/// R-tree over all sites of a diagram.
#[derive(Clone)]
pub struct SiteIndex {
    tree: RTree<IndexedSite>,
}

impl SiteIndex {
    pub fn new(sites: &SiteSet) -> Self {
        let indexed: Vec<IndexedSite> = sites
            .sites()
            .iter()
            .enumerate()
            .map(|(id, site)| IndexedSite { site: *site, id })
            .collect();
        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest site to `p` as `(id, distance)`.
    ///
    /// Exact ties go to the lowest id, so labels do not depend on tree layout.
    pub fn nearest(&self, p: Point2D) -> Option<(usize, f64)> {
        self.nearest_within(p, TIE)
            .into_iter()
            .min_by_key(|(id, _)| *id)
    }

    /// Distance to the nearest site, `INFINITY` if there is none.
    pub fn nearest_distance(&self, p: Point2D) -> f64 {
        self.tree
            .nearest_neighbor_iter(&p.to_array())
            .next()
            .map(|s| s.site.distance(p))
            .unwrap_or(f64::INFINITY)
    }

    /// All sites whose distance is within `eps` of the minimum, sorted by distance.
    pub fn nearest_within(&self, p: Point2D, eps: f64) -> Vec<(usize, f64)> {
        let mut found = Vec::new();
        let mut best = f64::INFINITY;
        for indexed in self.tree.nearest_neighbor_iter(&p.to_array()) {
            let d = indexed.site.distance(p);
            if !d.is_finite() {
                break;
            }
            if found.is_empty() {
                best = d;
            } else if d > best + eps {
                break;
            }
            found.push((indexed.id, d));
        }
        found
    }
}
