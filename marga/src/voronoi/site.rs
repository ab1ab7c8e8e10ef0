//! Voronoi sites: obstacle segments and their endpoints.
//!
//! The free region is bounded by region segments and by the grid frame. The
//! frame contributes the outward edges of free border cells, so border pieces
//! of obstacle outlines (which never face free space) are left out.
//!
//! Site ids are stable: point sites first in lattice order, then region
//! segments in region order, then frame segments.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::core::{GridCoord, OccupancyMask, Point2D, Segment};
use crate::error::{PlannerError, Result, Stage};
use crate::region::RegionSet;

/// Projection slack at segment ends (relative to the segment length).
const SLAB_TOLERANCE: f64 = 1e-9;

/// Geometry of one site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SiteKind {
    /// Segment endpoint
    Point(Point2D),
    /// Open segment; `start`/`end` are the ids of its endpoint sites.
    Segment {
        segment: Segment,
        start: usize,
        end: usize,
    },
}

/// Where a site comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteSource {
    /// Segment of region `index`
    Region(usize),
    /// Grid frame along free border cells
    Frame,
    /// Endpoint shared by one or more segments
    Endpoint,
}

/// A Voronoi generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    pub kind: SiteKind,
    pub source: SiteSource,
}

impl Site {
    /// True distance from `p`.
    ///
    /// Segment sites only own their perpendicular slab: outside it the
    /// distance is infinite and the endpoint sites take over. On the slab
    /// boundary both agree.
    pub fn distance(&self, p: Point2D) -> f64 {
        match self.kind {
            SiteKind::Point(q) => p.distance(q),
            SiteKind::Segment { segment, .. } => {
                let t = segment.project(p);
                if (-SLAB_TOLERANCE..=1.0 + SLAB_TOLERANCE).contains(&t) {
                    line_distance(&segment, p)
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Distance to the supporting geometry (point, or infinite line).
    ///
    /// Continuous everywhere, which bisection needs.
    pub fn support_distance(&self, p: Point2D) -> f64 {
        match self.kind {
            SiteKind::Point(q) => p.distance(q),
            SiteKind::Segment { segment, .. } => line_distance(&segment, p),
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self.kind, SiteKind::Point(_))
    }
}

/// Perpendicular distance from `p` to the line through `segment`.
pub fn line_distance(segment: &Segment, p: Point2D) -> f64 {
    let d = segment.delta();
    let len = d.length();
    if len <= f64::EPSILON {
        return p.distance(segment.start);
    }
    (d.cross(p - segment.start) / len).abs()
}

/// Deduplicated site list.
#[derive(Clone, Debug, Default)]
pub struct SiteSet {
    sites: Vec<Site>,
    point_count: usize,
}

impl SiteSet {
    /// Collect sites from the regions and the free part of the grid frame.
    pub fn collect(regions: &RegionSet, eps: f64) -> Result<Self> {
        let width = regions.mapping.width as f64;
        let height = regions.mapping.height as f64;
        let on_border = |s: &Segment| {
            (s.start.x == 0.0 && s.end.x == 0.0)
                || (s.start.y == 0.0 && s.end.y == 0.0)
                || (s.start.x == width && s.end.x == width)
                || (s.start.y == height && s.end.y == height)
        };

        let mut raw: Vec<(Segment, SiteSource)> = Vec::new();
        for (idx, region) in regions.regions.iter().enumerate() {
            raw.extend(
                region
                    .segments()
                    .filter(|s| !on_border(s))
                    .map(|s| (s, SiteSource::Region(idx))),
            );
        }
        raw.extend(
            frame_segments(&regions.mask)
                .into_iter()
                .map(|s| (s, SiteSource::Frame)),
        );

        Self::from_segments(raw, eps)
    }

    /// Build sites from raw segments, dropping degenerate and duplicate ones.
    pub fn from_segments(raw: Vec<(Segment, SiteSource)>, eps: f64) -> Result<Self> {
        let key = |p: Point2D| ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64);

        // Endpoint sites in lattice order
        let mut endpoints: BTreeMap<(i64, i64), Point2D> = BTreeMap::new();
        for (s, _) in &raw {
            if s.length() > eps {
                endpoints.entry(key(s.start)).or_insert(s.start);
                endpoints.entry(key(s.end)).or_insert(s.end);
            }
        }
        let ids: BTreeMap<(i64, i64), usize> = endpoints
            .keys()
            .enumerate()
            .map(|(id, k)| (*k, id))
            .collect();

        let mut sites: Vec<Site> = endpoints
            .values()
            .map(|p| Site {
                kind: SiteKind::Point(*p),
                source: SiteSource::Endpoint,
            })
            .collect();
        let point_count = sites.len();

        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut dropped = 0usize;
        for (segment, source) in raw {
            if segment.length() <= eps {
                dropped += 1;
                continue;
            }
            let (Some(&start), Some(&end)) = (ids.get(&key(segment.start)), ids.get(&key(segment.end)))
            else {
                dropped += 1;
                continue;
            };
            if start == end || !seen.insert((start.min(end), start.max(end))) {
                dropped += 1;
                continue;
            }
            sites.push(Site {
                kind: SiteKind::Segment {
                    segment,
                    start,
                    end,
                },
                source,
            });
        }

        let set = Self { sites, point_count };
        set.check_coincident(eps)?;
        debug!(
            "[Voronoi] Sites: {} points, {} segments ({} degenerate or duplicate dropped)",
            set.point_count,
            set.sites.len() - set.point_count,
            dropped
        );
        Ok(set)
    }

    /// Point sites closer than `eps` survived deduplication.
    fn check_coincident(&self, eps: f64) -> Result<()> {
        let mut points: Vec<(Point2D, usize)> = self
            .sites
            .iter()
            .enumerate()
            .filter_map(|(id, s)| match s.kind {
                SiteKind::Point(p) => Some((p, id)),
                SiteKind::Segment { .. } => None,
            })
            .collect();
        points.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
        for (k, (p, id)) in points.iter().enumerate() {
            for (q, other) in points[k + 1..].iter() {
                if q.x - p.x > eps {
                    break;
                }
                if p.distance(*q) <= eps {
                    return Err(PlannerError::geometry(
                        Stage::Voronoi,
                        format!("point sites {} and {} coincide at ({}, {})", id, other, p.x, p.y),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn get(&self, id: usize) -> Option<&Site> {
        self.sites.get(id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// A segment and one of its own endpoints.
    ///
    /// Their bisector is the perpendicular at the endpoint, which separates
    /// two cells of the same obstacle and is no travel corridor.
    pub fn is_secondary_pair(&self, a: usize, b: usize) -> bool {
        let owns = |seg: usize, pt: usize| match self.sites.get(seg).map(|s| s.kind) {
            Some(SiteKind::Segment { start, end, .. }) => start == pt || end == pt,
            _ => false,
        };
        owns(a, b) || owns(b, a)
    }
}

/// Outward edges of free border cells, merged into maximal runs.
pub fn frame_segments(mask: &OccupancyMask) -> Vec<Segment> {
    let (w, h) = (mask.width() as i64, mask.height() as i64);
    let mut segments = Vec::new();

    // (cell of edge k, edge start, edge end) along each border side
    let sides: [Box<dyn Fn(i64) -> (GridCoord, Point2D, Point2D)>; 4] = [
        Box::new(|i| {
            (GridCoord::new(i, 0), Point2D::new(i as f64, 0.0), Point2D::new((i + 1) as f64, 0.0))
        }),
        Box::new(move |j| {
            (
                GridCoord::new(w - 1, j),
                Point2D::new(w as f64, j as f64),
                Point2D::new(w as f64, (j + 1) as f64),
            )
        }),
        Box::new(move |i| {
            (
                GridCoord::new(i, h - 1),
                Point2D::new(i as f64, h as f64),
                Point2D::new((i + 1) as f64, h as f64),
            )
        }),
        Box::new(|j| {
            (GridCoord::new(0, j), Point2D::new(0.0, j as f64), Point2D::new(0.0, (j + 1) as f64))
        }),
    ];
    let lengths = [w, h, w, h];

    for (side, len) in sides.iter().zip(lengths) {
        let mut run: Option<(Point2D, Point2D)> = None;
        for k in 0..len {
            let (cell, a, b) = side(k);
            if mask.is_free(cell) {
                run = Some(match run {
                    Some((start, _)) => (start, b),
                    None => (a, b),
                });
            } else if let Some((start, end)) = run.take() {
                segments.push(Segment::new(start, end));
            }
        }
        if let Some((start, end)) = run {
            segments.push(Segment::new(start, end));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_of_free_grid() {
        let mask = OccupancyMask::from_fn(4, 3, |_, _| false);
        let frame = frame_segments(&mask);
        assert_eq!(frame.len(), 4);
        let total: f64 = frame.iter().map(Segment::length).sum();
        assert_eq!(total, 14.0);
    }

    #[test]
    fn test_frame_skips_blocked_border_cells() {
        // column 1 blocked on the bottom row only
        let mask = OccupancyMask::from_fn(4, 3, |i, j| i == 1 && j == 0);
        let frame = frame_segments(&mask);
        let bottom: Vec<&Segment> = frame
            .iter()
            .filter(|s| s.start.y == 0.0 && s.end.y == 0.0)
            .collect();
        assert_eq!(bottom.len(), 2);
        assert_eq!(bottom[0].end, Point2D::new(1.0, 0.0));
        assert_eq!(bottom[1].start, Point2D::new(2.0, 0.0));
    }

    #[test]
    fn test_dedup_and_secondary_pairs() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(2.0, 0.0);
        let c = Point2D::new(2.0, 2.0);
        let raw = vec![
            (Segment::new(a, b), SiteSource::Frame),
            (Segment::new(b, a), SiteSource::Frame),
            (Segment::new(b, c), SiteSource::Region(0)),
            (Segment::new(c, c), SiteSource::Region(0)),
        ];
        let set = SiteSet::from_segments(raw, 1e-6).unwrap();
        assert_eq!(set.point_count(), 3);
        assert_eq!(set.len(), 5);
        // segment a-b is site 3 with endpoints 0 and 1
        assert!(set.is_secondary_pair(3, 0));
        assert!(set.is_secondary_pair(1, 3));
        assert!(!set.is_secondary_pair(3, 2));
        assert!(!set.is_secondary_pair(0, 1));
    }

    #[test]
    fn test_near_coincident_points_rejected() {
        let raw = vec![
            (Segment::new(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)), SiteSource::Frame),
            (
                Segment::new(Point2D::new(1.0 + 1e-7, 0.0), Point2D::new(1.0, 1.0)),
                SiteSource::Frame,
            ),
        ];
        assert!(SiteSet::from_segments(raw, 1e-6).is_err());
    }

    #[test]
    fn test_open_segment_distance() {
        let set = SiteSet::from_segments(
            vec![(Segment::new(Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0)), SiteSource::Frame)],
            1e-6,
        )
        .unwrap();
        let seg = set.get(2).unwrap();
        assert_eq!(seg.distance(Point2D::new(1.0, 3.0)), 3.0);
        assert!(seg.distance(Point2D::new(5.0, 3.0)).is_infinite());
        assert_eq!(seg.support_distance(Point2D::new(5.0, 3.0)), 3.0);
    }
}
