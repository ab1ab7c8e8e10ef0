//! Geometry of Voronoi edges.
//!
//! Between two sites the equidistant locus is either a straight line
//! (point/point, segment/segment, or a point lying on a segment's line) or a
//! parabola (point/segment). Each variant carries only its own parameters.

use serde::{Deserialize, Serialize};

use super::site::{Site, SiteKind, line_distance};
use crate::core::{Point2D, Segment, point_segment_distance};

/// Bisector curve of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeCurve {
    /// Straight bisector through `origin` along unit `direction`.
    Line { origin: Point2D, direction: Point2D },
    /// Parabola with the given focus and directrix.
    ///
    /// With `u = directrix_dir` and `n = normal` (pointing at the focus), the
    /// curve is `X(t) = directrix_origin + t·u + h(t)·n` where
    /// `h(t) = ((t - t_focus)² + q²) / (2q)` is the clearance at `X(t)`.
    Parabola {
        focus: Point2D,
        directrix_origin: Point2D,
        directrix_dir: Point2D,
        normal: Point2D,
        t_focus: f64,
        q: f64,
    },
}

impl EdgeCurve {
    /// Bisector of sites `a` and `b`.
    ///
    /// `reference` picks the relevant branch when two segment lines cross
    /// (the bisector closest to it is used).
    pub fn between(a: &Site, b: &Site, reference: Point2D, eps: f64) -> EdgeCurve {
        match (a.kind, b.kind) {
            (SiteKind::Point(p), SiteKind::Point(q)) => point_bisector(p, q),
            (SiteKind::Point(f), SiteKind::Segment { segment, .. })
            | (SiteKind::Segment { segment, .. }, SiteKind::Point(f)) => {
                focus_directrix(f, &segment, eps)
            }
            (SiteKind::Segment { segment: s1, .. }, SiteKind::Segment { segment: s2, .. }) => {
                segment_bisector(&s1, &s2, reference, eps)
            }
        }
    }

    pub fn is_parabola(&self) -> bool {
        matches!(self, EdgeCurve::Parabola { .. })
    }

    /// Point on the parabola at directrix parameter `t`.
    fn parabola_at(&self, t: f64) -> Option<Point2D> {
        match *self {
            EdgeCurve::Parabola {
                directrix_origin,
                directrix_dir,
                normal,
                t_focus,
                q,
                ..
            } => {
                let h = ((t - t_focus).powi(2) + q * q) / (2.0 * q);
                Some(directrix_origin + directrix_dir * t + normal * h)
            }
            EdgeCurve::Line { .. } => None,
        }
    }

    /// Directrix parameter of `p`.
    fn parameter(&self, p: Point2D) -> f64 {
        match *self {
            EdgeCurve::Parabola {
                directrix_origin,
                directrix_dir,
                ..
            } => (p - directrix_origin).dot(directrix_dir),
            EdgeCurve::Line { origin, direction } => (p - origin).dot(direction),
        }
    }

    /// Polyline from `p` to `q` following the curve.
    ///
    /// Straight edges are the chord itself; parabolas are sampled every
    /// `step` along the directrix. The end points are `p` and `q` exactly.
    pub fn polyline(&self, p: Point2D, q: Point2D, step: f64) -> Vec<Point2D> {
        if !self.is_parabola() || !(step > 0.0) {
            return vec![p, q];
        }
        let (tp, tq) = (self.parameter(p), self.parameter(q));
        let n = ((tq - tp).abs() / step).ceil().max(1.0) as usize;
        let mut points = Vec::with_capacity(n + 1);
        points.push(p);
        for k in 1..n {
            let t = tp + (tq - tp) * k as f64 / n as f64;
            if let Some(x) = self.parabola_at(t) {
                points.push(x);
            }
        }
        points.push(q);
        points
    }

    /// Smallest distance to the generating sites along the edge from `p` to `q`.
    pub fn min_clearance(&self, a: &Site, b: &Site, p: Point2D, q: Point2D) -> f64 {
        match *self {
            EdgeCurve::Parabola { t_focus, q: depth, .. } => {
                let (tp, tq) = (self.parameter(p), self.parameter(q));
                if t_focus >= tp.min(tq) && t_focus <= tp.max(tq) {
                    depth / 2.0
                } else {
                    let h = |t: f64| ((t - t_focus).powi(2) + depth * depth) / (2.0 * depth);
                    h(tp).min(h(tq))
                }
            }
            EdgeCurve::Line { .. } => match (a.kind, b.kind) {
                (SiteKind::Point(f), _) | (_, SiteKind::Point(f)) => point_segment_distance(f, p, q),
                (SiteKind::Segment { segment, .. }, SiteKind::Segment { .. }) => {
                    line_distance(&segment, p).min(line_distance(&segment, q))
                }
            },
        }
    }
}

fn point_bisector(p: Point2D, q: Point2D) -> EdgeCurve {
    let direction = (q - p).perp().normalized().unwrap_or(Point2D::new(1.0, 0.0));
    EdgeCurve::Line {
        origin: p.lerp(q, 0.5),
        direction,
    }
}

fn focus_directrix(focus: Point2D, segment: &Segment, eps: f64) -> EdgeCurve {
    let Some(u) = segment.delta().normalized() else {
        return point_bisector(focus, segment.start);
    };
    let origin = segment.start;
    let offset = (focus - origin).dot(u.perp());
    if offset.abs() <= eps {
        // Focus on the directrix line: the locus is the normal through it
        return EdgeCurve::Line {
            origin: focus,
            direction: u.perp(),
        };
    }
    let normal = if offset > 0.0 { u.perp() } else { -u.perp() };
    EdgeCurve::Parabola {
        focus,
        directrix_origin: origin,
        directrix_dir: u,
        normal,
        t_focus: (focus - origin).dot(u),
        q: offset.abs(),
    }
}

fn segment_bisector(s1: &Segment, s2: &Segment, reference: Point2D, eps: f64) -> EdgeCurve {
    let (Some(u1), Some(u2)) = (s1.delta().normalized(), s2.delta().normalized()) else {
        return point_bisector(s1.midpoint(), s2.midpoint());
    };
    let denom = u1.cross(u2);
    if denom.abs() <= eps {
        // Parallel: midline between the two supporting lines
        let foot = s2.start + u2 * (s1.start - s2.start).dot(u2);
        return EdgeCurve::Line {
            origin: s1.start.lerp(foot, 0.5),
            direction: u1,
        };
    }
    // Intersection of the supporting lines
    let t = (s2.start - s1.start).cross(u2) / denom;
    let x = s1.start + u1 * t;

    let candidates = [(u1 + u2).normalized(), (u1 - u2).normalized()];
    let direction = candidates
        .into_iter()
        .flatten()
        .min_by(|a, b| {
            let da = a.cross(reference - x).abs();
            let db = b.cross(reference - x).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(u1.perp());
    EdgeCurve::Line {
        origin: x,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voronoi::site::SiteSource;
    use approx::assert_relative_eq;

    fn point(x: f64, y: f64) -> Site {
        Site {
            kind: SiteKind::Point(Point2D::new(x, y)),
            source: SiteSource::Endpoint,
        }
    }

    fn segment(a: (f64, f64), b: (f64, f64)) -> Site {
        Site {
            kind: SiteKind::Segment {
                segment: Segment::new(Point2D::new(a.0, a.1), Point2D::new(b.0, b.1)),
                start: 0,
                end: 1,
            },
            source: SiteSource::Frame,
        }
    }

    #[test]
    fn test_parabola_points_are_equidistant() {
        let f = point(2.0, 2.0);
        let s = segment((0.0, 0.0), (6.0, 0.0));
        let curve = EdgeCurve::between(&f, &s, Point2D::new(2.0, 1.0), 1e-9);
        assert!(curve.is_parabola());

        // Endpoints on the parabola: h(t) = ((t - 2)^2 + 4) / 4
        let p = Point2D::new(0.5, (2.25 + 4.0) / 4.0);
        let q = Point2D::new(4.0, 2.0);
        let poly = curve.polyline(p, q, 0.5);
        assert_eq!(poly.first(), Some(&p));
        assert_eq!(poly.last(), Some(&q));
        assert_eq!(poly.len(), 8);
        for x in &poly {
            assert_relative_eq!(f.support_distance(*x), s.support_distance(*x), epsilon = 1e-9);
        }
        // Apex lies between the ends
        assert_relative_eq!(curve.min_clearance(&f, &s, p, q), 1.0);
    }

    #[test]
    fn test_parabola_clearance_without_apex() {
        let f = point(2.0, 2.0);
        let s = segment((0.0, 0.0), (6.0, 0.0));
        let curve = EdgeCurve::between(&f, &s, Point2D::new(5.0, 2.0), 1e-9);
        let p = Point2D::new(4.0, 2.0);
        let q = Point2D::new(6.0, 5.0);
        assert_relative_eq!(curve.min_clearance(&f, &s, p, q), 2.0);
    }

    #[test]
    fn test_focus_on_directrix_degenerates_to_line() {
        let f = point(6.0, 0.0);
        let s = segment((0.0, 0.0), (6.0, 0.0));
        let curve = EdgeCurve::between(&f, &s, Point2D::new(6.0, 1.0), 1e-9);
        match curve {
            EdgeCurve::Line { origin, direction } => {
                assert_eq!(origin, Point2D::new(6.0, 0.0));
                assert_relative_eq!(direction.x.abs(), 0.0);
            }
            EdgeCurve::Parabola { .. } => panic!("expected a line"),
        }
    }

    #[test]
    fn test_crossing_segments_pick_branch_near_reference() {
        let a = segment((0.0, 0.0), (4.0, 0.0));
        let b = segment((0.0, 0.0), (0.0, 4.0));
        let curve = EdgeCurve::between(&a, &b, Point2D::new(2.0, 2.1), 1e-9);
        match curve {
            EdgeCurve::Line { direction, .. } => {
                assert_relative_eq!(direction.x.abs(), direction.y.abs(), epsilon = 1e-12);
                assert!(direction.x * direction.y > 0.0);
            }
            EdgeCurve::Parabola { .. } => panic!("expected a line"),
        }
        let clearance =
            curve.min_clearance(&a, &b, Point2D::new(1.0, 1.0), Point2D::new(3.0, 3.0));
        assert_relative_eq!(clearance, 1.0);
    }

    #[test]
    fn test_parallel_segments_midline() {
        let a = segment((0.0, 0.0), (4.0, 0.0));
        let b = segment((4.0, 2.0), (0.0, 2.0));
        let curve = EdgeCurve::between(&a, &b, Point2D::new(2.0, 1.0), 1e-9);
        match curve {
            EdgeCurve::Line { origin, .. } => assert_relative_eq!(origin.y, 1.0),
            EdgeCurve::Parabola { .. } => panic!("expected a line"),
        }
        let p = Point2D::new(0.5, 1.0);
        let q = Point2D::new(3.5, 1.0);
        assert_eq!(curve.polyline(p, q, 0.5), vec![p, q]);
    }
}
