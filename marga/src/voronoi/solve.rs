//! Voronoi vertex solver.
//!
//! A vertex is the centre `(x, y)` of a circle of radius `r` touching every
//! participating site. Point sites contribute `|X - P| - r = 0`, segment
//! sites `s·dist_line(X) - r = 0`, with the side `s` fixed at the initial
//! guess so that the residual stays smooth across the line.
//!
//! A segment meeting one of its own endpoints at a vertex touches the circle
//! in that endpoint, which makes the two distance equations tangent. Such a
//! segment is replaced by the perpendicular through the endpoint.
//!
//! The system is solved with Gauss-Newton on the normal equations; with three
//! equations this is plain Newton.

use super::site::{Site, SiteKind};
use crate::core::{Point2D, Segment};

const MAX_ITERATIONS: usize = 50;
const CONVERGED: f64 = 1e-13;

/// Solved vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexSolution {
    pub position: Point2D,
    pub radius: f64,
}

/// One equation of the vertex system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constraint {
    /// Distance to a point equals the radius
    Point(Point2D),
    /// Signed distance to a line equals the radius
    Line { origin: Point2D, normal: Point2D },
    /// Centre lies on the line through `through` normal to `direction`
    Perpendicular { through: Point2D, direction: Point2D },
}

impl Constraint {
    /// Distance equation of a site, oriented towards `guess`.
    pub fn from_site(site: &Site, guess: Point2D) -> Option<Self> {
        match site.kind {
            SiteKind::Point(p) => Some(Constraint::Point(p)),
            SiteKind::Segment { segment, .. } => {
                let n = segment.delta().perp().normalized()?;
                let side = (guess - segment.start).dot(n);
                Some(Constraint::Line {
                    origin: segment.start,
                    normal: if side < 0.0 { -n } else { n },
                })
            }
        }
    }

    /// Perpendicular to `segment` through its endpoint `endpoint`.
    pub fn perpendicular(segment: &Segment, endpoint: Point2D) -> Option<Self> {
        Some(Constraint::Perpendicular {
            through: endpoint,
            direction: segment.delta().normalized()?,
        })
    }

    /// Residual and Jacobian row `(d/dx, d/dy, d/dr)` at `(x, r)`.
    fn eval(&self, x: Point2D, r: f64) -> Option<(f64, [f64; 3])> {
        match *self {
            Constraint::Point(p) => {
                let d = x.distance(p);
                if d <= f64::EPSILON {
                    return None;
                }
                Some((d - r, [(x.x - p.x) / d, (x.y - p.y) / d, -1.0]))
            }
            Constraint::Line { origin, normal } => {
                Some(((x - origin).dot(normal) - r, [normal.x, normal.y, -1.0]))
            }
            Constraint::Perpendicular { through, direction } => {
                Some(((x - through).dot(direction), [direction.x, direction.y, 0.0]))
            }
        }
    }

    /// Distance from `x`, if this is a distance equation.
    fn distance(&self, x: Point2D) -> Option<f64> {
        match *self {
            Constraint::Point(p) => Some(x.distance(p)),
            Constraint::Line { origin, normal } => Some((x - origin).dot(normal)),
            Constraint::Perpendicular { .. } => None,
        }
    }
}

/// Equations for a set of sites, tangent segment/endpoint pairs resolved.
pub fn constraints_for(sites: &[(usize, &Site)], guess: Point2D) -> Option<Vec<Constraint>> {
    let endpoint_of = |id: usize| {
        sites.iter().find_map(|(sid, s)| match s.kind {
            SiteKind::Point(p) if *sid == id => Some(p),
            _ => None,
        })
    };
    sites
        .iter()
        .map(|(_, site)| match site.kind {
            SiteKind::Segment {
                segment,
                start,
                end,
            } => match endpoint_of(start).or_else(|| endpoint_of(end)) {
                Some(p) => Constraint::perpendicular(&segment, p),
                None => Constraint::from_site(site, guess),
            },
            SiteKind::Point(_) => Constraint::from_site(site, guess),
        })
        .collect()
}

/// Solve for the circle centre satisfying `constraints`, starting at `guess`.
///
/// Returns `None` when fewer than three equations are given, the iteration
/// is singular, or it leaves finite numbers.
pub fn solve(constraints: &[Constraint], guess: Point2D) -> Option<VertexSolution> {
    if constraints.len() < 3 {
        return None;
    }
    let distances: Vec<f64> = constraints.iter().filter_map(|c| c.distance(guess)).collect();
    if distances.is_empty() {
        return None;
    }

    let mut x = guess;
    let mut r = distances.iter().sum::<f64>() / distances.len() as f64;

    for _ in 0..MAX_ITERATIONS {
        // Normal equations J^T J d = -J^T f
        let mut jtj = [[0.0; 3]; 3];
        let mut jtf = [0.0; 3];
        for c in constraints {
            let (f, row) = c.eval(x, r)?;
            for a in 0..3 {
                jtf[a] += row[a] * f;
                for b in 0..3 {
                    jtj[a][b] += row[a] * row[b];
                }
            }
        }
        let step = solve3(jtj, [-jtf[0], -jtf[1], -jtf[2]])?;
        x = Point2D::new(x.x + step[0], x.y + step[1]);
        r += step[2];
        if !(x.is_finite() && r.is_finite()) {
            return None;
        }
        if step.iter().map(|s| s * s).sum::<f64>() < CONVERGED * CONVERGED {
            break;
        }
    }

    Some(VertexSolution {
        position: x,
        radius: r,
    })
}

/// Cramer's rule for a 3x3 system.
fn solve3(m: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let det = |m: &[[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let d = det(&m);
    if d.abs() < 1e-14 {
        return None;
    }
    let mut out = [0.0; 3];
    for (col, value) in out.iter_mut().enumerate() {
        let mut mc = m;
        for row in 0..3 {
            mc[row][col] = b[row];
        }
        *value = det(&mc) / d;
    }
    Some(out)
}
