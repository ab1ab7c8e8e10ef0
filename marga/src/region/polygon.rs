//! Polygon helpers on open vertex loops (last vertex connects to the first).

use crate::core::Point2D;

/// Signed area (positive = counter-clockwise).
pub fn signed_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        twice += points[j].cross(points[i]);
        j = i;
    }
    twice / 2.0
}

/// Even-odd point in polygon test.
pub fn contains_point(points: &[Point2D], p: Point2D) -> bool {
    if points.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = points.len() - 1;

    for i in 0..points.len() {
        let pi = points[i];
        let pj = points[j];

        if ((pi.y > p.y) != (pj.y > p.y))
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Remove vertices lying on the chord of their neighbours.
///
/// With `tolerance == 0` only exactly collinear vertices go, which is what the
/// staircase-free contours of axis-aligned cells need. A positive tolerance
/// also drops vertices within that distance of the chord. The loop never
/// shrinks below three vertices.
pub fn simplify(points: &[Point2D], tolerance: f64) -> Vec<Point2D> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    // Start at a vertex that is certainly kept, so the wrap-around run merges.
    let start = (0..n)
        .max_by(|&a, &b| {
            chord_distance(points, a)
                .partial_cmp(&chord_distance(points, b))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.cmp(&a))
        })
        .unwrap_or(0);

    let mut kept: Vec<Point2D> = Vec::with_capacity(n);
    kept.push(points[start]);
    for k in 1..n {
        let cur = points[(start + k) % n];
        let next = points[(start + k + 1) % n];
        let prev = kept[kept.len() - 1];
        if deviation(prev, cur, next) > tolerance {
            kept.push(cur);
        }
    }

    if kept.len() < 3 {
        return points.to_vec();
    }
    kept
}

fn chord_distance(points: &[Point2D], i: usize) -> f64 {
    let n = points.len();
    deviation(points[(i + n - 1) % n], points[i], points[(i + 1) % n])
}

/// Distance of `cur` from the chord `prev`-`next`.
fn deviation(prev: Point2D, cur: Point2D, next: Point2D) -> f64 {
    let chord = next - prev;
    let len = chord.length();
    if len <= f64::EPSILON {
        return cur.distance(prev);
    }
    (chord.cross(cur - prev) / len).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(1.0, 2.0),
            Point2D::new(0.0, 2.0),
            Point2D::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_signed_area() {
        assert_relative_eq!(signed_area(&square()), 4.0);
        let mut cw = square();
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn test_contains_point() {
        let sq = square();
        assert!(contains_point(&sq, Point2D::new(1.0, 1.0)));
        assert!(!contains_point(&sq, Point2D::new(3.0, 1.0)));
    }

    #[test]
    fn test_collinear_merge() {
        let mut rotated = square();
        rotated.rotate_left(1); // start mid-edge
        let simplified = simplify(&rotated, 0.0);
        assert_eq!(simplified.len(), 4);
        assert_relative_eq!(signed_area(&simplified), 4.0);
    }

    #[test]
    fn test_tolerance_removes_staircase() {
        let stairs = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 1.0),
            Point2D::new(3.0, 1.0),
            Point2D::new(3.0, 2.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 3.0),
            Point2D::new(1.0, 3.0),
            Point2D::new(1.0, 4.0),
            Point2D::new(0.0, 4.0),
        ];
        let simplified = simplify(&stairs, 0.75);
        assert!(simplified.len() < stairs.len());
        assert!(simplified.len() >= 3);
        assert!((signed_area(&simplified) - signed_area(&stairs)).abs() < 4.0);
    }
}
