//! Path post-processing.

use super::{Path, SubdividedPath, angle_distance};

/// Insert evenly spaced vertices into every segment longer than `max_length`.
///
/// Original vertices are kept unchanged and a segment of length `len` gets
/// `ceil(len / max_length) - 1` new vertices. A non-positive or non-finite
/// `max_length` leaves the path as it is.
pub fn subdivide(path: &Path, max_length: f64) -> SubdividedPath {
    if !(max_length > 0.0 && max_length.is_finite()) || path.vertices.len() < 2 {
        return SubdividedPath {
            path: path.clone(),
            max_segment_length: max_length,
        };
    }

    let mut vertices = Vec::with_capacity(path.vertices.len());
    for w in path.vertices.windows(2) {
        let (a, b) = (w[0], w[1]);
        vertices.push(a);
        let len = angle_distance(a, b);
        if len <= max_length {
            continue;
        }
        let pieces = (len / max_length).ceil() as usize;
        for k in 1..pieces {
            let t = k as f64 / pieces as f64;
            vertices.push([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]);
        }
    }
    if let Some(&last) = path.vertices.last() {
        vertices.push(last);
    }

    SubdividedPath {
        path: Path {
            vertices,
            ..path.clone()
        },
        max_segment_length: max_length,
    }
}

/// Drop interior vertices closer than `min_distance` to the last kept vertex.
///
/// The first and last vertex always survive.
pub fn remove_close_vertices(path: &Path, min_distance: f64) -> Path {
    let n = path.vertices.len();
    if n < 3 || !(min_distance > 0.0) {
        return path.clone();
    }

    let mut vertices = vec![path.vertices[0]];
    for &v in &path.vertices[1..n - 1] {
        if vertices
            .last()
            .is_some_and(|&kept| angle_distance(kept, v) >= min_distance)
        {
            vertices.push(v);
        }
    }
    vertices.push(path.vertices[n - 1]);

    Path {
        vertices,
        ..path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathStatus;

    fn path(vertices: Vec<[f64; 2]>) -> Path {
        Path::new(PathStatus::Found, vertices)
    }

    #[test]
    fn test_subdivide_long_segment() {
        let p = path(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.25]]);
        let s = subdivide(&p, 0.3);
        // 1.0 / 0.3 -> 4 pieces, 3 new vertices; the short segment is kept
        assert_eq!(s.path.vertices.len(), 6);
        assert_eq!(s.path.vertices[0], [0.0, 0.0]);
        assert_eq!(s.path.vertices[4], [1.0, 0.0]);
        assert_eq!(s.path.vertices[5], [1.0, 0.25]);
        for w in s.path.vertices.windows(2) {
            assert!(angle_distance(w[0], w[1]) <= 0.3 + 1e-12);
        }
        assert!(s.path.ok);
    }

    #[test]
    fn test_subdivide_disabled() {
        let p = path(vec![[0.0, 0.0], [5.0, 0.0]]);
        assert_eq!(subdivide(&p, 0.0).path, p);
        assert_eq!(subdivide(&p, f64::NAN).path, p);
        assert_eq!(subdivide(&p, -1.0).path, p);
    }

    #[test]
    fn test_remove_close_vertices_keeps_ends() {
        let p = path(vec![[0.0, 0.0], [0.05, 0.0], [0.5, 0.0], [0.52, 0.0]]);
        let r = remove_close_vertices(&p, 0.1);
        assert_eq!(r.vertices, vec![[0.0, 0.0], [0.5, 0.0], [0.52, 0.0]]);
    }
}
