//! Cell-edge boundary following.
//!
//! Boundary edges run along cell sides between a blocked cell and a free
//! one (cells outside the grid are free). Each edge is directed so that the
//! blocked cell lies on its left:
//!
//! ```text
//!        <-- W --
//!      +---------+
//!      |         |
//!    S |  cell   | N
//!    | | blocked | ^
//!    v |         | |
//!      +---------+
//!        -- E -->
//! ```
//!
//! Every lattice vertex has at most two outgoing boundary edges; two only
//! happen at diagonal "checkerboard" corners, where the left turn is taken.
//! That keeps diagonal neighbours in separate contours and makes every
//! boundary edge belong to exactly one contour.

use crate::core::{GridCoord, OccupancyMask};

/// Edge direction on the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    East,
    North,
    West,
    South,
}

impl Dir {
    const ALL: [Dir; 4] = [Dir::East, Dir::North, Dir::West, Dir::South];

    #[inline]
    fn bit(self) -> u8 {
        match self {
            Dir::East => 1,
            Dir::North => 2,
            Dir::West => 4,
            Dir::South => 8,
        }
    }

    #[inline]
    fn offset(self) -> (i64, i64) {
        match self {
            Dir::East => (1, 0),
            Dir::North => (0, 1),
            Dir::West => (-1, 0),
            Dir::South => (0, -1),
        }
    }

    #[inline]
    fn left(self) -> Dir {
        match self {
            Dir::East => Dir::North,
            Dir::North => Dir::West,
            Dir::West => Dir::South,
            Dir::South => Dir::East,
        }
    }

    #[inline]
    fn right(self) -> Dir {
        match self {
            Dir::East => Dir::South,
            Dir::North => Dir::East,
            Dir::West => Dir::North,
            Dir::South => Dir::West,
        }
    }
}

/// Directed boundary edges indexed by their start vertex.
pub(crate) struct BoundaryEdges {
    stride: usize,
    outgoing: Vec<u8>,
    used: Vec<u8>,
    total: usize,
}

impl BoundaryEdges {
    /// Collect every blocked/free boundary edge of the mask.
    pub(crate) fn collect(mask: &OccupancyMask) -> Self {
        let stride = mask.width() + 1;
        let vertices = stride * (mask.height() + 1);
        let mut edges = Self {
            stride,
            outgoing: vec![0; vertices],
            used: vec![0; vertices],
            total: 0,
        };

        for j in 0..mask.height() as i64 {
            for i in 0..mask.width() as i64 {
                let cell = GridCoord::new(i, j);
                if !mask.is_blocked_or_free_outside(cell) {
                    continue;
                }
                let free = |x: i64, y: i64| !mask.is_blocked_or_free_outside(GridCoord::new(x, y));
                if free(i, j - 1) {
                    edges.add(GridCoord::new(i, j), Dir::East);
                }
                if free(i + 1, j) {
                    edges.add(GridCoord::new(i + 1, j), Dir::North);
                }
                if free(i, j + 1) {
                    edges.add(GridCoord::new(i + 1, j + 1), Dir::West);
                }
                if free(i - 1, j) {
                    edges.add(GridCoord::new(i, j + 1), Dir::South);
                }
            }
        }
        edges
    }

    #[inline]
    fn index(&self, v: GridCoord) -> usize {
        v.y as usize * self.stride + v.x as usize
    }

    fn add(&mut self, v: GridCoord, dir: Dir) {
        let idx = self.index(v);
        self.outgoing[idx] |= dir.bit();
        self.total += 1;
    }

    #[inline]
    fn has(&self, v: GridCoord, dir: Dir) -> bool {
        self.outgoing[self.index(v)] & dir.bit() != 0
    }

    #[inline]
    fn is_used(&self, v: GridCoord, dir: Dir) -> bool {
        self.used[self.index(v)] & dir.bit() != 0
    }

    #[inline]
    fn mark(&mut self, v: GridCoord, dir: Dir) {
        let idx = self.index(v);
        self.used[idx] |= dir.bit();
    }

    /// Total number of boundary edges.
    pub(crate) fn len(&self) -> usize {
        self.total
    }

    /// Next unused edge in lattice scan order (row-major by y), starting at
    /// vertex index `from`.
    pub(crate) fn next_unused(&self, from: usize) -> Option<(usize, GridCoord, Dir)> {
        (from..self.outgoing.len()).find_map(|idx| {
            let free = self.outgoing[idx] & !self.used[idx];
            if free == 0 {
                return None;
            }
            let v = GridCoord::new((idx % self.stride) as i64, (idx / self.stride) as i64);
            Dir::ALL
                .into_iter()
                .find(|d| free & d.bit() != 0)
                .map(|d| (idx, v, d))
        })
    }

    /// Follow edges from `(start, dir)` until the loop closes.
    ///
    /// Returns the closed vertex loop (first == last), or `None` if the walk
    /// runs into an already consumed edge or a dead end, which a consistent
    /// edge set never produces.
    pub(crate) fn trace(&mut self, start: GridCoord, dir: Dir) -> Option<Vec<GridCoord>> {
        let mut points = vec![start];
        let mut cur = start;
        let mut heading = dir;

        for _ in 0..=self.total {
            self.mark(cur, heading);
            let (dx, dy) = heading.offset();
            let next = GridCoord::new(cur.x + dx, cur.y + dy);
            points.push(next);

            let turn = [heading.left(), heading, heading.right()]
                .into_iter()
                .find(|d| self.has(next, *d))?;

            if next == start && turn == dir {
                return Some(points);
            }
            if self.is_used(next, turn) {
                return None;
            }
            cur = next;
            heading = turn;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_loop() {
        let mask = OccupancyMask::from_fn(3, 3, |i, j| i == 1 && j == 1);
        let mut edges = BoundaryEdges::collect(&mask);
        assert_eq!(edges.len(), 4);
        let (_, v, d) = edges.next_unused(0).unwrap();
        assert_eq!((v, d), (GridCoord::new(1, 1), Dir::East));
        let points = edges.trace(v, d).unwrap();
        assert_eq!(
            points,
            vec![
                GridCoord::new(1, 1),
                GridCoord::new(2, 1),
                GridCoord::new(2, 2),
                GridCoord::new(1, 2),
                GridCoord::new(1, 1),
            ]
        );
        assert!(edges.next_unused(0).is_none());
    }

    #[test]
    fn test_checkerboard_splits_diagonal_cells() {
        // blocked at (0,0) and (1,1): touching only at vertex (1,1)
        let mask = OccupancyMask::from_fn(2, 2, |i, j| i == j);
        let mut edges = BoundaryEdges::collect(&mask);
        assert_eq!(edges.len(), 8);
        let mut loops = Vec::new();
        while let Some((_, v, d)) = edges.next_unused(0) {
            loops.push(edges.trace(v, d).unwrap());
        }
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.len() == 5));
    }
}
