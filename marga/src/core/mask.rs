//! Occupancy mask shared read-only by every pipeline stage.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::point::{GridCoord, Point2D};

/// Collision state of a configuration-space cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Free,
    Blocked,
}

impl CellState {
    #[inline]
    pub fn is_blocked(self) -> bool {
        self == CellState::Blocked
    }
}

/// Dense width x height cell states, row-major by axis 2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyMask {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl OccupancyMask {
    /// Create a mask with every cell set to `fill`.
    pub fn filled(width: usize, height: usize, fill: CellState) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` if the buffer length does not match the extent.
    pub fn from_cells(width: usize, height: usize, cells: Vec<CellState>) -> Option<Self> {
        (cells.len() == width * height).then_some(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a mask from a predicate over cell indices.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                cells.push(if f(i, j) {
                    CellState::Blocked
                } else {
                    CellState::Free
                });
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Cell state; `None` outside the extent.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<CellState> {
        if i < self.width && j < self.height {
            Some(self.cells[j * self.width + i])
        } else {
            None
        }
    }

    /// Blocked test with cells outside the extent counting as free.
    ///
    /// Used by boundary tracing, which closes border obstacles along the frame.
    #[inline]
    pub fn is_blocked_or_free_outside(&self, c: GridCoord) -> bool {
        if c.x < 0 || c.y < 0 {
            return false;
        }
        self.get(c.x as usize, c.y as usize)
            .is_some_and(CellState::is_blocked)
    }

    /// Free test with cells outside the extent counting as blocked.
    #[inline]
    pub fn is_free(&self, c: GridCoord) -> bool {
        if c.x < 0 || c.y < 0 {
            return false;
        }
        self.get(c.x as usize, c.y as usize) == Some(CellState::Free)
    }

    /// State of the cell containing a lattice point.
    ///
    /// Points on the outer border belong to the adjacent border cell; points
    /// outside the extent are reported as blocked.
    pub fn state_at(&self, p: Point2D) -> CellState {
        if !p.is_finite()
            || p.x < 0.0
            || p.y < 0.0
            || p.x > self.width as f64
            || p.y > self.height as f64
        {
            return CellState::Blocked;
        }
        let i = (p.x.floor() as usize).min(self.width.saturating_sub(1));
        let j = (p.y.floor() as usize).min(self.height.saturating_sub(1));
        self.get(i, j).unwrap_or(CellState::Blocked)
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_blocked()).count()
    }

    /// Check whether the straight lattice segment `a`-`b` stays in free cells.
    ///
    /// Walks the cells with a DDA traversal (the floating-point analogue of a
    /// Bresenham line) so no crossed cell is skipped.
    pub fn segment_is_free(&self, a: Point2D, b: Point2D) -> bool {
        if self.state_at(a).is_blocked() || self.state_at(b).is_blocked() {
            return false;
        }
        let clamp = |p: Point2D| {
            GridCoord::new(
                (p.x.floor() as i64).clamp(0, self.width as i64 - 1),
                (p.y.floor() as i64).clamp(0, self.height as i64 - 1),
            )
        };
        let mut cell = clamp(a);
        let end = clamp(b);
        let d = b - a;
        let step_x: i64 = if d.x > 0.0 { 1 } else { -1 };
        let step_y: i64 = if d.y > 0.0 { 1 } else { -1 };

        let next_boundary = |pos: f64, c: i64, step: i64| {
            if step > 0 { (c + 1) as f64 - pos } else { pos - c as f64 }
        };
        let mut t_max_x = if d.x.abs() > f64::EPSILON {
            next_boundary(a.x, cell.x, step_x) / d.x.abs()
        } else {
            f64::INFINITY
        };
        let mut t_max_y = if d.y.abs() > f64::EPSILON {
            next_boundary(a.y, cell.y, step_y) / d.y.abs()
        } else {
            f64::INFINITY
        };
        let t_delta_x = if d.x.abs() > f64::EPSILON { 1.0 / d.x.abs() } else { f64::INFINITY };
        let t_delta_y = if d.y.abs() > f64::EPSILON { 1.0 / d.y.abs() } else { f64::INFINITY };

        let max_steps = (self.width + self.height) * 2 + 4;
        for _ in 0..max_steps {
            if !self.is_free(cell) {
                return false;
            }
            if cell == end {
                return true;
            }
            if t_max_x < t_max_y {
                cell.x += step_x;
                t_max_x += t_delta_x;
            } else {
                cell.y += step_y;
                t_max_y += t_delta_y;
            }
            if t_max_x.min(t_max_y) > 1.0 + 1e-9 && cell != end {
                // Rounding left us beside the end cell; finish with it.
                return self.is_free(cell) && self.is_free(end);
            }
        }
        self.is_free(end)
    }
}

impl OccupancyMask {
    /// Centre of cell `(i, j)` in lattice coordinates.
    #[inline]
    pub fn cell_centre(i: usize, j: usize) -> Point2D {
        Point2D::new(i as f64 + 0.5, j as f64 + 0.5)
    }

    /// Cell containing a lattice point, with the same border rule as [`Self::state_at`].
    pub fn cell_of(&self, p: Point2D) -> Option<(usize, usize)> {
        if !p.is_finite()
            || self.width == 0
            || self.height == 0
            || p.x < 0.0
            || p.y < 0.0
            || p.x > self.width as f64
            || p.y > self.height as f64
        {
            return None;
        }
        Some((
            (p.x.floor() as usize).min(self.width - 1),
            (p.y.floor() as usize).min(self.height - 1),
        ))
    }

    /// In-extent 4-neighbours of a cell.
    fn neighbors4(&self, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        [
            (i.wrapping_sub(1), j),
            (i + 1, j),
            (i, j.wrapping_sub(1)),
            (i, j + 1),
        ]
        .into_iter()
        .filter(|&(x, y)| x < self.width && y < self.height)
    }

    /// Label the 4-connected components of free cells.
    ///
    /// Returns one label per cell (`None` for blocked cells), row-major like
    /// [`Self::cells`], and the number of components. Labels follow the
    /// row-major order of each component's first cell.
    pub fn free_components(&self) -> (Vec<Option<usize>>, usize) {
        let mut labels = vec![None; self.cells.len()];
        let mut count = 0;
        let mut queue = VecDeque::new();
        for start in 0..self.cells.len() {
            if labels[start].is_some() || self.cells[start].is_blocked() {
                continue;
            }
            labels[start] = Some(count);
            queue.push_back((start % self.width, start / self.width));
            while let Some((i, j)) = queue.pop_front() {
                for (x, y) in self.neighbors4(i, j) {
                    let idx = y * self.width + x;
                    if labels[idx].is_none() && !self.cells[idx].is_blocked() {
                        labels[idx] = Some(count);
                        queue.push_back((x, y));
                    }
                }
            }
            count += 1;
        }
        (labels, count)
    }

    /// Shortest 4-connected chain of free cells from any of `sources` to the
    /// first cell accepted by `goal`, both ends included.
    ///
    /// Blocked sources are ignored. Returns `None` when no accepted cell is
    /// reachable.
    pub fn cell_path(
        &self,
        sources: &[(usize, usize)],
        goal: impl Fn(usize, usize) -> bool,
    ) -> Option<Vec<(usize, usize)>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        for &(i, j) in sources {
            if self.get(i, j) == Some(CellState::Free) && !seen[j * self.width + i] {
                seen[j * self.width + i] = true;
                queue.push_back((i, j));
            }
        }
        while let Some((i, j)) = queue.pop_front() {
            if goal(i, j) {
                let mut chain = vec![(i, j)];
                let mut idx = j * self.width + i;
                while let Some(p) = parent[idx] {
                    chain.push((p % self.width, p / self.width));
                    idx = p;
                }
                chain.reverse();
                return Some(chain);
            }
            for (x, y) in self.neighbors4(i, j) {
                let idx = y * self.width + x;
                if !seen[idx] && !self.cells[idx].is_blocked() {
                    seen[idx] = true;
                    parent[idx] = Some(j * self.width + i);
                    queue.push_back((x, y));
                }
            }
        }
        None
    }

    /// Line-of-sight shortcut of a polyline.
    ///
    /// From each kept point, jumps to the furthest later point reachable along
    /// a free segment. The first and last points are always kept.
    pub fn shortcut(&self, points: &[Point2D]) -> Vec<Point2D> {
        if points.len() <= 2 {
            return points.to_vec();
        }
        let mut kept = vec![points[0]];
        let mut i = 0;
        while i < points.len() - 1 {
            let mut furthest = i + 1;
            for j in (i + 2)..points.len() {
                if self.segment_is_free(points[i], points[j]) {
                    furthest = j;
                }
            }
            kept.push(points[furthest]);
            i = furthest;
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_mask() -> OccupancyMask {
        // 6x4, vertical wall at column 3 for rows 0..3
        OccupancyMask::from_fn(6, 4, |i, j| i == 3 && j < 3)
    }

    #[test]
    fn test_mask_access() {
        let m = wall_mask();
        assert_eq!(m.get(3, 0), Some(CellState::Blocked));
        assert_eq!(m.get(3, 3), Some(CellState::Free));
        assert_eq!(m.get(6, 0), None);
        assert_eq!(m.blocked_count(), 3);
        assert!(!m.is_blocked_or_free_outside(GridCoord::new(-1, 0)));
        assert!(!m.is_free(GridCoord::new(-1, 0)));
    }

    #[test]
    fn test_state_at_border() {
        let m = wall_mask();
        assert_eq!(m.state_at(Point2D::new(6.0, 4.0)), CellState::Free);
        assert_eq!(m.state_at(Point2D::new(3.5, 0.0)), CellState::Blocked);
        assert_eq!(m.state_at(Point2D::new(-0.1, 1.0)), CellState::Blocked);
    }

    #[test]
    fn test_segment_visibility() {
        let m = wall_mask();
        assert!(!m.segment_is_free(Point2D::new(0.5, 0.5), Point2D::new(5.5, 0.5)));
        assert!(m.segment_is_free(Point2D::new(0.5, 3.5), Point2D::new(5.5, 3.5)));
        assert!(m.segment_is_free(Point2D::new(0.5, 0.5), Point2D::new(2.5, 2.5)));
        assert!(!m.segment_is_free(Point2D::new(0.5, 0.5), Point2D::new(5.5, 2.5)));
    }

    #[test]
    fn test_free_components() {
        // Column 3 splits rows 0..3; row 3 joins both sides
        let m = wall_mask();
        let (_, count) = m.free_components();
        assert_eq!(count, 1);

        let split = OccupancyMask::from_fn(6, 4, |i, _| i == 3);
        let (labels, count) = split.free_components();
        assert_eq!(count, 2);
        assert_eq!(labels[0], Some(0));
        assert_eq!(labels[3], None);
        assert_eq!(labels[5], Some(1));

        // Diagonal contact does not join cells
        let diagonal = OccupancyMask::from_fn(2, 2, |i, j| i != j);
        assert_eq!(diagonal.free_components().1, 2);
    }

    #[test]
    fn test_cell_path_goes_around_wall() {
        let m = wall_mask();
        let chain = m.cell_path(&[(0, 0)], |i, j| (i, j) == (5, 0)).unwrap();
        assert_eq!(chain.first(), Some(&(0, 0)));
        assert_eq!(chain.last(), Some(&(5, 0)));
        // Up to row 3, across, back down: 3 + 5 + 3 steps
        assert_eq!(chain.len(), 12);
        for w in chain.windows(2) {
            let d = w[0].0.abs_diff(w[1].0) + w[0].1.abs_diff(w[1].1);
            assert_eq!(d, 1);
            assert_eq!(m.get(w[1].0, w[1].1), Some(CellState::Free));
        }

        let split = OccupancyMask::from_fn(6, 4, |i, _| i == 3);
        assert!(split.cell_path(&[(0, 0)], |i, _| i == 5).is_none());
    }

    #[test]
    fn test_shortcut_keeps_segments_free() {
        let m = wall_mask();
        let chain = m.cell_path(&[(0, 0)], |i, j| (i, j) == (5, 0)).unwrap();
        let points: Vec<Point2D> = chain
            .iter()
            .map(|&(i, j)| OccupancyMask::cell_centre(i, j))
            .collect();
        let short = m.shortcut(&points);
        assert!(short.len() < points.len());
        assert_eq!(short.first(), points.first());
        assert_eq!(short.last(), points.last());
        for w in short.windows(2) {
            assert!(m.segment_is_free(w[0], w[1]));
        }
    }
}
