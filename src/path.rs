//! Drag path: the in-progress chain of same-coloured dots for one gesture.

use crate::grid::{DotColor, Grid, Pos};

/// What a pointer move did to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    Extended,
    Backtracked,
    Ignored,
}

/// A released path long enough to resolve (two or more cells).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedPath {
    pub cells: Vec<Pos>,
    pub color: DotColor,
}

/// Tracks a single drag gesture.
///
/// Idle until `begin`; while dragging, `extend` either appends an adjacent
/// same-coloured cell, undoes the last step (moving back onto the
/// second-to-last cell) or does nothing. `finish` hands back the path and
/// returns to idle. The first cell may be re-entered once to close a loop;
/// any other revisit is rejected.
#[derive(Debug, Clone, Default)]
pub struct PathTracker {
    cells: Vec<Pos>,
    color: Option<DotColor>,
    dragging: bool,
}

impl PathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer down. Starts a path when `pos` holds a dot; an invalid cell still
    /// starts a gesture, but with no path every following move is ignored.
    /// Returns true if a path was started.
    pub fn begin(&mut self, grid: &Grid, pos: Pos) -> bool {
        self.cells.clear();
        self.color = None;
        self.dragging = true;
        match grid.color_at(pos) {
            Some(color) => {
                self.cells.push(pos);
                self.color = Some(color);
                true
            }
            None => false,
        }
    }

    /// Pointer move onto `pos`.
    pub fn extend(&mut self, grid: &Grid, pos: Pos) -> PathStep {
        let (Some(color), Some(&last)) = (self.color, self.cells.last()) else {
            return PathStep::Ignored;
        };
        let len = self.cells.len();
        if len >= 2 && self.cells[len - 2] == pos {
            self.cells.pop();
            return PathStep::Backtracked;
        }

        let Some(target) = grid.color_at(pos) else {
            return PathStep::Ignored;
        };

        if !last.is_adjacent(pos) || target != color {
            return PathStep::Ignored;
        }
        let visits = self.cells.iter().filter(|&&p| p == pos).count();
        let closes_loop = pos == self.cells[0] && visits == 1;
        if visits == 0 || closes_loop {
            self.cells.push(pos);
            PathStep::Extended
        } else {
            PathStep::Ignored
        }
    }

    /// Pointer up. Yields the path when it has at least two cells; the tracker
    /// is reset either way.
    pub fn finish(&mut self) -> Option<FinishedPath> {
        self.dragging = false;
        let cells = std::mem::take(&mut self.cells);
        let color = self.color.take()?;
        (cells.len() >= 2).then_some(FinishedPath { cells, color })
    }

    /// Drop any gesture in progress without resolving it.
    pub fn cancel(&mut self) {
        self.cells.clear();
        self.color = None;
        self.dragging = false;
    }

    pub fn cells(&self) -> &[Pos] {
        &self.cells
    }

    pub fn color(&self) -> Option<DotColor> {
        self.color
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True once the path has re-entered its first cell.
    pub fn is_closed(&self) -> bool {
        self.cells.iter().skip(1).any(|p| Some(p) == self.cells.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(col: i32, row: i32) -> Pos {
        Pos::new(col, row)
    }

    fn board() -> Grid {
        Grid::from_rows(&[
            "RRRB", //
            "RRGB", //
            "RGGB", //
            "BBBB",
        ])
        .unwrap()
    }

    #[test]
    fn test_begin_sets_color() {
        let grid = board();
        let mut t = PathTracker::new();
        assert!(t.begin(&grid, p(3, 0)));
        assert_eq!(t.cells(), &[p(3, 0)]);
        assert_eq!(t.color(), Some(DotColor::Blue));
        assert!(t.is_dragging());
    }

    #[test]
    fn test_begin_off_board_ignores_moves() {
        let grid = board();
        let mut t = PathTracker::new();
        assert!(!t.begin(&grid, p(-1, 0)));
        assert!(t.is_dragging());
        assert_eq!(t.extend(&grid, p(0, 0)), PathStep::Ignored);
        assert!(t.cells().is_empty());
        assert_eq!(t.finish(), None);
    }

    #[test]
    fn test_extend_adjacent_same_color() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 0));
        assert_eq!(t.extend(&grid, p(1, 0)), PathStep::Extended);
        assert_eq!(t.extend(&grid, p(2, 0)), PathStep::Extended);
        assert_eq!(t.cells(), &[p(0, 0), p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_rejects_color_mismatch_diagonal_and_out_of_bounds() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(1, 1));
        assert_eq!(t.extend(&grid, p(2, 1)), PathStep::Ignored); // green
        assert_eq!(t.extend(&grid, p(0, 0)), PathStep::Ignored); // diagonal
        assert_eq!(t.extend(&grid, p(1, 3)), PathStep::Ignored); // not adjacent
        assert_eq!(t.extend(&grid, p(1, -1)), PathStep::Ignored);
        assert_eq!(t.cells(), &[p(1, 1)]);
    }

    #[test]
    fn test_backtrack_pops_one_cell() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 2));
        t.extend(&grid, p(0, 1));
        t.extend(&grid, p(1, 1));
        assert_eq!(t.cells().len(), 3);
        assert_eq!(t.extend(&grid, p(0, 1)), PathStep::Backtracked);
        assert_eq!(t.cells(), &[p(0, 2), p(0, 1)]);
        assert_eq!(t.extend(&grid, p(0, 2)), PathStep::Backtracked);
        assert_eq!(t.cells(), &[p(0, 2)]);
        // A single cell has nothing to backtrack to.
        assert_eq!(t.extend(&grid, p(0, 2)), PathStep::Ignored);
    }

    #[test]
    fn test_backtrack_ignores_cell_contents() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 1));
        t.extend(&grid, p(1, 1));
        // The board under the path changes colour or empties out; stepping
        // back onto the previous cell still pops.
        let recoloured = Grid::from_rows(&["....", "GBGB", "RGGB", "BBBB"]).unwrap();
        assert_eq!(t.extend(&recoloured, p(0, 1)), PathStep::Backtracked);
        assert_eq!(t.cells(), &[p(0, 1)]);
        assert_eq!(t.color(), Some(DotColor::Red));

        t.extend(&grid, p(0, 0));
        let emptied = Grid::from_rows(&["....", "....", "....", "...."]).unwrap();
        assert_eq!(t.extend(&emptied, p(0, 1)), PathStep::Backtracked);
        assert_eq!(t.cells(), &[p(0, 1)]);
    }

    #[test]
    fn test_revisit_of_non_first_cell_rejected() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 2));
        t.extend(&grid, p(0, 1));
        t.extend(&grid, p(0, 0));
        t.extend(&grid, p(1, 0));
        t.extend(&grid, p(1, 1));
        // (0,1) is on the path but is neither first nor second-to-last.
        assert_eq!(t.extend(&grid, p(0, 1)), PathStep::Ignored);
        assert_eq!(t.cells().len(), 5);
    }

    #[test]
    fn test_loop_closes_once() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 0));
        t.extend(&grid, p(1, 0));
        t.extend(&grid, p(1, 1));
        t.extend(&grid, p(0, 1));
        assert!(!t.is_closed());
        assert_eq!(t.extend(&grid, p(0, 0)), PathStep::Extended);
        assert!(t.is_closed());
        assert_eq!(t.cells().len(), 5);

        // Leave the loop and try to re-enter the first cell a second time.
        let grid = Grid::from_rows(&["RRR", "RRR", "RRR"]).unwrap();
        let mut t = PathTracker::new();
        t.begin(&grid, p(1, 1));
        for pos in [p(1, 0), p(0, 0), p(0, 1), p(1, 1), p(2, 1), p(2, 2), p(1, 2)] {
            assert_eq!(t.extend(&grid, pos), PathStep::Extended);
        }
        assert_eq!(t.extend(&grid, p(1, 1)), PathStep::Ignored);
        assert_eq!(t.cells().len(), 8);
        assert_eq!(t.extend(&grid, p(2, 2)), PathStep::Backtracked);
    }

    #[test]
    fn test_accepted_paths_are_adjacent_and_single_colored() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(3, 0));
        for pos in [p(3, 1), p(2, 1), p(3, 2), p(3, 3), p(2, 3), p(1, 3), p(0, 3), p(1, 2)] {
            t.extend(&grid, pos);
        }
        let cells = t.cells().to_vec();
        assert!(cells.windows(2).all(|w| w[0].is_adjacent(w[1])));
        assert!(cells.iter().all(|&c| grid.color_at(c) == Some(DotColor::Blue)));
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn test_finish_requires_two_cells_and_resets() {
        let grid = board();
        let mut t = PathTracker::new();
        t.begin(&grid, p(0, 0));
        assert_eq!(t.finish(), None);
        assert!(!t.is_dragging());
        assert_eq!(t.color(), None);

        t.begin(&grid, p(0, 0));
        t.extend(&grid, p(0, 1));
        let done = t.finish().unwrap();
        assert_eq!(done.cells, vec![p(0, 0), p(0, 1)]);
        assert_eq!(done.color, DotColor::Red);
        assert!(t.cells().is_empty());
        assert_eq!(t.color(), None);
    }
}
