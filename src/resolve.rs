//! Turning a released path into the set of cells to remove.

use crate::grid::{DotColor, Grid, Pos};
use crate::path::FinishedPath;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearKind {
    /// Open path: only the traced cells go.
    Path,
    /// Closed path: every dot of this colour on the board goes.
    Loop(DotColor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ClearKind,
    /// Cells to empty, each listed once.
    pub removed: Vec<Pos>,
}

impl Resolution {
    /// Colour the next refill must avoid: the wiped colour after a loop, otherwise none.
    pub fn forbidden_refill(&self) -> Option<DotColor> {
        match self.kind {
            ClearKind::Loop(color) => Some(color),
            ClearKind::Path => None,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self.kind, ClearKind::Loop(_))
    }
}

/// A path is a loop when any position occurs twice.
pub fn is_loop(cells: &[Pos]) -> bool {
    let mut seen = HashSet::with_capacity(cells.len());
    !cells.iter().all(|p| seen.insert(*p))
}

/// Decide what a finished path removes. Loops take every dot of the path's
/// colour (row-major order); open paths take their own cells in path order.
pub fn resolve(grid: &Grid, path: &FinishedPath) -> Resolution {
    if is_loop(&path.cells) {
        return Resolution {
            kind: ClearKind::Loop(path.color),
            removed: grid.positions_of(path.color),
        };
    }
    let mut seen = HashSet::with_capacity(path.cells.len());
    let removed = path.cells.iter().copied().filter(|p| seen.insert(*p)).collect();
    Resolution {
        kind: ClearKind::Path,
        removed,
    }
}

/// Empty every removed cell; returns how many dots were actually taken.
pub fn apply(grid: &mut Grid, resolution: &Resolution) -> usize {
    resolution
        .removed
        .iter()
        .filter(|&&pos| {
            let occupied = grid.get(pos).is_some();
            grid.clear(pos);
            occupied
        })
        .count()
}
