//! Column compaction and refill after dots are removed.

use crate::grid::{Dot, DotColor, Grid, Palette, Pos};
use rand::Rng;

/// One dot's movement during a settle, for the fall animation.
///
/// Refilled dots start above the board (`from_row < 0`), stacked in the order
/// they land so the topmost new dot starts highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub col: i32,
    pub from_row: i32,
    pub to_row: i32,
    pub dot: Dot,
    pub spawned: bool,
}

impl Fall {
    pub fn distance(&self) -> i32 {
        self.to_row - self.from_row
    }

    pub fn destination(&self) -> Pos {
        Pos::new(self.col, self.to_row)
    }
}

/// Drop every dot to the bottom of its column, then fill the vacated top cells
/// with new dots that avoid `forbidden` (when the palette allows it).
/// Leaves the grid full and returns the moves in column order.
pub fn settle<R: Rng + ?Sized>(
    grid: &mut Grid,
    palette: &Palette,
    forbidden: Option<DotColor>,
    rng: &mut R,
) -> Vec<Fall> {
    let n = grid.size() as i32;
    let mut falls = Vec::new();

    for col in 0..n {
        let mut pointer = n - 1;

        for row in (0..n).rev() {
            let from = Pos::new(col, row);
            if grid.get(from).is_none() {
                continue;
            }
            if row != pointer {
                if let Some(dot) = grid.take(from) {
                    grid.set(Pos::new(col, pointer), dot);
                    falls.push(Fall {
                        col,
                        from_row: row,
                        to_row: pointer,
                        dot,
                        spawned: false,
                    });
                }
            }
            pointer -= 1;
        }

        for row in (0..=pointer).rev() {
            let dot = Dot::new(palette.pick_excluding(forbidden, rng));
            grid.set(Pos::new(col, row), dot);
            falls.push(Fall {
                col,
                from_row: -1 - (pointer - row),
                to_row: row,
                dot,
                spawned: true,
            });
        }
    }

    falls
}
