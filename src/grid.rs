//! Board: dot colours, cell positions and the square dot matrix.

use rand::Rng;

/// Dot colours, in palette order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DotColor {
    Red,
    Green,
    Blue,
    Orange,
    Purple,
}

impl DotColor {
    pub const ALL: [Self; 5] = [Self::Red, Self::Green, Self::Blue, Self::Orange, Self::Purple];

    /// Index 0..5 into theme colour tables.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Orange => 3,
            Self::Purple => 4,
        }
    }

    /// Single-letter code used by `Grid::from_rows`.
    #[cfg(test)]
    pub fn letter(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::Orange => 'O',
            Self::Purple => 'P',
        }
    }

    #[cfg(test)]
    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.letter() == c.to_ascii_uppercase())
    }
}

/// Colours a session draws from. Never empty; entries are distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<DotColor>,
}

impl Palette {
    /// First `count` colours of `DotColor::ALL` (clamped to 1..=5).
    pub fn first(count: usize) -> Self {
        let count = count.clamp(1, DotColor::ALL.len());
        Self {
            colors: DotColor::ALL[..count].to_vec(),
        }
    }

    pub fn colors(&self) -> &[DotColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Uniformly random palette colour.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> DotColor {
        self.colors[rng.random_range(0..self.colors.len())]
    }

    /// Uniformly random colour, skipping `excluded` unless that would leave nothing to pick.
    pub fn pick_excluding<R: Rng + ?Sized>(
        &self,
        excluded: Option<DotColor>,
        rng: &mut R,
    ) -> DotColor {
        let candidates: Vec<DotColor> = match excluded {
            Some(skip) => self.colors.iter().copied().filter(|&c| c != skip).collect(),
            None => Vec::new(),
        };
        if candidates.is_empty() {
            self.pick(rng)
        } else {
            candidates[rng.random_range(0..candidates.len())]
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::first(DotColor::ALL.len())
    }
}

/// Cell position. Row 0 is the top row; gravity pulls towards higher rows.
/// Signed so pointer positions off the board can be expressed and then ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub col: i32,
    pub row: i32,
}

impl Pos {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// 4-directional adjacency (Manhattan distance 1).
    pub fn is_adjacent(self, other: Self) -> bool {
        (self.col - other.col).abs() + (self.row - other.row).abs() == 1
    }
}

/// True iff both coordinates lie in `[0, size)`.
#[inline]
pub fn in_bounds(pos: Pos, size: usize) -> bool {
    let size = size as i64;
    (0..size).contains(&i64::from(pos.col)) && (0..size).contains(&i64::from(pos.row))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dot {
    pub color: DotColor,
}

impl Dot {
    pub const fn new(color: DotColor) -> Self {
        Self { color }
    }
}

/// Square N x N matrix of optional dots, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Dot>>,
}

impl Grid {
    /// Every cell filled with a uniformly random palette colour.
    pub fn random<R: Rng + ?Sized>(size: usize, palette: &Palette, rng: &mut R) -> Self {
        let cells = (0..size * size)
            .map(|_| Some(Dot::new(palette.pick(rng))))
            .collect();
        Self { size, cells }
    }

    /// All cells empty.
    #[cfg(test)]
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Build from rows of colour letters (`R G B O P`); `.` is an empty cell.
    /// Returns `None` unless the rows form a square of known letters.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let size = rows.len();
        let mut grid = Self::empty(size);
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if chars.len() != size {
                return None;
            }
            for (col, c) in chars.into_iter().enumerate() {
                if c == '.' {
                    continue;
                }
                let color = DotColor::from_letter(c)?;
                grid.set(Pos::new(col as i32, row as i32), Dot::new(color));
            }
        }
        Some(grid)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        in_bounds(pos, self.size).then(|| pos.row as usize * self.size + pos.col as usize)
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Dot> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    #[inline]
    pub fn set(&mut self, pos: Pos, dot: Dot) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(dot);
        }
    }

    #[inline]
    pub fn clear(&mut self, pos: Pos) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = None;
        }
    }

    /// Removes and returns the dot at `pos`.
    pub fn take(&mut self, pos: Pos) -> Option<Dot> {
        self.index(pos).and_then(|i| self.cells[i].take())
    }

    pub fn color_at(&self, pos: Pos) -> Option<DotColor> {
        self.get(pos).map(|d| d.color)
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        let n = self.size as i32;
        (0..n).flat_map(move |row| (0..n).map(move |col| Pos::new(col, row)))
    }

    /// Positions holding a dot of `color`, row-major.
    pub fn positions_of(&self, color: DotColor) -> Vec<Pos> {
        self.positions()
            .filter(|&p| self.color_at(p) == Some(color))
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// True when every column's dots are contiguous from the bottom row up.
    #[cfg(test)]
    pub fn is_bottom_aligned(&self) -> bool {
        let n = self.size as i32;
        (0..n).all(|col| {
            let mut seen_empty = false;
            for row in (0..n).rev() {
                match self.get(Pos::new(col, row)) {
                    Some(_) if seen_empty => return false,
                    Some(_) => {}
                    None => seen_empty = true,
                }
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(Pos::new(0, 0), 6));
        assert!(in_bounds(Pos::new(5, 5), 6));
        assert!(!in_bounds(Pos::new(6, 0), 6));
        assert!(!in_bounds(Pos::new(0, -1), 6));
        assert!(!in_bounds(Pos::new(-1, 3), 6));
    }

    #[test]
    fn test_random_grid_is_full_and_uses_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        let palette = Palette::first(3);
        let grid = Grid::random(6, &palette, &mut rng);
        assert!(grid.is_full());
        for pos in grid.positions() {
            let color = grid.color_at(pos).unwrap();
            assert!(palette.colors().contains(&color));
        }
    }

    #[test]
    fn test_out_of_range_access_is_ignored() {
        let mut grid = Grid::from_rows(&["RG", "BO"]).unwrap();
        assert_eq!(grid.get(Pos::new(2, 0)), None);
        grid.set(Pos::new(-1, 0), Dot::new(DotColor::Purple));
        grid.clear(Pos::new(0, 9));
        assert!(grid.is_full());
    }

    #[test]
    fn test_from_rows() {
        let grid = Grid::from_rows(&["R.", "GB"]).unwrap();
        assert_eq!(grid.color_at(Pos::new(0, 0)), Some(DotColor::Red));
        assert_eq!(grid.get(Pos::new(1, 0)), None);
        assert_eq!(grid.color_at(Pos::new(1, 1)), Some(DotColor::Blue));
        assert!(Grid::from_rows(&["RGB", "RG"]).is_none());
        assert!(Grid::from_rows(&["RX", "GG"]).is_none());
    }

    #[test]
    fn test_adjacency_is_four_directional() {
        let p = Pos::new(2, 2);
        assert!(p.is_adjacent(Pos::new(2, 1)));
        assert!(p.is_adjacent(Pos::new(3, 2)));
        assert!(!p.is_adjacent(Pos::new(3, 3)));
        assert!(!p.is_adjacent(p));
    }

    #[test]
    fn test_pick_excluding_never_returns_excluded() {
        let mut rng = StdRng::seed_from_u64(1);
        let palette = Palette::first(2);
        for _ in 0..200 {
            assert_eq!(
                palette.pick_excluding(Some(DotColor::Red), &mut rng),
                DotColor::Green
            );
        }
    }

    #[test]
    fn test_pick_excluding_falls_back_on_single_colour() {
        let mut rng = StdRng::seed_from_u64(1);
        let palette = Palette::first(1);
        assert_eq!(
            palette.pick_excluding(Some(DotColor::Red), &mut rng),
            DotColor::Red
        );
    }

    #[test]
    fn test_bottom_aligned() {
        assert!(Grid::from_rows(&["..", "R.", "GB"]).is_none());
        let aligned = Grid::from_rows(&["...", "R..", "GBO"]).unwrap();
        assert!(aligned.is_bottom_aligned());
        let floating = Grid::from_rows(&["R..", "...", "GBO"]).unwrap();
        assert!(!floating.is_bottom_aligned());
    }
}
