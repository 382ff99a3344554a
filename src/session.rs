//! Session: board, drag path, counters and the move pipeline that ties them together.

use crate::config::{BudgetMode, SessionConfig};
use crate::gravity::{self, Fall};
use crate::grid::{DotColor, Grid, Palette, Pos};
use crate::path::{PathStep, PathTracker};
use crate::resolve::{self, Resolution};
use rand::Rng;
use tracing::{debug, info};

/// Score, budgets and end-of-game condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: BudgetMode,
    pub moves_left: u32,
    pub time_left: u32,
    pub total_cleared: u32,
    pub move_count: u32,
    pub score: u32,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        let mode = config.budget_mode();
        Self {
            mode,
            moves_left: if mode == BudgetMode::Moves { config.move_limit } else { 0 },
            time_left: if mode == BudgetMode::Time { config.time_limit } else { 0 },
            total_cleared: 0,
            move_count: 0,
            score: 0,
        }
    }

    /// Count a resolved move. No-op once the session is over.
    pub fn record_move(&mut self, cleared: u32) {
        if self.is_over() {
            return;
        }
        self.total_cleared = self.total_cleared.saturating_add(cleared);
        self.move_count = self.move_count.saturating_add(1);
        self.score = average_score(self.total_cleared, self.move_count);
        if self.mode == BudgetMode::Moves {
            self.moves_left = self.moves_left.saturating_sub(1);
        }
    }

    /// One second of the time budget. Only meaningful in time mode.
    pub fn tick(&mut self) {
        if self.mode == BudgetMode::Time && !self.is_over() {
            self.time_left = self.time_left.saturating_sub(1);
        }
    }

    pub fn is_over(&self) -> bool {
        match self.mode {
            BudgetMode::Moves => self.moves_left == 0,
            BudgetMode::Time => self.time_left == 0,
            BudgetMode::Endless => false,
        }
    }
}

/// `round(total / moves)`, halves rounding up; 0 before the first move.
pub fn average_score(total: u32, moves: u32) -> u32 {
    if moves == 0 {
        return 0;
    }
    let avg = (u64::from(total) + u64::from(moves / 2)) / u64::from(moves);
    avg as u32
}

/// Pointer phase delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Start,
    Move,
    End,
}

/// A pointer event already translated into grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub pos: Pos,
    pub kind: PointerKind,
}

/// Everything a resolved move changed, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub resolution: Resolution,
    pub falls: Vec<Fall>,
    pub cleared: u32,
}

/// One play-through. Owns all mutable game state; restart by building a new one.
#[derive(Debug)]
pub struct Session<R> {
    grid: Grid,
    palette: Palette,
    tracker: PathTracker,
    state: SessionState,
    /// Colour the next refill must avoid; consumed by one settle.
    forbidden_refill: Option<DotColor>,
    /// A move was resolved and its transition has not been acknowledged yet.
    settling: bool,
    rng: R,
}

impl<R> Session<R> {
    /// Session over a prepared board.
    pub fn from_parts(grid: Grid, palette: Palette, state: SessionState, rng: R) -> Self {
        Self {
            grid,
            palette,
            tracker: PathTracker::new(),
            state,
            forbidden_refill: None,
            settling: false,
            rng,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn path(&self) -> &[Pos] {
        self.tracker.cells()
    }

    pub fn path_color(&self) -> Option<DotColor> {
        self.tracker.color()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn is_settling(&self) -> bool {
        self.settling
    }

    pub fn is_dragging(&self) -> bool {
        self.tracker.is_dragging()
    }

    /// True when the path being dragged would clear every dot of its colour.
    pub fn path_is_loop(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Abandon the drag without resolving it.
    pub fn cancel_drag(&mut self) {
        self.tracker.cancel();
    }

    /// Presentation finished playing the last move; accept gestures again.
    pub fn finish_transition(&mut self) {
        self.settling = false;
    }
}

impl<R: Rng> Session<R> {
    /// `config` must already be validated.
    pub fn new(config: &SessionConfig, mut rng: R) -> Self {
        let palette = config.palette();
        let grid = Grid::random(config.grid_size, &palette, &mut rng);
        let state = SessionState::new(config);
        info!(
            size = config.grid_size,
            colors = palette.len(),
            mode = ?state.mode,
            moves = state.moves_left,
            time = state.time_left,
            "session started"
        );
        Self::from_parts(grid, palette, state, rng)
    }

    fn accepts_input(&self) -> bool {
        !self.settling && !self.state.is_over()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<MoveOutcome> {
        match event.kind {
            PointerKind::Start => {
                self.pointer_down(event.pos);
                None
            }
            PointerKind::Move => {
                self.pointer_move(event.pos);
                None
            }
            PointerKind::End => self.pointer_up(),
        }
    }

    pub fn pointer_down(&mut self, pos: Pos) -> bool {
        self.accepts_input() && self.tracker.begin(&self.grid, pos)
    }

    pub fn pointer_move(&mut self, pos: Pos) -> PathStep {
        if !self.accepts_input() || !self.tracker.is_dragging() {
            return PathStep::Ignored;
        }
        self.tracker.extend(&self.grid, pos)
    }

    /// Release the drag. A path of two or more cells is resolved right away:
    /// cells are removed, the board settles and the move is counted. The
    /// session then ignores pointer input until `finish_transition`.
    pub fn pointer_up(&mut self) -> Option<MoveOutcome> {
        if !self.accepts_input() {
            self.tracker.cancel();
            return None;
        }
        let path = self.tracker.finish()?;
        let resolution = resolve::resolve(&self.grid, &path);
        self.forbidden_refill = resolution.forbidden_refill();

        let cleared = resolve::apply(&mut self.grid, &resolution) as u32;
        let gaps = self.grid.empty_count();
        let forbidden = self.forbidden_refill.take();
        let falls = gravity::settle(&mut self.grid, &self.palette, forbidden, &mut self.rng);
        debug_assert!(self.grid.is_full());

        self.state.record_move(cleared);
        self.settling = true;

        if resolution.is_loop() {
            info!(color = ?path.color, cleared, "loop cleared colour");
        }
        debug!(
            path_len = path.cells.len(),
            cleared,
            gaps,
            falls = falls.len(),
            score = self.state.score,
            "move resolved"
        );
        if self.state.is_over() {
            info!(
                total = self.state.total_cleared,
                score = self.state.score,
                moves = self.state.move_count,
                "game over"
            );
        }

        Some(MoveOutcome {
            resolution,
            falls,
            cleared,
        })
    }

    pub fn tick(&mut self) {
        let was_over = self.state.is_over();
        self.state.tick();
        if !was_over && self.state.is_over() {
            info!(total = self.state.total_cleared, score = self.state.score, "time up");
        }
    }
}
