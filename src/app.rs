//! App: terminal init, main loop, timer and input handling.

use crate::anim::Transition;
use crate::config::{BudgetMode, SessionConfig};
use crate::grid::Pos;
use crate::input::{Action, key_to_action, mouse_to_pointer, move_cursor};
use crate::session::{PointerEvent, PointerKind, Session};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Frame budget for the main loop (~60 FPS).
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    config: SessionConfig,
    theme: Theme,
    no_animation: bool,
    session: Session<StdRng>,
    screen: Screen,
    /// Keyboard cursor cell.
    cursor: Pos,
    /// Presentation of the last resolved move; input waits for it.
    transition: Option<Transition>,
    /// Last whole second the time budget was charged for.
    last_second: Instant,
    /// Board rect from the last draw, for mouse hit-testing.
    board: Rect,
}

impl App {
    pub fn new(config: SessionConfig, theme: Theme, no_animation: bool) -> Result<Self> {
        config.validate()?;
        let session = Session::new(&config, StdRng::from_os_rng());
        Ok(Self::with_session(config, theme, no_animation, session))
    }

    fn with_session(
        config: SessionConfig,
        theme: Theme,
        no_animation: bool,
        session: Session<StdRng>,
    ) -> Self {
        Self {
            config,
            theme,
            no_animation,
            session,
            screen: Screen::Playing,
            cursor: Pos::new(0, 0),
            transition: None,
            last_second: Instant::now(),
            board: Rect::default(),
        }
    }

    fn reset_game(&mut self) {
        self.session = Session::new(&self.config, StdRng::from_os_rng());
        self.screen = Screen::Playing;
        self.cursor = Pos::new(0, 0);
        self.transition = None;
        self.last_second = Instant::now();
        debug!("restart");
    }

    /// Feed one pointer event to the session; a resolved move starts a transition.
    fn apply_pointer(&mut self, event: PointerEvent, now: Instant) {
        if self.transition.is_some() {
            return;
        }
        let before = (event.kind == PointerKind::End).then(|| self.session.grid().clone());
        let Some(outcome) = self.session.handle(event) else {
            return;
        };
        if self.no_animation {
            self.session.finish_transition();
        } else if let Some(before) = before {
            self.transition = Some(Transition::new(before, &outcome, now));
        }
    }

    fn apply_action(&mut self, action: Action, now: Instant) {
        let size = self.session.grid().size();
        match action {
            Action::CursorLeft | Action::CursorRight | Action::CursorUp | Action::CursorDown => {
                self.cursor = move_cursor(self.cursor, action, size);
                if self.session.is_dragging() {
                    let event = PointerEvent {
                        pos: self.cursor,
                        kind: PointerKind::Move,
                    };
                    self.apply_pointer(event, now);
                }
            }
            Action::ToggleDrag => {
                let kind = if self.session.is_dragging() {
                    PointerKind::End
                } else {
                    PointerKind::Start
                };
                self.apply_pointer(
                    PointerEvent {
                        pos: self.cursor,
                        kind,
                    },
                    now,
                );
            }
            Action::CancelDrag => self.session.cancel_drag(),
            Action::Restart | Action::Quit | Action::None => {}
        }
    }

    /// Charge the time budget once per elapsed second.
    fn tick_timer(&mut self, now: Instant) {
        if self.session.state().mode != BudgetMode::Time {
            return;
        }
        while now.saturating_duration_since(self.last_second) >= Duration::from_secs(1) {
            self.last_second += Duration::from_secs(1);
            self.session.tick();
        }
    }

    fn advance_transition(&mut self, now: Instant) {
        let done = self.transition.as_mut().is_some_and(|t| t.advance(now));
        if done {
            self.transition = None;
            self.session.finish_transition();
        }
    }

    /// Switch to the game-over screen once the session has ended and its last
    /// move has finished playing.
    fn update_screen(&mut self) {
        if self.screen == Screen::Playing && self.session.is_over() && !self.session.is_settling() {
            self.session.cancel_drag();
            self.screen = Screen::GameOver;
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size},
        };

        // Shrink the board if the terminal cannot hold it.
        let (term_cols, term_rows) = size()?;
        let fit = crate::ui::max_grid_for_terminal(term_cols, term_rows);
        if fit < self.config.grid_size {
            let clamped = fit.max(crate::config::MIN_GRID_SIZE);
            warn!(
                requested = self.config.grid_size,
                clamped, term_cols, term_rows, "grid does not fit terminal"
            );
            self.config.grid_size = clamped;
            self.reset_game();
        }

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.tick_timer(now);
            self.advance_transition(now);
            self.update_screen();

            let mut board = self.board;
            terminal.draw(|f| {
                board = crate::ui::board_rect(f.area(), self.session.grid().size());
                crate::ui::draw(
                    f,
                    crate::ui::View {
                        screen: self.screen,
                        session: &self.session,
                        theme: &self.theme,
                        cursor: self.cursor,
                        transition: self.transition.as_mut(),
                        time_limit: self.config.time_limit,
                        now,
                    },
                );
            })?;
            self.board = board;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let now = Instant::now();
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            match (self.screen, key_to_action(key)) {
                                (_, Action::Quit) => return Ok(()),
                                (_, Action::Restart) => self.reset_game(),
                                (Screen::Playing, action) => self.apply_action(action, now),
                                (Screen::GameOver, _) => {}
                            }
                        }
                        Event::Mouse(mouse) if self.screen == Screen::Playing => {
                            if let Some(pointer) = mouse_to_pointer(mouse, self.board) {
                                self.cursor = on_board(pointer.pos, self.session.grid().size())
                                    .unwrap_or(self.cursor);
                                self.apply_pointer(pointer, now);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// `pos` if it lies on an N x N board.
fn on_board(pos: Pos, size: usize) -> Option<Pos> {
    crate::grid::in_bounds(pos, size).then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, Palette};
    use crate::session::SessionState;

    fn board() -> Grid {
        Grid::from_rows(&[
            "RRG", //
            "GBB", //
            "BGR",
        ])
        .unwrap()
    }

    fn app_with(move_limit: u32, no_animation: bool) -> App {
        let config = SessionConfig {
            grid_size: 3,
            move_limit,
            ..SessionConfig::default()
        };
        let session = Session::from_parts(
            board(),
            Palette::default(),
            SessionState::new(&config),
            StdRng::seed_from_u64(7),
        );
        App::with_session(config, Theme::default(), no_animation, session)
    }

    fn drag(app: &mut App, cells: &[Pos], now: Instant) {
        for (i, &pos) in cells.iter().enumerate() {
            let kind = if i == 0 { PointerKind::Start } else { PointerKind::Move };
            app.apply_pointer(PointerEvent { pos, kind }, now);
        }
        let end = PointerEvent {
            pos: cells[cells.len() - 1],
            kind: PointerKind::End,
        };
        app.apply_pointer(end, now);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig {
            colors: 9,
            ..SessionConfig::default()
        };
        assert!(App::new(config, Theme::default(), false).is_err());
    }

    #[test]
    fn test_move_starts_transition_and_blocks_input() {
        let mut app = app_with(20, false);
        let now = Instant::now();
        drag(&mut app, &[Pos::new(0, 0), Pos::new(1, 0)], now);
        assert!(app.transition.is_some());
        assert!(app.session.is_settling());
        assert_eq!(app.session.state().move_count, 1);
        assert_eq!(app.session.state().total_cleared, 2);

        // The blue pair is untouched by the first move but input is dropped.
        drag(&mut app, &[Pos::new(1, 1), Pos::new(2, 1)], now);
        assert_eq!(app.session.state().move_count, 1);
        assert!(!app.session.is_dragging());

        app.advance_transition(now + Duration::from_secs(1));
        app.advance_transition(now + Duration::from_secs(2));
        assert!(app.transition.is_none());
        assert!(!app.session.is_settling());

        drag(&mut app, &[Pos::new(1, 1), Pos::new(2, 1)], now);
        assert_eq!(app.session.state().move_count, 2);
    }

    #[test]
    fn test_no_animation_finishes_immediately() {
        let mut app = app_with(20, true);
        drag(&mut app, &[Pos::new(1, 1), Pos::new(2, 1)], Instant::now());
        assert!(app.transition.is_none());
        assert!(!app.session.is_settling());
        assert_eq!(app.session.state().move_count, 1);
        assert!(app.session.grid().is_full());
    }

    #[test]
    fn test_game_over_waits_for_last_transition() {
        let mut app = app_with(1, false);
        let now = Instant::now();
        drag(&mut app, &[Pos::new(0, 0), Pos::new(1, 0)], now);
        assert!(app.session.is_over());

        app.update_screen();
        assert_eq!(app.screen, Screen::Playing);

        app.advance_transition(now + Duration::from_secs(1));
        app.advance_transition(now + Duration::from_secs(2));
        app.update_screen();
        assert_eq!(app.screen, Screen::GameOver);

        app.reset_game();
        assert_eq!(app.screen, Screen::Playing);
        assert!(!app.session.is_over());
    }

    #[test]
    fn test_keyboard_cursor_drags_a_path() {
        let mut app = app_with(20, true);
        let now = Instant::now();
        for _ in 0..5 {
            app.apply_action(Action::CursorRight, now);
            app.apply_action(Action::CursorDown, now);
        }
        assert_eq!(app.cursor, Pos::new(2, 2));
        app.apply_action(Action::ToggleDrag, now);
        assert!(app.session.is_dragging());
        app.apply_action(Action::CancelDrag, now);
        assert!(!app.session.is_dragging());

        // Blue pair on row 1: start at (1,1), step right, release.
        app.apply_action(Action::CursorUp, now);
        app.apply_action(Action::CursorLeft, now);
        app.apply_action(Action::ToggleDrag, now);
        app.apply_action(Action::CursorRight, now);
        assert_eq!(app.session.path(), &[Pos::new(1, 1), Pos::new(2, 1)]);
        app.apply_action(Action::ToggleDrag, now);
        assert_eq!(app.session.state().move_count, 1);
        assert_eq!(app.session.state().total_cleared, 2);
    }

    #[test]
    fn test_timer_charges_whole_seconds() {
        let config = SessionConfig {
            time_limit: 3,
            ..SessionConfig::default()
        };
        let mut app = App::new(config, Theme::default(), true).unwrap();
        let start = app.last_second;
        app.tick_timer(start + Duration::from_millis(2500));
        assert_eq!(app.session.state().time_left, 1);
        app.tick_timer(start + Duration::from_secs(5));
        assert_eq!(app.session.state().time_left, 0);
        assert!(app.session.is_over());
    }
}
