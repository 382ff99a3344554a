//! Layout and drawing: board, active path, falling dots, sidebar HUD, game over.

use crate::anim::{self, REMOVE_FADE_MS, Transition};
use crate::app::Screen;
use crate::config::BudgetMode;
use crate::grid::{DotColor, Grid, Pos};
use crate::input::{CELL_HEIGHT, CELL_WIDTH};
use crate::session::Session;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count};

const SIDEBAR_WIDTH: u16 = 26;
const DOT: &str = "██";

/// Everything `draw` needs besides the frame.
pub struct View<'a, R> {
    pub screen: Screen,
    pub session: &'a Session<R>,
    pub theme: &'a Theme,
    pub cursor: Pos,
    pub transition: Option<&'a mut Transition>,
    pub time_limit: u32,
    pub now: Instant,
}

/// Board size (border included) in terminal cells for an N x N grid.
fn board_outer_size(size: usize) -> (u16, u16) {
    let n = size as u16;
    (n * CELL_WIDTH + 2, n * CELL_HEIGHT + 2)
}

/// Largest grid that fits the terminal next to the sidebar.
pub fn max_grid_for_terminal(term_cols: u16, term_rows: u16) -> usize {
    let w = term_cols.saturating_sub(2 + SIDEBAR_WIDTH) / CELL_WIDTH;
    let h = term_rows.saturating_sub(2) / CELL_HEIGHT;
    usize::from(w.min(h))
}

/// Split `area` into centred board (with border) and sidebar; matches `draw_game`.
fn game_layout(area: Rect, size: usize) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(size);
    let total_w = bw + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh.max(16)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board_outer = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    (board_outer, inner[1])
}

/// Board rect without border, in terminal coordinates. The input layer maps
/// mouse positions through this.
pub fn board_rect(area: Rect, size: usize) -> Rect {
    let (outer, _) = game_layout(area, size);
    Block::default().borders(Borders::ALL).inner(outer)
}

/// Write `symbol` at (x, y) if it lands inside `clip`.
fn put(buf: &mut Buffer, clip: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    if clip.contains(Position { x, y }) {
        buf[(x, y)].set_symbol(symbol).set_style(style);
    }
}

/// Top-left terminal cell of grid cell `pos`.
fn cell_origin(board: Rect, pos: Pos) -> (i32, i32) {
    (
        i32::from(board.x) + pos.col * i32::from(CELL_WIDTH),
        i32::from(board.y) + pos.row * i32::from(CELL_HEIGHT),
    )
}

/// Draw a dot whose top edge sits at terminal row `y`.
fn put_dot(buf: &mut Buffer, board: Rect, col: i32, y: i32, color: Color, bg: Color) {
    let x = i32::from(board.x) + col * i32::from(CELL_WIDTH) + 1;
    let style = Style::default().fg(color).bg(bg);
    put(buf, board, x, y, "█", style);
    put(buf, board, x + 1, y, "█", style);
}

/// Terminal positions covered by the given cells (for the removal fade filter).
fn cell_buffer_positions(board: Rect, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in cells {
        let (x0, y0) = cell_origin(board, pos);
        for y in y0..y0 + i32::from(CELL_HEIGHT) {
            for x in x0..x0 + i32::from(CELL_WIDTH) {
                if let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) {
                    set.insert((x, y));
                }
            }
        }
    }
    set
}

pub fn draw<R>(frame: &mut Frame, view: View<'_, R>) {
    let area = frame.area();
    match view.screen {
        Screen::Playing => draw_game(frame, area, view),
        Screen::GameOver => {
            let state = view.session.state().clone();
            let theme = view.theme.clone();
            let size = view.session.grid().size();
            draw_game(frame, area, view);
            draw_game_over(frame, area, size, &state, &theme);
        }
    }
}

fn draw_game<R>(frame: &mut Frame, area: Rect, view: View<'_, R>) {
    let size = view.session.grid().size();
    let (board_outer, sidebar) = game_layout(area, size);
    let theme = view.theme;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" dotstui ", Style::default().fg(theme.title)))
        .style(Style::default().bg(theme.bg));
    let board = block.inner(board_outer);
    frame.render_widget(block, board_outer);

    match view.transition {
        Some(transition) => {
            if transition.is_removing() {
                draw_grid(frame.buffer_mut(), board, &transition.before, theme, &HashSet::new());
                apply_removal_effect(frame, board, transition, theme, view.now);
            } else {
                draw_falling(frame.buffer_mut(), board, view.session.grid(), transition, theme, view.now);
            }
        }
        None => {
            draw_grid(frame.buffer_mut(), board, view.session.grid(), theme, &HashSet::new());
            draw_path(frame.buffer_mut(), board, view.session, theme);
            if view.screen == Screen::Playing {
                draw_cursor(frame.buffer_mut(), board, view.cursor, theme);
            }
        }
    }

    draw_sidebar(frame, sidebar, view.session, theme, view.time_limit);
}

fn draw_grid(buf: &mut Buffer, board: Rect, grid: &Grid, theme: &Theme, hidden: &HashSet<Pos>) {
    for pos in grid.positions() {
        if hidden.contains(&pos) {
            continue;
        }
        if let Some(dot) = grid.get(pos) {
            let (_, y) = cell_origin(board, pos);
            put_dot(buf, board, pos.col, y, theme.dot_color(dot.color), theme.bg);
        }
    }
}

/// Fade removed cells to the background (TachyonFX), then let the transition move on.
fn apply_removal_effect(
    frame: &mut Frame,
    board: Rect,
    transition: &mut Transition,
    theme: &Theme,
    now: Instant,
) {
    let delta = transition
        .effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    transition.effect_process_time = Some(now);

    if transition.removal_effect.is_none() {
        let removing = cell_buffer_positions(board, &transition.removed);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            removing.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (REMOVE_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        transition.removal_effect = Some(effect);
    }

    if let Some(effect) = transition.removal_effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Settled board with every landing cell hidden, plus the falling dots in flight.
fn draw_falling(
    buf: &mut Buffer,
    board: Rect,
    grid: &Grid,
    transition: &Transition,
    theme: &Theme,
    now: Instant,
) {
    let landing: HashSet<Pos> = transition.falls.iter().map(|f| f.destination()).collect();
    draw_grid(buf, board, grid, theme, &landing);

    let eased = transition.eased_fall(now);
    for fall in &transition.falls {
        let row = anim::fall_row(fall, eased);
        let y = i32::from(board.y) + (row * f32::from(CELL_HEIGHT)).round() as i32;
        put_dot(buf, board, fall.col, y, theme.dot_color(fall.dot.color), theme.bg);
    }
}

/// Connectors between consecutive path cells, in the path colour.
fn draw_path<R>(buf: &mut Buffer, board: Rect, session: &Session<R>, theme: &Theme) {
    let Some(color) = session.path_color() else {
        return;
    };
    let style = Style::default()
        .fg(theme.dot_color(color))
        .bg(theme.bg)
        .add_modifier(Modifier::BOLD);
    for pair in session.path().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let top_left = if (b.col, b.row) < (a.col, a.row) { b } else { a };
        let (x, y) = cell_origin(board, top_left);
        if a.row == b.row {
            put(buf, board, x + 3, y, "━", style);
            put(buf, board, x + 4, y, "━", style);
        } else {
            put(buf, board, x + 1, y + 1, "▐", style);
            put(buf, board, x + 2, y + 1, "▌", style);
        }
    }
    // Selected dots sit on a highlighted background.
    for &pos in session.path() {
        let (_, y) = cell_origin(board, pos);
        put_dot(buf, board, pos.col, y, theme.dot_color(color), theme.main_fg);
    }
}

fn draw_cursor(buf: &mut Buffer, board: Rect, cursor: Pos, theme: &Theme) {
    let (x, y) = cell_origin(board, cursor);
    let style = Style::default().fg(theme.title).bg(theme.bg);
    put(buf, board, x, y, "[", style);
    put(buf, board, x + 3, y, "]", style);
}

fn draw_sidebar<R>(
    frame: &mut Frame,
    area: Rect,
    session: &Session<R>,
    theme: &Theme,
    time_limit: u32,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let state = session.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Stats
            Constraint::Length(4), // Budget gauge
            Constraint::Length(3), // Colours
            Constraint::Length(3), // Path
            Constraint::Min(0),    // Help
        ])
        .split(area);

    let stats = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(state.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Cleared: ", title_style),
            Span::styled(state.total_cleared.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Moves: ", title_style),
            Span::styled(state.move_count.to_string(), fg_style),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(border_style).title(" Stats "));
    frame.render_widget(stats, chunks[0]);

    let (label, ratio) = match state.mode {
        BudgetMode::Moves => {
            let total = state.moves_left + state.move_count;
            (
                format!("{} moves left", state.moves_left),
                f64::from(state.moves_left) / f64::from(total.max(1)),
            )
        }
        BudgetMode::Time => (
            format!("{:02}:{:02} left", state.time_left / 60, state.time_left % 60),
            f64::from(state.time_left) / f64::from(time_limit.max(1)),
        ),
        BudgetMode::Endless => ("endless".to_string(), 1.0),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(border_style).title(" Budget "))
        .gauge_style(Style::default().fg(theme.title).bg(theme.div_line))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(Span::styled(label, Style::default().fg(theme.main_fg)));
    frame.render_widget(gauge, chunks[1]);

    let strip: Vec<Span> = session
        .palette()
        .colors()
        .iter()
        .flat_map(|&c| {
            [
                Span::styled(DOT, Style::default().fg(theme.dot_color(c))),
                Span::raw(" "),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(strip))
            .block(Block::default().borders(Borders::ALL).border_style(border_style).title(" Colours ")),
        chunks[2],
    );

    frame.render_widget(
        Paragraph::new(path_line(session, theme))
            .block(Block::default().borders(Borders::ALL).border_style(border_style).title(" Path ")),
        chunks[3],
    );

    let help = Paragraph::new(vec![
        Line::from(Span::styled("mouse drag / space", fg_style)),
        Line::from(Span::styled("hjkl  move cursor", fg_style)),
        Line::from(Span::styled("x cancel  r restart", fg_style)),
        Line::from(Span::styled("q quit", fg_style)),
    ])
    .style(Style::default().fg(theme.inactive_fg));
    frame.render_widget(help, chunks[4]);
}

fn path_line<'a, R>(session: &Session<R>, theme: &Theme) -> Line<'a> {
    match session.path_color() {
        None => Line::from(Span::styled("-", Style::default().fg(theme.inactive_fg))),
        Some(color) if session.path_is_loop() => Line::from(vec![
            Span::styled(
                format!("LOOP: all {}", color_name(color)),
                Style::default()
                    .fg(theme.dot_color(color))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Some(color) => Line::from(vec![
            Span::styled(DOT, Style::default().fg(theme.dot_color(color))),
            Span::styled(
                format!(" x{}", session.path().len()),
                Style::default().fg(theme.main_fg),
            ),
        ]),
    }
}

fn color_name(color: DotColor) -> &'static str {
    match color {
        DotColor::Red => "red",
        DotColor::Green => "green",
        DotColor::Blue => "blue",
        DotColor::Orange => "orange",
        DotColor::Purple => "purple",
    }
}

fn draw_game_over(
    frame: &mut Frame,
    area: Rect,
    size: usize,
    state: &crate::session::SessionState,
    theme: &Theme,
) {
    let (board_outer, _) = game_layout(area, size);
    let popup_w = 30u16.min(area.width);
    let popup_h = 10u16.min(area.height);
    let popup = Rect {
        x: board_outer.x + board_outer.width.saturating_sub(popup_w) / 2,
        y: board_outer.y + board_outer.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    }
    .intersection(area);

    let title = match state.mode {
        BudgetMode::Time => " Time's up! ",
        _ => " Game Over ",
    };
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, Style::default().fg(Color::White).bg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!(" Dots cleared: {} ", state.total_cleared), fg)),
        Line::from(Span::styled(format!(" Score: {} ", state.score), fg)),
        Line::from(Span::styled(format!(" Moves: {} ", state.move_count), fg)),
        Line::from(""),
        Line::from(Span::styled(" R — Restart    Q — Quit ", fg)),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        ),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::input::cell_at;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_max_grid_for_terminal() {
        // 80x24: (80 - 28) / 4 = 13 wide, (24 - 2) / 2 = 11 tall.
        assert_eq!(max_grid_for_terminal(80, 24), 11);
        assert_eq!(max_grid_for_terminal(10, 10), 0);
    }

    #[test]
    fn test_board_rect_round_trips_through_cell_at() {
        let area = Rect::new(0, 0, 100, 40);
        let board = board_rect(area, 6);
        assert_eq!(board.width, 6 * CELL_WIDTH);
        assert_eq!(board.height, 6 * CELL_HEIGHT);
        for col in 0..6 {
            for row in 0..6 {
                let (x, y) = cell_origin(board, Pos::new(col, row));
                assert_eq!(cell_at(board, x as u16 + 1, y as u16), Pos::new(col, row));
            }
        }
    }

    #[test]
    fn test_draw_renders_dots_and_hud() {
        let session = Session::new(&SessionConfig::default(), StdRng::seed_from_u64(3));
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    View {
                        screen: Screen::Playing,
                        session: &session,
                        theme: &theme,
                        cursor: Pos::new(0, 0),
                        transition: None,
                        time_limit: 0,
                        now: Instant::now(),
                    },
                );
            })
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let board = board_rect(Rect::new(0, 0, 100, 30), 6);
        let first_dot = &buf[(board.x + 1, board.y)];
        assert_eq!(first_dot.symbol(), "█");
        let color = session.grid().color_at(Pos::new(0, 0)).unwrap();
        assert_eq!(first_dot.fg, theme.dot_color(color));
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Score: 0"));
        assert!(text.contains("20 moves left"));
    }
}
