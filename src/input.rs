//! Key bindings (normal and vim-style) and mouse → grid pointer translation.

use crate::grid::Pos;
use crate::session::{PointerEvent, PointerKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

/// Terminal columns per board cell.
pub const CELL_WIDTH: u16 = 4;
/// Terminal rows per board cell.
pub const CELL_HEIGHT: u16 = 2;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    /// Start a drag at the cursor, or release the current one.
    ToggleDrag,
    /// Abandon the drag without resolving it.
    CancelDrag,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::ToggleDrag,
        KeyCode::Backspace | KeyCode::Char('x') => Action::CancelDrag,
        _ => Action::None,
    }
}

/// Grid cell under terminal position (`column`, `row`) for a board drawn at
/// `board`. Positions off the board map to out-of-range cells, which the
/// session ignores.
pub fn cell_at(board: Rect, column: u16, row: u16) -> Pos {
    let dx = i32::from(column) - i32::from(board.x);
    let dy = i32::from(row) - i32::from(board.y);
    Pos::new(
        dx.div_euclid(i32::from(CELL_WIDTH)),
        dy.div_euclid(i32::from(CELL_HEIGHT)),
    )
}

/// Left-button down / drag / up become Start / Move / End; everything else is dropped.
pub fn mouse_to_pointer(event: MouseEvent, board: Rect) -> Option<PointerEvent> {
    let kind = match event.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerKind::Start,
        MouseEventKind::Drag(MouseButton::Left) => PointerKind::Move,
        MouseEventKind::Up(MouseButton::Left) => PointerKind::End,
        _ => return None,
    };
    Some(PointerEvent {
        pos: cell_at(board, event.column, event.row),
        kind,
    })
}

/// Cursor moved one cell in the direction of `action`, clamped to the board.
pub fn move_cursor(cursor: Pos, action: Action, size: usize) -> Pos {
    let max = size.saturating_sub(1) as i32;
    let (dc, dr) = match action {
        Action::CursorLeft => (-1, 0),
        Action::CursorRight => (1, 0),
        Action::CursorUp => (0, -1),
        Action::CursorDown => (0, 1),
        _ => (0, 0),
    };
    Pos::new((cursor.col + dc).clamp(0, max), (cursor.row + dr).clamp(0, max))
}
