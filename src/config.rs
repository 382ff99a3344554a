//! Session configuration, read once when a session starts.

use crate::grid::{DotColor, Palette};
use thiserror::Error;

pub const MIN_GRID_SIZE: usize = 2;
pub const MIN_COLORS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid size must be at least {min}, got {0}", min = MIN_GRID_SIZE)]
    GridTooSmall(usize),
    #[error(
        "colour count must be between {min} and {max}, got {got}",
        min = MIN_COLORS,
        max = DotColor::ALL.len()
    )]
    ColorCount { got: usize },
}

/// Which limit ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetMode {
    /// Ends when the move budget reaches zero.
    Moves,
    /// Ends when the time budget (seconds) reaches zero.
    Time,
    /// Neither limit configured: play until the player quits.
    Endless,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub grid_size: usize,
    /// 0 = unused.
    pub move_limit: u32,
    /// Seconds; 0 = unused.
    pub time_limit: u32,
    pub colors: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            move_limit: 20,
            time_limit: 0,
            colors: DotColor::ALL.len(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if !(MIN_COLORS..=DotColor::ALL.len()).contains(&self.colors) {
            return Err(ConfigError::ColorCount { got: self.colors });
        }
        Ok(())
    }

    /// Time limit wins when both limits are set; the move limit is then ignored.
    pub fn budget_mode(&self) -> BudgetMode {
        if self.time_limit > 0 {
            BudgetMode::Time
        } else if self.move_limit > 0 {
            BudgetMode::Moves
        } else {
            BudgetMode::Endless
        }
    }

    /// True when a move limit was given but a time limit overrides it.
    pub fn move_limit_ignored(&self) -> bool {
        self.time_limit > 0 && self.move_limit > 0
    }

    pub fn palette(&self) -> Palette {
        Palette::first(self.colors)
    }
}
