//! dotstui — connect-the-dots puzzle game in the terminal.

mod anim;
mod app;
mod config;
mod gravity;
mod grid;
mod input;
mod path;
mod resolve;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::SessionConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log.as_deref() {
        init_logging(path)?;
    }

    let config = SessionConfig {
        grid_size: usize::from(args.size),
        move_limit: args.moves,
        time_limit: args.time,
        colors: usize::from(args.colors),
    };
    config.validate()?;
    if config.move_limit_ignored() {
        warn!(
            moves = config.move_limit,
            time = config.time_limit,
            "both limits set; time limit wins and the move limit is ignored"
        );
    }

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!(error = %e, "theme not loaded, using built-in colours");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });

    info!(?config, "starting");
    let mut app = App::new(config, theme, args.no_animation)?;
    app.run()?;
    Ok(())
}

/// Log to `path`. Without `--log` no subscriber is installed, so the terminal stays clean.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Connect-the-dots puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "dotstui",
    version,
    about = "Connect-the-dots puzzle in the terminal. Drag through same-coloured dots to clear them.",
    long_about = "dotstui is a terminal take on the connect-the-dots puzzle.\n\n\
        Drag through horizontally or vertically adjacent dots of one colour, then let go \
        to clear them. Close the path into a loop to clear every dot of that colour. Dots \
        above fall into the gaps and new ones drop in from the top.\n\n\
        Your score is the average number of dots cleared per move.\n\n\
        CONTROLS:\n  Mouse       Drag to connect, release to clear\n  Arrows/hjkl Move cursor    Space/Enter Start or finish a path\n  x/Backspace Cancel path    R           Restart    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (keys dot_red, dot_green, dot_blue, dot_orange, dot_purple)."
)]
pub struct Args {
    /// Board size N (an N x N grid). Shrunk to fit the terminal if needed.
    #[arg(short, long, default_value = "6", value_name = "N",
          value_parser = clap::value_parser!(u16).range(2..=12))]
    pub size: u16,

    /// Move limit; the game ends when it runs out. 0 for no move limit.
    #[arg(short, long, default_value = "20", value_name = "N")]
    pub moves: u32,

    /// Time limit in seconds. Takes precedence over --moves. 0 for no time limit.
    #[arg(short, long, default_value = "0", value_name = "SECS")]
    pub time: u32,

    /// Number of dot colours in play.
    #[arg(short, long, default_value = "5", value_name = "N",
          value_parser = clap::value_parser!(u8).range(2..=5))]
    pub colors: u8,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses built-in colours if not set.
    #[arg(long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable removal and falling animations.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["dotstui"]).unwrap();
        assert_eq!(args.size, 6);
        assert_eq!(args.moves, 20);
        assert_eq!(args.time, 0);
        assert_eq!(args.colors, 5);
        assert_eq!(args.palette, Palette::Normal);
        assert!(!args.no_animation);
    }

    #[test]
    fn test_ranges_enforced() {
        assert!(Args::try_parse_from(["dotstui", "--size", "1"]).is_err());
        assert!(Args::try_parse_from(["dotstui", "--size", "13"]).is_err());
        assert!(Args::try_parse_from(["dotstui", "-c", "6"]).is_err());
        let args = Args::try_parse_from(["dotstui", "-s", "8", "-t", "60", "--palette", "colourblind"]).unwrap();
        assert_eq!(args.size, 8);
        assert_eq!(args.time, 60);
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
