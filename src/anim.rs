//! Playback of a resolved move: removal fade, then falling dots.
//!
//! The session has already reached its end state; this only decides what the
//! board looks like while the transition plays, and when it is over.

use crate::gravity::Fall;
use crate::grid::{Grid, Pos};
use crate::session::MoveOutcome;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Removal fade length (TachyonFX).
pub const REMOVE_FADE_MS: u32 = 400;
/// Time for every falling dot to land.
pub const FALL_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Removing { started: Instant },
    Falling { started: Instant },
}

pub struct Transition {
    /// Board as it was when the path was released.
    pub before: Grid,
    pub removed: Vec<Pos>,
    pub falls: Vec<Fall>,
    pub phase: Phase,
    /// Fade over removed cells; built by the renderer on first draw.
    pub removal_effect: Option<Effect>,
    /// Last time the removal effect was processed (for delta).
    pub effect_process_time: Option<Instant>,
}

impl Transition {
    pub fn new(before: Grid, outcome: &MoveOutcome, now: Instant) -> Self {
        Self {
            before,
            removed: outcome.resolution.removed.clone(),
            falls: outcome.falls.clone(),
            phase: Phase::Removing { started: now },
            removal_effect: None,
            effect_process_time: None,
        }
    }

    /// Step the phase machine. Returns true once the whole transition is done.
    pub fn advance(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Removing { started } => {
                // Fall back to the clock if the effect never got drawn.
                let timed_out = now.saturating_duration_since(started)
                    >= Duration::from_millis(u64::from(REMOVE_FADE_MS) * 2);
                if self.removal_effect.as_ref().is_some_and(Effect::done) || timed_out {
                    self.removal_effect = None;
                    self.effect_process_time = None;
                    self.phase = Phase::Falling { started: now };
                }
                false
            }
            Phase::Falling { started } => fall_progress(started, now) >= 1.0,
        }
    }

    /// Eased fall progress, 0 while removing.
    pub fn eased_fall(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Removing { .. } => 0.0,
            Phase::Falling { started } => ease_out_cubic(fall_progress(started, now)),
        }
    }

    pub fn is_removing(&self) -> bool {
        matches!(self.phase, Phase::Removing { .. })
    }
}

/// Linear progress 0..=1 through the fall.
pub fn fall_progress(started: Instant, now: Instant) -> f32 {
    let elapsed = now.saturating_duration_since(started).as_millis() as f32;
    (elapsed / FALL_MS as f32).min(1.0)
}

/// Cubic ease-out: fast start, gentle landing.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Row (fractional) a falling dot occupies at eased progress `eased`.
pub fn fall_row(fall: &Fall, eased: f32) -> f32 {
    fall.from_row as f32 + fall.distance() as f32 * eased
}
