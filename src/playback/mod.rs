//! Tempo-synchronized playback of a resolved score.
//!
//! Playback is driven entirely by the caller: every rendering tick passes
//! the wall-clock time elapsed since the previous tick to
//! [`PlaybackController::tick`]. Nothing in this module reads a clock, which
//! keeps the scheduler deterministic under synthetic tick sequences.
//!
//! Two clocks run side by side:
//! - a coarse per-note advance timer that moves the "current note" cursor
//! - a continuous scroll offset that places notes on screen and fires
//!   audio when a note reaches the target line

mod clock;
mod controller;
mod scroller;

pub use clock::{beat_duration_ms, elapsed_beats, note_duration_ms, validate_tempo, ClockError};
pub use controller::{PlaybackController, PlaybackError, TickReport};
pub use scroller::{DrawInstruction, DrawKind, Frame, Scroller};

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing. The cursor does not move and no timer is armed.
    #[default]
    Idle,
    /// Cursor and scroll offset advance every tick.
    Playing,
    /// Frozen at the current position, resumable.
    Paused,
}

/// Position of playback within the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    /// Index of the current note. Equals the score length after playback
    /// ran off the end without looping.
    pub index: usize,
    /// Distance the notes have scrolled, in layout pixels.
    pub scroll_offset: f64,
    /// Highest index that has fired an activation in this pass.
    /// `None` before the first activation.
    pub last_activated: Option<usize>,
    pub state: PlaybackState,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self {
            index: 0,
            scroll_offset: 0.0,
            last_activated: None,
            state: PlaybackState::Idle,
        }
    }
}

impl PlaybackCursor {
    /// Moves back to the first note without touching the state.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.scroll_offset = 0.0;
        self.last_activated = None;
    }

    /// Back to `(0, 0, None, Idle)`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
