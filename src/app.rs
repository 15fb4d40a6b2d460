//! Application state and event handling.
//!
//! This module defines the state shared between the playback controller and
//! the TUI: tick timing, transport commands, status messages and view zoom.

use crate::audio::AudioBackend;
use crate::config::PlaybackSettings;
use crate::pitch::PitchError;
use crate::playback::{Frame, PlaybackController, PlaybackState};
use std::time::{Duration, Instant};

/// How long status messages stay visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Tempo change per key press, in BPM.
pub const TEMPO_STEP: f64 = 5.0;

/// Volume change per key press.
pub const VOLUME_STEP: f32 = 0.1;

/// Allowed range for terminal rows drawn per beat.
const MIN_ROWS_PER_BEAT: u16 = 1;
const MAX_ROWS_PER_BEAT: u16 = 8;

/// Main application state.
pub struct App {
    /// Playback state machine, score and audio output.
    pub controller: PlaybackController<Box<dyn AudioBackend>>,
    /// Draw instructions from the most recent tick.
    pub frame: Frame,
    /// Tokens that could not be read, shown under the score list.
    pub parse_errors: Vec<PitchError>,
    /// Temporary message with the time it was set.
    pub status_message: Option<(String, Instant)>,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Terminal rows per beat in the lane view.
    pub rows_per_beat: u16,
    pub should_quit: bool,
    /// Time of the previous tick while playing.
    last_tick: Option<Instant>,
    /// State seen on the previous tick, to notice the end of the score.
    last_state: PlaybackState,
}

impl App {
    pub fn new(
        controller: PlaybackController<Box<dyn AudioBackend>>,
        parse_errors: Vec<PitchError>,
    ) -> Self {
        let frame = controller.frame();
        Self {
            controller,
            frame,
            parse_errors,
            status_message: None,
            show_help: false,
            help_scroll: 0,
            rows_per_beat: 3,
            should_quit: false,
            last_tick: None,
            last_state: PlaybackState::Idle,
        }
    }

    /// Advances playback by the wall-clock time since the previous call.
    /// Should be called once per loop iteration.
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = match (self.controller.state(), self.last_tick) {
            (PlaybackState::Playing, Some(last)) => now.duration_since(last),
            _ => Duration::ZERO,
        };
        self.last_tick = (self.controller.state() == PlaybackState::Playing).then_some(now);

        let report = self.controller.tick(elapsed);
        self.frame = report.frame;

        let state = self.controller.state();
        if self.last_state == PlaybackState::Playing && state == PlaybackState::Idle {
            self.set_status("Finished");
        }
        self.last_state = state;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn clear_expired_status(&mut self) {
        if let Some((_, set_at)) = &self.status_message {
            if set_at.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Toggles play/pause.
    pub fn toggle_playback(&mut self) {
        match self.controller.toggle() {
            Ok(()) => {
                let message = match self.controller.state() {
                    PlaybackState::Playing => "Playing",
                    PlaybackState::Paused => "Paused",
                    PlaybackState::Idle => "Nothing to play",
                };
                self.set_status(message);
            }
            Err(e) => self.set_status(format!("Cannot play: {}", e)),
        }
        self.sync_frame();
    }

    /// Stops playback and resets to the first note.
    pub fn stop_playback(&mut self) {
        self.controller.stop();
        self.set_status("Stopped");
        self.sync_frame();
    }

    /// Restarts playback from the first note.
    pub fn restart_playback(&mut self) {
        match self.controller.restart() {
            Ok(()) => self.set_status("Restarting from beginning"),
            Err(e) => self.set_status(format!("Cannot play: {}", e)),
        }
        self.sync_frame();
    }

    /// Changes tempo by `delta` BPM within the allowed range.
    pub fn adjust_tempo(&mut self, delta: f64) {
        let tempo = PlaybackSettings::clamp_tempo(self.controller.settings().tempo_bpm + delta);
        match self.controller.set_tempo(tempo) {
            Ok(()) => self.set_status(format!("Tempo {:.0} BPM", tempo)),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn toggle_loop(&mut self) {
        let looping = !self.controller.settings().looping;
        self.controller.set_looping(looping);
        self.set_status(if looping { "Loop on" } else { "Loop off" });
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        let volume = self.controller.settings().volume + delta;
        self.controller.set_volume(volume);
        let volume = self.controller.settings().volume;
        self.set_status(format!("Volume {:.0}%", volume * 100.0));
    }

    /// Changes how many terminal rows one beat occupies.
    pub fn zoom(&mut self, delta: i16) {
        let rows = (self.rows_per_beat as i16 + delta)
            .clamp(MIN_ROWS_PER_BEAT as i16, MAX_ROWS_PER_BEAT as i16);
        self.rows_per_beat = rows as u16;
    }

    /// Human-readable cursor position, e.g. `"3/12"`.
    pub fn position_string(&self) -> String {
        let total = self.controller.notes().len();
        let index = self.controller.cursor().index;
        if total == 0 {
            "-/-".to_string()
        } else {
            format!("{}/{}", (index + 1).min(total), total)
        }
    }

    /// Refreshes the cached frame after a transport change.
    fn sync_frame(&mut self) {
        self.frame = self.controller.frame();
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentBackend;
    use crate::config::{LaneLayout, MAX_TEMPO};
    use crate::fingering::map_score;
    use crate::pitch::parse_sequence;

    fn app(text: &str) -> App {
        let backend: Box<dyn AudioBackend> = Box::new(SilentBackend::default());
        let mut controller =
            PlaybackController::new(backend, PlaybackSettings::default(), LaneLayout::default())
                .unwrap();
        let notes: Vec<_> = parse_sequence(text).into_iter().map(Result::unwrap).collect();
        controller.load_score(map_score(&notes));
        App::new(controller, Vec::new())
    }

    #[test]
    fn test_toggle_and_stop() {
        let mut app = app("D4 E4");
        app.toggle_playback();
        assert_eq!(app.controller.state(), PlaybackState::Playing);
        app.toggle_playback();
        assert_eq!(app.controller.state(), PlaybackState::Paused);
        app.stop_playback();
        assert_eq!(app.controller.state(), PlaybackState::Idle);
        assert_eq!(app.position_string(), "1/2");
    }

    #[test]
    fn test_tempo_is_clamped() {
        let mut app = app("D4");
        app.adjust_tempo(1000.0);
        assert_eq!(app.controller.settings().tempo_bpm, MAX_TEMPO);
    }

    #[test]
    fn test_zoom_bounds() {
        let mut app = app("D4");
        app.zoom(100);
        assert_eq!(app.rows_per_beat, MAX_ROWS_PER_BEAT);
        app.zoom(-100);
        assert_eq!(app.rows_per_beat, MIN_ROWS_PER_BEAT);
    }

    #[test]
    fn test_first_update_fires_first_note() {
        let mut app = app("D4 E4");
        app.toggle_playback();
        app.update();
        assert_eq!(app.controller.cursor().last_activated, Some(0));
        assert!(app.frame.notes().next().is_some_and(|n| n.is_active));
    }

    #[test]
    fn test_empty_position() {
        let app = app("");
        assert_eq!(app.position_string(), "-/-");
    }
}
