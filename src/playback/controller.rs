//! The idle/playing/paused state machine.

use super::clock::{beat_duration_ms, note_duration_ms, validate_tempo, ClockError};
use super::scroller::{Frame, Scroller};
use super::{PlaybackCursor, PlaybackState};
use crate::audio::AudioBackend;
use crate::config::{LaneLayout, PlaybackSettings};
use crate::fingering::ResolvedNote;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Pending cursor advance. Dropping it cancels the advance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AdvanceTimer {
    remaining_ms: f64,
}

/// Result of one [`PlaybackController::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Indices that fired an activation this tick, ascending.
    pub activated: Vec<usize>,
    /// Whether the cursor moved (including a loop wrap or reaching the end).
    pub advanced: bool,
    /// Draw instructions reflecting the state after this tick.
    pub frame: Frame,
}

/// Owns the cursor, the loaded score and the audio backend, and keeps the
/// per-note cursor timer in step with the scroll offset.
pub struct PlaybackController<A: AudioBackend> {
    notes: Vec<ResolvedNote>,
    scroller: Scroller,
    cursor: PlaybackCursor,
    settings: PlaybackSettings,
    timer: Option<AdvanceTimer>,
    audio: A,
}

impl<A: AudioBackend> PlaybackController<A> {
    /// Creates an idle controller with an empty score.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Clock`] if the configured tempo is not
    /// positive.
    pub fn new(
        mut audio: A,
        settings: PlaybackSettings,
        layout: LaneLayout,
    ) -> Result<Self, PlaybackError> {
        validate_tempo(settings.tempo_bpm)?;
        let settings = PlaybackSettings {
            volume: PlaybackSettings::clamp_volume(settings.volume),
            ..settings
        };
        audio.set_volume(settings.volume);
        Ok(Self {
            notes: Vec::new(),
            scroller: Scroller::new(layout),
            cursor: PlaybackCursor::default(),
            settings,
            timer: None,
            audio,
        })
    }

    /// Replaces the score and resets the cursor.
    pub fn load_score(&mut self, notes: Vec<ResolvedNote>) {
        self.cancel_timer();
        self.scroller.load(&notes);
        self.notes = notes;
        self.cursor.reset();
        tracing::debug!("Loaded score with {} notes", self.notes.len());
    }

    pub fn notes(&self) -> &[ResolvedNote] {
        &self.notes
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.cursor.state
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn scroller(&self) -> &Scroller {
        &self.scroller
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Tears the controller down, handing back the audio backend.
    pub fn into_audio(self) -> A {
        self.audio
    }

    /// The note under the cursor, if the cursor is inside the score.
    pub fn current_note(&self) -> Option<&ResolvedNote> {
        self.notes.get(self.cursor.index)
    }

    /// Whether a cursor advance is scheduled.
    pub fn has_pending_advance(&self) -> bool {
        self.timer.is_some()
    }

    /// Starts or resumes playback.
    ///
    /// A cursor on or past the last note starts over from the first note.
    /// An empty score leaves the controller idle.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Clock`] if the tempo is invalid; the state
    /// does not change.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.cursor.state == PlaybackState::Playing {
            return Ok(());
        }
        validate_tempo(self.settings.tempo_bpm)?;
        if self.notes.is_empty() {
            tracing::debug!("Nothing to play");
            return Ok(());
        }

        if self.cursor.index + 1 >= self.notes.len() {
            self.cursor.rewind();
        }

        // A suspended device is retried on the next play, never fatal
        if let Err(e) = self.audio.resume() {
            tracing::warn!("Audio resume failed, continuing silently: {}", e);
        }

        self.cursor.state = PlaybackState::Playing;
        self.arm_timer()?;
        tracing::debug!("Playing from note {}", self.cursor.index);
        Ok(())
    }

    /// Freezes cursor and scroll offset. No-op unless playing.
    pub fn pause(&mut self) {
        if self.cursor.state != PlaybackState::Playing {
            return;
        }
        self.cancel_timer();
        self.cursor.state = PlaybackState::Paused;
        tracing::debug!("Paused at note {}", self.cursor.index);
    }

    /// Stops playback and resets the cursor to the first note.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.cursor.reset();
        tracing::debug!("Stopped");
    }

    /// Play/pause toggle.
    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        match self.cursor.state {
            PlaybackState::Playing => {
                self.pause();
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::Paused => self.play(),
        }
    }

    /// Stops, then starts again from the first note.
    pub fn restart(&mut self) -> Result<(), PlaybackError> {
        self.stop();
        self.play()
    }

    /// Changes the tempo, keeping the current note's remaining time in
    /// step with the scroll offset.
    pub fn set_tempo(&mut self, tempo_bpm: f64) -> Result<(), PlaybackError> {
        validate_tempo(tempo_bpm)?;
        self.settings.tempo_bpm = tempo_bpm;
        if self.cursor.state == PlaybackState::Playing {
            self.arm_timer()?;
        }
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.settings.looping = looping;
    }

    /// Sets the volume, clamped to `0.0..=1.0`, and forwards it to the
    /// backend.
    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = PlaybackSettings::clamp_volume(volume);
        self.audio.set_volume(self.settings.volume);
    }

    /// Replaces the lane geometry without losing the playback position.
    pub fn set_layout(&mut self, layout: LaneLayout) {
        self.scroller.set_layout(layout, &mut self.cursor);
    }

    /// Draw instructions for the current state, without advancing.
    pub fn frame(&self) -> Frame {
        self.scroller.frame(&self.notes, &self.cursor)
    }

    /// Runs one rendering tick.
    ///
    /// In order: the scroll offset advances by `elapsed`, notes that reached
    /// the target line fire their audio, then the advance timer moves the
    /// cursor (looping or stopping at the end). Nothing moves unless playing.
    pub fn tick(&mut self, elapsed: Duration) -> TickReport {
        let mut report = TickReport::default();

        if self.cursor.state == PlaybackState::Playing {
            if let Err(e) = self
                .scroller
                .advance(&mut self.cursor, self.settings.tempo_bpm, elapsed)
            {
                tracing::warn!("Scroll advance skipped: {}", e);
            }

            report.activated = self.scroller.collect_activations(&mut self.cursor);
            for &index in &report.activated {
                self.trigger(index);
            }

            report.advanced = self.run_timer(elapsed);
        }

        report.frame = self.frame();
        report
    }

    /// Sends the note at `index` to the audio backend.
    fn trigger(&mut self, index: usize) {
        let Some(note) = self.notes.get(index) else {
            return;
        };
        if !note.is_playable() {
            tracing::debug!("Skipping unplayable note {} ({})", index, note.western);
            return;
        }
        let western = note.western;

        let duration_secs = match note_duration_ms(&western, self.settings.tempo_bpm) {
            Ok(ms) => ms / 1000.0,
            Err(e) => {
                tracing::warn!("Cannot time note {}: {}", index, e);
                return;
            }
        };

        if let Err(e) = self
            .audio
            .play_pitch(western.name, western.octave, duration_secs)
        {
            tracing::warn!("Audio for note {} failed: {}", index, e);
        }
    }

    /// Counts the advance timer down and fires every advance that is due.
    /// At most one loop wrap happens per tick; the rest of a new pass waits
    /// for the next tick.
    fn run_timer(&mut self, elapsed: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.remaining_ms -= elapsed.as_secs_f64() * 1000.0;

        let mut advanced = false;
        while let Some(timer) = self.timer {
            if timer.remaining_ms > 0.0 {
                break;
            }
            advanced = true;
            if self.advance() {
                break;
            }
        }
        advanced
    }

    /// Moves the cursor to the next note, wrapping or stopping at the end.
    /// Returns true when the score looped or ended.
    fn advance(&mut self) -> bool {
        let next = self.cursor.index + 1;
        let wrapped = if next < self.notes.len() {
            self.cursor.index = next;
            false
        } else if self.settings.looping {
            // Carry the distance scrolled past the end into the next pass
            let score_px = self.scroller.total_beats() * self.scroller.layout().pixels_per_beat;
            let overshoot = if score_px > 0.0 {
                (self.cursor.scroll_offset - score_px).max(0.0) % score_px
            } else {
                0.0
            };
            self.cursor.rewind();
            self.cursor.scroll_offset = overshoot;
            tracing::debug!("Looping to first note");
            true
        } else {
            self.cancel_timer();
            self.cursor.index = self.notes.len();
            self.cursor.state = PlaybackState::Idle;
            tracing::debug!("Reached end of score");
            return true;
        };

        if let Err(e) = self.arm_timer() {
            tracing::warn!("Advance timer not rearmed: {}", e);
            self.cancel_timer();
        }
        wrapped
    }

    /// Schedules the next advance at the end of the current note, measured
    /// from the current scroll offset.
    fn arm_timer(&mut self) -> Result<(), ClockError> {
        let ms_per_beat = beat_duration_ms(self.settings.tempo_bpm)?;
        let beats_left = self.scroller.end_beat(self.cursor.index)
            - self.scroller.beat_at(self.cursor.scroll_offset);
        self.timer = Some(AdvanceTimer {
            remaining_ms: beats_left.max(0.0) * ms_per_beat,
        });
        Ok(())
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }
}
