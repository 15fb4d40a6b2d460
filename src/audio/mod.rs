//! Audio output for note activations.
//!
//! The playback controller only needs three operations from an audio
//! backend, captured by [`AudioBackend`]. This module provides:
//! - [`AudioEngine`]: rodio output with a sine voice or a SoundFont voice
//!   rendered by rustysynth
//! - [`SilentBackend`]: accepts every call and produces no sound

pub mod engine;

pub use engine::AudioEngine;

use crate::pitch::NoteName;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by an audio backend. All of them are recoverable.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device is open, e.g. the device is busy or suspended.
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    /// The device is open but refused the note.
    #[error("failed to play note: {0}")]
    Playback(String),

    /// The SoundFont could not be read or is invalid.
    #[error("failed to load SoundFont {}: {message}", path.display())]
    SoundFont { path: PathBuf, message: String },
}

/// What the playback controller needs from an audio output.
pub trait AudioBackend {
    /// Starts a note that stops by itself after `duration_secs`.
    fn play_pitch(
        &mut self,
        name: NoteName,
        octave: i32,
        duration_secs: f64,
    ) -> Result<(), AudioError>;

    /// Sets the output volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    /// Makes sure the output is running. Calling it on a running backend is
    /// a no-op; a failure leaves the backend suspended until the next call.
    fn resume(&mut self) -> Result<(), AudioError>;
}

impl<A: AudioBackend + ?Sized> AudioBackend for Box<A> {
    fn play_pitch(
        &mut self,
        name: NoteName,
        octave: i32,
        duration_secs: f64,
    ) -> Result<(), AudioError> {
        (**self).play_pitch(name, octave, duration_secs)
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        (**self).resume()
    }
}

/// Backend for `--mute` and headless use.
#[derive(Debug, Default)]
pub struct SilentBackend {
    volume: f32,
}

impl AudioBackend for SilentBackend {
    fn play_pitch(
        &mut self,
        name: NoteName,
        octave: i32,
        duration_secs: f64,
    ) -> Result<(), AudioError> {
        tracing::trace!("silent note {}{} for {:.3}s", name, octave, duration_secs);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}
