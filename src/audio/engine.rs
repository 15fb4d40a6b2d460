//! Audio engine for note playback.
//!
//! Provides an [`AudioBackend`] on top of rodio. Notes are voiced either by
//! a plain sine oscillator or, when a SoundFont is supplied, by a rustysynth
//! synthesizer streamed through rodio.

use super::{AudioBackend, AudioError};
use crate::pitch::{to_absolute_pitch, NoteName};
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// MIDI channel used for SoundFont notes.
const CHANNEL: i32 = 0;

/// General MIDI program for violin.
const VIOLIN_PROGRAM: i32 = 40;

/// Velocity for every SoundFont note.
const NOTE_VELOCITY: i32 = 100;

/// Peak amplitude of the sine voice at full volume.
const SINE_GAIN: f32 = 0.25;

/// Fade applied to sine notes to avoid clicks at onset.
const SINE_FADE_IN: Duration = Duration::from_millis(5);

/// A SoundFont note waiting for its note-off.
struct PendingRelease {
    key: i32,
    frames_left: usize,
}

/// Synthesizer plus the notes it still has to release.
struct SynthState {
    synth: Synthesizer,
    pending: Vec<PendingRelease>,
}

impl SynthState {
    /// Sends note-offs for every note that ends within the next `frames`.
    fn release_due(&mut self, frames: usize) {
        let synth = &mut self.synth;
        self.pending.retain_mut(|p| {
            if p.frames_left <= frames {
                synth.note_off(CHANNEL, p.key);
                false
            } else {
                p.frames_left -= frames;
                true
            }
        });
    }
}

/// Audio source that generates samples from the synthesizer.
/// Implements rodio's Source trait for playback.
struct SynthSource {
    state: Arc<Mutex<SynthState>>,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(state: Arc<Mutex<SynthState>>) -> Self {
        Self {
            state,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            if let Ok(mut state) = self.state.lock() {
                state.release_due(BUFFER_SIZE);
                state.synth.render(&mut self.left_buf, &mut self.right_buf);
            } else {
                self.left_buf.fill(0.0);
                self.right_buf.fill(0.0);
            }
            self.buf_pos = 0;
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// How notes are voiced.
enum Voice {
    Sine,
    SoundFont(Arc<Mutex<SynthState>>),
}

/// An open output device. The stream must be kept alive while in use.
struct OutputDevice {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// Rodio-backed audio output.
///
/// The output device is opened on construction when possible. If that
/// fails the engine starts suspended and [`AudioBackend::resume`] retries.
pub struct AudioEngine {
    output: Option<OutputDevice>,
    voice: Voice,
    volume: f32,
}

impl AudioEngine {
    /// Creates an engine with a sine voice.
    pub fn new() -> Self {
        let mut engine = Self {
            output: None,
            voice: Voice::Sine,
            volume: 1.0,
        };
        if let Err(e) = engine.open_output() {
            tracing::warn!("Starting with audio suspended: {}", e);
        }
        engine
    }

    /// Creates an engine that voices notes with the given SoundFont.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::SoundFont`] if the file cannot be read or the
    /// synthesizer cannot be created. A missing output device is not an
    /// error: the engine starts suspended.
    pub fn with_soundfont<P: AsRef<Path>>(soundfont_path: P) -> Result<Self, AudioError> {
        let path = soundfont_path.as_ref();
        let soundfont_error = |message: String| AudioError::SoundFont {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| soundfont_error(e.to_string()))?;
        let soundfont = Arc::new(
            SoundFont::new(&mut BufReader::new(file))
                .map_err(|e| soundfont_error(format!("{:?}", e)))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let mut synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| soundfont_error(format!("{:?}", e)))?;
        // Program change is MIDI command 0xC0 (192)
        synth.process_midi_message(CHANNEL, 0xC0, VIOLIN_PROGRAM, 0);

        let state = Arc::new(Mutex::new(SynthState {
            synth,
            pending: Vec::new(),
        }));

        let mut engine = Self {
            output: None,
            voice: Voice::SoundFont(state),
            volume: 1.0,
        };
        if let Err(e) = engine.open_output() {
            tracing::warn!("Starting with audio suspended: {}", e);
        }
        tracing::info!("Loaded SoundFont {}", path.display());
        Ok(engine)
    }

    /// Whether an output device is currently open.
    pub fn is_running(&self) -> bool {
        self.output.is_some()
    }

    fn open_output(&mut self) -> Result<(), AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::Unavailable(e.to_string()))?;

        if let Voice::SoundFont(state) = &self.voice {
            handle
                .play_raw(SynthSource::new(Arc::clone(state)))
                .map_err(|e| AudioError::Unavailable(e.to_string()))?;
        }

        self.output = Some(OutputDevice {
            _stream: stream,
            handle,
        });
        tracing::debug!("Audio output opened");
        Ok(())
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for AudioEngine {
    fn play_pitch(
        &mut self,
        name: NoteName,
        octave: i32,
        duration_secs: f64,
    ) -> Result<(), AudioError> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| AudioError::Unavailable("output not started".to_string()))?;
        let pitch = to_absolute_pitch(name, octave);

        match &self.voice {
            Voice::Sine => {
                let source = SineWave::new(pitch.frequency_hz() as f32)
                    .take_duration(Duration::from_secs_f64(duration_secs))
                    .fade_in(SINE_FADE_IN)
                    .amplify(self.volume * SINE_GAIN);
                output
                    .handle
                    .play_raw(source)
                    .map_err(|e| AudioError::Playback(e.to_string()))?;
            }
            Voice::SoundFont(state) => {
                let key = i32::try_from(pitch.value())
                    .ok()
                    .filter(|key| (0..=127).contains(key))
                    .ok_or_else(|| {
                        AudioError::Playback(format!("{} is outside the MIDI range", pitch))
                    })?;
                let mut state = state
                    .lock()
                    .map_err(|_| AudioError::Playback("synthesizer lock poisoned".to_string()))?;
                // A repeated pitch must not be cut short by the earlier release
                if let Some(pos) = state.pending.iter().position(|p| p.key == key) {
                    state.pending.swap_remove(pos);
                    state.synth.note_off(CHANNEL, key);
                }
                state.synth.note_on(CHANNEL, key, NOTE_VELOCITY);
                state.pending.push(PendingRelease {
                    key,
                    frames_left: (duration_secs * SAMPLE_RATE as f64) as usize,
                });
            }
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Voice::SoundFont(state) = &self.voice {
            if let Ok(mut state) = state.lock() {
                state.synth.set_master_volume(self.volume);
            }
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.output.is_some() {
            return Ok(());
        }
        self.open_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_soundfont_is_reported() {
        let result = AudioEngine::with_soundfont("/nonexistent/violin.sf2");
        assert!(matches!(result, Err(AudioError::SoundFont { .. })));
    }
}
