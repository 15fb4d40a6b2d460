//! A single melody note with its beat length.

use super::{split_name_octave, to_absolute_pitch, AbsolutePitch, NoteName, PitchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Beat length used when a token carries no `:beats` suffix.
pub const DEFAULT_DURATION_BEATS: f64 = 1.0;

/// A spelled Western note with octave and duration.
///
/// Durations are stored in beats so that the same score can be replayed at
/// any tempo. Deserialization goes through [`WesternNote::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNote")]
pub struct WesternNote {
    /// Spelled note name (letter plus optional accidental).
    pub name: NoteName,

    /// Scientific pitch notation octave. Octave 4 contains middle C.
    pub octave: i32,

    /// Length in beats. Always finite and positive.
    pub duration_beats: f64,
}

impl WesternNote {
    /// Creates a new note, rejecting non-positive or non-finite durations.
    ///
    /// # Examples
    ///
    /// ```
    /// use sthana::pitch::{Letter, NoteName, WesternNote};
    ///
    /// let note = WesternNote::new(NoteName::natural(Letter::D), 4, 0.5).unwrap();
    /// assert_eq!(note.pitch().value(), 62);
    /// assert!(WesternNote::new(NoteName::natural(Letter::D), 4, 0.0).is_err());
    /// ```
    pub fn new(name: NoteName, octave: i32, duration_beats: f64) -> Result<Self, PitchError> {
        if !duration_beats.is_finite() || duration_beats <= 0.0 {
            return Err(PitchError::InvalidDuration {
                note: format!("{}{}", name, octave),
                beats: duration_beats,
            });
        }
        Ok(Self {
            name,
            octave,
            duration_beats,
        })
    }

    /// Returns the absolute pitch of this note.
    pub fn pitch(&self) -> AbsolutePitch {
        to_absolute_pitch(self.name, self.octave)
    }
}

/// Unchecked serialized form of a [`WesternNote`].
#[derive(Deserialize)]
struct RawNote {
    name: NoteName,
    octave: i32,
    #[serde(default = "default_duration")]
    duration_beats: f64,
}

fn default_duration() -> f64 {
    DEFAULT_DURATION_BEATS
}

impl TryFrom<RawNote> for WesternNote {
    type Error = PitchError;

    fn try_from(raw: RawNote) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.octave, raw.duration_beats)
    }
}

impl fmt::Display for WesternNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)?;
        if self.duration_beats != DEFAULT_DURATION_BEATS {
            write!(f, ":{}", self.duration_beats)?;
        }
        Ok(())
    }
}

impl FromStr for WesternNote {
    type Err = PitchError;

    /// Parses `NAME OCTAVE [":" BEATS]`, e.g. `"D4"`, `"F#4:0.5"`, `"Bb3:2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (pitch_part, beats) = match s.split_once(':') {
            Some((pitch_part, beats_part)) => {
                let beats: f64 = beats_part.trim().parse().map_err(|_| {
                    PitchError::InvalidDuration {
                        note: pitch_part.to_string(),
                        beats: f64::NAN,
                    }
                })?;
                (pitch_part, beats)
            }
            None => (s, DEFAULT_DURATION_BEATS),
        };

        let (name, octave) = split_name_octave(pitch_part)?;
        Self::new(name, octave, beats)
    }
}

/// Reads a whitespace or comma separated note sequence.
///
/// Returns one result per token, in order. A malformed token produces an
/// error in its slot and does not affect its neighbours.
pub fn parse_sequence(text: &str) -> Vec<Result<WesternNote, PitchError>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}
