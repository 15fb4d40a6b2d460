//! Western pitch representation.
//!
//! This module provides the closed set of note spellings, the absolute
//! semitone index used by the fingering resolver, and the plain-text note
//! sequence reader used by the command line.

mod note;

pub use note::{parse_sequence, WesternNote};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sharp spellings for each pitch class, used for display.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Errors produced while reading note text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    /// The note name or octave is not a recognized spelling.
    #[error("invalid pitch name: {0:?}")]
    InvalidPitchName(String),

    /// The beat length is zero, negative, or not a number.
    #[error("invalid duration {beats} for {note}: must be a positive number of beats")]
    InvalidDuration { note: String, beats: f64 },
}

/// One of the seven natural letter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// Semitones above C for the natural note.
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

/// Sharp, flat, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    fn semitone_shift(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' | '♯' => Some(Accidental::Sharp),
            'b' | '♭' => Some(Accidental::Flat),
            _ => None,
        }
    }
}

/// A spelled note name such as `C`, `F#` or `Bb`.
///
/// Every value of this type is a valid spelling, so lookups downstream
/// cannot fail. Free-form text enters through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl NoteName {
    pub const fn new(letter: Letter, accidental: Accidental) -> Self {
        Self { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, Accidental::Natural)
    }

    /// Signed semitone distance from the C of the same octave.
    ///
    /// `Cb` yields -1 and `B#` yields 12: those spellings belong acoustically
    /// to the neighbouring octave.
    pub fn semitone(self) -> i32 {
        self.letter.semitone() + self.accidental.semitone_shift()
    }

    /// Pitch class in `0..12`. Enharmonic spellings share a class.
    pub fn pitch_class(self) -> u8 {
        self.semitone().rem_euclid(12) as u8
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.letter)?;
        match self.accidental {
            Accidental::Natural => Ok(()),
            Accidental::Sharp => f.write_str("#"),
            Accidental::Flat => f.write_str("b"),
        }
    }
}

impl FromStr for NoteName {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PitchError::InvalidPitchName(s.to_string());
        let mut chars = s.trim().chars();

        let letter = chars.next().and_then(Letter::from_char).ok_or_else(invalid)?;
        let accidental = match chars.next() {
            None => Accidental::Natural,
            Some(c) => Accidental::from_char(c).ok_or_else(invalid)?,
        };
        if chars.next().is_some() {
            return Err(invalid());
        }

        Ok(Self::new(letter, accidental))
    }
}

impl TryFrom<String> for NoteName {
    type Error = PitchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NoteName> for String {
    fn from(name: NoteName) -> Self {
        name.to_string()
    }
}

/// Linear semitone index on the 12-tone equal-tempered scale.
///
/// Octave 4 starts at 60, so the numbering matches MIDI note numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbsolutePitch(pub i64);

impl AbsolutePitch {
    pub fn value(self) -> i64 {
        self.0
    }

    /// Sharp spelling with octave, e.g. `"F#4"`.
    pub fn name(self) -> String {
        let octave = self.0.div_euclid(12) - 1;
        format!("{}{}", NOTE_NAMES[self.0.rem_euclid(12) as usize], octave)
    }

    /// Equal-tempered frequency with A4 at 440 Hz.
    pub fn frequency_hz(self) -> f64 {
        440.0 * 2f64.powf((self.0 - 69) as f64 / 12.0)
    }
}

impl fmt::Display for AbsolutePitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Converts a spelled note and octave to its absolute pitch.
///
/// Total over every `i32` octave; far-out octaves give pitches that no
/// string can reach.
///
/// # Examples
///
/// ```
/// use sthana::pitch::{to_absolute_pitch, Accidental, Letter, NoteName};
///
/// let c_sharp = NoteName::new(Letter::C, Accidental::Sharp);
/// let d_flat = NoteName::new(Letter::D, Accidental::Flat);
/// assert_eq!(to_absolute_pitch(c_sharp, 4), to_absolute_pitch(d_flat, 4));
/// assert_eq!(to_absolute_pitch(NoteName::natural(Letter::A), 4).value(), 69);
/// ```
pub fn to_absolute_pitch(name: NoteName, octave: i32) -> AbsolutePitch {
    AbsolutePitch((i64::from(octave) + 1) * 12 + i64::from(name.semitone()))
}

/// Splits text like `"F#4"` or `"C-1"` into a note name and octave.
pub fn split_name_octave(text: &str) -> Result<(NoteName, i32), PitchError> {
    let text = text.trim();
    let invalid = || PitchError::InvalidPitchName(text.to_string());

    // The octave starts at the first digit or minus sign after the letter
    let octave_start = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)
        .ok_or_else(invalid)?;

    let name: NoteName = text[..octave_start].parse().map_err(|_| invalid())?;
    let octave: i32 = text[octave_start..].parse().map_err(|_| invalid())?;
    Ok((name, octave))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(text: &str) -> AbsolutePitch {
        let (name, octave) = split_name_octave(text).unwrap();
        to_absolute_pitch(name, octave)
    }

    #[test]
    fn test_reference_pitches() {
        assert_eq!(pitch("C4").value(), 60);
        assert_eq!(pitch("A4").value(), 69);
        assert_eq!(pitch("D4").value(), 62);
        assert_eq!(pitch("C-1").value(), 0);
    }

    #[test]
    fn test_extreme_octaves_do_not_overflow() {
        assert_eq!(pitch("C999999999").value(), 12_000_000_000);
        assert_eq!(pitch("B2147483647").value(), 25_769_803_787);
        assert_eq!(pitch("Cb-2147483648").value(), -25_769_803_765);
        assert!(pitch("C999999999") > pitch("C9"));
    }

    #[test]
    fn test_enharmonic_spellings_match() {
        let pairs = [
            ("C#", "Db"),
            ("D#", "Eb"),
            ("F#", "Gb"),
            ("G#", "Ab"),
            ("A#", "Bb"),
            ("E", "Fb"),
            ("E#", "F"),
        ];
        for octave in -1..=8 {
            for (a, b) in pairs {
                let a = format!("{}{}", a, octave);
                let b = format!("{}{}", b, octave);
                assert_eq!(pitch(&a), pitch(&b), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_octave_crossing_spellings() {
        assert_eq!(pitch("B#3"), pitch("C4"));
        assert_eq!(pitch("Cb4"), pitch("B3"));
        assert_eq!("B#".parse::<NoteName>().unwrap().pitch_class(), 0);
        assert_eq!("Cb".parse::<NoteName>().unwrap().pitch_class(), 11);
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in ["H4", "C##4", "Cx4", "", "#4", "C", "D4.5", "Eq3"] {
            assert!(
                matches!(split_name_octave(bad), Err(PitchError::InvalidPitchName(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_lowercase_letters() {
        assert_eq!(pitch("bb3"), pitch("Bb3"));
        assert_eq!(pitch("b3"), pitch("B3"));
    }

    #[test]
    fn test_pitch_display() {
        assert_eq!(AbsolutePitch(61).to_string(), "C#4");
        assert_eq!(AbsolutePitch(0).name(), "C-1");
        assert_eq!("Gb".parse::<NoteName>().unwrap().to_string(), "Gb");
    }

    #[test]
    fn test_frequency() {
        assert!((AbsolutePitch(69).frequency_hz() - 440.0).abs() < 1e-9);
        assert!((AbsolutePitch(81).frequency_hz() - 880.0).abs() < 1e-9);
    }
}
