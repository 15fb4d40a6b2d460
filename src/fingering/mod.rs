//! Pitch-to-position resolution for the four-string violin.
//!
//! Given an absolute pitch, the resolver looks for strings whose position
//! table reaches it and picks one in a fixed preference order: the highest
//! pitched string first. For any pitch this is the candidate with the
//! smallest offset, i.e. the lowest hand position.

mod score;
mod tables;

pub use score::{map_score, ResolvedNote};
pub use tables::PositionEntry;

use crate::pitch::AbsolutePitch;
use serde::Serialize;
use std::fmt;
use tables::{
    HIGH_PA_POSITIONS, HIGH_SA_POSITIONS, LOW_PA_POSITIONS, LOW_SA_POSITIONS,
    OPEN_STRING_PITCHES,
};

/// Identifies one of the four strings.
///
/// Variants are declared lowest pitched first, so the derived ordering is
/// ascending by open pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StringId {
    /// Lower Sa string (D3).
    LowSa,
    /// Lower Pa string (A3).
    LowPa,
    /// Middle Sa string (D4).
    HighSa,
    /// Upper Pa string (A4).
    HighPa,
}

impl StringId {
    /// All strings, lowest pitched first.
    pub const ALL: [StringId; 4] = [
        StringId::LowSa,
        StringId::LowPa,
        StringId::HighSa,
        StringId::HighPa,
    ];

    /// Tie-break order used by [`resolve`]: highest pitched first.
    pub const PREFERENCE: [StringId; 4] = [
        StringId::HighPa,
        StringId::HighSa,
        StringId::LowPa,
        StringId::LowSa,
    ];

    /// Position of this string in [`StringId::ALL`] (0 = lowest).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pitch of the string played open.
    pub fn open_pitch(self) -> AbsolutePitch {
        AbsolutePitch(OPEN_STRING_PITCHES[self.index()])
    }

    /// Ordered table of stoppable positions, index 0 being the open string.
    pub fn positions(self) -> &'static [PositionEntry] {
        match self {
            StringId::LowSa => &LOW_SA_POSITIONS,
            StringId::LowPa => &LOW_PA_POSITIONS,
            StringId::HighSa => &HIGH_SA_POSITIONS,
            StringId::HighPa => &HIGH_PA_POSITIONS,
        }
    }

    /// Short display name, e.g. `"Sa (D4)"`.
    pub fn display_name(self) -> String {
        let swara = match self {
            StringId::LowSa => ".Sa",
            StringId::LowPa => ".Pa",
            StringId::HighSa => "Sa",
            StringId::HighPa => "Pa",
        };
        format!("{} ({})", swara, self.open_pitch())
    }

    /// Looks up the position `offset` semitones above the open string.
    ///
    /// Returns `None` when the offset is negative or beyond the table.
    pub fn position_at(self, offset: i64) -> Option<CarnaticPosition> {
        let index = usize::try_from(offset).ok()?;
        let (label, finger) = *self.positions().get(index)?;
        Some(CarnaticPosition {
            string: self,
            offset_semitones: index as u8,
            label,
            finger,
        })
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Where and how to stop a pitch on the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarnaticPosition {
    /// The string the pitch is played on.
    pub string: StringId,
    /// Semitones above the open string. Always inside the string's table.
    pub offset_semitones: u8,
    /// Swara label from the string's position table.
    pub label: &'static str,
    /// Finger number; 0 is the open string.
    pub finger: u8,
}

/// Every string that can reach `pitch`, in preference order.
pub fn candidates(pitch: AbsolutePitch) -> impl Iterator<Item = CarnaticPosition> {
    StringId::PREFERENCE
        .into_iter()
        .filter_map(move |string| string.position_at(pitch.value() - string.open_pitch().value()))
}

/// Resolves a pitch to a single position.
///
/// Returns `None` when no string can reach the pitch (the note is
/// unplayable). The result is deterministic for a given pitch.
///
/// # Examples
///
/// ```
/// use sthana::fingering::{resolve, StringId};
/// use sthana::pitch::AbsolutePitch;
///
/// let d4 = resolve(AbsolutePitch(62)).unwrap();
/// assert_eq!(d4.string, StringId::HighSa);
/// assert_eq!(d4.finger, 0);
/// assert!(resolve(AbsolutePitch(40)).is_none());
/// ```
pub fn resolve(pitch: AbsolutePitch) -> Option<CarnaticPosition> {
    candidates(pitch).next()
}

/// Lowest and highest playable pitch.
pub fn playable_range() -> (AbsolutePitch, AbsolutePitch) {
    let low = StringId::ALL
        .iter()
        .map(|s| s.open_pitch().value())
        .min()
        .unwrap_or_default();
    let high = StringId::ALL
        .iter()
        .map(|s| s.open_pitch().value() + s.positions().len() as i64 - 1)
        .max()
        .unwrap_or_default();
    (AbsolutePitch(low), AbsolutePitch(high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_strings_resolve_to_themselves() {
        for string in StringId::ALL {
            let pos = resolve(string.open_pitch()).unwrap();
            assert_eq!(pos.string, string);
            assert_eq!(pos.offset_semitones, 0);
            assert_eq!(pos.finger, 0);
            assert_eq!(pos.label, string.positions()[0].0);
        }
    }

    #[test]
    fn test_tables_start_open() {
        for string in StringId::ALL {
            assert_eq!(string.positions()[0].1, 0);
            assert!(string.positions()[1..].iter().all(|(_, finger)| *finger > 0));
        }
    }

    #[test]
    fn test_tuning_is_ascending() {
        let pitches: Vec<_> = StringId::ALL.iter().map(|s| s.open_pitch()).collect();
        assert!(pitches.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_preference_picks_first_candidate() {
        let (low, high) = playable_range();
        for value in low.value()..=high.value() {
            let pitch = AbsolutePitch(value);
            let all: Vec<_> = candidates(pitch).collect();
            assert!(!all.is_empty(), "{} should be playable", pitch);
            let chosen = resolve(pitch).unwrap();
            assert_eq!(chosen, all[0]);
            // Highest-first order means the chosen offset is the smallest
            assert!(all.iter().all(|c| c.offset_semitones >= chosen.offset_semitones));
            assert_eq!(resolve(pitch), Some(chosen));
        }
    }

    #[test]
    fn test_overlap_prefers_higher_string() {
        // A3 is offset 7 on the low Sa string and open on the low Pa string
        let a3 = AbsolutePitch(57);
        let all: Vec<_> = candidates(a3).map(|c| c.string).collect();
        assert_eq!(all, vec![StringId::LowPa, StringId::LowSa]);
        assert_eq!(resolve(a3).unwrap().string, StringId::LowPa);

        // D4 is reachable on the low Pa string (offset 5) and open on high Sa
        let d4 = resolve(AbsolutePitch(62)).unwrap();
        assert_eq!(d4.string, StringId::HighSa);
        assert_eq!(d4.label, "Sa");
    }

    #[test]
    fn test_unplayable_outside_range() {
        let (low, high) = playable_range();
        assert_eq!(low, AbsolutePitch(50));
        assert_eq!(high, AbsolutePitch(81));
        assert!(resolve(AbsolutePitch(49)).is_none());
        assert!(resolve(AbsolutePitch(82)).is_none());
    }

    #[test]
    fn test_third_position_on_top_string() {
        let a5 = resolve(AbsolutePitch(81)).unwrap();
        assert_eq!(a5.string, StringId::HighPa);
        assert_eq!(a5.offset_semitones, 12);
        assert_eq!(a5.label, "Pa'");
    }

    #[test]
    fn test_position_at_bounds() {
        assert!(StringId::LowSa.position_at(-1).is_none());
        assert!(StringId::LowSa.position_at(8).is_none());
        assert_eq!(StringId::LowSa.position_at(7).unwrap().label, ".Pa");
    }
}
