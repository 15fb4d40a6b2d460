//! Applies the resolver across a whole melody.

use super::{resolve, CarnaticPosition};
use crate::pitch::WesternNote;
use serde::Serialize;

/// A score note paired with its resolved position.
///
/// `position` is `None` when the pitch is out of reach on every string.
/// Such notes still occupy their slot in the sequence and their beats on the
/// timeline; only drawing and audio skip them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNote {
    pub western: WesternNote,
    pub position: Option<CarnaticPosition>,
}

impl ResolvedNote {
    pub fn is_playable(&self) -> bool {
        self.position.is_some()
    }
}

/// Resolves every note, preserving order and length.
pub fn map_score(notes: &[WesternNote]) -> Vec<ResolvedNote> {
    notes
        .iter()
        .map(|note| ResolvedNote {
            western: *note,
            position: resolve(note.pitch()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingering::StringId;
    use crate::pitch::parse_sequence;

    fn notes(text: &str) -> Vec<WesternNote> {
        parse_sequence(text).into_iter().map(Result::unwrap).collect()
    }

    #[test]
    fn test_preserves_order_and_length() {
        let input = notes("D4 E4 F#4 C2 A5 B7 G3:2");
        let resolved = map_score(&input);
        assert_eq!(resolved.len(), input.len());
        for (note, out) in input.iter().zip(&resolved) {
            assert_eq!(&out.western, note);
        }
    }

    #[test]
    fn test_unplayable_notes_are_kept() {
        let resolved = map_score(&notes("C2 D4 B7"));
        assert!(!resolved[0].is_playable());
        assert!(resolved[1].is_playable());
        assert!(!resolved[2].is_playable());
    }

    #[test]
    fn test_d_e_f_sharp_scenario() {
        let resolved = map_score(&notes("D4 E4 F#4"));
        let d4 = resolved[0].position.unwrap();
        assert_eq!(d4.string, StringId::HighSa);
        assert_eq!(d4.string.open_pitch(), resolved[0].western.pitch());
        assert_eq!(d4.offset_semitones, 0);
        assert_eq!(d4.finger, 0);

        let e4 = resolved[1].position.unwrap();
        assert_eq!((e4.string, e4.offset_semitones, e4.label), (StringId::HighSa, 2, "Ri2"));
        let f_sharp = resolved[2].position.unwrap();
        assert_eq!((f_sharp.string, f_sharp.offset_semitones), (StringId::HighSa, 4));
        assert_eq!(f_sharp.label, "Ga3");
    }

    #[test]
    fn test_extreme_octaves_are_unplayable() {
        let resolved = map_score(&notes("C999999999 D4 B-2147483648"));
        assert_eq!(resolved.len(), 3);
        assert!(!resolved[0].is_playable());
        assert!(resolved[1].is_playable());
        assert!(!resolved[2].is_playable());
    }

    #[test]
    fn test_empty_score() {
        assert!(map_score(&[]).is_empty());
    }
}
