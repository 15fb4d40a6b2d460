//! Continuous scroll offset and note activation.
//!
//! Each note sits at `target_line_y - start_beat * pixels_per_beat +
//! scroll_offset`. As the offset grows the notes move down and cross the
//! target line in score order, one beat every `pixels_per_beat`.

use super::clock::{elapsed_beats, ClockError};
use super::{PlaybackCursor, PlaybackState};
use crate::config::LaneLayout;
use crate::fingering::{ResolvedNote, StringId};
use std::time::Duration;

/// What a draw instruction refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// Header of a string lane, drawn on the target line.
    Lane(StringId),
    /// A score note on its string's lane.
    Note { index: usize, string: StringId },
}

/// One item for the render surface to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub is_active: bool,
    pub kind: DrawKind,
}

/// Everything to draw for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub instructions: Vec<DrawInstruction>,
}

impl Frame {
    /// Note instructions only, in score order.
    pub fn notes(&self) -> impl Iterator<Item = &DrawInstruction> {
        self.instructions
            .iter()
            .filter(|i| matches!(i.kind, DrawKind::Note { .. }))
    }

    /// Lane instructions only, lowest string first.
    pub fn lanes(&self) -> impl Iterator<Item = &DrawInstruction> {
        self.instructions
            .iter()
            .filter(|i| matches!(i.kind, DrawKind::Lane(_)))
    }
}

/// Maps beats to screen coordinates and decides when notes activate.
#[derive(Debug, Clone)]
pub struct Scroller {
    layout: LaneLayout,
    /// Start beat of every note followed by the total length, so note `i`
    /// spans `beat_marks[i]..beat_marks[i + 1]`.
    beat_marks: Vec<f64>,
}

impl Scroller {
    pub fn new(layout: LaneLayout) -> Self {
        Self {
            layout: layout.sanitized(),
            beat_marks: vec![0.0],
        }
    }

    /// Precomputes the running beat totals for a newly loaded score.
    pub fn load(&mut self, notes: &[ResolvedNote]) {
        self.beat_marks.clear();
        self.beat_marks.reserve(notes.len() + 1);
        let mut total = 0.0;
        self.beat_marks.push(total);
        for note in notes {
            total += note.western.duration_beats;
            self.beat_marks.push(total);
        }
    }

    pub fn layout(&self) -> &LaneLayout {
        &self.layout
    }

    /// Replaces the geometry, rescaling the offset so playback keeps its
    /// place in the score.
    pub fn set_layout(&mut self, layout: LaneLayout, cursor: &mut PlaybackCursor) {
        let layout = layout.sanitized();
        cursor.scroll_offset *= layout.pixels_per_beat / self.layout.pixels_per_beat;
        self.layout = layout;
    }

    /// Number of notes the scroller was loaded with.
    pub fn len(&self) -> usize {
        self.beat_marks.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Beat at which note `index` starts.
    pub fn start_beat(&self, index: usize) -> f64 {
        self.beat_marks[index.min(self.len())]
    }

    /// Beat at which note `index` ends.
    pub fn end_beat(&self, index: usize) -> f64 {
        self.beat_marks[(index + 1).min(self.len())]
    }

    pub fn total_beats(&self) -> f64 {
        self.beat_marks[self.len()]
    }

    /// Converts a scroll offset to the beat currently on the target line.
    pub fn beat_at(&self, scroll_offset: f64) -> f64 {
        scroll_offset / self.layout.pixels_per_beat
    }

    /// Moves the scroll offset forward by the beats covered by `elapsed`.
    ///
    /// Only a playing cursor moves; otherwise this is a no-op.
    pub fn advance(
        &self,
        cursor: &mut PlaybackCursor,
        tempo_bpm: f64,
        elapsed: Duration,
    ) -> Result<(), ClockError> {
        if cursor.state != PlaybackState::Playing {
            return Ok(());
        }
        let beats = elapsed_beats(tempo_bpm, elapsed)?;
        cursor.scroll_offset += beats * self.layout.pixels_per_beat;
        Ok(())
    }

    /// Vertical screen coordinate of note `index`.
    pub fn note_y(&self, index: usize, scroll_offset: f64) -> f64 {
        self.layout.target_line_y - self.start_beat(index) * self.layout.pixels_per_beat
            + scroll_offset
    }

    /// Whether `y` lies inside the activation window.
    pub fn in_window(&self, y: f64) -> bool {
        (y - self.layout.target_line_y).abs() <= self.layout.activation_tolerance
    }

    /// Fires activations for notes that reached the window this pass.
    ///
    /// Indices above `last_activated` are checked in order; every one whose
    /// note has reached the top of the window fires once and becomes the new
    /// `last_activated`. A note that skipped over the whole window in one long
    /// frame still fires. Returns the fired indices in ascending order.
    pub fn collect_activations(&self, cursor: &mut PlaybackCursor) -> Vec<usize> {
        let window_top = self.layout.target_line_y - self.layout.activation_tolerance;
        let first = cursor.last_activated.map_or(0, |last| last + 1);
        let mut fired = Vec::new();

        for index in first..self.len() {
            // Later notes never sit lower, so stop at the first miss
            if self.note_y(index, cursor.scroll_offset) < window_top {
                break;
            }
            cursor.last_activated = Some(index);
            fired.push(index);
        }

        fired
    }

    /// Builds the draw instructions for the current cursor.
    ///
    /// Unplayable notes have no lane and are left out.
    pub fn frame(&self, notes: &[ResolvedNote], cursor: &PlaybackCursor) -> Frame {
        let mut instructions = Vec::with_capacity(StringId::ALL.len() + notes.len());
        let mut active_strings = [false; 4];
        let mut note_instructions = Vec::with_capacity(notes.len());

        for (index, note) in notes.iter().enumerate() {
            let Some(position) = note.position else {
                continue;
            };
            let y = self.note_y(index, cursor.scroll_offset);
            let is_active = self.in_window(y);
            if is_active {
                active_strings[position.string.index()] = true;
            }
            note_instructions.push(DrawInstruction {
                x: self.layout.lane_x(position.string),
                y,
                label: position.label.to_string(),
                is_active,
                kind: DrawKind::Note {
                    index,
                    string: position.string,
                },
            });
        }

        for string in StringId::ALL {
            instructions.push(DrawInstruction {
                x: self.layout.lane_x(string),
                y: self.layout.target_line_y,
                label: string.display_name(),
                is_active: active_strings[string.index()],
                kind: DrawKind::Lane(string),
            });
        }
        instructions.extend(note_instructions);

        Frame { instructions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingering::map_score;
    use crate::pitch::parse_sequence;

    fn score(text: &str) -> Vec<ResolvedNote> {
        let notes: Vec<_> = parse_sequence(text).into_iter().map(Result::unwrap).collect();
        map_score(&notes)
    }

    fn playing_cursor() -> PlaybackCursor {
        PlaybackCursor {
            state: PlaybackState::Playing,
            ..PlaybackCursor::default()
        }
    }

    #[test]
    fn test_running_beat_totals() {
        let mut scroller = Scroller::new(LaneLayout::default());
        scroller.load(&score("D4 E4:2 F#4:0.5"));
        assert_eq!(scroller.len(), 3);
        assert_eq!(scroller.start_beat(0), 0.0);
        assert_eq!(scroller.start_beat(1), 1.0);
        assert_eq!(scroller.start_beat(2), 3.0);
        assert_eq!(scroller.end_beat(2), 3.5);
        assert_eq!(scroller.total_beats(), 3.5);
    }

    #[test]
    fn test_advance_is_frame_rate_independent() {
        let mut scroller = Scroller::new(LaneLayout::default());
        scroller.load(&score("D4 E4"));

        let mut coarse = playing_cursor();
        scroller
            .advance(&mut coarse, 120.0, Duration::from_millis(500))
            .unwrap();

        let mut fine = playing_cursor();
        for _ in 0..50 {
            scroller
                .advance(&mut fine, 120.0, Duration::from_millis(10))
                .unwrap();
        }

        assert!((coarse.scroll_offset - 80.0).abs() < 1e-9);
        assert!((fine.scroll_offset - coarse.scroll_offset).abs() < 1e-6);
    }

    #[test]
    fn test_advance_frozen_unless_playing() {
        let scroller = Scroller::new(LaneLayout::default());
        let mut cursor = PlaybackCursor::default();
        scroller
            .advance(&mut cursor, 120.0, Duration::from_secs(1))
            .unwrap();
        assert_eq!(cursor.scroll_offset, 0.0);

        cursor.state = PlaybackState::Paused;
        scroller
            .advance(&mut cursor, 120.0, Duration::from_secs(1))
            .unwrap();
        assert_eq!(cursor.scroll_offset, 0.0);
    }

    #[test]
    fn test_note_positions() {
        let layout = LaneLayout::default();
        let mut scroller = Scroller::new(layout);
        scroller.load(&score("D4 E4 F#4"));
        assert_eq!(scroller.note_y(0, 0.0), layout.target_line_y);
        assert_eq!(scroller.note_y(2, 0.0), layout.target_line_y - 160.0);
        assert_eq!(scroller.note_y(2, 160.0), layout.target_line_y);
    }

    #[test]
    fn test_activation_fires_once_while_in_window() {
        let mut scroller = Scroller::new(LaneLayout::default());
        scroller.load(&score("D4 E4"));
        let mut cursor = playing_cursor();

        assert_eq!(scroller.collect_activations(&mut cursor), vec![0]);
        // Note 0 stays inside the window for several small ticks
        for _ in 0..5 {
            scroller
                .advance(&mut cursor, 120.0, Duration::from_millis(10))
                .unwrap();
            assert!(scroller.collect_activations(&mut cursor).is_empty());
        }
        assert_eq!(cursor.last_activated, Some(0));
    }

    #[test]
    fn test_long_frame_fires_every_crossed_note() {
        let mut scroller = Scroller::new(LaneLayout::default());
        scroller.load(&score("D4:0.25 E4:0.25 F#4:0.25 G4"));
        let mut cursor = playing_cursor();
        cursor.last_activated = Some(0);
        cursor.scroll_offset = 0.75 * 80.0;
        assert_eq!(scroller.collect_activations(&mut cursor), vec![1, 2, 3]);
        assert_eq!(cursor.last_activated, Some(3));
    }

    #[test]
    fn test_activation_uses_tolerance() {
        let layout = LaneLayout::default();
        let mut scroller = Scroller::new(layout);
        scroller.load(&score("D4 E4"));
        let mut cursor = playing_cursor();
        cursor.last_activated = Some(0);

        cursor.scroll_offset = layout.pixels_per_beat - layout.activation_tolerance - 1.0;
        assert!(scroller.collect_activations(&mut cursor).is_empty());

        cursor.scroll_offset = layout.pixels_per_beat - layout.activation_tolerance;
        assert_eq!(scroller.collect_activations(&mut cursor), vec![1]);
    }

    #[test]
    fn test_frame_contents() {
        let layout = LaneLayout::default();
        let mut scroller = Scroller::new(layout);
        let notes = score("D4 C2 A4");
        scroller.load(&notes);
        let frame = scroller.frame(&notes, &PlaybackCursor::default());

        let lanes: Vec<_> = frame.lanes().collect();
        assert_eq!(lanes.len(), 4);
        assert!(lanes.iter().all(|l| l.y == layout.target_line_y));
        assert!(lanes[StringId::HighSa.index()].is_active);
        assert!(!lanes[StringId::HighPa.index()].is_active);

        // The unplayable C2 is skipped
        let notes: Vec<_> = frame.notes().collect();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].label, "Sa");
        assert!(notes[0].is_active);
        assert_eq!(notes[1].x, layout.lane_x(StringId::HighPa));
        assert_eq!(notes[1].kind, DrawKind::Note { index: 2, string: StringId::HighPa });
        assert!(!notes[1].is_active);
    }

    #[test]
    fn test_set_layout_keeps_beat_position() {
        let mut scroller = Scroller::new(LaneLayout::default());
        let mut cursor = playing_cursor();
        cursor.scroll_offset = 120.0;
        let layout = LaneLayout {
            pixels_per_beat: 40.0,
            ..LaneLayout::default()
        };
        scroller.set_layout(layout, &mut cursor);
        assert_eq!(cursor.scroll_offset, 60.0);
        assert_eq!(scroller.beat_at(cursor.scroll_offset), 1.5);
    }

    #[test]
    fn test_unusable_layout_is_sanitized() {
        let scroller = Scroller::new(LaneLayout {
            pixels_per_beat: 0.0,
            activation_tolerance: -3.0,
            ..LaneLayout::default()
        });
        assert_eq!(scroller.layout().pixels_per_beat, 80.0);
        assert_eq!(scroller.layout().activation_tolerance, 0.0);
        assert_eq!(scroller.beat_at(160.0), 2.0);
    }
}
