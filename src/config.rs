//! Playback settings and lane geometry.
//!
//! Both structs deserialize with defaults for every missing field so a
//! partial JSON object is enough to override a single value.

use crate::fingering::StringId;
use serde::{Deserialize, Serialize};

/// Default tempo in beats per minute.
pub const DEFAULT_TEMPO: f64 = 90.0;

/// Tempo range offered by the front-end.
pub const MIN_TEMPO: f64 = 40.0;
pub const MAX_TEMPO: f64 = 200.0;

/// Tempo, loop and volume. All three may change during playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Tempo in beats per minute.
    pub tempo_bpm: f64,
    /// Restart from the first note after the last one.
    pub looping: bool,
    /// Output volume in `0.0..=1.0`.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_TEMPO,
            looping: false,
            volume: 0.8,
        }
    }
}

impl PlaybackSettings {
    /// Clamps a tempo into the range the front-end allows.
    pub fn clamp_tempo(tempo: f64) -> f64 {
        if tempo.is_nan() {
            return DEFAULT_TEMPO;
        }
        tempo.clamp(MIN_TEMPO, MAX_TEMPO)
    }

    /// Clamps a volume into `0.0..=1.0`. NaN becomes silence.
    pub fn clamp_volume(volume: f32) -> f32 {
        if volume.is_nan() {
            return 0.0;
        }
        volume.clamp(0.0, 1.0)
    }
}

/// Geometry of the scrolling lane view, in abstract pixels.
///
/// Notes travel downwards: a note sits above the target line until its
/// start beat, crosses it while sounding, and continues below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLayout {
    /// Y coordinate of the line where notes become active.
    pub target_line_y: f64,
    /// Vertical distance covered by one beat.
    pub pixels_per_beat: f64,
    /// Half-height of the activation window around the target line.
    pub activation_tolerance: f64,
    /// X coordinate of the lowest string's lane.
    pub lane_origin_x: f64,
    /// Horizontal distance between adjacent lanes.
    pub lane_spacing: f64,
}

impl Default for LaneLayout {
    fn default() -> Self {
        Self {
            target_line_y: 400.0,
            pixels_per_beat: 80.0,
            activation_tolerance: 12.0,
            lane_origin_x: 40.0,
            lane_spacing: 60.0,
        }
    }
}

impl LaneLayout {
    /// X coordinate of a string's lane. Lanes run left to right from the
    /// lowest string.
    pub fn lane_x(&self, string: StringId) -> f64 {
        self.lane_origin_x + string.index() as f64 * self.lane_spacing
    }

    /// Replaces geometry the scroller cannot work with: a beat height that
    /// is not finite and positive falls back to the default, and the
    /// tolerance is clamped to be non-negative.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pixels_per_beat = if self.pixels_per_beat.is_finite() && self.pixels_per_beat > 0.0 {
            self.pixels_per_beat
        } else {
            defaults.pixels_per_beat
        };
        let activation_tolerance = if self.activation_tolerance.is_finite() {
            self.activation_tolerance.max(0.0)
        } else {
            defaults.activation_tolerance
        };
        let target_line_y = if self.target_line_y.is_finite() {
            self.target_line_y
        } else {
            defaults.target_line_y
        };
        Self {
            target_line_y,
            pixels_per_beat,
            activation_tolerance,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_tempo() {
        assert_eq!(PlaybackSettings::clamp_tempo(10.0), MIN_TEMPO);
        assert_eq!(PlaybackSettings::clamp_tempo(500.0), MAX_TEMPO);
        assert_eq!(PlaybackSettings::clamp_tempo(120.0), 120.0);
        assert_eq!(PlaybackSettings::clamp_tempo(f64::NAN), DEFAULT_TEMPO);
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(PlaybackSettings::clamp_volume(-0.5), 0.0);
        assert_eq!(PlaybackSettings::clamp_volume(1.5), 1.0);
        assert_eq!(PlaybackSettings::clamp_volume(f32::NAN), 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: PlaybackSettings = serde_json::from_str(r#"{"looping": true}"#).unwrap();
        assert!(settings.looping);
        assert_eq!(settings.tempo_bpm, DEFAULT_TEMPO);

        let layout: LaneLayout = serde_json::from_str(r#"{"pixels_per_beat": 40}"#).unwrap();
        assert_eq!(layout.pixels_per_beat, 40.0);
        assert_eq!(layout.target_line_y, LaneLayout::default().target_line_y);
    }

    #[test]
    fn test_sanitized_layout() {
        let layout = LaneLayout {
            pixels_per_beat: 0.0,
            activation_tolerance: -5.0,
            ..LaneLayout::default()
        }
        .sanitized();
        assert_eq!(layout.pixels_per_beat, LaneLayout::default().pixels_per_beat);
        assert_eq!(layout.activation_tolerance, 0.0);

        let layout = LaneLayout {
            pixels_per_beat: f64::NAN,
            target_line_y: f64::INFINITY,
            ..LaneLayout::default()
        }
        .sanitized();
        assert_eq!(layout, LaneLayout::default());

        let custom = LaneLayout {
            pixels_per_beat: 40.0,
            ..LaneLayout::default()
        };
        assert_eq!(custom.sanitized(), custom);
    }

    #[test]
    fn test_lane_x_ascends_with_pitch() {
        let layout = LaneLayout::default();
        assert_eq!(layout.lane_x(StringId::LowSa), 40.0);
        assert_eq!(layout.lane_x(StringId::HighPa), 220.0);
    }
}
