//! Tempo to wall-clock conversions.

use crate::pitch::WesternNote;
use std::time::Duration;
use thiserror::Error;

/// Milliseconds in one minute.
const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ClockError {
    #[error("invalid tempo {0} BPM: tempo must be a positive number")]
    InvalidTempo(f64),
}

/// Rejects tempos that would produce infinite or negative durations.
pub fn validate_tempo(tempo_bpm: f64) -> Result<f64, ClockError> {
    if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
        Ok(tempo_bpm)
    } else {
        Err(ClockError::InvalidTempo(tempo_bpm))
    }
}

/// Length of one beat in milliseconds.
///
/// # Examples
///
/// ```
/// use sthana::playback::beat_duration_ms;
///
/// assert_eq!(beat_duration_ms(120.0).unwrap(), 500.0);
/// assert!(beat_duration_ms(0.0).is_err());
/// ```
pub fn beat_duration_ms(tempo_bpm: f64) -> Result<f64, ClockError> {
    Ok(MS_PER_MINUTE / validate_tempo(tempo_bpm)?)
}

/// How long a note stays current at the given tempo, in milliseconds.
pub fn note_duration_ms(note: &WesternNote, tempo_bpm: f64) -> Result<f64, ClockError> {
    Ok(note.duration_beats * beat_duration_ms(tempo_bpm)?)
}

/// Beats covered by `elapsed` wall-clock time.
pub fn elapsed_beats(tempo_bpm: f64, elapsed: Duration) -> Result<f64, ClockError> {
    Ok(elapsed.as_secs_f64() * 1000.0 / beat_duration_ms(tempo_bpm)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_duration_scenarios() {
        let note: WesternNote = "D4".parse().unwrap();
        assert_eq!(note_duration_ms(&note, 120.0).unwrap(), 500.0);
        assert_eq!(note_duration_ms(&note, 60.0).unwrap(), 1000.0);

        let half: WesternNote = "D4:0.5".parse().unwrap();
        assert_eq!(note_duration_ms(&half, 60.0).unwrap(), 500.0);
    }

    #[test]
    fn test_rejects_non_positive_tempo() {
        for tempo in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                beat_duration_ms(tempo),
                Err(ClockError::InvalidTempo(_))
            ));
        }
    }

    #[test]
    fn test_elapsed_beats() {
        let beats = elapsed_beats(120.0, Duration::from_millis(250)).unwrap();
        assert!((beats - 0.5).abs() < 1e-9);
    }
}
