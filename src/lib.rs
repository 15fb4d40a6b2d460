//! sthana - Carnatic violin fingering and tempo-synced playback.
//!
//! This library maps Western note names to positions on a violin tuned
//! Sa-Pa-Sa-Pa (D3 A3 D4 A4) and drives a scrolling playback scheduler that
//! voices each note as it crosses the target line.

pub mod app;
pub mod audio;
pub mod config;
pub mod fingering;
pub mod pitch;
pub mod playback;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{AudioBackend, AudioEngine, AudioError, SilentBackend};
pub use config::{LaneLayout, PlaybackSettings};
pub use fingering::{map_score, resolve, CarnaticPosition, ResolvedNote, StringId};
pub use pitch::{parse_sequence, AbsolutePitch, NoteName, PitchError, WesternNote};
pub use playback::{PlaybackController, PlaybackCursor, PlaybackError, PlaybackState};
