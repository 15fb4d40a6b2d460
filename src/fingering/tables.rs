//! Canonical tuning and position tables.
//!
//! The instrument is tuned Sa-Pa-Sa-Pa with Sa = D: D3, A3, D4, A4.
//! Each table is indexed by semitone offset from the open string and holds
//! the swara label (relative to Sa = D) and the finger that stops it.
//! A leading `.` marks the lower octave, a trailing `'` the upper octave.

/// One stoppable position on a string: (label, finger).
pub type PositionEntry = (&'static str, u8);

/// Open-string pitches, lowest string first.
pub const OPEN_STRING_PITCHES: [i64; 4] = [50, 57, 62, 69];

pub const LOW_SA_POSITIONS: [PositionEntry; 8] = [
    (".Sa", 0),
    (".Ri1", 1),
    (".Ri2", 1),
    (".Ga2", 2),
    (".Ga3", 2),
    (".Ma1", 3),
    (".Ma2", 3),
    (".Pa", 4),
];

pub const LOW_PA_POSITIONS: [PositionEntry; 8] = [
    (".Pa", 0),
    (".Da1", 1),
    (".Da2", 1),
    (".Ni2", 2),
    (".Ni3", 2),
    ("Sa", 3),
    ("Ri1", 3),
    ("Ri2", 4),
];

pub const HIGH_SA_POSITIONS: [PositionEntry; 8] = [
    ("Sa", 0),
    ("Ri1", 1),
    ("Ri2", 1),
    ("Ga2", 2),
    ("Ga3", 2),
    ("Ma1", 3),
    ("Ma2", 3),
    ("Pa", 4),
];

/// The top string extends into third position (offsets 8..=12).
pub const HIGH_PA_POSITIONS: [PositionEntry; 13] = [
    ("Pa", 0),
    ("Da1", 1),
    ("Da2", 1),
    ("Ni2", 2),
    ("Ni3", 2),
    ("Sa'", 3),
    ("Ri1'", 3),
    ("Ri2'", 4),
    ("Ga2'", 2),
    ("Ga3'", 3),
    ("Ma1'", 3),
    ("Ma2'", 4),
    ("Pa'", 4),
];
