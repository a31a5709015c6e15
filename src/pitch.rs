/// Row alphabet of the piano roll, top row first.
pub const PITCH_NAMES: [&str; 7] = ["C", "D", "E", "F", "G", "A", "B"];

/// Fundamental frequencies for two octaves, C4 to B5.
/// The upper octave carries a `2` suffix.
pub const NOTE_FREQUENCIES: [(&str, f32); 24] = [
    ("C", 261.63),
    ("C#", 277.18),
    ("D", 293.66),
    ("D#", 311.13),
    ("E", 329.63),
    ("F", 349.23),
    ("F#", 369.99),
    ("G", 392.00),
    ("G#", 415.30),
    ("A", 440.00),
    ("A#", 466.16),
    ("B", 493.88),
    ("C2", 523.25),
    ("C#2", 554.37),
    ("D2", 587.33),
    ("D#2", 622.25),
    ("E2", 659.26),
    ("F2", 698.46),
    ("F#2", 739.99),
    ("G2", 783.99),
    ("G#2", 830.61),
    ("A2", 880.00),
    ("A#2", 932.33),
    ("B2", 987.77),
];

/// Looks up the frequency of a pitch symbol, `None` if it is not in the table.
pub fn frequency_of(pitch: &str) -> Option<f32> {
    NOTE_FREQUENCIES
        .iter()
        .find(|(name, _)| *name == pitch)
        .map(|&(_, freq)| freq)
}

/// Maps a row index to its pitch symbol.
pub fn pitch_for_row(row: usize) -> Option<&'static str> {
    PITCH_NAMES.get(row).copied()
}
