//! # OCR Correction Table
//!
//! In accidental-heavy keys the recognizer tends to drop the `#` or `b` of a
//! chord label, producing chords that would be odd in that key (`A/C` in D
//! major, where the C is almost always a C#). This module holds a curated,
//! per-key list of such literal mistakes and their repaired spelling.
//!
//! The table is consulted by exact match on the label text after the original
//! key has been normalized; anything not listed is left alone. It is a record
//! of observed recognizer behavior, not a rule engine.

use crate::key::normalize_key;
use crate::parser::normalize_superscripts;

type Corrections = &'static [(&'static str, &'static str)];

/// Per original key: mis-recognized label -> corrected label
const OCR_CORRECTIONS: &[(&str, Corrections)] = &[
    // Sharp keys
    ("G", &[("Em/F", "Em/F#"), ("D/F", "D/F#")]),
    (
        "D",
        &[
            ("A/C", "A/C#"),
            ("D/F", "D/F#"),
            ("Bm/F", "Bm/F#"),
            ("E7/G", "E7/G#"),
            ("C/E", "C#/E"),
        ],
    ),
    (
        "A",
        &[
            ("A/C", "A/C#"),
            ("D/F", "D/F#"),
            ("E/G", "E/G#"),
            ("C#m/G", "C#m/G#"),
            ("C/E", "C#/E"),
            ("G/B", "G#/B"),
        ],
    ),
    (
        "E",
        &[
            ("E/G", "E/G#"),
            ("B/D", "B/D#"),
            ("A/C", "A/C#"),
            ("F#7/A", "F#7/A#"),
            ("C/E", "C#/E"),
            ("G/B", "G#/B"),
        ],
    ),
    (
        "B",
        &[
            ("B/D", "B/D#"),
            ("E/G", "E/G#"),
            ("F#/A", "F#/A#"),
            ("C#m/G", "C#m/G#"),
            ("C/E", "C#/E"),
        ],
    ),
    (
        "F#",
        &[
            ("F#/A", "F#/A#"),
            ("C#/E", "C#/E#"),
            ("B/D", "B/D#"),
            ("G/B", "G#/B"),
        ],
    ),
    ("C#", &[("F#/A", "F#/A#"), ("C#/E", "C#/E#"), ("G#/B", "G#/B#")]),
    // Flat keys
    ("Bb", &[("E/G", "Eb/G"), ("E/Bb", "Eb/Bb"), ("E/F", "Eb/F")]),
    (
        "Eb",
        &[
            ("E/G", "Eb/G"),
            ("A/C", "Ab/C"),
            ("E/Bb", "Eb/Bb"),
            ("A/Eb", "Ab/Eb"),
        ],
    ),
    (
        "Ab",
        &[
            ("A/C", "Ab/C"),
            ("D/F", "Db/F"),
            ("A/Eb", "Ab/Eb"),
            ("D/Ab", "Db/Ab"),
        ],
    ),
    (
        "Db",
        &[
            ("G/B", "Gb/Bb"),
            ("D/F", "Db/F"),
            ("G/Db", "Gb/Db"),
            ("C/F", "Cb/F"),
        ],
    ),
    (
        "Gb",
        &[
            ("G/B", "Gb/Bb"),
            ("C/E", "Cb/Eb"),
            ("G/Db", "Gb/Db"),
            ("C/Gb", "Cb/Gb"),
        ],
    ),
    ("Cb", &[("G/B", "Gb/Bb"), ("C/E", "Cb/Eb")]),
];

/// Registered correction for a label in a (normalized) key.
pub fn lookup_correction(key: &str, chord: &str) -> Option<&'static str> {
    OCR_CORRECTIONS
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, table)| table.iter().find(|(from, _)| *from == chord))
        .map(|(_, to)| *to)
}

/// Repair an accidental the recognizer likely dropped, based on the original key.
///
/// Parentheses around the label are kept. Labels or keys without a registered
/// correction come back trimmed but otherwise unchanged.
///
/// ```
/// use jianpu_transpose::correct_chord_by_key;
///
/// assert_eq!(correct_chord_by_key("A/C", "D"), "A/C#");
/// assert_eq!(correct_chord_by_key("(A/C)", "1=D"), "(A/C#)");
/// assert_eq!(correct_chord_by_key("A/C", "C"), "A/C");
/// ```
pub fn correct_chord_by_key(chord_text: &str, original_key: &str) -> String {
    let normalized = normalize_superscripts(chord_text.trim());
    let (inner, has_parentheses) = match normalized
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (inner, true),
        None => (normalized.as_str(), false),
    };

    let key = normalize_key(original_key);
    let corrected = match lookup_correction(&key, inner) {
        Some(replacement) => {
            log::debug!("OCR correction in {}: {} -> {}", key, inner, replacement);
            replacement
        }
        None => inner,
    };

    if has_parentheses {
        format!("({})", corrected)
    } else {
        corrected.to_string()
    }
}
