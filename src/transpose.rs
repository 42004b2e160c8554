//! # Transposition Engine
//!
//! Shifts parsed chords by a number of semitones, decides how the result is
//! spelled, and repairs slash chords whose bass ends up a minor second above
//! the root.
//!
//! ## Spelling
//! Notes stay canonical (sharp) inside [`Chord`]; the [`TransposeResult`]
//! carries the [`Spelling`] of the target key, which is applied when the
//! chords are rendered back to text. Flat keys are F, Bb, Eb, Ab, Db, Gb, Cb.
//!
//! ## Unreasonable intervals
//! A bass exactly one semitone above the root (`G/G#`) is treated as a
//! transposition artifact. The corrector picks the closest bass among the
//! common slash intervals (major second, major third, perfect fourth, perfect
//! fifth) and falls back to any other acceptable interval. This is the only
//! interval rejected: minor thirds, tritones and so on are left as they are.
//!
//! ## Example
//! ```rust
//! use jianpu_transpose::{parse_chord, transpose_chords};
//!
//! let chords = vec![parse_chord("C").unwrap(), parse_chord("Am7").unwrap()];
//! let result = transpose_chords(&chords, "C", "G")?;
//!
//! assert_eq!(result.semitones, 7);
//! assert_eq!(result.transposed_labels(), vec!["G", "Em7"]);
//! # Ok::<(), jianpu_transpose::TransposeError>(())
//! ```

use crate::chord::Chord;
use crate::error::TransposeError;
use crate::key::{normalize_key, resolve_key};
use crate::note::{Note, Spelling};
use serde::Serialize;

/// Root-to-bass intervals that never make sense as a slash chord
const UNREASONABLE_INTERVALS: [u8; 1] = [1];

/// Root-to-bass intervals preferred when repairing a bass
const PREFERRED_INTERVALS: [u8; 4] = [2, 4, 5, 7];

/// A chord before and after transposition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordPair {
    pub original: Chord,
    pub transposed: Chord,
}

/// Outcome of transposing a list of chords
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransposeResult {
    pub original_key: String,
    pub target_key: String,
    /// Key-to-key delta (0-11) or the signed shift the caller asked for
    pub semitones: i32,
    /// Display spelling of the target key
    pub spelling: Spelling,
    /// Same order as the input chords
    pub chords: Vec<ChordPair>,
}

impl TransposeResult {
    /// Transposed chords rendered in the target key's spelling
    pub fn transposed_labels(&self) -> Vec<String> {
        self.chords
            .iter()
            .map(|pair| pair.transposed.to_text(self.spelling))
            .collect()
    }

    /// Original chords rendered in the original key's spelling
    pub fn original_labels(&self) -> Vec<String> {
        let spelling = Spelling::for_key(&self.original_key);
        self.chords
            .iter()
            .map(|pair| pair.original.to_text(spelling))
            .collect()
    }
}

/// Semitones from one key up to another (0-11).
///
/// Fails when either label does not name one of the 12 pitch classes.
///
/// ```
/// use jianpu_transpose::calculate_semitones;
///
/// assert_eq!(calculate_semitones("C", "G").unwrap(), 7);
/// assert_eq!(calculate_semitones("G", "C").unwrap(), 5);
/// assert_eq!(calculate_semitones("1=D", "Bb").unwrap(), 8);
/// assert!(calculate_semitones("C", "H").is_err());
/// ```
pub fn calculate_semitones(from_key: &str, to_key: &str) -> Result<i32, TransposeError> {
    let from = resolve_key(from_key)?;
    let to = resolve_key(to_key)?;
    Ok(from.interval_to(to) as i32)
}

/// Shift root and bass by the same number of semitones.
///
/// Quality, parentheses and position are carried over unchanged.
pub fn transpose_chord(chord: &Chord, semitones: i32) -> Chord {
    Chord {
        root: chord.root.shift(semitones),
        bass: chord.bass.map(|bass| bass.shift(semitones)),
        ..chord.clone()
    }
}

/// Whether the chord's bass sits at a rejected interval above its root
pub fn is_unreasonable_chord(chord: &Chord) -> bool {
    chord
        .bass_interval()
        .is_some_and(|interval| UNREASONABLE_INTERVALS.contains(&interval))
}

/// Replace an unreasonable bass with the nearest acceptable one.
///
/// Candidates with a preferred interval (2, 4, 5, 7) win over the rest; within
/// a tier the candidate closest to the original bass on the chromatic circle
/// wins, ties going to the lower chromatic index. If no candidate is
/// acceptable the bass is dropped.
///
/// ```
/// use jianpu_transpose::{correct_unreasonable_chord, Chord, Note};
///
/// // G/G# -> G/A (major second, one semitone away)
/// let chord = Chord::new(Note::G, "").with_bass(Note::GSharp);
/// assert_eq!(correct_unreasonable_chord(chord).bass, Some(Note::A));
/// ```
pub fn correct_unreasonable_chord(chord: Chord) -> Chord {
    if !is_unreasonable_chord(&chord) {
        return chord;
    }
    let Some(original_bass) = chord.bass else {
        return chord;
    };

    // (preferred, distance) ordered so that the smallest key wins
    let best = Note::ALL
        .iter()
        .copied()
        .filter(|candidate| {
            let interval = chord.root.interval_to(*candidate);
            !UNREASONABLE_INTERVALS.contains(&interval)
        })
        .min_by_key(|candidate| {
            let preferred = PREFERRED_INTERVALS.contains(&chord.root.interval_to(*candidate));
            (!preferred, original_bass.circular_distance(*candidate))
        });

    match best {
        Some(bass) => log::debug!(
            "Corrected bass of {}: {} -> {}",
            chord,
            original_bass,
            bass
        ),
        None => log::debug!("Dropped unreasonable bass of {}", chord),
    }

    Chord { bass: best, ..chord }
}

fn transpose_all(chords: &[Chord], semitones: i32) -> Vec<ChordPair> {
    chords
        .iter()
        .map(|chord| ChordPair {
            original: chord.clone(),
            transposed: correct_unreasonable_chord(transpose_chord(chord, semitones)),
        })
        .collect()
}

/// Transpose chords from one key to another.
///
/// The shift is the upward distance between the keys (0-11). Spelling follows
/// the target key label: `Bb` spells flats, `A#` spells sharps.
pub fn transpose_chords(
    chords: &[Chord],
    original_key: &str,
    target_key: &str,
) -> Result<TransposeResult, TransposeError> {
    let semitones = calculate_semitones(original_key, target_key)?;
    let spelling = Spelling::for_key(target_key);

    Ok(TransposeResult {
        original_key: original_key.to_string(),
        target_key: target_key.to_string(),
        semitones,
        spelling,
        chords: transpose_all(chords, semitones),
    })
}

/// Transpose chords by a signed number of semitones.
///
/// The target key is derived from the original key by the same shift and named
/// in flat spelling for black keys (`Db`, `Eb`, `Gb`, `Ab`, `Bb`). A caller that
/// already committed to a display label passes it as `explicit_target_key`; it
/// then names the target key and decides the spelling.
///
/// ```
/// use jianpu_transpose::{parse_chord, transpose_chords_by_semitones};
///
/// let chords = vec![parse_chord("D/F#").unwrap()];
/// let result = transpose_chords_by_semitones(&chords, "D", -2, None)?;
/// assert_eq!(result.target_key, "C");
/// assert_eq!(result.transposed_labels(), vec!["C/E"]);
///
/// let result = transpose_chords_by_semitones(&chords, "D", 4, Some("F#"))?;
/// assert_eq!(result.target_key, "F#");
/// assert_eq!(result.transposed_labels(), vec!["F#/A#"]);
/// # Ok::<(), jianpu_transpose::TransposeError>(())
/// ```
pub fn transpose_chords_by_semitones(
    chords: &[Chord],
    original_key: &str,
    semitones: i32,
    explicit_target_key: Option<&str>,
) -> Result<TransposeResult, TransposeError> {
    let tonic = resolve_key(original_key)?;
    let target_key = match explicit_target_key {
        Some(label) => normalize_key(label),
        None => tonic.shift(semitones).flat_name().to_string(),
    };
    let spelling = Spelling::for_key(&target_key);

    Ok(TransposeResult {
        original_key: original_key.to_string(),
        target_key,
        semitones,
        spelling,
        chords: transpose_all(chords, semitones),
    })
}
