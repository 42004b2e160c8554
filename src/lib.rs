pub mod api;
pub mod chord;
pub mod config;
pub mod coords;
pub mod correction;
pub mod error;
pub mod key;
pub mod layout;
pub mod note;
pub mod parser;
pub mod recognition;
pub mod transpose;

pub use api::*;
pub use chord::Chord;
pub use config::TransposeConfig;
pub use coords::{AnchorPair, ImageSize, Observation, ResolvedLabel};
pub use correction::correct_chord_by_key;
pub use error::*;
pub use key::{key_index, normalize_key, normalize_key_common_errors, ALL_KEYS};
pub use layout::{DrawInstruction, EstimatedMetrics, KeyBanner, TextMeasure};
pub use note::{normalize_to_sharp, Note, Spelling};
pub use parser::parse_chord;
pub use recognition::RecognitionResult;
pub use transpose::{
    calculate_semitones, correct_unreasonable_chord, transpose_chord, transpose_chords,
    transpose_chords_by_semitones, ChordPair, TransposeResult,
};

/// Transpose a single chord label between two keys and render it in the
/// target key's spelling. Returns `Ok(None)` when the label is not a chord.
///
/// ```
/// use jianpu_transpose::transpose_label;
///
/// assert_eq!(transpose_label("D/F#", "D", "Bb")?, Some("Bb/D".to_string()));
/// assert_eq!(transpose_label("Fine.", "D", "Bb")?, None);
/// # Ok::<(), jianpu_transpose::TransposeError>(())
/// ```
pub fn transpose_label(
    label: &str,
    original_key: &str,
    target_key: &str,
) -> Result<Option<String>, TransposeError> {
    let Some(chord) = parse_chord(&correct_chord_by_key(label, original_key)) else {
        return Ok(None);
    };
    let result = transpose_chords(&[chord], original_key, target_key)?;
    Ok(result.transposed_labels().into_iter().next())
}
