//! # Key Labels
//!
//! Key labels arrive from two places: the user's selection and the recognizer,
//! which reports the key printed on the sheet as `1=D`, `Key: F`, or a bare
//! note name. Recognizer output carries systematic slips (`CC#`, `bB`, an
//! upper-cased `BB`), so every label goes through [`normalize_key`] before it
//! is used for a table lookup or for semitone arithmetic.

use crate::error::TransposeError;
use crate::note::Note;

/// The twelve selectable keys in display spelling.
pub const ALL_KEYS: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Prefixes the recognizer puts in front of the key letter (compared case-insensitively)
const KEY_PREFIXES: [&str; 2] = ["1=", "key:"];

/// Normalize a key label to `<Letter>[#|b]` form.
///
/// Strips `1=` and `Key:` prefixes, whitespace and a trailing `调`, then
/// applies [`normalize_key_common_errors`].
///
/// ```
/// use jianpu_transpose::normalize_key;
///
/// assert_eq!(normalize_key("1=D"), "D");
/// assert_eq!(normalize_key(" Key: Bb "), "Bb");
/// assert_eq!(normalize_key("1 = bE"), "Eb");
/// assert_eq!(normalize_key("G调"), "G");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut label = compact.as_str();

    for prefix in KEY_PREFIXES {
        if label.len() >= prefix.len()
            && label.is_char_boundary(prefix.len())
            && label[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            label = &label[prefix.len()..];
            break;
        }
    }
    let label = label.strip_suffix('调').unwrap_or(label);

    normalize_key_common_errors(label)
}

/// Repair recognizer slips in a key label that has no prefix left.
///
/// - doubled letter before an accidental: `CC#` -> `C#`
/// - accidental in front of the letter: `bB` -> `Bb`, `#F` -> `F#`
/// - Unicode accidentals: `F♯` -> `F#`
/// - casing: `bb` -> `Bb`, `EB` -> `Eb`, `f#` -> `F#`
///
/// ```
/// use jianpu_transpose::normalize_key_common_errors;
///
/// assert_eq!(normalize_key_common_errors("CC#"), "C#");
/// assert_eq!(normalize_key_common_errors("bB"), "Bb");
/// assert_eq!(normalize_key_common_errors("EB"), "Eb");
/// ```
pub fn normalize_key_common_errors(label: &str) -> String {
    let mut chars: Vec<char> = label
        .chars()
        .map(|c| match c {
            '♯' => '#',
            '♭' => 'b',
            other => other,
        })
        .collect();

    // CC# -> C#
    if chars.len() == 3
        && is_letter(chars[0])
        && chars[0].eq_ignore_ascii_case(&chars[1])
        && matches!(chars[2], '#' | 'b')
    {
        chars.remove(1);
    }

    // #F -> F#, bB -> Bb
    if chars.len() == 2 && is_letter(chars[1]) {
        let leading = chars[0] == '#' || (chars[0] == 'b' && chars[1].is_ascii_uppercase());
        if leading {
            chars.swap(0, 1);
        }
    }

    if let Some(first) = chars.first_mut() {
        if is_letter(*first) {
            *first = first.to_ascii_uppercase();
        }
    }
    if chars.len() >= 2 && is_letter(chars[0]) && matches!(chars[1], 'b' | 'B') {
        chars[1] = 'b';
    }

    chars.into_iter().collect()
}

/// Chromatic index of a key label, if it names one of the 12 pitch classes.
///
/// ```
/// use jianpu_transpose::key_index;
///
/// assert_eq!(key_index("C"), Some(0));
/// assert_eq!(key_index("Db"), Some(1));
/// assert_eq!(key_index("1=A"), Some(9));
/// assert_eq!(key_index("H"), None);
/// ```
pub fn key_index(label: &str) -> Option<u8> {
    Note::parse(&normalize_key(label)).map(Note::index)
}

/// Resolve a key label to its tonic, failing loudly on unknown labels.
pub fn resolve_key(label: &str) -> Result<Note, TransposeError> {
    let normalized = normalize_key(label);
    Note::parse(&normalized).ok_or_else(|| TransposeError::InvalidKey {
        key: label.to_string(),
        normalized,
    })
}

fn is_letter(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A'..='G')
}
