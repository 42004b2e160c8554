//! # Notes and Enharmonic Spelling
//!
//! All pitch arithmetic happens on the 12 pitch classes of the chromatic scale,
//! indexed 0-11 from C. Internally a note is always one of the 12 canonical
//! sharp spellings; whether `A#` is shown as `Bb` is decided when the chord is
//! rendered, based on the target key.
//!
//! ## Key Types
//! - [`Note`] - one of the 12 pitch classes
//! - [`Spelling`] - sharp or flat display spelling
//!
//! ## Related Modules
//! - `key` - resolves key labels to notes and decides the spelling of a key
//! - `transpose` - shifts notes along the chromatic index

use serde::{Serialize, Serializer};
use std::fmt;

/// The 12 canonical note names in sharp spelling, index = pitch class.
pub const CHROMATIC_SCALE: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Sharp spelling -> flat spelling for the five black keys.
pub const ENHARMONIC_PAIRS: [(&str, &str); 5] = [
    ("C#", "Db"),
    ("D#", "Eb"),
    ("F#", "Gb"),
    ("G#", "Ab"),
    ("A#", "Bb"),
];

/// Spellings that name a white key with an accidental (E# = F, Cb = B, ...)
const EXTREME_SPELLINGS: [(&str, &str); 4] = [("E#", "F"), ("B#", "C"), ("Fb", "E"), ("Cb", "B")];

/// Keys that are conventionally written with flats.
pub const FLAT_KEYS: [&str; 7] = ["F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];

/// A pitch class of the chromatic scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Note {
    #[default]
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::CSharp,
        Note::D,
        Note::DSharp,
        Note::E,
        Note::F,
        Note::FSharp,
        Note::G,
        Note::GSharp,
        Note::A,
        Note::ASharp,
        Note::B,
    ];

    /// Chromatic index (C = 0, B = 11)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Note at a chromatic index, wrapping modulo 12
    pub fn from_index(index: i32) -> Note {
        Note::ALL[index.rem_euclid(12) as usize]
    }

    /// Canonical sharp name ("C", "C#", ...)
    pub fn name(self) -> &'static str {
        CHROMATIC_SCALE[self.index() as usize]
    }

    /// Flat name for black keys, the plain name otherwise
    pub fn flat_name(self) -> &'static str {
        let sharp = self.name();
        ENHARMONIC_PAIRS
            .iter()
            .find(|(s, _)| *s == sharp)
            .map(|(_, flat)| *flat)
            .unwrap_or(sharp)
    }

    /// Name in the requested spelling
    pub fn spelled(self, spelling: Spelling) -> &'static str {
        match spelling {
            Spelling::Sharp => self.name(),
            Spelling::Flat => self.flat_name(),
        }
    }

    /// Exact lookup of a canonical sharp name
    pub fn from_name(name: &str) -> Option<Note> {
        CHROMATIC_SCALE
            .iter()
            .position(|n| *n == name)
            .map(|i| Note::ALL[i])
    }

    /// Lenient lookup: accepts flats, leading accidentals and extreme spellings.
    ///
    /// ```
    /// use jianpu_transpose::Note;
    ///
    /// assert_eq!(Note::parse("Bb"), Some(Note::ASharp));
    /// assert_eq!(Note::parse("#F"), Some(Note::FSharp));
    /// assert_eq!(Note::parse("Cb"), Some(Note::B));
    /// assert_eq!(Note::parse("H"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Note> {
        Note::from_name(&normalize_to_sharp(text))
    }

    /// Shift by a signed number of semitones
    pub fn shift(self, semitones: i32) -> Note {
        Note::from_index(self.index() as i32 + semitones.rem_euclid(12))
    }

    /// Upward interval from `self` to `other` in semitones (0-11)
    pub fn interval_to(self, other: Note) -> u8 {
        (other.index() as i32 - self.index() as i32).rem_euclid(12) as u8
    }

    /// Shortest distance around the chromatic circle (0-6)
    pub fn circular_distance(self, other: Note) -> u8 {
        let up = self.interval_to(other);
        up.min(12 - up)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Note {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Sharp or flat display spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Spelling {
    #[default]
    Sharp,
    Flat,
}

impl Spelling {
    /// Spelling used by a key label: flats for F, Bb, Eb, Ab, Db, Gb and Cb.
    ///
    /// ```
    /// use jianpu_transpose::Spelling;
    ///
    /// assert_eq!(Spelling::for_key("Bb"), Spelling::Flat);
    /// assert_eq!(Spelling::for_key("1=Eb"), Spelling::Flat);
    /// assert_eq!(Spelling::for_key("G"), Spelling::Sharp);
    /// assert_eq!(Spelling::for_key("A#"), Spelling::Sharp);
    /// ```
    pub fn for_key(key: &str) -> Spelling {
        let label = crate::key::normalize_key(key);
        if FLAT_KEYS.contains(&label.as_str()) {
            Spelling::Flat
        } else {
            Spelling::Sharp
        }
    }
}

/// Convert a note spelling to its canonical sharp name.
///
/// Accepts the accidental before or after the letter (`#F`, `F#`), maps
/// extreme spellings to the natural note (`E#` -> `F`, `Cb` -> `B`) and flats
/// to their sharp equivalent. Unrecognized input is returned unchanged.
///
/// ```
/// use jianpu_transpose::normalize_to_sharp;
///
/// assert_eq!(normalize_to_sharp("Eb"), "D#");
/// assert_eq!(normalize_to_sharp("bE"), "D#");
/// assert_eq!(normalize_to_sharp("E#"), "F");
/// assert_eq!(normalize_to_sharp("G"), "G");
/// assert_eq!(normalize_to_sharp("X7"), "X7");
/// ```
pub fn normalize_to_sharp(note: &str) -> String {
    let cleaned: String = note.trim().replace('♯', "#").replace('♭', "b");
    let spelled = match reorder_accidental(&cleaned) {
        Some(s) => s,
        None => return note.to_string(),
    };

    if let Some((_, natural)) = EXTREME_SPELLINGS.iter().find(|(s, _)| *s == spelled) {
        return natural.to_string();
    }
    if CHROMATIC_SCALE.contains(&spelled.as_str()) {
        return spelled;
    }
    if let Some((sharp, _)) = ENHARMONIC_PAIRS.iter().find(|(_, flat)| *flat == spelled) {
        return sharp.to_string();
    }
    note.to_string()
}

/// Bring a one- or two-character spelling into `<Letter><accidental>` form.
fn reorder_accidental(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    match chars.as_slice() {
        [letter] if is_note_letter(*letter) => Some(letter.to_ascii_uppercase().to_string()),
        // '#' is never a letter, 'b' only counts as a leading flat before an upper-case letter
        ['#', letter] if is_note_letter(*letter) => {
            Some(format!("{}#", letter.to_ascii_uppercase()))
        }
        ['b', letter] if letter.is_ascii_uppercase() && is_note_letter(*letter) => {
            Some(format!("{}b", letter))
        }
        [letter, acc @ ('#' | 'b')] if is_note_letter(*letter) => {
            Some(format!("{}{}", letter.to_ascii_uppercase(), acc))
        }
        _ => None,
    }
}

fn is_note_letter(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A'..='G')
}
