//! # Chord Label Parser
//!
//! Turns recognizer text such as `F#m7`, `#C`, `(D/F#)`, `A⁷sus⁴` or
//! `CD.S.al.Fine.` into a [`Chord`]. The parser is deliberately permissive:
//! the accidental may come before or after the letter, the quality suffix is
//! free text, and anything that does not look like a chord yields `None`
//! instead of an error, since the recognizer routinely reports lyrics, time
//! signatures and repeat marks alongside the chords.
//!
//! ## Pipeline
//! 1. superscript digits -> ASCII digits
//! 2. strip a trailing repeat/ending mark (`Fine.`, `D.S.al.Fine.`, ...)
//! 3. strip one layer of enclosing parentheses, then any mark inside them
//! 4. match `[acc]Letter[acc]quality[/[acc]Letter[acc]]`
//!
//! A leading `b` is a flat only in front of an upper-case letter, so `bE` is
//! E-flat while `badd9` is B with quality `add9`.

use crate::chord::Chord;
use crate::note::Note;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CHORD_RE: Regex =
        Regex::new(concat!(
            r"^(?:(b)([A-G])|(#?)([A-Ga-g]))([#b]?)",
            r"([A-Za-z0-9]*)",
            r"(?:/(?:(b)([A-G])|(#?)([A-Ga-g]))([#b]?))?$",
        ))
        .expect("chord pattern is valid");
}

/// Repeat and ending marks that get glued to the preceding chord label,
/// written without dots or spaces. Longer marks come first so that
/// `D.S.al.Fine.` is not cut down to `D.S.al.`.
const TRAILING_MARKS: [&str; 9] = [
    "DSalFine", "DCalFine", "DSalCoda", "DCalCoda", "ToCoda", "Fine", "Coda", "DS", "DC",
];

/// Quality spellings folded onto a shorter canonical form
const QUALITY_SYNONYMS: [(&str, &str); 1] = [("min", "m")];

/// Replace superscript digits with ASCII digits.
pub fn normalize_superscripts(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '⁰' => '0',
            '¹' => '1',
            '²' => '2',
            '³' => '3',
            '⁴' => '4',
            '⁵' => '5',
            '⁶' => '6',
            '⁷' => '7',
            '⁸' => '8',
            '⁹' => '9',
            '♯' => '#',
            '♭' => 'b',
            other => other,
        })
        .collect()
}

/// Remove one trailing repeat/ending mark.
fn strip_trailing_mark(text: &str) -> &str {
    for mark in TRAILING_MARKS {
        if let Some(start) = find_mark_start(text, mark) {
            return text[..start].trim_end();
        }
    }
    text
}

/// Byte offset at which `text` ends with `mark`, comparing case-insensitively
/// and skipping dots and whitespace in `text`.
fn find_mark_start(text: &str, mark: &str) -> Option<usize> {
    let mut expected = mark.chars().rev().peekable();
    for (offset, c) in text.char_indices().rev() {
        if c.is_whitespace() || c == '.' {
            continue;
        }
        match expected.next() {
            Some(m) if m.eq_ignore_ascii_case(&c) => {}
            _ => return None,
        }
        if expected.peek().is_none() {
            return Some(offset);
        }
    }
    None
}

fn normalize_quality(raw: &str) -> String {
    let lower = raw.to_lowercase();
    for (synonym, canonical) in QUALITY_SYNONYMS {
        if let Some(rest) = lower.strip_prefix(synonym) {
            // "min7" -> "m7", but leave "minmaj7"-style words alone
            if rest.chars().all(|c| !c.is_ascii_alphabetic()) {
                return format!("{}{}", canonical, rest);
            }
        }
    }
    lower
}

fn note_from_parts(front: &str, letter: &str, back: &str) -> Option<Note> {
    // A leading accidental wins over a trailing one
    let accidental = if front.is_empty() { back } else { front };
    Note::parse(&format!("{}{}", letter.to_ascii_uppercase(), accidental))
}

/// Parse a chord label.
///
/// Returns `None` for text that is not a chord (including text that is only
/// a repeat mark).
///
/// # Examples
/// ```
/// use jianpu_transpose::{parse_chord, Note};
///
/// let chord = parse_chord("F#m7").unwrap();
/// assert_eq!(chord.root, Note::FSharp);
/// assert_eq!(chord.quality, "m7");
/// assert_eq!(chord.bass, None);
///
/// let chord = parse_chord("(bE/G)").unwrap();
/// assert_eq!(chord.root, Note::DSharp);
/// assert_eq!(chord.bass, Some(Note::G));
/// assert!(chord.has_parentheses);
///
/// assert_eq!(parse_chord("CD.S.al.Fine.").unwrap().root, Note::C);
/// assert!(parse_chord("Fine.").is_none());
/// assert!(parse_chord("4/4").is_none());
/// ```
pub fn parse_chord(text: &str) -> Option<Chord> {
    let normalized = normalize_superscripts(text.trim());
    let stripped = strip_trailing_mark(&normalized);
    if stripped.is_empty() {
        return None;
    }

    let (body, has_parentheses) = match stripped.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (strip_trailing_mark(inner.trim()), true),
        None => (stripped, false),
    };
    if body.is_empty() {
        return None;
    }

    let caps = CHORD_RE.captures(body)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    // Groups from `first`: leading flat, upper-case letter, leading sharp, letter, trailing accidental
    let note_at = |first: usize| {
        if group(first + 1).is_empty() {
            note_from_parts(group(first + 2), group(first + 3), group(first + 4))
        } else {
            note_from_parts(group(first), group(first + 1), group(first + 4))
        }
    };

    let root = note_at(1)?;
    let bass = if group(8).is_empty() && group(10).is_empty() {
        None
    } else {
        Some(note_at(7)?)
    };

    Some(Chord {
        root,
        quality: normalize_quality(group(6)),
        bass,
        has_parentheses,
        x: None,
        y: None,
    })
}
