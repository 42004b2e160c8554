//! # Chord Model
//!
//! A chord label as it appears over the staff: root, an open-ended quality
//! string, an optional slash bass, and whether the label was printed in
//! parentheses. `root` and `bass` are [`Note`]s, so they can only ever hold
//! one of the 12 canonical pitch classes; sharp or flat spelling is chosen
//! when the chord is turned back into text.
//!
//! ```text
//! "(F#m7/C#)"
//!   ├── root: F#
//!   ├── quality: "m7"
//!   ├── bass: Some(C#)
//!   └── has_parentheses: true
//! ```

use crate::note::{Note, Spelling};
use serde::Serialize;
use std::fmt;

/// A parsed chord label with an optional image position
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub root: Note,
    /// Free-form quality suffix: "", "m", "maj7", "7sus4", "add9", ...
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass: Option<Note>,
    pub has_parentheses: bool,
    /// Horizontal position in percent of the image width (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical position in percent of the image height (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Chord {
    /// Chord without bass or position
    pub fn new(root: Note, quality: impl Into<String>) -> Self {
        Self {
            root,
            quality: quality.into(),
            ..Default::default()
        }
    }

    /// Same chord with a slash bass
    pub fn with_bass(mut self, bass: Note) -> Self {
        self.bass = Some(bass);
        self
    }

    /// Same chord placed at an image position (percent)
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Upward interval from root to bass (0-11), if the chord has a bass
    pub fn bass_interval(&self) -> Option<u8> {
        self.bass.map(|bass| self.root.interval_to(bass))
    }

    /// Render the chord label in the given spelling.
    ///
    /// ```
    /// use jianpu_transpose::{Chord, Note, Spelling};
    ///
    /// let chord = Chord::new(Note::ASharp, "m7").with_bass(Note::DSharp);
    /// assert_eq!(chord.to_text(Spelling::Sharp), "A#m7/D#");
    /// assert_eq!(chord.to_text(Spelling::Flat), "Bbm7/Eb");
    /// ```
    pub fn to_text(&self, spelling: Spelling) -> String {
        let mut text = String::from(self.root.spelled(spelling));
        text.push_str(&self.quality);
        if let Some(bass) = self.bass {
            text.push('/');
            text.push_str(bass.spelled(spelling));
        }
        if self.has_parentheses {
            text = format!("({})", text);
        }
        text
    }
}

/// Renders in canonical sharp spelling
impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(Spelling::Sharp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_chord_text() {
        assert_eq!(Chord::new(Note::C, "").to_string(), "C");
        assert_eq!(Chord::new(Note::G, "7sus4").to_string(), "G7sus4");
    }

    #[test]
    fn test_parenthesized_slash_chord() {
        let chord = Chord {
            has_parentheses: true,
            ..Chord::new(Note::D, "").with_bass(Note::FSharp)
        };
        assert_eq!(chord.to_text(Spelling::Sharp), "(D/F#)");
        assert_eq!(chord.to_text(Spelling::Flat), "(D/Gb)");
    }

    #[test]
    fn test_bass_interval() {
        let chord = Chord::new(Note::C, "").with_bass(Note::E);
        assert_eq!(chord.bass_interval(), Some(4));
        assert_eq!(Chord::new(Note::C, "").bass_interval(), None);
    }
}
