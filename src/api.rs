//! # Public API
//!
//! End-to-end entry points used by the request layer and the CLI.
//!
//! ## Pipeline
//! 1. [`process_recognition()`] - recognizer output to transposed, positioned chords
//!    - resolve the original key (declared, then recognized, then configured default)
//!    - resolve chord positions ([`crate::coords::resolve_positions`])
//!    - repair known OCR slips and parse each label, skipping non-chords
//!    - transpose by semitones or to a target key
//! 2. [`render_instructions()`] - positioned chords to draw instructions
//!
//! ## Typical Usage
//!
//! ```rust
//! use jianpu_transpose::{
//!     process_recognition, render_instructions, EstimatedMetrics, ImageSize, RecognitionResult,
//!     TransposeConfig, TransposeRequest, TransposeTarget,
//! };
//!
//! let recognition = RecognitionResult::from_json(
//!     r#"{"key": "1=C", "centers": [
//!         {"text": "C",  "cx": 100, "cy": 200},
//!         {"text": "Am", "cx": 400, "cy": 200}
//!     ]}"#,
//! )?;
//! let request = TransposeRequest {
//!     original_key: None,
//!     target: TransposeTarget::Key("G".to_string()),
//!     anchors: None,
//!     image: ImageSize::new(1000.0, 1000.0),
//! };
//! let config = TransposeConfig::default();
//!
//! let outcome = process_recognition(&recognition, &request, &config)?;
//! assert_eq!(outcome.original_key, "C");
//! assert_eq!(outcome.chords[1].transposed, "Em");
//! assert_eq!((outcome.chords[1].x, outcome.chords[1].y), (40.0, 20.0));
//!
//! let annotation = render_instructions(
//!     &outcome,
//!     ImageSize::new(1200.0, 1600.0),
//!     &EstimatedMetrics::default(),
//!     &config,
//! );
//! assert_eq!(annotation.labels.len(), 2);
//! assert_eq!(annotation.banner.text, "C --> G");
//! # Ok::<(), jianpu_transpose::TransposeError>(())
//! ```
//!
//! ## Related Modules
//! - `recognition` - decodes the recognizer reply
//! - `coords` - position filtering and mapping
//! - `transpose` - the transposition engine
//! - `layout` - rectangles and colors

use crate::chord::Chord;
use crate::config::TransposeConfig;
use crate::coords::{resolve_positions, AnchorPair, ImageSize};
use crate::correction::correct_chord_by_key;
use crate::error::TransposeError;
use crate::key::normalize_key;
use crate::layout::{
    default_font_size, key_change_banner, layout_labels, DrawInstruction, KeyBanner,
    LayoutOptions, PlacedLabel, TextMeasure,
};
use crate::note::Spelling;
use crate::parser::parse_chord;
use crate::recognition::RecognitionResult;
use crate::transpose::{transpose_chords, transpose_chords_by_semitones, TransposeResult};
use serde::Serialize;

/// Direction of a semitone shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Signed shift for `amount` semitones in this direction, reduced to
    /// within an octave (-11..=11)
    pub fn signed(self, amount: u32) -> i32 {
        let amount = (amount % 12) as i32;
        match self {
            Direction::Up => amount,
            Direction::Down => -amount,
        }
    }
}

/// Where the chords should end up
#[derive(Debug, Clone, PartialEq)]
pub enum TransposeTarget {
    /// Transpose to a key label
    Key(String),
    /// Shift by a signed number of semitones; `explicit_target` names the
    /// resulting key when the caller already chose how to display it
    Semitones {
        semitones: i32,
        explicit_target: Option<String>,
    },
}

impl TransposeTarget {
    /// Semitone target from a direction and an unsigned amount
    pub fn shift(direction: Direction, amount: u32) -> Self {
        TransposeTarget::Semitones {
            semitones: direction.signed(amount),
            explicit_target: None,
        }
    }
}

/// One transposition request
#[derive(Debug, Clone, PartialEq)]
pub struct TransposeRequest {
    /// Key declared by the user; overrides the recognized key
    pub original_key: Option<String>,
    pub target: TransposeTarget,
    /// User-confirmed first and last chord positions
    pub anchors: Option<AnchorPair>,
    /// Extent of the recognizer's coordinate space
    pub image: ImageSize,
}

/// A chord label before and after transposition, with its position in percent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledChord {
    pub original: String,
    pub transposed: String,
    pub x: f64,
    pub y: f64,
}

/// Result of [`process_recognition`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransposeOutcome {
    pub original_key: String,
    pub target_key: String,
    pub semitones: i32,
    pub spelling: Spelling,
    pub chords: Vec<LabeledChord>,
    /// Recognized labels that did not parse as chords
    pub skipped: Vec<String>,
    #[serde(skip)]
    pub result: TransposeResult,
}

/// Draw instructions for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub font_size: f64,
    pub labels: Vec<DrawInstruction>,
    pub banner: KeyBanner,
}

/// Original key: declared, then recognized, then the configured default.
pub fn resolve_original_key(
    declared: Option<&str>,
    recognized: Option<&str>,
    config: &TransposeConfig,
) -> String {
    [declared, recognized]
        .into_iter()
        .flatten()
        .map(normalize_key)
        .find(|key| !key.is_empty())
        .unwrap_or_else(|| normalize_key(&config.default_key))
}

/// Turn a recognizer reply into transposed chords with positions.
///
/// Fails only when a key label cannot be resolved. Zero recognized chords is
/// a valid, empty outcome.
pub fn process_recognition(
    recognition: &RecognitionResult,
    request: &TransposeRequest,
    config: &TransposeConfig,
) -> Result<TransposeOutcome, TransposeError> {
    let original_key = resolve_original_key(
        request.original_key.as_deref(),
        recognition.key.as_deref(),
        config,
    );

    let labels = resolve_positions(
        &recognition.centers,
        request.image,
        request.anchors.as_ref(),
        &config.resolver_options(),
    );

    let mut chords: Vec<Chord> = Vec::with_capacity(labels.len());
    let mut skipped = Vec::new();
    for label in labels {
        let corrected = correct_chord_by_key(&label.text, &original_key);
        match parse_chord(&corrected) {
            Some(chord) => chords.push(chord.at(label.x, label.y)),
            None => {
                log::debug!("Skipping non-chord label {:?}", label.text);
                skipped.push(label.text);
            }
        }
    }

    let result = match &request.target {
        TransposeTarget::Semitones {
            semitones,
            explicit_target,
        } if *semitones != 0 => transpose_chords_by_semitones(
            &chords,
            &original_key,
            *semitones,
            explicit_target.as_deref(),
        )?,
        TransposeTarget::Semitones {
            explicit_target, ..
        } => {
            let target = explicit_target.as_deref().unwrap_or(&original_key);
            transpose_chords(&chords, &original_key, &normalize_key(target))?
        }
        TransposeTarget::Key(target) => {
            transpose_chords(&chords, &original_key, &normalize_key(target))?
        }
    };

    log::info!(
        "Transposed {} chords from {} to {} ({:+} semitones, {} skipped)",
        result.chords.len(),
        result.original_key,
        result.target_key,
        result.semitones,
        skipped.len()
    );

    let chords = result
        .original_labels()
        .into_iter()
        .zip(result.transposed_labels())
        .zip(&result.chords)
        .map(|((original, transposed), pair)| LabeledChord {
            original,
            transposed,
            x: pair.transposed.x.unwrap_or_default(),
            y: pair.transposed.y.unwrap_or_default(),
        })
        .collect();

    Ok(TransposeOutcome {
        original_key: result.original_key.clone(),
        target_key: result.target_key.clone(),
        semitones: result.semitones,
        spelling: result.spelling,
        chords,
        skipped,
        result,
    })
}

/// Lay out the transposed labels and the key-change banner on an image of
/// `pixels` size.
pub fn render_instructions(
    outcome: &TransposeOutcome,
    pixels: ImageSize,
    measurer: &dyn TextMeasure,
    config: &TransposeConfig,
) -> Annotation {
    let font_size = config
        .font_size
        .unwrap_or_else(|| default_font_size(pixels.width));
    let options = LayoutOptions {
        base_color: config.chord_color.clone(),
        blend_factor: config.blend_factor,
        font_size,
    };

    let placed: Vec<PlacedLabel> = outcome
        .chords
        .iter()
        .map(|chord| PlacedLabel {
            text: chord.transposed.clone(),
            x: chord.x,
            y: chord.y,
        })
        .collect();

    Annotation {
        font_size,
        labels: layout_labels(&placed, pixels, measurer, &options),
        banner: key_change_banner(
            &outcome.original_key,
            &outcome.target_key,
            pixels.width,
            measurer,
            &config.chord_color,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Observation, Point};
    use crate::layout::EstimatedMetrics;

    fn recognition(key: Option<&str>, centers: &[(&str, f64, f64)]) -> RecognitionResult {
        RecognitionResult {
            key: key.map(str::to_string),
            centers: centers
                .iter()
                .map(|(text, cx, cy)| Observation::new(*text, *cx, *cy))
                .collect(),
        }
    }

    fn request(target: TransposeTarget) -> TransposeRequest {
        TransposeRequest {
            original_key: None,
            target,
            anchors: None,
            image: ImageSize::new(1000.0, 1000.0),
        }
    }

    fn transposed(outcome: &TransposeOutcome) -> Vec<&str> {
        outcome.chords.iter().map(|c| c.transposed.as_str()).collect()
    }

    #[test]
    fn test_direction_signed() {
        assert_eq!(Direction::Up.signed(3), 3);
        assert_eq!(Direction::Down.signed(3), -3);
        assert_eq!(Direction::Up.signed(14), 2);
        assert_eq!(Direction::Down.signed(12), 0);
        assert_eq!(Direction::Down.signed(u32::MAX), -3);
        assert_eq!(Direction::Down.signed(2_147_483_648), -8);
        assert_eq!(Direction::Up.signed(u32::MAX), 3);
        assert_eq!(
            TransposeTarget::shift(Direction::Down, 2),
            TransposeTarget::Semitones {
                semitones: -2,
                explicit_target: None
            }
        );
    }

    #[test]
    fn test_original_key_resolution() {
        let config = TransposeConfig::default();
        assert_eq!(resolve_original_key(Some("1=Eb"), Some("G"), &config), "Eb");
        assert_eq!(resolve_original_key(None, Some("Key: bB"), &config), "Bb");
        assert_eq!(resolve_original_key(Some(" "), None, &config), "C");
        assert_eq!(resolve_original_key(None, None, &config), "C");
    }

    #[test]
    fn test_ocr_correction_before_transposition() {
        let rec = recognition(
            Some("1=D"),
            &[("A/C", 100.0, 500.0), ("G", 400.0, 500.0), ("Fine.", 700.0, 500.0)],
        );
        let outcome =
            process_recognition(&rec, &request(TransposeTarget::Key("E".into())), &TransposeConfig::default())
                .unwrap();

        assert_eq!(outcome.original_key, "D");
        assert_eq!(outcome.semitones, 2);
        assert_eq!(outcome.chords[0].original, "A/C#");
        assert_eq!(transposed(&outcome), vec!["B/D#", "A"]);
        assert_eq!(outcome.skipped, vec!["Fine."]);
    }

    #[test]
    fn test_semitone_mode_uses_flat_target_name() {
        let rec = recognition(Some("C"), &[("C", 100.0, 100.0), ("G7", 300.0, 100.0)]);
        let outcome = process_recognition(
            &rec,
            &request(TransposeTarget::shift(Direction::Up, 1)),
            &TransposeConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.target_key, "Db");
        assert_eq!(outcome.semitones, 1);
        assert_eq!(transposed(&outcome), vec!["Db", "Ab7"]);
    }

    #[test]
    fn test_zero_semitones_falls_back_to_key_mode() {
        let rec = recognition(Some("F"), &[("Bb", 100.0, 100.0)]);
        let outcome = process_recognition(
            &rec,
            &request(TransposeTarget::Semitones {
                semitones: 0,
                explicit_target: Some("G".into()),
            }),
            &TransposeConfig::default(),
        )
        .unwrap();
        assert_eq!(outcome.target_key, "G");
        assert_eq!(outcome.semitones, 2);
        assert_eq!(transposed(&outcome), vec!["C"]);
    }

    #[test]
    fn test_anchor_mode_positions() {
        let rec = recognition(None, &[("C", 100.0, 200.0), ("G", 500.0, 600.0)]);
        let mut req = request(TransposeTarget::Key("C".into()));
        req.anchors = Some(AnchorPair {
            first: Point { x: 10.0, y: 30.0 },
            last: Point { x: 50.0, y: 70.0 },
        });
        let outcome = process_recognition(&rec, &req, &TransposeConfig::default()).unwrap();

        assert_eq!((outcome.chords[0].x, outcome.chords[0].y), (10.0, 30.0));
        assert_eq!((outcome.chords[1].x, outcome.chords[1].y), (50.0, 70.0));
    }

    #[test]
    fn test_invalid_target_key_is_an_error() {
        let rec = recognition(None, &[("C", 100.0, 100.0)]);
        let err = process_recognition(
            &rec,
            &request(TransposeTarget::Key("H".into())),
            &TransposeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransposeError::InvalidKey { .. }));
    }

    #[test]
    fn test_empty_recognition_is_valid() {
        let outcome = process_recognition(
            &RecognitionResult::default(),
            &request(TransposeTarget::Key("A".into())),
            &TransposeConfig::default(),
        )
        .unwrap();
        assert!(outcome.chords.is_empty());
        assert_eq!(outcome.semitones, 9);
    }

    #[test]
    fn test_render_instructions_uses_config() {
        let rec = recognition(Some("C"), &[("C", 100.0, 100.0), ("F", 105.0, 100.0)]);
        let config = TransposeConfig {
            font_size: Some(24.0),
            ..TransposeConfig::default()
        };
        let outcome =
            process_recognition(&rec, &request(TransposeTarget::Key("D".into())), &config).unwrap();
        let annotation = render_instructions(
            &outcome,
            ImageSize::new(800.0, 800.0),
            &EstimatedMetrics::default(),
            &config,
        );

        assert_eq!(annotation.font_size, 24.0);
        // The two labels are 4 px apart and must get different colors
        assert_eq!(annotation.labels[0].color, "#2563EB");
        assert_eq!(annotation.labels[1].color, "#7ca1f3");
        assert_eq!(annotation.banner.text, "C --> D");
        assert_eq!(annotation.banner.color, "#2563EB");
    }
}
