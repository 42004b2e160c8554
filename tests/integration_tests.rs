//! Integration tests for jianpu-transpose
//!
//! Tests the full pipeline from a recognizer reply to transposed labels and
//! draw instructions, plus the engine-wide properties over all pitch classes.

use jianpu_transpose::coords::{resolve_positions, ResolverOptions};
use jianpu_transpose::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn request(target: TransposeTarget) -> TransposeRequest {
    TransposeRequest {
        original_key: None,
        target,
        anchors: None,
        image: ImageSize::new(1000.0, 1000.0),
    }
}

/// Every root/bass combination, plus root-only chords
fn all_chords() -> Vec<Chord> {
    let mut chords = Vec::new();
    for root in Note::ALL {
        chords.push(Chord::new(root, "m7"));
        for bass in Note::ALL {
            chords.push(Chord::new(root, "").with_bass(bass));
        }
    }
    chords
}

#[test]
fn test_scenario_parse_sharp_minor_seventh() {
    let chord = parse_chord("F#m7").unwrap();
    assert_eq!(chord.root, Note::FSharp);
    assert_eq!(chord.quality, "m7");
    assert_eq!(chord.bass, None);
}

#[test]
fn test_scenario_slash_chord_up_one_semitone_in_flats() {
    let chords = vec![parse_chord("C/E").unwrap()];
    let result = transpose_chords_by_semitones(&chords, "C", 1, None).unwrap();

    assert_eq!(result.target_key, "Db");
    assert_eq!(result.spelling, Spelling::Flat);
    assert_eq!(result.chords[0].transposed.root, Note::CSharp);
    assert_eq!(result.chords[0].transposed.bass, Some(Note::F));
    assert_eq!(result.transposed_labels(), vec!["Db/F"]);
}

#[test]
fn test_scenario_c_to_g() {
    let chords = vec![parse_chord("C").unwrap()];
    let result = transpose_chords(&chords, "C", "G").unwrap();

    assert_eq!(result.semitones, 7);
    assert_eq!(result.target_key, "G");
    assert_eq!(result.spelling, Spelling::Sharp);
    assert_eq!(result.transposed_labels(), vec!["G"]);
}

#[test]
fn test_scenario_duplicate_detection_merged() {
    let observations = vec![
        Observation::new("C", 100.0, 500.0),
        Observation::new("C", 102.0, 501.0),
    ];
    let labels = resolve_positions(
        &observations,
        ImageSize::new(1000.0, 1000.0),
        None,
        &ResolverOptions::default(),
    );
    assert_eq!(labels.len(), 1);
}

#[test]
fn test_scenario_ocr_correction_in_d() {
    assert_eq!(correct_chord_by_key("A/C", "D"), "A/C#");
}

#[test]
fn test_dedup_keeps_different_text_at_same_spot() {
    let observations = vec![
        Observation::new("C", 300.0, 300.0),
        Observation::new("Am", 300.0, 300.0),
    ];
    let labels = resolve_positions(
        &observations,
        ImageSize::new(1000.0, 1000.0),
        None,
        &ResolverOptions::default(),
    );
    let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"C") && texts.contains(&"Am"));
}

#[test]
fn test_round_trip_returns_same_pitch_classes() {
    let chords = all_chords();
    for s in -11..=11 {
        let there = transpose_chords_by_semitones(&chords, "C", s, None).unwrap();
        let shifted: Vec<Chord> = there.chords.iter().map(|p| p.transposed.clone()).collect();
        let back = transpose_chords_by_semitones(&shifted, "C", (-s).rem_euclid(12), None).unwrap();

        for ((original, pair), back) in chords.iter().zip(&there.chords).zip(&back.chords) {
            // A repaired bass no longer maps back to the original one
            if pair.transposed != transpose_chord(original, s) {
                continue;
            }
            assert_eq!(back.transposed.root, original.root, "{} by {}", original, s);
            assert_eq!(back.transposed.bass, original.bass, "{} by {}", original, s);
            assert_eq!(back.transposed.quality, original.quality);
        }
    }
}

#[test]
fn test_transposed_notes_stay_in_chromatic_set() {
    for chord in all_chords() {
        for s in -30..=30 {
            let shifted = correct_unreasonable_chord(transpose_chord(&chord, s));
            assert!(shifted.root.index() < 12);
            assert!(shifted.bass.map_or(true, |b| b.index() < 12));
        }
    }
}

#[test]
fn test_correction_is_idempotent() {
    for chord in all_chords() {
        let once = correct_unreasonable_chord(chord.clone());
        let twice = correct_unreasonable_chord(once.clone());
        assert_eq!(once, twice);
    }
}

#[test]
fn test_engine_never_returns_minor_second_bass() {
    let chords = all_chords();
    for s in -12..=12 {
        let result = transpose_chords_by_semitones(&chords, "C", s, None).unwrap();
        for pair in &result.chords {
            assert_ne!(pair.transposed.bass_interval(), Some(1), "{}", pair.transposed);
        }
    }
}

#[test]
fn test_fenced_reply_end_to_end() {
    let reply = r#"```json
{
  "key": "1=D",
  "centers": [
    { "text": "D",    "cx": 145, "cy": 260 },
    { "text": "A",    "cx": 390, "cy": 260 },
    { "text": "D.C.", "cx": 600, "cy": 480 },
    { "text": "G",    "cx": 500, "cy": 480 },
    { "text": "Bm",   "cx": 200, "cy": 480 }
  ]
}
```"#;
    let recognition = RecognitionResult::from_json(reply).unwrap();
    let outcome = process_recognition(
        &recognition,
        &request(TransposeTarget::Key("C".into())),
        &TransposeConfig::default(),
    )
    .unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({
            "originalKey": "D",
            "targetKey": "C",
            "semitones": 10,
            "spelling": "sharp",
            "chords": [
                { "original": "D",  "transposed": "C",  "x": 14.5, "y": 26.0 },
                { "original": "A",  "transposed": "G",  "x": 39.0, "y": 26.0 },
                { "original": "Bm", "transposed": "Am", "x": 20.0, "y": 48.0 },
                { "original": "G",  "transposed": "F",  "x": 50.0, "y": 48.0 }
            ],
            "skipped": ["D.C."]
        })
    );
}

#[test]
fn test_semitone_request_with_explicit_target() {
    let recognition = RecognitionResult::from_json(
        r#"{"key": "C", "centers": [{"text": "C/E", "cx": 100, "cy": 100}]}"#,
    )
    .unwrap();
    let outcome = process_recognition(
        &recognition,
        &request(TransposeTarget::Semitones {
            semitones: 6,
            explicit_target: Some("F#".into()),
        }),
        &TransposeConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.target_key, "F#");
    assert_eq!(outcome.chords[0].transposed, "F#/A#");
}

#[test]
fn test_annotation_with_anchors_and_overlap() {
    let recognition = RecognitionResult::from_json(
        r#"{"key": "G", "centers": [
            {"text": "G",  "cx": 100, "cy": 100},
            {"text": "Em", "cx": 110, "cy": 100},
            {"text": "C",  "cx": 800, "cy": 300}
        ]}"#,
    )
    .unwrap();
    let mut req = request(TransposeTarget::shift(Direction::Down, 2));
    req.anchors = Some("10,20,80,60".parse().unwrap());
    let config = TransposeConfig::from_yaml("chord-color: \"#000000\"\nblend-factor: 0.5").unwrap();

    let outcome = process_recognition(&recognition, &req, &config).unwrap();
    let labels: Vec<(&str, f64, f64)> = outcome
        .chords
        .iter()
        .map(|c| (c.transposed.as_str(), c.x, c.y))
        .collect();
    assert_eq!(
        labels,
        vec![("F", 10.0, 20.0), ("Dm", 11.0, 20.0), ("Bb", 80.0, 60.0)]
    );

    let annotation = render_instructions(
        &outcome,
        ImageSize::new(1000.0, 1000.0),
        &EstimatedMetrics::default(),
        &config,
    );
    let colors: Vec<&str> = annotation.labels.iter().map(|l| l.color.as_str()).collect();
    assert_eq!(colors, vec!["#000000", "#808080", "#000000"]);
    assert_eq!(annotation.banner.text, "G --> F");
}

#[test]
fn test_transpose_label_helper() {
    assert_eq!(transpose_label("Am7", "C", "Eb").unwrap(), Some("Cm7".to_string()));
    assert!(transpose_label("Am7", "C", "X").is_err());
}
