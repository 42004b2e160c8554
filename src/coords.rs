//! # Coordinate Resolution
//!
//! Converts the recognizer's chord centers into image percentages.
//!
//! ## Pipeline
//! 1. **Validity** - drop centers with missing, non-finite or out-of-range coordinates
//! 2. **Outliers** - with more than `outlier_min_count` centers, drop those whose
//!    y lies more than `outlier_sigma` standard deviations from the median y
//! 3. **Dedup** - same (normalized) text within `dedup_ratio` of the larger image
//!    dimension keeps only the first occurrence
//! 4. **Reading order** - rows of centers within `row_band` of each other, top to
//!    bottom, each row left to right
//! 5. **Mapping** - [`map_direct`] or [`map_with_anchors`]
//!
//! ## Coordinate Spaces
//! Recognizer coordinates are in recognizer units, which [`ImageSize`] bounds.
//! Direct mapping treats them as per-mille of the image (divide by 10).
//! Anchor mapping keeps that for x and re-expresses y between the two
//! positions the user clicked for the first and last chord.
//!
//! ## Example
//! ```rust
//! use jianpu_transpose::coords::{resolve_positions, ImageSize, Observation, ResolverOptions};
//!
//! let observations = vec![
//!     Observation::new("C", 100.0, 500.0),
//!     Observation::new("C", 102.0, 501.0),
//!     Observation::new("G", 400.0, 500.0),
//! ];
//! let labels = resolve_positions(
//!     &observations,
//!     ImageSize::new(1000.0, 1000.0),
//!     None,
//!     &ResolverOptions::default(),
//! );
//!
//! assert_eq!(labels.len(), 2);
//! assert_eq!(labels[0].text, "C");
//! assert_eq!((labels[0].x, labels[0].y), (10.0, 50.0));
//! ```

use crate::error::TransposeError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One chord center reported by the recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub text: String,
    /// `None` when the recognizer sent something that is not a number
    pub cx: Option<f64>,
    pub cy: Option<f64>,
}

impl Observation {
    pub fn new(text: impl Into<String>, cx: f64, cy: f64) -> Self {
        Self {
            text: text.into(),
            cx: Some(cx),
            cy: Some(cy),
        }
    }
}

/// Extent of the recognizer's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

/// A position in percent of the image (0-100 on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// User-confirmed positions of the first and last chord
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub first: Point,
    pub last: Point,
}

/// Parses `x1,y1,x2,y2` (percent)
impl FromStr for AnchorPair {
    type Err = TransposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| TransposeError::Anchor(format!("not a number: {:?}", part)))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values.as_slice() {
            [x1, y1, x2, y2] => {
                let anchors = AnchorPair {
                    first: Point { x: *x1, y: *y1 },
                    last: Point { x: *x2, y: *y2 },
                };
                if values.iter().all(|v| (0.0..=100.0).contains(v)) {
                    Ok(anchors)
                } else {
                    Err(TransposeError::Anchor(format!("coordinates must be 0-100: {}", s)))
                }
            }
            _ => Err(TransposeError::Anchor(format!(
                "expected x1,y1,x2,y2 but got {} values",
                values.len()
            ))),
        }
    }
}

/// Thresholds for filtering and grouping
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOptions {
    /// Dedup distance as a fraction of the larger image dimension
    pub dedup_ratio: f64,
    /// Vertical distance (recognizer units) within which centers share a row
    pub row_band: f64,
    /// Outlier cut-off in standard deviations from the median y
    pub outlier_sigma: f64,
    /// The outlier filter only runs with more centers than this
    pub outlier_min_count: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            dedup_ratio: 0.01,
            row_band: 30.0,
            outlier_sigma: 3.0,
            outlier_min_count: 5,
        }
    }
}

/// A chord label placed in percent coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// A validated center in recognizer units
#[derive(Debug, Clone, PartialEq)]
pub struct Center {
    pub text: String,
    pub cx: f64,
    pub cy: f64,
}

/// Keep centers with numeric coordinates inside the image.
pub fn valid_centers(observations: &[Observation], image: ImageSize) -> Vec<Center> {
    observations
        .iter()
        .filter_map(|obs| match (obs.cx, obs.cy) {
            (Some(cx), Some(cy)) if cx.is_finite() && cy.is_finite() && image.contains(cx, cy) => {
                Some(Center {
                    text: obs.text.clone(),
                    cx,
                    cy,
                })
            }
            _ => {
                log::warn!(
                    "Dropping {:?}: invalid coordinates ({:?}, {:?})",
                    obs.text,
                    obs.cx,
                    obs.cy
                );
                None
            }
        })
        .collect()
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Drop centers whose y is far from the median y.
pub fn filter_outliers(centers: Vec<Center>, sigma: f64, min_count: usize) -> Vec<Center> {
    if centers.len() <= min_count {
        return centers;
    }

    let mut ys: Vec<f64> = centers.iter().map(|c| c.cy).collect();
    ys.sort_by(f64::total_cmp);
    let median_y = median(&ys);
    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let variance = ys.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / ys.len() as f64;
    let limit = sigma * variance.sqrt();

    centers
        .into_iter()
        .filter(|c| {
            let keep = (c.cy - median_y).abs() <= limit;
            if !keep {
                log::debug!("Dropping outlier {:?} at y={} (median {})", c.text, c.cy, median_y);
            }
            keep
        })
        .collect()
}

fn dedup_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Drop repeated detections of the same label.
///
/// Two centers are duplicates only if their normalized text matches and they
/// are closer than `threshold`; the first one seen is kept.
pub fn dedupe(centers: Vec<Center>, threshold: f64) -> Vec<Center> {
    let mut kept: Vec<(String, Center)> = Vec::with_capacity(centers.len());
    for center in centers {
        let key = dedup_key(&center.text);
        let duplicate = kept.iter().any(|(existing_key, existing)| {
            *existing_key == key
                && (center.cx - existing.cx).hypot(center.cy - existing.cy) < threshold
        });
        if duplicate {
            log::debug!(
                "Skipping duplicate {:?} at ({}, {})",
                center.text,
                center.cx,
                center.cy
            );
        } else {
            kept.push((key, center));
        }
    }
    kept.into_iter().map(|(_, center)| center).collect()
}

/// Sort into rows (top to bottom) and within a row left to right.
///
/// A row starts at its topmost center and takes every following center
/// within `row_band` of it.
pub fn reading_order(mut centers: Vec<Center>, row_band: f64) -> Vec<Center> {
    centers.sort_by(|a, b| a.cy.total_cmp(&b.cy));

    let mut ordered = Vec::with_capacity(centers.len());
    let mut row: Vec<Center> = Vec::new();
    for center in centers {
        if let Some(first) = row.first() {
            if center.cy - first.cy > row_band {
                flush_row(&mut row, &mut ordered);
            }
        }
        row.push(center);
    }
    flush_row(&mut row, &mut ordered);
    ordered
}

fn flush_row(row: &mut Vec<Center>, ordered: &mut Vec<Center>) {
    row.sort_by(|a, b| a.cx.total_cmp(&b.cx));
    ordered.append(row);
}

fn per_mille_to_percent(value: f64) -> f64 {
    (value / 10.0).clamp(0.0, 100.0)
}

/// Direct mapping: recognizer units are per-mille on both axes.
pub fn map_direct(centers: &[Center]) -> Vec<ResolvedLabel> {
    centers
        .iter()
        .map(|c| ResolvedLabel {
            text: c.text.clone(),
            x: per_mille_to_percent(c.cx),
            y: per_mille_to_percent(c.cy),
        })
        .collect()
}

/// Anchor mapping: x as in [`map_direct`], y interpolated between the anchors
/// by the center's position between the recognizer's lowest and highest y.
pub fn map_with_anchors(centers: &[Center], anchors: &AnchorPair) -> Vec<ResolvedLabel> {
    let min_y = centers.iter().map(|c| c.cy).fold(f64::INFINITY, f64::min);
    let max_y = centers.iter().map(|c| c.cy).fold(f64::NEG_INFINITY, f64::max);
    let range = max_y - min_y;
    let range = if range == 0.0 { 1.0 } else { range };
    let span = anchors.last.y - anchors.first.y;

    centers
        .iter()
        .map(|c| {
            let ratio = (c.cy - min_y) / range;
            ResolvedLabel {
                text: c.text.clone(),
                x: per_mille_to_percent(c.cx),
                y: anchors.first.y + ratio * span,
            }
        })
        .collect()
}

/// Run the full pipeline and return labels in reading order.
pub fn resolve_positions(
    observations: &[Observation],
    image: ImageSize,
    anchors: Option<&AnchorPair>,
    options: &ResolverOptions,
) -> Vec<ResolvedLabel> {
    let valid = valid_centers(observations, image);
    let filtered = filter_outliers(valid, options.outlier_sigma, options.outlier_min_count);
    let threshold = options.dedup_ratio * image.width.max(image.height);
    let unique = dedupe(filtered, threshold);
    let ordered = reading_order(unique, options.row_band);

    log::debug!(
        "Resolved {} of {} observations",
        ordered.len(),
        observations.len()
    );

    match anchors {
        Some(anchors) => map_with_anchors(&ordered, anchors),
        None => map_direct(&ordered),
    }
}
