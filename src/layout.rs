//! # Annotation Layout
//!
//! Computes where the replacement labels are painted and in which color.
//!
//! Each label gets two rectangles around its pixel center:
//! - a **cover** rectangle, padded generously, painted white to hide the
//!   printed chord underneath
//! - an **overlap-test** rectangle, padded lightly, used only to find labels
//!   that collide
//!
//! Colliding labels form an undirected graph. Within each connected component
//! the members are ordered left to right and alternate between the base color
//! and a lightened variant, so two colors are always enough to tell
//! neighbours apart. Isolated labels keep the base color.
//!
//! Measuring text is left to the caller through [`TextMeasure`]; the painter
//! downstream only executes the returned [`DrawInstruction`]s.

use crate::coords::ImageSize;
use serde::Serialize;
use std::collections::VecDeque;

/// Padding of the cover rectangle, relative to the font size
const COVER_PADDING: f64 = 0.8;
/// Vertical share of the cover padding
const COVER_VERTICAL: f64 = 0.63;
/// Padding of the overlap-test rectangle, relative to the font size
const OVERLAP_PADDING: f64 = 0.2;
/// Vertical share of the overlap padding
const OVERLAP_VERTICAL: f64 = 0.7;
/// Margin around the key-change banner in pixels
const BANNER_PADDING: f64 = 15.0;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Lower-case `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Blend toward white; `factor` 0 keeps the color, 1 gives white
    pub fn lighten(self, factor: f64) -> Rgb {
        let blend = |c: u8| (c as f64 + (255.0 - c as f64) * factor).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: blend(self.r),
            g: blend(self.g),
            b: blend(self.b),
        }
    }
}

/// Lighten a hex color; colors that do not parse come back unchanged.
///
/// ```
/// use jianpu_transpose::layout::lighten_color;
///
/// assert_eq!(lighten_color("#2563EB", 0.4), "#7ca1f3");
/// assert_eq!(lighten_color("blue", 0.4), "blue");
/// ```
pub fn lighten_color(hex: &str, factor: f64) -> String {
    match Rgb::from_hex(hex) {
        Some(rgb) => rgb.lighten(factor).to_hex(),
        None => hex.to_string(),
    }
}

/// An axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle of the given size centered on a point
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Rect {
        Rect {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Strict intersection; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Rendered size of a text in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

/// Measures text for a given font size; implemented by the rendering side
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> TextMetrics;
}

/// Fixed-advance approximation of a sans-serif font
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedMetrics {
    /// Advance per character relative to the font size
    pub advance: f64,
    /// Line height relative to the font size
    pub line_height: f64,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.1,
        }
    }
}

impl TextMeasure for EstimatedMetrics {
    fn measure(&self, text: &str, font_size: f64) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * self.advance * font_size,
            height: self.line_height * font_size,
        }
    }
}

/// Font size used when the caller does not pick one
pub fn default_font_size(image_width: f64) -> f64 {
    (image_width / 45.0).round().clamp(16.0, 28.0)
}

/// A final chord label in percent coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Colors and font for a layout run
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub base_color: String,
    pub blend_factor: f64,
    pub font_size: f64,
}

/// What the painter draws for one label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawInstruction {
    pub text: String,
    pub x_percent: f64,
    pub y_percent: f64,
    /// Pixel center of the text
    pub x: f64,
    pub y: f64,
    pub rect_x: f64,
    pub rect_y: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    pub color: String,
    #[serde(skip)]
    pub overlap_rect: Rect,
}

impl DrawInstruction {
    /// The white rectangle painted over the printed chord
    pub fn cover_rect(&self) -> Rect {
        Rect {
            x: self.rect_x,
            y: self.rect_y,
            width: self.rect_width,
            height: self.rect_height,
        }
    }
}

fn build_instruction(
    label: &PlacedLabel,
    image: ImageSize,
    metrics: TextMetrics,
    options: &LayoutOptions,
) -> DrawInstruction {
    let x = (label.x / 100.0 * image.width).round();
    let y = (label.y / 100.0 * image.height).round();

    let pad = options.font_size * COVER_PADDING;
    let cover = Rect::centered(
        x,
        y,
        (metrics.width + pad * 2.0).round(),
        (metrics.height + pad * COVER_VERTICAL).round(),
    );
    let pad = options.font_size * OVERLAP_PADDING;
    let overlap_rect = Rect::centered(
        x,
        y,
        (metrics.width + pad * 2.0).round(),
        (metrics.height + pad * OVERLAP_VERTICAL).round(),
    );

    DrawInstruction {
        text: label.text.clone(),
        x_percent: label.x,
        y_percent: label.y,
        x,
        y,
        rect_x: cover.x,
        rect_y: cover.y,
        rect_width: cover.width,
        rect_height: cover.height,
        color: options.base_color.clone(),
        overlap_rect,
    }
}

/// Connected components of the intersection graph, each in discovery order.
pub fn overlap_components(rects: &[Rect]) -> Vec<Vec<usize>> {
    let n = rects.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if rects[i].intersects(&rects[j]) {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &next in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }
    components
}

/// Alternate base and lightened colors inside each overlap component.
pub fn assign_colors(instructions: &mut [DrawInstruction], base_color: &str, blend_factor: f64) {
    let rects: Vec<Rect> = instructions.iter().map(|i| i.overlap_rect).collect();
    let light = lighten_color(base_color, blend_factor);

    for mut component in overlap_components(&rects) {
        if component.len() > 1 {
            log::debug!("Overlapping labels: {:?}", component);
        }
        component.sort_by(|&a, &b| {
            instructions[a]
                .x
                .total_cmp(&instructions[b].x)
                .then(a.cmp(&b))
        });
        for (position, index) in component.into_iter().enumerate() {
            instructions[index].color = if position % 2 == 1 {
                light.clone()
            } else {
                base_color.to_string()
            };
        }
    }
}

/// Lay out all labels. Labels with non-finite or out-of-range percentages are skipped.
///
/// ```
/// use jianpu_transpose::coords::ImageSize;
/// use jianpu_transpose::layout::{layout_labels, EstimatedMetrics, LayoutOptions, PlacedLabel};
///
/// let labels = vec![
///     PlacedLabel { text: "G".into(), x: 10.0, y: 10.0 },
///     PlacedLabel { text: "Em".into(), x: 11.0, y: 10.0 },
///     PlacedLabel { text: "C".into(), x: 80.0, y: 50.0 },
/// ];
/// let options = LayoutOptions { base_color: "#2563eb".into(), blend_factor: 0.4, font_size: 20.0 };
/// let drawn = layout_labels(&labels, ImageSize::new(1000.0, 1000.0), &EstimatedMetrics::default(), &options);
///
/// assert_eq!(drawn[0].color, "#2563eb");
/// assert_ne!(drawn[1].color, "#2563eb");
/// assert_eq!(drawn[2].color, "#2563eb");
/// ```
pub fn layout_labels(
    labels: &[PlacedLabel],
    image: ImageSize,
    measurer: &dyn TextMeasure,
    options: &LayoutOptions,
) -> Vec<DrawInstruction> {
    let mut instructions: Vec<DrawInstruction> = labels
        .iter()
        .filter(|label| {
            let valid = label.x.is_finite()
                && label.y.is_finite()
                && (0.0..=100.0).contains(&label.x)
                && (0.0..=100.0).contains(&label.y);
            if !valid {
                log::warn!(
                    "Skipping {:?}: position ({}, {}) outside the image",
                    label.text,
                    label.x,
                    label.y
                );
            }
            valid
        })
        .map(|label| {
            let metrics = measurer.measure(&label.text, options.font_size);
            build_instruction(label, image, metrics, options)
        })
        .collect();

    assign_colors(&mut instructions, &options.base_color, options.blend_factor);
    instructions
}

/// The "<original> --> <target>" mark in the top-left corner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBanner {
    pub text: String,
    pub font_size: f64,
    /// Top-left corner of the text
    pub x: f64,
    pub y: f64,
    pub background: Rect,
    pub color: String,
}

/// Banner announcing the key change, sized from the image width.
pub fn key_change_banner(
    original_key: &str,
    target_key: &str,
    image_width: f64,
    measurer: &dyn TextMeasure,
    color: &str,
) -> KeyBanner {
    let text = format!("{} --> {}", original_key, target_key);
    let font_size = (image_width / 35.0).round().clamp(20.0, 32.0);
    let width = measurer.measure(&text, font_size).width;
    let height = font_size * 1.2;

    KeyBanner {
        background: Rect {
            x: BANNER_PADDING / 2.0,
            y: BANNER_PADDING / 2.0,
            width: width + BANNER_PADDING * 1.5,
            height: height + BANNER_PADDING,
        },
        text,
        font_size,
        x: BANNER_PADDING,
        y: BANNER_PADDING,
        color: color.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMetrics;

    impl TextMeasure for FixedMetrics {
        fn measure(&self, _text: &str, _font_size: f64) -> TextMetrics {
            TextMetrics {
                width: 20.0,
                height: 22.0,
            }
        }
    }

    fn options() -> LayoutOptions {
        LayoutOptions {
            base_color: "#2563eb".to_string(),
            blend_factor: 0.4,
            font_size: 20.0,
        }
    }

    fn label(text: &str, x: f64, y: f64) -> PlacedLabel {
        PlacedLabel {
            text: text.to_string(),
            x,
            y,
        }
    }

    const IMAGE: ImageSize = ImageSize {
        width: 1000.0,
        height: 1000.0,
    };

    #[test]
    fn test_hex_round_trip_and_lighten() {
        let rgb = Rgb::from_hex("#2563EB").unwrap();
        assert_eq!(rgb, Rgb { r: 0x25, g: 0x63, b: 0xeb });
        assert_eq!(rgb.to_hex(), "#2563eb");
        assert_eq!(rgb.lighten(0.0), rgb);
        assert_eq!(rgb.lighten(1.0), Rgb { r: 255, g: 255, b: 255 });
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        let b = Rect { x: 5.0, y: 5.0, width: 10.0, height: 10.0 };
        let c = Rect { x: 10.0, y: 0.0, width: 10.0, height: 10.0 };
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_rectangle_sizes() {
        let drawn = layout_labels(&[label("C", 50.0, 25.0)], IMAGE, &FixedMetrics, &options());
        let d = &drawn[0];
        assert_eq!((d.x, d.y), (500.0, 250.0));
        // cover: pad 16 -> 20 + 32 = 52, 22 + 10.08 = 32
        assert_eq!(d.rect_width, 52.0);
        assert_eq!(d.rect_height, 32.0);
        assert_eq!(d.rect_x, 474.0);
        assert_eq!(d.rect_y, 234.0);
        // overlap: pad 4 -> 20 + 8 = 28, 22 + 2.8 = 25
        assert_eq!(d.overlap_rect.width, 28.0);
        assert_eq!(d.overlap_rect.height, 25.0);
        assert_eq!(
            d.cover_rect(),
            Rect { x: 474.0, y: 234.0, width: 52.0, height: 32.0 }
        );
        assert!(d.cover_rect().intersects(&d.overlap_rect));
    }

    #[test]
    fn test_components_bfs() {
        let rect = |x: f64| Rect { x, y: 0.0, width: 10.0, height: 10.0 };
        // 0-1-2 chained, 3 alone
        let components = overlap_components(&[rect(0.0), rect(8.0), rect(16.0), rect(100.0)]);
        assert_eq!(components, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_alternating_colors_by_x() {
        // Three chained labels given right to left
        let labels = vec![
            label("C", 52.0, 50.0),
            label("B", 51.0, 50.0),
            label("A", 50.0, 50.0),
            label("Far", 10.0, 10.0),
        ];
        let drawn = layout_labels(&labels, IMAGE, &FixedMetrics, &options());
        let light = lighten_color("#2563eb", 0.4);
        assert_eq!(drawn[2].color, "#2563eb"); // A, leftmost
        assert_eq!(drawn[1].color, light); // B
        assert_eq!(drawn[0].color, "#2563eb"); // C
        assert_eq!(drawn[3].color, "#2563eb");
    }

    #[test]
    fn test_separate_components_restart_alternation() {
        let labels = vec![
            label("A", 10.0, 10.0),
            label("B", 11.0, 10.0),
            label("C", 60.0, 60.0),
            label("D", 61.0, 60.0),
        ];
        let drawn = layout_labels(&labels, IMAGE, &FixedMetrics, &options());
        let colors: Vec<&str> = drawn.iter().map(|d| d.color.as_str()).collect();
        let light = lighten_color("#2563eb", 0.4);
        assert_eq!(colors, vec!["#2563eb", light.as_str(), "#2563eb", light.as_str()]);
    }

    #[test]
    fn test_invalid_positions_skipped() {
        let labels = vec![label("A", f64::NAN, 10.0), label("B", 101.0, 10.0), label("C", 5.0, 5.0)];
        let drawn = layout_labels(&labels, IMAGE, &FixedMetrics, &options());
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].text, "C");
    }

    #[test]
    fn test_default_font_size() {
        assert_eq!(default_font_size(300.0), 16.0);
        assert_eq!(default_font_size(900.0), 20.0);
        assert_eq!(default_font_size(4000.0), 28.0);
    }

    #[test]
    fn test_key_change_banner() {
        let banner = key_change_banner("Bb", "F", 1400.0, &FixedMetrics, "#2563EB");
        assert_eq!(banner.text, "Bb --> F");
        assert_eq!(banner.font_size, 32.0);
        assert_eq!(banner.x, 15.0);
        assert_eq!(banner.background.width, 20.0 + 22.5);
    }
}
