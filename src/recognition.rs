//! # Recognition Result
//!
//! Decodes the JSON the image recognizer returns:
//!
//! ```json
//! {
//!   "key": "A",
//!   "centers": [
//!     { "text": "D",   "cx": 145, "cy": 260 },
//!     { "text": "F#m", "cx": 800, "cy": 1480 }
//!   ]
//! }
//! ```
//!
//! Recognizers are sloppy, so decoding is lenient: the document may sit in a
//! fenced code block, `key` may be missing or null, `centers` may be missing,
//! and a coordinate that is not a number becomes `None` so that the resolver
//! can drop that one center instead of rejecting the whole result.

use crate::coords::Observation;
use crate::error::TransposeError;
use serde_json::Value;

/// What the recognizer saw on the sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionResult {
    /// Key label as printed, e.g. "1=D"; `None` if the recognizer found none
    pub key: Option<String>,
    pub centers: Vec<Observation>,
}

impl RecognitionResult {
    /// Decode recognizer output.
    ///
    /// ```
    /// use jianpu_transpose::RecognitionResult;
    ///
    /// let raw = "```json\n{\"key\": \"G\", \"centers\": [{\"text\": \"G\", \"cx\": 10, \"cy\": \"?\"}]}\n```";
    /// let result = RecognitionResult::from_json(raw)?;
    ///
    /// assert_eq!(result.key.as_deref(), Some("G"));
    /// assert_eq!(result.centers[0].cx, Some(10.0));
    /// assert_eq!(result.centers[0].cy, None);
    /// # Ok::<(), jianpu_transpose::TransposeError>(())
    /// ```
    pub fn from_json(raw: &str) -> Result<Self, TransposeError> {
        let body = strip_code_fence(raw);
        let value: Value =
            serde_json::from_str(body).map_err(|e| TransposeError::Recognition(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| TransposeError::Recognition("expected a JSON object".to_string()))?;

        let key = match object.get("key") {
            Some(Value::String(key)) if !key.trim().is_empty() => Some(key.clone()),
            _ => None,
        };

        let centers = match object.get("centers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| observation(i, item))
                .collect(),
            Some(_) => {
                return Err(TransposeError::Recognition(
                    "\"centers\" must be an array".to_string(),
                ))
            }
        };

        Ok(RecognitionResult { key, centers })
    }
}

fn observation(index: usize, item: &Value) -> Option<Observation> {
    let text = match item.get("text") {
        Some(Value::String(text)) => text.clone(),
        _ => {
            log::warn!("Center #{} has no text, skipping", index);
            return None;
        }
    };
    Some(Observation {
        text,
        cx: item.get("cx").and_then(Value::as_f64),
        cy: item.get("cy").and_then(Value::as_f64),
    })
}

/// Body of a ```` ``` ```` or ```` ```json ```` fence, or the whole input.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(end) => after[..end].trim(),
        None => trimmed,
    }
}
