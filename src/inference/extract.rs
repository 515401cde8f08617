//! Turns raw model text into typed advisory results.
//!
//! Models frequently wrap their JSON in a fenced code block despite being
//! told not to. Extraction first unwraps such a fence, then parses in two
//! phases so logs can tell "not JSON at all" from "JSON of the wrong
//! shape". Either failure is reported to the caller; nothing here ever
//! substitutes a default value.

use serde::de::DeserializeOwned;

use crate::advisory::{CropRecommendation, DiseaseReport, RECOMMENDATION_COUNT};

/// Longest slice of offending model output carried in an error.
const MAX_PREVIEW_CHARS: usize = 200;

/// Model output that could not be turned into a result.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("model returned no content to parse")]
    Empty,

    #[error("model output is not valid JSON ({length} bytes): {preview}")]
    NotJson {
        preview: String,
        length: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("model output JSON does not match the expected shape ({reason}): {preview}")]
    WrongShape { preview: String, reason: String },

    #[error("expected exactly {expected} recommendations, model returned {actual}")]
    WrongCount { expected: usize, actual: usize },
}

/// Parses a disease-detection response.
pub fn disease_report(raw: &str) -> Result<DiseaseReport, ExtractError> {
    parse(raw)
}

/// Parses a recommendation response and enforces the fixed entry count.
pub fn recommendations(raw: &str) -> Result<Vec<CropRecommendation>, ExtractError> {
    let entries: Vec<CropRecommendation> = parse(raw)?;
    if entries.len() != RECOMMENDATION_COUNT {
        return Err(ExtractError::WrongCount {
            expected: RECOMMENDATION_COUNT,
            actual: entries.len(),
        });
    }
    Ok(entries)
}

/// Returns the content of the first fenced block, or the input unchanged
/// when no complete fence exists.
///
/// The opening fence may carry a `json` tag. The payload runs to the next
/// closing fence and is trimmed of surrounding whitespace.
pub fn strip_fences(raw: &str) -> &str {
    fenced_payload(raw).unwrap_or(raw)
}

fn fenced_payload(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let mut rest = &raw[start + 3..];
    if let Some(tagged) = rest.strip_prefix("json") {
        rest = tagged;
    }
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let candidate = strip_fences(raw).trim();
    if candidate.is_empty() {
        return Err(ExtractError::Empty);
    }

    let value: serde_json::Value =
        serde_json::from_str(candidate).map_err(|source| ExtractError::NotJson {
            preview: preview(candidate),
            length: candidate.len(),
            source,
        })?;

    serde_json::from_value(value).map_err(|shape_error| ExtractError::WrongShape {
        preview: preview(candidate),
        reason: shape_error.to_string(),
    })
}

fn preview(text: &str) -> String {
    if text.chars().count() <= MAX_PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_PREVIEW_CHARS).collect();
        format!("{head}... [truncated]")
    }
}
