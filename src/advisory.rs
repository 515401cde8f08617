//! Advisory result entities returned to the dashboard.
//!
//! These are the only shapes callers ever see, whether the content came from
//! the model or from the fallback tables. Tolerances for model sloppiness
//! live in the `Deserialize` impls: unknown severity words collapse to
//! `unknown`, scores are rounded and clamped into 0-100, prevention tips may
//! be absent. Anything else that fails to deserialize is treated as
//! malformed output upstream of here.

use serde::{Deserialize, Deserializer, Serialize};

/// A recommendation response always contains exactly this many entries.
pub const RECOMMENDATION_COUNT: usize = 3;

/// How far a detected disease has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Unknown => "unknown",
        }
    }
}

/// Result of one disease-detection request.
///
/// Always fully populated before it leaves a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseReport {
    pub disease: String,
    #[serde(deserialize_with = "clamped_score")]
    pub confidence: u8,
    pub severity: Severity,
    pub treatment: String,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
}

/// One entry of a crop recommendation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub name: String,
    #[serde(deserialize_with = "clamped_score")]
    pub score: u8,
    pub reason: String,
}

/// Accepts any JSON number and squeezes it into the 0-100 integer range.
fn clamped_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("score must be a finite number"));
    }
    Ok(value.clamp(0.0, 100.0).round() as u8)
}
