//! Deterministic fallback results.
//!
//! Served whenever the upstream path cannot produce a usable result: retry
//! exhaustion, unusable model output, or an unexpected failure anywhere in a
//! handler. Pure functions of their inputs so degraded responses are fully
//! reproducible.

use crate::advisory::{CropRecommendation, DiseaseReport, Severity};

/// Table key used when a request's state is missing or unrecognized.
pub const DEFAULT_STATE_KEY: &str = "karnataka";

/// The stand-in report served when no analysis could be produced.
pub fn disease_report() -> DiseaseReport {
    DiseaseReport {
        disease: "Service Temporarily Unavailable".to_string(),
        confidence: 0,
        severity: Severity::Unknown,
        treatment: "The AI analysis service is currently overloaded. Please try again in a few moments."
            .to_string(),
        prevention_tips: vec![
            "Maintain proper plant hygiene".to_string(),
            "Ensure adequate spacing between plants".to_string(),
            "Monitor plants regularly for early signs of disease".to_string(),
            "Keep records of plant health observations".to_string(),
        ],
    }
}

/// Region-appropriate crop picks keyed by state name.
///
/// The key is lower-cased before lookup; unknown states get the
/// [`DEFAULT_STATE_KEY`] table.
pub fn recommendations(state: &str) -> Vec<CropRecommendation> {
    match state.to_lowercase().as_str() {
        "maharashtra" => vec![
            entry("Sugarcane", 88, "Ideal for Maharashtra's climate"),
            entry("Cotton", 85, "Well-established crop in the region"),
            entry("Jowar", 80, "Drought-resistant option"),
        ],
        "punjab" => vec![
            entry("Wheat", 90, "Primary crop of Punjab with excellent yields"),
            entry("Rice", 87, "Complementary crop for rotation"),
            entry("Maize", 82, "Growing popularity in the region"),
        ],
        _ => vec![
            entry(
                "Rice",
                85,
                "Well-suited to Karnataka's climate and soil conditions",
            ),
            entry("Sugarcane", 82, "Thrives in warm, humid conditions of Karnataka"),
            entry("Maize", 78, "Good alternative crop for rotation"),
        ],
    }
}

fn entry(name: &str, score: u8, reason: &str) -> CropRecommendation {
    CropRecommendation {
        name: name.to_string(),
        score,
        reason: reason.to_string(),
    }
}
