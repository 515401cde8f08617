//! Prompt templates for both inference tasks.
//!
//! The wording is part of the upstream contract: both templates demand bare
//! JSON in an exact shape, and the extractor depends on the model mostly
//! honoring that. Absent profile fields are rendered with fixed defaults so
//! the template never shows an empty slot.

use super::task::FarmProfile;

const DEFAULT_PLANT_TYPE: &str = "Unknown";
const DEFAULT_CURRENT_CROP: &str = "Not specified";
const DEFAULT_FARM_AREA: &str = "Not specified";
const DEFAULT_TEMPERATURE: &str = "25";
const DEFAULT_HUMIDITY: &str = "70";
const DEFAULT_NITROGEN: &str = "100";
const DEFAULT_PHOSPHORUS: &str = "45";
const DEFAULT_POTASSIUM: &str = "48";
const DEFAULT_PH: &str = "7.5";

/// Instruction for a single plant image.
pub fn disease_detection(plant_type: Option<&str>) -> String {
    let plant = plant_type.unwrap_or(DEFAULT_PLANT_TYPE);
    format!(
        "You are an expert plant pathologist. Analyze this plant image and detect any diseases present.\n\
         \n\
         Plant Type: {plant}\n\
         \n\
         Based on the image, provide your response as a JSON object with these exact fields:\n\
         - disease: Name of the detected disease (or \"Healthy Plant\" if no disease)\n\
         - confidence: Confidence level (0-100)\n\
         - severity: One of \"mild\", \"moderate\", or \"severe\"\n\
         - treatment: Recommended treatment\n\
         - preventionTips: Array of prevention tips (as strings)\n\
         \n\
         Return ONLY the JSON object, no other text."
    )
}

/// Instruction built from a farm profile.
pub fn crop_recommendation(profile: &FarmProfile) -> String {
    let current_crop = profile
        .current_crop
        .as_deref()
        .unwrap_or(DEFAULT_CURRENT_CROP);
    let farm_area = profile
        .farm_area
        .as_ref()
        .map(|area| area.to_string())
        .unwrap_or_else(|| DEFAULT_FARM_AREA.to_string());
    let temperature = number_or(
        profile.weather.as_ref().and_then(|w| w.temperature),
        DEFAULT_TEMPERATURE,
    );
    let humidity = number_or(
        profile.weather.as_ref().and_then(|w| w.humidity),
        DEFAULT_HUMIDITY,
    );
    let nitrogen = number_or(
        profile.soil.as_ref().and_then(|s| s.nitrogen),
        DEFAULT_NITROGEN,
    );
    let phosphorus = number_or(
        profile.soil.as_ref().and_then(|s| s.phosphorus),
        DEFAULT_PHOSPHORUS,
    );
    let potassium = number_or(
        profile.soil.as_ref().and_then(|s| s.potassium),
        DEFAULT_POTASSIUM,
    );
    let ph = number_or(profile.soil.as_ref().and_then(|s| s.ph), DEFAULT_PH);

    format!(
        "You are an expert agricultural advisor. Based on the following farm data, provide the top 3 crop recommendations with scores and reasons.\n\
         \n\
         Farm Location: {city}, {state}\n\
         Current Crop: {current_crop}\n\
         Farm Area: {farm_area} hectares\n\
         Weather: Temperature {temperature}\u{b0}C, Humidity {humidity}%\n\
         Soil Data: Nitrogen {nitrogen} kg/ha, Phosphorus {phosphorus} kg/ha, Potassium {potassium} kg/ha, pH {ph}\n\
         \n\
         Provide your response as a JSON array with exactly 3 objects, each containing:\n\
         - name: crop name\n\
         - score: recommendation score (0-100)\n\
         - reason: brief reason for recommendation\n\
         \n\
         Return ONLY the JSON array, no other text.",
        city = profile.location.city,
        state = profile.location.state,
    )
}

fn number_or(value: Option<f64>, default: &str) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| default.to_string())
}
