//! Inference task descriptions.
//!
//! Built once from the incoming request body, immutable afterwards. The
//! task captures everything the upstream call needs; nothing here touches
//! the network.

use serde::Deserialize;
use std::fmt;

/// What the upstream is being asked to do.
#[derive(Debug, Clone)]
pub enum InferenceTask {
    DiseaseDetection {
        image: ImageData,
        plant_type: Option<String>,
    },
    CropRecommendation {
        profile: FarmProfile,
    },
}

impl InferenceTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::DiseaseDetection { .. } => TaskKind::DiseaseDetection,
            Self::CropRecommendation { .. } => TaskKind::CropRecommendation,
        }
    }
}

/// Task discriminant, used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    DiseaseDetection,
    CropRecommendation,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiseaseDetection => "disease_detection",
            Self::CropRecommendation => "crop_recommendation",
        }
    }
}

/// Image media type sent to the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Base64 image payload plus its declared media type.
///
/// The payload is forwarded as the caller supplied it; no decode happens
/// here. A payload the provider cannot decode fails upstream and flows
/// through the normal retry/fallback path.
#[derive(Debug, Clone)]
pub struct ImageData {
    base64: String,
    media_type: MediaType,
}

impl ImageData {
    /// Accepts either a full data URI or bare base64.
    ///
    /// The media type is `image/png` only when the data-URI prefix declares
    /// it, `image/jpeg` otherwise. The payload is the segment after the
    /// first comma when one exists and is non-empty, else the whole string.
    pub fn from_request(raw: &str) -> Self {
        let media_type = if raw.contains("data:image/png") {
            MediaType::Png
        } else {
            MediaType::Jpeg
        };
        let base64 = raw
            .split(',')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .unwrap_or(raw)
            .to_string();
        Self { base64, media_type }
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }
}

/// Everything the recommendation prompt interpolates.
#[derive(Debug, Clone)]
pub struct FarmProfile {
    pub location: Location,
    pub soil: Option<SoilSample>,
    pub weather: Option<WeatherSample>,
    pub farm_area: Option<FarmArea>,
    pub current_crop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

/// NPK and pH readings, each individually optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoilSample {
    #[serde(default)]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    pub phosphorus: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
}

/// Current conditions as reported by the dashboard's weather widget, which
/// uses meteorological field names on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherSample {
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Option<f64>,
    #[serde(default, rename = "relative_humidity_2m")]
    pub humidity: Option<f64>,
}

/// Farm area as the dashboard sends it: a number or a free-form string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FarmArea {
    Number(f64),
    Text(String),
}

impl fmt::Display for FarmArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}
