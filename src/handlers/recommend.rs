//! Crop recommendation endpoint
//!
//! Handles POST /api/recommendations. This endpoint never hard-fails:
//! whatever goes wrong, the caller receives a 3-entry recommendation
//! list. When the strict request parse fails, a second, more forgiving
//! pass over the raw body tries to recover at least the state name so
//! the fallback table lookup stays regional.

use axum::{Extension, Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

use crate::advisory::CropRecommendation;
use crate::fallback;
use crate::handlers::AppState;
use crate::inference::{
    self, FarmArea, FarmProfile, InferenceTask, Location, SoilSample, TaskKind, WeatherSample,
};
use crate::metrics::{FallbackReason, Outcome};
use crate::middleware::RequestId;
use crate::retry;

/// Crop recommendation request from the dashboard.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    location: Location,
    #[serde(default)]
    soil_data: Option<SoilSample>,
    #[serde(default)]
    weather_data: Option<WeatherSample>,
    #[serde(default)]
    farm_area: Option<FarmArea>,
    #[serde(default)]
    current_crop: Option<String>,
}

/// Crop recommendation response.
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<CropRecommendation>,
}

/// POST /api/recommendations handler
///
/// Always returns 200 with exactly three recommendations: parsed model
/// output on the happy path, a regional fallback table otherwise.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Json<RecommendationResponse> {
    tracing::debug!(
        request_id = %request_id,
        body_bytes = body.len(),
        "Received crop recommendation request"
    );

    let request: RecommendationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let state_key = salvage_state_key(&body);
            tracing::warn!(
                request_id = %request_id,
                error = %err,
                state_key = %state_key,
                "Request body unreadable, serving fallback recommendations"
            );
            state
                .metrics()
                .record_request(TaskKind::CropRecommendation, Outcome::Fallback);
            state
                .metrics()
                .record_fallback(TaskKind::CropRecommendation, FallbackReason::BadRequestBody);
            return Json(RecommendationResponse {
                recommendations: fallback::recommendations(&state_key),
            });
        }
    };

    let state_key = request.location.state.clone();
    let task = InferenceTask::CropRecommendation {
        profile: FarmProfile {
            location: request.location,
            soil: request.soil_data,
            weather: request.weather_data,
            farm_area: request.farm_area,
            current_crop: request.current_crop,
        },
    };

    let raw = match retry::run_with_backoff(state.retry_policy(), || state.backend().invoke(&task))
        .await
    {
        Ok(raw) => raw,
        Err(exhausted) => {
            tracing::error!(
                request_id = %request_id,
                attempts = exhausted.attempts,
                class = exhausted.class.as_str(),
                error = %exhausted.last_error,
                state_key = %state_key,
                "Recommendation upstream exhausted, serving fallback table"
            );
            state
                .metrics()
                .record_request(TaskKind::CropRecommendation, Outcome::Fallback);
            state.metrics().record_fallback(
                TaskKind::CropRecommendation,
                FallbackReason::UpstreamExhausted,
            );
            return Json(RecommendationResponse {
                recommendations: fallback::recommendations(&state_key),
            });
        }
    };

    match inference::recommendations(&raw) {
        Ok(recommendations) => {
            tracing::info!(
                request_id = %request_id,
                count = recommendations.len(),
                "Crop recommendation completed"
            );
            state
                .metrics()
                .record_request(TaskKind::CropRecommendation, Outcome::Success);
            Json(RecommendationResponse { recommendations })
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                error = %err,
                state_key = %state_key,
                "Model output unusable, serving fallback table"
            );
            state
                .metrics()
                .record_request(TaskKind::CropRecommendation, Outcome::Fallback);
            state
                .metrics()
                .record_fallback(TaskKind::CropRecommendation, FallbackReason::UnusableOutput);
            Json(RecommendationResponse {
                recommendations: fallback::recommendations(&state_key),
            })
        }
    }
}

/// Best-effort extraction of `location.state` from a body the strict
/// parse rejected. Falls back to the default state key when even this
/// forgiving pass finds nothing usable.
fn salvage_state_key(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("location")?
                .get("state")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback::DEFAULT_STATE_KEY.to_string())
}
