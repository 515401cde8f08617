//! Disease detection endpoint
//!
//! Handles POST /api/disease-detection. The request carries a base64
//! image of a plant; the response is a structured disease report. When
//! the upstream model cannot produce one, a canned report is served
//! instead of an error, so callers always get a schema-valid body.

use axum::{Extension, Json, body::Bytes, extract::State};
use serde::Deserialize;

use crate::advisory::DiseaseReport;
use crate::error::AppError;
use crate::fallback;
use crate::handlers::AppState;
use crate::inference::{self, ImageData, InferenceTask, TaskKind};
use crate::metrics::{FallbackReason, Outcome};
use crate::middleware::RequestId;
use crate::retry;

/// Disease detection request from the dashboard.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseDetectionRequest {
    #[serde(default)]
    image_base64: Option<String>,
    #[serde(default)]
    plant_type: Option<String>,
}

/// POST /api/disease-detection handler
///
/// Outcomes:
/// - `400` with `{"error": "Image data is required"}` when the body parses
///   but carries no image.
/// - `200` with a parsed [`DiseaseReport`] when the model answers usably.
/// - `200` with the canned fallback report for every other failure,
///   including an unreadable body, exhausted retries and unparseable
///   model output.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<DiseaseReport>, AppError> {
    tracing::debug!(
        request_id = %request_id,
        body_bytes = body.len(),
        "Received disease detection request"
    );

    let request: DiseaseDetectionRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                error = %err,
                "Request body unreadable, serving fallback report"
            );
            state
                .metrics()
                .record_request(TaskKind::DiseaseDetection, Outcome::Fallback);
            state
                .metrics()
                .record_fallback(TaskKind::DiseaseDetection, FallbackReason::BadRequestBody);
            return Ok(Json(fallback::disease_report()));
        }
    };

    // Absent and empty-string images are both rejected.
    let image_raw = match request.image_base64.as_deref() {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            tracing::debug!(request_id = %request_id, "Rejecting request without image data");
            state
                .metrics()
                .record_request(TaskKind::DiseaseDetection, Outcome::Rejected);
            return Err(AppError::Validation("Image data is required".to_string()));
        }
    };

    let task = InferenceTask::DiseaseDetection {
        image: ImageData::from_request(image_raw),
        plant_type: request.plant_type,
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
                "Disease detection upstream exhausted, serving fallback report"
            );
            state
                .metrics()
                .record_request(TaskKind::DiseaseDetection, Outcome::Fallback);
            state.metrics().record_fallback(
                TaskKind::DiseaseDetection,
                FallbackReason::UpstreamExhausted,
            );
            return Ok(Json(fallback::disease_report()));
        }
    };

    match inference::disease_report(&raw) {
        Ok(report) => {
            tracing::info!(
                request_id = %request_id,
                disease = %report.disease,
                confidence = report.confidence,
                "Disease detection completed"
            );
            state
                .metrics()
                .record_request(TaskKind::DiseaseDetection, Outcome::Success);
            Ok(Json(report))
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                error = %err,
                "Model output unusable, serving fallback report"
            );
            state
                .metrics()
                .record_request(TaskKind::DiseaseDetection, Outcome::Fallback);
            state
                .metrics()
                .record_fallback(TaskKind::DiseaseDetection, FallbackReason::UnusableOutput);
            Ok(Json(fallback::disease_report()))
        }
    }
}
