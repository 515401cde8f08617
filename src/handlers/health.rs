//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Configured upstream model name
    pub model: String,
}

/// Health check handler
///
/// Returns 200 OK with the configured model name. The service is
/// considered healthy as long as it can serve responses, which it can
/// even without upstream connectivity thanks to the fallback tables.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            model: state.config().upstream().model().to_string(),
        }),
    )
}
