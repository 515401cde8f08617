//! Concurrent requests must not share retry state or fallback outcomes.
//!
//! The backend here answers by task kind: detection succeeds, advice
//! always fails. Interleaving the two proves one request's retry loop
//! and fallback never bleed into another's.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use agrovisor::config::Config;
use agrovisor::handlers::{self, AppState};
use agrovisor::inference::{InferenceBackend, InferenceTask, UpstreamError};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

const REPORT: &str = r#"{"disease": "Leaf Spot", "confidence": 82, "severity": "mild", "treatment": "Prune affected leaves."}"#;

/// Succeeds for detection tasks, returns 503 for advice tasks.
struct SplitBackend {
    detection_calls: AtomicU32,
    advice_calls: AtomicU32,
}

#[async_trait]
impl InferenceBackend for SplitBackend {
    async fn invoke(&self, task: &InferenceTask) -> Result<String, UpstreamError> {
        match task {
            InferenceTask::DiseaseDetection { .. } => {
                self.detection_calls.fetch_add(1, Ordering::SeqCst);
                Ok(REPORT.to_string())
            }
            InferenceTask::CropRecommendation { .. } => {
                self.advice_calls.fetch_add(1, Ordering::SeqCst);
                Err(UpstreamError::Status {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                })
            }
        }
    }
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request should build")
}

#[tokio::test]
async fn interleaved_outcomes_stay_independent() {
    // One attempt per request keeps the failing half free of timer waits.
    let config = Config::from_str("[retry]\nmax_attempts = 1\n").expect("config should parse");
    let backend = Arc::new(SplitBackend {
        detection_calls: AtomicU32::new(0),
        advice_calls: AtomicU32::new(0),
    });
    let state =
        AppState::with_backend(Arc::new(config), backend.clone()).expect("state should build");
    let app = handlers::router(state);

    let mut requests = Vec::new();
    for _ in 0..4 {
        requests.push(app.clone().oneshot(post(
            "/api/disease-detection",
            r#"{"imageBase64": "aGVsbG8=", "plantType": "Chili"}"#,
        )));
        requests.push(app.clone().oneshot(post(
            "/api/recommendations",
            r#"{"location": {"city": "Ludhiana", "state": "Punjab"}}"#,
        )));
    }

    let responses = futures::future::join_all(requests).await;
    assert_eq!(responses.len(), 8);

    for (index, result) in responses.into_iter().enumerate() {
        let response = result.expect("request should complete");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body: Value = serde_json::from_slice(&bytes).expect("body should be JSON");

        if index % 2 == 0 {
            assert_eq!(body["disease"], "Leaf Spot", "response {index}");
        } else {
            // The failing half lands on the Punjab table, not the
            // detection fallback and not a mixed-up report.
            assert_eq!(body["recommendations"][0]["name"], "Wheat", "response {index}");
            assert_eq!(body["recommendations"][0]["score"], 90, "response {index}");
        }
    }

    assert_eq!(backend.detection_calls.load(Ordering::SeqCst), 4);
    assert_eq!(backend.advice_calls.load(Ordering::SeqCst), 4);
}
