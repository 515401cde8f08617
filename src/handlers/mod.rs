//! HTTP request handlers for the advisory API

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::inference::{GeminiClient, InferenceBackend};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::retry::RetryPolicy;

pub mod disease;
pub mod health;
pub mod metrics;
pub mod recommend;

/// Application state shared across all handlers
///
/// Holds the configuration, the inference backend, the retry policy and
/// the metrics collector. Cloning is cheap: every field is an Arc or
/// contains one.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    backend: Arc<dyn InferenceBackend>,
    retry_policy: RetryPolicy,
    metrics: Metrics,
}

impl AppState {
    /// Create state from configuration.
    ///
    /// Builds a Gemini client whose API key is read from the environment
    /// variable named in the config. A missing key is logged but not
    /// fatal: the service stays up and serves fallbacks.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let backend = Arc::new(GeminiClient::from_env(config.upstream())?);
        Self::with_backend(config, backend)
    }

    /// Create state with an injected inference backend.
    pub fn with_backend(
        config: Arc<Config>,
        backend: Arc<dyn InferenceBackend>,
    ) -> AppResult<Self> {
        let retry_policy = config.retry().policy()?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("failed to register metrics: {e}")))?;

        Ok(Self {
            config,
            backend,
            retry_policy,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &dyn InferenceBackend {
        self.backend.as_ref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the application router with all routes and middleware attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/disease-detection", post(disease::handler))
        .route("/api/recommendations", post(recommend::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
