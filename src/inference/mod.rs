//! Upstream inference: task types, prompt templates, the Gemini client, and
//! model-output extraction.
//!
//! The seam between handlers and the network is the [`InferenceBackend`]
//! trait. Production wires in [`GeminiClient`]; tests wire in scripted
//! fakes. One call to [`InferenceBackend::invoke`] is one upstream request,
//! no retry, no caching; the retry loop lives in [`crate::retry`].

mod extract;
mod gemini;
mod prompt;
mod task;

pub use extract::{ExtractError, disease_report, recommendations, strip_fences};
pub use gemini::GeminiClient;
pub use task::{
    FarmArea, FarmProfile, ImageData, InferenceTask, Location, MediaType, SoilSample, TaskKind,
    WeatherSample,
};

use async_trait::async_trait;

use crate::retry::ProviderStatus;

/// One-shot call into the generative upstream.
///
/// Implementations must be idempotent from the caller's perspective:
/// repeated calls with the same task are independent requests.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Performs a single inference request and returns the model's raw text.
    async fn invoke(&self, task: &InferenceTask) -> Result<String, UpstreamError>;
}

/// Failures from a single upstream call.
///
/// All variants flow into the retry loop unchanged; the distinction matters
/// for log classification, not control flow.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Non-2xx HTTP status. The message folds in the provider's own error
    /// text when the body carried one.
    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, TLS, timeout, or body-decoding failure below HTTP.
    #[error("failed to reach upstream: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose body carried a provider error object.
    #[error("upstream reported an error: {message}")]
    Provider { message: String },

    /// 2xx response with no usable candidate text.
    #[error("upstream response contained no candidate text")]
    EmptyCandidates,
}

impl ProviderStatus for UpstreamError {
    fn provider_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Provider { .. } | Self::EmptyCandidates => None,
        }
    }
}
