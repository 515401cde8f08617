//! Gemini `generateContent` client.
//!
//! Speaks the v1beta REST protocol directly. Each [`InferenceBackend::invoke`]
//! call is exactly one HTTP request; retry policy belongs to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::task::InferenceTask;
use super::{InferenceBackend, UpstreamError, prompt};
use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};

/// Longest slice of an upstream error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds a client with the credential taken from the environment
    /// variable named in the config.
    ///
    /// A missing key is deliberately not fatal: the service stays up and
    /// every inference call fails into the fallback path.
    pub fn from_env(config: &UpstreamConfig) -> AppResult<Self> {
        let api_key = std::env::var(config.api_key_env()).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                env_var = config.api_key_env(),
                "upstream API key is not set; all inference calls will fail and fallbacks will be served"
            );
        }
        Self::with_api_key(config, api_key)
    }

    /// Builds a client with an explicit credential.
    pub fn with_api_key(config: &UpstreamConfig, api_key: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(task: &InferenceTask) -> GenerateRequest {
        let parts = match task {
            InferenceTask::DiseaseDetection { image, plant_type } => vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.media_type().as_str().to_string(),
                        data: image.base64().to_string(),
                    },
                },
                Part::Text {
                    text: prompt::disease_detection(plant_type.as_deref()),
                },
            ],
            InferenceTask::CropRecommendation { profile } => vec![Part::Text {
                text: prompt::crop_recommendation(profile),
            }],
        };

        GenerateRequest {
            contents: vec![Content { parts }],
        }
    }
}

#[async_trait]
impl InferenceBackend for GeminiClient {
    async fn invoke(&self, task: &InferenceTask) -> Result<String, UpstreamError> {
        let request = Self::build_request(task);

        tracing::debug!(
            task = task.kind().as_str(),
            model = %self.model,
            "sending generateContent request"
        );

        let response = self
            .http
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        let payload: GenerateResponse = response.json().await?;

        if let Some(error) = payload.error {
            return Err(UpstreamError::Provider {
                message: error.fold_message(),
            });
        }

        let text = payload.candidate_text();
        if text.trim().is_empty() {
            return Err(UpstreamError::EmptyCandidates);
        }

        tracing::debug!(
            task = task.kind().as_str(),
            response_length = text.len(),
            "received generateContent response"
        );

        Ok(text)
    }
}

/// Pulls the provider's own message out of a non-2xx body when it is the
/// usual error envelope, otherwise returns a truncated raw body.
fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error: Some(error) }) => error.fold_message(),
        _ => truncate(body),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{head}... [truncated]")
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl GenerateResponse {
    /// Joined text of the first candidate's parts.
    fn candidate_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiError {
    /// Appends the provider's status word so log classification can see
    /// markers like UNAVAILABLE.
    fn fold_message(&self) -> String {
        match &self.status {
            Some(status) => format!("{} ({status})", self.message),
            None => self.message.clone(),
        }
    }
}
