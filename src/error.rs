//! Error types for Agrovisor
//!
//! All errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::inference::{ExtractError, UpstreamError};

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Malformed request body: {0}")]
    BodyParse(#[source] serde_json::Error),

    #[error("Upstream inference failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Unusable model output: {0}")]
    Extract(#[from] ExtractError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message exposed to HTTP callers.
    ///
    /// Validation failures carry their message verbatim so the client sees
    /// exactly what was missing. Everything else is summarized through
    /// `Display`.
    fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::BodyParse(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Extract(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_validation_error_creates() {
        let err = AppError::Validation("Image data is required".to_string());
        assert_eq!(err.to_string(), "Invalid request: Image data is required");
    }

    #[test]
    fn test_internal_error_creates() {
        let err = AppError::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_config_file_read_error_includes_path() {
        let err = AppError::ConfigFileRead {
            path: "/etc/agrovisor/config.toml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let message = err.to_string();
        assert!(message.contains("/etc/agrovisor/config.toml"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn test_validation_error_response_status() {
        let err = AppError::Validation("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_error_response_status() {
        let err = AppError::Config("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_error_maps_to_bad_gateway() {
        let err = AppError::Upstream(UpstreamError::EmptyCandidates);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_body_parse_error_maps_to_bad_request() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err = AppError::BodyParse(parse_err);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
