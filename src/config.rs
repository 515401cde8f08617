//! Configuration loading and validation.
//!
//! Settings come from a TOML file with four sections: `[server]`,
//! `[upstream]`, `[retry]` and `[observability]`. Every field has a
//! default, so an empty file (or no file at all) yields a working
//! configuration that talks to the public Gemini endpoint.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

/// Longest allowed upstream request timeout, in seconds.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_initial_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_INITIAL_DELAY.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    server: ServerConfig,
    upstream: UpstreamConfig,
    retry: RetryConfig,
    observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            retry: RetryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&contents).map_err(|source| AppError::ConfigParseFailed {
                path: path.display().to_string(),
                source,
            })?;

        config
            .validate()
            .map_err(|reason| AppError::ConfigValidationFailed {
                path: path.display().to_string(),
                reason,
            })?;

        Ok(config)
    }

    /// Loads from `path` if it exists, otherwise falls back to defaults.
    ///
    /// Used for the implicit config path so the service starts without
    /// any file on disk. An explicit `--config` goes through
    /// [`Config::from_file`] and fails loudly instead.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks cross-field invariants. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.host.is_empty() {
            return Err("server.host must not be empty".to_string());
        }

        self.upstream.validate()?;
        self.retry.validate()?;

        if !LOG_LEVELS.contains(&self.observability.log_level.as_str()) {
            return Err(format!(
                "observability.log_level must be one of {LOG_LEVELS:?}, got '{}'",
                self.observability.log_level
            ));
        }

        Ok(())
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn observability(&self) -> &ObservabilityConfig {
        &self.observability
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s).map_err(|source| AppError::ConfigParseFailed {
            path: "<string>".to_string(),
            source,
        })?;

        config
            .validate()
            .map_err(|reason| AppError::ConfigValidationFailed {
                path: "<string>".to_string(),
                reason,
            })?;

        Ok(config)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Gemini endpoint settings.
///
/// The API key itself never lives in the file; `api_key_env` names the
/// environment variable it is read from at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    model: String,
    base_url: String,
    request_timeout_seconds: u64,
    api_key_env: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl UpstreamConfig {
    fn validate(&self) -> Result<(), String> {
        if self.model.is_empty() {
            return Err("upstream.model must not be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "upstream.base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        if self.request_timeout_seconds == 0
            || self.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(format!(
                "upstream.request_timeout_seconds must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}, got {}",
                self.request_timeout_seconds
            ));
        }

        if self.api_key_env.is_empty() {
            return Err("upstream.api_key_env must not be empty".to_string());
        }

        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }
}

/// Retry budget for upstream calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    max_attempts: u32,
    initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        // RetryPolicy::new owns the bounds; surface its message verbatim.
        self.to_policy().map(|_| ()).map_err(|err| err.to_string())
    }

    fn to_policy(&self) -> AppResult<RetryPolicy> {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Builds the validated [`RetryPolicy`] this config describes.
    pub fn policy(&self) -> AppResult<RetryPolicy> {
        self.to_policy()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ObservabilityConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[upstream]
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com"
request_timeout_seconds = 45
api_key_env = "GEMINI_API_KEY"

[retry]
max_attempts = 4
initial_delay_ms = 500

[observability]
log_level = "debug"
"#;

    #[test]
    fn full_config_parses() {
        let config = Config::from_str(FULL_CONFIG).unwrap();

        assert_eq!(config.server().host(), "127.0.0.1");
        assert_eq!(config.server().port(), 8080);
        assert_eq!(config.server().bind_address(), "127.0.0.1:8080");
        assert_eq!(config.upstream().model(), "gemini-2.5-flash");
        assert_eq!(config.upstream().request_timeout(), Duration::from_secs(45));
        assert_eq!(config.retry().max_attempts(), 4);
        assert_eq!(config.retry().initial_delay(), Duration::from_millis(500));
        assert_eq!(config.observability().log_level(), "debug");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.server().bind_address(), "0.0.0.0:3000");
        assert_eq!(config.upstream().model(), "gemini-2.5-flash");
        assert_eq!(
            config.upstream().base_url(),
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.upstream().api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.retry().max_attempts(), 5);
        assert_eq!(config.retry().initial_delay(), Duration::from_millis(2000));
        assert_eq!(config.observability().log_level(), "info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::from_str("[server]\nport = 9000\n").unwrap();

        assert_eq!(config.server().host(), "0.0.0.0");
        assert_eq!(config.server().port(), 9000);
        assert_eq!(config.retry().max_attempts(), 5);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = Config::from_str("[server]\nhosty = \"oops\"\n");

        assert!(matches!(result, Err(AppError::ConfigParseFailed { .. })));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let result = Config::from_str("[observability]\nlog_level = \"verbose\"\n");

        match result {
            Err(AppError::ConfigValidationFailed { reason, .. }) => {
                assert!(reason.contains("log_level"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = Config::from_str("[upstream]\nrequest_timeout_seconds = 0\n");

        assert!(matches!(
            result,
            Err(AppError::ConfigValidationFailed { .. })
        ));
    }

    #[test]
    fn oversized_timeout_is_rejected() {
        let result = Config::from_str("[upstream]\nrequest_timeout_seconds = 301\n");

        assert!(matches!(
            result,
            Err(AppError::ConfigValidationFailed { .. })
        ));
    }

    #[test]
    fn base_url_requires_http_scheme() {
        let result =
            Config::from_str("[upstream]\nbase_url = \"generativelanguage.googleapis.com\"\n");

        match result {
            Err(AppError::ConfigValidationFailed { reason, .. }) => {
                assert!(reason.contains("base_url"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let result = Config::from_str("[retry]\nmax_attempts = 0\n");

        assert!(matches!(
            result,
            Err(AppError::ConfigValidationFailed { .. })
        ));
    }

    #[test]
    fn retry_config_builds_matching_policy() {
        let config =
            Config::from_str("[retry]\nmax_attempts = 3\ninitial_delay_ms = 100\n").unwrap();
        let policy = config.retry().policy().unwrap();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.initial_delay(), Duration::from_millis(100));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server().port(), 8080);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = Config::from_file("/nonexistent/agrovisor.toml");

        assert!(matches!(result, Err(AppError::ConfigFileRead { .. })));
    }

    #[test]
    fn load_or_default_without_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.server().bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }
}
