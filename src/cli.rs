//! Command-line interface
//!
//! Provides argument parsing and subcommand handling for the agrovisor binary.

use clap::{Parser, Subcommand};

/// Crop advisory API backed by Gemini with deterministic fallbacks
#[derive(Parser)]
#[command(name = "agrovisor")]
#[command(version)]
#[command(about = "Crop advisory API backed by Gemini with deterministic fallbacks")]
#[command(
    long_about = "Agrovisor serves plant disease detection and crop recommendation \
    endpoints. Upstream calls are retried with exponential backoff, and every \
    failure path degrades to a canned, schema-valid response."
)]
pub struct Cli {
    /// Path to configuration file (built-in defaults are used when omitted
    /// and ./config.toml does not exist)
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Agrovisor Configuration
# =======================
#
# This file configures the HTTP server, the Gemini upstream, the retry
# budget, and observability settings. Every value shown here matches the
# built-in default; the service also starts with no config file at all.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# GEMINI UPSTREAM
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# Model invoked for both disease detection and crop recommendations
model = "gemini-2.5-flash"

# API base URL
base_url = "https://generativelanguage.googleapis.com"

# Per-attempt request timeout in seconds (1-300)
request_timeout_seconds = 30

# Environment variable the API key is read from at startup.
# The key itself never lives in this file.
api_key_env = "GEMINI_API_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# RETRY BUDGET
# ─────────────────────────────────────────────────────────────────────────────

[retry]
# Upstream attempts per request (1-10)
max_attempts = 5

# Delay before the second attempt, in milliseconds.
# The delay doubles after every failed attempt.
initial_delay_ms = 2000

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_implicit_config() {
        let cli = Cli::parse_from(["agrovisor"]);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["agrovisor", "--config", "custom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["agrovisor", "config"]);
        assert!(matches!(cli.command, Some(Command::Config { output: None })));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["agrovisor", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_parses_as_valid_configuration() {
        let template = generate_config_template();
        let config = Config::from_str(template).expect("template should be a valid config");

        assert_eq!(config.server().bind_address(), "0.0.0.0:3000");
        assert_eq!(config.upstream().model(), "gemini-2.5-flash");
        assert_eq!(config.retry().max_attempts(), 5);
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[upstream]"));
        assert!(template.contains("[retry]"));
        assert!(template.contains("[observability]"));
    }
}
