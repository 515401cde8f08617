//! Agrovisor HTTP server
//!
//! Starts an Axum web server exposing the crop advisory endpoints.

use std::sync::Arc;

use clap::Parser;

use agrovisor::cli::{Cli, Command, generate_config_template};
use agrovisor::config::Config;
use agrovisor::handlers::{self, AppState};
use agrovisor::telemetry;

/// Config path tried when no --config argument is given.
const IMPLICIT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {path}");
            }
            None => print!("{template}"),
        }
        return Ok(());
    }

    let config = match cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(IMPLICIT_CONFIG_PATH)?,
    };

    telemetry::init(config.observability().log_level());

    let bind_address = config.server().bind_address();
    tracing::info!(
        model = config.upstream().model(),
        max_attempts = config.retry().max_attempts(),
        "Starting agrovisor server on {}",
        bind_address
    );

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
