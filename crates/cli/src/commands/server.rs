//! HTTP server CLI command.

use abtest_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use abtest_web_api::{ApiServer, AppState};
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the server command.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Server address (overrides server.host/server.port from config)
    #[arg(short, long, env = "ANALYTICS_ADDR")]
    pub addr: Option<String>,
}

/// Starts the experiment analysis API.
///
/// # Errors
/// Returns error if the configuration cannot be loaded or the server fails
/// to bind or serve.
pub async fn run_server(args: ServerArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let addr = args.addr.unwrap_or_else(|| config.server.addr());
    tracing::info!(
        samples = config.analysis.bayesian_samples,
        sampler = ?config.analysis.sampler,
        max_concurrent = config.server.max_concurrent_analyses,
        "Starting experiment analysis API"
    );

    let state = AppState::new(&config.analysis, config.server.max_concurrent_analyses)
        .context("Invalid analysis configuration")?;
    ApiServer::new(state).serve(&addr).await
}
