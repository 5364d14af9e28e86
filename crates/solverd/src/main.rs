//! Solver daemon - answers assignment questions over HTTP.
//!
//! Combines deterministic handlers for well-known question shapes with a
//! generative-service fallback for open-ended reasoning.

use anyhow::Result;
use solverd::config::SolverConfig;
use solverd::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("solverd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = SolverConfig::load();
    if config.ai.api_token.is_none() {
        info!("No AI token configured; generative paths will degrade");
    }

    let state = AppState::new(config)?;
    server::run(state).await
}
