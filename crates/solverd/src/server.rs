//! HTTP server for solverd

use crate::ai_client::{ChatClient, HttpChatClient};
use crate::config::SolverConfig;
use crate::router::QuestionRouter;
use crate::routes;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub config: Arc<SolverConfig>,
    pub router: QuestionRouter,
}

impl AppState {
    pub fn new(config: SolverConfig) -> Result<Self> {
        let config = Arc::new(config);
        let client = HttpChatClient::new(config.ai.clone())?;
        let router = QuestionRouter::new(config.clone(), Arc::new(client));
        Ok(Self { config, router })
    }

    /// State with an explicit client - used by tests with a fake.
    pub fn with_client(config: SolverConfig, client: Arc<dyn ChatClient>) -> Self {
        let config = Arc::new(config);
        let router = QuestionRouter::new(config.clone(), client);
        Self { config, router }
    }
}

/// Build the application router with all layers applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .merge(routes::answer_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = build_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
