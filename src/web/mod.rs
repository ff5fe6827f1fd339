//! Web interface: a single-page form served by axum.

pub mod handlers;
pub mod state;

use crate::config::Config;
use crate::engine::ResumeEngine;
use crate::error::Result;
use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::form))
        .route("/generate", post(handlers::generate))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &Config, engine: ResumeEngine) -> Result<()> {
    let state = AppState::new(engine);
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🌐 Web interface ready at http://{}", addr);
    log::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
