//! Standoff API server entry point.

use std::sync::Arc;

use standoff_api::config::Config;
use standoff_api::decision::HttpDecisionAdapter;
use standoff_api::error::AppError;
use standoff_api::speech::HttpTtsClient;
use standoff_api::state::AppState;
use standoff_api::{build_router, telemetry};
use standoff_core::clock::SystemClock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Standoff API server");

    let adapter = HttpDecisionAdapter::new(config.decision_url.clone())?;
    let mut app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(adapter),
        config.session_settings(),
    );
    match &config.tts_url {
        Some(tts_url) => {
            app_state = app_state.with_speech(Arc::new(HttpTtsClient::new(tts_url.clone())?));
        }
        None => tracing::warn!("TTS_URL not set; speech synthesis is disabled"),
    }

    // TODO: Replace CorsLayer::permissive() with the game client's origin once it is deployed.
    let app = build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!(%addr, decision_url = %config.decision_url, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
