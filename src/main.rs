use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use portal_web::app::{router, AppState};
use portal_web::client::ReqwestTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORTAL_BACKEND_URL, PORTAL_SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = portal_web::config::config().clone();
    tracing::info!("Starting portal in {:?} mode", config.environment);
    tracing::info!("Backend at {}", config.backend.base_url);
    if portal_web::is_production!() && config.cookies.secrets.is_empty() {
        tracing::warn!("PORTAL_COOKIE_SECRETS is not set, locale and theme preferences will not persist");
    }

    let port = config.server.port;
    let transport = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
    let state = AppState::new(config, transport).context("invalid session configuration (set PORTAL_SESSION_SECRET)")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Portal listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await.context("server")?;
    Ok(())
}
