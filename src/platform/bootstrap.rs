use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::platform::config::ServerConfig;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simuhub_storefront=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn init_env() {
    if dotenvy::dotenv().is_err() {
        tracing::debug!("No .env file found, using the process environment");
    }
}

/// Binds the listener and serves `app` until Ctrl+C.
pub async fn serve(app: Router, server: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}
