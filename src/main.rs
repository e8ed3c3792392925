// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TikTok Cross-Post Connector
//!
//! Publishes queued creator posts to TikTok on behalf of tenants.

use std::sync::Arc;
use tiktok_crosspost::{
    config::{Config, SettingsBackend},
    db::{FirestoreDb, InMemorySettingsStore, SettingsStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        api = %config.tiktok_api_url,
        daily_post_limit = config.daily_post_limit,
        "Starting TikTok crosspost connector"
    );

    let store: Arc<dyn SettingsStore> = match config.settings_backend {
        SettingsBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        SettingsBackend::Memory => {
            tracing::warn!("Using in-memory settings store; state is lost on restart");
            Arc::new(InMemorySettingsStore::new())
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    // Build router
    let app = tiktok_crosspost::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tiktok_crosspost=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
