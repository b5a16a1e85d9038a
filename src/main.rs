//! Win-Streak Herald — Binary Entrypoint
//! Boots the Axum HTTP server and wires the pipeline collaborators.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use streak_herald::api::{create_router, AppState};
use streak_herald::config::AppConfig;
use streak_herald::cycle::CycleDeps;
use streak_herald::metrics::Metrics;
use streak_herald::notify::AnnounceClient;
use streak_herald::snapshot::StateStore;
use streak_herald::sources::{HttpLiveSource, HttpRosterSource, HttpStreakSource};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("streak_herald=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Arc::new(AppConfig::from_env().context("invalid configuration")?);
    let metrics = Metrics::init();

    let client = reqwest::Client::new();
    let deps = Arc::new(CycleDeps {
        roster: Arc::new(HttpRosterSource::new(&config, client.clone())),
        streaks: Arc::new(HttpStreakSource::new(&config, client.clone())),
        live: Arc::new(HttpLiveSource::new(&config, client.clone())),
        notifier: Arc::new(AnnounceClient::new(config.announce_url.clone())),
        store: StateStore::new(&config.state_path),
    });

    let state = AppState::new(Arc::clone(&config), deps);
    let router = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "streak-herald listening");
    axum::serve(listener, router).await.context("server exited")?;
    Ok(())
}
