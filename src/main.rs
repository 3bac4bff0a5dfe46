//! Schedule Tracker — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the orchestrator, shared state, and
//! the metrics route.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use games_schedule_tracker::api::{create_router, AppState};
use games_schedule_tracker::cache::FileStore;
use games_schedule_tracker::metrics::Metrics;
use games_schedule_tracker::orchestrator::ScheduleOrchestrator;
use games_schedule_tracker::roster::RosterFileProvider;
use games_schedule_tracker::source::{FallbackEventSource, LiveEventSource};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let metrics = Metrics::init();

    let api_url = env_or("SCHEDULE_API_URL", "https://example.org/events");
    let fallback_path = env_or("FALLBACK_SCHEDULE_PATH", "config/fallback_schedule.json");
    let rules_path = env_or("BROADCAST_RULES_PATH", "config/broadcast_rules.json");
    let roster_path = env_or("ROSTER_PATH", "config/roster.json");
    let cache_dir = env_or("CACHE_DIR", "data/cache");
    let bind = env_or("BIND_ADDR", "0.0.0.0:8000");

    let orchestrator = ScheduleOrchestrator::new(
        Arc::new(LiveEventSource::new(api_url)),
        Arc::new(FallbackEventSource::new(fallback_path)),
        Arc::new(RosterFileProvider::new(roster_path)),
        Arc::new(FileStore::new(cache_dir)),
        rules_path,
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };
    let router = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(target: "api", %bind, "schedule tracker listening");
    axum::serve(listener, router).await.context("server")?;
    Ok(())
}
