// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::matcher::MatchedEvent;
use crate::orchestrator::{DebugSnapshot, ScheduleOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScheduleOrchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/schedule", get(schedule))
        .route("/debug/cache", get(debug_cache))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `?refresh=1` (or `true`) bypasses cache and throttle for a synchronous
/// live fetch.
fn bypass_requested(q: &HashMap<String, String>) -> bool {
    matches!(
        q.get("refresh").map(String::as_str),
        Some("1") | Some("true")
    )
}

async fn schedule(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Vec<MatchedEvent>>, (StatusCode, String)> {
    let bypass = bypass_requested(&q);
    match state.orchestrator.get_schedule(bypass).await {
        Ok(events) => Ok(Json(events)),
        Err(e) => {
            tracing::error!(target: "api", error = %e, "schedule unavailable");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "schedule data unavailable".to_string(),
            ))
        }
    }
}

async fn debug_cache(State(state): State<AppState>) -> Json<DebugSnapshot> {
    Json(state.orchestrator.debug_snapshot().await)
}
