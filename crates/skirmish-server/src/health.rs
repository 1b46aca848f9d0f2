use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionInfo,
    pub world: WorldInfo,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
}

#[derive(Serialize, Default)]
pub struct WorldInfo {
    pub players: usize,
    pub bots: usize,
}

/// Server status, connection count and world population as JSON.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);

    let (status, world) = match state.world_stats().await {
        Some(stats) => (
            "healthy",
            WorldInfo {
                players: stats.players,
                bots: stats.bots,
            },
        ),
        None => ("degraded", WorldInfo::default()),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionInfo { websocket: ws },
        world,
    })
}

/// Ready once the world loop answers a query.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.world_stats().await.is_some() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready: world loop stopped")
    }
}
