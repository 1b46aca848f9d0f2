pub mod config;
pub mod error;
pub mod health;
pub mod state;
pub mod world_loop;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;

use config::ServerConfig;
use state::AppState;

/// Spawn the world loop and build the Axum router and application state
/// around it.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let world = world_loop::spawn_world_loop(config.world.clone());
    let state = AppState::new(config, world.commands);
    (build_router(state.clone()), state)
}

/// Routes: the `/ws` gateway, health probes and the static client bundle.
pub fn build_router(state: AppState) -> Router<()> {
    let web_root = state.config.web_root.clone();
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state)
}
