use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use skirmish_server::build_router;
use skirmish_server::config::ServerConfig;
use skirmish_server::error::ServerError;
use skirmish_server::state::AppState;
use skirmish_server::world_loop::spawn_world_loop;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Skirmish server failed");
            ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load();
    config.validate()?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(ServerError::Bind)?;
    tracing::info!(
        addr = %config.listen_addr,
        bots = config.world.bots_enabled,
        "Skirmish server listening"
    );

    let world = spawn_world_loop(config.world.clone());
    let state = AppState::new(config, world.commands);
    let app = build_router(state.clone());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve);

    state.stop_world();
    if let Err(e) = world.task.await {
        tracing::error!(error = %e, "World loop panicked");
    }
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
