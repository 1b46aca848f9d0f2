use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};

use crate::config::ServerConfig;
use crate::world_loop::{WorldCommand, WorldStats};

#[derive(Clone)]
pub struct AppState {
    /// Command queue of the task that owns the world.
    pub world: mpsc::UnboundedSender<WorldCommand>,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, world: mpsc::UnboundedSender<WorldCommand>) -> Self {
        Self {
            world,
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
        }
    }

    /// Queue a command for the world task. Returns false once the task has
    /// stopped.
    pub fn send(&self, cmd: WorldCommand) -> bool {
        self.world.send(cmd).is_ok()
    }

    /// Ask the world task for population counts. `None` if it has stopped.
    pub async fn world_stats(&self) -> Option<WorldStats> {
        let (reply, rx) = oneshot::channel();
        if !self.send(WorldCommand::Stats { reply }) {
            return None;
        }
        rx.await.ok()
    }

    pub fn stop_world(&self) {
        if !self.send(WorldCommand::Stop) {
            tracing::debug!("world loop already stopped");
        }
    }
}

/// Counts a live WebSocket connection until dropped.
pub struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
