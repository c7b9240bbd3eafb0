pub mod acceptor;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod player_registry;
pub mod prober;
pub mod room_store;
pub mod session;
pub mod state;

use std::sync::Arc;

use config::ServerConfig;
use state::AppState;
use tokio::net::TcpListener;

/// Build the shared state and bind the listening socket from a config.
/// Mirrors the teacher's `build_app`: one call that a binary's `main` and
/// an integration test's harness both go through, so the two can never
/// drift apart on how the server is wired up.
pub async fn build_server(config: ServerConfig) -> std::io::Result<(Arc<TcpListener>, AppState)> {
    let state = AppState::new(config);
    let listener = Arc::new(acceptor::bind(&state).await?);
    Ok((listener, state))
}

/// Spawn the acceptor pool and wait for every slot to drain after
/// `state.shutdown` is cancelled.
pub async fn run(listener: Arc<TcpListener>, state: AppState) {
    let handles = acceptor::spawn_pool(Arc::clone(&listener), state.clone());
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "acceptor slot task failed to join");
        }
    }
}
