//! The acceptor pool: `thread * max_connection_per_thread` pre-spawned
//! slots, each looping `listener.accept()` against one shared
//! `tokio::net::TcpListener`. Tokio listeners support concurrent `accept()`
//! calls from many tasks natively, so the pool needs no `SO_REUSEPORT`
//! trick — it's realized as that many plain tasks over one `Arc<TcpListener>`.
//!
//! Each slot is restart-on-error, grounded on the teacher's
//! `spawn_event_broadcaster`/`spawn_idle_room_cleanup` background-task
//! pattern: a loop selecting against the shared `CancellationToken`, with a
//! small supervisor around it that respawns a slot if its task panics.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use pmm_core::endpoint::Endpoint;
use tokio::net::TcpListener;

use crate::config::IpVersionSetting;
use crate::dispatcher;
use crate::session::SessionState;
use crate::state::{AppState, SessionGuard};

/// Bind the listening socket per `config.common.ip_version`/`port`.
pub async fn bind(state: &AppState) -> std::io::Result<TcpListener> {
    let addr = match state.config.common.ip_version {
        IpVersionSetting::V4 => format!("0.0.0.0:{}", state.config.common.port),
        IpVersionSetting::V6 => format!("[::]:{}", state.config.common.port),
    };
    TcpListener::bind(&addr).await
}

/// Spawn the full pool and return a handle per slot. Callers await these
/// (e.g. after cancelling `state.shutdown`) to know every slot has drained.
pub fn spawn_pool(listener: Arc<TcpListener>, state: AppState) -> Vec<tokio::task::JoinHandle<()>> {
    let slot_count = (state.config.common.thread as usize) * (state.config.common.max_connection_per_thread as usize);
    (0..slot_count).map(|id| spawn_supervised_slot(id, Arc::clone(&listener), state.clone())).collect()
}

/// Wrap one slot's task in a supervisor: if the slot task panics rather
/// than returning normally (which only happens on shutdown), log it and
/// respawn a fresh slot in its place.
fn spawn_supervised_slot(id: usize, listener: Arc<TcpListener>, state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let shutdown = state.shutdown.clone();
            let handle = tokio::spawn(run_slot(Arc::clone(&listener), state.clone()));
            match handle.await {
                Ok(()) => break,
                Err(join_error) => {
                    tracing::error!(slot = id, error = %join_error, "acceptor slot panicked, restarting");
                    if shutdown.is_cancelled() {
                        break;
                    }
                },
            }
        }
    })
}

/// One slot's lifetime: accept a connection, run it to completion, release
/// whatever it owned, then go back for the next one — repeat until
/// shutdown is signalled.
async fn run_slot(listener: Arc<TcpListener>, state: AppState) {
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => return,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        let endpoint = Endpoint::from_socket_addr(addr);
                        let _guard = SessionGuard::new(Arc::clone(&state.active_sessions));
                        let (session, result) = dispatcher::run_session(stream, endpoint, state.clone()).await;
                        release_session(&state, &session);
                        log_session_end(&endpoint, result);
                    },
                    Err(e) => {
                        state.rejected_connections.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "accept failed");
                    },
                }
            }
        }
    }
}

/// Release whatever a finished session owned: its hosted room (if any) and
/// its allocated player-name tag (if authentication ever succeeded). Runs
/// regardless of how the session ended — clean disconnect, timeout, or a
/// protocol fault.
fn release_session(state: &AppState, session: &SessionState) {
    if let Some(room_id) = session.hosting_room_id() {
        state.rooms.try_remove(room_id);
    }
    if let Some(full_name) = session.player_full_name() {
        let _ = state.player_names.release(full_name);
    }
}

fn log_session_end(endpoint: &Endpoint, result: Result<(), crate::error::SessionError>) {
    match result {
        Ok(()) => tracing::info!(endpoint = ?endpoint, "session ended"),
        Err(e) if e.is_continuable() => tracing::info!(endpoint = ?endpoint, "session idle-disconnected"),
        Err(e) => tracing::warn!(endpoint = ?endpoint, error = %e, "session ended with a fault"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn pool_accepts_a_connection_and_drains_on_shutdown() {
        let mut cfg = ServerConfig::default();
        cfg.common.port = 0;
        cfg.authentication.game_id = "mygame".to_string();
        let state = AppState::new(cfg);

        let listener = Arc::new(bind(&state).await.unwrap());
        let addr = listener.local_addr().unwrap();
        let handles = spawn_pool(Arc::clone(&listener), state.clone());
        assert_eq!(handles.len(), 1);

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(&[0xFF]).await.unwrap();
        let mut buf = [0u8; 1];
        let _ = client.read(&mut buf).await;

        state.shutdown.cancel();
        for handle in handles {
            tokio::time::timeout(std::time::Duration::from_secs(2), handle).await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn rejected_connections_counter_is_untouched_on_clean_accept() {
        let mut cfg = ServerConfig::default();
        cfg.common.port = 0;
        let state = AppState::new(cfg);
        let listener = Arc::new(bind(&state).await.unwrap());
        let addr = listener.local_addr().unwrap();
        let handles = spawn_pool(Arc::clone(&listener), state.clone());

        let _client = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(state.rejected_connections.load(Ordering::Relaxed), 0);

        state.shutdown.cancel();
        for handle in handles {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
        }
    }
}
