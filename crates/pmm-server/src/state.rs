//! Process-wide shared state: the room store, the player-name registry, the
//! resolved configuration, the shutdown signal, and a handful of atomic
//! counters used for logging and tests. Grounded on the teacher's
//! `AppState`/`ConnectionGuard` shape, scaled down to what this protocol
//! actually shares across sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::player_registry::PlayerNameRegistry;
use crate::room_store::RoomStore;

#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomStore>,
    pub player_names: Arc<PlayerNameRegistry>,
    pub config: Arc<ServerConfig>,
    pub shutdown: CancellationToken,
    pub active_sessions: Arc<AtomicUsize>,
    pub rejected_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            rooms: Arc::new(RoomStore::new()),
            player_names: Arc::new(PlayerNameRegistry::new()),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
            active_sessions: Arc::new(AtomicUsize::new(0)),
            rejected_connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// RAII guard tracking one active session slot. Incremented on acquire,
/// decremented on drop regardless of how the session task exits.
pub struct SessionGuard {
    counter: Arc<AtomicUsize>,
}

impl SessionGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_guard_increments_and_decrements() {
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = SessionGuard::new(Arc::clone(&counter));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        drop(guard);
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn app_state_starts_with_empty_stores() {
        let state = AppState::new(ServerConfig::default());
        assert_eq!(state.rooms.size(), 0);
        assert_eq!(state.active_sessions.load(Ordering::Relaxed), 0);
    }
}
