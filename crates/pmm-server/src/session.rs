//! Per-connection session state. Owned exclusively by the task driving that
//! connection's dispatcher loop — no synchronization needed, unlike the
//! shared room store and name registry.

use pmm_core::endpoint::Endpoint;
use pmm_core::player_name::PlayerFullName;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("session is already hosting a room")]
    AlreadyHosting,
    #[error("room id does not match the session's hosted room")]
    HostingRoomIdMismatch,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    authenticated: bool,
    player_full_name: Option<PlayerFullName>,
    hosting_room_id: Option<u32>,
    remote_endpoint: Endpoint,
}

impl SessionState {
    pub fn new(remote_endpoint: Endpoint) -> Self {
        Self { authenticated: false, player_full_name: None, hosting_room_id: None, remote_endpoint }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn player_full_name(&self) -> Option<&PlayerFullName> {
        self.player_full_name.as_ref()
    }

    pub fn remote_endpoint(&self) -> Endpoint {
        self.remote_endpoint
    }

    pub fn hosting_room_id(&self) -> Option<u32> {
        self.hosting_room_id
    }

    /// Mark the session authenticated with the given assigned identity.
    /// Callers must have already rejected an already-authenticated session
    /// (that check carries a client-visible error code, so it lives in the
    /// handler rather than here).
    pub fn authenticate(&mut self, full_name: PlayerFullName) {
        self.authenticated = true;
        self.player_full_name = Some(full_name);
    }

    pub fn set_hosting_room_id(&mut self, id: u32) -> Result<(), SessionStateError> {
        if self.hosting_room_id.is_some() {
            return Err(SessionStateError::AlreadyHosting);
        }
        self.hosting_room_id = Some(id);
        Ok(())
    }

    pub fn clear_hosting_room_id(&mut self, id: u32) -> Result<(), SessionStateError> {
        if self.hosting_room_id != Some(id) {
            return Err(SessionStateError::HostingRoomIdMismatch);
        }
        self.hosting_room_id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::test_helpers::{full_name, sample_endpoint};

    #[test]
    fn fresh_session_is_unauthenticated_and_not_hosting() {
        let session = SessionState::new(sample_endpoint(1));
        assert!(!session.is_authenticated());
        assert!(session.player_full_name().is_none());
        assert!(session.hosting_room_id().is_none());
    }

    #[test]
    fn authenticate_records_identity() {
        let mut session = SessionState::new(sample_endpoint(1));
        session.authenticate(full_name("alice", 1));
        assert!(session.is_authenticated());
        assert_eq!(session.player_full_name().unwrap().tag, 1);
    }

    #[test]
    fn set_hosting_room_id_rejects_double_set() {
        let mut session = SessionState::new(sample_endpoint(1));
        session.set_hosting_room_id(7).unwrap();
        assert_eq!(session.set_hosting_room_id(8), Err(SessionStateError::AlreadyHosting));
        assert_eq!(session.hosting_room_id(), Some(7));
    }

    #[test]
    fn clear_hosting_room_id_rejects_mismatch() {
        let mut session = SessionState::new(sample_endpoint(1));
        session.set_hosting_room_id(7).unwrap();
        assert_eq!(session.clear_hosting_room_id(8), Err(SessionStateError::HostingRoomIdMismatch));
        assert_eq!(session.hosting_room_id(), Some(7));
    }

    #[test]
    fn clear_hosting_room_id_succeeds_on_match() {
        let mut session = SessionState::new(sample_endpoint(1));
        session.set_hosting_room_id(7).unwrap();
        session.clear_hosting_room_id(7).unwrap();
        assert!(session.hosting_room_id().is_none());
    }
}
