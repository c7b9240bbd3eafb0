//! One handler per request/notice type, matching the one-concern-per-file
//! layout the rest of this codebase follows for request handling.

pub mod authentication_request;
pub mod connection_test_request;
pub mod create_room_request;
pub mod join_room_request;
pub mod keep_alive_notice;
pub mod list_room_request;
pub mod update_room_status_notice;

use crate::error::HandlerFault;
use crate::session::SessionState;
use crate::state::AppState;

/// Everything a handler needs besides the decoded request body: the shared
/// process state and the session it's running on behalf of. Handlers never
/// touch the socket directly — the dispatcher owns framing and I/O.
pub struct HandlerContext<'a> {
    pub state: &'a AppState,
    pub session: &'a mut SessionState,
}

/// The contract every handler implements: decode the request, consult and
/// possibly mutate shared state and session state, and return the reply
/// plus whether the dispatcher must then close the connection.
pub type HandlerResult<Reply> = Result<(Reply, bool), HandlerFault>;
