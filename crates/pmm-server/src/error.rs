//! The three error layers from the protocol design: client errors (reported
//! to the peer via the reply header), session errors (connection-level
//! faults the dispatcher reacts to), and server faults (internal invariant
//! violations that should be impossible).

use pmm_core::messages::MessageErrorCode;
use thiserror::Error;

/// A request that is semantically wrong for this client. Carries the code
/// reported back on the wire and whether the session must then disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code:?} (disconnect_required={disconnect_required})")]
pub struct ClientError {
    pub code: MessageErrorCode,
    pub disconnect_required: bool,
}

impl ClientError {
    pub const fn new(code: MessageErrorCode, disconnect_required: bool) -> Self {
        Self { code, disconnect_required }
    }

    /// Most client errors keep the session alive; the client may retry.
    pub const fn continuable(code: MessageErrorCode) -> Self {
        Self::new(code, false)
    }

    pub const fn fatal(code: MessageErrorCode) -> Self {
        Self::new(code, true)
    }
}

/// Connection-level faults the dispatcher reacts to directly.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Graceful EOF while waiting for the next request header. Not an
    /// error condition; logged at `info`, the slot restarts cleanly.
    #[error("client disconnected while idle")]
    ExpectedDisconnection,

    /// The socket dropped mid-message (not at a header boundary).
    #[error("client disconnected unexpectedly: {0}")]
    UnexpectedDisconnection(std::io::Error),

    /// A read or write exceeded its configured deadline.
    #[error("I/O timed out")]
    TimedOut,

    /// Framing violation: unknown message type, or a type mismatch while
    /// the dispatcher is in specific-type mode.
    #[error("protocol framing violation: {0}")]
    ProtocolFault(#[from] pmm_core::ProtocolError),

    /// Raw I/O failure other than a clean disconnect.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Whether the session slot should simply loop again (only ever true
    /// for the graceful end-of-stream case — everything else tears the
    /// session down, per spec §7).
    pub fn is_continuable(&self) -> bool {
        matches!(self, Self::ExpectedDisconnection)
    }
}

/// An internal invariant violation — e.g. a unique-field collision the
/// store's own uniqueness check should have made impossible. These are
/// logged at `error` with full context and reported to the client (if one
/// is still attached) as a generic `Unknown` code; they never expose
/// internal detail on the wire.
#[derive(Debug, Error)]
pub enum ServerFault {
    #[error("room store invariant violated: {0}")]
    RoomStoreInvariant(String),

    #[error("player-name registry invariant violated: {0}")]
    RegistryInvariant(String),
}

/// The error type handler functions return: either a reportable client
/// error, or an internal fault that should be logged and masked.
#[derive(Debug, Error)]
pub enum HandlerFault {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Server(#[from] ServerFault),
}

impl HandlerFault {
    /// The `message_error_code` to put on the wire for this fault. Server
    /// faults never leak their detail — only `Unknown`.
    pub fn wire_code(&self) -> MessageErrorCode {
        match self {
            Self::Client(e) => e.code,
            Self::Server(_) => MessageErrorCode::Unknown,
        }
    }

    pub fn disconnect_required(&self) -> bool {
        match self {
            Self::Client(e) => e.disconnect_required,
            Self::Server(_) => true,
        }
    }
}
