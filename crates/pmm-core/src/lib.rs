//! Shared types for the match-making server: the wire codec, value types
//! (`Endpoint`, `PlayerFullName`, `Room`), and the message catalog. Nothing
//! in this crate performs I/O — it is pure data and pure functions so the
//! server and its tests can share one definition of "what a valid message
//! looks like".

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod messages;
pub mod player_name;
pub mod room;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use codec::{Decode, Encode, FixedString};
pub use endpoint::{Endpoint, IpVersion};
pub use error::ProtocolError;
pub use messages::{CURRENT_API_VERSION, MessageErrorCode, MessageType, ReplyHeader};
pub use player_name::{NAME_MAX_BYTES, PlayerFullName, UNASSIGNED_TAG};
pub use room::{ConnectionEstablishMode, Room, RoomInfo, RoomSearchTargetFlags, RoomSettingFlags, RoomSortKind, RoomStatus};
