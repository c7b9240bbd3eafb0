//! Wire message catalog: one struct per request/reply/notice, plus the
//! `message_type` and `message_error_code` enums framing them. Field lists
//! and sizes are taken verbatim from the wire table; this module is the
//! single source of truth for the protocol's byte layout.

use crate::codec::{Decode, Encode, FixedString};
use crate::endpoint::Endpoint;
use crate::error::ProtocolError;
use crate::player_name::{NAME_MAX_BYTES, PlayerFullName};
use crate::room::{ConnectionEstablishMode, PASSWORD_BYTES, RoomInfo, RoomSearchTargetFlags, RoomSortKind, RoomStatus};

/// How many `room_info` slots `list_room_reply` carries. A client
/// requesting more than this via `count` receives at most this many;
/// `returned` always reports the true number written.
pub const LIST_ROOM_REPLY_MAX_ENTRIES: usize = 32;

pub const GAME_ID_MAX_BYTES: usize = 24;
pub const GAME_VERSION_MAX_BYTES: usize = 24;
pub const SEARCH_NAME_MAX_BYTES: usize = 26;

/// The protocol version this build implements. A client whose declared
/// `api_version` does not match is rejected during authentication — this is
/// a property of the codec itself, not something a deployment configures.
pub const CURRENT_API_VERSION: u16 = 1;

/// One byte identifying which message a framed record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    AuthenticationRequest = 0x01,
    AuthenticationReply = 0x02,
    CreateRoomRequest = 0x03,
    CreateRoomReply = 0x04,
    ListRoomRequest = 0x05,
    ListRoomReply = 0x06,
    JoinRoomRequest = 0x07,
    JoinRoomReply = 0x08,
    UpdateRoomStatusNotice = 0x09,
    ConnectionTestRequest = 0x0A,
    ConnectionTestReply = 0x0B,
    KeepAliveNotice = 0x0C,
}

impl MessageType {
    pub fn from_byte(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x01 => Ok(Self::AuthenticationRequest),
            0x02 => Ok(Self::AuthenticationReply),
            0x03 => Ok(Self::CreateRoomRequest),
            0x04 => Ok(Self::CreateRoomReply),
            0x05 => Ok(Self::ListRoomRequest),
            0x06 => Ok(Self::ListRoomReply),
            0x07 => Ok(Self::JoinRoomRequest),
            0x08 => Ok(Self::JoinRoomReply),
            0x09 => Ok(Self::UpdateRoomStatusNotice),
            0x0A => Ok(Self::ConnectionTestRequest),
            0x0B => Ok(Self::ConnectionTestReply),
            0x0C => Ok(Self::KeepAliveNotice),
            other => Err(ProtocolError::UnknownMessageType { value: other }),
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// `message_error_code`: the value every reply header carries. Reconciles
/// the two naming passes in the source spec (a short high-level vocabulary
/// next to the per-handler contract names) into one concrete enum — see
/// DESIGN.md for the mapping decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageErrorCode {
    Ok = 0x00,
    /// Generic/internal fault (server error layer, §7).
    Unknown = 0x01,
    OperationInvalid = 0x02,
    RequestParameterWrong = 0x03,
    ApiVersionMismatch = 0x04,
    GameIdMismatch = 0x05,
    GameVersionMismatch = 0x06,
    AuthenticationError = 0x07,
    RoomNotFound = 0x08,
    RoomPasswordWrong = 0x09,
    RoomFull = 0x0A,
    RoomPermissionDenied = 0x0B,
    RoomCountExceedsLimit = 0x0C,
    RoomConnectionEstablishModeMismatch = 0x0D,
    ClientAlreadyHostingRoom = 0x0E,
}

impl Encode for MessageErrorCode {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for MessageErrorCode {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let value = u8::decode(buf)?;
        Ok(match value {
            0x00 => Self::Ok,
            0x02 => Self::OperationInvalid,
            0x03 => Self::RequestParameterWrong,
            0x04 => Self::ApiVersionMismatch,
            0x05 => Self::GameIdMismatch,
            0x06 => Self::GameVersionMismatch,
            0x07 => Self::AuthenticationError,
            0x08 => Self::RoomNotFound,
            0x09 => Self::RoomPasswordWrong,
            0x0A => Self::RoomFull,
            0x0B => Self::RoomPermissionDenied,
            0x0C => Self::RoomCountExceedsLimit,
            0x0D => Self::RoomConnectionEstablishModeMismatch,
            0x0E => Self::ClientAlreadyHostingRoom,
            _ => Self::Unknown,
        })
    }
}

/// Transport protocol requested by `connection_test_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransportProtocol {
    Tcp = 0x00,
    Udp = 0x01,
}

impl Encode for TransportProtocol {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for TransportProtocol {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let value = u8::decode(buf)?;
        match value {
            0x00 => Ok(Self::Tcp),
            0x01 => Ok(Self::Udp),
            other => Err(ProtocolError::InvalidEnumValue { field: "protocol", value: other as u32 }),
        }
    }
}

/// The 2-byte header prefixing every reply: which message it is, and the
/// outcome of handling the paired request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub message_type: MessageType,
    pub error_code: MessageErrorCode,
}

impl Encode for ReplyHeader {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.message_type.to_byte());
        self.error_code.encode(out);
    }
}

impl Decode for ReplyHeader {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let message_type = MessageType::from_byte(u8::decode(buf)?)?;
        let error_code = MessageErrorCode::decode(buf)?;
        Ok(Self { message_type, error_code })
    }
}

macro_rules! fixed_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(pub $field:ident: $ty:ty,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $ty,)*
        }

        impl Encode for $name {
            const SIZE: usize = { 0usize $(+ <$ty as Encode>::SIZE)* };

            fn encode(&self, out: &mut Vec<u8>) {
                $(self.$field.encode(out);)*
            }
        }

        impl Decode for $name {
            fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
                Ok(Self {
                    $($field: <$ty as Decode>::decode(buf)?,)*
                })
            }
        }
    };
}

fixed_record! {
    pub struct AuthenticationRequest {
        pub api_version: u16,
        pub game_id: FixedString<GAME_ID_MAX_BYTES>,
        pub game_version: FixedString<GAME_VERSION_MAX_BYTES>,
        pub player_name: FixedString<NAME_MAX_BYTES>,
    }
}

fixed_record! {
    pub struct AuthenticationReply {
        pub result: MessageErrorCode,
        pub api_version: u16,
        pub game_version: FixedString<GAME_VERSION_MAX_BYTES>,
        pub player_tag: u16,
    }
}

fixed_record! {
    pub struct CreateRoomRequest {
        pub max_player_count: u8,
        pub connection_establish_mode: ConnectionEstablishMode,
        pub port_number: u16,
        pub password: [u8; PASSWORD_BYTES],
    }
}

fixed_record! {
    pub struct CreateRoomReply {
        pub room_id: u32,
    }
}

fixed_record! {
    pub struct ListRoomRequest {
        pub start_index: u8,
        pub count: u8,
        pub sort_kind: RoomSortKind,
        pub target_flags: RoomSearchTargetFlags,
        pub search_name: FixedString<SEARCH_NAME_MAX_BYTES>,
    }
}

/// `list_room_reply` is the one record whose wire form isn't a flat
/// `fixed_record!` — its `room_info_list` is a fixed-length *array* of
/// records rather than a scalar field, so it gets a hand-written impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRoomReply {
    pub total: u8,
    pub matched: u8,
    pub returned: u8,
    pub room_info_list: Vec<RoomInfo>,
}

impl Encode for ListRoomReply {
    const SIZE: usize = u8::SIZE + u8::SIZE + u8::SIZE + RoomInfo::SIZE * LIST_ROOM_REPLY_MAX_ENTRIES;

    fn encode(&self, out: &mut Vec<u8>) {
        self.total.encode(out);
        self.matched.encode(out);
        self.returned.encode(out);
        for slot in 0..LIST_ROOM_REPLY_MAX_ENTRIES {
            match self.room_info_list.get(slot) {
                Some(info) => info.encode(out),
                None => RoomInfo::default().encode(out),
            }
        }
    }
}

impl Decode for ListRoomReply {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let total = u8::decode(buf)?;
        let matched = u8::decode(buf)?;
        let returned = u8::decode(buf)?;
        let mut room_info_list = Vec::with_capacity(LIST_ROOM_REPLY_MAX_ENTRIES);
        for _ in 0..LIST_ROOM_REPLY_MAX_ENTRIES {
            room_info_list.push(RoomInfo::decode(buf)?);
        }
        room_info_list.truncate(returned as usize);
        Ok(Self { total, matched, returned, room_info_list })
    }
}

fixed_record! {
    pub struct JoinRoomRequest {
        pub room_id: u32,
        pub password: [u8; PASSWORD_BYTES],
    }
}

fixed_record! {
    pub struct JoinRoomReply {
        pub game_host_endpoint: Endpoint,
    }
}

fixed_record! {
    pub struct UpdateRoomStatusNotice {
        pub room_id: u32,
        pub status: RoomStatus,
        pub is_current_player_count_changed: bool,
        pub current_player_count: u8,
    }
}

fixed_record! {
    pub struct ConnectionTestRequest {
        pub protocol: TransportProtocol,
        pub port_number: u16,
    }
}

fixed_record! {
    pub struct ConnectionTestReply {
        pub succeed: bool,
    }
}

/// `keep_alive_notice` carries no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeepAliveNotice;

impl Encode for KeepAliveNotice {
    const SIZE: usize = 0;

    fn encode(&self, _out: &mut Vec<u8>) {}
}

impl Decode for KeepAliveNotice {
    fn decode(_buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self)
    }
}

/// Notices have no payload reply, only the 2-byte header — this empty
/// record is the reply body the dispatcher writes after the header for
/// `update_room_status_notice` and `keep_alive_notice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptyReply;

impl Encode for EmptyReply {
    const SIZE: usize = 0;

    fn encode(&self, _out: &mut Vec<u8>) {}
}

impl Decode for EmptyReply {
    fn decode(_buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self)
    }
}

/// Literal payload both sides exchange during a TCP connection test.
pub const CONNECTION_TEST_PAYLOAD: &[u8] = b"Hello. This is PMMS.";
