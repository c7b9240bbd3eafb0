//! Room record and the small enums/bitsets that describe its state on the
//! wire. Field list and bitset values are grounded directly on the original
//! `room_data.hpp` (`room_setting_flag`, `room_search_target_flag`,
//! `room_data_sort_kind`), cross-checked against the wire table.

use crate::codec::{Decode, Encode, FixedString};
use crate::endpoint::Endpoint;
use crate::error::ProtocolError;
use crate::player_name::PlayerFullName;

pub const PASSWORD_BYTES: usize = 16;

/// A tiny hand-rolled bitset macro — this protocol only ever needs `u8`
/// bitsets with a handful of named bits, so pulling in the `bitflags` crate
/// for two types would be more machinery than the job calls for.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $repr:ty {
            $(const $flag:ident = $value:expr;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($repr);

        impl $name {
            $(pub const $flag: Self = Self($value);)+

            pub const NONE: Self = Self(0);

            pub const fn bits(self) -> $repr {
                self.0
            }

            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl Encode for $name {
            const SIZE: usize = std::mem::size_of::<$repr>();

            fn encode(&self, out: &mut Vec<u8>) {
                self.0.encode(out);
            }
        }

        impl Decode for $name {
            fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
                Ok(Self(<$repr>::decode(buf)?))
            }
        }
    };
}

bitflags_like! {
    /// Persistent state flags stored on a room.
    pub struct RoomSettingFlags: u8 {
        const PUBLIC_ROOM = 0x01;
        const OPEN_ROOM = 0x02;
    }
}

bitflags_like! {
    /// Filter bitset a `list_room_request` sends to select which rooms to
    /// include (by public/private and open/closed status).
    pub struct RoomSearchTargetFlags: u8 {
        const PUBLIC_ROOM = 0x01;
        const PRIVATE_ROOM = 0x02;
        const OPEN_ROOM = 0x04;
        const CLOSED_ROOM = 0x08;
    }
}

/// Sort order for `list_room_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoomSortKind {
    NameAscending = 0x00,
    NameDescending = 0x01,
    CreateDatetimeAscending = 0x02,
    CreateDatetimeDescending = 0x03,
}

impl Encode for RoomSortKind {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for RoomSortKind {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let value = u8::decode(buf)?;
        match value {
            0x00 => Ok(Self::NameAscending),
            0x01 => Ok(Self::NameDescending),
            0x02 => Ok(Self::CreateDatetimeAscending),
            0x03 => Ok(Self::CreateDatetimeDescending),
            other => Err(ProtocolError::InvalidEnumValue { field: "sort_kind", value: other as u32 }),
        }
    }
}

/// How the room's game endpoint is established. `Builtin` means the port
/// the host declares is validated and trusted as-is; the spec reserves a
/// `Custom` mode for transports outside this codec's validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionEstablishMode {
    Builtin = 0x00,
    Custom = 0x01,
}

impl Encode for ConnectionEstablishMode {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for ConnectionEstablishMode {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let value = u8::decode(buf)?;
        match value {
            0x00 => Ok(Self::Builtin),
            0x01 => Ok(Self::Custom),
            other => Err(ProtocolError::InvalidEnumValue { field: "connection_establish_mode", value: other as u32 }),
        }
    }
}

/// Target state of `update_room_status_notice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoomStatus {
    Open = 0x00,
    Close = 0x01,
    Remove = 0x02,
}

impl Encode for RoomStatus {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut Vec<u8>) {
        (*self as u8).encode(out);
    }
}

impl Decode for RoomStatus {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let value = u8::decode(buf)?;
        match value {
            0x00 => Ok(Self::Open),
            0x01 => Ok(Self::Close),
            0x02 => Ok(Self::Remove),
            other => Err(ProtocolError::InvalidEnumValue { field: "status", value: other as u32 }),
        }
    }
}

/// The server-side room record. Mirrors the data model in full; only the
/// subset in [`RoomInfo`] ever crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub room_id: u32,
    pub host_player_full_name: PlayerFullName,
    pub setting_flags: RoomSettingFlags,
    /// Empty iff the room is public.
    pub password: [u8; PASSWORD_BYTES],
    pub max_player_count: u8,
    pub create_datetime_unix: u64,
    pub host_endpoint: Endpoint,
    pub game_host_endpoint: Endpoint,
    pub current_player_count: u8,
}

impl Room {
    pub fn is_public(&self) -> bool {
        self.setting_flags.contains(RoomSettingFlags::PUBLIC_ROOM)
    }

    pub fn is_open(&self) -> bool {
        self.setting_flags.contains(RoomSettingFlags::OPEN_ROOM)
    }

    pub fn to_room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            host_player_full_name: self.host_player_full_name.clone(),
            setting_flags: self.setting_flags,
            max_player_count: self.max_player_count,
            current_player_count: self.current_player_count,
            create_datetime_unix: self.create_datetime_unix,
            game_host_endpoint: self.game_host_endpoint,
        }
    }
}

/// The subset of a [`Room`] sent in `list_room_reply`'s `room_info_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: u32,
    pub host_player_full_name: PlayerFullName,
    pub setting_flags: RoomSettingFlags,
    pub max_player_count: u8,
    pub current_player_count: u8,
    pub create_datetime_unix: u64,
    pub game_host_endpoint: Endpoint,
}

impl Encode for RoomInfo {
    const SIZE: usize = u32::SIZE
        + PlayerFullName::SIZE
        + RoomSettingFlags::SIZE
        + u8::SIZE
        + u8::SIZE
        + u64::SIZE
        + Endpoint::SIZE;

    fn encode(&self, out: &mut Vec<u8>) {
        self.room_id.encode(out);
        self.host_player_full_name.encode(out);
        self.setting_flags.encode(out);
        self.max_player_count.encode(out);
        self.current_player_count.encode(out);
        self.create_datetime_unix.encode(out);
        self.game_host_endpoint.encode(out);
    }
}

impl Decode for RoomInfo {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            room_id: u32::decode(buf)?,
            host_player_full_name: PlayerFullName::decode(buf)?,
            setting_flags: RoomSettingFlags::decode(buf)?,
            max_player_count: u8::decode(buf)?,
            current_player_count: u8::decode(buf)?,
            create_datetime_unix: u64::decode(buf)?,
            game_host_endpoint: Endpoint::decode(buf)?,
        })
    }
}

/// A blank `RoomInfo` used to pad `list_room_reply`'s fixed-size slot array
/// past `returned` entries (the array itself always has
/// [`crate::messages::LIST_ROOM_REPLY_MAX_ENTRIES`] slots).
impl Default for RoomInfo {
    fn default() -> Self {
        Self {
            room_id: 0,
            host_player_full_name: PlayerFullName::new(FixedString::new("").unwrap(), 0),
            setting_flags: RoomSettingFlags::NONE,
            max_player_count: 0,
            current_player_count: 0,
            create_datetime_unix: 0,
            game_host_endpoint: Endpoint::new([0u8; 16], 0),
        }
    }
}
