//! Builders for well-formed records, shared between this crate's own tests
//! and `pmm-server`'s integration tests. Only compiled with `test-helpers`.

use crate::codec::FixedString;
use crate::endpoint::Endpoint;
use crate::player_name::PlayerFullName;
use crate::room::{PASSWORD_BYTES, Room, RoomSettingFlags};

pub fn full_name(name: &str, tag: u16) -> PlayerFullName {
    PlayerFullName::new(FixedString::new(name).expect("test name fits in 24 bytes"), tag)
}

pub fn sample_endpoint(port: u16) -> Endpoint {
    Endpoint::from_socket_addr(format!("203.0.113.1:{port}").parse().expect("valid test socket addr"))
}

/// A minimal, invariant-respecting room for use in store/registry tests.
pub fn sample_room(room_id: u32, host_name: &str, max_player_count: u8) -> Room {
    Room {
        room_id,
        host_player_full_name: full_name(host_name, 1),
        setting_flags: RoomSettingFlags::PUBLIC_ROOM | RoomSettingFlags::OPEN_ROOM,
        password: [0u8; PASSWORD_BYTES],
        max_player_count,
        create_datetime_unix: 1_700_000_000,
        host_endpoint: sample_endpoint(57000),
        game_host_endpoint: sample_endpoint(12345),
        current_player_count: 1,
    }
}
