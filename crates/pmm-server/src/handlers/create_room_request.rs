use pmm_core::Room;
use pmm_core::messages::{CreateRoomReply, CreateRoomRequest, MessageErrorCode};
use pmm_core::room::{ConnectionEstablishMode, RoomSettingFlags};

use crate::error::ClientError;

use super::{HandlerContext, HandlerResult};

pub fn handle(ctx: &mut HandlerContext, req: CreateRoomRequest) -> HandlerResult<CreateRoomReply> {
    if ctx.session.hosting_room_id().is_some() {
        return Err(ClientError::continuable(MessageErrorCode::ClientAlreadyHostingRoom).into());
    }

    if req.connection_establish_mode == ConnectionEstablishMode::Builtin && req.port_number == 0 {
        return Err(ClientError::continuable(MessageErrorCode::RequestParameterWrong).into());
    }

    let max_player_per_room = ctx.state.config.common.max_player_per_room;
    if req.max_player_count == 0 || req.max_player_count > max_player_per_room {
        return Err(ClientError::continuable(MessageErrorCode::RequestParameterWrong).into());
    }

    let max_room_count = ctx.state.config.common.max_room_count as usize;
    if ctx.state.rooms.size() >= max_room_count {
        return Err(ClientError::continuable(MessageErrorCode::RoomCountExceedsLimit).into());
    }

    let host_full_name = ctx
        .session
        .player_full_name()
        .cloned()
        .ok_or_else(|| ClientError::fatal(MessageErrorCode::OperationInvalid))?;

    let is_public = req.password == [0u8; pmm_core::room::PASSWORD_BYTES];
    let mut setting_flags = RoomSettingFlags::OPEN_ROOM;
    if is_public {
        setting_flags = setting_flags | RoomSettingFlags::PUBLIC_ROOM;
    }

    let remote_endpoint = ctx.session.remote_endpoint();
    let room = Room {
        room_id: 0,
        host_player_full_name: host_full_name,
        setting_flags,
        password: req.password,
        max_player_count: req.max_player_count,
        create_datetime_unix: current_unix_time(),
        host_endpoint: remote_endpoint,
        game_host_endpoint: remote_endpoint.with_port(req.port_number),
        current_player_count: 1,
    };

    let room_id = ctx
        .state
        .rooms
        .assign_id_and_add(room)
        .map_err(|e| crate::error::ServerFault::RoomStoreInvariant(e.to_string()))?;

    ctx.session
        .set_hosting_room_id(room_id)
        .map_err(|e| crate::error::ServerFault::RoomStoreInvariant(e.to_string()))?;

    Ok((CreateRoomReply { room_id }, false))
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
