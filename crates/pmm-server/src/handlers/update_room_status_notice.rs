use pmm_core::messages::{EmptyReply, MessageErrorCode, UpdateRoomStatusNotice};
use pmm_core::room::{RoomSettingFlags, RoomStatus};

use crate::error::ClientError;
use crate::room_store::RoomStoreError;

use super::{HandlerContext, HandlerResult};

/// A notice, not a request — the reply is always the empty body, and every
/// rejection here is a *continuable* session error: a misbehaving host
/// should not be able to take down another session's connection, but the
/// notice itself is simply dropped.
pub fn handle(ctx: &mut HandlerContext, req: UpdateRoomStatusNotice) -> HandlerResult<EmptyReply> {
    let mut room = match ctx.state.rooms.get(req.room_id) {
        Ok(room) => room,
        Err(RoomStoreError::NotFound) => {
            return Err(ClientError::continuable(MessageErrorCode::RoomNotFound).into());
        },
        Err(other) => return Err(crate::error::ServerFault::RoomStoreInvariant(other.to_string()).into()),
    };

    if room.host_endpoint != ctx.session.remote_endpoint() {
        return Err(ClientError::continuable(MessageErrorCode::RoomPermissionDenied).into());
    }

    if req.is_current_player_count_changed {
        if req.current_player_count > room.max_player_count {
            return Err(ClientError::continuable(MessageErrorCode::RequestParameterWrong).into());
        }
        room.current_player_count = req.current_player_count;
    }

    match req.status {
        RoomStatus::Open => room.setting_flags = room.setting_flags | RoomSettingFlags::OPEN_ROOM,
        RoomStatus::Close => room.setting_flags = room.setting_flags.difference(RoomSettingFlags::OPEN_ROOM),
        RoomStatus::Remove => {
            ctx.state.rooms.try_remove(req.room_id);
            let _ = ctx.session.clear_hosting_room_id(req.room_id);
            return Ok((EmptyReply, false));
        },
    }

    ctx.state
        .rooms
        .add_or_update(room)
        .map_err(|e| crate::error::ServerFault::RoomStoreInvariant(e.to_string()))?;

    Ok((EmptyReply, false))
}
