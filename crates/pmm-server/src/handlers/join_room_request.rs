use pmm_core::messages::{JoinRoomReply, JoinRoomRequest, MessageErrorCode};

use crate::error::ClientError;
use crate::room_store::RoomStoreError;

use super::{HandlerContext, HandlerResult};

/// Does not touch `current_player_count` — only the host's own
/// `update_room_status_notice` does that (see the design notes on the
/// accepted join/count race).
pub fn handle(ctx: &mut HandlerContext, req: JoinRoomRequest) -> HandlerResult<JoinRoomReply> {
    let room = match ctx.state.rooms.get(req.room_id) {
        Ok(room) => room,
        Err(RoomStoreError::NotFound) => {
            return Err(ClientError::continuable(MessageErrorCode::RoomNotFound).into());
        },
        Err(other) => return Err(crate::error::ServerFault::RoomStoreInvariant(other.to_string()).into()),
    };

    if !room.is_open() {
        return Err(ClientError::continuable(MessageErrorCode::RoomNotFound).into());
    }

    if !room.is_public() && req.password != room.password {
        return Err(ClientError::continuable(MessageErrorCode::RoomPasswordWrong).into());
    }

    if room.current_player_count >= room.max_player_count {
        return Err(ClientError::continuable(MessageErrorCode::RoomFull).into());
    }

    Ok((JoinRoomReply { game_host_endpoint: room.game_host_endpoint }, false))
}
