use pmm_core::messages::{LIST_ROOM_REPLY_MAX_ENTRIES, ListRoomReply, ListRoomRequest};

use super::{HandlerContext, HandlerResult};

pub fn handle(ctx: &mut HandlerContext, req: ListRoomRequest) -> HandlerResult<ListRoomReply> {
    let search_name = req.search_name.as_str().ok().filter(|s| !s.is_empty());

    // The reply's room_info_list has a fixed number of wire slots; a client
    // asking for more than that still only ever gets that many back.
    let count = (req.count as usize).min(LIST_ROOM_REPLY_MAX_ENTRIES);

    let (window, matched) =
        ctx.state.rooms.search_range(req.start_index as usize, count, req.target_flags, search_name, req.sort_kind);

    let total = ctx.state.rooms.size();

    Ok((
        ListRoomReply {
            total: total.min(u8::MAX as usize) as u8,
            matched: matched.min(u8::MAX as usize) as u8,
            returned: window.len() as u8,
            room_info_list: window.iter().map(pmm_core::Room::to_room_info).collect(),
        },
        false,
    ))
}
