use pmm_core::messages::{EmptyReply, KeepAliveNotice};

use super::{HandlerContext, HandlerResult};

/// No-op: the notice exists only to reset the dispatcher's idle detection,
/// which happens simply by virtue of this message having been read.
pub fn handle(_ctx: &mut HandlerContext, _req: KeepAliveNotice) -> HandlerResult<EmptyReply> {
    Ok((EmptyReply, false))
}

#[cfg(test)]
mod tests {
    use pmm_core::test_helpers::sample_endpoint;

    use crate::config::ServerConfig;
    use crate::session::SessionState;
    use crate::state::AppState;

    use super::*;

    #[test]
    fn keep_alive_never_disconnects() {
        let state = AppState::new(ServerConfig::default());
        let mut session = SessionState::new(sample_endpoint(1));
        let mut ctx = HandlerContext { state: &state, session: &mut session };
        let (_, disconnect) = handle(&mut ctx, KeepAliveNotice).unwrap();
        assert!(!disconnect);
    }
}
