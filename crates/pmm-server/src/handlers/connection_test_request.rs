use std::time::Duration;

use pmm_core::messages::{ConnectionTestReply, ConnectionTestRequest, MessageErrorCode, TransportProtocol};

use crate::error::ClientError;
use crate::prober;

use super::{HandlerContext, HandlerResult};

pub async fn handle(ctx: &mut HandlerContext<'_>, req: ConnectionTestRequest) -> HandlerResult<ConnectionTestReply> {
    if req.port_number == 0 {
        return Err(ClientError::continuable(MessageErrorCode::RequestParameterWrong).into());
    }

    let target = ctx.session.remote_endpoint().with_port(req.port_number).to_socket_addr();
    let cfg = &ctx.state.config.connection_test;

    let succeed = match req.protocol {
        TransportProtocol::Tcp => {
            prober::probe_tcp(target, Duration::from_secs(cfg.connection_check_tcp_time_out_seconds as u64)).await
        },
        TransportProtocol::Udp => {
            prober::probe_udp(
                target,
                Duration::from_secs(cfg.connection_check_udp_time_out_seconds as u64),
                cfg.connection_check_udp_try_count,
            )
            .await
        },
    };

    Ok((ConnectionTestReply { succeed }, false))
}
