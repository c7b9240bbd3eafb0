//! The per-connection framing loop: read one header byte, look up its
//! handler, read the statically-known body, decode, invoke, write the
//! reply. Grounded on `original_source/.../message_handler_invoker.cpp`'s
//! `handle_message_impl` for the read-header → read-body → decode →
//! invoke → write-reply sequencing (spec §4.5).
//!
//! Timeout resolution: spec §4.5 states every read carries the configured
//! timeout, while §5 carves out an exception for the header read while idle
//! ("the wait for the next header is unbounded"). Since every header read
//! in this loop *is* the wait for the next request, header reads here never
//! time out; only body reads and reply writes do.

use std::time::Duration;

use pmm_core::codec::{Decode, Encode};
use pmm_core::messages::{
    AuthenticationReply, AuthenticationRequest, ConnectionTestReply, ConnectionTestRequest, CreateRoomReply,
    CreateRoomRequest, EmptyReply, JoinRoomReply, JoinRoomRequest, KeepAliveNotice, ListRoomReply, ListRoomRequest,
    MessageErrorCode, MessageType, ReplyHeader, UpdateRoomStatusNotice,
};
use pmm_core::{Endpoint, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{HandlerFault, SessionError};
use crate::handlers::{self, HandlerContext};
use crate::session::SessionState;
use crate::state::AppState;

/// Drive one connection from the moment its socket is accepted until it
/// tears down. The caller is responsible for releasing the session's
/// owned state (hosted room, player-name allocation) once this returns,
/// regardless of the outcome — see `crate::acceptor`.
pub async fn run_session(
    mut stream: TcpStream,
    remote_endpoint: Endpoint,
    state: AppState,
) -> (SessionState, Result<(), SessionError>) {
    let mut session = SessionState::new(remote_endpoint);
    let timeout = Duration::from_secs(state.config.common.time_out_seconds as u64);

    let result = run_loop(&mut stream, &mut session, &state, timeout).await;
    (session, result)
}

/// Whether the dispatcher loop continues after handling one message, or the
/// server itself closes the connection having already sent a reply (e.g. an
/// `authentication_reply` carrying a version mismatch). Distinct from
/// [`SessionError`], which represents faults rather than this orderly,
/// server-initiated close.
enum Flow {
    Continue,
    CloseSession,
}

async fn run_loop(
    stream: &mut TcpStream,
    session: &mut SessionState,
    state: &AppState,
    timeout: Duration,
) -> Result<(), SessionError> {
    // The first message on every connection must be the authentication
    // request (§4.5 point 3: "specific-type" mode, used only for this step).
    if let Flow::CloseSession =
        dispatch_one(stream, session, state, timeout, Some(MessageType::AuthenticationRequest)).await?
    {
        return Ok(());
    }

    loop {
        if let Flow::CloseSession = dispatch_one(stream, session, state, timeout, None).await? {
            return Ok(());
        }
    }
}

/// Read one header byte (unbounded wait), optionally gate it against an
/// expected type, then read/decode/invoke/reply for whichever message type
/// it names. Returns `Err` when the session must tear down on a fault, or
/// `Ok(Flow::CloseSession)` when it closes normally after replying.
async fn dispatch_one(
    stream: &mut TcpStream,
    session: &mut SessionState,
    state: &AppState,
    timeout: Duration,
    expected: Option<MessageType>,
) -> Result<Flow, SessionError> {
    let mut header = [0u8; 1];
    match stream.read_exact(&mut header).await {
        Ok(_) => {},
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(SessionError::ExpectedDisconnection),
        Err(e) => return Err(SessionError::Io(e)),
    }

    let message_type = MessageType::from_byte(header[0])?;

    if let Some(expected) = expected
        && message_type != expected
    {
        return Err(SessionError::ProtocolFault(ProtocolError::UnexpectedMessageType {
            expected: expected.to_byte(),
            actual: message_type.to_byte(),
        }));
    }

    match message_type {
        MessageType::AuthenticationRequest => {
            let req: AuthenticationRequest = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            let disconnect = match handlers::authentication_request::handle(&mut ctx, req) {
                Ok((reply, disconnect)) => {
                    let error_code = reply.result;
                    write_reply(stream, timeout, MessageType::AuthenticationReply, error_code, reply).await?;
                    disconnect
                },
                Err(fault) => {
                    let reply = AuthenticationReply {
                        result: fault.wire_code(),
                        api_version: pmm_core::CURRENT_API_VERSION,
                        game_version: Default::default(),
                        player_tag: 0,
                    };
                    write_reply(stream, timeout, MessageType::AuthenticationReply, fault.wire_code(), reply).await?;
                    log_if_server_fault(&fault);
                    fault.disconnect_required()
                },
            };
            if disconnect {
                return Ok(Flow::CloseSession);
            }
        },

        MessageType::CreateRoomRequest => {
            let req: CreateRoomRequest = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            match handlers::create_room_request::handle(&mut ctx, req) {
                Ok((reply, _disconnect)) => {
                    write_reply(stream, timeout, MessageType::CreateRoomReply, MessageErrorCode::Ok, reply).await?;
                },
                Err(fault) => {
                    log_if_server_fault(&fault);
                    write_reply(
                        stream,
                        timeout,
                        MessageType::CreateRoomReply,
                        fault.wire_code(),
                        CreateRoomReply { room_id: 0 },
                    )
                    .await?;
                    if fault.disconnect_required() {
                        return Ok(Flow::CloseSession);
                    }
                },
            }
        },

        MessageType::ListRoomRequest => {
            let req: ListRoomRequest = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            match handlers::list_room_request::handle(&mut ctx, req) {
                Ok((reply, _disconnect)) => {
                    write_reply(stream, timeout, MessageType::ListRoomReply, MessageErrorCode::Ok, reply).await?;
                },
                Err(fault) => {
                    log_if_server_fault(&fault);
                    write_reply(
                        stream,
                        timeout,
                        MessageType::ListRoomReply,
                        fault.wire_code(),
                        ListRoomReply { total: 0, matched: 0, returned: 0, room_info_list: Vec::new() },
                    )
                    .await?;
                    if fault.disconnect_required() {
                        return Ok(Flow::CloseSession);
                    }
                },
            }
        },

        MessageType::JoinRoomRequest => {
            let req: JoinRoomRequest = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            match handlers::join_room_request::handle(&mut ctx, req) {
                Ok((reply, _disconnect)) => {
                    write_reply(stream, timeout, MessageType::JoinRoomReply, MessageErrorCode::Ok, reply).await?;
                },
                Err(fault) => {
                    log_if_server_fault(&fault);
                    write_reply(
                        stream,
                        timeout,
                        MessageType::JoinRoomReply,
                        fault.wire_code(),
                        JoinRoomReply { game_host_endpoint: Endpoint::new([0u8; 16], 0) },
                    )
                    .await?;
                    if fault.disconnect_required() {
                        return Ok(Flow::CloseSession);
                    }
                },
            }
        },

        MessageType::UpdateRoomStatusNotice => {
            let req: UpdateRoomStatusNotice = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            match handlers::update_room_status_notice::handle(&mut ctx, req) {
                Ok((reply, _disconnect)) => {
                    write_reply(stream, timeout, MessageType::UpdateRoomStatusNotice, MessageErrorCode::Ok, reply)
                        .await?;
                },
                Err(fault) => {
                    // Every rejection here is continuable per spec §4.6: a
                    // misbehaving host must not be able to take down
                    // another session's connection.
                    log_if_server_fault(&fault);
                    write_reply(
                        stream,
                        timeout,
                        MessageType::UpdateRoomStatusNotice,
                        fault.wire_code(),
                        EmptyReply,
                    )
                    .await?;
                },
            }
        },

        MessageType::ConnectionTestRequest => {
            let req: ConnectionTestRequest = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            match handlers::connection_test_request::handle(&mut ctx, req).await {
                Ok((reply, _disconnect)) => {
                    write_reply(stream, timeout, MessageType::ConnectionTestReply, MessageErrorCode::Ok, reply)
                        .await?;
                },
                Err(fault) => {
                    log_if_server_fault(&fault);
                    write_reply(
                        stream,
                        timeout,
                        MessageType::ConnectionTestReply,
                        fault.wire_code(),
                        ConnectionTestReply { succeed: false },
                    )
                    .await?;
                    if fault.disconnect_required() {
                        return Ok(Flow::CloseSession);
                    }
                },
            }
        },

        MessageType::KeepAliveNotice => {
            let req: KeepAliveNotice = read_body(stream, timeout).await?;
            let mut ctx = HandlerContext { state, session };
            let (reply, _disconnect) =
                handlers::keep_alive_notice::handle(&mut ctx, req).expect("keep_alive_notice never fails");
            write_reply(stream, timeout, MessageType::KeepAliveNotice, MessageErrorCode::Ok, reply).await?;
        },

        // Replies are never sent by a client; receiving one is a framing
        // violation.
        MessageType::AuthenticationReply
        | MessageType::CreateRoomReply
        | MessageType::ListRoomReply
        | MessageType::JoinRoomReply
        | MessageType::ConnectionTestReply => {
            return Err(SessionError::ProtocolFault(ProtocolError::UnknownMessageType { value: header[0] }));
        },
    }

    Ok(Flow::Continue)
}

fn log_if_server_fault(fault: &HandlerFault) {
    if let HandlerFault::Server(inner) = fault {
        tracing::error!(error = %inner, "internal invariant violated while handling request");
    }
}

async fn read_body<T: Decode>(stream: &mut TcpStream, timeout: Duration) -> Result<T, SessionError> {
    let mut buf = vec![0u8; T::SIZE];
    match tokio::time::timeout(timeout, stream.read_exact(&mut buf)).await {
        Ok(Ok(_)) => {},
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(SessionError::UnexpectedDisconnection(e));
        },
        Ok(Err(e)) => return Err(SessionError::Io(e)),
        Err(_) => return Err(SessionError::TimedOut),
    }
    let mut cursor = buf.as_slice();
    Ok(T::decode(&mut cursor)?)
}

async fn write_reply<T: Encode>(
    stream: &mut TcpStream,
    timeout: Duration,
    message_type: MessageType,
    error_code: MessageErrorCode,
    body: T,
) -> Result<(), SessionError> {
    let mut out = Vec::with_capacity(ReplyHeader::SIZE + T::SIZE);
    ReplyHeader { message_type, error_code }.encode(&mut out);
    body.encode(&mut out);

    match tokio::time::timeout(timeout, stream.write_all(&out)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Io(e)),
        Err(_) => Err(SessionError::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use pmm_core::codec::FixedString;
    use pmm_core::NAME_MAX_BYTES;
    use pmm_core::messages::{CURRENT_API_VERSION, GAME_ID_MAX_BYTES, GAME_VERSION_MAX_BYTES};
    use tokio::net::TcpListener;

    use crate::config::ServerConfig;

    use super::*;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    fn auth_request(game_id: &str, player_name: &str) -> Vec<u8> {
        let req = AuthenticationRequest {
            api_version: CURRENT_API_VERSION,
            game_id: FixedString::<GAME_ID_MAX_BYTES>::new(game_id).unwrap(),
            game_version: FixedString::<GAME_VERSION_MAX_BYTES>::new("").unwrap(),
            player_name: FixedString::<NAME_MAX_BYTES>::new(player_name).unwrap(),
        };
        let mut out = vec![MessageType::AuthenticationRequest.to_byte()];
        req.encode(&mut out);
        out
    }

    #[tokio::test]
    async fn authentication_round_trip_over_a_real_socket() {
        let mut cfg = ServerConfig::default();
        cfg.authentication.game_id = "mygame".to_string();
        let state = AppState::new(cfg);

        let (server, mut client) = connected_pair().await;
        let endpoint = Endpoint::from_socket_addr(client.local_addr().unwrap());
        let session_task = tokio::spawn(run_session(server, endpoint, state));

        client.write_all(&auth_request("mygame", "alice")).await.unwrap();

        let mut header = [0u8; 2];
        client.read_exact(&mut header).await.unwrap();
        assert_eq!(header[0], MessageType::AuthenticationReply.to_byte());
        assert_eq!(header[1], MessageErrorCode::Ok as u8);

        let mut body = vec![0u8; AuthenticationReply::SIZE];
        client.read_exact(&mut body).await.unwrap();
        let mut cursor = body.as_slice();
        let reply = AuthenticationReply::decode(&mut cursor).unwrap();
        assert_eq!(reply.player_tag, 1);

        drop(client);
        let (_session, result) = session_task.await.unwrap();
        assert!(matches!(result, Err(SessionError::ExpectedDisconnection)));
    }

    #[tokio::test]
    async fn non_authentication_first_message_is_a_protocol_fault() {
        let state = AppState::new(ServerConfig::default());
        let (server, mut client) = connected_pair().await;
        let endpoint = Endpoint::from_socket_addr(client.local_addr().unwrap());
        let session_task = tokio::spawn(run_session(server, endpoint, state));

        // keep_alive_notice sent as the very first message is rejected —
        // only authentication_request is accepted in specific-type mode.
        client.write_all(&[MessageType::KeepAliveNotice.to_byte()]).await.unwrap();

        let (_session, result) = session_task.await.unwrap();
        assert!(matches!(result, Err(SessionError::ProtocolFault(ProtocolError::UnexpectedMessageType { .. }))));
    }

    #[tokio::test]
    async fn unknown_message_type_is_a_protocol_fault() {
        let mut cfg = ServerConfig::default();
        cfg.authentication.game_id = "mygame".to_string();
        let state = AppState::new(cfg);
        let (server, mut client) = connected_pair().await;
        let endpoint = Endpoint::from_socket_addr(client.local_addr().unwrap());
        let session_task = tokio::spawn(run_session(server, endpoint, state));

        client.write_all(&auth_request("mygame", "alice")).await.unwrap();
        let mut header = [0u8; 2];
        client.read_exact(&mut header).await.unwrap();
        let mut body = vec![0u8; AuthenticationReply::SIZE];
        client.read_exact(&mut body).await.unwrap();

        client.write_all(&[0xFF]).await.unwrap();

        let (_session, result) = session_task.await.unwrap();
        assert!(matches!(result, Err(SessionError::ProtocolFault(ProtocolError::UnknownMessageType { value: 0xFF }))));
    }

    #[tokio::test]
    async fn idle_wait_for_next_header_does_not_time_out() {
        let mut cfg = ServerConfig::default();
        cfg.authentication.game_id = "mygame".to_string();
        cfg.common.time_out_seconds = 1;
        let state = AppState::new(cfg);
        let (server, mut client) = connected_pair().await;
        let endpoint = Endpoint::from_socket_addr(client.local_addr().unwrap());
        let session_task = tokio::spawn(run_session(server, endpoint, state));

        client.write_all(&auth_request("mygame", "alice")).await.unwrap();
        let mut header = [0u8; 2];
        client.read_exact(&mut header).await.unwrap();
        let mut body = vec![0u8; AuthenticationReply::SIZE];
        client.read_exact(&mut body).await.unwrap();

        // Idle well past the configured per-read timeout, then send a
        // keep-alive: the connection must still be alive to answer it.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        client.write_all(&[MessageType::KeepAliveNotice.to_byte()]).await.unwrap();

        let mut reply_header = [0u8; 2];
        tokio::time::timeout(Duration::from_secs(2), client.read_exact(&mut reply_header)).await.unwrap().unwrap();
        assert_eq!(reply_header[0], MessageType::KeepAliveNotice.to_byte());

        drop(client);
        let _ = session_task.await.unwrap();
    }
}
