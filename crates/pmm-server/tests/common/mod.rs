//! Integration test harness: binds a real listening socket and drives the
//! full acceptor-pool-to-dispatcher path over raw TCP. Grounded on the
//! teacher's `tests/common/mod.rs` `TestServer` shape (bind an ephemeral
//! port, spawn the server, expose `addr`), adapted from Axum/WebSocket to
//! this protocol's raw binary framing.

use std::net::SocketAddr;
use std::time::Duration;

use pmm_core::NAME_MAX_BYTES;
use pmm_core::codec::{Decode, Encode, FixedString};
use pmm_core::messages::{
    AuthenticationReply, AuthenticationRequest, CreateRoomReply, CreateRoomRequest, GAME_ID_MAX_BYTES,
    GAME_VERSION_MAX_BYTES, JoinRoomReply, JoinRoomRequest, ListRoomReply, ListRoomRequest, MessageType, ReplyHeader,
};
use pmm_core::room::{ConnectionEstablishMode, PASSWORD_BYTES, RoomSearchTargetFlags, RoomSortKind};
use pmm_server::config::ServerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
    shutdown_token: tokio_util::sync::CancellationToken,
}

impl TestServer {
    pub async fn new(config: ServerConfig) -> Self {
        let (listener, state) = pmm_server::build_server(config).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown_token = state.shutdown.clone();

        let handle = tokio::spawn(async move {
            pmm_server::run(listener, state).await;
        });

        Self { addr, _shutdown: handle, shutdown_token }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

pub async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

pub async fn send<T: Encode>(stream: &mut TcpStream, message_type: MessageType, body: T) {
    let mut out = vec![message_type.to_byte()];
    body.encode(&mut out);
    stream.write_all(&out).await.unwrap();
}

pub async fn recv_reply<T: Decode>(stream: &mut TcpStream) -> (ReplyHeader, T) {
    let mut header_buf = [0u8; ReplyHeader::SIZE];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut header_buf)).await.unwrap().unwrap();
    let mut cursor = header_buf.as_slice();
    let header = ReplyHeader::decode(&mut cursor).unwrap();

    let mut body_buf = vec![0u8; T::SIZE];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut body_buf)).await.unwrap().unwrap();
    let mut cursor = body_buf.as_slice();
    (header, T::decode(&mut cursor).unwrap())
}

/// Authenticate over a fresh connection and return the stream plus the
/// assigned `player_tag`. Panics (via `recv_reply`'s decode) if the reply
/// doesn't come back with the expected body size — a framing bug in either
/// side would show up here immediately.
pub async fn authenticate(addr: SocketAddr, game_id: &str, player_name: &str) -> (TcpStream, AuthenticationReply) {
    let mut stream = connect(addr).await;
    let req = AuthenticationRequest {
        api_version: pmm_core::messages::CURRENT_API_VERSION,
        game_id: FixedString::<GAME_ID_MAX_BYTES>::new(game_id).unwrap(),
        game_version: FixedString::<GAME_VERSION_MAX_BYTES>::new("").unwrap(),
        player_name: FixedString::<NAME_MAX_BYTES>::new(player_name).unwrap(),
    };
    send(&mut stream, MessageType::AuthenticationRequest, req).await;
    let (_header, reply) = recv_reply::<AuthenticationReply>(&mut stream).await;
    (stream, reply)
}

pub async fn create_room(stream: &mut TcpStream, max_player_count: u8, password: [u8; PASSWORD_BYTES]) -> CreateRoomReply {
    let req = CreateRoomRequest {
        max_player_count,
        connection_establish_mode: ConnectionEstablishMode::Builtin,
        port_number: 12345,
        password,
    };
    send(stream, MessageType::CreateRoomRequest, req).await;
    recv_reply::<CreateRoomReply>(stream).await.1
}

pub async fn join_room(stream: &mut TcpStream, room_id: u32, password: [u8; PASSWORD_BYTES]) -> (ReplyHeader, JoinRoomReply) {
    let req = JoinRoomRequest { room_id, password };
    send(stream, MessageType::JoinRoomRequest, req).await;
    recv_reply::<JoinRoomReply>(stream).await
}

pub async fn list_public_open_rooms(stream: &mut TcpStream) -> ListRoomReply {
    let req = ListRoomRequest {
        start_index: 0,
        count: 32,
        sort_kind: RoomSortKind::NameAscending,
        target_flags: RoomSearchTargetFlags::PUBLIC_ROOM | RoomSearchTargetFlags::OPEN_ROOM,
        search_name: FixedString::new("").unwrap(),
    };
    send(stream, MessageType::ListRoomRequest, req).await;
    recv_reply::<ListRoomReply>(stream).await.1
}
