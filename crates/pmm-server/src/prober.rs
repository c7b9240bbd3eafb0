//! Active connectivity probing for `connection_test_request`: the server
//! dials the client back on a port it claims to be listening on and
//! confirms the round trip actually works before the client advertises
//! itself as reachable.
//!
//! Modeled as linear async functions — `connecting → sending → receiving →
//! comparing` reads as a sequence of awaits with a shared timeout budget,
//! the natural tokio idiom for a protocol exchange this sequential, rather
//! than an explicit state enum that would just mirror the control flow.

use std::net::SocketAddr;
use std::time::Duration;

use pmm_core::messages::CONNECTION_TEST_PAYLOAD;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

/// Connect, send the literal payload, read back exactly as many bytes, and
/// compare. A single attempt — the spec does not retry TCP probes.
pub async fn probe_tcp(target: SocketAddr, timeout: Duration) -> bool {
    let attempt = async {
        let mut stream = TcpStream::connect(target).await.ok()?;
        stream.write_all(CONNECTION_TEST_PAYLOAD).await.ok()?;
        let mut buf = vec![0u8; CONNECTION_TEST_PAYLOAD.len()];
        stream.read_exact(&mut buf).await.ok()?;
        Some(buf == CONNECTION_TEST_PAYLOAD)
    };
    tokio::time::timeout(timeout, attempt).await.ok().flatten().unwrap_or(false)
}

/// Bind an ephemeral UDP socket on the family matching `target`, send the
/// payload, and wait for a reply whose prefix echoes it back. Retries up to
/// `try_count` times, succeeding on the first attempt that matches.
pub async fn probe_udp(target: SocketAddr, timeout: Duration, try_count: u32) -> bool {
    for _ in 0..try_count.max(1) {
        if probe_udp_once(target, timeout).await {
            return true;
        }
    }
    false
}

async fn probe_udp_once(target: SocketAddr, timeout: Duration) -> bool {
    let attempt = async {
        let bind_addr: SocketAddr = if target.is_ipv4() { "0.0.0.0:0".parse().unwrap() } else { "[::]:0".parse().unwrap() };
        let socket = UdpSocket::bind(bind_addr).await.ok()?;
        socket.send_to(CONNECTION_TEST_PAYLOAD, target).await.ok()?;

        let mut buf = vec![0u8; CONNECTION_TEST_PAYLOAD.len() + 2];
        let (n, _) = socket.recv_from(&mut buf).await.ok()?;
        Some(n >= CONNECTION_TEST_PAYLOAD.len() && &buf[..CONNECTION_TEST_PAYLOAD.len()] == CONNECTION_TEST_PAYLOAD)
    };
    tokio::time::timeout(timeout, attempt).await.ok().flatten().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, UdpSocket as TokioUdpSocket};

    #[tokio::test]
    async fn tcp_probe_succeeds_against_an_echo_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; CONNECTION_TEST_PAYLOAD.len()];
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&buf).await.unwrap();
        });
        assert!(probe_tcp(addr, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn tcp_probe_fails_with_no_listener() {
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        assert!(!probe_tcp(addr, Duration::from_millis(200)).await);
    }

    #[tokio::test]
    async fn udp_probe_succeeds_against_an_echo_socket() {
        let socket = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; CONNECTION_TEST_PAYLOAD.len()];
            if let Ok((n, peer)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&buf[..n], peer).await;
            }
        });
        assert!(probe_udp(addr, Duration::from_secs(2), 1).await);
    }

    #[tokio::test]
    async fn udp_probe_retries_up_to_try_count() {
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        assert!(!probe_udp(addr, Duration::from_millis(100), 2).await);
    }
}
