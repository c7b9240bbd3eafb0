//! Normalized address + port value type.
//!
//! IPv4 addresses are stored in their IPv4-mapped-IPv6 form
//! (`::ffff:a.b.c.d`) so that a single 16-byte representation covers both
//! families and two endpoints compare equal iff they denote the same
//! network address, regardless of which family the peer connected over.
//! Normalization happens once, on ingress (`from_socket_addr`); everything
//! downstream — equality, hashing, logging — just compares bytes.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::codec::{Decode, Encode};
use crate::error::ProtocolError;

/// The 12-byte prefix of an IPv4-mapped IPv6 address: `::ffff:0.0.0.0/96`.
const IPV4_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

/// A 16-byte network address plus a 16-bit port, wire-compatible with
/// `endpoint(18)` in the message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    addr: [u8; 16],
    port: u16,
}

impl Endpoint {
    pub fn new(addr: [u8; 16], port: u16) -> Self {
        Self { addr, port }
    }

    /// Normalize a socket address on ingress: IPv4 peers are folded into
    /// their v4-mapped-v6 form so the rest of the system only ever compares
    /// one 16-byte shape.
    pub fn from_socket_addr(sock: SocketAddr) -> Self {
        let addr = match sock.ip() {
            IpAddr::V4(v4) => {
                let mut bytes = [0u8; 16];
                bytes[..12].copy_from_slice(&IPV4_PREFIX);
                bytes[12..].copy_from_slice(&v4.octets());
                bytes
            },
            IpAddr::V6(v6) => v6.octets(),
        };
        Self { addr, port: sock.port() }
    }

    /// Re-derive a port on the same address (used when a host self-declares
    /// the port their game listens on, distinct from the TCP control port).
    pub fn with_port(&self, port: u16) -> Self {
        Self { addr: self.addr, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ip_version(&self) -> IpVersion {
        if self.addr[..12] == IPV4_PREFIX {
            IpVersion::V4
        } else {
            IpVersion::V6
        }
    }

    /// The address as a `std::net::IpAddr`, collapsing the v4-mapped-v6
    /// form back into a plain `Ipv4Addr` where applicable.
    pub fn ip_addr(&self) -> IpAddr {
        match self.ip_version() {
            IpVersion::V4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(&self.addr[12..]);
                IpAddr::V4(Ipv4Addr::from(octets))
            },
            IpVersion::V6 => IpAddr::V6(Ipv6Addr::from(self.addr)),
        }
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip_addr(), self.port)
    }
}

impl Encode for Endpoint {
    const SIZE: usize = 18;

    fn encode(&self, out: &mut Vec<u8>) {
        self.addr.encode(out);
        self.port.encode(out);
    }
}

impl Decode for Endpoint {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let addr = <[u8; 16]>::decode(buf)?;
        let port = u16::decode(buf)?;
        Ok(Self { addr, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_normalizes_to_mapped_v6() {
        let sock: SocketAddr = "192.168.1.2:5000".parse().unwrap();
        let ep = Endpoint::from_socket_addr(sock);
        assert_eq!(ep.ip_version(), IpVersion::V4);
        assert_eq!(ep.ip_addr(), "192.168.1.2".parse::<IpAddr>().unwrap());
        assert_eq!(ep.port(), 5000);
    }

    #[test]
    fn ipv6_round_trips() {
        let sock: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        let ep = Endpoint::from_socket_addr(sock);
        assert_eq!(ep.ip_version(), IpVersion::V6);
        assert_eq!(ep.to_socket_addr(), sock);
    }

    #[test]
    fn equality_matches_same_address_different_family_entry_point() {
        let a = Endpoint::from_socket_addr("10.0.0.1:1".parse().unwrap());
        let b = Endpoint::from_socket_addr("10.0.0.1:1".parse().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn encode_decode_round_trip() {
        let ep = Endpoint::from_socket_addr("203.0.113.9:57000".parse().unwrap());
        let mut out = Vec::new();
        ep.encode(&mut out);
        assert_eq!(out.len(), Endpoint::SIZE);
        let mut cursor = out.as_slice();
        assert_eq!(Endpoint::decode(&mut cursor).unwrap(), ep);
    }

    #[test]
    fn with_port_preserves_address() {
        let ep = Endpoint::from_socket_addr("10.0.0.5:1234".parse().unwrap());
        let redeclared = ep.with_port(9999);
        assert_eq!(redeclared.ip_addr(), ep.ip_addr());
        assert_eq!(redeclared.port(), 9999);
    }
}
