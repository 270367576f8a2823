//! # Datagram Transport (UDP Binding)
//!
//! Sends and receives binary-binding frames over a `tokio::net::UdpSocket`.
//! The transport has no notion of "connected" — the destination address is
//! just a field it rewrites whenever the server answers from a different
//! port (server-port rebinding).
//!
//! Confirm emission itself is **not** performed inside this transport: the
//! ordering guarantee (a Confirm is sent before the message's payload is
//! acted upon) is easier to get right one layer up, in
//! [`crate::session::Session`], which calls `send` with a freshly built
//! Confirm immediately after `receive` decodes a non-Confirm frame. Folding
//! that into the transport would duplicate the reliability engine's
//! duplicate-suppression bookkeeping here.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::codec::binary;
use crate::codec::buffer::MAX_DATAGRAM;
use crate::error::ChatError;
use crate::message::Message;
use crate::transport::Transport;

/// UDP binding of the IPK24-CHAT protocol.
pub struct UdpTransport {
    socket: UdpSocket,
    server_ip: IpAddr,
    server_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral local socket and target `server_addr` initially.
    /// Connectionless by design — this binding has no notion of `connect`,
    /// so construction never does a handshake.
    pub async fn bind(server_addr: SocketAddr) -> Result<Self, ChatError> {
        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| ChatError::SocketSetup(e.to_string()))?;
        Ok(Self {
            socket,
            server_ip: server_addr.ip(),
            server_addr,
        })
    }

    /// The address sends currently target, after any server-port rebinding.
    pub fn current_server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Send a pre-encoded frame, bypassing the codec. Used by the
    /// reliability engine to retransmit an identical frame byte-for-byte.
    pub async fn send_encoded(&self, encoded: &[u8]) -> Result<(), ChatError> {
        self.socket
            .send_to(encoded, self.server_addr)
            .await
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, message: &Message) -> Result<(), ChatError> {
        let encoded = binary::encode(message)?;
        self.send_encoded(&encoded).await
    }

    async fn receive(&mut self) -> Result<Message, ChatError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let (n, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))?;
        if from.ip() != self.server_ip {
            return Err(ChatError::WrongSourceAddress);
        }
        self.server_addr = from;
        binary::decode(&buf[..n])
    }

    async fn disconnect(&mut self) -> Result<(), ChatError> {
        // Connectionless; nothing to release beyond dropping the socket.
        Ok(())
    }
}
