//! # Reliable Transport (TCP Binding)
//!
//! Connects, sends, and receives complete text-binding lines over a
//! `tokio::net::TcpStream`. Framing (finding the next `\r\n`) is handled
//! here, in the transport, via a `tokio::io::BufReader` — the codec itself
//! only ever sees a complete line.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::codec::text;
use crate::error::ChatError;
use crate::message::Message;
use crate::transport::Transport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP binding of the IPK24-CHAT protocol: one connected stream, one line
/// per message in either direction.
pub struct TcpTransport {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    /// Connect to `host:port`, failing with `ChatError::ConnectionFailed` if
    /// the connection does not complete within [`CONNECT_TIMEOUT`].
    pub async fn connect(host: &str, port: u16) -> Result<Self, ChatError> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ChatError::ConnectionFailed(format!("timed out connecting to {host}:{port}")))?
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// The reliable binding never arms a retransmission timer.
    pub fn next_timeout(&self) -> Option<Duration> {
        None
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, message: &Message) -> Result<(), ChatError> {
        let encoded = text::encode(message)?;
        self.writer
            .write_all(&encoded)
            .await
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))
    }

    async fn receive(&mut self) -> Result<Message, ChatError> {
        let mut raw = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut raw)
            .await
            .map_err(|e| ChatError::ConnectionFailed(e.to_string()))?;
        if n == 0 {
            return Err(ChatError::ConnectionFailed("connection closed by server".into()));
        }
        while raw.last() == Some(&b'\n') || raw.last() == Some(&b'\r') {
            raw.pop();
        }
        text::decode(&raw)
    }

    async fn disconnect(&mut self) -> Result<(), ChatError> {
        let _ = self.writer.shutdown().await;
        Ok(())
    }
}
