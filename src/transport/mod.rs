//! # Transport Abstraction
//!
//! The two transport bindings share a capability set — send a message,
//! receive a message, disconnect — but differ enough in their setup and
//! delivery semantics (a connected byte stream vs. a connectionless,
//! rebinding datagram socket) that construction is binding-specific rather
//! than a shared `connect` trait method: an async trait for the operations
//! that are truly uniform, plain constructors (`TcpTransport::connect`,
//! `UdpTransport::bind`) for the operations that are not.

pub mod tcp;
pub mod udp;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::message::Message;

/// The operations common to both bindings once a transport is established.
#[async_trait]
pub trait Transport: Send {
    /// Encode and send `message`.
    async fn send(&mut self, message: &Message) -> Result<(), ChatError>;

    /// Receive and decode the next message.
    async fn receive(&mut self) -> Result<Message, ChatError>;

    /// Release any held resources.
    async fn disconnect(&mut self) -> Result<(), ChatError>;
}
