//! # IPK24-CHAT Client
//!
//! An interactive client for the IPK24-CHAT protocol, speaking either the
//! line-oriented text binding over TCP or the framed binary binding over
//! UDP with an application-layer reliability scheme layered on top.

pub mod cli;
pub mod codec;
pub mod command;
pub mod error;
pub mod message;
pub mod reliability;
pub mod session;
pub mod transport;

pub use cli::{Cli, TransportKind};
pub use command::Command;
pub use error::ChatError;
pub use message::Message;
pub use session::{ConversationState, Session};

/// The current version of the client.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
