//! # Error Taxonomy
//!
//! This module defines the single error type used across the codec,
//! transport, reliability, and session layers. Every fallible operation in
//! the crate returns `Result<T, ChatError>` (or wraps it behind
//! `anyhow::Result` at the `main.rs` boundary); there is no shared mutable
//! error flag anywhere in the crate.
//!
//! ## Propagation Policy
//!
//! - Codec errors on received frames are recoverable: the session reports
//!   them, sends a protocol `Err` when the state permits, and moves to
//!   `ConversationState::Error`.
//! - Transport errors on send are fatal to the session and drive it to
//!   `ConversationState::End`.
//! - `WrongSourceAddress` is always discarded silently by the caller.
//! - Argument parsing and codec *encode* errors are fatal to the process.
//! - User command errors print a diagnostic and the session continues.

use thiserror::Error;

/// The complete set of error kinds produced anywhere in this crate.
///
/// Each variant maps to a distinct nonzero process exit code via
/// [`ChatError::exit_code`], so a caller can translate a top-level failure
/// into the process's exit status without re-deriving the mapping.
#[derive(Error, Debug)]
pub enum ChatError {
    /// A command-line argument was malformed or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command-line argument was supplied more than once.
    #[error("duplicated argument: {0}")]
    DuplicatedArgument(String),

    /// A fixed-capacity allocation could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// A [`crate::codec::buffer::ByteBuffer`] append exceeded its capacity.
    #[error("buffer overflow")]
    BufferOverflow,

    /// Socket creation or configuration failed.
    #[error("socket setup failed: {0}")]
    SocketSetup(String),

    /// Connecting to, or writing to, the server failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A datagram arrived from an address other than the configured server.
    #[error("datagram from wrong source address")]
    WrongSourceAddress,

    /// A codec refused to encode or decode a message.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A line of user input did not parse into a valid command.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A programmer invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// The process exit code this error kind should produce when it escapes
    /// to `main`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChatError::InvalidArgument(_) => 1,
            ChatError::DuplicatedArgument(_) => 1,
            ChatError::OutOfMemory => 2,
            ChatError::BufferOverflow => 2,
            ChatError::SocketSetup(_) => 3,
            ChatError::ConnectionFailed(_) => 3,
            ChatError::WrongSourceAddress => 4,
            ChatError::InvalidPayload(_) => 5,
            ChatError::InvalidInput(_) => 6,
            ChatError::Internal(_) => 99,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_nonzero_and_distinct_per_category() {
        let errs = [
            ChatError::InvalidArgument("x".into()),
            ChatError::OutOfMemory,
            ChatError::SocketSetup("x".into()),
            ChatError::WrongSourceAddress,
            ChatError::InvalidPayload("x".into()),
            ChatError::InvalidInput("x".into()),
            ChatError::Internal("x".into()),
        ];
        for e in &errs {
            assert_ne!(e.exit_code(), 0);
        }
    }
}
