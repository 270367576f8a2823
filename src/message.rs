//! # Shared Message Model
//!
//! The protocol's message kinds and payloads, shared by both codecs. This
//! is the Rust-native replacement for the C original's tagged union
//! (`PayloadType` + `PayloadData`, see `payload.h`): a single enum whose
//! variants carry their own fields, so there is no separate "which union
//! arm is active" tag to keep in sync by hand.
//!
//! Following the `other_examples` term-chat protocol's newtype style for
//! identifiers (`MessageId`, `SenderId`), the 16-bit wire identifier gets
//! its own `MessageId` wrapper rather than a bare `u16`, so call sites read
//! `msg.id()` instead of an easily-misplaced integer.

use std::fmt;

use crate::codec::field::{DisplayName, Identifier, MessageContent, Secret};

/// The per-session monotonic 16-bit identifier carried by every non-Confirm
/// message and referenced by its Confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u16);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a `Reply` reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyResult {
    Ok,
    Nok,
}

impl ReplyResult {
    pub fn is_ok(self) -> bool {
        matches!(self, ReplyResult::Ok)
    }

    pub fn from_bool(b: bool) -> Self {
        if b {
            ReplyResult::Ok
        } else {
            ReplyResult::Nok
        }
    }
}

/// `Auth` payload: credentials presented at the start of a session.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub username: Identifier,
    pub display_name: DisplayName,
    pub secret: Secret,
}

/// `Join` payload: a request to join a channel under the current display name.
#[derive(Debug, Clone)]
pub struct JoinPayload {
    pub channel_id: Identifier,
    pub display_name: DisplayName,
}

/// `Msg`/`Err` payload: a display name plus free-form content.
#[derive(Debug, Clone)]
pub struct TextPayload {
    pub display_name: DisplayName,
    pub content: MessageContent,
}

/// `Reply` payload: a result, the id it replies to, and a diagnostic string.
#[derive(Debug, Clone)]
pub struct ReplyPayload {
    pub result: ReplyResult,
    pub ref_id: MessageId,
    pub content: MessageContent,
}

/// One complete protocol message, tagged by kind with its payload inline.
///
/// `Confirm` carries only the id of the message it acknowledges; that id is
/// `Message::id`, there is no separate payload field for it.
#[derive(Debug, Clone)]
pub enum Message {
    Confirm { id: MessageId },
    Reply { id: MessageId, payload: ReplyPayload },
    Auth { id: MessageId, payload: AuthPayload },
    Join { id: MessageId, payload: JoinPayload },
    Msg { id: MessageId, payload: TextPayload },
    Err { id: MessageId, payload: TextPayload },
    Bye { id: MessageId },
}

impl Message {
    /// The id carried by every message, including `Confirm` (where it names
    /// the message being acknowledged rather than the Confirm itself).
    pub fn id(&self) -> MessageId {
        match self {
            Message::Confirm { id }
            | Message::Reply { id, .. }
            | Message::Auth { id, .. }
            | Message::Join { id, .. }
            | Message::Msg { id, .. }
            | Message::Err { id, .. }
            | Message::Bye { id } => *id,
        }
    }

    /// The codec kind tag, used for logging and dispatch.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Confirm { .. } => "CONFIRM",
            Message::Reply { .. } => "REPLY",
            Message::Auth { .. } => "AUTH",
            Message::Join { .. } => "JOIN",
            Message::Msg { .. } => "MSG",
            Message::Err { .. } => "ERR",
            Message::Bye { .. } => "BYE",
        }
    }

    /// Whether this message requires a Confirm on the datagram binding.
    pub fn requires_confirm(&self) -> bool {
        !matches!(self, Message::Confirm { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_carries_the_referent_id() {
        let m = Message::Confirm { id: MessageId(42) };
        assert_eq!(m.id(), MessageId(42));
        assert!(!m.requires_confirm());
    }

    #[test]
    fn non_confirm_requires_confirm() {
        let m = Message::Bye { id: MessageId(1) };
        assert!(m.requires_confirm());
    }
}
