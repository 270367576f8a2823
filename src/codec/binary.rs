//! # Binary Codec (Datagram Binding)
//!
//! Encodes and decodes the framed binary grammar carried over the UDP
//! binding: a 1-byte kind tag, a 2-byte big-endian `MessageID`, then
//! kind-specific fields. String fields are NUL-terminated; [`ByteBuffer`]
//! is the only allocation either direction needs.
//!
//! Decoding is whole-message: the datagram transport hands over one
//! complete UDP payload per receive, so there is no partial-frame state to
//! carry between calls.

use crate::codec::buffer::ByteBuffer;
use crate::codec::field::{read_class, CharClass, DisplayName, Identifier, MessageContent, Secret};
use crate::error::ChatError;
use crate::message::{
    AuthPayload, JoinPayload, Message, MessageId, ReplyPayload, ReplyResult, TextPayload,
};

const TAG_CONFIRM: u8 = 0x00;
const TAG_REPLY: u8 = 0x01;
const TAG_AUTH: u8 = 0x02;
const TAG_JOIN: u8 = 0x03;
const TAG_MSG: u8 = 0x04;
const TAG_ERR: u8 = 0xFE;
const TAG_BYE: u8 = 0xFF;

/// Encode `message` as one binary datagram frame.
pub fn encode(message: &Message) -> Result<Vec<u8>, ChatError> {
    let mut buf = ByteBuffer::new();
    let id = message.id();
    match message {
        Message::Confirm { .. } => {
            buf.append_byte(TAG_CONFIRM)?;
            append_id(&mut buf, id)?;
        }
        Message::Reply { payload, .. } => {
            buf.append_byte(TAG_REPLY)?;
            append_id(&mut buf, id)?;
            buf.append_byte(if payload.result.is_ok() { 1 } else { 0 })?;
            append_id(&mut buf, payload.ref_id)?;
            buf.append_text(payload.content.as_str().as_bytes())?;
        }
        Message::Auth { payload, .. } => {
            buf.append_byte(TAG_AUTH)?;
            append_id(&mut buf, id)?;
            buf.append_text(payload.username.as_str().as_bytes())?;
            buf.append_text(payload.display_name.as_str().as_bytes())?;
            buf.append_text(payload.secret.as_str().as_bytes())?;
        }
        Message::Join { payload, .. } => {
            buf.append_byte(TAG_JOIN)?;
            append_id(&mut buf, id)?;
            buf.append_text(payload.channel_id.as_str().as_bytes())?;
            buf.append_text(payload.display_name.as_str().as_bytes())?;
        }
        Message::Msg { payload, .. } => {
            buf.append_byte(TAG_MSG)?;
            append_id(&mut buf, id)?;
            buf.append_text(payload.display_name.as_str().as_bytes())?;
            buf.append_text(payload.content.as_str().as_bytes())?;
        }
        Message::Err { payload, .. } => {
            buf.append_byte(TAG_ERR)?;
            append_id(&mut buf, id)?;
            buf.append_text(payload.display_name.as_str().as_bytes())?;
            buf.append_text(payload.content.as_str().as_bytes())?;
        }
        Message::Bye { .. } => {
            buf.append_byte(TAG_BYE)?;
            append_id(&mut buf, id)?;
        }
    }
    Ok(buf.as_slice().to_vec())
}

fn append_id(buf: &mut ByteBuffer, id: MessageId) -> Result<(), ChatError> {
    buf.append_bytes(&id.0.to_be_bytes())
}

/// Decode one complete datagram payload into a [`Message`].
pub fn decode(bytes: &[u8]) -> Result<Message, ChatError> {
    let mut buf = ByteBuffer::from_bytes(bytes);
    let tag = *buf
        .peek(1)
        .map_err(|_| ChatError::InvalidPayload("empty datagram".into()))?
        .first()
        .unwrap();
    buf.skip(1)?;
    let id = MessageId(read_id(&mut buf)?);

    let message = match tag {
        TAG_CONFIRM => Message::Confirm { id },
        TAG_REPLY => {
            let result_byte = read_byte(&mut buf)?;
            let result = match result_byte {
                0 => ReplyResult::Nok,
                1 => ReplyResult::Ok,
                _ => return Err(ChatError::InvalidPayload("result byte must be 0 or 1".into())),
            };
            let ref_id = MessageId(read_id(&mut buf)?);
            let content = read_terminated_field(&mut buf, CharClass::PrintableWithSpace, 1400)?;
            Message::Reply {
                id,
                payload: ReplyPayload {
                    result,
                    ref_id,
                    content: MessageContent::new(content)?,
                },
            }
        }
        TAG_AUTH => {
            let username = read_terminated_field(&mut buf, CharClass::IdentifierChars, 20)?;
            let display_name = read_terminated_field(&mut buf, CharClass::PrintableNoSpace, 20)?;
            let secret = read_terminated_field(&mut buf, CharClass::IdentifierChars, 128)?;
            Message::Auth {
                id,
                payload: AuthPayload {
                    username: Identifier::new(username)?,
                    display_name: DisplayName::new(display_name)?,
                    secret: Secret::new(secret)?,
                },
            }
        }
        TAG_JOIN => {
            let channel_id = read_terminated_field(&mut buf, CharClass::IdentifierChars, 20)?;
            let display_name = read_terminated_field(&mut buf, CharClass::PrintableNoSpace, 20)?;
            Message::Join {
                id,
                payload: JoinPayload {
                    channel_id: Identifier::new(channel_id)?,
                    display_name: DisplayName::new(display_name)?,
                },
            }
        }
        TAG_MSG | TAG_ERR => {
            let display_name = read_terminated_field(&mut buf, CharClass::PrintableNoSpace, 20)?;
            let content = read_terminated_field(&mut buf, CharClass::PrintableWithSpace, 1400)?;
            let payload = TextPayload {
                display_name: DisplayName::new(display_name)?,
                content: MessageContent::new(content)?,
            };
            if tag == TAG_MSG {
                Message::Msg { id, payload }
            } else {
                Message::Err { id, payload }
            }
        }
        TAG_BYE => Message::Bye { id },
        _ => return Err(ChatError::InvalidPayload(format!("unknown kind tag {tag:#04x}"))),
    };

    if !buf.is_empty() {
        return Err(ChatError::InvalidPayload("residual bytes after message".into()));
    }
    Ok(message)
}

fn read_byte(buf: &mut ByteBuffer) -> Result<u8, ChatError> {
    let byte = *buf
        .peek(1)
        .map_err(|_| ChatError::InvalidPayload("unexpected end of datagram".into()))?
        .first()
        .unwrap();
    buf.skip(1)?;
    Ok(byte)
}

fn read_id(buf: &mut ByteBuffer) -> Result<u16, ChatError> {
    let bytes = buf
        .peek(2)
        .map_err(|_| ChatError::InvalidPayload("truncated MessageID".into()))?;
    let id = u16::from_be_bytes([bytes[0], bytes[1]]);
    buf.skip(2)?;
    Ok(id)
}

/// Read a field with `class`/`max_len` up to a NUL terminator, consuming the
/// terminator. Fails if the byte right after the valid run is not a NUL.
fn read_terminated_field(
    buf: &mut ByteBuffer,
    class: CharClass,
    max_len: usize,
) -> Result<String, ChatError> {
    let n = read_class(buf.remaining(), class, max_len)?;
    if n == 0 {
        return Err(ChatError::InvalidPayload("empty field".into()));
    }
    let field = std::str::from_utf8(&buf.remaining()[..n])
        .map_err(|_| ChatError::InvalidPayload("field is not valid UTF-8".into()))?
        .to_string();
    buf.skip(n)?;
    if read_byte(buf)? != 0 {
        return Err(ChatError::InvalidPayload("missing NUL terminator".into()));
    }
    Ok(field)
}
