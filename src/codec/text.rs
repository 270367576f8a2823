//! # Text Codec (Reliable Binding)
//!
//! Encodes and decodes the line-oriented, CRLF-terminated grammar carried
//! over the TCP binding. Case-insensitive keywords are matched with
//! [`crate::codec::keyword::match_keyword`]; field values are read with
//! [`crate::codec::field::read_class`] up to the literal separator that
//! follows them.
//!
//! Unlike the binary binding, this grammar carries no `MessageID` on the
//! wire at all — the id is purely a session-local bookkeeping detail.
//! Decoded messages therefore get a placeholder `MessageId(0)`; the TCP
//! session never consults it, since the reliability engine (and its
//! ref-id matching) only exists for the datagram binding.

use crate::codec::field::{read_class, CharClass};
use crate::codec::keyword::{match_keyword, Keyword};
use crate::error::ChatError;
use crate::message::{
    AuthPayload, JoinPayload, Message, MessageId, ReplyPayload, ReplyResult, TextPayload,
};

const CRLF: &[u8] = b"\r\n";

/// Encode `message` as one CRLF-terminated line.
///
/// Fails with `ChatError::InvalidPayload` if `message` is a `Confirm`
/// (meaningless on this binding) or carries an empty required field. Field
/// values are emitted verbatim; nothing here normalizes or escapes them.
pub fn encode(message: &Message) -> Result<Vec<u8>, ChatError> {
    let mut out = Vec::new();
    match message {
        Message::Confirm { .. } => {
            return Err(ChatError::InvalidPayload(
                "Confirm has no text-binding representation".into(),
            ))
        }
        Message::Auth { payload, .. } => {
            out.extend_from_slice(b"AUTH ");
            out.extend_from_slice(payload.username.as_str().as_bytes());
            out.extend_from_slice(b" AS ");
            out.extend_from_slice(payload.display_name.as_str().as_bytes());
            out.extend_from_slice(b" USING ");
            out.extend_from_slice(payload.secret.as_str().as_bytes());
        }
        Message::Join { payload, .. } => {
            out.extend_from_slice(b"JOIN ");
            out.extend_from_slice(payload.channel_id.as_str().as_bytes());
            out.extend_from_slice(b" AS ");
            out.extend_from_slice(payload.display_name.as_str().as_bytes());
        }
        Message::Msg { payload, .. } => {
            out.extend_from_slice(b"MSG FROM ");
            out.extend_from_slice(payload.display_name.as_str().as_bytes());
            out.extend_from_slice(b" IS ");
            out.extend_from_slice(payload.content.as_str().as_bytes());
        }
        Message::Err { payload, .. } => {
            out.extend_from_slice(b"ERR FROM ");
            out.extend_from_slice(payload.display_name.as_str().as_bytes());
            out.extend_from_slice(b" IS ");
            out.extend_from_slice(payload.content.as_str().as_bytes());
        }
        Message::Reply { payload, .. } => {
            out.extend_from_slice(b"REPLY ");
            out.extend_from_slice(if payload.result.is_ok() { b"OK" } else { b"NOK" });
            out.extend_from_slice(b" IS ");
            out.extend_from_slice(payload.content.as_str().as_bytes());
        }
        Message::Bye { .. } => {
            out.extend_from_slice(b"BYE");
        }
    }
    out.extend_from_slice(CRLF);
    Ok(out)
}

/// Decode one complete CRLF-terminated line into a [`Message`].
///
/// `line` must not include the CRLF terminator (the transport strips it
/// while finding line boundaries); any bytes beyond a decoded message's
/// fields are a decode error, as is a keyword that does not match any of
/// the six recognized kinds.
pub fn decode(line: &[u8]) -> Result<Message, ChatError> {
    let (keyword, consumed) = match_keyword(line)
        .ok_or_else(|| ChatError::InvalidPayload("unrecognized keyword".into()))?;
    let rest = &line[consumed..];

    match keyword {
        Keyword::Auth => decode_auth(rest),
        Keyword::Join => decode_join(rest),
        Keyword::Msg => decode_text(rest, b"FROM", b"IS", |p| Message::Msg {
            id: MessageId(0),
            payload: p,
        }),
        Keyword::Err => decode_text(rest, b"FROM", b"IS", |p| Message::Err {
            id: MessageId(0),
            payload: p,
        }),
        Keyword::Reply => decode_reply(rest),
        Keyword::Bye => decode_bye(rest),
    }
}

fn expect_literal<'a>(rest: &'a [u8], literal: &[u8]) -> Result<&'a [u8], ChatError> {
    if rest.len() < literal.len() || !rest[..literal.len()].eq_ignore_ascii_case(literal) {
        return Err(ChatError::InvalidPayload(format!(
            "expected literal {:?}",
            String::from_utf8_lossy(literal)
        )));
    }
    Ok(&rest[literal.len()..])
}

fn expect_space(rest: &[u8]) -> Result<&[u8], ChatError> {
    if rest.first() != Some(&b' ') {
        return Err(ChatError::InvalidPayload("missing separator".into()));
    }
    Ok(&rest[1..])
}

fn read_field<'a>(
    rest: &'a [u8],
    class: CharClass,
    max_len: usize,
) -> Result<(&'a str, &'a [u8]), ChatError> {
    let n = read_class(rest, class, max_len)?;
    if n == 0 {
        return Err(ChatError::InvalidPayload("empty field".into()));
    }
    let field = std::str::from_utf8(&rest[..n])
        .map_err(|_| ChatError::InvalidPayload("field is not valid UTF-8".into()))?;
    Ok((field, &rest[n..]))
}

fn decode_auth(rest: &[u8]) -> Result<Message, ChatError> {
    let rest = expect_space(rest)?;
    let (username, rest) = read_field(rest, CharClass::IdentifierChars, 20)?;
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, b"AS")?;
    let rest = expect_space(rest)?;
    let (display_name, rest) = read_field(rest, CharClass::PrintableNoSpace, 20)?;
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, b"USING")?;
    let rest = expect_space(rest)?;
    let (secret, rest) = read_field(rest, CharClass::IdentifierChars, 128)?;
    if !rest.is_empty() {
        return Err(ChatError::InvalidPayload("trailing bytes after AUTH".into()));
    }
    Ok(Message::Auth {
        id: MessageId(0),
        payload: AuthPayload {
            username: crate::codec::field::Identifier::new(username)?,
            display_name: crate::codec::field::DisplayName::new(display_name)?,
            secret: crate::codec::field::Secret::new(secret)?,
        },
    })
}

fn decode_join(rest: &[u8]) -> Result<Message, ChatError> {
    let rest = expect_space(rest)?;
    let (channel_id, rest) = read_field(rest, CharClass::IdentifierChars, 20)?;
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, b"AS")?;
    let rest = expect_space(rest)?;
    let (display_name, rest) = read_field(rest, CharClass::PrintableNoSpace, 20)?;
    if !rest.is_empty() {
        return Err(ChatError::InvalidPayload("trailing bytes after JOIN".into()));
    }
    Ok(Message::Join {
        id: MessageId(0),
        payload: JoinPayload {
            channel_id: crate::codec::field::Identifier::new(channel_id)?,
            display_name: crate::codec::field::DisplayName::new(display_name)?,
        },
    })
}

fn decode_text(
    rest: &[u8],
    from_literal: &[u8],
    is_literal: &[u8],
    build: impl FnOnce(TextPayload) -> Message,
) -> Result<Message, ChatError> {
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, from_literal)?;
    let rest = expect_space(rest)?;
    let (display_name, rest) = read_field(rest, CharClass::PrintableNoSpace, 20)?;
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, is_literal)?;
    let rest = expect_space(rest)?;
    let (content, rest) = read_field(rest, CharClass::PrintableWithSpace, 1400)?;
    if !rest.is_empty() {
        return Err(ChatError::InvalidPayload("trailing bytes after message".into()));
    }
    Ok(build(TextPayload {
        display_name: crate::codec::field::DisplayName::new(display_name)?,
        content: crate::codec::field::MessageContent::new(content)?,
    }))
}

fn decode_reply(rest: &[u8]) -> Result<Message, ChatError> {
    let rest = expect_space(rest)?;
    let (result, rest) = if let Ok(r) = expect_literal(rest, b"OK") {
        (ReplyResult::Ok, r)
    } else if let Ok(r) = expect_literal(rest, b"NOK") {
        (ReplyResult::Nok, r)
    } else {
        return Err(ChatError::InvalidPayload("expected OK or NOK".into()));
    };
    let rest = expect_space(rest)?;
    let rest = expect_literal(rest, b"IS")?;
    let rest = expect_space(rest)?;
    let (content, rest) = read_field(rest, CharClass::PrintableWithSpace, 1400)?;
    if !rest.is_empty() {
        return Err(ChatError::InvalidPayload("trailing bytes after REPLY".into()));
    }
    Ok(Message::Reply {
        id: MessageId(0),
        payload: ReplyPayload {
            result,
            ref_id: MessageId(0),
            content: crate::codec::field::MessageContent::new(content)?,
        },
    })
}

fn decode_bye(rest: &[u8]) -> Result<Message, ChatError> {
    if !rest.is_empty() {
        return Err(ChatError::InvalidPayload("trailing bytes after BYE".into()));
    }
    Ok(Message::Bye { id: MessageId(0) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::{DisplayName, Identifier, MessageContent, Secret};

    fn strip_crlf(line: &[u8]) -> &[u8] {
        &line[..line.len() - 2]
    }

    #[test]
    fn auth_round_trips() {
        let msg = Message::Auth {
            id: MessageId(0),
            payload: AuthPayload {
                username: Identifier::new("alice").unwrap(),
                display_name: DisplayName::new("alice123").unwrap(),
                secret: Secret::new("s3cret").unwrap(),
            },
        };
        let encoded = encode(&msg).unwrap();
        assert_eq!(encoded, b"AUTH alice AS alice123 USING s3cret\r\n");
        let decoded = decode(strip_crlf(&encoded)).unwrap();
        match decoded {
            Message::Auth { payload, .. } => {
                assert_eq!(payload.username.as_str(), "alice");
                assert_eq!(payload.display_name.as_str(), "alice123");
                assert_eq!(payload.secret.as_str(), "s3cret");
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn msg_round_trips_with_space_in_content() {
        let msg = Message::Msg {
            id: MessageId(0),
            payload: TextPayload {
                display_name: DisplayName::new("alice123").unwrap(),
                content: MessageContent::new("hello there").unwrap(),
            },
        };
        let encoded = encode(&msg).unwrap();
        assert_eq!(encoded, b"MSG FROM alice123 IS hello there\r\n");
        let decoded = decode(strip_crlf(&encoded)).unwrap();
        match decoded {
            Message::Msg { payload, .. } => assert_eq!(payload.content.as_str(), "hello there"),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn reply_ok_and_nok_decode() {
        let ok = decode(b"REPLY OK IS Welcome").unwrap();
        assert!(matches!(ok, Message::Reply { payload, .. } if payload.result.is_ok()));
        let nok = decode(b"REPLY NOK IS Bad secret").unwrap();
        assert!(matches!(nok, Message::Reply { payload, .. } if !payload.result.is_ok()));
    }

    #[test]
    fn bye_has_no_payload() {
        let encoded = encode(&Message::Bye { id: MessageId(0) }).unwrap();
        assert_eq!(encoded, b"BYE\r\n");
        assert!(matches!(decode(b"BYE").unwrap(), Message::Bye { .. }));
    }

    #[test]
    fn confirm_is_rejected_on_encode() {
        assert!(encode(&Message::Confirm { id: MessageId(1) }).is_err());
    }

    #[test]
    fn keywords_are_case_insensitive_on_decode() {
        assert!(decode(b"auth alice AS alice123 USING s3cret").is_ok());
        assert!(decode(b"Join chan AS alice123").is_ok());
    }

    #[test]
    fn unknown_keyword_is_invalid_payload() {
        assert!(decode(b"WAT hello").is_err());
    }

    #[test]
    fn missing_separator_is_invalid_payload() {
        assert!(decode(b"JOINchan AS alice").is_err());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert!(decode(b"BYE extra").is_err());
    }

    #[test]
    fn oversized_field_is_rejected() {
        let long_name = "a".repeat(21);
        let line = format!("JOIN chan AS {long_name}");
        assert!(decode(line.as_bytes()).is_err());
    }
}
