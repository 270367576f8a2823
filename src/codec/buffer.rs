//! # Byte Buffer
//!
//! A fixed-capacity byte container used by both codecs. Every message on
//! either binding fits in [`MAX_DATAGRAM`] bytes (the largest datagram
//! payload, 1400 bytes of content plus header and terminator overhead), so
//! no codec operation needs to allocate beyond this buffer.
//!
//! ## Design
//!
//! - **Append-only growth** at the back (`append*`), **skip** consumes from
//!   the front without moving bytes, **trim** removes matching bytes from
//!   either end. This mirrors the C original's `ByteBuffer` (`bytes.h`): a
//!   pointer plus logical length plus a read offset, rather than a `Vec`
//!   that reallocates.
//! - Overflow on append is a hard error (`ChatError::BufferOverflow`); the
//!   buffer never silently truncates.

use crate::error::ChatError;

/// Maximum payload a single datagram or line may carry on the wire,
/// inclusive of any terminator.
pub const MAX_DATAGRAM: usize = 1501;

/// A fixed-capacity, append/skip/trim byte container.
///
/// All codec I/O goes through this type; it is the only buffer the codecs
/// allocate per message.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    offset: usize,
}

impl ByteBuffer {
    /// Create an empty buffer with [`MAX_DATAGRAM`] capacity reserved.
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_DATAGRAM),
            offset: 0,
        }
    }

    /// Wrap existing bytes for decoding, without copying beyond what's given.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            offset: 0,
        }
    }

    /// Number of unread bytes remaining from the current offset.
    pub fn len(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a single byte, failing if this would exceed [`MAX_DATAGRAM`].
    pub fn append_byte(&mut self, byte: u8) -> Result<(), ChatError> {
        if self.data.len() >= MAX_DATAGRAM {
            return Err(ChatError::BufferOverflow);
        }
        self.data.push(byte);
        Ok(())
    }

    /// Append a byte slice, failing if this would exceed [`MAX_DATAGRAM`].
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), ChatError> {
        if self.data.len() + bytes.len() > MAX_DATAGRAM {
            return Err(ChatError::BufferOverflow);
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Append `text` followed by a single NUL terminator.
    pub fn append_text(&mut self, text: &[u8]) -> Result<(), ChatError> {
        self.append_bytes(text)?;
        self.append_byte(0)
    }

    /// Advance the read offset by `n` bytes, failing if fewer remain.
    pub fn skip(&mut self, n: usize) -> Result<(), ChatError> {
        if n > self.len() {
            return Err(ChatError::InvalidPayload("skip past end of buffer".into()));
        }
        self.offset += n;
        Ok(())
    }

    /// Remove leading occurrences of `byte` from the unread region.
    pub fn trim_leading(&mut self, byte: u8) {
        while self.offset < self.data.len() && self.data[self.offset] == byte {
            self.offset += 1;
        }
    }

    /// Remove trailing occurrences of `byte` from the buffer.
    pub fn trim_trailing(&mut self, byte: u8) {
        while self.data.len() > self.offset && *self.data.last().unwrap() == byte {
            self.data.pop();
        }
    }

    /// The unread slice, from the current offset to the end.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    /// The full slice written so far (ignores the read offset), used by
    /// encoders to hand the finished frame to a transport.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Read `n` bytes from the current offset without consuming them.
    pub fn peek(&self, n: usize) -> Result<&[u8], ChatError> {
        if n > self.len() {
            return Err(ChatError::InvalidPayload("peek past end of buffer".into()));
        }
        Ok(&self.data[self.offset..self.offset + n])
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
