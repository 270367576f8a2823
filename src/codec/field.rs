//! # Field Types and Validators
//!
//! Character-class and length checks shared by both codecs. Each field type
//! (`Identifier`, `Secret`, `DisplayName`, `MessageContent`) is a newtype
//! over a validated, owned byte string — validation happens once, at
//! construction, so downstream code never has to re-check a field's class.
//!
//! This mirrors the C original's fixed-size byte arrays (`payload.h`:
//! `Username`, `ChannelID`, `Secret`, `DisplayName`, `MessageContent`) but
//! replaces the "read until first out-of-class byte into a fixed array"
//! idiom with owned `String`s guarded by a constructor.

use crate::error::ChatError;

/// A class of acceptable bytes for a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `[A-Za-z0-9-]`, used by [`Identifier`] and [`Secret`].
    IdentifierChars,
    /// Printable ASCII with no space, `0x21..=0x7E`, used by [`DisplayName`].
    PrintableNoSpace,
    /// Printable ASCII including space, `0x20..=0x7E`, used by [`MessageContent`].
    PrintableWithSpace,
}

impl CharClass {
    fn accepts(self, byte: u8) -> bool {
        match self {
            CharClass::IdentifierChars => {
                byte.is_ascii_alphanumeric() || byte == b'-'
            }
            CharClass::PrintableNoSpace => (0x21..=0x7E).contains(&byte),
            CharClass::PrintableWithSpace => (0x20..=0x7E).contains(&byte),
        }
    }
}

/// Scan `input` for the longest prefix of bytes in `class`, up to `max_len`.
///
/// Returns the number of bytes consumed. Returns `Ok(0)` if the first byte
/// is already out of class (an empty field), and an error if a valid run
/// longer than `max_len` is found.
pub fn read_class(input: &[u8], class: CharClass, max_len: usize) -> Result<usize, ChatError> {
    let mut consumed = 0;
    while consumed < input.len() && class.accepts(input[consumed]) {
        consumed += 1;
        if consumed > max_len {
            return Err(ChatError::InvalidPayload(format!(
                "field exceeds maximum length of {max_len}"
            )));
        }
    }
    Ok(consumed)
}

/// Validate that the entirety of `bytes` belongs to `class` and is within
/// `min_len..=max_len`.
fn validate(bytes: &[u8], class: CharClass, min_len: usize, max_len: usize) -> Result<(), ChatError> {
    if bytes.len() < min_len || bytes.len() > max_len {
        return Err(ChatError::InvalidPayload(format!(
            "field length {} not in {}..={}",
            bytes.len(),
            min_len,
            max_len
        )));
    }
    if !bytes.iter().all(|&b| class.accepts(b)) {
        return Err(ChatError::InvalidPayload("field has an out-of-class byte".into()));
    }
    Ok(())
}

macro_rules! field_type {
    ($name:ident, $class:expr, $max:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Maximum length in bytes, inclusive.
            pub const MAX_LEN: usize = $max;

            /// Validate and wrap `value`.
            pub fn new(value: impl Into<String>) -> Result<Self, ChatError> {
                let value = value.into();
                validate(value.as_bytes(), $class, 1, $max)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

field_type!(
    Identifier,
    CharClass::IdentifierChars,
    20,
    "A username or channel id: 1..=20 bytes from `[A-Za-z0-9-]`."
);
field_type!(
    Secret,
    CharClass::IdentifierChars,
    128,
    "An authentication secret: 1..=128 bytes from `[A-Za-z0-9-]`."
);
field_type!(
    DisplayName,
    CharClass::PrintableNoSpace,
    20,
    "A display name: 1..=20 bytes from printable-with-no-space (0x21..=0x7E)."
);
field_type!(
    MessageContent,
    CharClass::PrintableWithSpace,
    1400,
    "Chat message content: 1..=1400 bytes from printable-with-space (0x20..=0x7E)."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_alnum_and_hyphen() {
        assert!(Identifier::new("user-01").is_ok());
    }

    #[test]
    fn identifier_rejects_space() {
        assert!(Identifier::new("user 01").is_err());
    }

    #[test]
    fn identifier_rejects_empty() {
        assert!(Identifier::new("").is_err());
    }

    #[test]
    fn identifier_rejects_over_length() {
        let s = "a".repeat(21);
        assert!(Identifier::new(s).is_err());
    }

    #[test]
    fn display_name_rejects_space_but_message_content_accepts_it() {
        assert!(DisplayName::new("has space").is_err());
        assert!(MessageContent::new("has space").is_ok());
    }

    #[test]
    fn secret_accepts_up_to_128_bytes() {
        let s = "a".repeat(128);
        assert!(Secret::new(s).is_ok());
        let too_long = "a".repeat(129);
        assert!(Secret::new(too_long).is_err());
    }

    #[test]
    fn read_class_counts_matching_prefix() {
        let n = read_class(b"abc-123 rest", CharClass::IdentifierChars, 20).unwrap();
        assert_eq!(n, 7);
    }

    #[test]
    fn read_class_returns_zero_for_immediate_mismatch() {
        let n = read_class(b" abc", CharClass::IdentifierChars, 20).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn read_class_errors_past_max_len() {
        let long = "a".repeat(25);
        assert!(read_class(long.as_bytes(), CharClass::IdentifierChars, 20).is_err());
    }
}
