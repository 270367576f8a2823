//! # Keyword Dispatch
//!
//! Case-insensitive matching of the text binding's six sentence keywords
//! (`AUTH`, `JOIN`, `MSG`, `ERR`, `REPLY`, `BYE`) against a line prefix.
//! Implemented as a small linear scan rather than a hand-rolled trie: six
//! keywords is far below the point where a trie earns its complexity, but
//! the function signature keeps that an internal decision — callers just
//! get back a matched `Keyword` and how many bytes it consumed.

/// A recognized text-binding keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Auth,
    Join,
    Msg,
    Err,
    Reply,
    Bye,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("AUTH", Keyword::Auth),
    ("JOIN", Keyword::Join),
    ("MSG", Keyword::Msg),
    ("ERR", Keyword::Err),
    ("REPLY", Keyword::Reply),
    ("BYE", Keyword::Bye),
];

/// Match the longest keyword at the start of `line`, case-insensitively.
///
/// Returns the keyword and the number of bytes it occupies (not including
/// any trailing separator), or `None` if no keyword matches.
pub fn match_keyword(line: &[u8]) -> Option<(Keyword, usize)> {
    KEYWORDS.iter().find_map(|(text, kw)| {
        let bytes = text.as_bytes();
        if line.len() >= bytes.len() && line[..bytes.len()].eq_ignore_ascii_case(bytes) {
            Some((*kw, bytes.len()))
        } else {
            None
        }
    })
}
