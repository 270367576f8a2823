//! # Command Parser
//!
//! Parses one line of terminal input into a [`Command`].
//! A line whose first token starts with `/` is a local command, dispatched
//! by prefix against a small fixed table; anything else is chat content.
//!
//! The transport-facing [`crate::session::Session`] never sees raw lines —
//! every line from stdin passes through [`Command::parse`] first, so
//! malformed input is rejected here, uniformly, before it can reach the
//! conversation engine.

use crate::codec::field::{DisplayName, Identifier, MessageContent, Secret};
use crate::error::ChatError;

/// A bound of 1500 bytes including the line terminator, matching the
/// largest frame the protocol can carry.
pub const MAX_LINE_LEN: usize = 1500;

/// A parsed line of user input.
#[derive(Debug, Clone)]
pub enum Command {
    /// `/auth <username> <display_name> <secret>`
    Auth {
        username: Identifier,
        display_name: DisplayName,
        secret: Secret,
    },
    /// `/join <channel_id>`
    Join { channel_id: Identifier },
    /// `/rename <display_name>` — local only, no network traffic.
    Rename { display_name: DisplayName },
    /// `/help` — print local usage text.
    Help,
    /// `/clear` — reset the terminal via ANSI `ESC c`.
    Clear,
    /// `/exit` — initiate graceful termination.
    Exit,
    /// A plain chat line, to be sent as the content of a `Msg`.
    Chat { content: MessageContent },
}

impl Command {
    /// Parse one line, already stripped of its trailing newline.
    pub fn parse(line: &str) -> Result<Command, ChatError> {
        if line.len() > MAX_LINE_LEN {
            return Err(ChatError::InvalidInput("line exceeds maximum length".into()));
        }
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            Self::parse_command(rest)
        } else {
            Ok(Command::Chat {
                content: MessageContent::new(trimmed)?,
            })
        }
    }

    fn parse_command(rest: &str) -> Result<Command, ChatError> {
        let mut tokens = rest.split_whitespace();
        let keyword = tokens
            .next()
            .ok_or_else(|| ChatError::InvalidInput("empty command".into()))?
            .to_ascii_lowercase();
        let args: Vec<&str> = tokens.collect();

        match keyword.as_str() {
            "auth" => {
                let [username, display_name, secret] = exactly_three(&args)?;
                Ok(Command::Auth {
                    username: Identifier::new(username)?,
                    display_name: DisplayName::new(display_name)?,
                    secret: Secret::new(secret)?,
                })
            }
            "join" => {
                let channel_id = exactly_one(&args)?;
                Ok(Command::Join {
                    channel_id: Identifier::new(channel_id)?,
                })
            }
            "rename" => {
                let display_name = exactly_one(&args)?;
                Ok(Command::Rename {
                    display_name: DisplayName::new(display_name)?,
                })
            }
            "help" => {
                exactly_zero(&args)?;
                Ok(Command::Help)
            }
            "clear" => {
                exactly_zero(&args)?;
                Ok(Command::Clear)
            }
            "exit" => {
                exactly_zero(&args)?;
                Ok(Command::Exit)
            }
            other => Err(ChatError::InvalidInput(format!("unknown command /{other}"))),
        }
    }
}

fn exactly_zero(args: &[&str]) -> Result<(), ChatError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ChatError::InvalidInput("command takes no arguments".into()))
    }
}

fn exactly_one<'a>(args: &[&'a str]) -> Result<&'a str, ChatError> {
    match args {
        [a] => Ok(a),
        _ => Err(ChatError::InvalidInput("command takes exactly one argument".into())),
    }
}

fn exactly_three<'a>(args: &[&'a str]) -> Result<[&'a str; 3], ChatError> {
    match args {
        [a, b, c] => Ok([a, b, c]),
        _ => Err(ChatError::InvalidInput("command takes exactly three arguments".into())),
    }
}
