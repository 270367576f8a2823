//! # Command-Line Interface Module
//!
//! Argument parsing for the IPK24-CHAT client, using `clap`'s derive API.
//! `clap` supplies argument parsing and the generated `-h`/`--help` text for
//! free; this module only adds the validation and defaults the protocol
//! flags need beyond what `clap` checks structurally (e.g. port ranges that
//! fit in a `u16` already, courtesy of the field type).

use clap::{
    builder::styling::{AnsiColor, Styles},
    Parser, ValueEnum,
};

/// Styling for `--help` output, matching the look of clap v3's default theme.
fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Yellow.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// An interactive IPK24-CHAT client.
///
/// Speaks either the line-oriented text binding over TCP or the framed
/// binary binding over UDP to a single server, chosen with `-t`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, styles = styles())]
pub struct Cli {
    /// Server hostname or IP address to connect to.
    #[arg(short = 's', long = "server", value_name = "HOST")]
    pub host: String,

    /// Transport binding to use for this session.
    #[arg(short = 't', long = "transport", value_enum)]
    pub transport: TransportKind,

    /// Server port.
    #[arg(short = 'p', long = "port", default_value_t = 4567)]
    pub port: u16,

    /// UDP confirmation timeout, in milliseconds. Ignored on the TCP binding.
    #[arg(short = 'd', long = "timeout", default_value_t = 250)]
    pub udp_timeout_ms: u16,

    /// Maximum number of UDP retransmissions before giving up on a send.
    /// Ignored on the TCP binding.
    #[arg(short = 'r', long = "retries", default_value_t = 3)]
    pub udp_retransmissions: u8,

    /// Increase diagnostic log verbosity on stderr (-v info, -vv debug, -vvv trace).
    ///
    /// This is ambient logging, not part of the protocol: it never changes
    /// what is printed to stdout/stderr for chat traffic.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Which transport binding to speak.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    #[value(name = "tcp")]
    Tcp,
    #[value(name = "udp")]
    Udp,
}
