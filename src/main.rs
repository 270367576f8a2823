//! # IPK24-CHAT Client - Main Entry Point
//!
//! ## Architecture Overview
//!
//! 1. **Initialize logging**: ambient diagnostics only, via `tracing`; never
//!    the protocol-mandated stdout/stderr output, which [`session::Session`]
//!    writes directly.
//! 2. **Parse arguments**: CLI flags select the transport binding, server,
//!    port, and (for UDP) the reliability timing.
//! 3. **Connect or bind**: build a [`session::Session`] for the chosen binding.
//! 4. **Drive the event loop**: a single `tokio::select!` arbitrates stdin,
//!    the network, the retransmission timer, and `SIGINT` — the one genuine
//!    suspension point the protocol requires.
//!
//! ## Error Handling
//!
//! Fatal errors unwind to `main` as [`error::ChatError`] and are reported on
//! stderr with the process exiting via [`error::ChatError::exit_code`].

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ipk24chat::cli::TransportKind;
use ipk24chat::command::Command;
use ipk24chat::session::{ConversationState, Session};
use ipk24chat::Cli;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

mod logging;
use logging::ColorizedFormatter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(chat_err) = e.downcast_ref::<ipk24chat::ChatError>() {
                eprintln!("ERR: {chat_err}");
                std::process::exit(chat_err.exit_code());
            }
            Err(e)
        }
    }
}

/// Diagnostics only ever go to stderr, at a level controlled by `-v`. They
/// are deliberately separate from the exact-format protocol lines the
/// conversation engine prints — `-v` never changes what a chat partner sees.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(ColorizedFormatter)
                .with_filter(level),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    info!("starting IPK24-CHAT client");

    let mut session = match cli.transport {
        TransportKind::Tcp => {
            debug!(host = %cli.host, port = cli.port, "connecting over TCP");
            Session::connect_tcp(&cli.host, cli.port).await?
        }
        TransportKind::Udp => {
            let server_addr = resolve(&cli.host, cli.port).await?;
            debug!(%server_addr, "binding UDP socket");
            Session::bind_udp(
                server_addr,
                Duration::from_millis(cli.udp_timeout_ms as u64),
                cli.udp_retransmissions,
            )
            .await?
        }
    };

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if session.is_terminated() {
            break;
        }

        // Stdin is masked while authenticating and while an outgoing send
        // is unconfirmed: the stop-and-wait reliability layer allows only
        // one outstanding message at a time.
        let allow_stdin = session.state() != ConversationState::Auth && session.is_confirmed();
        let timeout_duration = session
            .next_timeout()
            .unwrap_or(Duration::from_secs(60 * 60));

        tokio::select! {
            line = stdin_lines.next_line(), if allow_stdin => {
                match line {
                    Ok(Some(raw)) => match Command::parse(&raw) {
                        Ok(command) => {
                            if let Err(e) = session.handle_command(command).await {
                                eprintln!("ERR: {e}");
                            }
                        }
                        Err(e) => eprintln!("ERR: {e}"),
                    },
                    Ok(None) => {
                        debug!("stdin closed, leaving the session");
                        if let Err(e) = session.handle_command(Command::Exit).await {
                            eprintln!("ERR: {e}");
                        }
                    }
                    Err(e) => eprintln!("ERR: failed to read stdin: {e}"),
                }
            }
            incoming = session.poll_incoming() => {
                match incoming {
                    Ok(messages) => {
                        for message in messages {
                            if let Err(e) = session.handle_message(message).await {
                                eprintln!("ERR: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("ERR: {e}");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(timeout_duration) => {
                if let Err(e) = session.handle_timeout().await {
                    // Retransmission-budget exhaustion is fatal: let it
                    // propagate so `main` maps it to a nonzero exit code
                    // instead of ending the session as if it were clean.
                    let _ = session.disconnect().await;
                    return Err(e.into());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("received interrupt signal");
                if let Err(e) = session.handle_interrupt().await {
                    eprintln!("ERR: {e}");
                }
            }
        }

        session.advance_error_state().await?;
    }

    session.disconnect().await?;
    info!("session ended");
    Ok(())
}

async fn resolve(host: &str, port: u16) -> Result<std::net::SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("no addresses found for {host}:{port}"))
}
