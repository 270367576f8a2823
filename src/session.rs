//! # Conversation Engine
//!
//! The state machine over {Start, Auth, Open, Error, End}. [`Session`] is
//! the sole owner of every piece of mutable state a running client needs —
//! the transport, the display name, the id counter, and (on the datagram
//! binding) the reliability engine — collapsing the C original's
//! process-wide globals into one struct.
//!
//! `Session` does not read stdin or drive the `tokio::select!` loop itself
//! — that belongs to `main.rs`, which owns the one genuine suspension
//! point. `Session` only exposes what that loop needs: handlers for a
//! parsed [`Command`] or an incoming [`Message`], a timeout hook, and the
//! termination predicate.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::codec::binary;
use crate::codec::field::DisplayName;
use crate::command::Command;
use crate::error::ChatError;
use crate::message::{AuthPayload, JoinPayload, Message, MessageId, TextPayload};
use crate::reliability::{Delivery, ReliabilityEngine, TimeoutAction};
use crate::transport::{TcpTransport, Transport, UdpTransport};

/// The conversation's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Start,
    Auth,
    Open,
    Error,
    End,
}

enum Binding {
    Tcp(TcpTransport),
    Udp {
        transport: UdpTransport,
        engine: ReliabilityEngine,
    },
}

/// The running client session: one transport, one conversation state, one
/// display name, and (for UDP) one reliability engine.
pub struct Session {
    state: ConversationState,
    display_name: Option<DisplayName>,
    next_id: u16,
    binding: Binding,
}

impl Session {
    /// Connect the TCP binding and build a fresh session in state `Start`.
    pub async fn connect_tcp(host: &str, port: u16) -> Result<Self, ChatError> {
        let transport = TcpTransport::connect(host, port).await?;
        Ok(Self {
            state: ConversationState::Start,
            display_name: None,
            next_id: 0,
            binding: Binding::Tcp(transport),
        })
    }

    /// Bind the UDP binding and build a fresh session in state `Start`.
    pub async fn bind_udp(
        server_addr: SocketAddr,
        udp_timeout: Duration,
        max_retries: u8,
    ) -> Result<Self, ChatError> {
        let transport = UdpTransport::bind(server_addr).await?;
        Ok(Self {
            state: ConversationState::Start,
            display_name: None,
            next_id: 0,
            binding: Binding::Udp {
                transport,
                engine: ReliabilityEngine::new(udp_timeout, max_retries),
            },
        })
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Whether the session has nothing left to confirm — always true on the
    /// TCP binding, since it never routes sends through a reliability engine.
    pub fn is_confirmed(&self) -> bool {
        match &self.binding {
            Binding::Tcp(_) => true,
            Binding::Udp { engine, .. } => engine.is_confirmed(),
        }
    }

    /// The poll timeout the event loop should arm: time remaining until a
    /// retransmission is due, or `None` if nothing is outstanding.
    pub fn next_timeout(&self) -> Option<Duration> {
        match &self.binding {
            Binding::Tcp(_) => None,
            Binding::Udp { engine, .. } => engine.next_timeout(Instant::now()),
        }
    }

    /// Whether the session has reached its terminal state and has nothing
    /// left outstanding — the complete termination predicate.
    pub fn is_terminated(&self) -> bool {
        self.state == ConversationState::End && self.is_confirmed()
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Send a non-Confirm message, routing it through the reliability
    /// engine's stop-and-wait slot on the datagram binding, or straight out
    /// on the reliable binding (where the slot is immediately "confirmed").
    async fn send_tracked(&mut self, message: Message) -> Result<(), ChatError> {
        match &mut self.binding {
            Binding::Tcp(transport) => transport.send(&message).await,
            Binding::Udp { transport, engine } => {
                let encoded = binary::encode(&message)?;
                engine.enqueue(message.id(), encoded.clone(), Instant::now());
                transport.send_encoded(&encoded).await
            }
        }
    }

    /// Send a Bye and (on the datagram binding) leave it tracked for
    /// confirmation like any other outgoing message.
    async fn send_bye(&mut self) -> Result<(), ChatError> {
        let id = self.allocate_id();
        self.send_tracked(Message::Bye { id }).await
    }

    /// Send an Err with the current display name.
    async fn send_err(&mut self, content: &str) -> Result<(), ChatError> {
        let display_name = self.current_display_name()?;
        let id = self.allocate_id();
        let content = crate::codec::field::MessageContent::new(content)?;
        self.send_tracked(Message::Err {
            id,
            payload: TextPayload {
                display_name,
                content,
            },
        })
        .await
    }

    fn current_display_name(&self) -> Result<DisplayName, ChatError> {
        self.display_name
            .clone()
            .ok_or_else(|| ChatError::Internal("no display name set".into()))
    }

    /// Handle one retransmission-timer expiry.
    pub async fn handle_timeout(&mut self) -> Result<(), ChatError> {
        let Binding::Udp { transport, engine } = &mut self.binding else {
            return Ok(());
        };
        match engine.on_timeout(Instant::now()) {
            TimeoutAction::Retransmit(bytes) => {
                debug!("retransmitting outstanding send");
                transport.send_encoded(&bytes).await
            }
            TimeoutAction::DeliveryFailed => {
                self.state = ConversationState::End;
                Err(ChatError::ConnectionFailed(
                    "delivery failure, no confirmation received".into(),
                ))
            }
            TimeoutAction::Noop => Ok(()),
        }
    }

    /// Receive the next wire event and return whatever messages are ready
    /// for immediate delivery to [`Self::handle_message`]. Duplicate and
    /// wrong-source datagrams resolve to an empty vector; a Confirm that
    /// unblocks deferred deliveries can release more than one message at
    /// once, in arrival order.
    pub async fn poll_incoming(&mut self) -> Result<Vec<Message>, ChatError> {
        match &mut self.binding {
            Binding::Tcp(transport) => Ok(vec![transport.receive().await?]),
            Binding::Udp { transport, engine } => {
                let message = match transport.receive().await {
                    Ok(message) => message,
                    Err(ChatError::WrongSourceAddress) => {
                        warn!("discarding datagram from unexpected source");
                        return Ok(vec![]);
                    }
                    Err(e) => return Err(e),
                };

                if let Message::Confirm { id } = message {
                    if engine.on_confirm(id) {
                        return Ok(engine.take_deferred());
                    }
                    return Ok(vec![]);
                }

                let (id, delivery) = engine.on_receive(message);
                transport.send(&Message::Confirm { id }).await?;
                match delivery {
                    Delivery::Now(message) => Ok(vec![message]),
                    Delivery::Duplicate | Delivery::Deferred => Ok(vec![]),
                }
            }
        }
    }

    /// Handle a parsed command from stdin. The event loop must not call
    /// this while `state == Auth` or while `!is_confirmed()` on the
    /// datagram binding — user input is masked there.
    pub async fn handle_command(&mut self, command: Command) -> Result<(), ChatError> {
        match command {
            Command::Exit => {
                if self.state != ConversationState::End {
                    self.send_bye().await?;
                    self.state = ConversationState::End;
                }
            }
            Command::Help => print_help(),
            Command::Clear => clear_screen(),
            Command::Auth {
                username,
                display_name,
                secret,
            } => {
                if self.state != ConversationState::Start {
                    eprintln!("ERR: already authenticating or authenticated");
                    return Ok(());
                }
                self.display_name = Some(display_name.clone());
                let id = self.allocate_id();
                self.send_tracked(Message::Auth {
                    id,
                    payload: AuthPayload {
                        username,
                        display_name,
                        secret,
                    },
                })
                .await?;
                self.state = ConversationState::Auth;
            }
            Command::Join { channel_id } => {
                if self.state != ConversationState::Open {
                    eprintln!("ERR: must be in an open session to join a channel");
                    return Ok(());
                }
                let display_name = self.current_display_name()?;
                let id = self.allocate_id();
                self.send_tracked(Message::Join {
                    id,
                    payload: JoinPayload {
                        channel_id,
                        display_name,
                    },
                })
                .await?;
            }
            Command::Rename { display_name } => {
                if self.state != ConversationState::Open {
                    eprintln!("ERR: must be in an open session to rename");
                    return Ok(());
                }
                self.display_name = Some(display_name);
            }
            Command::Chat { content } => {
                if self.state != ConversationState::Open {
                    eprintln!("ERR: not in an open session");
                    return Ok(());
                }
                let display_name = self.current_display_name()?;
                let id = self.allocate_id();
                self.send_tracked(Message::Msg {
                    id,
                    payload: TextPayload {
                        display_name: display_name.clone(),
                        content: content.clone(),
                    },
                })
                .await?;
                println!("{display_name}: {content}");
            }
        }
        Ok(())
    }

    /// Handle one message delivered by [`Self::poll_incoming`]. Confirms are
    /// never passed here — they are consumed inside `poll_incoming`.
    pub async fn handle_message(&mut self, message: Message) -> Result<(), ChatError> {
        match (self.state, message) {
            (ConversationState::Auth, Message::Reply { payload, .. }) => {
                if payload.result.is_ok() {
                    eprintln!("Success: {}", payload.content);
                    self.state = ConversationState::Open;
                } else {
                    eprintln!("Failure: {}", payload.content);
                    self.state = ConversationState::Start;
                }
            }
            (ConversationState::Open, Message::Reply { payload, .. }) => {
                if payload.result.is_ok() {
                    eprintln!("Success: {}", payload.content);
                } else {
                    eprintln!("Failure: {}", payload.content);
                }
            }
            (ConversationState::Auth, Message::Err { payload, .. })
            | (ConversationState::Open, Message::Err { payload, .. }) => {
                eprintln!("ERR FROM {}: {}", payload.display_name, payload.content);
                self.send_bye().await?;
                self.state = ConversationState::End;
            }
            (ConversationState::Open, Message::Msg { payload, .. }) => {
                println!("{}: {}", payload.display_name, payload.content);
            }
            (ConversationState::Open, Message::Bye { .. }) => {
                self.state = ConversationState::End;
            }
            (ConversationState::Auth, Message::Auth { .. })
            | (ConversationState::Auth, Message::Join { .. })
            | (ConversationState::Open, Message::Auth { .. })
            | (ConversationState::Open, Message::Join { .. }) => {
                self.send_err("Received malformed payload").await?;
                self.state = ConversationState::Error;
            }
            (state, other) => {
                warn!(?state, kind = other.kind(), "ignoring message in unexpected state");
            }
        }
        Ok(())
    }

    /// Advance the `Error -> End` transition once nothing is outstanding:
    /// once the single outstanding send (if any) has been confirmed, send
    /// a Bye and end the session.
    pub async fn advance_error_state(&mut self) -> Result<(), ChatError> {
        if self.state == ConversationState::Error && self.is_confirmed() {
            self.send_bye().await?;
            self.state = ConversationState::End;
        }
        Ok(())
    }

    /// Handle SIGINT: immediate termination with no Bye if the session
    /// never authenticated, otherwise the same as `/exit`.
    pub async fn handle_interrupt(&mut self) -> Result<(), ChatError> {
        if self.state == ConversationState::Start {
            self.state = ConversationState::End;
            return Ok(());
        }
        self.handle_command(Command::Exit).await
    }

    pub async fn disconnect(&mut self) -> Result<(), ChatError> {
        match &mut self.binding {
            Binding::Tcp(transport) => transport.disconnect().await,
            Binding::Udp { transport, .. } => transport.disconnect().await,
        }
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  /auth <username> <display_name> <secret>  authenticate with the server");
    println!("  /join <channel_id>                         join a channel");
    println!("  /rename <display_name>                     change your local display name");
    println!("  /help                                      show this message");
    println!("  /clear                                     clear the terminal");
    println!("  /exit                                      leave the session");
}

fn clear_screen() {
    use std::io::Write;
    print!("\x1Bc");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::{Identifier, Secret};
    use crate::message::{ReplyPayload, ReplyResult};

    // These tests exercise pure state transitions and never touch the
    // network beyond the local bind `UdpTransport::bind` performs.
    async fn udp_session() -> Session {
        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        Session {
            state: ConversationState::Start,
            display_name: None,
            next_id: 0,
            binding: Binding::Udp {
                transport,
                engine: ReliabilityEngine::new(Duration::from_millis(250), 3),
            },
        }
    }

    #[tokio::test]
    async fn rename_in_open_changes_name_without_requiring_network() {
        let mut session = udp_session().await;
        session.state = ConversationState::Open;
        session.display_name = Some(DisplayName::new("alice123").unwrap());
        session
            .handle_command(Command::Rename {
                display_name: DisplayName::new("carol").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(session.display_name.unwrap().as_str(), "carol");
        assert_eq!(session.state(), ConversationState::Open);
    }

    #[tokio::test]
    async fn join_outside_open_is_rejected_locally() {
        let mut session = udp_session().await;
        session.state = ConversationState::Auth;
        let before = session.next_id;
        session
            .handle_command(Command::Join {
                channel_id: Identifier::new("general").unwrap(),
            })
            .await
            .unwrap();
        // No id should have been allocated: nothing was sent.
        assert_eq!(session.next_id, before);
        assert_eq!(session.state(), ConversationState::Auth);
    }

    #[tokio::test]
    async fn reply_nok_in_auth_returns_to_start() {
        let mut session = udp_session().await;
        session.state = ConversationState::Auth;
        session
            .handle_message(Message::Reply {
                id: MessageId(0),
                payload: ReplyPayload {
                    result: ReplyResult::Nok,
                    ref_id: MessageId(0),
                    content: crate::codec::field::MessageContent::new("bad secret").unwrap(),
                },
            })
            .await
            .unwrap();
        assert_eq!(session.state(), ConversationState::Start);
    }

    #[tokio::test]
    async fn reply_ok_in_auth_opens_the_session() {
        let mut session = udp_session().await;
        session.state = ConversationState::Auth;
        session
            .handle_message(Message::Reply {
                id: MessageId(0),
                payload: ReplyPayload {
                    result: ReplyResult::Ok,
                    ref_id: MessageId(0),
                    content: crate::codec::field::MessageContent::new("Welcome").unwrap(),
                },
            })
            .await
            .unwrap();
        assert_eq!(session.state(), ConversationState::Open);
    }

    #[tokio::test]
    async fn bye_in_open_ends_without_outgoing_bye() {
        let mut session = udp_session().await;
        session.state = ConversationState::Open;
        let before = session.next_id;
        session
            .handle_message(Message::Bye { id: MessageId(0) })
            .await
            .unwrap();
        assert_eq!(session.state(), ConversationState::End);
        assert_eq!(session.next_id, before);
    }

    #[tokio::test]
    async fn unexpected_auth_in_open_moves_to_error() {
        let mut session = udp_session().await;
        session.state = ConversationState::Open;
        session.display_name = Some(DisplayName::new("alice123").unwrap());
        session
            .handle_message(Message::Auth {
                id: MessageId(9),
                payload: AuthPayload {
                    username: Identifier::new("eve").unwrap(),
                    display_name: DisplayName::new("eve").unwrap(),
                    secret: Secret::new("x").unwrap(),
                },
            })
            .await
            .unwrap();
        assert_eq!(session.state(), ConversationState::Error);
    }
}
