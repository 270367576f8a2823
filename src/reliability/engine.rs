//! # Reliability Engine (Datagram Binding Only)
//!
//! Stop-and-wait at the message level. The engine is pure state — it never
//! touches a socket — so it can be unit tested without any I/O, and the TCP
//! binding simply never constructs one: the reliability engine is composed
//! with the datagram variant only.
//!
//! State carried:
//! - [`SeenIds`], the duplicate-suppression set.
//! - At most one [`Outstanding`] send: the last non-Confirm message this
//!   session transmitted, its send time, and its retry count. `None` plays
//!   the role of a `confirmed == true` sentinel — there is no separate
//!   boolean to keep in sync with the `Option`.
//! - A FIFO of messages that arrived while a send was outstanding and so
//!   must wait to be delivered until that send is confirmed (contract 3).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::message::{Message, MessageId};
use crate::reliability::seen::SeenIds;

struct Outstanding {
    id: MessageId,
    encoded: Vec<u8>,
    sent_at: Instant,
    retries: u8,
}

/// What happened to a freshly-received non-Confirm message.
#[derive(Debug)]
pub enum Delivery {
    /// Deliver the payload to the conversation engine now.
    Now(Message),
    /// The message's id was already seen; its payload is discarded, but the
    /// caller must still emit a Confirm for it.
    Duplicate,
    /// A send is outstanding; the payload is queued and will surface from
    /// [`ReliabilityEngine::take_deferred`] once that send is confirmed.
    Deferred,
}

/// The action the event loop should take when the retransmission timer
/// fires.
#[derive(Debug)]
pub enum TimeoutAction {
    /// Resend this exact frame and restart the timer.
    Retransmit(Vec<u8>),
    /// The retry budget is exhausted; the session must terminate locally.
    DeliveryFailed,
    /// Nothing outstanding, or not yet due.
    Noop,
}

pub struct ReliabilityEngine {
    seen: SeenIds,
    outstanding: Option<Outstanding>,
    deferred: VecDeque<Message>,
    timeout: Duration,
    max_retries: u8,
}

impl ReliabilityEngine {
    /// Build a new engine. `timeout` is the UDP timeout (`-d`), `max_retries`
    /// the retransmission limit (`-r`).
    pub fn new(timeout: Duration, max_retries: u8) -> Self {
        Self {
            seen: SeenIds::new(),
            outstanding: None,
            deferred: VecDeque::new(),
            timeout,
            max_retries,
        }
    }

    /// Whether the single outstanding-send slot is empty (equivalent to a
    /// `confirmed == true` flag).
    pub fn is_confirmed(&self) -> bool {
        self.outstanding.is_none()
    }

    /// Store `encoded` (the frame for `id`) as the new outstanding send.
    /// Replaces any previous outstanding send per the stop-and-wait
    /// invariant — callers must not call this while `!is_confirmed()`.
    pub fn enqueue(&mut self, id: MessageId, encoded: Vec<u8>, now: Instant) {
        self.outstanding = Some(Outstanding {
            id,
            encoded,
            sent_at: now,
            retries: 0,
        });
    }

    /// Handle a received Confirm. Returns whether it matched the outstanding
    /// send (and thus cleared it); Confirms with any other ref_id, or
    /// arriving when nothing is outstanding, are a no-op.
    pub fn on_confirm(&mut self, ref_id: MessageId) -> bool {
        match &self.outstanding {
            Some(o) if o.id == ref_id => {
                self.outstanding = None;
                true
            }
            _ => false,
        }
    }

    /// Handle a received non-Confirm message. Always returns the id the
    /// caller must Confirm, alongside what should happen to its payload.
    pub fn on_receive(&mut self, message: Message) -> (MessageId, Delivery) {
        let id = message.id();
        if self.seen.insert(id.0) {
            return (id, Delivery::Duplicate);
        }
        if self.outstanding.is_some() {
            self.deferred.push_back(message);
            (id, Delivery::Deferred)
        } else {
            (id, Delivery::Now(message))
        }
    }

    /// Drain messages that were deferred while a send was outstanding.
    /// Call this once [`Self::is_confirmed`] becomes true (after
    /// [`Self::on_confirm`] returns `true`), in arrival order.
    pub fn take_deferred(&mut self) -> Vec<Message> {
        self.deferred.drain(..).collect()
    }

    /// Time remaining until the outstanding send must be retransmitted, or
    /// `None` ("no timeout") if nothing is outstanding.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        let outstanding = self.outstanding.as_ref()?;
        let elapsed = now.saturating_duration_since(outstanding.sent_at);
        Some(self.timeout.saturating_sub(elapsed))
    }

    /// Called when the retransmission timer fires.
    pub fn on_timeout(&mut self, now: Instant) -> TimeoutAction {
        let Some(outstanding) = self.outstanding.as_mut() else {
            return TimeoutAction::Noop;
        };
        if now.saturating_duration_since(outstanding.sent_at) < self.timeout {
            return TimeoutAction::Noop;
        }
        if outstanding.retries < self.max_retries {
            outstanding.retries += 1;
            outstanding.sent_at = now;
            TimeoutAction::Retransmit(outstanding.encoded.clone())
        } else {
            self.outstanding = None;
            TimeoutAction::DeliveryFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TextPayload;
    use crate::codec::field::{DisplayName, MessageContent};

    fn text_message(id: u16) -> Message {
        Message::Msg {
            id: MessageId(id),
            payload: TextPayload {
                display_name: DisplayName::new("bob").unwrap(),
                content: MessageContent::new("hi").unwrap(),
            },
        }
    }

    #[test]
    fn fresh_engine_is_confirmed() {
        let engine = ReliabilityEngine::new(Duration::from_millis(250), 3);
        assert!(engine.is_confirmed());
        assert_eq!(engine.next_timeout(Instant::now()), None);
    }

    #[test]
    fn enqueue_then_matching_confirm_clears_outstanding() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(250), 3);
        engine.enqueue(MessageId(0), vec![1, 2, 3], Instant::now());
        assert!(!engine.is_confirmed());
        assert!(engine.on_confirm(MessageId(0)));
        assert!(engine.is_confirmed());
    }

    #[test]
    fn non_matching_confirm_is_ignored() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(250), 3);
        engine.enqueue(MessageId(0), vec![1, 2, 3], Instant::now());
        assert!(!engine.on_confirm(MessageId(1)));
        assert!(!engine.is_confirmed());
    }

    #[test]
    fn duplicate_receive_is_reported_but_not_delivered() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(250), 3);
        let (id1, first) = engine.on_receive(text_message(42));
        assert!(matches!(first, Delivery::Now(_)));
        let (id2, second) = engine.on_receive(text_message(42));
        assert_eq!(id1, id2);
        assert!(matches!(second, Delivery::Duplicate));
    }

    #[test]
    fn receive_while_outstanding_is_deferred_then_drained() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(250), 3);
        engine.enqueue(MessageId(0), vec![9], Instant::now());
        let (_, delivery) = engine.on_receive(text_message(7));
        assert!(matches!(delivery, Delivery::Deferred));
        assert!(engine.on_confirm(MessageId(0)));
        let drained = engine.take_deferred();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id(), MessageId(7));
    }

    #[test]
    fn timeout_retransmits_up_to_the_limit_then_fails() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(100), 2);
        let t0 = Instant::now();
        engine.enqueue(MessageId(0), vec![1], t0);

        let t1 = t0 + Duration::from_millis(100);
        assert!(matches!(engine.on_timeout(t1), TimeoutAction::Retransmit(_)));

        let t2 = t0 + Duration::from_millis(200);
        assert!(matches!(engine.on_timeout(t2), TimeoutAction::Retransmit(_)));

        let t3 = t0 + Duration::from_millis(300);
        assert!(matches!(engine.on_timeout(t3), TimeoutAction::DeliveryFailed));
        assert!(engine.is_confirmed());
    }

    #[test]
    fn timeout_before_deadline_is_a_noop() {
        let mut engine = ReliabilityEngine::new(Duration::from_millis(100), 2);
        let t0 = Instant::now();
        engine.enqueue(MessageId(0), vec![1], t0);
        assert!(matches!(
            engine.on_timeout(t0 + Duration::from_millis(50)),
            TimeoutAction::Noop
        ));
    }
}
