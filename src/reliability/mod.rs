//! The datagram binding's reliability layer: duplicate suppression and
//! stop-and-wait retransmission, kept separate from any socket.

pub mod engine;
pub mod seen;

pub use engine::{Delivery, ReliabilityEngine, TimeoutAction};
